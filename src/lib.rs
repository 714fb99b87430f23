pub mod appconfig;
pub mod editor;
pub mod geometry;
pub mod images;
pub mod logging;
pub mod model;
pub mod render;
pub mod selector;
pub mod store;
pub mod ui;
pub mod variant;

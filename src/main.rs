// #![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use tracing::{debug, info};

use area_pricing::{logging, ui::ui_types::App};

/// Main App
fn main() -> eframe::Result<()> {
    let _guard = logging::init_logs();
    info!("starting area_pricing {}", env!("CARGO_PKG_VERSION"));

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 800.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };
    let res = eframe::run_native(
        "Treatment Areas",
        native_options,
        Box::new(|cc| Ok(Box::new(App::new(cc)))),
    );
    debug!("exited: {:?}", res.as_ref().err());
    res
}

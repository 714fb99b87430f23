use std::time::{Duration, Instant};

use area_pricing::editor::AreaEditor;
use area_pricing::geometry::{projection::Surface, Shape};
use area_pricing::model::{Gender, Region, SubjectCategory, SubjectConfig, SubjectKey};
use area_pricing::selector::AreaSelector;
use area_pricing::store::{FileStore, MemoryStore, RecordStore};
use area_pricing::variant::{ImageSource, Resolution};

fn subject(key: &str, category: SubjectCategory) -> SubjectConfig {
    SubjectConfig {
        key: SubjectKey(key.to_string()),
        name: key.to_string(),
        category,
    }
}

fn face() -> SubjectConfig {
    subject("face", SubjectCategory::Gendered { region: Region::Face })
}

fn draw(editor: &mut AreaEditor, surface: &Surface, from: (f32, f32), to: (f32, f32)) {
    editor.pointer_down(egui::pos2(from.0, from.1), surface);
    editor.pointer_moved(egui::pos2(to.0, to.1), surface);
    editor.pointer_up();
}

#[test]
fn authored_areas_are_priced_in_the_selector() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("areas.json");
    let authoring = Surface::with_layout(100.0, 100.0, 1.0);

    {
        let store = FileStore::new(&path);
        let mut editor = AreaEditor::new(face(), Some(Gender::Female));
        editor.load(&store).unwrap();

        draw(&mut editor, &authoring, (10., 40.), (25., 55.));
        draw(&mut editor, &authoring, (75., 40.), (90., 55.));
        draw(&mut editor, &authoring, (45., 20.), (55., 30.));
        editor.form_mut().name = "Cheeks".into();
        editor.form_mut().price = "150".into();
        editor.commit_form().unwrap();

        draw(&mut editor, &authoring, (35., 70.), (65., 85.));
        editor.finalize_group("Chin", 80.0).unwrap();

        editor.save(&store).unwrap();
        assert!(!editor.is_dirty());
    }

    // fresh store handle, as after a restart
    let store = FileStore::new(&path);
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut selector = AreaSelector::new(face(), Some(Gender::Female)).with_events(tx);
    selector.load(&store).unwrap();
    assert_eq!(selector.groups().len(), 2);
    assert_eq!(selector.groups()[0].name, "Cheeks");

    // a different render size than the one the areas were drawn at
    let viewing = Surface::with_layout(400.0, 300.0, 2.0);
    let cheek = selector.pointer_click(egui::pos2(80., 141.), &viewing);
    let chin = selector.pointer_click(egui::pos2(200., 231.), &viewing);
    assert!(cheek.is_some() && chin.is_some());
    assert_ne!(cheek, chin);

    assert_eq!(selector.total_price(), 230.0);
    let last = rx.try_iter().last().unwrap();
    assert_eq!(last.total_price, 230.0);
    assert_eq!(last.groups.len(), 2);

    // the other gender is a separate dataset
    let male = store
        .load_groups(&SubjectKey("face".into()), Some(Gender::Male))
        .unwrap();
    assert!(male.is_empty());
}

#[test]
fn last_save_wins() {
    let store = MemoryStore::default();
    let surface = Surface::with_layout(100.0, 100.0, 1.0);

    let mut a = AreaEditor::new(face(), Some(Gender::Male));
    let mut b = AreaEditor::new(face(), Some(Gender::Male));
    a.load(&store).unwrap();
    b.load(&store).unwrap();

    draw(&mut a, &surface, (10., 10.), (20., 20.));
    a.finalize_group("Forehead", 100.0).unwrap();
    draw(&mut b, &surface, (50., 50.), (60., 60.));
    b.finalize_group("Nose", 90.0).unwrap();

    a.save(&store).unwrap();
    b.save(&store).unwrap();

    let stored = store
        .load_groups(&SubjectKey("face".into()), Some(Gender::Male))
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Nose");
}

#[test]
fn explicit_subject_needs_no_gender() {
    let store = MemoryStore::default();
    let lips = subject(
        "lips",
        SubjectCategory::Explicit {
            region: Region::Face,
            gender: Gender::Female,
        },
    );
    let surface = Surface::with_layout(100.0, 100.0, 1.0);

    let mut editor = AreaEditor::new(lips.clone(), None);
    assert_eq!(editor.gender(), Some(Gender::Female));
    draw(&mut editor, &surface, (40., 60.), (60., 70.));
    editor.finalize_group("Upper lip", 200.0).unwrap();
    editor.save(&store).unwrap();

    let mut selector = AreaSelector::new(lips, None);
    selector.load(&store).unwrap();
    assert!(selector.is_ready());
    match selector.resolution() {
        Resolution::Ready(v) => assert_eq!(
            v.image,
            ImageSource::Default {
                region: Region::Face,
                gender: Gender::Female
            }
        ),
        other => panic!("unexpected resolution {:?}", other),
    }
    assert!(selector.pointer_click(egui::pos2(50., 65.), &surface).is_some());
}

#[test]
fn single_image_custom_subject_is_ungendered() {
    let store = MemoryStore::default();
    let tattoo = subject(
        "tattoo",
        SubjectCategory::Custom {
            male: None,
            female: Some("https://cdn.example.com/tattoo.png".into()),
        },
    );
    let surface = Surface::with_layout(100.0, 100.0, 1.0);

    let mut editor = AreaEditor::new(tattoo.clone(), None);
    draw(&mut editor, &surface, (0., 0.), (50., 50.));
    editor.finalize_group("Sleeve", 500.0).unwrap();
    editor.save(&store).unwrap();

    let stored = store.load_groups(&SubjectKey("tattoo".into()), None).unwrap();
    assert_eq!(stored[0].shapes, vec![Shape::new(0., 0., 50., 50.)]);

    let mut selector = AreaSelector::new(tattoo, None);
    selector.load(&store).unwrap();
    assert_eq!(selector.total_price(), 0.0);
    selector.pointer_click(egui::pos2(25., 25.), &surface);
    assert_eq!(selector.total_price(), 500.0);
}

#[test]
fn touch_shows_label_for_a_while() {
    let store = MemoryStore::default();
    let surface = Surface::with_layout(100.0, 100.0, 1.0);
    let mut editor = AreaEditor::new(face(), Some(Gender::Female));
    draw(&mut editor, &surface, (10., 10.), (30., 30.));
    editor.finalize_group("Forehead", 100.0).unwrap();
    editor.save(&store).unwrap();

    let mut selector = AreaSelector::new(face(), Some(Gender::Female))
        .with_touch_label_duration(Duration::from_secs(3));
    selector.load(&store).unwrap();

    let now = Instant::now();
    selector.touch_start(egui::pos2(20., 20.), &surface, now);
    assert!(selector.hovered().is_some());
    assert_eq!(selector.touch_label_remaining(now), Some(Duration::from_secs(3)));

    assert!(!selector.tick(now + Duration::from_secs(2)));
    assert!(selector.tick(now + Duration::from_secs(3)));
    assert!(selector.hovered().is_none());
    assert_eq!(selector.total_price(), 100.0);
}

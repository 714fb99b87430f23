use egui::Response;

/// Mouse wheel over `resp` steps `val` by `increment`, never below `min`.
pub fn make_scrollable<T>(ui: &mut egui::Ui, resp: Response, val: &mut T, increment: T, min: T)
where
    T: Copy + PartialOrd + std::ops::Add<Output = T> + std::ops::Sub<Output = T>,
{
    if resp.hovered() {
        let delta = ui.input(|i| {
            i.events.iter().find_map(|e| match e {
                egui::Event::MouseWheel { delta, .. } => Some(*delta),
                _ => None,
            })
        });
        if let Some(delta) = delta {
            if delta.y > 0. {
                *val = *val + increment;
            } else if delta.y < 0. && *val - increment >= min {
                *val = *val - increment;
            }
        }
    }
}

/// Errors list, newest first.
pub fn errors_panel(ui: &mut egui::Ui, errors: &mut Vec<String>) {
    if errors.is_empty() {
        return;
    }

    ui.heading("Errors");
    ui.horizontal(|ui| {
        if ui.button("Clear All").clicked() {
            errors.clear();
        }

        let error_count = errors.len();
        ui.label(format!(
            "({} error{})",
            error_count,
            if error_count == 1 { "" } else { "s" }
        ));
    });

    egui::ScrollArea::vertical()
        .id_salt("errors")
        .max_height(200.0)
        .show(ui, |ui| {
            for error in errors.iter().rev() {
                ui.label(egui::RichText::new(error).color(egui::Color32::from_rgb(255, 100, 100)));
                ui.separator();
            }
        });

    ui.separator();
}

use eframe::egui;

pub(super) fn draw_help_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Help & Shortcuts")
        .open(open)
        .resizable(true)
        .default_width(480.0)
        .default_height(420.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Keyboard Shortcuts");
                ui.separator();

                ui.label("General");
                help_row(ui, "⌘⇧P", "Open command palette");
                help_row(ui, "⌘E", "Export PNG...");
                help_row(ui, "+ / -", "Zoom in / out");
                help_row(ui, "F1", "Show this window");
                help_row(ui, "Escape", "Cancel current gesture / Pointer tool");

                ui.add_space(10.0);
                ui.label("Tools");
                help_row(ui, "V", "Pointer (move shapes)");
                help_row(ui, "R", "Rectangle");
                help_row(ui, "O", "Oval");
                help_row(ui, "D", "Diamond");
                help_row(ui, "L", "Line");
                help_row(ui, "A", "Arrow");
                help_row(ui, "X", "Delete");
                help_row(ui, "T / ⌘T", "Text");

                ui.add_space(10.0);
                ui.label("Canvas");
                help_row(ui, "Left click", "Use the current tool");
                help_row(ui, "Right / middle drag", "Pan");
                help_row(ui, "Scroll wheel", "Scroll");

                ui.add_space(20.0);
                ui.heading("Labels");
                ui.separator();
                ui.label("With the Text tool, click a shape and enter its label.");
                ui.label("The shape is resized around its centre to fit the text at 2:1.");

                ui.add_space(20.0);
                ui.heading("Settings");
                ui.separator();
                ui.label("Settings are read from ~/.config/flowsketch.toml or settings.toml:");
                ui.add_space(5.0);
                ui.code(r##"export_path = "flowchart.png"
label_font = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf""##);
            });
        });
}

fn help_row(ui: &mut egui::Ui, shortcut: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.add_sized(
            [130.0, 16.0],
            egui::Label::new(egui::RichText::new(shortcut).monospace().strong()),
        );
        ui.label(description);
    });
}

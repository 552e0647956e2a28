mod app;
mod canvas;
mod constants;
mod model;

fn main() -> eframe::Result<()> {
    env_logger::init();
    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Flowchart")
            .with_inner_size([1000.0, 700.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Flowchart",
        native_options,
        Box::new(|cc| Ok(Box::new(app::FlowchartEditor::new(cc)))),
    )
}

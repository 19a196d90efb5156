mod app;
mod chart;
mod color;
mod data;
mod export;
mod state;
mod ui;

use app::JitterboxApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1560.0, 900.0])
            .with_min_inner_size([900.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Jitterbox – Grouped Box + Jitter Plots",
        options,
        Box::new(|cc| Ok(Box::new(JitterboxApp::new(cc)))),
    )
}

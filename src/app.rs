use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui::{self, ColorImage};

use crate::chart::PlotOptions;
use crate::export;
use crate::state::AppState;
use crate::ui::{panels, plot, preview};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct JitterboxApp {
    pub state: AppState,
}

impl JitterboxApp {
    /// Restore persisted plot options, if any.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut state = AppState::default();
        if let Some(options) = cc
            .storage
            .and_then(|s| eframe::get_value::<PlotOptions>(s, eframe::APP_KEY))
        {
            state.options = options;
        }
        Self { state }
    }

    /// Save any screenshot that was requested by "Save Plot as PNG…".
    fn handle_screenshots(&mut self, ctx: &egui::Context) {
        let shots: Vec<(Arc<ColorImage>, PathBuf)> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Screenshot {
                        image, user_data, ..
                    } => user_data
                        .data
                        .as_ref()
                        .and_then(|u| u.downcast_ref::<PathBuf>().cloned())
                        .map(|path| (image.clone(), path)),
                    _ => None,
                })
                .collect()
        });

        let ppp = ctx.pixels_per_point();
        for (image, path) in shots {
            match export::save_chart_png(&image, self.state.chart_rect, ppp, &path) {
                Ok(()) => self.state.set_info(format!("Saved plot: {}", path.display())),
                Err(e) => self.state.set_error("Failed to save plot", e),
            }
        }
    }
}

impl eframe::App for JitterboxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_screenshots(ctx);

        // ---- Top panel: menu bar + status ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panels: row IDs, then groups ----
        egui::SidePanel::left("rows_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::rows_panel(ui, &mut self.state);
            });

        egui::SidePanel::left("groups_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::groups_panel(ui, &mut self.state);
            });

        // ---- Right side panel: plot options ----
        egui::SidePanel::right("options_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::options_panel(ui, &mut self.state);
            });

        // ---- Central panel: chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::chart_plot(ui, &mut self.state);
        });

        preview::preview_window(ctx, &mut self.state);
        panels::pending_prompt(ctx, &mut self.state);
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.state.options);
    }
}

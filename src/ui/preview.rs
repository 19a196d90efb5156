use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Dataset preview window
// ---------------------------------------------------------------------------

/// Show the first rows and columns of the loaded table, ID column first.
pub fn preview_window(ctx: &egui::Context, state: &mut AppState) {
    if !state.preview.open {
        return;
    }
    let Some(ds) = &state.dataset else {
        state.preview.open = false;
        return;
    };

    let limits = &mut state.preview;
    let mut open = true;

    egui::Window::new("Dataset Preview")
        .open(&mut open)
        .default_size([1000.0, 520.0])
        .show(ctx, |ui: &mut Ui| {
            ui.label(format!(
                "{} | {} rows × {} cols | ID column: {} | sample columns: {}",
                ds.source_name,
                ds.table.n_rows(),
                ds.table.n_cols(),
                ds.id_column(),
                ds.numeric_columns().len()
            ));
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Rows:");
                ui.add(egui::DragValue::new(&mut limits.rows).range(5..=200));
                ui.label("Columns:");
                ui.add(egui::DragValue::new(&mut limits.cols).range(2..=60));
            });
            ui.separator();

            let preview = ds.table.preview(limits.rows, limits.cols, ds.id_column());
            egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
                TableBuilder::new(ui)
                    .striped(true)
                    .resizable(true)
                    .columns(Column::auto().at_least(80.0).clip(true), preview.columns.len())
                    .header(20.0, |mut header| {
                        for name in &preview.columns {
                            header.col(|ui| {
                                ui.strong(name.as_str());
                            });
                        }
                    })
                    .body(|body| {
                        body.rows(18.0, preview.rows.len(), |mut row| {
                            let cells = &preview.rows[row.index()];
                            for cell in cells {
                                row.col(|ui| {
                                    ui.label(cell.as_str());
                                });
                            }
                        });
                    });
            });
        });

    state.preview.open = open;
}

use eframe::egui::{self, Color32, RichText, Sense, Shape, Stroke, Ui};
use egui_plot::{BoxElem, BoxPlot, BoxSpread, GridMark, Plot, Points};

use crate::chart::Chart;
use crate::color::marker_outline;
use crate::state::AppState;

const LEGEND_WIDTH: f32 = 190.0;
const SWATCH_SIZE: f32 = 14.0;

// ---------------------------------------------------------------------------
// Box + jitter chart (central panel)
// ---------------------------------------------------------------------------

/// Render the last plotted chart with its two legends and remember the
/// screen rect they cover, so PNG export can crop to it.
pub fn chart_plot(ui: &mut Ui, state: &mut AppState) {
    let Some(chart) = &state.chart else {
        state.chart_rect = None;
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Select row IDs and groups, then press \"Plot Box + Jitter\"");
        });
        return;
    };

    let response = ui.vertical(|ui: &mut Ui| {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.heading(chart.title.as_str());
        });
        ui.horizontal_top(|ui: &mut Ui| {
            let plot_width = (ui.available_width() - LEGEND_WIDTH).max(200.0);
            draw_chart(ui, chart, plot_width);
            ui.vertical(|ui: &mut Ui| {
                ui.set_width(LEGEND_WIDTH - 12.0);
                legends(ui, chart);
            });
        });
    });
    state.chart_rect = Some(response.response.rect);
}

fn draw_chart(ui: &mut Ui, chart: &Chart, width: f32) {
    let outline = ui.visuals().text_color();
    let n_bands = chart.bands.len() as f64;

    Plot::new("box_jitter_plot")
        .width(width)
        .height(ui.available_height())
        .x_axis_label(chart.x_label.as_str())
        .y_axis_label(chart.y_label.as_str())
        .x_axis_formatter(|mark: GridMark, _range| {
            chart
                .band_label(mark.value)
                .map(str::to_string)
                .unwrap_or_default()
        })
        .show_grid(chart.show_grid)
        .include_x(-0.5)
        .include_x(n_bands - 0.5)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for band in &chart.bands {
                // Empty groups keep their slot on the axis but draw no box.
                let Some(s) = &band.stats else {
                    continue;
                };
                let label = match s.outliers.len() {
                    0 => band.name.clone(),
                    n => format!("{} ({n} beyond whiskers)", band.name),
                };
                let elem = BoxElem::new(
                    band.x,
                    BoxSpread::new(s.lower_whisker, s.q1, s.median, s.q3, s.upper_whisker),
                )
                .name(label)
                .box_width(0.55)
                .whisker_width(0.3)
                .fill(Color32::TRANSPARENT)
                .stroke(Stroke::new(1.5, outline));
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&band.name));
            }

            for m in &chart.markers {
                let points = Points::new(vec![[m.x, m.y]])
                    .name(format!("{} · {}", m.sample_column, m.row_key))
                    .shape(m.shape)
                    .radius(4.5)
                    .filled(true)
                    .color(m.color.gamma_multiply(chart.marker_alpha));
                plot_ui.points(points);
            }
        });
}

// ---------------------------------------------------------------------------
// Legends
// ---------------------------------------------------------------------------

fn legends(ui: &mut Ui, chart: &Chart) {
    egui::ScrollArea::vertical()
        .id_salt("chart_legends")
        .show(ui, |ui: &mut Ui| {
            ui.strong("Sample (color)");
            for (name, color) in chart.colors.legend_entries() {
                legend_row(ui, name, |center| {
                    vec![Shape::circle_filled(center, SWATCH_SIZE * 0.35, *color)]
                });
            }

            ui.add_space(10.0);
            ui.strong("Row ID (shape)");
            for (key, shape) in chart.shapes.legend_entries() {
                let ink = ui.visuals().text_color();
                legend_row(ui, key, |center| {
                    marker_outline(*shape, center, SWATCH_SIZE * 0.4, ink)
                });
            }
            if chart.shapes.wraps() {
                ui.label(RichText::new("Shapes repeat after 10 row IDs.").italics().weak());
            }
        });
}

/// One legend line: a painted swatch followed by its label.
fn legend_row(ui: &mut Ui, label: &str, swatch: impl FnOnce(egui::Pos2) -> Vec<Shape>) {
    ui.horizontal(|ui: &mut Ui| {
        let (rect, _) = ui.allocate_exact_size(egui::vec2(SWATCH_SIZE, SWATCH_SIZE), Sense::hover());
        ui.painter().extend(swatch(rect.center()));
        ui.label(label);
    });
}

use eframe::egui::Color32;
use egui_plot::MarkerShape;
use serde::{Deserialize, Serialize};

use crate::color::{ColorMap, ShapeMap};
use crate::data::points::{PlotData, DEFAULT_JITTER_WIDTH};

// ---------------------------------------------------------------------------
// Plot options (persisted between sessions)
// ---------------------------------------------------------------------------

/// User-editable plot settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Half-width of the jitter spread, in band units.
    pub jitter_width: f64,
    /// Marker opacity, 0..=1.
    pub marker_alpha: f32,
    pub show_grid: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            title: "My Plot".into(),
            x_label: "Groups".into(),
            y_label: "Value".into(),
            jitter_width: DEFAULT_JITTER_WIDTH,
            marker_alpha: 0.8,
            show_grid: true,
        }
    }
}

fn or_default(text: &str, fallback: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

// ---------------------------------------------------------------------------
// Box statistics
// ---------------------------------------------------------------------------

/// Tukey box: quartiles by linear interpolation, whiskers at the most
/// extreme values within 1.5 × IQR of the box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let within = |v: &f64| (lo_fence..=hi_fence).contains(v);
        let lower_whisker = sorted.iter().copied().find(|v| within(v)).unwrap_or(q1);
        let upper_whisker = sorted.iter().rev().copied().find(|v| within(v)).unwrap_or(q3);
        let outliers = sorted.iter().copied().filter(|v| !within(v)).collect();

        Some(BoxStats {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            outliers,
        })
    }
}

/// Quantile of sorted data, interpolating between neighbouring ranks.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

// ---------------------------------------------------------------------------
// Chart – everything needed to draw one box + jitter plot
// ---------------------------------------------------------------------------

/// One group band at x = its index.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: String,
    pub x: f64,
    /// `None` when every cell of the group was skipped.
    pub stats: Option<BoxStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub color: Color32,
    pub shape: MarkerShape,
    pub sample_column: String,
    pub row_key: String,
}

/// A rendered-ready chart, kept by the UI as the "last plot".
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub show_grid: bool,
    pub marker_alpha: f32,
    pub bands: Vec<Band>,
    pub markers: Vec<Marker>,
    /// Sample column → colour legend.
    pub colors: ColorMap,
    /// Row key → shape legend.
    pub shapes: ShapeMap,
}

impl Chart {
    pub fn new(data: &PlotData, options: &PlotOptions) -> Self {
        let colors =
            ColorMap::from_first_appearance(data.points.iter().map(|p| p.sample_column.as_str()));
        let shapes = ShapeMap::from_first_appearance(data.points.iter().map(|p| p.row_key.as_str()));

        let bands: Vec<Band> = data
            .group_order
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values: Vec<f64> = data
                    .points
                    .iter()
                    .filter(|p| &p.group == name)
                    .map(|p| p.value)
                    .collect();
                Band {
                    name: name.clone(),
                    x: i as f64,
                    stats: BoxStats::from_values(&values),
                }
            })
            .collect();

        let markers = data
            .points
            .iter()
            .filter_map(|p| {
                let band = bands.iter().find(|b| b.name == p.group)?;
                Some(Marker {
                    x: band.x + p.jitter,
                    y: p.value,
                    color: colors.color_for(&p.sample_column),
                    shape: shapes.shape_for(&p.row_key),
                    sample_column: p.sample_column.clone(),
                    row_key: p.row_key.clone(),
                })
            })
            .collect();

        if shapes.wraps() {
            log::warn!(
                "{} row IDs share {} marker shapes; shapes repeat",
                shapes.legend_entries().len(),
                crate::color::MARKER_SHAPES.len()
            );
        }

        Chart {
            title: or_default(&options.title, "Plot"),
            x_label: or_default(&options.x_label, "X"),
            y_label: or_default(&options.y_label, "Y"),
            show_grid: options.show_grid,
            marker_alpha: options.marker_alpha.clamp(0.0, 1.0),
            bands,
            markers,
            colors,
            shapes,
        }
    }

    /// Group name for an x-axis tick, if the tick sits on a band centre.
    pub fn band_label(&self, x: f64) -> Option<&str> {
        let rounded = x.round();
        if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
            return None;
        }
        self.bands.get(rounded as usize).map(|b| b.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::points::PlotPoint;
    use pretty_assertions::assert_eq;

    fn point(group: &str, column: &str, key: &str, value: f64) -> PlotPoint {
        PlotPoint {
            group: group.into(),
            sample_column: column.into(),
            row_key: key.into(),
            value,
            jitter: 0.25,
        }
    }

    #[test]
    fn box_stats_interpolate_quartiles() {
        let s = BoxStats::from_values(&[5.0, 1.0, 4.0, 2.0]).unwrap();
        assert_eq!(s.median, 3.0);
        assert_eq!(s.q1, 1.75);
        assert_eq!(s.q3, 4.25);
        assert_eq!((s.lower_whisker, s.upper_whisker), (1.0, 5.0));
        assert!(s.outliers.is_empty());

        let s = BoxStats::from_values(&[3.0, 6.0]).unwrap();
        assert_eq!((s.q1, s.median, s.q3), (3.75, 4.5, 5.25));

        let s = BoxStats::from_values(&[7.0]).unwrap();
        assert_eq!((s.lower_whisker, s.median, s.upper_whisker), (7.0, 7.0, 7.0));

        assert_eq!(BoxStats::from_values(&[]), None);
    }

    #[test]
    fn tukey_whiskers_exclude_outliers() {
        let s = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert_eq!(s.upper_whisker, 5.0);
        assert_eq!(s.lower_whisker, 1.0);
        assert_eq!(s.outliers, vec![100.0]);
    }

    #[test]
    fn chart_for_wt_ko_scenario() {
        let data = PlotData {
            points: vec![
                point("WT", "A_WT", "g1", 1.0),
                point("WT", "A_WT", "g2", 4.0),
                point("WT", "B_WT", "g1", 2.0),
                point("WT", "B_WT", "g2", 5.0),
                point("KO", "A_KO", "g1", 3.0),
                point("KO", "A_KO", "g2", 6.0),
            ],
            group_order: vec!["WT".into(), "KO".into()],
            ..Default::default()
        };
        let chart = Chart::new(&data, &PlotOptions::default());

        assert_eq!(chart.bands.len(), 2);
        assert_eq!(chart.bands[0].stats, BoxStats::from_values(&[1.0, 2.0, 4.0, 5.0]));
        assert_eq!(chart.bands[1].stats, BoxStats::from_values(&[3.0, 6.0]));

        let samples: Vec<&str> =
            chart.colors.legend_entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(samples, vec!["A_WT", "B_WT", "A_KO"]);
        let keys: Vec<&str> = chart.shapes.legend_entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(keys, vec!["g1", "g2"]);

        assert_eq!(chart.markers.len(), 6);
        assert_eq!(chart.markers[4].x, 1.25);
        assert_eq!(chart.markers[4].color, chart.colors.color_for("A_KO"));
        assert_eq!(chart.markers[4].shape, MarkerShape::Circle);
        assert_eq!(chart.markers[5].shape, MarkerShape::Square);
    }

    #[test]
    fn group_with_only_skipped_cells_keeps_band_without_box() {
        use crate::data::groups::GroupRegistry;
        use crate::data::model::{Dataset, DuplicatePolicy, Table};
        use crate::data::points;
        use crate::data::selection::Selection;

        let cols = ["ID", "A_WT", "A_KO"].map(String::from).to_vec();
        let rows = [["g1", "1", "NA"], ["g2", "2", "n/a"], ["g3", "3", "5"]]
            .into_iter()
            .map(|r| r.map(String::from).to_vec())
            .collect();
        let ds = Dataset::new(Table::new(cols, rows).unwrap(), "t.tsv", DuplicatePolicy::Reject)
            .unwrap();

        let mut reg = GroupRegistry::default();
        reg.create_group("WT").unwrap();
        reg.create_group("KO").unwrap();
        reg.add_column("WT", "A_WT", &ds).unwrap();
        reg.add_column("KO", "A_KO", &ds).unwrap();
        let mut sel = Selection::default();
        sel.select_all(["g1", "g2"]);

        let data = points::build(&ds, &reg, &sel, 0.1).unwrap();
        assert_eq!(data.skipped_count(), 2);
        let chart = Chart::new(&data, &PlotOptions::default());

        let names: Vec<&str> = chart.bands.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["WT", "KO"]);
        assert_eq!(chart.bands[0].stats, BoxStats::from_values(&[1.0, 2.0]));
        assert_eq!(chart.bands[1].stats, None);
        assert_eq!(chart.markers.len(), 2);
        assert!(chart.markers.iter().all(|m| m.sample_column == "A_WT"));
        assert_eq!(chart.band_label(1.0), Some("KO"));
    }

    #[test]
    fn blank_labels_fall_back_and_ticks_map_to_bands() {
        let data = PlotData {
            points: vec![point("G", "c", "k", 1.0)],
            group_order: vec!["G".into()],
            ..Default::default()
        };
        let options = PlotOptions {
            title: "  ".into(),
            x_label: String::new(),
            ..Default::default()
        };
        let chart = Chart::new(&data, &options);
        assert_eq!(chart.title, "Plot");
        assert_eq!(chart.x_label, "X");
        assert_eq!(chart.y_label, "Value");

        assert_eq!(chart.band_label(0.0), Some("G"));
        assert_eq!(chart.band_label(0.5), None);
        assert_eq!(chart.band_label(1.0), None);
        assert_eq!(chart.band_label(-1.0), None);
    }
}

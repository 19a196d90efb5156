use std::collections::BTreeSet;

use eframe::egui::{vec2, Color32, Pos2, Shape, Stroke};
use egui_plot::MarkerShape;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Distinct names in order of first appearance.
fn first_appearance<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names
        .into_iter()
        .filter(|n| seen.insert(*n))
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Sample column → Color32
// ---------------------------------------------------------------------------

/// Colours sample columns; the first column seen gets the first palette
/// entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    entries: Vec<(String, Color32)>,
    default_color: Color32,
}

impl ColorMap {
    pub fn from_first_appearance<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let names = first_appearance(names);
        let palette = generate_palette(names.len());
        ColorMap {
            entries: names.into_iter().zip(palette).collect(),
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, name: &str) -> Color32 {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| *c)
            .unwrap_or(self.default_color)
    }

    /// Legend entries (sample → colour) in first-appearance order.
    pub fn legend_entries(&self) -> &[(String, Color32)] {
        &self.entries
    }
}

// ---------------------------------------------------------------------------
// Row key → MarkerShape
// ---------------------------------------------------------------------------

/// Marker shapes handed out to row keys, in order. The list is cyclic:
/// key `i` gets `MARKER_SHAPES[i % MARKER_SHAPES.len()]`.
pub const MARKER_SHAPES: [MarkerShape; 10] = [
    MarkerShape::Circle,
    MarkerShape::Square,
    MarkerShape::Up,
    MarkerShape::Diamond,
    MarkerShape::Down,
    MarkerShape::Cross,
    MarkerShape::Plus,
    MarkerShape::Asterisk,
    MarkerShape::Left,
    MarkerShape::Right,
];

/// Painter shapes drawing `shape` at `center`, with the same geometry
/// egui_plot uses for its markers. Used for legend swatches.
pub fn marker_outline(shape: MarkerShape, center: Pos2, radius: f32, color: Color32) -> Vec<Shape> {
    let sqrt_3 = 3f32.sqrt();
    let half_sqrt_3 = sqrt_3 / 2.0;
    let inv_sqrt_2 = std::f32::consts::FRAC_1_SQRT_2;
    let at = |dx: f32, dy: f32| center + radius * vec2(dx, dy);
    let stroke = Stroke::new(1.5, color);
    let filled = |points: Vec<Pos2>| Shape::convex_polygon(points, color, Stroke::NONE);

    match shape {
        MarkerShape::Circle => vec![Shape::circle_filled(center, radius, color)],
        MarkerShape::Square => vec![filled(vec![
            at(inv_sqrt_2, inv_sqrt_2),
            at(-inv_sqrt_2, inv_sqrt_2),
            at(-inv_sqrt_2, -inv_sqrt_2),
            at(inv_sqrt_2, -inv_sqrt_2),
        ])],
        MarkerShape::Diamond => vec![filled(vec![
            at(1.0, 0.0),
            at(0.0, -1.0),
            at(-1.0, 0.0),
            at(0.0, 1.0),
        ])],
        MarkerShape::Up => vec![filled(vec![
            at(0.0, -1.0),
            at(0.5 * sqrt_3, 0.5),
            at(-0.5 * sqrt_3, 0.5),
        ])],
        MarkerShape::Down => vec![filled(vec![
            at(0.0, 1.0),
            at(-0.5 * sqrt_3, -0.5),
            at(0.5 * sqrt_3, -0.5),
        ])],
        MarkerShape::Left => vec![filled(vec![
            at(-1.0, 0.0),
            at(0.5, -0.5 * sqrt_3),
            at(0.5, 0.5 * sqrt_3),
        ])],
        MarkerShape::Right => vec![filled(vec![
            at(1.0, 0.0),
            at(-0.5, 0.5 * sqrt_3),
            at(-0.5, -0.5 * sqrt_3),
        ])],
        MarkerShape::Cross => vec![
            Shape::line_segment([at(-inv_sqrt_2, -inv_sqrt_2), at(inv_sqrt_2, inv_sqrt_2)], stroke),
            Shape::line_segment([at(inv_sqrt_2, -inv_sqrt_2), at(-inv_sqrt_2, inv_sqrt_2)], stroke),
        ],
        MarkerShape::Plus => vec![
            Shape::line_segment([at(-1.0, 0.0), at(1.0, 0.0)], stroke),
            Shape::line_segment([at(0.0, -1.0), at(0.0, 1.0)], stroke),
        ],
        MarkerShape::Asterisk => vec![
            Shape::line_segment([at(0.0, -1.0), at(0.0, 1.0)], stroke),
            Shape::line_segment([at(-half_sqrt_3, 0.5), at(half_sqrt_3, -0.5)], stroke),
            Shape::line_segment([at(-half_sqrt_3, -0.5), at(half_sqrt_3, 0.5)], stroke),
        ],
    }
}

/// Marker shapes for row keys, by first appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMap {
    entries: Vec<(String, MarkerShape)>,
}

impl ShapeMap {
    pub fn from_first_appearance<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        ShapeMap {
            entries: first_appearance(keys)
                .into_iter()
                .enumerate()
                .map(|(i, k)| (k, MARKER_SHAPES[i % MARKER_SHAPES.len()]))
                .collect(),
        }
    }

    pub fn shape_for(&self, key: &str) -> MarkerShape {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, s)| *s)
            .unwrap_or(MarkerShape::Circle)
    }

    /// Whether some shapes are shared because there are more keys than
    /// shapes.
    pub fn wraps(&self) -> bool {
        self.entries.len() > MARKER_SHAPES.len()
    }

    /// Legend entries (row key → shape) in first-appearance order.
    pub fn legend_entries(&self) -> &[(String, MarkerShape)] {
        &self.entries
    }
}

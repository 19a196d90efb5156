use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::{DataError, Result};
use super::groups::GroupRegistry;
use super::model::Dataset;
use super::selection::Selection;

// ---------------------------------------------------------------------------
// PlotPoint – one marker of the box + jitter plot
// ---------------------------------------------------------------------------

/// Seed of the per-band jitter generator. Band `i` uses `JITTER_SEED + i`.
pub const JITTER_SEED: u64 = 2026;

/// Half-width of the jitter spread, in band units, when none is configured.
pub const DEFAULT_JITTER_WIDTH: f64 = 0.06;

/// A single value placed in a group band.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotPoint {
    pub group: String,
    pub sample_column: String,
    pub row_key: String,
    pub value: f64,
    /// Horizontal offset from the band centre.
    pub jitter: f64,
}

/// A cell that could not be read as a number and was left out.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCell {
    pub group: String,
    pub column: String,
    pub row_key: String,
    pub raw: String,
}

/// Output of [`build`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotData {
    /// Ordered by group, then the group's columns, then selection order.
    pub points: Vec<PlotPoint>,
    /// Groups that received a band, in registry order.
    pub group_order: Vec<String>,
    /// Groups with no columns; they get no band.
    pub empty_groups: Vec<String>,
    pub skipped: Vec<SkippedCell>,
}

impl PlotData {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Join dataset, groups and selection into plot points.
///
/// Every (group, column) pair is crossed with every selected row key.
/// Cells that are not numbers are skipped and reported, never fatal.
/// Jitter offsets are drawn uniformly from `[-jitter_width, jitter_width]`
/// by a generator seeded per band, so identical inputs give identical
/// output.
pub fn build(
    dataset: &Dataset,
    registry: &GroupRegistry,
    selection: &Selection,
    jitter_width: f64,
) -> Result<PlotData> {
    if selection.is_empty() {
        return Err(DataError::EmptySelection);
    }
    if let Some(missing) = selection.keys().iter().find(|k| !dataset.contains_key(k)) {
        return Err(DataError::UnknownRowKey(missing.clone()));
    }
    if registry.groups().iter().all(|g| g.columns.is_empty()) {
        return Err(DataError::NoGroups);
    }

    let width = jitter_width.abs();
    let mut data = PlotData::default();

    for group in registry.groups() {
        if group.columns.is_empty() {
            data.empty_groups.push(group.name.clone());
            continue;
        }
        let band = data.group_order.len() as u64;
        data.group_order.push(group.name.clone());
        let mut rng = StdRng::seed_from_u64(JITTER_SEED.wrapping_add(band));

        for column in &group.columns {
            for row_key in selection.keys() {
                match dataset.value(row_key, column) {
                    Ok(value) => {
                        let jitter = if width > 0.0 {
                            rng.gen_range(-width..=width)
                        } else {
                            0.0
                        };
                        data.points.push(PlotPoint {
                            group: group.name.clone(),
                            sample_column: column.clone(),
                            row_key: row_key.clone(),
                            value,
                            jitter,
                        })
                    }
                    Err(DataError::InvalidNumericCell { value, .. }) => {
                        data.skipped.push(SkippedCell {
                            group: group.name.clone(),
                            column: column.clone(),
                            row_key: row_key.clone(),
                            raw: value,
                        })
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }

    if !data.empty_groups.is_empty() {
        log::warn!("Groups without columns: {}", data.empty_groups.join(", "));
    }
    if !data.skipped.is_empty() {
        log::warn!("Skipped {} non-numeric cell(s)", data.skipped.len());
    }
    log::info!(
        "Built {} points in {} group(s) for {} row(s)",
        data.points.len(),
        data.group_order.len(),
        selection.len()
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{DuplicatePolicy, Table};
    use pretty_assertions::assert_eq;

    fn dataset(rows: &[[&str; 4]]) -> Dataset {
        let table = Table::new(
            ["ID", "A_WT", "B_WT", "A_KO"].iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap();
        Dataset::new(table, "demo.tsv", DuplicatePolicy::Reject).unwrap()
    }

    fn registry(ds: &Dataset) -> GroupRegistry {
        let mut r = GroupRegistry::default();
        r.create_group("WT").unwrap();
        r.add_column("WT", "A_WT", ds).unwrap();
        r.add_column("WT", "B_WT", ds).unwrap();
        r.create_group("KO").unwrap();
        r.add_column("KO", "A_KO", ds).unwrap();
        r
    }

    fn selection(keys: &[&str]) -> Selection {
        let mut s = Selection::default();
        s.select_all(keys.iter().copied());
        s
    }

    #[test]
    fn wt_ko_scenario() {
        let ds = dataset(&[["g1", "1", "2", "3"], ["g2", "4", "5", "6"]]);
        let data = build(&ds, &registry(&ds), &selection(&["g1", "g2"]), 0.1).unwrap();

        assert_eq!(data.points.len(), 6);
        assert_eq!(data.group_order, vec!["WT", "KO"]);
        let order: Vec<(&str, &str, &str, f64)> = data
            .points
            .iter()
            .map(|p| (p.group.as_str(), p.sample_column.as_str(), p.row_key.as_str(), p.value))
            .collect();
        assert_eq!(
            order,
            vec![
                ("WT", "A_WT", "g1", 1.0),
                ("WT", "A_WT", "g2", 4.0),
                ("WT", "B_WT", "g1", 2.0),
                ("WT", "B_WT", "g2", 5.0),
                ("KO", "A_KO", "g1", 3.0),
                ("KO", "A_KO", "g2", 6.0),
            ]
        );
        assert!(data.points.iter().all(|p| p.jitter.abs() <= 0.1));
    }

    #[test]
    fn empty_selection_fails_first() {
        let ds = dataset(&[["g1", "1", "2", "3"]]);
        let empty = Selection::default();
        assert!(matches!(
            build(&ds, &registry(&ds), &empty, 0.1),
            Err(DataError::EmptySelection)
        ));
        assert!(matches!(
            build(&ds, &GroupRegistry::default(), &empty, 0.1),
            Err(DataError::EmptySelection)
        ));
    }

    #[test]
    fn registry_without_columns_is_no_groups() {
        let ds = dataset(&[["g1", "1", "2", "3"]]);
        let sel = selection(&["g1"]);
        assert!(matches!(
            build(&ds, &GroupRegistry::default(), &sel, 0.1),
            Err(DataError::NoGroups)
        ));
        assert!(matches!(
            build(&ds, &GroupRegistry::with_starter_groups(), &sel, 0.1),
            Err(DataError::NoGroups)
        ));
    }

    #[test]
    fn unknown_row_key_is_reported() {
        let ds = dataset(&[["g1", "1", "2", "3"]]);
        assert!(matches!(
            build(&ds, &registry(&ds), &selection(&["g1", "zz"]), 0.1),
            Err(DataError::UnknownRowKey(k)) if k == "zz"
        ));
    }

    #[test]
    fn non_numeric_cells_are_counted_not_fatal() {
        let ds = dataset(&[
            ["g1", "1", "NA", "3"],
            ["g2", "4", "5", "oops"],
            ["g3", "7", "8", "9"],
        ]);
        // A_KO is too dirty to be offered as a sample column here, so the
        // groups are set up against a clean copy of the layout.
        let clean = dataset(&[["g1", "1", "2", "3"]]);
        let mut reg = registry(&clean);
        reg.create_group("Empty").unwrap();

        let data = build(&ds, &reg, &selection(&["g1", "g2", "g3"]), 0.1).unwrap();

        // 3 rows × 3 pairs, minus the two unreadable cells
        assert_eq!(data.skipped_count(), 2);
        assert_eq!(data.points.len(), 3 * 3 - data.skipped_count());
        assert_eq!(data.empty_groups, vec!["Empty"]);
        assert_eq!(data.group_order, vec!["WT", "KO"]);
        assert_eq!(
            data.skipped[1],
            SkippedCell {
                group: "KO".into(),
                column: "A_KO".into(),
                row_key: "g2".into(),
                raw: "oops".into(),
            }
        );
    }

    #[test]
    fn repeated_builds_are_identical() {
        let ds = dataset(&[["g1", "1", "2", "3"], ["g2", "4", "5", "6"]]);
        let reg = registry(&ds);
        let sel = selection(&["g2", "g1"]);

        let a = build(&ds, &reg, &sel, 0.2).unwrap();
        let b = build(&ds, &reg, &sel, 0.2).unwrap();
        assert_eq!(a, b);
        // jitter actually spreads points
        assert!(a.points.windows(2).any(|w| w[0].jitter != w[1].jitter));
    }

    #[test]
    fn zero_width_means_no_jitter() {
        let ds = dataset(&[["g1", "1", "2", "3"]]);
        let data = build(&ds, &registry(&ds), &selection(&["g1"]), 0.0).unwrap();
        assert!(data.points.iter().all(|p| p.jitter == 0.0));
    }
}

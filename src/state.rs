use std::fmt::Display;
use std::path::Path;

use eframe::egui::Rect;

use crate::chart::{Chart, PlotOptions};
use crate::data::error::DataError;
use crate::data::groups::{self, GroupRegistry};
use crate::data::loader;
use crate::data::model::{detect_id_column, Dataset, DuplicatePolicy, Table};
use crate::data::points;
use crate::data::selection::Selection;

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

// ---------------------------------------------------------------------------
// Duplicate row keys waiting for a user decision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum PendingDuplicates {
    /// A freshly loaded table whose detected ID column has duplicates.
    Load {
        table: Table,
        source_name: String,
        keys: Vec<String>,
    },
    /// The user picked an ID column with duplicates.
    IdColumn { column: String, keys: Vec<String> },
}

impl PendingDuplicates {
    pub fn keys(&self) -> &[String] {
        match self {
            PendingDuplicates::Load { keys, .. } | PendingDuplicates::IdColumn { keys, .. } => keys,
        }
    }
}

/// Row/column limits of the preview window.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewState {
    pub open: bool,
    pub rows: usize,
    pub cols: usize,
}

impl Default for PreviewState {
    fn default() -> Self {
        Self {
            open: false,
            rows: 15,
            cols: 12,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<Dataset>,

    /// User-defined groups, in band order.
    pub groups: GroupRegistry,

    /// Group whose columns the group panel is editing.
    pub active_group: Option<String>,

    /// Text field for renaming the active group.
    pub rename_buffer: String,

    /// Row keys picked for plotting.
    pub selection: Selection,

    /// Search text of the row-key checklist.
    pub id_search: String,

    pub options: PlotOptions,

    /// The last plotted chart.
    pub chart: Option<Chart>,

    /// Screen rect of the chart, recorded each frame for PNG export.
    pub chart_rect: Option<Rect>,

    pub pending: Option<PendingDuplicates>,

    pub preview: PreviewState,

    /// Status / error message shown in the UI.
    pub status: Option<Status>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            groups: GroupRegistry::default(),
            active_group: None,
            rename_buffer: String::new(),
            selection: Selection::default(),
            id_search: String::new(),
            options: PlotOptions::default(),
            chart: None,
            chart_rect: None,
            pending: None,
            preview: PreviewState::default(),
            status: None,
        }
    }
}

impl AppState {
    pub fn set_info(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log::info!("{msg}");
        self.status = Some(Status::Info(msg));
    }

    pub fn set_error(&mut self, context: &str, err: impl Display) {
        let msg = format!("{context}: {err:#}");
        log::error!("{msg}");
        self.status = Some(Status::Error(msg));
    }

    // -- loading --

    /// Load a file. On failure the current dataset stays as it is.
    pub fn load_path(&mut self, path: &Path) {
        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match loader::load_file(path) {
            Ok(table) => self.ingest_table(table, source_name),
            Err(e) => self.set_error("Failed to load dataset", e),
        }
    }

    /// Turn a parsed table into the current dataset, or park it when its
    /// ID column has duplicate keys.
    pub fn ingest_table(&mut self, table: Table, source_name: String) {
        let id_idx = detect_id_column(table.columns());
        let keys = table.duplicate_values(id_idx);
        if !keys.is_empty() {
            self.set_error(
                "Duplicate row IDs",
                format!("'{}' repeats {}", table.columns()[id_idx], keys.join(", ")),
            );
            self.pending = Some(PendingDuplicates::Load {
                table,
                source_name,
                keys,
            });
            return;
        }
        match Dataset::new(table, &source_name, DuplicatePolicy::Reject) {
            Ok(ds) => self.set_dataset(ds),
            Err(e) => self.set_error("Failed to load dataset", e),
        }
    }

    /// Ingest a newly loaded dataset and reset everything derived from the
    /// previous one.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.set_info(format!(
            "Loaded: {} | rows={} cols={} | ID col={}",
            dataset.source_name,
            dataset.table.n_rows(),
            dataset.table.n_cols(),
            dataset.id_column()
        ));
        self.groups = GroupRegistry::with_starter_groups();
        self.active_group = self.groups.groups().first().map(|g| g.name.clone());
        self.rename_buffer = self.active_group.clone().unwrap_or_default();
        self.selection.clear();
        self.id_search.clear();
        self.chart = None;
        self.pending = None;
        self.dataset = Some(dataset);
    }

    /// Answer the duplicate-key prompt: continue with suffixed keys, or
    /// drop the pending change.
    pub fn resolve_pending(&mut self, proceed: bool) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if !proceed {
            match pending {
                PendingDuplicates::Load { source_name, .. } => {
                    self.set_info(format!("Did not load {source_name}; kept the previous dataset"))
                }
                PendingDuplicates::IdColumn { .. } => self.set_info("Kept the previous ID column"),
            }
            return;
        }
        match pending {
            PendingDuplicates::Load {
                table, source_name, ..
            } => match Dataset::new(table, &source_name, DuplicatePolicy::Disambiguate) {
                Ok(ds) => self.set_dataset(ds),
                Err(e) => self.set_error("Failed to load dataset", e),
            },
            PendingDuplicates::IdColumn { column, .. } => {
                self.apply_id_column(&column, DuplicatePolicy::Disambiguate)
            }
        }
    }

    // -- ID column --

    pub fn change_id_column(&mut self, column: &str) {
        self.apply_id_column(column, DuplicatePolicy::Reject);
    }

    fn apply_id_column(&mut self, column: &str, policy: DuplicatePolicy) {
        let Some(ds) = self.dataset.as_mut() else {
            return;
        };
        if ds.id_column() == column && policy == DuplicatePolicy::Reject {
            return;
        }
        match ds.set_id_column(column, policy) {
            Ok(()) => {
                let dropped = self.groups.retain_columns(ds);
                for (group, col) in &dropped {
                    log::warn!("Removed '{col}' from group '{group}': no longer a sample column");
                }
                let lost = self.selection.retain_known(ds);
                if lost > 0 {
                    log::info!("Dropped {lost} selected row key(s) after ID change");
                }
                self.chart = None;
                self.set_info(format!("ID column changed to '{column}'."));
            }
            Err(DataError::DuplicateRowKey { keys }) => {
                self.set_error(
                    "Duplicate row IDs",
                    format!("'{column}' repeats {}", keys.join(", ")),
                );
                self.pending = Some(PendingDuplicates::IdColumn {
                    column: column.to_string(),
                    keys,
                });
            }
            Err(e) => self.set_error("Cannot change ID column", e),
        }
    }

    // -- groups --

    pub fn select_group(&mut self, name: &str) {
        self.active_group = Some(name.to_string());
        self.rename_buffer = name.to_string();
    }

    pub fn add_group(&mut self) {
        let name = self.groups.next_default_name();
        match self.groups.create_group(&name) {
            Ok(name) => self.select_group(&name),
            Err(e) => self.set_error("Cannot add group", e),
        }
    }

    pub fn rename_active_group(&mut self) {
        let Some(old) = self.active_group.clone() else {
            return;
        };
        let new = self.rename_buffer.trim().to_string();
        match self.groups.rename_group(&old, &new) {
            Ok(()) => self.select_group(&new),
            Err(e) => self.set_error("Cannot rename group", e),
        }
    }

    pub fn remove_active_group(&mut self) {
        let Some(name) = self.active_group.clone() else {
            return;
        };
        let idx = self
            .groups
            .groups()
            .iter()
            .position(|g| g.name == name)
            .unwrap_or(0);
        if let Err(e) = self.groups.delete_group(&name) {
            self.set_error("Cannot remove group", e);
            return;
        }
        if self.groups.is_empty() {
            self.active_group = None;
            self.rename_buffer.clear();
            return;
        }
        let next = self.groups.groups()[idx.min(self.groups.len() - 1)].name.clone();
        self.select_group(&next);
    }

    /// Check or uncheck a column in the active group.
    pub fn set_column_membership(&mut self, column: &str, member: bool) {
        let (Some(group), Some(ds)) = (self.active_group.clone(), self.dataset.as_ref()) else {
            return;
        };
        let result = if member {
            self.groups.add_column(&group, column, ds)
        } else {
            self.groups.remove_column(&group, column)
        };
        if let Err(e) = result {
            self.set_error("Cannot change group", e);
        }
    }

    pub fn select_all_columns(&mut self) {
        let (Some(group), Some(ds)) = (self.active_group.clone(), self.dataset.as_ref()) else {
            return;
        };
        if let Err(e) = self.groups.set_all_columns(&group, ds) {
            self.set_error("Cannot change group", e);
        }
    }

    pub fn clear_all_columns(&mut self) {
        let Some(group) = self.active_group.clone() else {
            return;
        };
        if let Err(e) = self.groups.clear_columns(&group) {
            self.set_error("Cannot change group", e);
        }
    }

    pub fn export_groups(&mut self, path: &Path) {
        let Some(ds) = self.dataset.as_ref() else {
            return;
        };
        match groups::save_groups(path, &self.groups, ds) {
            Ok(()) => self.set_info(format!("Exported groups: {}", path.display())),
            Err(e) => self.set_error("Failed to export groups", e),
        }
    }

    /// Replace the groups with the file's. Unknown columns are reported,
    /// the rest is kept.
    pub fn import_groups(&mut self, path: &Path) {
        let Some(ds) = self.dataset.as_ref() else {
            return;
        };
        match groups::load_groups(path, ds) {
            Ok(report) => {
                let warning = report.unknown_error();
                self.groups = report.registry;
                let first = self.groups.groups().first().map(|g| g.name.clone());
                match first {
                    Some(n) => self.select_group(&n),
                    None => self.active_group = None,
                }
                match warning {
                    Some(e) => self.set_error("Imported groups with warnings", e),
                    None => self.set_info(format!("Imported groups: {}", path.display())),
                }
            }
            Err(e) => self.set_error("Failed to import groups", e),
        }
    }

    /// Write the loaded table back out as plain TSV.
    pub fn export_table(&mut self, path: &Path) {
        let Some(ds) = self.dataset.as_ref() else {
            return;
        };
        let result = std::fs::File::create(path)
            .and_then(|f| ds.table.write_tsv(std::io::BufWriter::new(f)));
        match result {
            Ok(()) => self.set_info(format!("Saved table: {}", path.display())),
            Err(e) => self.set_error(
                "Failed to save table",
                DataError::Io {
                    path: path.to_path_buf(),
                    source: e,
                },
            ),
        }
    }

    // -- plotting --

    /// Build points and the chart. On failure the previous chart stays.
    pub fn plot(&mut self) {
        let Some(ds) = self.dataset.as_ref() else {
            self.set_error("Cannot plot", "load a dataset first");
            return;
        };
        let data = match points::build(ds, &self.groups, &self.selection, self.options.jitter_width)
        {
            Ok(data) => data,
            Err(e) => {
                self.set_error("Cannot plot", e);
                return;
            }
        };

        let chart = Chart::new(&data, &self.options);
        let mut notes = vec![format!("Plotted {} points", data.points.len())];
        if let Some(first) = data.skipped.first() {
            notes.push(format!(
                "{} non-numeric cell(s) skipped, e.g. {}/{} = '{}' in {}",
                data.skipped_count(),
                first.row_key,
                first.column,
                first.raw,
                first.group
            ));
        }
        if !data.empty_groups.is_empty() {
            notes.push(format!(
                "groups without columns: {}",
                data.empty_groups.join(", ")
            ));
        }
        if chart.shapes.wraps() {
            notes.push("marker shapes repeat (more row IDs than shapes)".to_string());
        }
        self.chart = Some(chart);
        self.set_info(notes.join(" | "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    fn loaded(text: &str) -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "data.tsv", text);
        let mut state = AppState::default();
        state.load_path(&path);
        (dir, state)
    }

    #[test]
    fn load_resets_groups_and_selection() {
        let (_dir, state) = loaded("ID\tA_WT\tA_KO\ng1\t1\t2\n");
        let ds = state.dataset.as_ref().unwrap();
        assert_eq!(ds.source_name, "data.tsv");
        let names: Vec<&str> = state.groups.groups().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Group 1", "Group 2"]);
        assert_eq!(state.active_group.as_deref(), Some("Group 1"));
        assert!(matches!(state.status, Some(Status::Info(_))));
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let (dir, mut state) = loaded("ID\tA\ng1\t1\n");
        let bad = write(&dir, "bad.tsv", "ID\tA\ng1\n");
        state.load_path(&bad);
        assert_eq!(state.dataset.as_ref().unwrap().source_name, "data.tsv");
        assert!(matches!(state.status, Some(Status::Error(_))));
    }

    #[test]
    fn duplicate_keys_wait_for_the_user() {
        let (_dir, mut state) = loaded("ID\tA\ng1\t1\ng1\t2\n");
        assert!(state.dataset.is_none());
        assert_eq!(state.pending.as_ref().unwrap().keys(), &["g1"]);

        state.resolve_pending(true);
        assert!(state.pending.is_none());
        assert_eq!(state.dataset.as_ref().unwrap().row_keys(), &["g1", "g1#2"]);
    }

    #[test]
    fn declined_id_change_keeps_old_column() {
        let (_dir, mut state) = loaded("ID\tbatch\tA\ng1\tx\t1\ng2\tx\t2\n");
        state.change_id_column("batch");
        assert!(matches!(state.pending, Some(PendingDuplicates::IdColumn { .. })));
        state.resolve_pending(false);
        assert_eq!(state.dataset.as_ref().unwrap().id_column(), "ID");
    }

    #[test]
    fn cancelled_load_reports_the_kept_dataset() {
        let (dir, mut state) = loaded("ID\tA\ng1\t1\n");
        let dup = write(&dir, "dup.tsv", "ID\tA\ng1\t1\ng1\t2\n");
        state.load_path(&dup);
        state.resolve_pending(false);

        assert_eq!(state.dataset.as_ref().unwrap().source_name, "data.tsv");
        assert!(
            matches!(&state.status, Some(Status::Info(m)) if m.contains("previous dataset")),
            "{:?}",
            state.status
        );
    }

    #[test]
    fn accepted_id_change_suffixes_keys_and_prunes_groups() {
        let (_dir, mut state) = loaded("ID\tA\tB\ng1\t1\t2\ng2\t1\t4\n");
        state.set_column_membership("A", true);
        state.set_column_membership("B", true);

        state.change_id_column("A");
        assert_eq!(state.pending.as_ref().unwrap().keys(), &["1"]);
        assert_eq!(state.dataset.as_ref().unwrap().id_column(), "ID");

        state.resolve_pending(true);
        let ds = state.dataset.as_ref().unwrap();
        assert!(state.pending.is_none());
        assert_eq!(ds.id_column(), "A");
        assert_eq!(ds.row_keys(), &["1", "1#2"]);
        assert_eq!(state.groups.get("Group 1").unwrap().columns, vec!["B"]);
    }

    #[test]
    fn plot_scenario_and_errors() {
        let (_dir, mut state) = loaded("ID\tA_WT\tB_WT\tA_KO\ng1\t1\t2\t3\ng2\t4\t5\t6\n");

        state.plot();
        assert!(matches!(&state.status, Some(Status::Error(m)) if m.contains("no row IDs")));
        assert!(state.chart.is_none());

        state.selection.select_all(["g1", "g2"]);
        state.plot();
        assert!(matches!(&state.status, Some(Status::Error(m)) if m.contains("no group")));

        state.rename_buffer = "WT".into();
        state.rename_active_group();
        state.set_column_membership("A_WT", true);
        state.set_column_membership("B_WT", true);
        state.select_group("Group 2");
        state.rename_buffer = "KO".into();
        state.rename_active_group();
        state.set_column_membership("A_KO", true);

        state.plot();
        let chart = state.chart.as_ref().unwrap();
        assert_eq!(chart.markers.len(), 6);
        let bands: Vec<&str> = chart.bands.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(bands, vec!["WT", "KO"]);
    }

    #[test]
    fn id_change_prunes_group_members() {
        let (_dir, mut state) = loaded("ID\tA\tB\ng1\t1\t2\ng2\t3\t4\n");
        state.set_column_membership("A", true);
        state.set_column_membership("B", true);
        state.selection.select("g1");

        state.change_id_column("A");
        assert_eq!(state.groups.get("Group 1").unwrap().columns, vec!["B"]);
        assert!(state.selection.is_empty());
    }

    #[test]
    fn removing_groups_moves_selection() {
        let (_dir, mut state) = loaded("ID\tA\ng1\t1\n");
        state.add_group();
        assert_eq!(state.active_group.as_deref(), Some("Group 3"));
        state.remove_active_group();
        assert_eq!(state.active_group.as_deref(), Some("Group 2"));
        state.remove_active_group();
        state.remove_active_group();
        assert_eq!(state.active_group, None);
        assert!(state.groups.is_empty());
    }

    #[test]
    fn saved_table_loads_back_unchanged() {
        let (dir, mut state) = loaded("ID\tA\tB\ng1\t1\tNA\ng2\t3\t4\n");
        let path = dir.path().join("copy.tsv");
        state.export_table(&path);

        let copy = loader::load_file(&path).unwrap();
        let original = &state.dataset.as_ref().unwrap().table;
        assert_eq!(copy.columns(), original.columns());
        assert_eq!(copy.cell(0, 2), "NA");
        assert_eq!(copy.cell(1, 1), "3");
    }

    #[test]
    fn group_files_round_trip_through_state() {
        let (dir, mut state) = loaded("ID\tA\tB\ng1\t1\t2\n");
        state.set_column_membership("B", true);
        let path = dir.path().join("groups.txt");
        state.export_groups(&path);

        state.clear_all_columns();
        state.import_groups(&path);
        assert_eq!(state.groups.get("Group 1").unwrap().columns, vec!["B"]);
        assert!(matches!(state.status, Some(Status::Info(_))));
    }
}

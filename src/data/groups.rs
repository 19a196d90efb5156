use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{DataError, Result};
use super::model::Dataset;

// ---------------------------------------------------------------------------
// Group – one x-axis band of the plot
// ---------------------------------------------------------------------------

/// A user-named, ordered set of sample columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub columns: Vec<String>,
}

impl Group {
    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

// ---------------------------------------------------------------------------
// GroupRegistry
// ---------------------------------------------------------------------------

/// Groups in creation order. Order matters: it is the left-to-right band
/// order of the plot.
///
/// A column may belong to any number of groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupRegistry {
    groups: Vec<Group>,
}

impl GroupRegistry {
    /// The two empty groups every freshly loaded dataset starts with.
    pub fn with_starter_groups() -> Self {
        let mut registry = GroupRegistry::default();
        for _ in 0..2 {
            let name = registry.next_default_name();
            registry.groups.push(Group {
                name,
                columns: Vec::new(),
            });
        }
        registry
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.groups
            .iter()
            .position(|g| g.name == name)
            .ok_or_else(|| DataError::GroupNotFound(name.to_string()))
    }

    fn group_mut(&mut self, name: &str) -> Result<&mut Group> {
        let idx = self.position(name)?;
        Ok(&mut self.groups[idx])
    }

    /// Trimmed, non-empty, not yet taken.
    fn check_new_name(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DataError::EmptyGroupName);
        }
        if self.get(name).is_some() {
            return Err(DataError::DuplicateGroupName(name.to_string()));
        }
        Ok(name.to_string())
    }

    /// Append an empty group. Returns the stored (trimmed) name.
    pub fn create_group(&mut self, name: &str) -> Result<String> {
        let name = self.check_new_name(name)?;
        self.groups.push(Group {
            name: name.clone(),
            columns: Vec::new(),
        });
        Ok(name)
    }

    pub fn delete_group(&mut self, name: &str) -> Result<Group> {
        let idx = self.position(name)?;
        Ok(self.groups.remove(idx))
    }

    /// Rename in place; the group keeps its position and columns.
    pub fn rename_group(&mut self, old: &str, new: &str) -> Result<()> {
        let idx = self.position(old)?;
        if new.trim() == old {
            return Ok(());
        }
        let new = self.check_new_name(new)?;
        self.groups[idx].name = new;
        Ok(())
    }

    /// Add a numeric sample column to a group. Adding a member twice is a
    /// no-op.
    pub fn add_column(&mut self, group: &str, column: &str, dataset: &Dataset) -> Result<()> {
        let idx = self.position(group)?;
        if !dataset.is_numeric_column(column) {
            return Err(DataError::UnknownColumn(column.to_string()));
        }
        let g = &mut self.groups[idx];
        if !g.contains(column) {
            g.columns.push(column.to_string());
        }
        Ok(())
    }

    pub fn remove_column(&mut self, group: &str, column: &str) -> Result<()> {
        self.group_mut(group)?.columns.retain(|c| c != column);
        Ok(())
    }

    /// Make every sample column of the dataset a member, in header order.
    pub fn set_all_columns(&mut self, group: &str, dataset: &Dataset) -> Result<()> {
        self.group_mut(group)?.columns = dataset.numeric_columns().to_vec();
        Ok(())
    }

    pub fn clear_columns(&mut self, group: &str) -> Result<()> {
        self.group_mut(group)?.columns.clear();
        Ok(())
    }

    /// First free `Group N` name, counting from 1.
    pub fn next_default_name(&self) -> String {
        (1..)
            .map(|i| format!("Group {i}"))
            .find(|n| self.get(n).is_none())
            .unwrap_or_default()
    }

    /// Drop members that are no longer sample columns of `dataset`, e.g.
    /// after the ID column changed. Returns the dropped (group, column)
    /// pairs.
    pub fn retain_columns(&mut self, dataset: &Dataset) -> Vec<(String, String)> {
        let mut dropped = Vec::new();
        for g in &mut self.groups {
            let name = g.name.clone();
            g.columns.retain(|c| {
                let keep = dataset.is_numeric_column(c);
                if !keep {
                    dropped.push((name.clone(), c.clone()));
                }
                keep
            });
        }
        dropped
    }

    // -- export --

    /// Line-oriented export:
    ///
    /// ```text
    /// Dataset: counts.tsv.gz
    /// ID column: gene
    ///
    /// [WT]
    ///   - A_WT
    ///   - B_WT
    ///
    /// [Empty]
    ///   (no columns selected)
    /// ```
    pub fn export_text(&self, dataset: &Dataset) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Dataset: {}", dataset.source_name);
        let _ = writeln!(out, "ID column: {}", dataset.id_column());
        out.push('\n');
        for g in &self.groups {
            let _ = writeln!(out, "[{}]", g.name);
            if g.columns.is_empty() {
                let _ = writeln!(out, "  {NO_COLUMNS}");
            }
            for c in &g.columns {
                let _ = writeln!(out, "  - {c}");
            }
            out.push('\n');
        }
        out
    }

    pub fn export_json(&self) -> String {
        serde_json::to_string_pretty(&self.groups).unwrap_or_else(|_| "[]".to_string())
    }
}

const NO_COLUMNS: &str = "(no columns selected)";

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Result of importing a group file against the current dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    /// The imported groups with every valid column.
    pub registry: GroupRegistry,
    /// (group, column) pairs naming columns the dataset does not offer.
    pub unknown: Vec<(String, String)>,
}

impl ImportReport {
    /// The skipped entries as an error, if there were any.
    pub fn unknown_error(&self) -> Option<DataError> {
        (!self.unknown.is_empty()).then(|| DataError::UnknownColumns(self.unknown.clone()))
    }
}

/// Parse the format written by [`GroupRegistry::export_text`].
pub fn import_text(text: &str, dataset: &Dataset) -> Result<ImportReport> {
    let mut groups: Vec<Group> = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed == NO_COLUMNS {
            continue;
        }
        if groups.is_empty()
            && (trimmed.starts_with("Dataset:") || trimmed.starts_with("ID column:"))
        {
            continue;
        }
        if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            groups.push(Group {
                name: name.to_string(),
                columns: Vec::new(),
            });
            continue;
        }
        if let Some(column) = line.trim_start().strip_prefix("- ") {
            let Some(current) = groups.last_mut() else {
                return Err(DataError::Format(format!(
                    "line {}: column listed before any [group]",
                    i + 1
                )));
            };
            current.columns.push(column.to_string());
            continue;
        }
        return Err(DataError::Format(format!(
            "line {}: unexpected '{trimmed}'",
            i + 1
        )));
    }

    validate(groups, dataset)
}

/// Parse a JSON array of `{ "name": ..., "columns": [...] }` objects.
pub fn import_json(text: &str, dataset: &Dataset) -> Result<ImportReport> {
    let groups: Vec<Group> =
        serde_json::from_str(text).map_err(|e| DataError::Format(e.to_string()))?;
    validate(groups, dataset)
}

fn validate(groups: Vec<Group>, dataset: &Dataset) -> Result<ImportReport> {
    let mut registry = GroupRegistry::default();
    let mut unknown = Vec::new();

    for g in groups {
        let name = registry.create_group(&g.name)?;
        for column in g.columns {
            match registry.add_column(&name, &column, dataset) {
                Ok(()) => {}
                Err(DataError::UnknownColumn(_)) => unknown.push((name.clone(), column)),
                Err(e) => return Err(e),
            }
        }
    }

    if !unknown.is_empty() {
        log::warn!("Group import skipped {} unknown column(s)", unknown.len());
    }
    Ok(ImportReport { registry, unknown })
}

fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Write the registry to `path`; `.json` selects JSON, anything else the
/// text format.
pub fn save_groups(path: &Path, registry: &GroupRegistry, dataset: &Dataset) -> Result<()> {
    let body = if is_json_path(path) {
        registry.export_json()
    } else {
        registry.export_text(dataset)
    };
    std::fs::write(path, body).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a group file written by [`save_groups`].
pub fn load_groups(path: &Path, dataset: &Dataset) -> Result<ImportReport> {
    let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if is_json_path(path) {
        import_json(&text, dataset)
    } else {
        import_text(&text, dataset)
    }
}

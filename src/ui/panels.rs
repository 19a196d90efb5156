use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::error::DataError;
use crate::data::loader;
use crate::data::model::detect_id_column;
use crate::data::selection::{filter_row_keys, MAX_SHOWN};
use crate::export::with_png_extension;
use crate::state::{AppState, PendingDuplicates, Status};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        let has_data = state.dataset.is_some();

        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Auto-detect .gz in current folder").clicked() {
                autodetect_dataset(state);
                ui.close_menu();
            }
            ui.separator();
            if ui
                .add_enabled(has_data, egui::Button::new("Import Groups…"))
                .clicked()
            {
                import_groups_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(has_data, egui::Button::new("Export Groups…"))
                .clicked()
            {
                export_groups_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(has_data, egui::Button::new("Save Table as TSV…"))
                .clicked()
            {
                save_table_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Exit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        if ui
            .add_enabled(has_data, egui::Button::new("Preview Dataset"))
            .clicked()
        {
            state.preview.open = true;
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} | {} rows × {} cols | ID: {}",
                ds.source_name,
                ds.table.n_rows(),
                ds.table.n_cols(),
                ds.id_column()
            ));
            ui.separator();
        }

        match &state.status {
            Some(Status::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            Some(Status::Info(msg)) => {
                ui.label(msg.as_str());
            }
            None => {
                ui.label("Open a .tsv or .tsv.gz file to begin.");
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Row ID panel
// ---------------------------------------------------------------------------

/// ID column picker, search box and the row key checklist.
pub fn rows_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("1) Row IDs");
    ui.separator();

    let Some(ds) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state below.
    let columns = ds.table.columns().to_vec();
    let current_id = ds.id_column().to_string();
    let total = ds.row_keys().len();
    let shown: Vec<String> = filter_row_keys(ds.row_keys(), &state.id_search, MAX_SHOWN)
        .into_iter()
        .map(str::to_string)
        .collect();

    ui.horizontal(|ui: &mut Ui| {
        ui.label("ID column:");
        egui::ComboBox::from_id_salt("id_column")
            .selected_text(current_id.as_str())
            .show_ui(ui, |ui: &mut Ui| {
                for col in &columns {
                    if ui
                        .selectable_label(current_id == *col, col.as_str())
                        .clicked()
                    {
                        state.change_id_column(col);
                    }
                }
            });
    });

    ui.label("Search (contains):");
    ui.text_edit_singleline(&mut state.id_search);

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("Select all shown").clicked() {
            state.selection.select_all(shown.iter().map(String::as_str));
        }
        if ui.small_button("Clear shown").clicked() {
            state.selection.deselect_all(shown.iter().map(String::as_str));
        }
    });

    ui.label(format!(
        "Showing {} of {total} (max {MAX_SHOWN}) | {} selected",
        shown.len(),
        state.selection.len()
    ));
    ui.separator();

    ScrollArea::vertical()
        .id_salt("row_keys")
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for key in &shown {
                let mut checked = state.selection.contains(key);
                if ui.checkbox(&mut checked, key.as_str()).changed() {
                    state.selection.set(key, checked);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Group panel
// ---------------------------------------------------------------------------

/// Group list plus sample column assignment for the active group.
pub fn groups_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("2) Groups");
    ui.separator();

    let Some(ds) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };
    let sample_columns = ds.numeric_columns().to_vec();
    let groups: Vec<(String, usize)> = state
        .groups
        .groups()
        .iter()
        .map(|g| (g.name.clone(), g.columns.len()))
        .collect();

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Add Group").clicked() {
            state.add_group();
        }
        if ui
            .add_enabled(state.active_group.is_some(), egui::Button::new("Remove"))
            .clicked()
        {
            state.remove_active_group();
        }
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.add(egui::TextEdit::singleline(&mut state.rename_buffer).desired_width(140.0));
        if ui
            .add_enabled(state.active_group.is_some(), egui::Button::new("Rename"))
            .clicked()
        {
            state.rename_active_group();
        }
    });

    ScrollArea::vertical()
        .id_salt("group_list")
        .max_height(150.0)
        .show(ui, |ui: &mut Ui| {
            for (name, n) in &groups {
                let active = state.active_group.as_deref() == Some(name.as_str());
                let label = format!("{name}  ({n})");
                if ui.selectable_label(active, label).clicked() {
                    state.select_group(name);
                }
            }
        });
    ui.separator();

    let Some(active) = state.active_group.clone() else {
        ui.label("Select a group to assign sample columns.");
        return;
    };

    ui.strong(format!("Columns in '{active}'"));
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("Select all").clicked() {
            state.select_all_columns();
        }
        if ui.small_button("Clear all").clicked() {
            state.clear_all_columns();
        }
    });

    let members = state
        .groups
        .get(&active)
        .map(|g| g.columns.clone())
        .unwrap_or_default();

    if sample_columns.is_empty() {
        ui.label("No numeric sample columns in this dataset.");
        return;
    }

    ScrollArea::vertical()
        .id_salt("group_columns")
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for col in &sample_columns {
                let mut checked = members.contains(col);
                if ui.checkbox(&mut checked, col.as_str()).changed() {
                    state.set_column_membership(col, checked);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Plot options panel
// ---------------------------------------------------------------------------

/// Title, labels, jitter settings and the plot / export actions.
pub fn options_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("3) Plot");
    ui.separator();

    let opts = &mut state.options;
    ui.label("Title:");
    ui.text_edit_singleline(&mut opts.title);
    ui.label("X label:");
    ui.text_edit_singleline(&mut opts.x_label);
    ui.label("Y label:");
    ui.text_edit_singleline(&mut opts.y_label);
    ui.add_space(6.0);

    ui.add(egui::Slider::new(&mut opts.jitter_width, 0.01..=0.25).text("Jitter width"));
    ui.add(egui::Slider::new(&mut opts.marker_alpha, 0.2..=1.0).text("Marker opacity"));
    ui.checkbox(&mut opts.show_grid, "Show grid");
    ui.separator();

    if ui.button("Plot Box + Jitter").clicked() {
        state.plot();
    }
    if ui.button("Save Plot as PNG…").clicked() {
        request_png_export(ui.ctx(), state);
    }
}

/// Ask for a target file and request a viewport screenshot; the image is
/// cropped and written once the screenshot event arrives.
pub fn request_png_export(ctx: &egui::Context, state: &mut AppState) {
    if state.chart.is_none() {
        state.set_error("Cannot save plot", DataError::NoChart);
        return;
    }
    let Some(path) = rfd::FileDialog::new()
        .set_title("Save plot as PNG")
        .add_filter("PNG image", &["png"])
        .set_file_name("plot.png")
        .save_file()
    else {
        return;
    };
    ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::new(
        with_png_extension(path),
    )));
}

// ---------------------------------------------------------------------------
// Duplicate row key prompt
// ---------------------------------------------------------------------------

pub fn pending_prompt(ctx: &egui::Context, state: &mut AppState) {
    let Some(pending) = &state.pending else {
        return;
    };
    let column = match pending {
        PendingDuplicates::Load { table, .. } => {
            let idx = detect_id_column(table.columns());
            table.columns().get(idx).cloned().unwrap_or_default()
        }
        PendingDuplicates::IdColumn { column, .. } => column.clone(),
    };
    let keys = pending.keys().join(", ");

    let mut decision = None;
    egui::Window::new("Duplicate row IDs")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui: &mut Ui| {
            ui.label(format!("Column '{column}' has repeated values:"));
            ui.label(RichText::new(&keys).monospace());
            ui.label("Continue by suffixing later occurrences (#2, #3, …)?");
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Continue with suffixed keys").clicked() {
                    decision = Some(true);
                }
                if ui.button("Cancel").clicked() {
                    decision = Some(false);
                }
            });
        });

    if let Some(proceed) = decision {
        state.resolve_pending(proceed);
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open TSV data")
        .add_filter("Supported files", &["tsv", "tab", "txt", "gz"])
        .add_filter("Gzip-compressed", &["gz"])
        .add_filter("Tab-separated", &["tsv", "tab", "txt"])
        .add_filter("All files", &["*"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}

/// Load the preferred `.gz` file from the working directory, if any.
pub fn autodetect_dataset(state: &mut AppState) {
    let found = std::env::current_dir().and_then(|dir| loader::find_compressed_candidate(&dir));
    match found {
        Ok(Some(path)) => state.load_path(&path),
        Ok(None) => state.set_info("No .gz files found in the current folder."),
        Err(e) => state.set_error("Auto-detect failed", e),
    }
}

pub fn export_groups_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export groups")
        .add_filter("Text", &["txt"])
        .add_filter("JSON", &["json"])
        .set_file_name("groups.txt")
        .save_file();

    if let Some(path) = file {
        state.export_groups(&path);
    }
}

pub fn save_table_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Save table as TSV")
        .add_filter("TSV", &["tsv"])
        .set_file_name("table.tsv")
        .save_file();

    if let Some(path) = file {
        state.export_table(&path);
    }
}

pub fn import_groups_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Import groups")
        .add_filter("Group files", &["txt", "json"])
        .pick_file();

    if let Some(path) = file {
        state.import_groups(&path);
    }
}

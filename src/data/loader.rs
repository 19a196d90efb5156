use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use super::error::{DataError, Result};
use super::model::Table;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tab-separated table. Files ending in `.gz` are decompressed on
/// the fly; anything else is read as plain text.
///
/// The first line is always the header. No cell is interpreted as a number
/// here; that happens when a column is used as a sample column.
pub fn load_file(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let table = if is_gzip_path(path) {
        read_table(GzDecoder::new(reader), path)?
    } else {
        read_table(reader, path)?
    };

    log::info!(
        "Loaded {}: {} rows × {} columns",
        path.display(),
        table.n_rows(),
        table.n_cols()
    );
    Ok(table)
}

fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

// ---------------------------------------------------------------------------
// TSV parsing
// ---------------------------------------------------------------------------

/// Parse tab-separated text from any reader into a [`Table`].
pub fn read_table<R: Read>(source: R, path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(false)
        .from_reader(source);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(e, path))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if columns.is_empty() {
        return Err(DataError::Format("file is empty".into()));
    }
    if columns.len() < 2 {
        return Err(DataError::Format(format!(
            "need an ID column and at least one value column, found {} column",
            columns.len()
        )));
    }

    let columns = dedupe_headers(columns);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(e, path))?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    Table::new(columns, rows)
}

/// Rename repeated header names to `name.1`, `name.2`, … so every column
/// stays addressable. A generated name that is already taken keeps counting.
fn dedupe_headers(columns: Vec<String>) -> Vec<String> {
    let mut taken: BTreeSet<String> = columns.iter().cloned().collect();
    let mut seen = BTreeSet::new();
    columns
        .into_iter()
        .map(|name| {
            if seen.insert(name.clone()) {
                return name;
            }
            let renamed = (1..)
                .map(|n| format!("{name}.{n}"))
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or_default();
            log::warn!("Duplicate column name '{name}' renamed to '{renamed}'");
            taken.insert(renamed.clone());
            seen.insert(renamed.clone());
            renamed
        })
        .collect()
}

/// Map csv errors onto the loader's taxonomy. I/O failures (including a
/// corrupt gzip stream) stay I/O errors, everything else is a format error.
fn csv_error(err: csv::Error, path: &Path) -> DataError {
    match err.into_kind() {
        csv::ErrorKind::Io(source) => DataError::Io {
            path: path.to_path_buf(),
            source,
        },
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => {
            let line = pos.map(|p| p.line()).unwrap_or_default();
            DataError::Format(format!(
                "line {line}: expected {expected_len} fields, found {len}"
            ))
        }
        csv::ErrorKind::Utf8 { pos, err } => {
            let line = pos.map(|p| p.line()).unwrap_or_default();
            DataError::Format(format!("line {line}: {err}"))
        }
        other => DataError::Format(format!("{other:?}")),
    }
}

// ---------------------------------------------------------------------------
// Auto-detection of compressed datasets
// ---------------------------------------------------------------------------

/// Compressed table suffixes, best first. Plain `.gz` comes last.
const PREFERRED_SUFFIXES: &[&str] = &[".tab.gz", ".tsv.gz", ".txt.gz", ".gz"];

/// Rank of a file name in [`PREFERRED_SUFFIXES`], or `None` if it is not
/// gzip-compressed.
fn suffix_rank(name: &str) -> Option<usize> {
    let lower = name.to_ascii_lowercase();
    PREFERRED_SUFFIXES.iter().position(|s| lower.ends_with(s))
}

/// Find a gzip-compressed dataset in `dir`.
///
/// The shortest matching file name wins. Equal lengths fall back to the
/// suffix order of [`PREFERRED_SUFFIXES`], then to alphabetical order.
pub fn find_compressed_candidate(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut candidates: Vec<(usize, usize, String)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if let Some(rank) = suffix_rank(&name) {
            candidates.push((name.len(), rank, name));
        }
    }

    Ok(candidates
        .into_iter()
        .min()
        .map(|(_, _, name)| dir.join(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_plain(dir: &TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    fn write_gz(dir: &TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(text.as_bytes()).unwrap();
        enc.finish().unwrap();
        path
    }

    const SAMPLE: &str = "ID\tA_WT\tB_WT\tA_KO\ng1\t1\t2\t3\ng2\t4\t5\t6\n";

    #[test]
    fn loads_plain_and_gzip_identically() {
        let dir = TempDir::new().unwrap();
        let plain = load_file(&write_plain(&dir, "data.tsv", SAMPLE)).unwrap();
        let gz = load_file(&write_gz(&dir, "data.tsv.GZ", SAMPLE)).unwrap();

        assert_eq!(plain, gz);
        assert_eq!(plain.columns(), &["ID", "A_WT", "B_WT", "A_KO"]);
        assert_eq!(plain.n_rows(), 2);
        assert_eq!(plain.cell(1, 3), "6");
    }

    #[test]
    fn reserialized_table_matches_input() {
        let text = "gene\tS 1\tS2\tnote\nTP53\t1.50\t\tcafé\nBRCA1\t-2\tNA\tx y\n";
        let dir = TempDir::new().unwrap();
        let table = load_file(&write_plain(&dir, "t.txt", text)).unwrap();

        let mut out = Vec::new();
        table.write_tsv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), text);
    }

    #[test]
    fn ragged_rows_are_format_errors() {
        let dir = TempDir::new().unwrap();
        let path = write_plain(&dir, "bad.tsv", "ID\ta\tb\nx\t1\n");
        match load_file(&path) {
            Err(DataError::Format(msg)) => assert!(msg.contains("line 2"), "{msg}"),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn repeated_header_names_are_suffixed() {
        let dir = TempDir::new().unwrap();
        let path = write_plain(
            &dir,
            "dup.tsv",
            "ID\tWT\tWT\tWT.1\tWT\ng1\t1\t2\t3\t4\n",
        );
        let table = load_file(&path).unwrap();
        assert_eq!(table.columns(), &["ID", "WT", "WT.2", "WT.1", "WT.3"]);
        assert_eq!(table.cell(0, 2), "2");
    }

    #[test]
    fn empty_and_single_column_files_are_rejected() {
        let dir = TempDir::new().unwrap();
        let empty = write_plain(&dir, "empty.tsv", "");
        assert!(matches!(load_file(&empty), Err(DataError::Format(_))));

        let single = write_plain(&dir, "single.tsv", "ID\nx\n");
        assert!(matches!(load_file(&single), Err(DataError::Format(_))));
    }

    #[test]
    fn unreadable_and_corrupt_inputs_are_io_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.tsv");
        assert!(matches!(load_file(&missing), Err(DataError::Io { .. })));

        let corrupt = write_plain(&dir, "corrupt.tsv.gz", "this is not gzip data at all");
        assert!(matches!(load_file(&corrupt), Err(DataError::Io { .. })));
    }

    #[test]
    fn compressed_candidate_is_the_shortest_gz_name() {
        let dir = TempDir::new().unwrap();
        assert_eq!(find_compressed_candidate(dir.path()).unwrap(), None);

        write_plain(&dir, "readme.txt", "");
        write_plain(&dir, "counts.tsv.gz", "");
        write_plain(&dir, "counts_long.tsv.gz", "");
        assert_eq!(
            find_compressed_candidate(dir.path()).unwrap(),
            Some(dir.path().join("counts.tsv.gz"))
        );

        write_plain(&dir, "a.gz", "");
        assert_eq!(
            find_compressed_candidate(dir.path()).unwrap(),
            Some(dir.path().join("a.gz"))
        );
    }

    #[test]
    fn equal_length_candidates_follow_suffix_order() {
        let dir = TempDir::new().unwrap();
        write_plain(&dir, "abcde.gz", "");
        write_plain(&dir, "b.tsv.gz", "");
        write_plain(&dir, "z.tab.gz", "");
        assert_eq!(
            find_compressed_candidate(dir.path()).unwrap(),
            Some(dir.path().join("z.tab.gz"))
        );
    }
}

use super::model::Dataset;

// ---------------------------------------------------------------------------
// Row-key selection
// ---------------------------------------------------------------------------

/// Most row keys the checklist shows at once.
pub const MAX_SHOWN: usize = 250;

/// Row keys picked for plotting, in the order they were picked.
///
/// Selection order is plot order: it decides which key gets the first
/// marker shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    keys: Vec<String>,
}

impl Selection {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Append `key` unless it is already selected.
    pub fn select(&mut self, key: &str) {
        if !self.contains(key) {
            self.keys.push(key.to_string());
        }
    }

    pub fn deselect(&mut self, key: &str) {
        self.keys.retain(|k| k != key);
    }

    pub fn set(&mut self, key: &str, selected: bool) {
        if selected {
            self.select(key);
        } else {
            self.deselect(key);
        }
    }

    /// Select every key in `keys`, keeping their order after the keys
    /// already selected.
    pub fn select_all<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        for k in keys {
            self.select(k);
        }
    }

    /// Deselect every key in `keys`.
    pub fn deselect_all<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        for k in keys {
            self.deselect(k);
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Drop keys the dataset no longer has. Returns how many were dropped.
    pub fn retain_known(&mut self, dataset: &Dataset) -> usize {
        let before = self.keys.len();
        self.keys.retain(|k| dataset.contains_key(k));
        before - self.keys.len()
    }
}

// ---------------------------------------------------------------------------
// Checklist search
// ---------------------------------------------------------------------------

/// Keys containing `query` (case-insensitive), at most `limit` of them, in
/// dataset order. An empty query matches everything.
pub fn filter_row_keys<'a>(keys: &'a [String], query: &str, limit: usize) -> Vec<&'a str> {
    let needle = query.trim().to_lowercase();
    keys.iter()
        .filter(|k| needle.is_empty() || k.to_lowercase().contains(&needle))
        .take(limit)
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn selection_keeps_pick_order_without_duplicates() {
        let mut s = Selection::default();
        s.select("b");
        s.select("a");
        s.select("b");
        assert_eq!(s.keys(), &["b", "a"]);

        s.select_all(["c", "a", "d"]);
        assert_eq!(s.keys(), &["b", "a", "c", "d"]);

        s.deselect_all(["a", "d"]);
        s.set("e", true);
        s.set("b", false);
        assert_eq!(s.keys(), &["c", "e"]);
    }

    #[test]
    fn filter_is_case_insensitive_and_limited() {
        let all = keys(&["TP53", "tp63", "BRCA1", "Ptp4a"]);
        assert_eq!(filter_row_keys(&all, " tp ", 10), vec!["TP53", "tp63", "Ptp4a"]);
        assert_eq!(filter_row_keys(&all, "TP", 2), vec!["TP53", "tp63"]);
        assert_eq!(filter_row_keys(&all, "", 3), vec!["TP53", "tp63", "BRCA1"]);
        assert!(filter_row_keys(&all, "xyz", 10).is_empty());
    }
}

//! Result decoding: per-table evaluator dumps into an ordered result set.

use indexmap::IndexMap;

/// Marker line emitted in front of every table in a result stream
pub const SEPARATOR: &str = "---------------------------";

/// Split a table dump into rows.
///
/// Dumps are newline-terminated, so the empty entry after the final `\n` is
/// dropped. Nothing else is filtered.
pub fn decode_dump(dump: &str) -> Vec<String> {
    let mut rows: Vec<String> = dump.split('\n').map(str::to_string).collect();
    if rows.last().is_some_and(String::is_empty) {
        rows.pop();
    }
    rows
}

/// Rows per relation, in table-list order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    tables: IndexMap<String, Vec<String>>,
}

impl ResultSet {
    pub fn new() -> Self {
        ResultSet::default()
    }

    /// Pair each table with its dump
    pub fn decode<T, D>(tables: &[T], dumps: &[D]) -> Self
    where
        T: AsRef<str>,
        D: AsRef<str>,
    {
        let mut results = ResultSet::new();
        for (table, dump) in tables.iter().zip(dumps) {
            results.insert(table.as_ref(), decode_dump(dump.as_ref()));
        }
        results
    }

    pub fn insert(&mut self, table: impl Into<String>, rows: Vec<String>) {
        self.tables.insert(table.into(), rows);
    }

    /// Rows dumped for `table`, if it was part of the run
    pub fn rows(&self, table: &str) -> Option<&[String]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.tables.iter().map(|(t, rows)| (t.as_str(), rows.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Flatten to separator, table name, rows for every table
    pub fn stream(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (table, rows) in &self.tables {
            out.push(SEPARATOR.to_string());
            out.push(table.clone());
            out.extend(rows.iter().cloned());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_is_27_dashes() {
        assert_eq!(SEPARATOR.len(), 27);
        assert!(SEPARATOR.chars().all(|c| c == '-'));
    }

    #[test]
    fn test_decode_dump() {
        assert_eq!(decode_dump("str10\n"), vec!["str10"]);
        assert_eq!(decode_dump("1,2\n3,4\n"), vec!["1,2", "3,4"]);
        assert!(decode_dump("").is_empty());
        // No trailing newline: the last row is kept
        assert_eq!(decode_dump("x\ny"), vec!["x", "y"]);
    }

    #[test]
    fn test_decode_keeps_duplicates_and_order() {
        assert_eq!(decode_dump("b\na\nb\n"), vec!["b", "a", "b"]);
    }

    #[test]
    fn test_stream_str10() {
        let results = ResultSet::decode(&["a", "b", "c"], &["str10\n", "str10\n", "str10\n"]);
        assert_eq!(
            results.stream(),
            vec![SEPARATOR, "a", "str10", SEPARATOR, "b", "str10", SEPARATOR, "c", "str10"]
        );
        assert_eq!(results.rows("b"), Some(&["str10".to_string()][..]));
        assert_eq!(results.rows("z"), None);
    }

    #[test]
    fn test_empty_table_contributes_header_only() {
        let results = ResultSet::decode(&["a", "b"], &["", "1\n"]);
        assert_eq!(results.stream(), vec![SEPARATOR, "a", SEPARATOR, "b", "1"]);
        assert_eq!(results.tables().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}

use std::cmp::Ordering;
use std::fmt;

/// A single typed cell read from an uploaded spreadsheet
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

impl CellValue {
    /// Numeric view of the cell, used when building a sample
    ///
    /// Numbers are taken as is; text is accepted when it parses to a finite
    /// `f64` after trimming. Missing cells, non-numeric text and non-finite
    /// values yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Missing => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Grouping view of the cell; missing cells never form a group
    pub fn as_group_key(&self) -> Option<GroupKey> {
        match self {
            CellValue::Number(n) if n.is_nan() => None,
            // -0 and 0 are one group
            CellValue::Number(n) => Some(GroupKey::Number(*n + 0.0)),
            CellValue::Text(s) => Some(GroupKey::Text(s.clone())),
            CellValue::Missing => None,
        }
    }
}

/// Value a partition is keyed by
///
/// Numeric keys order before text keys, numbers ascending and text
/// lexicographically, so iterating partitions is stable for a given input.
#[derive(Clone, Debug)]
pub enum GroupKey {
    Number(f64),
    Text(String),
}

impl GroupKey {
    /// Key used when no grouping column is selected
    pub const ALL_DATA: &'static str = "All Data";

    pub fn all_data() -> Self {
        GroupKey::Text(Self::ALL_DATA.to_string())
    }

    /// Whether this key is named by an entry of a client-supplied allow-list
    pub fn matches(&self, label: &str) -> bool {
        match self {
            GroupKey::Text(s) => s == label,
            GroupKey::Number(n) => {
                self.to_string() == label || label.trim().parse::<f64>().ok() == Some(*n)
            }
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            GroupKey::Number(n) => write!(f, "{}", n),
            GroupKey::Text(s) => f.write_str(s),
        }
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Number(a), GroupKey::Number(b)) => a.total_cmp(b),
            (GroupKey::Number(_), GroupKey::Text(_)) => Ordering::Less,
            (GroupKey::Text(_), GroupKey::Number(_)) => Ordering::Greater,
            (GroupKey::Text(a), GroupKey::Text(b)) => a.cmp(b),
        }
    }
}

/// Tabular data parsed from one upload
///
/// Rows are stored positionally; `columns[i]` names the i-th cell of every
/// row. Rows shorter than the header are padded with `Missing` on insert.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Creates an empty dataset with the given header
    ///
    /// Blank header names become `Unnamed: {index}` and repeated names get a
    /// `.1`, `.2`, ... suffix, so every column is addressable by name.
    ///
    /// # Examples
    /// ```
    /// use boxplot_web::dataset::Dataset;
    ///
    /// let ds = Dataset::new(vec!["g".into(), "".into(), "g".into()]);
    /// assert_eq!(ds.columns(), ["g", "Unnamed: 1", "g.1"]);
    /// ```
    pub fn new(header: Vec<String>) -> Self {
        let mut columns: Vec<String> = Vec::with_capacity(header.len());
        for (index, name) in header.into_iter().enumerate() {
            let name = name.trim().to_string();
            let base = if name.is_empty() {
                format!("Unnamed: {}", index)
            } else {
                name
            };

            let mut candidate = base.clone();
            let mut suffix = 1;
            while columns.contains(&candidate) {
                candidate = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            columns.push(candidate);
        }

        Dataset {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Missing);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&CellValue::Missing)
    }

    /// Non-missing numeric values of `column` for the given rows, in row order
    pub fn sample(&self, rows: &[usize], column: usize) -> Vec<f64> {
        rows.iter()
            .filter_map(|&row| self.cell(row, column).as_number())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_are_unique_and_non_empty() {
        let ds = Dataset::new(vec![
            "a".to_string(),
            " ".to_string(),
            "a".to_string(),
            "a".to_string(),
        ]);
        assert_eq!(ds.columns(), ["a", "Unnamed: 1", "a.1", "a.2"]);
    }

    #[test]
    fn short_rows_are_padded() {
        let mut ds = Dataset::new(vec!["a".to_string(), "b".to_string()]);
        ds.push_row(vec![CellValue::Number(1.0)]);
        assert_eq!(ds.cell(0, 1), &CellValue::Missing);
        assert_eq!(ds.cell(5, 0), &CellValue::Missing);
    }

    #[test]
    fn sample_skips_missing_and_non_numeric() {
        let mut ds = Dataset::new(vec!["v".to_string()]);
        ds.push_row(vec![CellValue::Number(1.5)]);
        ds.push_row(vec![CellValue::Missing]);
        ds.push_row(vec![CellValue::Text("n/a".to_string())]);
        ds.push_row(vec![CellValue::Text(" 4 ".to_string())]);
        ds.push_row(vec![CellValue::Number(f64::NAN)]);
        assert_eq!(ds.sample(&[0, 1, 2, 3, 4], 0), vec![1.5, 4.0]);
    }

    #[test]
    fn group_keys_sort_numbers_before_text() {
        let mut keys = vec![
            GroupKey::Text("b".to_string()),
            GroupKey::Number(10.0),
            GroupKey::Text("a".to_string()),
            GroupKey::Number(2.0),
        ];
        keys.sort();
        let labels: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(labels, ["2", "10", "a", "b"]);
    }

    #[test]
    fn numeric_key_matches_its_label() {
        let key = GroupKey::Number(3.0);
        assert!(key.matches("3"));
        assert!(key.matches("3.0"));
        assert!(!key.matches("4"));
        assert_eq!(GroupKey::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn negative_zero_is_the_zero_group() {
        let key = CellValue::Number(-0.0).as_group_key().unwrap();
        assert_eq!(key, GroupKey::Number(0.0));
        assert_eq!(key.to_string(), "0");
    }
}

use crate::dataset::{Dataset, GroupKey};
use crate::error::AppError;
use std::collections::BTreeMap;

/// Rows of a dataset sharing one key value
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    pub key: GroupKey,
    /// Row indices into the source dataset, in dataset order
    pub rows: Vec<usize>,
}

/// Split a dataset into groups by the value of one column
///
/// Without a grouping column every row lands in a single partition keyed
/// `All Data`. A non-empty allow-list drops rows whose key it does not name
/// before grouping; an empty or absent allow-list keeps every row. Rows with
/// a missing grouping value belong to no partition.
///
/// # Arguments
/// * `dataset` - Parsed upload
/// * `group_column` - Column holding the group keys, if any
/// * `allow_list` - Group labels the client selected
///
/// # Returns
/// * `Result<Vec<Partition>, AppError>` - Partitions in ascending key order,
///   or `ColumnNotFound` when the grouping column does not exist
pub fn partition(
    dataset: &Dataset,
    group_column: Option<&str>,
    allow_list: Option<&[String]>,
) -> Result<Vec<Partition>, AppError> {
    let all_rows: Vec<usize> = (0..dataset.len()).collect();

    let Some(column) = group_column else {
        let key = GroupKey::all_data();
        if !is_allowed(&key, allow_list) {
            return Ok(Vec::new());
        }
        return Ok(vec![Partition {
            key,
            rows: all_rows,
        }]);
    };

    let index = column_index(dataset, column)?;
    Ok(split_rows(dataset, &all_rows, index, allow_list))
}

/// Split one partition by a secondary category column
///
/// Sub-partitions follow the same ordering and missing-value rules as
/// [`partition`]; no allow-list applies at this level.
pub fn sub_partition(
    dataset: &Dataset,
    parent: &Partition,
    secondary_column: &str,
) -> Result<Vec<Partition>, AppError> {
    let index = column_index(dataset, secondary_column)?;
    Ok(split_rows(dataset, &parent.rows, index, None))
}

fn column_index(dataset: &Dataset, column: &str) -> Result<usize, AppError> {
    dataset
        .column_index(column)
        .ok_or_else(|| AppError::ColumnNotFound(column.to_string()))
}

fn is_allowed(key: &GroupKey, allow_list: Option<&[String]>) -> bool {
    match allow_list {
        Some(list) if !list.is_empty() => list.iter().any(|label| key.matches(label)),
        _ => true,
    }
}

fn split_rows(
    dataset: &Dataset,
    rows: &[usize],
    column: usize,
    allow_list: Option<&[String]>,
) -> Vec<Partition> {
    let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();

    for &row in rows {
        let Some(key) = dataset.cell(row, column).as_group_key() else {
            continue;
        };
        if !is_allowed(&key, allow_list) {
            continue;
        }
        groups.entry(key).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(key, rows)| Partition { key, rows })
        .collect()
}

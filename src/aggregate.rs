//! Grouping and counting of flat record lists.
//!
//! All groupings keep first-seen order of their keys so downstream ranking
//! has a deterministic tie-break.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Key used when a record carries no value for the grouped dimension.
pub const UNASSIGNED: &str = "unassigned";

/// Per-status record counts.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTally<S> {
    entries: Vec<(S, usize)>,
    total: usize,
}

impl<S> Default for StatusTally<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            total: 0,
        }
    }
}

impl<S: Copy + PartialEq> StatusTally<S> {
    pub fn record(&mut self, status: S) {
        match self.entries.iter_mut().find(|(s, _)| *s == status) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((status, 1)),
        }
        self.total += 1;
    }

    pub fn count(&self, status: S) -> usize {
        self.entries
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, count)| *count)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Statuses in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (S, usize)> + '_ {
        self.entries.iter().copied()
    }
}

/// Serializes as `{"PRESENT": 1, "LATE": 1, "total": 2}`.
impl<S: Serialize> Serialize for StatusTally<S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len() + 1))?;
        for (status, count) in &self.entries {
            map.serialize_entry(status, count)?;
        }
        map.serialize_entry("total", &self.total)?;
        map.end()
    }
}

/// Count and summed amount for one key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown<K> {
    pub key: K,
    pub count: usize,
    pub amount: f64,
}

/// Counts plus an accumulated amount per key.
///
/// A pending leave request of three days adds one to the pending count and
/// three to the pending amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedTally<K> {
    pub entries: Vec<Breakdown<K>>,
    pub total: usize,
    pub total_amount: f64,
}

impl<K> Default for WeightedTally<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            total: 0,
            total_amount: 0.0,
        }
    }
}

impl<K: PartialEq> WeightedTally<K> {
    pub fn record(&mut self, key: K, amount: f64) {
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => {
                entry.count += 1;
                entry.amount += amount;
            }
            None => self.entries.push(Breakdown { key, count: 1, amount }),
        }
        self.total += 1;
        self.total_amount += amount;
    }

    pub fn get(&self, key: &K) -> Option<&Breakdown<K>> {
        self.entries.iter().find(|entry| entry.key == *key)
    }
}

/// Status tally for one employee (or other entity key).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyedTally<K, S> {
    pub key: K,
    #[serde(flatten)]
    pub tally: StatusTally<S>,
}

/// Weighted tally for one employee.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyedWeightedTally<K, S> {
    pub key: K,
    pub tally: WeightedTally<S>,
}

/// Value of a grouping dimension; records without one land in `Unassigned`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DimensionKey<K> {
    Value(K),
    Unassigned,
}

impl<K> From<Option<K>> for DimensionKey<K> {
    fn from(value: Option<K>) -> Self {
        value.map_or(DimensionKey::Unassigned, DimensionKey::Value)
    }
}

impl<K: fmt::Display> fmt::Display for DimensionKey<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionKey::Value(value) => value.fmt(f),
            DimensionKey::Unassigned => f.write_str(UNASSIGNED),
        }
    }
}

impl<K: fmt::Display> Serialize for DimensionKey<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Records sharing one dimension value.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a, K, T> {
    pub key: DimensionKey<K>,
    pub records: Vec<&'a T>,
}

/// Fold records into one accumulator per key, keys in first-seen order.
fn fold_ordered<'a, T, K, A>(
    records: &'a [T],
    key_fn: impl Fn(&'a T) -> K,
    mut fold: impl FnMut(&mut A, &'a T),
) -> Vec<(K, A)>
where
    K: Eq + Hash + Clone,
    A: Default,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, A)> = Vec::new();

    for record in records {
        let key = key_fn(record);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, A::default()));
            groups.len() - 1
        });
        fold(&mut groups[slot].1, record);
    }

    groups
}

/// Per-key status counts, e.g. PRESENT/LATE/ABSENT per employee.
pub fn by_employee<T, K, S>(
    records: &[T],
    key_fn: impl Fn(&T) -> K,
    status_fn: impl Fn(&T) -> S,
) -> Vec<KeyedTally<K, S>>
where
    K: Eq + Hash + Clone,
    S: Copy + PartialEq,
{
    fold_ordered(records, key_fn, |tally: &mut StatusTally<S>, record| tally.record(status_fn(record)))
        .into_iter()
        .map(|(key, tally)| KeyedTally { key, tally })
        .collect()
}

/// Per-key status counts plus per-status amounts (leave days per status).
pub fn by_employee_weighted<T, K, S>(
    records: &[T],
    key_fn: impl Fn(&T) -> K,
    status_fn: impl Fn(&T) -> S,
    amount_fn: impl Fn(&T) -> f64,
) -> Vec<KeyedWeightedTally<K, S>>
where
    K: Eq + Hash + Clone,
    S: PartialEq,
{
    fold_ordered(records, key_fn, |tally: &mut WeightedTally<S>, record| {
        tally.record(status_fn(record), amount_fn(record))
    })
    .into_iter()
    .map(|(key, tally)| KeyedWeightedTally { key, tally })
    .collect()
}

/// Global status distribution.
pub fn by_status<T, S>(records: &[T], status_fn: impl Fn(&T) -> S) -> StatusTally<S>
where
    S: Copy + PartialEq,
{
    let mut tally = StatusTally::default();
    for record in records {
        tally.record(status_fn(record));
    }
    tally
}

/// Global distribution with an accumulated amount per key.
pub fn by_key_weighted<T, K>(
    records: &[T],
    key_fn: impl Fn(&T) -> K,
    amount_fn: impl Fn(&T) -> f64,
) -> WeightedTally<K>
where
    K: PartialEq,
{
    let mut tally = WeightedTally::default();
    for record in records {
        tally.record(key_fn(record), amount_fn(record));
    }
    tally
}

/// Group records by an optional dimension value.
///
/// Records whose dimension is `None` are kept under [`DimensionKey::Unassigned`].
pub fn by_dimension<'a, T, K>(records: &'a [T], key_fn: impl Fn(&T) -> Option<K>) -> Vec<Group<'a, K, T>>
where
    K: Eq + Hash + Clone,
{
    fold_ordered(
        records,
        |record| DimensionKey::from(key_fn(record)),
        |group: &mut Vec<&'a T>, record| group.push(record),
    )
    .into_iter()
    .map(|(key, records)| Group { key, records })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, LeaveStatus};

    #[derive(Debug)]
    struct Row {
        employee: i32,
        status: AttendanceStatus,
        shift: Option<i32>,
    }

    fn row(employee: i32, status: AttendanceStatus, shift: Option<i32>) -> Row {
        Row { employee, status, shift }
    }

    #[test]
    fn test_by_employee_counts() {
        let rows = vec![
            row(1, AttendanceStatus::Present, None),
            row(1, AttendanceStatus::Late, None),
            row(2, AttendanceStatus::Present, None),
        ];

        let buckets = by_employee(&rows, |r| r.employee, |r| r.status);
        assert_eq!(buckets.len(), 2);

        assert_eq!(buckets[0].key, 1);
        assert_eq!(buckets[0].tally.count(AttendanceStatus::Present), 1);
        assert_eq!(buckets[0].tally.count(AttendanceStatus::Late), 1);
        assert_eq!(buckets[0].tally.total(), 2);

        assert_eq!(buckets[1].key, 2);
        assert_eq!(buckets[1].tally.count(AttendanceStatus::Present), 1);
        assert_eq!(buckets[1].tally.count(AttendanceStatus::Late), 0);
        assert_eq!(buckets[1].tally.total(), 1);
    }

    #[test]
    fn test_by_employee_totals_match_input_length() {
        let statuses = AttendanceStatus::ALL;
        let rows: Vec<Row> = (0..97)
            .map(|i| row(i % 7, statuses[i as usize % statuses.len()], None))
            .collect();

        let buckets = by_employee(&rows, |r| r.employee, |r| r.status);
        let total: usize = buckets.iter().map(|b| b.tally.total()).sum();
        assert_eq!(total, rows.len());

        let per_status: usize = buckets.iter().flat_map(|b| b.tally.iter().map(|(_, c)| c)).sum();
        assert_eq!(per_status, rows.len());
    }

    #[test]
    fn test_status_tally_serializes_flat() {
        let rows = vec![row(1, AttendanceStatus::Present, None), row(1, AttendanceStatus::Late, None)];
        let buckets = by_employee(&rows, |r| r.employee, |r| r.status);

        let json = serde_json::to_value(&buckets[0]).unwrap();
        assert_eq!(json, serde_json::json!({"key": 1, "PRESENT": 1, "LATE": 1, "total": 2}));
    }

    #[test]
    fn test_weighted_counts_and_days_diverge() {
        let requests = vec![
            (1, LeaveStatus::Pending, 3.0),
            (1, LeaveStatus::Approved, 1.0),
            (1, LeaveStatus::Approved, 0.5),
        ];

        let buckets = by_employee_weighted(&requests, |r| r.0, |r| r.1, |r| r.2);
        assert_eq!(buckets.len(), 1);

        let tally = &buckets[0].tally;
        let pending = tally.get(&LeaveStatus::Pending).unwrap();
        assert_eq!(pending.count, 1);
        assert_eq!(pending.amount, 3.0);

        let approved = tally.get(&LeaveStatus::Approved).unwrap();
        assert_eq!(approved.count, 2);
        assert_eq!(approved.amount, 1.5);

        assert_eq!(tally.total, 3);
        assert_eq!(tally.total_amount, 4.5);
    }

    #[test]
    fn test_by_status_first_seen_order() {
        let rows = vec![
            row(1, AttendanceStatus::Late, None),
            row(2, AttendanceStatus::Present, None),
            row(3, AttendanceStatus::Late, None),
        ];
        let tally = by_status(&rows, |r| r.status);
        let order: Vec<_> = tally.iter().collect();
        assert_eq!(order, vec![(AttendanceStatus::Late, 2), (AttendanceStatus::Present, 1)]);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_by_status_empty() {
        let rows: Vec<Row> = Vec::new();
        let tally = by_status(&rows, |r| r.status);
        assert!(tally.is_empty());
        assert_eq!(tally.count(AttendanceStatus::Absent), 0);
    }

    #[test]
    fn test_by_dimension_keeps_unassigned() {
        let rows = vec![
            row(1, AttendanceStatus::Present, Some(10)),
            row(2, AttendanceStatus::Present, None),
            row(3, AttendanceStatus::Late, Some(10)),
        ];

        let groups = by_dimension(&rows, |r| r.shift);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, DimensionKey::Value(10));
        assert_eq!(groups[0].records.len(), 2);
        assert_eq!(groups[1].key, DimensionKey::Unassigned);
        assert_eq!(groups[1].key.to_string(), UNASSIGNED);
        assert_eq!(groups[1].records[0].employee, 2);
    }
}

//! Leaderboards: top-N entities by a metric.

use std::cmp::Ordering;

use serde::Serialize;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry<K> {
    pub key: K,
    pub value: f64,
    pub display_name: String,
}

/// Sort by descending value and keep the first `n`.
///
/// Equal values keep their input order (`sort_by` is stable), so the entity
/// seen first in the source data ranks first.
pub fn top_n<K, I>(metrics: I, n: usize, name_resolver: impl Fn(&K) -> String) -> Vec<RankedEntry<K>>
where
    I: IntoIterator<Item = (K, f64)>,
{
    let mut entries: Vec<(K, f64)> = metrics.into_iter().collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    entries.truncate(n);

    entries
        .into_iter()
        .map(|(key, value)| {
            let display_name = name_resolver(&key);
            RankedEntry {
                key,
                value,
                display_name,
            }
        })
        .collect()
}

/// All entities whose value reaches `threshold`, ranked descending.
///
/// Used for chronic-absence lists where every qualifying employee is shown.
pub fn at_least<K, I>(metrics: I, threshold: f64, name_resolver: impl Fn(&K) -> String) -> Vec<RankedEntry<K>>
where
    I: IntoIterator<Item = (K, f64)>,
{
    let qualifying: Vec<(K, f64)> = metrics.into_iter().filter(|(_, value)| *value >= threshold).collect();
    let len = qualifying.len();
    top_n(qualifying, len, name_resolver)
}

/// Name of the first record whose id equals `key`, or an empty string.
pub fn first_match_name<T, K>(
    records: &[T],
    key: &K,
    id_fn: impl Fn(&T) -> K,
    name_fn: impl Fn(&T) -> &str,
) -> String
where
    K: PartialEq,
{
    records
        .iter()
        .find(|record| id_fn(record) == *key)
        .map(|record| name_fn(record).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named {
        id: i32,
        name: &'static str,
    }

    fn no_name(_: &i32) -> String {
        String::new()
    }

    #[test]
    fn test_top_n_sorted_descending_and_truncated() {
        let metrics = vec![(1, 2.0), (2, 9.0), (3, 5.0), (4, 7.0)];
        let ranked = top_n(metrics, 3, no_name);

        let keys: Vec<i32> = ranked.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![2, 4, 3]);
        assert!(ranked.windows(2).all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn test_top_n_ties_keep_insertion_order() {
        let metrics = vec![(5, 3.0), (1, 4.0), (9, 3.0), (2, 3.0), (7, 4.0)];
        let ranked = top_n(metrics, 10, no_name);

        let keys: Vec<i32> = ranked.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![1, 7, 5, 9, 2]);
    }

    #[test]
    fn test_top_n_many_ties_are_stable() {
        let metrics: Vec<(i32, f64)> = (0..200).map(|i| (i, f64::from(i % 3))).collect();
        let ranked = top_n(metrics, 200, no_name);

        for pair in ranked.windows(2) {
            assert!(pair[0].value >= pair[1].value);
            if pair[0].value == pair[1].value {
                assert!(pair[0].key < pair[1].key);
            }
        }
    }

    #[test]
    fn test_top_n_zero_and_empty() {
        assert!(top_n(vec![(1, 1.0)], 0, no_name).is_empty());
        assert!(top_n(Vec::<(i32, f64)>::new(), 5, no_name).is_empty());
    }

    #[test]
    fn test_display_name_resolution() {
        let records = vec![
            Named { id: 1, name: "Nguyen Thi B" },
            Named { id: 1, name: "Later Duplicate" },
        ];
        let ranked = top_n(vec![(1, 1.0), (2, 1.0)], 5, |key| {
            first_match_name(&records, key, |r| r.id, |r| r.name)
        });

        assert_eq!(ranked[0].display_name, "Nguyen Thi B");
        assert_eq!(ranked[1].display_name, "");
    }

    #[test]
    fn test_at_least_threshold() {
        let metrics = vec![(1, 2.0), (2, 3.0), (3, 5.0), (4, 3.0)];
        let ranked = at_least(metrics, 3.0, no_name);

        let keys: Vec<i32> = ranked.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![3, 2, 4]);
    }
}

use std::collections::HashMap;
use std::hash::Hash;

/// Groups items by an extracted key, then reduces each group to one value.
/// All three report granularities (brand, age bucket, model) run through
/// this instead of repeating the group/average loop.
pub fn group_then_reduce<T, K, R>(
    items: &[T],
    key: impl Fn(&T) -> K,
    reduce: impl Fn(&K, &[&T]) -> R,
) -> Vec<(K, R)>
where
    K: Eq + Hash,
{
    let mut groups: HashMap<K, Vec<&T>> = HashMap::new();
    for item in items {
        groups.entry(key(item)).or_default().push(item);
    }

    groups
        .into_iter()
        .map(|(key, members)| {
            let reduced = reduce(&key, &members);
            (key, reduced)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_each_group_once() {
        let items = vec![("a", 1.0), ("b", 10.0), ("a", 3.0)];
        let mut sums = group_then_reduce(
            &items,
            |(k, _)| *k,
            |_, members| members.iter().map(|m| m.1).sum::<f64>(),
        );
        sums.sort_by(|a, b| a.0.cmp(b.0));
        assert_eq!(sums, vec![("a", 4.0), ("b", 10.0)]);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        let items: Vec<(&str, f64)> = Vec::new();
        let groups = group_then_reduce(&items, |(k, _)| *k, |_, members| members.len());
        assert!(groups.is_empty());
    }
}

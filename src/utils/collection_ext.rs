//! 集合扩展工具模块
//!
//! 提供列名去重、按表分组等集合辅助函数

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

/// 去重并保持首次出现的顺序
///
/// # Example
/// ```ignore
/// let cols = vec!["status", "created_at", "status"];
/// let unique = unique_ordered(cols); // ["status", "created_at"]
/// ```
#[inline]
pub fn unique_ordered<T: Eq + Hash + Clone>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// 按多个 key 分组，一个元素可以出现在多个分组中
///
/// 用于按表名聚合慢查询：一条 JOIN 查询会同时归入它引用的每张表。
/// 结果使用 BTreeMap，保证报告输出顺序稳定。
///
/// # Example
/// ```ignore
/// let grouped = group_by_many(queries, |q| extract_tables(&q.query_text));
/// ```
pub fn group_by_many<T, K, F>(items: &[T], keys_fn: F) -> BTreeMap<K, Vec<T>>
where
    T: Clone,
    K: Ord,
    F: Fn(&T) -> Vec<K>,
{
    let mut map: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        for key in keys_fn(item) {
            map.entry(key).or_default().push(item.clone());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ordered_keeps_first_occurrence() {
        let items = vec!["b", "a", "b", "c", "a"];
        assert_eq!(unique_ordered(items), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_group_by_many_duplicates_across_keys() {
        let items = vec![(1, vec!["orders", "users"]), (2, vec!["orders"])];
        let grouped = group_by_many(&items, |(_, keys)| {
            keys.iter().map(|k| k.to_string()).collect()
        });

        assert_eq!(grouped["orders"].len(), 2);
        assert_eq!(grouped["users"].len(), 1);
        assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["orders", "users"]);
    }
}

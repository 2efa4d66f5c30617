//! Grouping of unified records by candidate key

use crate::record::RawRecord;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Records that share one candidate key, in unified-set order
#[derive(Debug, Clone, Serialize)]
pub struct Group<'a> {
    /// The shared candidate key
    pub key: String,
    /// Members; the first one is the base record
    pub members: Vec<&'a RawRecord>,
}

impl<'a> Group<'a> {
    /// The base record, if the group is not empty
    pub fn base(&self) -> Option<&'a RawRecord> {
        self.members.first().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// All groups of a run, in order of first appearance of each key
#[derive(Debug, Clone, Default, Serialize)]
pub struct Groups<'a> {
    pub groups: Vec<Group<'a>>,
    /// Number of records that were grouped
    pub total_records: usize,
}

impl<'a> Groups<'a> {
    /// Records that collapsed into an existing group
    pub fn duplicate_count(&self) -> usize {
        self.total_records - self.groups.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group<'a>> {
        self.groups.iter()
    }
}

/// Partition records by candidate key in one ordered pass
///
/// Every emitted group has at least one member, and members keep the order
/// they have in `records`.
pub fn group_records(records: &[RawRecord]) -> Groups<'_> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Group<'_>> = Vec::new();

    for record in records {
        match index.get(record.candidate_key.as_str()) {
            Some(&slot) => groups[slot].members.push(record),
            None => {
                index.insert(record.candidate_key.as_str(), groups.len());
                groups.push(Group {
                    key: record.candidate_key.clone(),
                    members: vec![record],
                });
            }
        }
    }

    debug!(records = records.len(), groups = groups.len(), "grouped records by candidate key");

    Groups {
        groups,
        total_records: records.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Source;

    impl<'a> Groups<'a> {
        fn find_group(&self, key: &str) -> Option<&Group<'a>> {
            self.groups.iter().find(|g| g.key == key)
        }

        fn keys(&self) -> Vec<&str> {
            self.groups.iter().map(|g| g.key.as_str()).collect()
        }
    }

    fn record(source: Source, row_id: usize, key: &str) -> RawRecord {
        RawRecord {
            candidate_key: key.to_string(),
            ..RawRecord::empty(source, row_id)
        }
    }

    #[test]
    fn test_group_preserves_member_order() {
        let records = vec![
            record(Source::Goodreads, 1, "a"),
            record(Source::Goodreads, 2, "b"),
            record(Source::Goodreads, 3, "a"),
            record(Source::GoogleBooks, 1, "a"),
        ];
        let groups = group_records(&records);

        assert_eq!(groups.keys(), vec!["a", "b"]);
        let a = groups.find_group("a").unwrap();
        let refs: Vec<_> = a.members.iter().map(|r| (r.source, r.row_id)).collect();
        assert_eq!(
            refs,
            vec![
                (Source::Goodreads, 1),
                (Source::Goodreads, 3),
                (Source::GoogleBooks, 1)
            ]
        );
        assert_eq!(a.base().unwrap().row_id, 1);
    }

    #[test]
    fn test_every_record_in_exactly_one_group() {
        let records = vec![
            record(Source::Goodreads, 1, "x"),
            record(Source::GoogleBooks, 1, "y"),
            record(Source::GoogleBooks, 2, "x"),
        ];
        let groups = group_records(&records);

        let total: usize = groups.iter().map(Group::len).sum();
        assert_eq!(total, records.len());
        assert!(groups.iter().all(|g| !g.is_empty()));
        assert_eq!(groups.duplicate_count(), 1);
    }

    #[test]
    fn test_empty_input() {
        let groups = group_records(&[]);
        assert!(groups.groups.is_empty());
        assert_eq!(groups.duplicate_count(), 0);
    }
}

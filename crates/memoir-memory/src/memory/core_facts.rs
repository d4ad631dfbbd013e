//! Core facts - the short curated list of what matters about a user
//!
//! Position is meaningful: index 0 is the most recently added fact. A fact can
//! only be inserted at the front or replace an existing entry; there is no
//! removal.

use super::user::UserId;
use crate::error::MemoirResult;
use async_trait::async_trait;

/// How a core-fact write was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreFactUpdate {
    /// Inserted as the new first entry
    Inserted,

    /// Replaced the entry at this index
    Replaced(usize),
}

/// Apply a core-fact write to an in-memory list.
///
/// An `index` within `0..facts.len()` replaces that entry; anything else
/// (absent, negative, past the end) inserts at the front.
pub fn apply_core_fact(
    facts: &mut Vec<String>,
    text: String,
    index: Option<i64>,
) -> CoreFactUpdate {
    match index.and_then(|i| usize::try_from(i).ok()) {
        Some(i) if i < facts.len() => {
            facts[i] = text;
            CoreFactUpdate::Replaced(i)
        }
        _ => {
            facts.insert(0, text);
            CoreFactUpdate::Inserted
        }
    }
}

/// Durable per-user core-fact list
#[async_trait]
pub trait CoreFactStore: Send + Sync {
    /// Current list, index 0 first
    async fn core_facts(&self, user_id: UserId) -> MemoirResult<Vec<String>>;

    /// Insert or replace a fact, serialized per user
    async fn store_core_fact(
        &self,
        user_id: UserId,
        text: &str,
        index: Option<i64>,
    ) -> MemoirResult<CoreFactUpdate>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_index_inserts_at_front() {
        let mut list = facts(&["works at Acme"]);
        let update = apply_core_fact(&mut list, "My name is Alex".into(), None);

        assert_eq!(update, CoreFactUpdate::Inserted);
        assert_eq!(list, facts(&["My name is Alex", "works at Acme"]));
    }

    #[test]
    fn test_valid_index_replaces_in_place() {
        let mut list = facts(&["a", "b", "c"]);
        let update = apply_core_fact(&mut list, "B".into(), Some(1));

        assert_eq!(update, CoreFactUpdate::Replaced(1));
        assert_eq!(list, facts(&["a", "B", "c"]));
    }

    #[test]
    fn test_out_of_range_index_falls_back_to_front_insert() {
        let mut list = facts(&["a", "b"]);
        assert_eq!(apply_core_fact(&mut list, "x".into(), Some(2)), CoreFactUpdate::Inserted);
        assert_eq!(apply_core_fact(&mut list, "y".into(), Some(-1)), CoreFactUpdate::Inserted);
        assert_eq!(list, facts(&["y", "x", "a", "b"]));

        let mut empty = Vec::new();
        assert_eq!(apply_core_fact(&mut empty, "first".into(), Some(0)), CoreFactUpdate::Inserted);
        assert_eq!(empty, facts(&["first"]));
    }
}

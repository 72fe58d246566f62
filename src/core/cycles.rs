//! Cycle groups and the successor computation.
//!
//! A cycle group is an ordered list of interchangeable values; toggling a
//! value replaces it with the next member, wrapping at the end. Groups are
//! matched in table order: a verbatim hit wins, then a case-insensitive one,
//! and the first matching group is taken. The table is immutable once built
//! and replaced wholesale on reconfiguration.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Ordered group of interchangeable values. Valid groups have at least two
/// distinct members; validity is enforced by `CycleTable::new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleGroup {
    pub values: Vec<String>,
}

impl CycleGroup {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// A usable group needs 2+ members, all distinct and non-empty.
    pub fn is_valid(&self) -> bool {
        if self.values.len() < 2 {
            return false;
        }
        if self.values.iter().any(|v| v.is_empty()) {
            return false;
        }
        self.values
            .iter()
            .enumerate()
            .all(|(i, v)| !self.values[..i].contains(v))
    }

    /// Verbatim membership first, then case-insensitive.
    pub fn position_of(&self, value: &str) -> Option<usize> {
        self.values
            .iter()
            .position(|v| v == value)
            .or_else(|| {
                self.values
                    .iter()
                    .position(|v| v.eq_ignore_ascii_case(value))
            })
    }

    pub fn matches(&self, value: &str) -> bool {
        self.position_of(value).is_some()
    }
}

/// Ordered list of cycle groups; lookup order is configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleTable {
    groups: Vec<CycleGroup>,
}

impl CycleTable {
    /// Build a table, dropping unusable groups (fewer than two distinct
    /// members) with a warning instead of failing the whole configuration.
    pub fn new(groups: Vec<CycleGroup>) -> Self {
        let groups = groups
            .into_iter()
            .filter(|g| {
                if g.is_valid() {
                    true
                } else {
                    warn!(group = ?g.values, "dropping cycle group with fewer than two distinct members");
                    false
                }
            })
            .collect();
        Self { groups }
    }

    pub fn groups(&self) -> &[CycleGroup] {
        &self.groups
    }

    /// First group containing `value`, in configuration order.
    /// `value` must already be normalized (trimmed, unquoted); empty values
    /// never match.
    pub fn matching_group(&self, value: &str) -> Option<&CycleGroup> {
        if value.is_empty() {
            return None;
        }
        self.groups.iter().find(|g| g.matches(value))
    }
}

/// Quote layer detected on a raw value. Presentation only; independent of
/// cycle membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    None,
    Double,
    Single,
}

impl QuoteStyle {
    /// Detect a single layer of matching surrounding quotes and return the
    /// style plus the unquoted text. Never strips more than one layer.
    pub fn detect(s: &str) -> (Self, &str) {
        let bytes = s.as_bytes();
        if bytes.len() >= 2 {
            match (bytes[0], bytes[bytes.len() - 1]) {
                (b'"', b'"') => return (Self::Double, &s[1..s.len() - 1]),
                (b'\'', b'\'') => return (Self::Single, &s[1..s.len() - 1]),
                _ => {}
            }
        }
        (Self::None, s)
    }

    pub fn wrap(self, s: &str) -> String {
        match self {
            Self::None => s.to_string(),
            Self::Double => format!("\"{s}\""),
            Self::Single => format!("'{s}'"),
        }
    }
}

/// Successor of `current` within `group`, preserving the detected quote
/// style. Returns None when the unquoted value is not a member — the caller
/// reports that as a failure rather than writing a fabricated value.
pub fn next_value(current: &str, group: &CycleGroup) -> Option<String> {
    let (style, bare) = QuoteStyle::detect(current.trim());
    let idx = group.position_of(bare)?;
    let next = &group.values[(idx + 1) % group.values.len()];
    Some(style.wrap(next))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn group(values: &[&str]) -> CycleGroup {
        CycleGroup::new(values.iter().copied())
    }

    #[test]
    fn test_successor_and_wraparound() {
        let g = group(&["true", "false"]);
        assert_eq!(next_value("true", &g).as_deref(), Some("false"));
        assert_eq!(next_value("false", &g).as_deref(), Some("true"));

        let g3 = group(&["debug", "info", "warn"]);
        assert_eq!(next_value("warn", &g3).as_deref(), Some("debug"));
    }

    #[test]
    fn test_quote_style_preserved() {
        let g = group(&["true", "false"]);
        assert_eq!(next_value("\"true\"", &g).as_deref(), Some("\"false\""));

        let g2 = group(&["ON", "OFF"]);
        assert_eq!(next_value("'ON'", &g2).as_deref(), Some("'OFF'"));

        // Unquoted stays unquoted
        assert_eq!(next_value("true", &g).as_deref(), Some("false"));
    }

    #[test]
    fn test_only_one_quote_layer_is_stripped() {
        let g = group(&["'a'", "'b'"]);
        // Outer layer is presentation, inner quotes are the value itself.
        assert_eq!(next_value("\"'a'\"", &g).as_deref(), Some("\"'b'\""));
    }

    #[test]
    fn test_case_insensitive_lookup_returns_canonical_member() {
        let g = group(&["YES", "NO"]);
        assert_eq!(next_value("yes", &g).as_deref(), Some("NO"));
    }

    #[test]
    fn test_verbatim_beats_case_insensitive_position() {
        // Degenerate group whose members differ only by case: the verbatim
        // position must win the lookup.
        let g = CycleGroup::new(["True", "true", "false"]);
        assert_eq!(next_value("true", &g).as_deref(), Some("false"));
    }

    #[test]
    fn test_non_member_returns_none() {
        let g = group(&["on", "off"]);
        assert_eq!(next_value("maybe", &g), None);
        assert_eq!(next_value("", &g), None);
    }

    #[test]
    fn test_table_first_match_wins() {
        let table = CycleTable::new(vec![group(&["1", "0"]), group(&["on", "off"])]);
        let hit = table.matching_group("1").expect("should match first group");
        assert_eq!(hit.values, vec!["1", "0"]);
    }

    #[test]
    fn test_table_drops_invalid_groups() {
        let table = CycleTable::new(vec![
            group(&["solo"]),
            group(&["dup", "dup"]),
            group(&["a", ""]),
            group(&["yes", "no"]),
        ]);
        assert_eq!(table.groups().len(), 1);
        assert_eq!(table.groups()[0].values, vec!["yes", "no"]);
    }

    #[test]
    fn test_table_empty_value_never_matches() {
        let table = CycleTable::new(vec![group(&["true", "false"])]);
        assert!(table.matching_group("").is_none());
    }

    proptest! {
        // Closure: for every member at index i, the successor is the member
        // at (i + 1) mod n, and n successive steps return to the start.
        #[test]
        fn prop_cycle_closure(values in prop::collection::hash_set("[a-z]{1,8}", 2..6)) {
            let g = CycleGroup::new(values.into_iter().collect::<Vec<_>>());
            let n = g.values.len();

            for (i, v) in g.values.iter().enumerate() {
                let next = next_value(v, &g);
                prop_assert_eq!(
                    next.as_deref(),
                    Some(g.values[(i + 1) % n].as_str())
                );
            }

            let mut current = g.values[0].clone();
            for _ in 0..n {
                current = next_value(&current, &g).unwrap();
            }
            prop_assert_eq!(current, g.values[0].clone());
        }
    }
}

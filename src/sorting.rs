//! Sort index for the workflow list: which column orders the table, in which
//! direction, and how that choice is stored per list variant.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::constants::{STORAGE_KEY_ORDER, STORAGE_KEY_ORDER_BY};
use crate::models::WorkflowRow;

/// Which workflow list the table is embedded in. Each variant keeps its own
/// sort preference and links rows to its own canvas route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListVariant {
    AgentFlows,
    ChatFlows,
    OpeaFlows,
}

impl ListVariant {
    pub fn parse(s: &str) -> Self {
        match s {
            "agent" | "agentflow" | "agentcanvas" => ListVariant::AgentFlows,
            "opea" | "opeacanvas" => ListVariant::OpeaFlows,
            _ => ListVariant::ChatFlows,
        }
    }

    /// Prefix of the localStorage keys holding the sort preference.
    pub fn storage_prefix(self) -> &'static str {
        match self {
            ListVariant::AgentFlows => "agentcanvas",
            ListVariant::ChatFlows | ListVariant::OpeaFlows => "chatflowcanvas",
        }
    }

    pub fn canvas_route(self) -> &'static str {
        match self {
            ListVariant::AgentFlows => "agentcanvas",
            ListVariant::OpeaFlows => "opeacanvas",
            ListVariant::ChatFlows => "canvas",
        }
    }

    /// Value of the `type` query parameter on the list endpoint.
    pub fn api_type(self) -> &'static str {
        match self {
            ListVariant::AgentFlows => "AGENTFLOW",
            ListVariant::ChatFlows => "CHATFLOW",
            ListVariant::OpeaFlows => "OPEA",
        }
    }

    pub fn order_key(self) -> String {
        format!("{}_{}", self.storage_prefix(), STORAGE_KEY_ORDER)
    }

    pub fn order_by_key(self) -> String {
        format!("{}_{}", self.storage_prefix(), STORAGE_KEY_ORDER_BY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    UpdatedDate,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::UpdatedDate => "updatedDate",
        }
    }

    pub fn from_stored(s: &str) -> Option<Self> {
        match s {
            "name" => Some(SortField::Name),
            "updatedDate" => Some(SortField::UpdatedDate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn from_stored(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    /// Most recently modified first.
    fn default() -> Self {
        Self {
            field: SortField::UpdatedDate,
            direction: SortDirection::Desc,
        }
    }
}

impl SortConfig {
    /// Header click on `field`: the active column flips direction, any other
    /// column becomes active in ascending order.
    pub fn toggled(self, field: SortField) -> Self {
        if self.field == field {
            Self {
                field,
                direction: self.direction.flipped(),
            }
        } else {
            Self {
                field,
                direction: SortDirection::Asc,
            }
        }
    }

    /// Rebuild from the two stored strings, falling back per value.
    pub fn from_stored(order: Option<&str>, order_by: Option<&str>) -> Self {
        let default = Self::default();
        Self {
            field: order_by
                .and_then(SortField::from_stored)
                .unwrap_or(default.field),
            direction: order
                .and_then(SortDirection::from_stored)
                .unwrap_or(default.direction),
        }
    }

    pub fn compare(&self, a: &WorkflowRow, b: &WorkflowRow) -> Ordering {
        let ord = match self.field {
            SortField::Name => locale_compare(&a.name, &b.name),
            SortField::UpdatedDate => {
                let ta = a.updated_date.as_deref().and_then(parse_timestamp_ms);
                let tb = b.updated_date.as_deref().and_then(parse_timestamp_ms);
                // None < Some: unknown dates count as the oldest.
                ta.cmp(&tb)
            }
        };
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// Order rows for display. Stable: rows that compare equal keep their input
/// order in either direction.
pub fn sort_rows<'a, I>(rows: I, config: SortConfig) -> Vec<&'a WorkflowRow>
where
    I: IntoIterator<Item = &'a WorkflowRow>,
{
    let mut list: Vec<&WorkflowRow> = rows.into_iter().collect();
    list.sort_by(|a, b| config.compare(a, b));
    list
}

/// Case-sensitive comparison in dictionary order: letters are compared
/// ignoring case first, and only an otherwise identical pair is split with
/// lowercase ahead of uppercase.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(char::to_lowercase);
    let folded_b = b.chars().flat_map(char::to_lowercase);
    folded_a.cmp(folded_b).then_with(|| {
        a.chars()
            .zip(b.chars())
            .find(|(ca, cb)| ca != cb)
            .map(|(ca, cb)| match (ca.is_lowercase(), cb.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => ca.cmp(&cb),
            })
            .unwrap_or_else(|| a.len().cmp(&b.len()))
    })
}

/// Milliseconds since the epoch for the timestamp formats the list endpoint
/// emits. `None` for anything unparseable.
pub fn parse_timestamp_ms(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(rows: &[&WorkflowRow]) -> Vec<String> {
        rows.iter().map(|r| r.name.clone()).collect()
    }

    fn by_name(direction: SortDirection) -> SortConfig {
        SortConfig {
            field: SortField::Name,
            direction,
        }
    }

    #[test]
    fn test_name_sort_is_locale_ordered() {
        let rows = vec![
            WorkflowRow::new("1", "B"),
            WorkflowRow::new("2", "a"),
            WorkflowRow::new("3", "C"),
        ];
        let asc = sort_rows(&rows, by_name(SortDirection::Asc));
        assert_eq!(names(&asc), vec!["a", "B", "C"]);

        let desc = sort_rows(&rows, by_name(SortDirection::Asc).toggled(SortField::Name));
        let mut reversed = names(&asc);
        reversed.reverse();
        assert_eq!(names(&desc), reversed);
    }

    #[test]
    fn test_name_sort_case_tie_break() {
        assert_eq!(locale_compare("a", "A"), Ordering::Less);
        assert_eq!(locale_compare("Ab", "ab"), Ordering::Greater);
        assert_eq!(locale_compare("abc", "ABD"), Ordering::Less);
        assert_eq!(locale_compare("", "a"), Ordering::Less);
        assert_eq!(locale_compare("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_name_sort_is_stable_for_ties() {
        let rows = vec![
            WorkflowRow::new("first", "dup"),
            WorkflowRow::new("x", "aaa"),
            WorkflowRow::new("second", "dup"),
        ];
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let ids: Vec<_> = sort_rows(&rows, by_name(direction))
                .into_iter()
                .filter(|r| r.name == "dup")
                .map(|r| r.id.as_str())
                .collect();
            assert_eq!(ids, vec!["first", "second"]);
        }
    }

    #[test]
    fn test_updated_date_desc_puts_missing_last() {
        let rows = vec![
            WorkflowRow::new("old", "old").with_updated_date("2024-01-01"),
            WorkflowRow::new("new", "new").with_updated_date("2025-01-01T00:00:00.000Z"),
            WorkflowRow::new("none", "none"),
            WorkflowRow::new("bad", "bad").with_updated_date("not a date"),
        ];
        let desc = sort_rows(&rows, SortConfig::default());
        let ids: Vec<_> = desc.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "none", "bad"]);

        let asc = sort_rows(&rows, SortConfig::default().toggled(SortField::UpdatedDate));
        let ids: Vec<_> = asc.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["none", "bad", "old", "new"]);
    }

    #[test]
    fn test_toggle_rules() {
        let start = SortConfig::default();
        assert_eq!(start.field, SortField::UpdatedDate);
        assert_eq!(start.direction, SortDirection::Desc);

        let flipped = start.toggled(SortField::UpdatedDate);
        assert_eq!(flipped.direction, SortDirection::Asc);

        let switched = flipped.toggled(SortField::Name);
        assert_eq!(switched.field, SortField::Name);
        assert_eq!(switched.direction, SortDirection::Asc);

        // A new column resets even when the old one was descending.
        let switched = start.toggled(SortField::Name);
        assert_eq!(switched.direction, SortDirection::Asc);
    }

    #[test]
    fn test_stored_preference_round_trip_and_fallback() {
        let cfg = SortConfig::from_stored(Some("asc"), Some("name"));
        assert_eq!(cfg, by_name(SortDirection::Asc));
        assert_eq!(cfg.direction.as_str(), "asc");
        assert_eq!(cfg.field.as_str(), "name");

        assert_eq!(SortConfig::from_stored(None, None), SortConfig::default());
        let partial = SortConfig::from_stored(Some("sideways"), Some("name"));
        assert_eq!(partial.field, SortField::Name);
        assert_eq!(partial.direction, SortDirection::Desc);
    }

    #[test]
    fn test_storage_keys_per_variant() {
        assert_eq!(ListVariant::AgentFlows.order_key(), "agentcanvas_order");
        assert_eq!(ListVariant::ChatFlows.order_by_key(), "chatflowcanvas_orderBy");
        assert_eq!(ListVariant::OpeaFlows.order_key(), "chatflowcanvas_order");
        assert_eq!(ListVariant::parse("agent"), ListVariant::AgentFlows);
        assert_eq!(ListVariant::parse("anything"), ListVariant::ChatFlows);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp_ms("1970-01-01"), Some(0));
        assert_eq!(parse_timestamp_ms("1970-01-01T00:00:01Z"), Some(1_000));
        assert_eq!(parse_timestamp_ms("1970-01-01T00:00:01.500"), Some(1_500));
        assert_eq!(parse_timestamp_ms("1970-01-01T01:00:00+01:00"), Some(0));
        assert_eq!(parse_timestamp_ms(""), None);
        assert_eq!(parse_timestamp_ms("yesterday"), None);
    }

    proptest! {
        #[test]
        fn prop_toggle_reverses_distinct_names(
            set in prop::collection::hash_set("[a-zA-Z]{1,8}", 1..12)
        ) {
            // Names equal up to case would tie on the primary key but still
            // differ in the tie-break, so reversal stays exact.
            let rows: Vec<WorkflowRow> = set
                .iter()
                .enumerate()
                .map(|(i, n)| WorkflowRow::new(i.to_string(), n.clone()))
                .collect();
            let asc = names(&sort_rows(&rows, by_name(SortDirection::Asc)));
            let mut desc = names(&sort_rows(&rows, by_name(SortDirection::Desc)));
            desc.reverse();
            prop_assert_eq!(asc, desc);
        }
    }
}

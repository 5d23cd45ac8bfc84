// Filter predicate model
// A subscription's filter is a boolean tree over these conditions.

use serde::{Deserialize, Serialize};

/// Epsilon used to express an exclusive bound at a round security tier.
/// Upstream security values are floating point, so "above 0.0" is encoded
/// as an inclusive bound at `0.0 + SECURITY_TIER_EPSILON`.
pub const SECURITY_TIER_EPSILON: f64 = 0.0001;

/// Inclusive lower bound equivalent to "strictly above `tier`".
pub fn security_above(tier: f64) -> f64 {
    tier + SECURITY_TIER_EPSILON
}

/// Inclusive upper bound equivalent to "strictly below `tier`".
pub fn security_below(tier: f64) -> f64 {
    tier - SECURITY_TIER_EPSILON
}

/// A base system paired with a maximum distance in light years.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemRange {
    pub system_id: u32,
    pub range_ly: f64,
}

/// One filter condition. Range bounds are independently optional and
/// inclusive on both ends.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub enum FilterCondition {
    TotalValue {
        min: Option<u64>,
        max: Option<u64>,
    },
    DroppedValue {
        min: Option<u64>,
        max: Option<u64>,
    },
    Region(Vec<u32>),
    System(Vec<u32>),
    Security {
        min: Option<f64>,
        max: Option<f64>,
    },
    LyRangeFrom(Vec<SystemRange>),
    IsNpc(bool),
    IsSolo(bool),
    Pilots {
        min: Option<u32>,
        max: Option<u32>,
    },
    /// UTC hour-of-day range, `[start, end)`. `start > end` spans midnight.
    TimeRange {
        start: u32,
        end: u32,
    },
    Alliance(Vec<u64>),
    Corporation(Vec<u64>),
    Character(Vec<u64>),
    ShipType(Vec<u32>),
    /// Configured entries are ship type IDs; matching happens on the group
    /// both sides resolve to, so one hull of a class covers the whole class.
    ShipGroup(Vec<u32>),
    /// Case-sensitive fragment matched against resolved ship/weapon names.
    NameFragment(String),
}

impl FilterCondition {
    /// Human-readable rendering used for logs and the list API.
    pub fn name(&self) -> String {
        fn ids<T: ToString>(ids: &[T]) -> String {
            ids.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }
        fn bound<T: ToString + Copy>(value: Option<T>) -> String {
            value.map_or("any".to_string(), |v| v.to_string())
        }

        match self {
            FilterCondition::TotalValue { min, max } => {
                format!("TotalValue(min: {}, max: {})", bound(*min), bound(*max))
            }
            FilterCondition::DroppedValue { min, max } => {
                format!("DroppedValue(min: {}, max: {})", bound(*min), bound(*max))
            }
            FilterCondition::Region(list) => format!("Region({})", ids(list)),
            FilterCondition::System(list) => format!("System({})", ids(list)),
            FilterCondition::Security { min, max } => {
                format!("Security(min: {}, max: {})", bound(*min), bound(*max))
            }
            FilterCondition::LyRangeFrom(ranges) => {
                let parts: Vec<String> = ranges
                    .iter()
                    .map(|sr| format!("{}:{}ly", sr.system_id, sr.range_ly))
                    .collect();
                format!("LyRangeFrom({})", parts.join(", "))
            }
            FilterCondition::IsNpc(flag) => format!("IsNpc({})", flag),
            FilterCondition::IsSolo(flag) => format!("IsSolo({})", flag),
            FilterCondition::Pilots { min, max } => {
                format!("Pilots(min: {}, max: {})", bound(*min), bound(*max))
            }
            FilterCondition::TimeRange { start, end } => {
                format!("TimeRange({}:00-{}:00)", start, end)
            }
            FilterCondition::Alliance(list) => format!("Alliance({})", ids(list)),
            FilterCondition::Corporation(list) => format!("Corporation({})", ids(list)),
            FilterCondition::Character(list) => format!("Character({})", ids(list)),
            FilterCondition::ShipType(list) => format!("ShipType({})", ids(list)),
            FilterCondition::ShipGroup(list) => format!("ShipGroup({})", ids(list)),
            FilterCondition::NameFragment(fragment) => {
                format!("NameFragment(\"{}\")", fragment)
            }
        }
    }
}

/// Boolean composition of filter conditions. Each node exclusively owns its
/// children, so the tree is finite and acyclic by construction.
///
/// Convention: an empty `And` matches everything, an empty `Or` matches
/// nothing.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub enum FilterNode {
    Condition(FilterCondition),
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
    Not(Box<FilterNode>),
}

impl FilterNode {
    /// A tree that matches every event.
    pub fn match_all() -> Self {
        FilterNode::And(Vec::new())
    }

    /// Recursively renders a human-readable name for the tree.
    pub fn name(&self) -> String {
        match self {
            FilterNode::Condition(condition) => condition.name(),
            FilterNode::And(nodes) => {
                let children = nodes
                    .iter()
                    .map(FilterNode::name)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("And({})", children)
            }
            FilterNode::Or(nodes) => {
                let children = nodes
                    .iter()
                    .map(FilterNode::name)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Or({})", children)
            }
            FilterNode::Not(node) => format!("Not({})", node.name()),
        }
    }

    /// Whether this tree contains a ship-identifying condition. Downstream
    /// display anchors on ship identity when one is present.
    pub fn contains_ship_condition(&self) -> bool {
        match self {
            FilterNode::Condition(condition) => matches!(
                condition,
                FilterCondition::ShipType(_) | FilterCondition::ShipGroup(_)
            ),
            FilterNode::And(nodes) | FilterNode::Or(nodes) => {
                nodes.iter().any(FilterNode::contains_ship_condition)
            }
            FilterNode::Not(node) => node.contains_ship_condition(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_tree_round_trips_through_json() {
        let tree = FilterNode::And(vec![
            FilterNode::Condition(FilterCondition::TotalValue {
                min: Some(1_000_000_000),
                max: None,
            }),
            FilterNode::Or(vec![
                FilterNode::Condition(FilterCondition::Region(vec![10000002])),
                FilterNode::Condition(FilterCondition::LyRangeFrom(vec![SystemRange {
                    system_id: 30000142,
                    range_ly: 10.0,
                }])),
            ]),
            FilterNode::Not(Box::new(FilterNode::Condition(FilterCondition::IsNpc(
                true,
            )))),
        ]);

        let json = serde_json::to_string_pretty(&tree).unwrap();
        let parsed: FilterNode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tree);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["And"].is_array());
        assert!(value["And"][0]["Condition"]["TotalValue"]["min"].is_number());
        assert!(value["And"][2]["Not"]["Condition"]["IsNpc"].is_boolean());
    }

    #[test]
    fn condition_names_render_bounds() {
        let condition = FilterCondition::Pilots {
            min: Some(5),
            max: None,
        };
        assert_eq!(condition.name(), "Pilots(min: 5, max: any)");

        let tree = FilterNode::Not(Box::new(FilterNode::Condition(FilterCondition::System(
            vec![30000142],
        ))));
        assert_eq!(tree.name(), "Not(System(30000142))");
    }

    #[test]
    fn ship_condition_detection_descends_into_not() {
        let tree = FilterNode::Not(Box::new(FilterNode::Condition(
            FilterCondition::ShipGroup(vec![19720]),
        )));
        assert!(tree.contains_ship_condition());
        assert!(!FilterNode::match_all().contains_ship_condition());
    }
}

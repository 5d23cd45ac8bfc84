// Subscription entity
// A named filter tree plus delivery parameters, owned by one
// (group, channel) pair.

use serde::{Deserialize, Serialize};

use crate::entities::filter::FilterNode;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub description: String,
    #[serde(rename = "filter")]
    pub root_filter: FilterNode,
    /// Cheapest possible prefilter: events below this total value are
    /// skipped before any reference data is resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping: Option<PingPolicy>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub enum PingPolicy {
    Here {
        max_ping_age_minutes: Option<u32>,
    },
    Everyone {
        max_ping_age_minutes: Option<u32>,
    },
}

impl PingPolicy {
    /// Oldest event age, in minutes, for which a ping is still issued.
    /// `None` means no age cutoff.
    pub fn max_ping_age_minutes(&self) -> Option<u32> {
        match self {
            PingPolicy::Here {
                max_ping_age_minutes,
            }
            | PingPolicy::Everyone {
                max_ping_age_minutes,
            } => *max_ping_age_minutes,
        }
    }

    pub fn mention(&self) -> &'static str {
        match self {
            PingPolicy::Here { .. } => "@here",
            PingPolicy::Everyone { .. } => "@everyone",
        }
    }
}

impl Subscription {
    pub fn filter_name(&self) -> String {
        self.root_filter.name()
    }
}

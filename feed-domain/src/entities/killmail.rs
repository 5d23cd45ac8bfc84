// Killmail event entities
// One immutable inbound notification from the killmail feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level package from the RedisQ-style feed. The `package` field is
/// null when the long-poll times out without a new killmail.
#[derive(Debug, Deserialize)]
pub struct FeedEnvelope {
    pub package: Option<KillEvent>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KillEvent {
    #[serde(rename = "killID")]
    pub kill_id: i64,
    pub killmail: Killmail,
    #[serde(rename = "zkb")]
    pub appraisal: Appraisal,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Killmail {
    pub killmail_id: i64,
    pub killmail_time: DateTime<Utc>,
    pub solar_system_id: u32,
    pub victim: Victim,
    pub attackers: Vec<Attacker>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Appraisal {
    #[serde(rename = "locationID", default)]
    pub location_id: Option<i64>,
    #[serde(default)]
    pub hash: String,
    #[serde(rename = "fittedValue", default)]
    pub fitted_value: f64,
    #[serde(rename = "droppedValue", default)]
    pub dropped_value: f64,
    #[serde(rename = "destroyedValue", default)]
    pub destroyed_value: f64,
    #[serde(rename = "totalValue", default)]
    pub total_value: f64,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub npc: bool,
    #[serde(default)]
    pub solo: bool,
    #[serde(default)]
    pub awox: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Victim {
    pub character_id: Option<u64>,
    pub corporation_id: Option<u64>,
    pub alliance_id: Option<u64>,
    pub faction_id: Option<u64>,
    pub ship_type_id: u32,
    pub damage_taken: i64,
    pub position: Option<Position>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Attacker {
    pub character_id: Option<u64>,
    pub corporation_id: Option<u64>,
    pub alliance_id: Option<u64>,
    pub faction_id: Option<u64>,
    pub ship_type_id: Option<u32>,
    pub weapon_type_id: Option<u32>,
    pub damage_done: i64,
    pub final_blow: bool,
    #[serde(default)]
    pub security_status: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl KillEvent {
    /// Pilots on the mail, victim included.
    pub fn pilot_count(&self) -> u32 {
        (self.killmail.attackers.len() + 1) as u32
    }

    pub fn age_minutes(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.killmail.killmail_time)
            .num_minutes()
    }
}

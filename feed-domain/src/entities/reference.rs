// Reference data entities
// Externally sourced, append-only lookup data.

use serde::{Deserialize, Serialize};

/// Resolved solar system descriptor. Entries are immutable for the process
/// lifetime once cached.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SolarSystem {
    pub system_id: u32,
    pub name: String,
    pub security_status: f64,
    pub constellation_id: u32,
    pub region_id: u32,
    pub region_name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

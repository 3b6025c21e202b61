//! Game-state records exchanged with the application.

use serde::{Deserialize, Serialize};

/// Opaque inventory records, stored as an embedded JSON string.
pub type InventoryList = Vec<serde_json::Value>;

/// Opaque quest records, stored as an embedded JSON string.
pub type QuestList = Vec<serde_json::Value>;

/// Player statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub health: u64,
    pub max_health: u64,
    pub strength: u64,
    pub wisdomness: u64,
    pub benchpress: u64,
    pub curl: u64,
    pub experience: u64,
    pub level: u64,
}

impl PlayerState {
    /// Wire names of the fields, in declaration order.
    pub const FIELDS: [&'static str; 8] = [
        "health",
        "maxHealth",
        "strength",
        "wisdomness",
        "benchpress",
        "curl",
        "experience",
        "level",
    ];

    /// Field values paired with their wire names.
    pub fn values(&self) -> [(&'static str, u64); 8] {
        [
            ("health", self.health),
            ("maxHealth", self.max_health),
            ("strength", self.strength),
            ("wisdomness", self.wisdomness),
            ("benchpress", self.benchpress),
            ("curl", self.curl),
            ("experience", self.experience),
            ("level", self.level),
        ]
    }
}

/// Outcome of a battle from the player's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum BattleResult {
    Loss = 0,
    Draw = 1,
    Win = 2,
}

impl From<BattleResult> for u64 {
    fn from(result: BattleResult) -> Self {
        result as u64
    }
}

impl TryFrom<u64> for BattleResult {
    type Error = String;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BattleResult::Loss),
            1 => Ok(BattleResult::Draw),
            2 => Ok(BattleResult::Win),
            other => Err(format!("invalid battle result {}", other)),
        }
    }
}

/// A recorded battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRecord {
    pub battle_id: String,
    pub player_id: String,
    pub opponent: String,
    pub result: BattleResult,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub experience_gained: u64,
    /// Assigned by the application when the battle is recorded.
    #[serde(default)]
    pub timestamp: u64,
}

impl BattleRecord {
    pub const FIELDS: [&'static str; 8] = [
        "battleId",
        "playerId",
        "opponent",
        "result",
        "damageDealt",
        "damageTaken",
        "experienceGained",
        "timestamp",
    ];
}

/// Guild summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
    pub members: Vec<String>,
    pub resources: u64,
    pub level: u64,
}

impl Guild {
    pub const FIELDS: [&'static str; 5] = ["id", "name", "members", "resources", "level"];
}

/// Achievement forwarded to the hub application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub player_id: String,
    pub achievement_id: String,
    pub name: String,
    pub description: String,
    pub hub_app_id: String,
    pub timestamp: u64,
    /// Free-form JSON string.
    pub metadata: String,
}

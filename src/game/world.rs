//! World region and hub achievements.

use crate::codec::Operation;
use crate::game::store::GameStore;
use crate::game::types::Achievement;

impl GameStore {
    /// Region of the connected chain.
    ///
    /// A successful read refreshes the cached region on the status board;
    /// a failed one leaves it as it was.
    pub async fn get_world_region(&self) -> Option<String> {
        let region: Option<String> = self.read(&Operation::query("worldRegion")).await;
        if let Some(region) = &region {
            self.status().set_region(region);
        }
        region
    }

    pub async fn submit_achievement(&self, achievement: &Achievement) -> bool {
        let operation = Operation::mutation("submitAchievement")
            .arg("playerId", achievement.player_id.as_str())
            .arg("achievementId", achievement.achievement_id.as_str())
            .arg("achievementName", achievement.name.as_str())
            .arg("achievementDescription", achievement.description.as_str())
            .arg("hubAppId", achievement.hub_app_id.as_str())
            .arg("timestamp", achievement.timestamp)
            .arg("metadata", achievement.metadata.as_str());
        self.write(&operation).await
    }
}

//! Battle records and per-player battle history.

use serde_json::Value;

use crate::codec::{Operation, OperationKind};
use crate::error::SyncResult;
use crate::game::store::{parse_field, GameStore};
use crate::game::types::BattleRecord;

impl GameStore {
    /// Record a battle. The application assigns the timestamp, so
    /// `record.timestamp` is not sent.
    pub async fn record_battle(&self, record: &BattleRecord) -> bool {
        let operation = Operation::mutation("recordBattle")
            .arg("battleId", record.battle_id.as_str())
            .arg("playerId", record.player_id.as_str())
            .arg("opponent", record.opponent.as_str())
            .arg("playerResult", u64::from(record.result))
            .arg("damageDealt", record.damage_dealt)
            .arg("damageTaken", record.damage_taken)
            .arg("experienceGained", record.experience_gained);
        self.write(&operation).await
    }

    pub async fn get_battle_record(&self, battle_id: &str) -> Option<BattleRecord> {
        self.read(&Self::battle_query(battle_id)).await
    }

    /// Ids of every battle recorded for the player.
    pub async fn get_player_battle_ids(&self, player_id: &str) -> Option<Vec<String>> {
        let operation = Operation::query("playerBattles").arg("playerId", player_id);
        self.read(&operation).await
    }

    /// Full records of the player's battles, in the order the application
    /// lists them.
    ///
    /// Two round trips: the id list, then one aliased batch query for the
    /// records. Ids whose record has disappeared in between are skipped.
    pub async fn get_player_battles(&self, player_id: &str) -> Option<Vec<BattleRecord>> {
        let ids = self.get_player_battle_ids(player_id).await?;
        if ids.is_empty() {
            return Some(Vec::new());
        }

        let mut operation = Operation::batch(OperationKind::Query);
        for (index, battle_id) in ids.iter().enumerate() {
            operation = operation
                .aliased(&format!("b{}", index), "battleRecord")
                .arg("battleId", battle_id.as_str())
                .select(&BattleRecord::FIELDS);
        }

        let result = self.try_fetch_battles(&operation, ids.len()).await;
        self.settle(&operation, result)
    }

    fn battle_query(battle_id: &str) -> Operation {
        Operation::query("battleRecord")
            .arg("battleId", battle_id)
            .select(&BattleRecord::FIELDS)
    }

    async fn try_fetch_battles(
        &self,
        operation: &Operation,
        count: usize,
    ) -> SyncResult<Vec<BattleRecord>> {
        let mut data = self.fetch_all(operation).await?;
        let mut records = Vec::with_capacity(count);
        for index in 0..count {
            let alias = format!("b{}", index);
            let value = data.remove(&alias).unwrap_or(Value::Null);
            if let Some(record) = parse_field::<BattleRecord>(&alias, value)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

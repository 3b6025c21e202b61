//! Player state, inventory, quests and cross-chain transfer.

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::codec::{Argument, Operation};
use crate::error::SyncResult;
use crate::game::store::{parse_embedded_list, GameStore};
use crate::game::types::{InventoryList, PlayerState, QuestList};
use crate::transport::ChainId;

fn with_player_state(mut operation: Operation, state: &PlayerState) -> Operation {
    for (name, value) in state.values() {
        operation = operation.arg(name, value);
    }
    operation
}

fn embedded(items: &[Value]) -> Argument {
    Argument::Json(Value::Array(items.to_vec()))
}

impl GameStore {
    pub async fn save_player_state(&self, player_id: &str, state: &PlayerState) -> bool {
        let operation = with_player_state(
            Operation::mutation("savePlayerState").arg("playerId", player_id),
            state,
        );
        self.write(&operation).await
    }

    pub async fn load_player_state(&self, player_id: &str) -> Option<PlayerState> {
        let operation = Operation::query("playerState")
            .arg("playerId", player_id)
            .select(&PlayerState::FIELDS);
        self.read(&operation).await
    }

    pub async fn save_inventory(&self, player_id: &str, inventory: &[Value]) -> bool {
        let operation = Operation::mutation("saveInventory")
            .arg("playerId", player_id)
            .arg("inventory", embedded(inventory));
        self.write(&operation).await
    }

    pub async fn load_inventory(&self, player_id: &str) -> Option<InventoryList> {
        let operation = Operation::query("inventory").arg("playerId", player_id);
        let result = self.try_load_list(&operation).await;
        self.settle(&operation, result).flatten()
    }

    /// Overwrite the player's quest list.
    pub async fn save_quests(&self, player_id: &str, quests: &[Value]) -> bool {
        let operation = Operation::mutation("saveQuests")
            .arg("playerId", player_id)
            .arg("quests", embedded(quests));
        self.write(&operation).await
    }

    pub async fn load_quests(&self, player_id: &str) -> Option<QuestList> {
        let operation = Self::quests_query(player_id);
        let result = self.try_load_list(&operation).await;
        self.settle(&operation, result).flatten()
    }

    /// Move the player with its complete state to another chain.
    pub async fn transfer_player(
        &self,
        player_id: &str,
        destination_chain: &ChainId,
        state: &PlayerState,
        inventory: &[Value],
        quests: &[Value],
        auth_token: &str,
    ) -> bool {
        let operation = with_player_state(
            Operation::mutation("transferPlayer")
                .arg("playerId", player_id)
                .arg("destinationChain", destination_chain.as_str()),
            state,
        )
        .arg("inventory", embedded(inventory))
        .arg("quests", embedded(quests))
        .arg("authToken", auth_token);
        self.write(&operation).await
    }

    /// Append one quest to the stored list.
    ///
    /// Load-then-save: a concurrent writer between the two calls loses its
    /// update. A failed load aborts without writing.
    pub async fn append_quest(&self, player_id: &str, quest: Value) -> bool {
        let operation = Self::quests_query(player_id);
        let loaded = self.try_load_list(&operation).await;
        let Some(existing) = self.settle(&operation, loaded) else {
            return false;
        };
        let mut quests = existing.unwrap_or_default();
        quests.push(quest);
        self.save_quests(player_id, &quests).await
    }

    /// Set `progress` and `completed` on the quest whose `id` is `quest_id`.
    ///
    /// Same load-then-save caveat as [`GameStore::append_quest`]. Returns
    /// false without writing when no stored quest has that id.
    pub async fn update_quest_progress(
        &self,
        player_id: &str,
        quest_id: &str,
        progress: u64,
        completed: bool,
    ) -> bool {
        let operation = Self::quests_query(player_id);
        let loaded = self.try_load_list(&operation).await;
        let Some(mut quests) = self.settle(&operation, loaded).flatten() else {
            return false;
        };

        let mut found = false;
        for quest in quests.iter_mut() {
            if quest.get("id").and_then(Value::as_str) == Some(quest_id) {
                if let Value::Object(fields) = quest {
                    fields.insert("progress".to_string(), Value::from(progress));
                    fields.insert("completed".to_string(), Value::from(completed));
                    found = true;
                }
            }
        }
        if !found {
            tracing::warn!(player_id, quest_id, "Quest not found, nothing to update");
            return false;
        }
        self.save_quests(player_id, &quests).await
    }

    /// Fire-and-forget [`GameStore::save_player_state`]; failures are logged.
    pub fn save_player_state_detached(&self, player_id: String, state: PlayerState) -> JoinHandle<bool> {
        let store = self.clone();
        tokio::spawn(async move {
            let saved = store.save_player_state(&player_id, &state).await;
            if !saved {
                tracing::error!(player_id = %player_id, "Detached player state save failed");
            }
            saved
        })
    }

    /// Fire-and-forget [`GameStore::save_inventory`]; failures are logged.
    pub fn save_inventory_detached(&self, player_id: String, inventory: InventoryList) -> JoinHandle<bool> {
        let store = self.clone();
        tokio::spawn(async move {
            let saved = store.save_inventory(&player_id, &inventory).await;
            if !saved {
                tracing::error!(player_id = %player_id, "Detached inventory save failed");
            }
            saved
        })
    }

    /// Fire-and-forget [`GameStore::save_quests`]; failures are logged.
    pub fn save_quests_detached(&self, player_id: String, quests: QuestList) -> JoinHandle<bool> {
        let store = self.clone();
        tokio::spawn(async move {
            let saved = store.save_quests(&player_id, &quests).await;
            if !saved {
                tracing::error!(player_id = %player_id, "Detached quest save failed");
            }
            saved
        })
    }

    fn quests_query(player_id: &str) -> Operation {
        Operation::query("quests").arg("playerId", player_id)
    }

    async fn try_load_list(&self, operation: &Operation) -> SyncResult<Option<Vec<Value>>> {
        let value = self.fetch(operation).await?;
        parse_embedded_list(operation.name(), value)
    }
}

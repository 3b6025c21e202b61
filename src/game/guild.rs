//! Guild membership.

use crate::codec::Operation;
use crate::game::store::GameStore;
use crate::game::types::Guild;
use crate::transport::ChainId;

impl GameStore {
    /// Ask the guild hosted on `chain_id` to admit the player.
    pub async fn join_guild(&self, player_id: &str, guild_id: &str, chain_id: &ChainId) -> bool {
        let operation = Operation::mutation("joinGuild")
            .arg("playerId", player_id)
            .arg("guildId", guild_id)
            .arg("chainId", chain_id.as_str());
        self.write(&operation).await
    }

    pub async fn get_guild(&self, guild_id: &str) -> Option<Guild> {
        let operation = Operation::query("guild")
            .arg("guildId", guild_id)
            .select(&Guild::FIELDS);
        self.read(&operation).await
    }

    /// Id of the guild the player belongs to, if any.
    pub async fn get_player_guild(&self, player_id: &str) -> Option<String> {
        let operation = Operation::query("playerGuild").arg("playerId", player_id);
        self.read(&operation).await
    }
}

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use ledger_sync::game::{Achievement, BattleRecord, PlayerState};
use ledger_sync::lifecycle::{self, DEFAULT_CONFIG_PATH};
use ledger_sync::transport::ChainId;
use ledger_sync::SyncClient;

#[derive(Parser)]
#[command(name = "sync-cli")]
#[command(about = "Connect to the game chain and run one operation", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connection status (chain, owner, region)
    Status,
    /// World region of the connected chain
    Region,
    /// Load a player's statistics
    LoadPlayer {
        #[arg(long)]
        player: String,
    },
    /// Save a player's statistics given as a JSON object
    SavePlayer {
        #[arg(long)]
        player: String,
        #[arg(long)]
        state: String,
    },
    /// Load a player's inventory, or replace it with --set
    Inventory {
        #[arg(long)]
        player: String,
        #[arg(long)]
        set: Option<String>,
    },
    /// Load a player's quests, or replace them with --set
    Quests {
        #[arg(long)]
        player: String,
        #[arg(long)]
        set: Option<String>,
    },
    /// Read a battle record, recording it first when --record is given
    Battle {
        #[arg(long)]
        id: String,
        #[arg(long)]
        record: Option<String>,
    },
    /// List a player's battles
    Battles {
        #[arg(long)]
        player: String,
    },
    /// Read a guild
    Guild {
        #[arg(long)]
        id: String,
    },
    /// Guild a player belongs to
    PlayerGuild {
        #[arg(long)]
        player: String,
    },
    /// Join a guild hosted on another chain
    JoinGuild {
        #[arg(long)]
        player: String,
        #[arg(long)]
        guild: String,
        #[arg(long)]
        chain: String,
    },
    /// Submit an achievement to the hub application
    Achievement {
        #[arg(long)]
        player: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Defaults to the configured hub application
        #[arg(long)]
        hub: Option<String>,
        #[arg(long, default_value = "{}")]
        metadata: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = lifecycle::prepare(&cli.config)?;
    let client = SyncClient::from_config(&config)?;

    if let Err(e) = client.connect().await {
        eprintln!("Error: {}", e);
        return Ok(ExitCode::FAILURE);
    }

    let game = client.game();
    let succeeded = match cli.command {
        Commands::Status => print_json(&client.status())?,
        Commands::Region => print_json(&game.get_world_region().await)?,
        Commands::LoadPlayer { player } => print_json(&game.load_player_state(&player).await)?,
        Commands::SavePlayer { player, state } => {
            let state: PlayerState = serde_json::from_str(&state)?;
            print_json(&game.save_player_state(&player, &state).await)?
        }
        Commands::Inventory { player, set: Some(items) } => {
            let items: Vec<Value> = serde_json::from_str(&items)?;
            print_json(&game.save_inventory(&player, &items).await)?
        }
        Commands::Inventory { player, set: None } => print_json(&game.load_inventory(&player).await)?,
        Commands::Quests { player, set: Some(items) } => {
            let items: Vec<Value> = serde_json::from_str(&items)?;
            print_json(&game.save_quests(&player, &items).await)?
        }
        Commands::Quests { player, set: None } => print_json(&game.load_quests(&player).await)?,
        Commands::Battle { id, record } => {
            if let Some(record) = record {
                let mut fields: Value = serde_json::from_str(&record)?;
                if let Value::Object(map) = &mut fields {
                    map.insert("battleId".to_string(), Value::from(id.as_str()));
                }
                let record: BattleRecord = serde_json::from_value(fields)?;
                if !game.record_battle(&record).await {
                    eprintln!("Error: battle {} was not recorded", id);
                    return Ok(ExitCode::FAILURE);
                }
            }
            print_json(&game.get_battle_record(&id).await)?
        }
        Commands::Battles { player } => print_json(&game.get_player_battles(&player).await)?,
        Commands::Guild { id } => print_json(&game.get_guild(&id).await)?,
        Commands::PlayerGuild { player } => print_json(&game.get_player_guild(&player).await)?,
        Commands::JoinGuild { player, guild, chain } => {
            print_json(&game.join_guild(&player, &guild, &ChainId::from(chain.as_str())).await)?
        }
        Commands::Achievement {
            player,
            id,
            name,
            description,
            hub,
            metadata,
        } => {
            let Some(hub_app_id) = hub.or_else(|| client.hub_application_id().map(str::to_string)) else {
                eprintln!("Error: no hub application (use --hub or application.hub_application_id)");
                return Ok(ExitCode::FAILURE);
            };
            let achievement = Achievement {
                player_id: player,
                achievement_id: id,
                name,
                description,
                hub_app_id,
                timestamp: SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs(),
                metadata,
            };
            print_json(&game.submit_achievement(&achievement).await)?
        }
    };

    client.disconnect().await;
    Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Print a result as pretty JSON; `None` and `false` count as failure.
fn print_json<T: Serialize>(value: &T) -> Result<bool, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(!matches!(value, Value::Null | Value::Bool(false)))
}

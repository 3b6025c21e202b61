//! Shared in-memory doubles for integration tests.
//!
//! `MockApplication` interprets the encoded operation documents against an
//! in-memory ledger, so tests exercise the real codec end to end.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::{mpsc, oneshot};

use ledger_sync::config::SyncConfig;
use ledger_sync::identity::{KeyStore, KeyStoreError, Signer};
use ledger_sync::transport::{
    Application, ApplicationId, ChainClient, ChainConnector, ChainId, EnvironmentSession, Faucet,
    HostEnvironment, Notification, NotificationStream, Owner, TransportError, Wallet,
};
use ledger_sync::SyncClient;

pub const APP_ID: &str = "game-app";
pub const OWNER: &str = "0xABC";
pub const CHAIN: &str = "chain-7";
pub const HOST_CHAIN: &str = "host-chain";
pub const HOST_OWNER: &str = "0xdef";

/// Ordered record of calls across all doubles.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: &str) {
        self.0.lock().unwrap().push(entry.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------
// Operation document parsing
// ---------------------------------------------------------------------------

/// One field of a parsed operation document.
#[derive(Debug, Clone)]
pub struct Call {
    pub alias: Option<String>,
    pub name: String,
    pub args: Map<String, Value>,
    pub selection: Vec<String>,
}

impl Call {
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn str_arg(&self, name: &str) -> String {
        self.args
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> String {
        self.skip_ws();
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest().len());
        let ident = self.rest()[..len].to_string();
        assert!(!ident.is_empty(), "expected a name at {:?}", self.rest());
        self.pos += len;
        ident
    }

    fn value(&mut self) -> Value {
        self.skip_ws();
        if self.rest().starts_with('"') {
            let mut stream = serde_json::Deserializer::from_str(self.rest()).into_iter::<Value>();
            let value = stream.next().unwrap().unwrap();
            self.pos += stream.byte_offset();
            return value;
        }
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '.'))
            .unwrap_or(self.rest().len());
        let token = &self.rest()[..len];
        let value = serde_json::from_str(token).unwrap();
        self.pos += len;
        value
    }
}

/// Parse `kind { alias: field(arg: value) { a b } ... }`.
pub fn parse_document(document: &str) -> (String, Vec<Call>) {
    let mut cursor = Cursor { src: document, pos: 0 };
    let kind = cursor.ident();
    assert!(cursor.eat('{'), "missing operation body");

    let mut calls = Vec::new();
    while !cursor.eat('}') {
        let first = cursor.ident();
        let (alias, name) = if cursor.eat(':') {
            (Some(first), cursor.ident())
        } else {
            (None, first)
        };

        let mut args = Map::new();
        if cursor.eat('(') {
            while !cursor.eat(')') {
                let arg = cursor.ident();
                assert!(cursor.eat(':'), "missing ':' after argument {}", arg);
                args.insert(arg, cursor.value());
            }
        }

        let mut selection = Vec::new();
        if cursor.eat('{') {
            while !cursor.eat('}') {
                selection.push(cursor.ident());
            }
        }

        calls.push(Call {
            alias,
            name,
            args,
            selection,
        });
    }
    (kind, calls)
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

#[derive(Default)]
struct LedgerState {
    players: HashMap<String, Map<String, Value>>,
    inventories: HashMap<String, String>,
    quests: HashMap<String, String>,
    battles: HashMap<String, Value>,
    player_battles: HashMap<String, Vec<String>>,
    guilds: HashMap<String, Value>,
    player_guilds: HashMap<String, String>,
    achievements: Vec<Map<String, Value>>,
    transfers: Vec<Map<String, Value>>,
    region: String,
}

/// In-memory game application.
pub struct MockApplication {
    state: Mutex<LedgerState>,
    calls: AtomicUsize,
    documents: Mutex<Vec<String>>,
    scripted: Mutex<VecDeque<Result<String, TransportError>>>,
    region_gate: Mutex<Option<oneshot::Receiver<()>>>,
    held: AtomicUsize,
}

impl MockApplication {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(LedgerState {
                region: "world1".to_string(),
                ..LedgerState::default()
            }),
            calls: AtomicUsize::new(0),
            documents: Mutex::new(Vec::new()),
            scripted: Mutex::new(VecDeque::new()),
            region_gate: Mutex::new(None),
            held: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Operation documents received so far, in order.
    pub fn documents(&self) -> Vec<String> {
        self.documents.lock().unwrap().clone()
    }

    /// Answer the next request with `raw` instead of interpreting it.
    pub fn script(&self, raw: &str) {
        self.scripted.lock().unwrap().push_back(Ok(raw.to_string()));
    }

    /// Fail the next request at the transport level.
    pub fn fail_next(&self, error: TransportError) {
        self.scripted.lock().unwrap().push_back(Err(error));
    }

    pub fn set_region(&self, region: &str) {
        self.state.lock().unwrap().region = region.to_string();
    }

    /// Hold the next `worldRegion` read after it has captured the region,
    /// until the returned sender fires.
    pub fn gate_next_region(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.region_gate.lock().unwrap() = Some(rx);
        tx
    }

    /// Number of requests that have been held at the region gate.
    pub fn held(&self) -> usize {
        self.held.load(Ordering::SeqCst)
    }

    pub fn seed_guild(&self, id: &str, name: &str) {
        self.state.lock().unwrap().guilds.insert(
            id.to_string(),
            json!({ "id": id, "name": name, "members": [], "resources": 0, "level": 1 }),
        );
    }

    pub fn achievements(&self) -> Vec<Map<String, Value>> {
        self.state.lock().unwrap().achievements.clone()
    }

    pub fn transfers(&self) -> Vec<Map<String, Value>> {
        self.state.lock().unwrap().transfers.clone()
    }

    fn resolve(&self, kind: &str, call: &Call) -> Result<Value, String> {
        let mut state = self.state.lock().unwrap();
        let player = call.str_arg("playerId");
        let value = match call.name.as_str() {
            "__typename" => json!(if kind == "mutation" { "MutationRoot" } else { "QueryRoot" }),
            "savePlayerState" => {
                let mut stats = call.args.clone();
                stats.remove("playerId");
                state.players.insert(player, stats);
                Value::Bool(true)
            }
            "playerState" => match state.players.get(&player) {
                Some(stats) => select(&Value::Object(stats.clone()), &call.selection),
                None => Value::Null,
            },
            "saveInventory" => {
                state.inventories.insert(player, call.str_arg("inventory"));
                Value::Bool(true)
            }
            "inventory" => state.inventories.get(&player).map_or(Value::Null, |s| json!(s)),
            "saveQuests" => {
                state.quests.insert(player, call.str_arg("quests"));
                Value::Bool(true)
            }
            "quests" => state.quests.get(&player).map_or(Value::Null, |s| json!(s)),
            "transferPlayer" => {
                state.transfers.push(call.args.clone());
                Value::Bool(true)
            }
            "recordBattle" => {
                let battle_id = call.str_arg("battleId");
                let mut record = call.args.clone();
                let result = record.remove("playerResult").unwrap_or(Value::Null);
                record.insert("result".to_string(), result);
                record.insert("timestamp".to_string(), json!(1_700_000_000u64));
                state.battles.insert(battle_id.clone(), Value::Object(record));
                state.player_battles.entry(player).or_default().push(battle_id);
                Value::Bool(true)
            }
            "battleRecord" => match state.battles.get(&call.str_arg("battleId")) {
                Some(record) => select(record, &call.selection),
                None => Value::Null,
            },
            "playerBattles" => json!(state.player_battles.get(&player).cloned().unwrap_or_default()),
            "joinGuild" => {
                let guild_id = call.str_arg("guildId");
                let Some(guild) = state.guilds.get_mut(&guild_id) else {
                    return Err(format!("guild {} does not exist", guild_id));
                };
                if let Some(members) = guild["members"].as_array_mut() {
                    members.push(json!(player));
                }
                state.player_guilds.insert(player, guild_id);
                Value::Bool(true)
            }
            "guild" => match state.guilds.get(&call.str_arg("guildId")) {
                Some(guild) => select(guild, &call.selection),
                None => Value::Null,
            },
            "playerGuild" => state.player_guilds.get(&player).map_or(Value::Null, |g| json!(g)),
            "worldRegion" => json!(state.region),
            "submitAchievement" => {
                state.achievements.push(call.args.clone());
                Value::Bool(true)
            }
            other => return Err(format!("Unknown field \"{}\"", other)),
        };
        Ok(value)
    }
}

fn select(source: &Value, selection: &[String]) -> Value {
    if selection.is_empty() {
        return source.clone();
    }
    let mut selected = Map::new();
    for field in selection {
        selected.insert(field.clone(), source.get(field).cloned().unwrap_or(Value::Null));
    }
    Value::Object(selected)
}

#[async_trait]
impl Application for MockApplication {
    async fn query(&self, request: &str) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let wire: Value = serde_json::from_str(request).unwrap();
        let document = wire["query"].as_str().unwrap().to_string();
        self.documents.lock().unwrap().push(document.clone());

        if let Some(scripted) = self.scripted.lock().unwrap().pop_front() {
            return scripted;
        }

        let (kind, calls) = parse_document(&document);
        let mut data = Map::new();
        let mut errors = Vec::new();
        for call in &calls {
            match self.resolve(&kind, call) {
                Ok(value) => {
                    data.insert(call.key().to_string(), value);
                }
                Err(message) => errors.push(json!({ "message": message })),
            }
        }

        if calls.iter().any(|c| c.name == "worldRegion") {
            let gate = self.region_gate.lock().unwrap().take();
            if let Some(gate) = gate {
                self.held.fetch_add(1, Ordering::SeqCst);
                let _ = gate.await;
            }
        }

        let response = if errors.is_empty() {
            json!({ "data": data })
        } else {
            json!({ "data": Value::Null, "errors": errors })
        };
        Ok(response.to_string())
    }
}

// ---------------------------------------------------------------------------
// Chain client, connector, faucet, environment, keys
// ---------------------------------------------------------------------------

pub struct MockChainClient {
    application: Arc<MockApplication>,
    lookups: AtomicUsize,
    notifier: Mutex<Option<mpsc::Sender<Notification>>>,
    notifications_available: bool,
}

impl MockChainClient {
    pub fn new(application: Arc<MockApplication>) -> Arc<Self> {
        Self::build(application, true)
    }

    pub fn without_notifications(application: Arc<MockApplication>) -> Arc<Self> {
        Self::build(application, false)
    }

    fn build(application: Arc<MockApplication>, notifications_available: bool) -> Arc<Self> {
        Arc::new(Self {
            application,
            lookups: AtomicUsize::new(0),
            notifier: Mutex::new(None),
            notifications_available,
        })
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Sender feeding the most recent notification subscription.
    pub fn notifier(&self) -> mpsc::Sender<Notification> {
        self.notifier.lock().unwrap().clone().expect("no subscription")
    }

    pub fn has_subscription(&self) -> bool {
        self.notifier.lock().unwrap().is_some()
    }

    /// Close the push stream as a dropped connection would.
    pub fn close_notifications(&self) {
        self.notifier.lock().unwrap().take();
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Arc<dyn Application>, TransportError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if application_id.as_str() == APP_ID {
            Ok(self.application.clone())
        } else {
            Err(TransportError::NotFound(application_id.to_string()))
        }
    }

    async fn notifications(&self) -> Result<NotificationStream, TransportError> {
        if !self.notifications_available {
            return Err(TransportError::Subscription("not supported".to_string()));
        }
        let (tx, rx) = mpsc::channel(16);
        *self.notifier.lock().unwrap() = Some(tx);
        Ok(rx)
    }
}

pub struct MockConnector {
    client: Arc<MockChainClient>,
    connects: AtomicUsize,
    journal: Journal,
}

impl MockConnector {
    pub fn new(client: Arc<MockChainClient>, journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            client,
            connects: AtomicUsize::new(0),
            journal,
        })
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainConnector for MockConnector {
    async fn connect(
        &self,
        _wallet: &Wallet,
        _signer: Arc<dyn Signer>,
        _chain_id: &ChainId,
    ) -> Result<Arc<dyn ChainClient>, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.journal.push("connector.connect");
        Ok(self.client.clone())
    }
}

pub struct MockFaucet {
    wallets: AtomicUsize,
    claims: AtomicUsize,
    delay: Duration,
    failures_left: AtomicUsize,
    claimed_owners: Mutex<Vec<Owner>>,
    journal: Journal,
}

impl MockFaucet {
    pub fn new(journal: Journal) -> Arc<Self> {
        Self::with_delay(journal, Duration::ZERO)
    }

    pub fn with_delay(journal: Journal, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            wallets: AtomicUsize::new(0),
            claims: AtomicUsize::new(0),
            delay,
            failures_left: AtomicUsize::new(0),
            claimed_owners: Mutex::new(Vec::new()),
            journal,
        })
    }

    /// Make the next `count` wallet requests fail.
    pub fn fail_times(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn wallets(&self) -> usize {
        self.wallets.load(Ordering::SeqCst)
    }

    pub fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }

    pub fn claimed_owners(&self) -> Vec<Owner> {
        self.claimed_owners.lock().unwrap().clone()
    }
}

#[async_trait]
impl Faucet for MockFaucet {
    async fn create_wallet(&self) -> Result<Wallet, TransportError> {
        self.wallets.fetch_add(1, Ordering::SeqCst);
        self.journal.push("faucet.create_wallet");
        tokio::time::sleep(self.delay).await;
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TransportError::Unavailable("faucet down".to_string()));
        }
        Ok(Wallet {
            genesis_config: json!({ "network": "test" }),
        })
    }

    async fn claim_chain(&self, _wallet: &Wallet, owner: &Owner) -> Result<ChainId, TransportError> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        self.journal.push("faucet.claim_chain");
        self.claimed_owners.lock().unwrap().push(owner.clone());
        Ok(ChainId::from(CHAIN))
    }
}

/// Host environment with a scripted answer.
pub struct MockEnvironment {
    session: Option<EnvironmentSession>,
    error: Option<TransportError>,
    calls: AtomicUsize,
    journal: Journal,
}

impl MockEnvironment {
    pub fn empty(journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            session: None,
            error: None,
            calls: AtomicUsize::new(0),
            journal,
        })
    }

    pub fn failing(journal: Journal, error: TransportError) -> Arc<Self> {
        Arc::new(Self {
            session: None,
            error: Some(error),
            calls: AtomicUsize::new(0),
            journal,
        })
    }

    pub fn with_session(journal: Journal, client: Arc<MockChainClient>) -> Arc<Self> {
        let session = EnvironmentSession {
            client,
            chain_id: ChainId::from(HOST_CHAIN),
            owner: Owner::parse(HOST_OWNER).unwrap(),
            signer: Arc::new(FixedSigner::new(HOST_OWNER)),
        };
        Arc::new(Self {
            session: Some(session),
            error: None,
            calls: AtomicUsize::new(0),
            journal,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostEnvironment for MockEnvironment {
    async fn session(&self) -> Result<Option<EnvironmentSession>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.journal.push("environment.session");
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(self.session.clone()),
        }
    }
}

/// Signer with a fixed address.
#[derive(Debug)]
pub struct FixedSigner {
    address: String,
}

impl FixedSigner {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
        }
    }
}

#[async_trait]
impl Signer for FixedSigner {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn sign_message(&self, message: &[u8]) -> Result<String, KeyStoreError> {
        Ok(format!("sig:{}:{}", self.address, String::from_utf8_lossy(message)))
    }
}

pub struct FixedKeyStore {
    address: String,
    calls: AtomicUsize,
}

impl FixedKeyStore {
    pub fn new(address: &str) -> Arc<Self> {
        Arc::new(Self {
            address: address.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl KeyStore for FixedKeyStore {
    fn signing_key(&self) -> Result<Arc<dyn Signer>, KeyStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FixedSigner::new(&self.address)))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub fn test_config() -> SyncConfig {
    let mut config = SyncConfig::default();
    config.application.application_id = Some(APP_ID.to_string());
    config.application.hub_application_id = Some("hub-app".to_string());
    config
}

/// A client wired to in-memory doubles, self-provisioning by default.
pub struct Harness {
    pub client: Arc<SyncClient>,
    pub application: Arc<MockApplication>,
    pub chain_client: Arc<MockChainClient>,
    pub faucet: Arc<MockFaucet>,
    pub environment: Arc<MockEnvironment>,
    pub connector: Arc<MockConnector>,
    pub keys: Arc<FixedKeyStore>,
    pub journal: Journal,
}

pub struct HarnessBuilder {
    config: SyncConfig,
    faucet_delay: Duration,
    host_session: bool,
    environment_error: Option<TransportError>,
    notifications: bool,
}

impl HarnessBuilder {
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn faucet_delay(mut self, delay: Duration) -> Self {
        self.faucet_delay = delay;
        self
    }

    pub fn host_session(mut self) -> Self {
        self.host_session = true;
        self
    }

    pub fn environment_error(mut self, error: TransportError) -> Self {
        self.environment_error = Some(error);
        self
    }

    pub fn without_notifications(mut self) -> Self {
        self.notifications = false;
        self
    }

    pub fn build(self) -> Harness {
        let journal = Journal::default();
        let application = MockApplication::new();
        let chain_client = if self.notifications {
            MockChainClient::new(application.clone())
        } else {
            MockChainClient::without_notifications(application.clone())
        };
        let faucet = MockFaucet::with_delay(journal.clone(), self.faucet_delay);
        let environment = match (self.host_session, self.environment_error) {
            (_, Some(error)) => MockEnvironment::failing(journal.clone(), error),
            (true, None) => MockEnvironment::with_session(journal.clone(), chain_client.clone()),
            (false, None) => MockEnvironment::empty(journal.clone()),
        };
        let connector = MockConnector::new(chain_client.clone(), journal.clone());
        let keys = FixedKeyStore::new(OWNER);

        let client = Arc::new(SyncClient::new(
            &self.config,
            environment.clone(),
            faucet.clone(),
            keys.clone(),
            connector.clone(),
        ));

        Harness {
            client,
            application,
            chain_client,
            faucet,
            environment,
            connector,
            keys,
            journal,
        }
    }
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            config: test_config(),
            faucet_delay: Duration::ZERO,
            host_session: false,
            environment_error: None,
            notifications: true,
        }
    }

    pub fn new() -> Harness {
        Self::builder().build()
    }

    /// Build and connect.
    pub async fn connected() -> Harness {
        let harness = Self::new();
        harness.client.connect().await.unwrap();
        harness
    }
}

/// Poll `condition` until it holds or a second passes.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

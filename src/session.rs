use crate::error::GameError;
use crate::game::bot::{self, Bot};
use crate::game::player::LobbyPlayer;
use crate::game::update::{BoardUpdate, GameEvent, PlayerUpdate};
use crate::game::{Game as GameInner, GameOptions, Phase, MAX_PLAYERS, MIN_PLAYERS};
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::{broadcast, watch};

/// Seconds players get to memorise their dealt card.
const CARD_REVEAL_SECS: u64 = 5;
/// Seconds each night turn stays open before it resolves with no selection.
const NIGHT_TURN_SECS: u64 = 8;
/// Seconds the vote stays open before it resolves with the votes cast so far.
const VOTING_SECS: u64 = 60;
/// How long a bot waits before declaring itself ready to vote.
const BOT_READY_SECS: std::ops::Range<u64> = 10..30;
/// Sessions idle longer than this are purged.
const SESSION_EXPIRY: Duration = Duration::from_secs(3600);

/// The room-code alphabet, avoiding characters that read ambiguously.
const ROOM_CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const ROOM_CODE_LEN: usize = 6;

/// Manages all the game sessions running on the server.
pub struct SessionManager {
    sessions: DashMap<String, SessionHandle>,
    dbs: Dbs,
}

/// The databases that sessions are persisted to.
#[derive(Clone)]
struct Dbs {
    db: sled::Db,
    game: sled::Tree,
    archive: sled::Tree,
}

/// A single game session: the lobby, the running game, its bots and the
/// channels its clients listen on.
pub struct Session {
    /// The room code.
    id: String,
    game: GameLifecycle,
    /// Bot decision state, keyed by player name. Instances live across the
    /// whole round, so night choices and votes come from one seeded stream.
    bots: HashMap<String, Bot>,
    /// Channel for sending game state updates to clients.
    updates: watch::Sender<GameUpdate>,
    /// Channel for narration events (phase and role-turn transitions).
    events: broadcast::Sender<GameEvent>,
    /// The phase generation that timers and bot tasks were last scheduled
    /// for, so a re-pump of the same phase schedules nothing twice.
    scheduled_gen: Option<u64>,
    dbs: Dbs,
    /// Timestamp of the last time this session was interacted with.
    last_ts: Instant,
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// The persisted form of a session.
#[derive(Serialize, Deserialize)]
struct SessionRecord {
    game: GameLifecycle,
    bots: HashMap<String, Bot>,
}

/// The scheduling a phase asks for: one deadline plus a delayed submission
/// per bot the phase is waiting on.
struct PhaseWork {
    gen: u64,
    deadline_secs: Option<u64>,
    bots: Vec<(String, Duration)>,
}

#[allow(clippy::large_enum_variant)]
#[derive(Clone, Serialize, Deserialize)]
enum GameLifecycle {
    Lobby {
        options: GameOptions,
        players: Vec<LobbyPlayer>,
    },
    Playing {
        game: GameInner,
        started_ts: SystemTime,
        archived: bool,
    },
}

/// The state snapshot pushed to every connected client.
#[derive(Clone, Debug)]
pub enum GameUpdate {
    Lobby {
        players: Vec<LobbyPlayer>,
        options: GameOptions,
        can_start: bool,
    },
    Playing {
        board: BoardUpdate,
        players: Vec<PlayerUpdate>,
    },
}

impl SessionManager {
    pub fn new(db: sled::Db) -> Result<Self, Box<dyn Error>> {
        let sessions = DashMap::new();
        let dbs = Dbs {
            db: db.clone(),
            game: db.open_tree("games")?,
            archive: db.open_tree("archive")?,
        };
        for entry in dbs.game.iter() {
            let (id, record) = entry?;
            let id = String::from_utf8(id.to_vec())?;
            let Ok(record) = serde_json::from_slice::<SessionRecord>(&record) else {
                continue;
            };
            let session = Session::hydrate(id.clone(), dbs.clone(), record);
            sessions.insert(id, Arc::new(Mutex::new(session)));
        }
        Ok(Self { sessions, dbs })
    }

    /// Creates a new session with a fresh room code.
    pub fn create_game(&self, options: GameOptions) -> SessionHandle {
        loop {
            let id = Self::random_room_code();
            let entry = self.sessions.entry(id);
            if let Entry::Occupied(_) = entry {
                continue;
            }
            let session = Session::new(entry.key().clone(), self.dbs.clone(), options);
            let session = Arc::new(Mutex::new(session));
            entry.or_insert(session.clone());
            break session;
        }
    }

    pub fn find_game(&self, room_code: &str) -> Result<SessionHandle, GameError> {
        self.sessions
            .get(room_code)
            .map(|session| session.clone())
            .ok_or(GameError::GameNotFound)
    }

    pub fn num_games(&self) -> usize {
        self.sessions.len()
    }

    /// Restarts the timers and bot tasks of sessions restored from disk.
    /// Must run inside the tokio runtime.
    pub fn resume_games(&self) {
        for session in self.sessions.iter() {
            Session::pump(session.value());
        }
    }

    /// Drops sessions nobody has touched for an hour.
    pub fn purge_games(&self) {
        let mut ids_to_delete = vec![];

        for session in self.sessions.iter() {
            let room_code = session.key();
            let Ok(session) = session.lock() else {
                log::error!("Found poisoned session: {}", room_code);
                ids_to_delete.push(room_code.clone());
                continue;
            };
            if session.last_ts.elapsed() > SESSION_EXPIRY {
                if self.dbs.game.remove(session.id().as_bytes()).is_ok() {
                    ids_to_delete.push(room_code.clone());
                } else {
                    log::error!("Could not remove game: {}", room_code);
                }
            }
        }

        for room_code in ids_to_delete.into_iter() {
            self.sessions.remove(&room_code);
        }
    }

    fn random_room_code() -> String {
        let mut rng = rand::thread_rng();
        (0..ROOM_CODE_LEN)
            .map(|_| *ROOM_CODE_CHARS.choose(&mut rng).unwrap() as char)
            .collect()
    }
}

impl Session {
    fn new(id: String, dbs: Dbs, options: GameOptions) -> Self {
        Self::hydrate(
            id,
            dbs,
            SessionRecord {
                game: GameLifecycle::Lobby { options, players: vec![] },
                bots: HashMap::new(),
            },
        )
    }

    fn hydrate(id: String, dbs: Dbs, record: SessionRecord) -> Self {
        let mut session = Self {
            id,
            game: record.game,
            bots: record.bots,
            updates: watch::channel(GameUpdate::Lobby {
                players: vec![],
                options: GameOptions::default(),
                can_start: false,
            })
            .0,
            events: broadcast::channel(64).0,
            scheduled_gen: None,
            dbs,
            last_ts: Instant::now(),
        };
        session.notify();
        session
    }

    /// Gets the room code.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// A stream of state updates for a client.
    pub fn subscribe(&self) -> watch::Receiver<GameUpdate> {
        self.updates.subscribe()
    }

    /// A stream of narration events, consumed by the narrator's client.
    pub fn subscribe_events(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Adds a player to the lobby, or resumes their seat if the name is
    /// already present (rejoining clients come back under the same name).
    pub fn add_player(&mut self, name: &str) -> Result<(), GameError> {
        match &mut self.game {
            GameLifecycle::Lobby { players, .. } => {
                if players.iter().any(|p| p.name == name) {
                    return Ok(());
                }
                if players.len() == MAX_PLAYERS {
                    return Err(GameError::TooManyPlayers);
                }
                players.push(LobbyPlayer {
                    name: name.to_string(),
                    is_host: players.is_empty(),
                    is_bot: false,
                });
                self.notify();
                self.persist().ok();
                Ok(())
            }
            GameLifecycle::Playing { game, .. } => {
                game.find_player(name).map(|_| ()).map_err(|_| GameError::CannotJoinStartedGame)
            }
        }
    }

    /// Host-only: adds a bot to the lobby.
    pub fn add_bot(&mut self, host: &str) -> Result<(), GameError> {
        self.check_host(host)?;
        let id = self.id.clone();
        let GameLifecycle::Lobby { players, .. } = &mut self.game else {
            return Err(GameError::InvalidAction);
        };
        if players.len() == MAX_PLAYERS {
            return Err(GameError::TooManyPlayers);
        }

        let existing: Vec<String> = players.iter().map(|p| p.name.clone()).collect();
        let num_bots = players.iter().filter(|p| p.is_bot).count();
        let name = bot::bot_name(&existing, num_bots, &mut rand::thread_rng());
        players.push(LobbyPlayer {
            name: name.clone(),
            is_host: false,
            is_bot: true,
        });
        self.bots.insert(name.clone(), Bot::new(bot_seed(&id, &name)));

        self.notify();
        self.persist().ok();
        Ok(())
    }

    /// Removes a player from the lobby, promoting a new host if needed.
    pub fn remove_player(&mut self, name: &str) -> Result<(), GameError> {
        let GameLifecycle::Lobby { players, .. } = &mut self.game else {
            return Err(GameError::InvalidAction);
        };
        let idx = players.iter().position(|p| p.name == name).ok_or(GameError::PlayerNotFound)?;
        let was_host = players[idx].is_host;
        players.remove(idx);
        self.bots.remove(name);
        if was_host {
            if let Some(next_host) = players.iter_mut().find(|p| !p.is_bot) {
                next_host.is_host = true;
            }
        }
        self.notify();
        self.persist().ok();
        Ok(())
    }

    /// Host-only: replaces the game options.
    pub fn set_options(&mut self, host: &str, new_options: GameOptions) -> Result<(), GameError> {
        self.check_host(host)?;
        let GameLifecycle::Lobby { options, players } = &mut self.game else {
            return Err(GameError::InvalidAction);
        };
        if let Some(narrator) = &new_options.narrator {
            if !players.iter().any(|p| &p.name == narrator) {
                return Err(GameError::PlayerNotFound);
            }
        }
        *options = new_options;
        self.notify();
        self.persist().ok();
        Ok(())
    }

    /// Host-only: picks a uniformly random narrator.
    pub fn randomize_narrator(&mut self, host: &str) -> Result<(), GameError> {
        self.check_host(host)?;
        let GameLifecycle::Lobby { options, players } = &mut self.game else {
            return Err(GameError::InvalidAction);
        };
        options.narrator = players.choose(&mut rand::thread_rng()).map(|p| p.name.clone());
        self.notify();
        self.persist().ok();
        Ok(())
    }

    /// Host-only: deals the cards and starts the round.
    pub fn start_game(&mut self, host: &str) -> Result<(), GameError> {
        self.check_host(host)?;
        let GameLifecycle::Lobby { options, players } = &self.game else {
            return Err(GameError::InvalidAction);
        };

        let seed = rand::thread_rng().next_u64();
        let game = GameInner::new(options.clone(), players, seed)?;
        self.game = GameLifecycle::Playing {
            game,
            started_ts: SystemTime::now(),
            archived: false,
        };
        self.scheduled_gen = None;
        self.notify();
        self.persist().ok();
        Ok(())
    }

    /// Returns the session to the lobby for another round. Identities, host
    /// flag, bots and settings survive; roles, votes and notes do not.
    pub fn return_to_lobby(&mut self) -> Result<(), GameError> {
        let GameLifecycle::Playing { game, .. } = &self.game else {
            return Err(GameError::InvalidAction);
        };
        if !game.game_over() {
            return Err(GameError::InvalidAction);
        }
        let options = game.options().clone();
        let players = game
            .players()
            .iter()
            .map(|p| LobbyPlayer {
                name: p.name.clone(),
                is_host: p.is_host,
                is_bot: p.is_bot,
            })
            .collect();

        self.archive().ok();
        self.game = GameLifecycle::Lobby { options, players };
        self.scheduled_gen = None;
        self.notify();
        self.persist().ok();
        Ok(())
    }

    /// Performs an action on the game.
    pub fn mutate_game<F>(&mut self, mutation: F) -> Result<(), GameError>
    where
        F: FnOnce(&mut GameInner) -> Result<(), GameError>,
    {
        let GameLifecycle::Playing { game, .. } = &mut self.game else {
            return Err(GameError::InvalidAction);
        };

        mutation(game)?;
        self.notify();
        self.persist().ok();
        self.archive().ok();

        Ok(())
    }

    /// Keeps the game session alive.
    pub fn heartbeat(&mut self) {
        self.last_ts = Instant::now();
    }

    /// Schedules the deadline timer and bot work for the current phase of a
    /// session. Call after any mutation that may have advanced the game; a
    /// phase that was already scheduled is left alone. Timer and bot tasks
    /// capture the phase generation, so once the game moves on they fire as
    /// no-ops instead of acting on the wrong phase.
    pub fn pump(handle: &SessionHandle) {
        let mut session = handle.lock().unwrap();
        let Some(work) = session.phase_work() else {
            return;
        };
        if session.scheduled_gen == Some(work.gen) {
            return;
        }
        session.scheduled_gen = Some(work.gen);
        drop(session);

        let gen = work.gen;
        if let Some(secs) = work.deadline_secs {
            let handle = handle.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                Session::on_deadline(&handle, gen);
            });
        }

        // Every bot the phase is waiting on gets a task that thinks, then
        // submits through the same entry points a human client uses.
        for (name, delay) in work.bots {
            let handle = handle.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                Session::on_bot_turn(&handle, gen, &name);
            });
        }
    }

    /// The deadline and bot tasks the current phase needs, or `None` when
    /// there is nothing left to drive.
    fn phase_work(&self) -> Option<PhaseWork> {
        let GameLifecycle::Playing { game, .. } = &self.game else {
            return None;
        };
        if game.game_over() {
            return None;
        }

        let phase = game.phase();
        let deadline_secs = match phase {
            Phase::Setup => Some(CARD_REVEAL_SECS),
            Phase::Night => Some(NIGHT_TURN_SECS),
            Phase::Day => Some(game.options().discussion_secs()),
            Phase::Voting => Some(VOTING_SECS),
            Phase::Results => None,
        };

        let bots = game
            .waiting_on()
            .into_iter()
            .filter_map(|idx| game.players().get(idx))
            .filter(|p| p.is_bot)
            .map(|p| {
                let delay = match phase {
                    Phase::Day => Duration::from_secs(rand::thread_rng().gen_range(BOT_READY_SECS)),
                    _ => self
                        .bots
                        .get(&p.name)
                        .map(|b| b.thinking_time())
                        .unwrap_or(Duration::from_secs(1)),
                };
                (p.name.clone(), delay)
            })
            .collect();

        Some(PhaseWork {
            gen: game.phase_gen(),
            deadline_secs,
            bots,
        })
    }

    /// A phase deadline fired. Resolves the phase it was scheduled for, if
    /// the game is still in it.
    fn on_deadline(handle: &SessionHandle, gen: u64) {
        {
            let mut session = handle.lock().unwrap();
            let result = session.mutate_game(|game| {
                if game.phase_gen() != gen {
                    return Ok(());
                }
                match game.phase() {
                    Phase::Setup => game.expire_setup(),
                    Phase::Night => game.expire_night_turn(),
                    Phase::Day => game.expire_discussion(),
                    Phase::Voting => game.expire_voting(),
                    Phase::Results => {}
                }
                Ok(())
            });
            if let Err(err) = result {
                log::error!("Deadline resolution failed: {}", err);
            }
        }
        Session::pump(handle);
    }

    /// A bot finished thinking. Submits its decision for the phase the task
    /// was scheduled in, unless the game has already moved on.
    fn on_bot_turn(handle: &SessionHandle, gen: u64, name: &str) {
        {
            let mut session = handle.lock().unwrap();
            let id = session.id.clone();
            // A missing bot is rebuilt from the same seed; committed notes
            // and votes live in the game, not the bot, so nothing diverges.
            let mut bot = session
                .bots
                .get(name)
                .cloned()
                .unwrap_or_else(|| Bot::new(bot_seed(&id, name)));

            let result = session.mutate_game(|game| {
                if game.phase_gen() != gen {
                    return Ok(());
                }
                let player = game.find_player(name)?;
                match game.phase() {
                    Phase::Setup => game.confirm_card(player),
                    Phase::Night => {
                        let selection = bot.choose_night_action(player, game);
                        game.submit_night_selection(player, selection)
                    }
                    Phase::Day => game.confirm_ready(player),
                    Phase::Voting => match bot.choose_vote(player, game) {
                        Some(target) => game.cast_vote(player, target),
                        None => Ok(()),
                    },
                    Phase::Results => Ok(()),
                }
            });
            session.bots.insert(name.to_string(), bot);
            session.persist().ok();
            if let Err(err) = result {
                log::error!("Bot {} failed to act: {}", name, err);
            }
        }
        Session::pump(handle);
    }

    fn check_host(&self, name: &str) -> Result<(), GameError> {
        let is_host = match &self.game {
            GameLifecycle::Lobby { players, .. } => players.iter().any(|p| p.name == name && p.is_host),
            GameLifecycle::Playing { game, .. } => game.players().iter().any(|p| p.name == name && p.is_host),
        };
        if is_host {
            Ok(())
        } else {
            Err(GameError::NotHost)
        }
    }

    /// Notifies all connected clients of the new game state.
    fn notify(&mut self) {
        match &mut self.game {
            GameLifecycle::Lobby { options, players } => {
                let update = GameUpdate::Lobby {
                    players: players.clone(),
                    options: options.clone(),
                    can_start: players.len() >= MIN_PLAYERS && players.len() <= MAX_PLAYERS,
                };
                self.updates.send_replace(update);
            }
            GameLifecycle::Playing { game, .. } => {
                for event in game.take_events() {
                    self.events.send(event).ok();
                }
                let update = GameUpdate::Playing {
                    board: game.get_board_update(),
                    players: (0..game.num_players()).map(|idx| game.get_player_update(idx)).collect(),
                };
                self.updates.send_replace(update);
            }
        }
        self.last_ts = Instant::now();
    }

    /// Persists the session to disk, so it can be recovered upon server
    /// restart. Failures are logged and left for the next mutation to retry.
    fn persist(&mut self) -> Result<(), Box<dyn Error>> {
        let record = SessionRecord {
            game: self.game.clone(),
            bots: self.bots.clone(),
        };
        if let Err(err) = self
            .dbs
            .game
            .insert(self.id.as_bytes(), serde_json::to_string(&record)?.as_bytes())
        {
            log::error!("Could not persist session {}: {}", self.id, err);
            return Err(err.into());
        }
        Ok(())
    }

    /// Archives the game if it is over and hasn't been archived yet.
    fn archive(&mut self) -> Result<(), Box<dyn Error>> {
        let GameLifecycle::Playing { game, started_ts, archived } = &mut self.game else {
            return Ok(());
        };
        if game.game_over() && !*archived {
            let key = self.dbs.db.generate_id()?.to_be_bytes();
            let data = json!({
                "room_code": self.id,
                "players": game.player_names().collect::<Vec<_>>(),
                "started": iso8601(*started_ts),
                "finished": iso8601(SystemTime::now()),
                "outcome": game.outcome().map(|o| o.to_string()),
            })
            .to_string();
            self.dbs.archive.insert(key, data.as_bytes())?;
            *archived = true;
        }
        Ok(())
    }
}

/// The deterministic seed for a bot, derived from the room code and the
/// bot's name so a rebuilt instance picks up the same decision stream.
fn bot_seed(room_code: &str, name: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in room_code.bytes().chain(name.bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn iso8601(st: SystemTime) -> String {
    let dt: DateTime<Utc> = st.into();
    dt.format("%+").to_string()
}

use crate::{
    error::GameError,
    game::{GameOptions, NightSelection},
    session::{GameUpdate, SessionHandle, SessionManager},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::{broadcast, watch};

/// A single connected participant: a player, the host, or the narrator.
pub struct Client<'a> {
    manager: &'a SessionManager,
    session: Option<SessionHandle>,
    player: Option<String>,
    room_code: Option<String>,
    updates: Option<watch::Receiver<GameUpdate>>,
    events: Option<broadcast::Receiver<crate::game::update::GameEvent>>,
}

/// A lobby action only the host may perform.
#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostAction {
    AddBot,
    SetOptions { options: GameOptions },
    RandomizeNarrator,
    StartGame,
}

/// An action performed by any player.
#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerAction {
    ConfirmCard,
    NightSelection { selection: NightSelection },
    ConfirmReady,
    CastVote { name: String },
    ReturnToLobby,
    LeaveLobby,
}

impl<'a> Client<'a> {
    /// Creates a new game client.
    pub fn new(manager: &'a SessionManager) -> Self {
        Self {
            manager,
            session: None,
            player: None,
            room_code: None,
            updates: None,
            events: None,
        }
    }

    /// Creates a new game session and joins it as the host.
    /// Returns the room code.
    pub fn create_game(&mut self, name: &str) -> Result<String, GameError> {
        let session = self.manager.create_game(GameOptions::default());
        let room_code = session.lock().unwrap().id().to_owned();
        drop(session);
        self.join_game(&room_code, name)?;
        Ok(room_code)
    }

    /// Joins a game by room code.
    pub fn join_game(&mut self, room_code: &str, name: &str) -> Result<(), GameError> {
        let session = self.manager.find_game(room_code)?;
        {
            let mut session = session.lock().unwrap();
            session.add_player(name)?;
            self.player = Some(name.to_string());
            self.room_code = Some(room_code.to_string());
            self.updates = Some(session.subscribe());
            self.events = Some(session.subscribe_events());
        }
        self.session = Some(session);
        Ok(())
    }

    /// Waits for the next thing to push to this client: a state update, or
    /// a narration event. Narration is delivered to every client; the
    /// presentation layer only voices it on the narrator's device.
    pub async fn next_message(&mut self) -> Value {
        let Some(updates) = &mut self.updates else {
            return std::future::pending().await;
        };
        let events = self.events.as_mut();

        tokio::select! {
            _ = updates.changed() => {
                let update = updates.borrow();
                let state = match &*update {
                    GameUpdate::Lobby {
                        players,
                        options,
                        can_start,
                    } => json!({
                        "type": "lobby",
                        "players": players,
                        "options": options,
                        "canStart": can_start,
                    }),
                    GameUpdate::Playing { board, players } => {
                        let me = self
                            .player
                            .as_ref()
                            .and_then(|name| players.iter().find(|u| &u.name == name));
                        json!({
                            "type": "playing",
                            "board": board,
                            "you": me,
                        })
                    }
                };
                json!({
                    "type": "update",
                    "roomCode": self.room_code,
                    "name": self.player,
                    "state": state,
                })
            }
            event = Self::recv_event(events) => {
                json!({ "type": "narration", "event": event })
            }
        }
    }

    async fn recv_event(
        events: Option<&mut broadcast::Receiver<crate::game::update::GameEvent>>,
    ) -> crate::game::update::GameEvent {
        let Some(events) = events else {
            return std::future::pending().await;
        };
        loop {
            match events.recv().await {
                Ok(event) => return event,
                // A slow narrator just skips ahead; events are pacing cues,
                // not state.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return std::future::pending().await,
            }
        }
    }

    /// Leaves the game.
    pub fn leave(&mut self) {
        if let (Some(session), Some(player)) = (&self.session, &self.player) {
            let mut session = session.lock().unwrap();
            session.remove_player(player).ok();
        }
        self.player = None;
        self.room_code = None;
        self.updates = None;
        self.events = None;
        self.session = None;
    }

    /// Called when the host performs a lobby action.
    pub fn host_action(&self, action: HostAction) -> Result<(), GameError> {
        let player = self.player.as_ref().ok_or(GameError::InvalidAction)?;
        let session = self.session.as_ref().ok_or(GameError::InvalidAction)?;
        {
            let mut locked = session.lock().unwrap();
            match action {
                HostAction::AddBot => locked.add_bot(player)?,
                HostAction::SetOptions { options } => locked.set_options(player, options)?,
                HostAction::RandomizeNarrator => locked.randomize_narrator(player)?,
                HostAction::StartGame => locked.start_game(player)?,
            }
        }
        // A started game immediately needs its timers and bots driven.
        crate::session::Session::pump(session);
        Ok(())
    }

    /// Called when a player performs a game action.
    pub fn player_action(&self, action: PlayerAction) -> Result<(), GameError> {
        let player = self.player.as_ref().ok_or(GameError::InvalidAction)?;
        let session = self.session.as_ref().ok_or(GameError::InvalidAction)?;
        {
            let mut locked = session.lock().unwrap();
            match &action {
                PlayerAction::ReturnToLobby => locked.return_to_lobby()?,
                PlayerAction::LeaveLobby => locked.remove_player(player)?,
                action => {
                    locked.mutate_game(|game| {
                        let player = game.find_player(player)?;
                        match action {
                            PlayerAction::ConfirmCard => game.confirm_card(player),
                            PlayerAction::NightSelection { selection } => {
                                game.submit_night_selection(player, *selection)
                            }
                            PlayerAction::ConfirmReady => game.confirm_ready(player),
                            PlayerAction::CastVote { name } => {
                                let target = game.find_player(name)?;
                                game.cast_vote(player, target)
                            }
                            _ => unreachable!(),
                        }
                    })?;
                }
            }
        }
        crate::session::Session::pump(session);
        Ok(())
    }

    /// Keeps the game session alive.
    pub fn heartbeat(&self) {
        let Some(session) = &self.session else {
            return;
        };
        let mut session = session.lock().unwrap();
        session.heartbeat();
    }
}

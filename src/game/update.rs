use super::role::{NightAction, Role, Team};
use super::{Game, GameState, Phase, WinCondition};
use serde::{Deserialize, Serialize};

/// A narration event, consumed by the presentation layer to announce phase
/// and turn transitions. The engine queues these and never waits on them.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    Phase { phase: Phase },
    RoleTurn { role: Role, stage: TurnStage },
}

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum TurnStage {
    Wake,
    Task,
    Sleep,
}

/// The public view of the game, safe to show to every participant.
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BoardUpdate {
    pub phase: Phase,
    pub players: Vec<PublicPlayer>,
    /// The role whose night turn is running, if any.
    pub active_role: Option<Role>,
    pub votes_cast: usize,
    pub discussion_secs: u64,
    /// Revealed only once the game is over.
    pub eliminated: Vec<String>,
    pub outcome: Option<WinCondition>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PublicPlayer {
    pub name: String,
    pub is_host: bool,
    pub is_bot: bool,
    /// Whether the current phase is still waiting on this player.
    pub waiting: bool,
}

/// One player's private view of the game.
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    pub name: String,
    /// The card this player was dealt.
    pub original_role: Role,
    pub night_notes: Vec<String>,
    pub prompt: Option<PlayerPrompt>,
}

/// What a player can currently do, as plain data. The presentation layer
/// renders the choices and feeds the pick back through a single submission
/// entry point; no listener lifecycle is involved.
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerPrompt {
    /// Memorise the dealt card.
    YourCard {
        role: Role,
        team: Team,
        description: String,
        win_condition: String,
    },
    /// This player holds the active role and must pick a selection.
    NightAction {
        action: NightAction,
        /// Names selectable as targets (everyone but the acting player).
        players: Vec<String>,
        /// Number of selectable center slots.
        center_slots: usize,
    },
    /// Another role group is acting.
    NightWait { active_role: Role },
    Discussion {
        ready: usize,
        total: usize,
    },
    Vote {
        options: Vec<String>,
    },
    GameOver {
        outcome: WinCondition,
        winner: bool,
        eliminated: Vec<String>,
        final_roles: Vec<FinalRole>,
    },
}

/// A player's live card, revealed to everyone at the end of the round.
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FinalRole {
    pub name: String,
    pub role: Role,
    pub team: Team,
}

impl Game {
    pub fn get_board_update(&self) -> BoardUpdate {
        let waiting = self.waiting_on();
        BoardUpdate {
            phase: self.phase(),
            players: self
                .players
                .iter()
                .enumerate()
                .map(|(idx, p)| PublicPlayer {
                    name: p.name.clone(),
                    is_host: p.is_host,
                    is_bot: p.is_bot,
                    waiting: waiting.contains(&idx),
                })
                .collect(),
            active_role: self.active_role(),
            votes_cast: match &self.state {
                GameState::Voting { votes } => votes.count(),
                _ => 0,
            },
            discussion_secs: self.opts.discussion_secs(),
            eliminated: self
                .game_over()
                .then(|| self.eliminated.iter().map(|idx| self.players[*idx].name.clone()).collect())
                .unwrap_or_default(),
            outcome: self.outcome(),
        }
    }

    pub fn get_player_update(&self, player: usize) -> PlayerUpdate {
        let p = &self.players[player];
        PlayerUpdate {
            name: p.name.clone(),
            original_role: p.original_role,
            night_notes: p.night_notes.clone(),
            prompt: self.get_player_prompt(player),
        }
    }

    fn get_player_prompt(&self, player: usize) -> Option<PlayerPrompt> {
        let p = &self.players[player];
        match &self.state {
            GameState::Setup { .. } => Some(PlayerPrompt::YourCard {
                role: p.original_role,
                team: p.original_role.team(),
                description: p.original_role.description().to_string(),
                win_condition: p.original_role.win_condition().to_string(),
            }),
            GameState::Night { role, pending } => {
                if pending.is_waiting(player) {
                    Some(PlayerPrompt::NightAction {
                        action: role.night_action(),
                        players: self.other_player_names(player),
                        center_slots: self.center.len(),
                    })
                } else {
                    Some(PlayerPrompt::NightWait { active_role: *role })
                }
            }
            GameState::Day { ready } => Some(PlayerPrompt::Discussion {
                ready: self.players.len() - ready.waiting_players().len(),
                total: self.players.len(),
            }),
            GameState::Voting { votes } => {
                if votes.has_cast(player) {
                    None
                } else {
                    Some(PlayerPrompt::Vote {
                        options: self.other_player_names(player),
                    })
                }
            }
            GameState::GameOver(outcome) => Some(PlayerPrompt::GameOver {
                outcome: *outcome,
                winner: self.player_has_won(player),
                eliminated: self.eliminated.iter().map(|idx| self.players[*idx].name.clone()).collect(),
                final_roles: self
                    .players
                    .iter()
                    .map(|p| FinalRole {
                        name: p.name.clone(),
                        role: p.current_role,
                        team: p.current_role.team(),
                    })
                    .collect(),
            }),
        }
    }

    fn other_player_names(&self, player: usize) -> Vec<String> {
        self.players
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != player)
            .map(|(_, p)| p.name.clone())
            .collect()
    }
}

use super::role::Role;
use crate::error::GameError;
use serde::{Deserialize, Serialize};

/// Options for customising a game, set by the host in the lobby.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct GameOptions {
    /// The roles in play, in selection order. Werewolves are always added on
    /// top of this list when the cards are dealt.
    pub selected_roles: Vec<Role>,
    /// Length of the day-phase discussion, in minutes.
    pub discussion_time: u32,
    /// The player who narrates phase transitions, if any.
    pub narrator: Option<String>,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            selected_roles: vec![
                Role::Werewolf,
                Role::Seer,
                Role::Robber,
                Role::Drunk,
                Role::Insomniac,
                Role::Villager,
            ],
            discussion_time: 5,
            narrator: None,
        }
    }
}

impl GameOptions {
    /// Checks that these options can start a game with the given player count.
    pub fn validate(&self, num_players: usize) -> Result<(), GameError> {
        if num_players < super::MIN_PLAYERS {
            return Err(GameError::TooFewPlayers);
        }
        if num_players > super::MAX_PLAYERS {
            return Err(GameError::TooManyPlayers);
        }
        if self.selected_roles.is_empty() {
            return Err(GameError::EmptyRoleSelection);
        }
        Ok(())
    }

    /// The discussion budget in seconds.
    pub fn discussion_secs(&self) -> u64 {
        u64::from(self.discussion_time) * 60
    }
}

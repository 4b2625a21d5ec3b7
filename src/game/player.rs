use super::role::Role;
use serde::{Deserialize, Serialize};

/// A participant in the lobby, before any roles have been dealt.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct LobbyPlayer {
    pub name: String,
    pub is_host: bool,
    pub is_bot: bool,
}

/// A game player, human or bot.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Player {
    pub name: String,
    pub is_host: bool,
    pub is_bot: bool,
    /// The role dealt at game start. Fixes which night turn this player acts
    /// on, even if their card is swapped away earlier in the night.
    pub original_role: Role,
    /// The live card, after zero or more swaps. This is what counts at
    /// scoring time.
    pub current_role: Role,
    /// The player this player voted to eliminate, recorded once voting resolves.
    pub vote: Option<usize>,
    /// Facts the player learned during the night, for the day-phase recap.
    pub night_notes: Vec<String>,
}

impl Player {
    pub fn new(lobby: &LobbyPlayer, role: Role) -> Self {
        Self {
            name: lobby.name.clone(),
            is_host: lobby.is_host,
            is_bot: lobby.is_bot,
            original_role: role,
            current_role: role,
            vote: None,
            night_notes: vec![],
        }
    }

    /// Whether this player's card has been swapped away since the deal.
    pub fn was_swapped(&self) -> bool {
        self.original_role != self.current_role
    }
}

/// One of the three face-down cards not dealt to any player. Its position is
/// its index in the center array.
#[derive(Clone, Copy, Serialize, Deserialize, Debug)]
pub struct CenterCard {
    pub original_role: Role,
    pub current_role: Role,
}

impl CenterCard {
    pub fn new(role: Role) -> Self {
        Self {
            original_role: role,
            current_role: role,
        }
    }
}

use super::MAX_PLAYERS;
use serde::{Deserialize, Serialize};

/// Tracks which players still have to act before the current phase can
/// advance. Unlike a simple counter, the waiting set is an explicit subset of
/// players, since a night turn only waits on the holders of the active role.
#[derive(Clone, Copy, Serialize, Deserialize, Debug)]
pub struct PendingActions {
    waiting: [bool; MAX_PLAYERS],
}

impl PendingActions {
    /// A pending set that waits on nobody.
    pub fn none() -> Self {
        Self {
            waiting: [false; MAX_PLAYERS],
        }
    }

    /// A pending set that waits on every player in `players`.
    pub fn for_players(players: impl Iterator<Item = usize>) -> Self {
        let mut pending = Self::none();
        for idx in players {
            pending.waiting[idx] = true;
        }
        pending
    }

    /// Whether the given player still has to act.
    pub fn is_waiting(&self, player_idx: usize) -> bool {
        self.waiting[player_idx]
    }

    /// Marks the player as resolved, and returns `true` iff nobody is left.
    pub fn resolve(&mut self, player_idx: usize) -> bool {
        self.waiting[player_idx] = false;
        self.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.waiting.iter().any(|w| *w)
    }

    /// The players still waited on.
    pub fn waiting_players(&self) -> Vec<usize> {
        (0..MAX_PLAYERS).filter(|idx| self.waiting[*idx]).collect()
    }
}

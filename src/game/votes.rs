use super::MAX_PLAYERS;
use serde::{Deserialize, Serialize};

/// Tracks the elimination vote of each player. A vote names another player's
/// index; abstentions simply never cast.
#[derive(Clone, Copy, Serialize, Deserialize, Debug)]
pub struct Votes {
    num_players: usize,
    votes: [Option<usize>; MAX_PLAYERS],
}

impl Votes {
    /// Creates a new `Votes` for `num_players` voters.
    pub fn new(num_players: usize) -> Self {
        let votes = [None; MAX_PLAYERS];
        Self { num_players, votes }
    }

    /// Returns whether the given player has cast their vote.
    pub fn has_cast(&self, player_idx: usize) -> bool {
        self.votes[player_idx].is_some()
    }

    /// Records the vote of a player.
    pub fn vote(&mut self, player_idx: usize, target: usize) {
        self.votes[player_idx] = Some(target);
    }

    /// Returns `true` iff every player has voted.
    pub fn all_cast(&self) -> bool {
        self.votes[..self.num_players].iter().all(|v| v.is_some())
    }

    /// The number of votes cast so far.
    pub fn count(&self) -> usize {
        self.votes[..self.num_players].iter().filter(|v| v.is_some()).count()
    }

    /// The vote of each player, by voter index.
    pub fn votes(&self) -> &[Option<usize>] {
        &self.votes[..self.num_players]
    }

    /// Computes the eliminated set: every player tied for the most votes.
    /// Returns an empty set when no votes were cast at all.
    pub fn tally(&self) -> Vec<usize> {
        let mut counts = [0usize; MAX_PLAYERS];
        for target in self.votes[..self.num_players].iter().flatten() {
            counts[*target] += 1;
        }
        let max = counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            return vec![];
        }
        (0..self.num_players).filter(|idx| counts[*idx] == max).collect()
    }
}

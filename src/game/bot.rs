use super::night::NightSelection;
use super::role::{NightAction, Team};
use super::Game;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Names handed out to bots, before falling back to numbered defaults.
pub const BOT_NAMES: [&str; 20] = [
    "Alice", "Bob", "Charlie", "Diana", "Eve", "Frank", "Grace", "Henry", "Iris", "Jack", "Kate", "Leo", "Mia",
    "Noah", "Olivia", "Peter", "Quinn", "Ruby", "Sam", "Tina",
];

/// A synthetic player's decision state. One is created per bot when it joins
/// the lobby and the same instance answers for it through the night and the
/// vote, so its choices stay reproducible from the seed it was built with.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Bot {
    rng: rand_chacha::ChaCha8Rng,
    thinking_ms: u64,
}

impl Bot {
    pub fn new(seed: u64) -> Self {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        // 1-3 seconds, drawn once so the bot "thinks" at a consistent pace.
        let thinking_ms = rng.gen_range(1000..3000);
        Self { rng, thinking_ms }
    }

    /// How long the bot pretends to think before a decision. Pure pacing;
    /// the decision itself is synchronous.
    pub fn thinking_time(&self) -> Duration {
        Duration::from_millis(self.thinking_ms)
    }

    /// Picks the bot's night selection for its role's turn. Roles whose
    /// action involves no choice never reach this.
    pub fn choose_night_action(&mut self, player: usize, game: &Game) -> NightSelection {
        let role = game.players()[player].original_role;
        match role.night_action() {
            NightAction::ViewCard => self.choose_seer_action(player, game),
            NightAction::SwapAndView => match self.random_other_player(player, game) {
                Some(target) => NightSelection::SwapPlayer { target },
                None => NightSelection::Decline,
            },
            NightAction::SwapOthers => match self.random_other_pair(player, game) {
                Some((first, second)) => NightSelection::SwapPlayers { first, second },
                None => NightSelection::Decline,
            },
            NightAction::SwapBlind => NightSelection::SwapCenter {
                slot: self.rng.gen_range(0..3),
            },
            _ => NightSelection::Decline,
        }
    }

    /// 60% of the time the bot peeks at a random other player, otherwise it
    /// takes the two lowest-index center cards.
    fn choose_seer_action(&mut self, player: usize, game: &Game) -> NightSelection {
        if self.rng.gen::<f64>() < 0.6 {
            if let Some(target) = self.random_other_player(player, game) {
                return NightSelection::ViewPlayer { target };
            }
        }
        NightSelection::ViewCenter { first: 0, second: 1 }
    }

    /// Picks who the bot votes to eliminate. Werewolf-team bots and the
    /// Minion prefer a player whose live card is not on the werewolf team;
    /// everyone else votes uniformly at random among the others.
    pub fn choose_vote(&mut self, player: usize, game: &Game) -> Option<usize> {
        let others: Vec<usize> = (0..game.num_players()).filter(|idx| *idx != player).collect();
        if others.is_empty() {
            return None;
        }

        // The minion counts itself on the werewolf team here.
        let current = game.players()[player].current_role;
        if current.team() == Team::Werewolf {
            let non_werewolves: Vec<usize> = others
                .iter()
                .copied()
                .filter(|idx| game.players()[*idx].current_role.team() != Team::Werewolf)
                .collect();
            if let Some(target) = non_werewolves.choose(&mut self.rng) {
                return Some(*target);
            }
        }
        others.choose(&mut self.rng).copied()
    }

    fn random_other_player(&mut self, player: usize, game: &Game) -> Option<usize> {
        let others: Vec<usize> = (0..game.num_players()).filter(|idx| *idx != player).collect();
        others.choose(&mut self.rng).copied()
    }

    fn random_other_pair(&mut self, player: usize, game: &Game) -> Option<(usize, usize)> {
        let mut others: Vec<usize> = (0..game.num_players()).filter(|idx| *idx != player).collect();
        if others.len() < 2 {
            return None;
        }
        others.shuffle(&mut self.rng);
        Some((others[0], others[1]))
    }
}

/// Picks a name for a new bot: an unused one from the pool, or a numbered
/// default once the pool is exhausted.
pub fn bot_name(existing: &[String], num_bots: usize, rng: &mut impl Rng) -> String {
    let available: Vec<&str> = BOT_NAMES
        .iter()
        .copied()
        .filter(|name| !existing.iter().any(|n| n == name))
        .collect();
    match available.choose(rng) {
        Some(name) => (*name).to_string(),
        None => format!("Bot{}", num_bots + 1),
    }
}

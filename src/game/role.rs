use crate::error::GameError;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A role card, either dealt to a player or placed face-down in the center.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Mason,
    Werewolf,
    Minion,
    Seer,
    Robber,
    Troublemaker,
    Drunk,
    Insomniac,
    DreamWolf,
    Villager,
    Tanner,
    Hunter,
}

/// The team a role belongs to, which decides its win condition.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Werewolf,
    Village,
    Neutral,
}

/// The kind of action a role performs during its night turn.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum NightAction {
    /// No night turn at all.
    None,
    /// Wakes to learn which other players were dealt a teammate role.
    ViewTeammates,
    /// Views one other player's dealt card, or two center cards.
    ViewCard,
    /// Swaps cards with another player, then views the new card.
    SwapAndView,
    /// Swaps the cards of two other players.
    SwapOthers,
    /// Swaps with a center card without viewing it.
    SwapBlind,
    /// Checks whether their own card was swapped during the night.
    CheckSelf,
}

impl Role {
    /// Every role in the catalog.
    pub const ALL: [Role; 12] = [
        Role::Mason,
        Role::Werewolf,
        Role::Minion,
        Role::Seer,
        Role::Robber,
        Role::Troublemaker,
        Role::Drunk,
        Role::Insomniac,
        Role::DreamWolf,
        Role::Villager,
        Role::Tanner,
        Role::Hunter,
    ];

    /// Looks up a role by its id string, e.g. `"dream-wolf"`.
    pub fn from_id(id: &str) -> Option<Role> {
        Role::ALL.iter().copied().find(|role| role.id() == id)
    }

    pub fn id(&self) -> &'static str {
        match self {
            Role::Mason => "mason",
            Role::Werewolf => "werewolf",
            Role::Minion => "minion",
            Role::Seer => "seer",
            Role::Robber => "robber",
            Role::Troublemaker => "troublemaker",
            Role::Drunk => "drunk",
            Role::Insomniac => "insomniac",
            Role::DreamWolf => "dream-wolf",
            Role::Villager => "villager",
            Role::Tanner => "tanner",
            Role::Hunter => "hunter",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Mason => "Mason",
            Role::Werewolf => "Werewolf",
            Role::Minion => "Minion",
            Role::Seer => "Seer",
            Role::Robber => "Robber",
            Role::Troublemaker => "Troublemaker",
            Role::Drunk => "Drunk",
            Role::Insomniac => "Insomniac",
            Role::DreamWolf => "Dream Wolf",
            Role::Villager => "Villager",
            Role::Tanner => "Tanner",
            Role::Hunter => "Hunter",
        }
    }

    pub fn team(&self) -> Team {
        match self {
            Role::Werewolf | Role::DreamWolf | Role::Minion => Team::Werewolf,
            Role::Tanner => Team::Neutral,
            _ => Team::Village,
        }
    }

    /// The position of this role's night turn, or `None` if it sleeps through.
    pub fn night_order(&self) -> Option<u8> {
        match self {
            Role::Mason => Some(0),
            Role::Werewolf => Some(1),
            Role::Minion => Some(2),
            Role::Seer => Some(3),
            Role::Robber => Some(4),
            Role::Troublemaker => Some(5),
            Role::Drunk => Some(6),
            Role::Insomniac => Some(7),
            _ => None,
        }
    }

    pub fn night_action(&self) -> NightAction {
        match self {
            Role::Mason | Role::Werewolf | Role::Minion => NightAction::ViewTeammates,
            Role::Seer => NightAction::ViewCard,
            Role::Robber => NightAction::SwapAndView,
            Role::Troublemaker => NightAction::SwapOthers,
            Role::Drunk => NightAction::SwapBlind,
            Role::Insomniac => NightAction::CheckSelf,
            _ => NightAction::None,
        }
    }

    /// The roles revealed to this role during a [NightAction::ViewTeammates] turn.
    pub fn teammate_roles(&self) -> &'static [Role] {
        match self {
            Role::Werewolf | Role::Minion => &[Role::Werewolf, Role::DreamWolf],
            Role::Mason => &[Role::Mason],
            _ => &[],
        }
    }

    pub fn has_night_action(&self) -> bool {
        self.night_action() != NightAction::None
    }

    pub fn can_swap(&self) -> bool {
        matches!(
            self.night_action(),
            NightAction::SwapAndView | NightAction::SwapOthers | NightAction::SwapBlind
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Mason => "You wake with the other Mason to see each other. If you are alone, the other Mason is in the center.",
            Role::Werewolf => "Your goal is to avoid being voted out. During the night, you wake with other werewolves to see who your teammates are.",
            Role::Minion => "You see who the werewolves are, but they do not see you. You win if the werewolf team wins, even if you are killed.",
            Role::Seer => "Look at one other player's card, or look at two cards from the center.",
            Role::Robber => "You may swap your card with another player's card, then look at your new card. Your team may change.",
            Role::Troublemaker => "You may swap cards between two other players. They do not know their cards were swapped.",
            Role::Drunk => "You must swap your card with a card from the center, but you do not look at your new card.",
            Role::Insomniac => "At the end of the night, you wake up and check whether your card was swapped.",
            Role::DreamWolf => "You are on the werewolf team, but you sleep through the night and do not know who the other werewolves are.",
            Role::Villager => "You have no special abilities, but your vote is crucial to finding the werewolves.",
            Role::Tanner => "You win only if you are voted out. You want to be eliminated.",
            Role::Hunter => "If you are voted out, the player you voted for is said to fall with you.",
        }
    }

    pub fn win_condition(&self) -> &'static str {
        match self.team() {
            Team::Werewolf => "No werewolves are killed in the vote",
            Team::Village => "At least one werewolf is killed",
            Team::Neutral => "You are killed in the vote",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// All roles with a night turn, in the order their turns occur.
pub fn roles_in_night_order() -> Vec<Role> {
    let mut roles: Vec<Role> = Role::ALL.iter().copied().filter(|r| r.night_order().is_some()).collect();
    roles.sort_by_key(|r| r.night_order());
    roles
}

pub fn roles_by_team(team: Team) -> Vec<Role> {
    Role::ALL.iter().copied().filter(|r| r.team() == team).collect()
}

/// The default role selection for a given player count, capped at the
/// largest configuration.
pub fn default_roles(num_players: usize) -> Vec<Role> {
    use Role::*;
    match num_players {
        0..=3 => vec![Werewolf, Werewolf, Seer, Robber, Troublemaker, Villager],
        4 => vec![Werewolf, Werewolf, Seer, Robber, Troublemaker, Drunk, Villager],
        5 => vec![Werewolf, Werewolf, Seer, Robber, Troublemaker, Drunk, Insomniac, Villager],
        6 => vec![Werewolf, Werewolf, Minion, Seer, Robber, Troublemaker, Drunk, Insomniac, Villager],
        7 => vec![
            Werewolf, Werewolf, Minion, Seer, Robber, Troublemaker, Drunk, Insomniac, Villager, Villager,
        ],
        _ => vec![
            Werewolf, Werewolf, Minion, Seer, Robber, Troublemaker, Drunk, Insomniac, Tanner, Villager, Villager,
        ],
    }
}

/// Generates the shuffled list of cards for a game: one per player plus the
/// three center cards.
///
/// The werewolf quota comes first (two werewolves from five players up, one
/// below that), then the selected roles in selection order up to capacity,
/// then villager padding. Selections beyond the capacity are dropped rather
/// than rejected.
pub fn generate_distribution(
    num_players: usize,
    selected: &[Role],
    rng: &mut impl Rng,
) -> Result<Vec<Role>, GameError> {
    if num_players < super::MIN_PLAYERS {
        return Err(GameError::TooFewPlayers);
    }
    if num_players > super::MAX_PLAYERS {
        return Err(GameError::TooManyPlayers);
    }

    let total_cards = num_players + 3;
    let werewolves = if num_players >= 5 { 2 } else { 1 };

    let mut cards = vec![Role::Werewolf; werewolves];
    for role in selected {
        if *role != Role::Werewolf && cards.len() < total_cards {
            cards.push(*role);
        }
    }
    while cards.len() < total_cards {
        cards.push(Role::Villager);
    }

    cards.shuffle(rng);
    Ok(cards)
}

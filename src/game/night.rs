use super::role::{NightAction, Role};
use super::Game;
use crate::error::GameError;
use serde::{Deserialize, Serialize};

/// A night-turn choice submitted by a player (or a bot) for the active role.
///
/// The variants are the complete set of selectable things, so a malformed
/// combination, like the Seer picking a player and a center card at once,
/// is unrepresentable rather than merely rejected.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NightSelection {
    /// Reveal one other player's dealt card.
    ViewPlayer { target: usize },
    /// Reveal two distinct center cards.
    ViewCenter { first: usize, second: usize },
    /// Exchange cards with one other player.
    SwapPlayer { target: usize },
    /// Exchange the cards of two other players.
    SwapPlayers { first: usize, second: usize },
    /// Exchange cards with a center slot, unseen.
    SwapCenter { slot: usize },
    /// Explicitly take no action.
    Decline,
}

/// The note recorded when a turn deadline passes with no selection. Same nil
/// effect as a decline, but the recap distinguishes the two.
pub fn timeout_note(action: NightAction) -> String {
    match action {
        NightAction::ViewCard => "Ran out of time and viewed nothing.".to_string(),
        NightAction::SwapAndView | NightAction::SwapOthers | NightAction::SwapBlind => {
            "Ran out of time and swapped nothing.".to_string()
        }
        _ => "No action taken.".to_string(),
    }
}

fn decline_note(action: NightAction) -> String {
    match action {
        NightAction::ViewCard => "Declined to view any cards.".to_string(),
        NightAction::SwapAndView => "Declined to swap with anyone.".to_string(),
        NightAction::SwapOthers => "Declined to swap anyone's cards.".to_string(),
        NightAction::SwapBlind => "Declined to swap with the center.".to_string(),
        _ => "No action taken.".to_string(),
    }
}

impl Game {
    /// The players who act on this role's turn. Judged by original role: a
    /// swap earlier in the night never changes whose turn it is.
    pub(super) fn night_holders(&self, role: Role) -> Vec<usize> {
        self.players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.original_role == role)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Applies the effects that happen the moment a role group wakes:
    /// teammate reveals and the Insomniac's self check. These involve no
    /// choice, so their notes are written up front.
    pub(super) fn apply_wake_effects(&mut self, role: Role) {
        for player in self.night_holders(role) {
            match role.night_action() {
                NightAction::ViewTeammates => {
                    let teammates: Vec<String> = self
                        .players
                        .iter()
                        .enumerate()
                        .filter(|(idx, p)| *idx != player && role.teammate_roles().contains(&p.original_role))
                        .map(|(_, p)| p.name.clone())
                        .collect();
                    let note = teammate_note(role, &teammates);
                    self.players[player].night_notes.push(note);
                }
                NightAction::CheckSelf => {
                    let p = &self.players[player];
                    let note = if p.was_swapped() {
                        format!("Your card was swapped. You are now the {}.", p.current_role)
                    } else {
                        format!("Your card was not swapped. You are still the {}.", p.current_role)
                    };
                    self.players[player].night_notes.push(note);
                }
                _ => {}
            }
        }
    }

    /// Validates and applies one player's selection for the active role.
    /// Nothing is mutated until the selection has fully validated, so a
    /// rejection leaves the player's turn open for a retry.
    pub(super) fn apply_night_selection(
        &mut self,
        player: usize,
        role: Role,
        selection: NightSelection,
    ) -> Result<(), GameError> {
        let action = role.night_action();
        match (action, selection) {
            (_, NightSelection::Decline) => {
                self.players[player].night_notes.push(decline_note(action));
                Ok(())
            }
            (NightAction::ViewCard, NightSelection::ViewPlayer { target }) => {
                self.check_other_player(player, target)?;
                // The Seer sees the card as it was dealt, not the live value.
                let seen = self.players[target].original_role;
                let name = self.players[target].name.clone();
                self.players[player]
                    .night_notes
                    .push(format!("Viewed {}: they were dealt the {}.", name, seen));
                Ok(())
            }
            (NightAction::ViewCard, NightSelection::ViewCenter { first, second }) => {
                self.check_center_slot(first)?;
                self.check_center_slot(second)?;
                if first == second {
                    return Err(GameError::InvalidCenterCard);
                }
                let note = format!(
                    "Viewed center card {}: {} and center card {}: {}.",
                    first + 1,
                    self.center[first].original_role,
                    second + 1,
                    self.center[second].original_role,
                );
                self.players[player].night_notes.push(note);
                Ok(())
            }
            (NightAction::SwapAndView, NightSelection::SwapPlayer { target }) => {
                self.check_other_player(player, target)?;
                self.swap_players(player, target);
                let name = self.players[target].name.clone();
                let new_role = self.players[player].current_role;
                self.players[player]
                    .night_notes
                    .push(format!("Swapped cards with {}. You are now the {}.", name, new_role));
                Ok(())
            }
            (NightAction::SwapOthers, NightSelection::SwapPlayers { first, second }) => {
                self.check_other_player(player, first)?;
                self.check_other_player(player, second)?;
                if first == second {
                    return Err(GameError::InvalidPlayerChoice);
                }
                self.swap_players(first, second);
                let note = format!(
                    "Swapped the cards of {} and {}.",
                    self.players[first].name, self.players[second].name
                );
                self.players[player].night_notes.push(note);
                Ok(())
            }
            (NightAction::SwapBlind, NightSelection::SwapCenter { slot }) => {
                self.check_center_slot(slot)?;
                self.swap_with_center(player, slot);
                self.players[player]
                    .night_notes
                    .push(format!("Swapped your card with center card {}.", slot + 1));
                Ok(())
            }
            _ => Err(GameError::InvalidAction),
        }
    }

    /// Exchanges the live cards of two players. Both sides are read before
    /// either is written, so no observer can see a half-applied swap.
    fn swap_players(&mut self, a: usize, b: usize) {
        let (role_a, role_b) = (self.players[a].current_role, self.players[b].current_role);
        self.players[a].current_role = role_b;
        self.players[b].current_role = role_a;
    }

    /// Exchanges a player's live card with a center slot, same atomicity as
    /// [Self::swap_players].
    fn swap_with_center(&mut self, player: usize, slot: usize) {
        let (role_p, role_c) = (self.players[player].current_role, self.center[slot].current_role);
        self.players[player].current_role = role_c;
        self.center[slot].current_role = role_p;
    }

    fn check_other_player(&self, player: usize, target: usize) -> Result<(), GameError> {
        if target >= self.players.len() {
            return Err(GameError::InvalidPlayerIndex);
        }
        if target == player {
            return Err(GameError::InvalidPlayerChoice);
        }
        Ok(())
    }

    fn check_center_slot(&self, slot: usize) -> Result<(), GameError> {
        if slot < self.center.len() {
            Ok(())
        } else {
            Err(GameError::InvalidCenterCard)
        }
    }
}

fn teammate_note(role: Role, teammates: &[String]) -> String {
    if teammates.is_empty() {
        return match role {
            Role::Werewolf => "You are the only werewolf.".to_string(),
            Role::Minion => "There are no werewolves among the players. Their cards are all in the center.".to_string(),
            Role::Mason => "You are the only mason. The other mason is in the center.".to_string(),
            _ => "You woke alone.".to_string(),
        };
    }
    let names = teammates.join(", ");
    match role {
        Role::Werewolf => format!("Other werewolves: {}.", names),
        Role::Minion => format!("The werewolves are: {}.", names),
        Role::Mason => format!("The other mason is: {}.", names),
        _ => format!("Teammates: {}.", names),
    }
}

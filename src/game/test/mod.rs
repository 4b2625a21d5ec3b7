#![cfg(test)]
#![allow(clippy::bool_assert_comparison)]

mod bot_policy;
mod voting;

use self::test_utils::*;
use super::player::LobbyPlayer;
use super::role::Role::*;
use super::{Game, GameOptions, Phase};

#[test]
fn can_create_game() {
    let roster: Vec<LobbyPlayer> = ["Alex", "Bob", "Charlie", "David", "Ed"]
        .iter()
        .map(|name| lobby_player(name))
        .collect();
    let game = Game::new(GameOptions::default(), &roster, 0).unwrap();
    assert_eq!(game.phase(), Phase::Setup);
    assert_eq!(game.num_players(), 5);
}

#[test]
fn too_few_players_is_rejected() {
    let roster: Vec<LobbyPlayer> = ["Alex", "Bob"].iter().map(|name| lobby_player(name)).collect();
    let result = Game::new(GameOptions::default(), &roster, 0);
    assert!(result.is_err());
}

#[test]
fn a_dealt_game_satisfies_the_session_invariants() {
    let roster: Vec<LobbyPlayer> = ["Alex", "Bob", "Charlie", "David", "Ed", "Fiona"]
        .iter()
        .map(|name| lobby_player(name))
        .collect();
    let game = Game::new(GameOptions::default(), &roster, 17).unwrap();

    // Every seat got a card, the center holds exactly three, and nothing
    // has been swapped yet.
    assert_eq!(game.num_players(), roster.len());
    assert_eq!(game.center_cards().len(), 3);
    for player in game.players() {
        assert_eq!(player.original_role, player.current_role);
        assert!(player.night_notes.is_empty());
        assert!(player.vote.is_none());
    }
    for card in game.center_cards() {
        assert_eq!(card.original_role, card.current_role);
    }
}

#[test]
fn every_player_confirming_their_card_starts_the_night() {
    let mut game = fixed_game(&[Werewolf, Seer, Villager], [Robber, Drunk, Tanner]);
    for player in 0..3 {
        game.confirm_card(player).unwrap();
    }
    assert_eq!(game.phase(), Phase::Night);
}

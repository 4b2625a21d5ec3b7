//! Vote tally, elimination and win-priority tests, including the full
//! day-to-results transition.

use super::super::role::Role::*;
use super::super::votes::Votes;
use super::super::{Phase, WinCondition};
use super::test_utils::*;
use crate::error::GameError;

#[test]
fn tally_eliminates_every_tied_leader() {
    let mut votes = Votes::new(5);
    votes.vote(1, 0); // A: 2
    votes.vote(2, 0);
    votes.vote(3, 1); // B: 2
    votes.vote(4, 1);
    votes.vote(0, 2); // C: 1
    assert_eq!(votes.tally(), vec![0, 1]);
}

#[test]
fn tally_with_no_votes_eliminates_nobody() {
    let votes = Votes::new(4);
    assert_eq!(votes.tally(), Vec::<usize>::new());
    assert!(!votes.all_cast());
}

#[test]
fn abstentions_do_not_contribute() {
    let mut votes = Votes::new(4);
    votes.vote(0, 2);
    assert_eq!(votes.count(), 1);
    assert_eq!(votes.tally(), vec![2]);
}

#[test]
fn discussion_ends_when_everyone_is_ready() {
    let mut game = night_game(&[Werewolf, Seer, Villager], [Drunk, Robber, Troublemaker]);
    run_out_night(&mut game);
    assert_eq!(game.phase(), Phase::Day);

    for player in 0..3 {
        game.confirm_ready(player).unwrap();
    }
    assert_eq!(game.phase(), Phase::Voting);
}

#[test]
fn discussion_also_ends_on_the_timer() {
    let mut game = night_game(&[Werewolf, Seer, Villager], [Drunk, Robber, Troublemaker]);
    run_out_night(&mut game);
    game.confirm_ready(0).unwrap();
    skip_discussion(&mut game);
    assert_eq!(game.phase(), Phase::Voting);
}

#[test]
fn voting_resolves_once_every_vote_is_in() {
    let mut game = night_game(&[Werewolf, Seer, Villager], [Drunk, Robber, Troublemaker]);
    run_out_night(&mut game);
    skip_discussion(&mut game);

    game.cast_vote(0, 1).unwrap();
    game.cast_vote(1, 0).unwrap();
    assert_eq!(game.phase(), Phase::Voting);
    game.cast_vote(2, 0).unwrap();

    assert_eq!(game.phase(), Phase::Results);
    assert_eq!(game.eliminated_players(), &[0]);
    assert_eq!(game.outcome(), Some(WinCondition::VillageWins));
    // The cast votes end up on the player records.
    assert_eq!(game.players[0].vote, Some(1));
    assert_eq!(game.players[1].vote, Some(0));
}

#[test]
fn self_votes_are_rejected() {
    let mut game = night_game(&[Werewolf, Seer, Villager], [Drunk, Robber, Troublemaker]);
    run_out_night(&mut game);
    skip_discussion(&mut game);

    let result = game.cast_vote(1, 1);
    assert!(matches!(result, Err(GameError::InvalidPlayerChoice)));
}

#[test]
fn votes_are_cast_once() {
    let mut game = night_game(&[Werewolf, Seer, Villager], [Drunk, Robber, Troublemaker]);
    run_out_night(&mut game);
    skip_discussion(&mut game);

    game.cast_vote(0, 1).unwrap();
    let again = game.cast_vote(0, 2);
    assert!(matches!(again, Err(GameError::InvalidAction)));
}

#[test]
fn a_vote_after_the_deadline_is_rejected() {
    let mut game = night_game(&[Werewolf, Seer, Villager], [Drunk, Robber, Troublemaker]);
    run_out_night(&mut game);
    skip_discussion(&mut game);

    game.cast_vote(0, 1).unwrap();
    game.expire_voting();
    assert_eq!(game.phase(), Phase::Results);

    let late = game.cast_vote(1, 0);
    assert!(matches!(late, Err(GameError::InvalidAction)));
}

#[test]
fn no_votes_at_all_hands_the_werewolves_the_win() {
    let mut game = night_game(&[Werewolf, Seer, Villager], [Drunk, Robber, Troublemaker]);
    run_out_night(&mut game);
    skip_discussion(&mut game);

    game.expire_voting();

    assert_eq!(game.eliminated_players(), &[] as &[usize]);
    assert_eq!(game.outcome(), Some(WinCondition::WerewolfWins));
}

#[test]
fn tied_eliminations_are_simultaneous() {
    let mut game = night_game(
        &[Werewolf, Seer, Villager, Robber],
        [Drunk, Troublemaker, Insomniac],
    );
    run_out_night(&mut game);
    skip_discussion(&mut game);

    game.cast_vote(0, 1).unwrap();
    game.cast_vote(1, 0).unwrap();
    game.cast_vote(2, 1).unwrap();
    game.cast_vote(3, 0).unwrap();

    assert_eq!(game.eliminated_players(), &[0, 1]);
    // The werewolf is in the eliminated set, so the village wins.
    assert_eq!(game.outcome(), Some(WinCondition::VillageWins));
}

#[test]
fn an_eliminated_tanner_overrides_an_eliminated_werewolf() {
    let mut game = night_game(
        &[Werewolf, Tanner, Seer, Villager],
        [Drunk, Robber, Troublemaker],
    );
    run_out_night(&mut game);
    skip_discussion(&mut game);

    // Two-way tie between the werewolf and the tanner.
    game.cast_vote(0, 1).unwrap();
    game.cast_vote(1, 0).unwrap();
    game.cast_vote(2, 0).unwrap();
    game.cast_vote(3, 1).unwrap();

    assert_eq!(game.eliminated_players(), &[0, 1]);
    assert_eq!(game.outcome(), Some(WinCondition::TannerWins));
}

#[test]
fn win_is_judged_on_current_roles_not_dealt_ones() {
    use super::super::night::NightSelection;

    // The robber steals the werewolf's card and is voted out holding it:
    // the eliminated player's live card is a werewolf, so the village wins.
    let mut game = night_game(&[Robber, Werewolf, Seer, Villager], [Drunk, Troublemaker, Insomniac]);
    game.expire_night_turn(); // werewolf
    game.expire_night_turn(); // seer
    game.submit_night_selection(0, NightSelection::SwapPlayer { target: 1 })
        .unwrap();
    run_out_night(&mut game);
    skip_discussion(&mut game);

    game.cast_vote(1, 0).unwrap();
    game.cast_vote(2, 0).unwrap();
    game.cast_vote(3, 0).unwrap();
    game.cast_vote(0, 1).unwrap();

    assert_eq!(game.eliminated_players(), &[0]);
    assert_eq!(game.outcome(), Some(WinCondition::VillageWins));
    // The dealt werewolf now holds the robber card, so they win with the
    // village they were dealt against.
    assert!(game.player_has_won(1));
    assert!(game.player_has_won(2));
}

#[test]
fn per_player_victory_follows_the_final_card_team() {
    let mut game = night_game(
        &[Werewolf, Minion, Tanner, Seer, Villager],
        [Drunk, Robber, Troublemaker],
    );
    run_out_night(&mut game);
    skip_discussion(&mut game);

    // The village eliminates the seer: werewolf team wins.
    game.cast_vote(0, 3).unwrap();
    game.cast_vote(1, 3).unwrap();
    game.cast_vote(2, 3).unwrap();
    game.cast_vote(3, 4).unwrap();
    game.cast_vote(4, 3).unwrap();

    assert_eq!(game.outcome(), Some(WinCondition::WerewolfWins));
    assert!(game.player_has_won(0));
    assert!(game.player_has_won(1), "the minion wins with the werewolves");
    assert!(!game.player_has_won(2), "the tanner only wins by dying");
    assert!(!game.player_has_won(3));
    assert!(!game.player_has_won(4));
}

#[test]
fn full_round_with_a_scripted_robber_swap() {
    use super::super::night::NightSelection;

    // The end-to-end scenario: five players, the documented deal, one
    // scripted robber swap, and a vote on the swapped-in werewolf.
    let mut game = fixed_game(
        &[Werewolf, Werewolf, Seer, Robber, Villager],
        [Troublemaker, Drunk, Insomniac],
    );
    for player in 0..5 {
        game.confirm_card(player).unwrap();
    }

    // Werewolves wake together and learn each other.
    assert_eq!(game.active_role(), Some(Werewolf));
    game.expire_night_turn();
    assert_eq!(game.players[0].night_notes, vec!["Other werewolves: BOB.".to_string()]);

    // The seer inspects the center.
    assert_eq!(game.active_role(), Some(Seer));
    game.submit_night_selection(2, NightSelection::ViewCenter { first: 0, second: 1 })
        .unwrap();
    assert_eq!(
        game.players[2].night_notes,
        vec!["Viewed center card 1: Troublemaker and center card 2: Drunk.".to_string()]
    );

    // The robber takes the first werewolf's card.
    assert_eq!(game.active_role(), Some(Robber));
    game.submit_night_selection(3, NightSelection::SwapPlayer { target: 0 })
        .unwrap();

    // Nobody holds the troublemaker, drunk or insomniac cards, so the night
    // is over.
    assert_eq!(game.phase(), Phase::Day);

    // Exactly the swapped pair changed, everything else is untouched.
    let current: Vec<_> = game.players().iter().map(|p| p.current_role).collect();
    assert_eq!(current, vec![Robber, Werewolf, Seer, Werewolf, Villager]);
    let center: Vec<_> = game.center_cards().iter().map(|c| c.current_role).collect();
    assert_eq!(center, vec![Troublemaker, Drunk, Insomniac]);

    skip_discussion(&mut game);
    game.cast_vote(0, 3).unwrap();
    game.cast_vote(1, 3).unwrap();
    game.cast_vote(2, 3).unwrap();
    game.cast_vote(4, 3).unwrap();
    game.cast_vote(3, 0).unwrap();

    assert_eq!(game.eliminated_players(), &[3]);
    assert_eq!(game.outcome(), Some(WinCondition::VillageWins));
}

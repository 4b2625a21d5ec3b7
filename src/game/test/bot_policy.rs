//! Synthetic-player policy tests: choice distributions, target legality and
//! determinism, all with seeded generators.

use super::super::bot::{self, Bot};
use super::super::night::NightSelection;
use super::super::role::Role::*;
use super::test_utils::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn seer_bot_splits_between_players_and_the_center() {
    let game = night_game(&[Seer, Werewolf, Villager, Robber], [Drunk, Troublemaker, Insomniac]);

    let mut players = 0;
    let mut center = 0;
    for seed in 0..1000 {
        let mut bot = Bot::new(seed);
        match bot.choose_night_action(0, &game) {
            NightSelection::ViewPlayer { target } => {
                assert_ne!(target, 0, "the seer bot never inspects itself");
                players += 1;
            }
            NightSelection::ViewCenter { first, second } => {
                // The documented policy: the two lowest-index center cards.
                assert_eq!((first, second), (0, 1));
                center += 1;
            }
            other => panic!("unexpected seer selection: {:?}", other),
        }
    }

    // Around 60% of picks go to players.
    assert!((500..700).contains(&players), "{} player picks", players);
    assert!((300..500).contains(&center), "{} center picks", center);
}

#[test]
fn robber_bot_always_swaps_with_another_player() {
    let game = night_game(&[Robber, Werewolf, Villager], [Drunk, Troublemaker, Seer]);
    for seed in 0..200 {
        let mut bot = Bot::new(seed);
        match bot.choose_night_action(0, &game) {
            NightSelection::SwapPlayer { target } => assert!(target == 1 || target == 2),
            other => panic!("the robber bot declined: {:?}", other),
        }
    }
}

#[test]
fn troublemaker_bot_swaps_two_distinct_others() {
    let game = night_game(
        &[Troublemaker, Werewolf, Villager, Seer],
        [Drunk, Robber, Insomniac],
    );
    for seed in 0..200 {
        let mut bot = Bot::new(seed);
        match bot.choose_night_action(0, &game) {
            NightSelection::SwapPlayers { first, second } => {
                assert_ne!(first, second);
                assert_ne!(first, 0);
                assert_ne!(second, 0);
            }
            other => panic!("the troublemaker bot declined: {:?}", other),
        }
    }
}

#[test]
fn drunk_bot_always_picks_a_real_center_slot() {
    let game = night_game(&[Drunk, Werewolf, Villager], [Seer, Robber, Troublemaker]);
    let mut seen = [false; 3];
    for seed in 0..200 {
        let mut bot = Bot::new(seed);
        match bot.choose_night_action(0, &game) {
            NightSelection::SwapCenter { slot } => {
                assert!(slot < 3);
                seen[slot] = true;
            }
            other => panic!("the drunk bot declined: {:?}", other),
        }
    }
    assert_eq!(seen, [true; 3], "every slot gets picked eventually");
}

#[test]
fn bot_selections_replay_identically_from_the_same_seed() {
    let game = night_game(&[Seer, Werewolf, Villager, Robber], [Drunk, Troublemaker, Insomniac]);
    for seed in 0..50 {
        let mut a = Bot::new(seed);
        let mut b = Bot::new(seed);
        assert_eq!(a.choose_night_action(0, &game), b.choose_night_action(0, &game));
        assert_eq!(a.choose_vote(0, &game), b.choose_vote(0, &game));
        assert_eq!(a.thinking_time(), b.thinking_time());
    }
}

#[test]
fn werewolf_bot_votes_spare_the_pack() {
    let mut game = night_game(
        &[Werewolf, Werewolf, DreamWolf, Minion, Seer, Villager],
        [Drunk, Robber, Troublemaker],
    );
    run_out_night(&mut game);

    for seed in 0..300 {
        let mut bot = Bot::new(seed);
        let target = bot.choose_vote(0, &game).unwrap();
        // Never a fellow werewolf, dream wolf, or the minion.
        assert!(target == 4 || target == 5, "werewolf bot voted {}", target);
    }
}

#[test]
fn minion_bot_votes_protect_the_werewolves() {
    let mut game = night_game(
        &[Minion, Werewolf, Seer, Villager],
        [Drunk, Robber, Troublemaker],
    );
    run_out_night(&mut game);

    for seed in 0..300 {
        let mut bot = Bot::new(seed);
        let target = bot.choose_vote(0, &game).unwrap();
        assert!(target == 2 || target == 3, "minion bot voted {}", target);
    }
}

#[test]
fn werewolf_bot_falls_back_when_only_wolves_remain() {
    let mut game = night_game(&[Werewolf, Werewolf, DreamWolf], [Seer, Robber, Villager]);
    run_out_night(&mut game);

    for seed in 0..100 {
        let mut bot = Bot::new(seed);
        let target = bot.choose_vote(0, &game).unwrap();
        assert!(target == 1 || target == 2);
    }
}

#[test]
fn the_vote_bias_follows_the_live_card() {
    // A robber-dealt bot that stole a werewolf card votes like a werewolf:
    // it spares the remaining wolf and targets the village.
    let mut game = night_game(
        &[Robber, Werewolf, Werewolf, Seer],
        [Drunk, Troublemaker, Insomniac],
    );
    game.expire_night_turn(); // werewolves
    game.expire_night_turn(); // seer
    game.submit_night_selection(0, NightSelection::SwapPlayer { target: 1 })
        .unwrap();
    run_out_night(&mut game);

    for seed in 0..300 {
        let mut bot = Bot::new(seed);
        // Player 0 now holds a werewolf card; player 2 still does too.
        let target = bot.choose_vote(0, &game).unwrap();
        assert!(target == 1 || target == 3, "voted {}", target);
    }
}

#[test]
fn village_bots_vote_among_all_others() {
    let mut game = night_game(&[Villager, Werewolf, Seer, Tanner], [Drunk, Robber, Troublemaker]);
    run_out_night(&mut game);

    let mut seen = [false; 4];
    for seed in 0..300 {
        let mut bot = Bot::new(seed);
        let target = bot.choose_vote(0, &game).unwrap();
        assert_ne!(target, 0, "no self-vote");
        seen[target] = true;
    }
    assert_eq!(seen, [false, true, true, true]);
}

#[test]
fn bot_names_come_from_the_pool_without_repeats() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut existing: Vec<String> = vec![];
    for _ in 0..bot::BOT_NAMES.len() {
        let name = bot::bot_name(&existing, existing.len(), &mut rng);
        assert!(bot::BOT_NAMES.contains(&name.as_str()));
        assert!(!existing.contains(&name));
        existing.push(name);
    }

    // Pool exhausted: numbered fallback.
    let fallback = bot::bot_name(&existing, existing.len(), &mut rng);
    assert_eq!(fallback, format!("Bot{}", existing.len() + 1));
}

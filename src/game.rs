pub use self::night::NightSelection;
pub use self::options::GameOptions;
use self::pending::PendingActions;
use self::player::{CenterCard, LobbyPlayer, Player};
use self::role::{NightAction, Role, Team};
use self::update::{GameEvent, TurnStage};
use self::votes::Votes;
use crate::error::GameError;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

pub mod bot;
pub mod night;
mod options;
mod pending;
pub mod player;
pub mod role;
mod test;
pub mod update;
mod votes;

pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 10;

/// A single round of One Night Werewolf, from the deal to the vote.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Game {
    opts: GameOptions,
    players: Vec<Player>,
    center: [CenterCard; 3],
    state: GameState,
    eliminated: Vec<usize>,
    events: Vec<GameEvent>,
    phase_gen: u64,
    rng: rand_chacha::ChaCha8Rng,
}

/// Represents the current phase in the game loop.
#[derive(Clone, Serialize, Deserialize, Debug)]
enum GameState {
    /// Players are memorising their dealt card.
    Setup { ready: PendingActions },
    /// One role group is acting; `pending` holds the players whose selection
    /// is still outstanding.
    Night { role: Role, pending: PendingActions },
    /// Open discussion before the vote.
    Day { ready: PendingActions },
    /// Players are voting on who to eliminate.
    Voting { votes: Votes },
    GameOver(WinCondition),
}

/// The public phase marker exposed to clients.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    Night,
    Day,
    Voting,
    Results,
}

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub enum WinCondition {
    /// An eliminated player's final card was the Tanner.
    TannerWins,
    /// The eliminated set contained a werewolf-team card.
    VillageWins,
    /// No werewolf was eliminated, or nobody was.
    WerewolfWins,
}

impl ToString for WinCondition {
    fn to_string(&self) -> String {
        match self {
            WinCondition::TannerWins => "TannerWins",
            WinCondition::VillageWins => "VillageWins",
            WinCondition::WerewolfWins => "WerewolfWins",
        }
        .to_string()
    }
}

impl Game {
    /// Deals a new round to the given roster.
    pub fn new(opts: GameOptions, roster: &[LobbyPlayer], seed: u64) -> Result<Self, GameError> {
        let num_players = roster.len();
        opts.validate(num_players)?;

        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        let cards = role::generate_distribution(num_players, &opts.selected_roles, &mut rng)?;

        // First `num_players` cards go to the players in roster order, the
        // remaining three become the center cards.
        let players = roster
            .iter()
            .zip(&cards)
            .map(|(lobby, role)| Player::new(lobby, *role))
            .collect::<Vec<_>>();
        let center: [CenterCard; 3] = [
            CenterCard::new(cards[num_players]),
            CenterCard::new(cards[num_players + 1]),
            CenterCard::new(cards[num_players + 2]),
        ];

        let mut game = Game {
            opts,
            players,
            center,
            state: GameState::Setup {
                ready: PendingActions::for_players(0..num_players),
            },
            eliminated: vec![],
            events: vec![],
            phase_gen: 0,
            rng,
        };
        game.events.push(GameEvent::Phase { phase: Phase::Setup });
        Ok(game)
    }

    /// Gets the player names.
    pub fn player_names(&self) -> impl Iterator<Item = &'_ str> {
        self.players.iter().map(|p| &p.name[..])
    }

    /// Finds a player with the given name.
    pub fn find_player(&self, name: &str) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|p| p.name == name)
            .ok_or(GameError::PlayerNotFound)
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn center_cards(&self) -> &[CenterCard; 3] {
        &self.center
    }

    pub fn options(&self) -> &GameOptions {
        &self.opts
    }

    pub fn phase(&self) -> Phase {
        match &self.state {
            GameState::Setup { .. } => Phase::Setup,
            GameState::Night { .. } => Phase::Night,
            GameState::Day { .. } => Phase::Day,
            GameState::Voting { .. } => Phase::Voting,
            GameState::GameOver(_) => Phase::Results,
        }
    }

    /// Monotonic counter bumped on every phase or turn change. Deadline
    /// timers capture it so a stale timer firing after the game has moved on
    /// becomes a no-op.
    pub fn phase_gen(&self) -> u64 {
        self.phase_gen
    }

    /// The role whose night turn is in progress.
    pub fn active_role(&self) -> Option<Role> {
        match &self.state {
            GameState::Night { role, .. } => Some(*role),
            _ => None,
        }
    }

    /// The players whose action or acknowledgement the current phase is
    /// still waiting on.
    pub fn waiting_on(&self) -> Vec<usize> {
        match &self.state {
            GameState::Setup { ready } | GameState::Day { ready } => ready.waiting_players(),
            GameState::Night { pending, .. } => pending.waiting_players(),
            GameState::Voting { votes } => (0..self.players.len()).filter(|idx| !votes.has_cast(*idx)).collect(),
            GameState::GameOver(_) => vec![],
        }
    }

    /// Called when a player has memorised their card and is ready for night.
    pub fn confirm_card(&mut self, player: usize) -> Result<(), GameError> {
        self.check_player_index(player)?;
        let GameState::Setup { ready } = &mut self.state else {
            return Err(GameError::InvalidAction);
        };
        if ready.resolve(player) {
            self.start_night();
        }
        Ok(())
    }

    /// Ends the card-reveal phase regardless of outstanding acknowledgements.
    pub fn expire_setup(&mut self) {
        if let GameState::Setup { .. } = &self.state {
            self.start_night();
        }
    }

    /// Called when a player submits their night action.
    pub fn submit_night_selection(&mut self, player: usize, selection: NightSelection) -> Result<(), GameError> {
        self.check_player_index(player)?;
        let GameState::Night { role, pending } = &self.state else {
            return Err(GameError::InvalidAction);
        };
        let (role, pending) = (*role, *pending);
        if !pending.is_waiting(player) {
            return Err(GameError::InvalidAction);
        }

        // Validation happens before any mutation, so a rejected selection
        // leaves the turn open for a retry.
        self.apply_night_selection(player, role, selection)?;

        let GameState::Night { pending, .. } = &mut self.state else {
            unreachable!();
        };
        if pending.resolve(player) {
            self.end_night_turn(role);
        }
        Ok(())
    }

    /// Resolves the current night turn's deadline: every outstanding player
    /// takes no action, and the night advances.
    pub fn expire_night_turn(&mut self) {
        let GameState::Night { role, pending } = &self.state else {
            return;
        };
        let (role, pending) = (*role, *pending);
        for player in pending.waiting_players() {
            let note = night::timeout_note(role.night_action());
            self.players[player].night_notes.push(note);
        }
        self.end_night_turn(role);
    }

    /// Called when a player is ready to end the discussion.
    pub fn confirm_ready(&mut self, player: usize) -> Result<(), GameError> {
        self.check_player_index(player)?;
        let GameState::Day { ready } = &mut self.state else {
            return Err(GameError::InvalidAction);
        };
        if ready.resolve(player) {
            self.start_voting();
        }
        Ok(())
    }

    /// Ends the discussion when its time budget runs out.
    pub fn expire_discussion(&mut self) {
        if let GameState::Day { .. } = &self.state {
            self.start_voting();
        }
    }

    /// Called when a player votes to eliminate another player.
    pub fn cast_vote(&mut self, player: usize, target: usize) -> Result<(), GameError> {
        self.check_player_index(player)?;
        self.check_player_index(target)?;
        if target == player {
            return Err(GameError::InvalidPlayerChoice);
        }
        let GameState::Voting { votes } = &mut self.state else {
            return Err(GameError::InvalidAction);
        };
        if votes.has_cast(player) {
            return Err(GameError::InvalidAction);
        }
        votes.vote(player, target);
        if votes.all_cast() {
            self.finish_voting();
        }
        Ok(())
    }

    /// Resolves the vote deadline with whatever votes were cast.
    pub fn expire_voting(&mut self) {
        if let GameState::Voting { .. } = &self.state {
            self.finish_voting();
        }
    }

    /// Returns true if the game is over.
    pub fn game_over(&self) -> bool {
        matches!(self.state, GameState::GameOver(_))
    }

    pub fn outcome(&self) -> Option<WinCondition> {
        match &self.state {
            GameState::GameOver(outcome) => Some(*outcome),
            _ => None,
        }
    }

    /// The players eliminated by the vote.
    pub fn eliminated_players(&self) -> &[usize] {
        &self.eliminated
    }

    /// Returns whether a particular player has won, judged by their final card.
    pub fn player_has_won(&self, player: usize) -> bool {
        let GameState::GameOver(outcome) = self.state else {
            return false;
        };
        let role = self.players[player].current_role;
        match outcome {
            WinCondition::TannerWins => role == Role::Tanner,
            WinCondition::VillageWins => role.team() == Team::Village,
            WinCondition::WerewolfWins => role.team() == Team::Werewolf,
        }
    }

    /// Drains the narration events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn start_night(&mut self) {
        self.phase_gen += 1;
        self.events.push(GameEvent::Phase { phase: Phase::Night });
        match self.next_turn_role(None) {
            Some(role) => self.begin_night_turn(role),
            None => self.start_day(),
        }
    }

    fn begin_night_turn(&mut self, role: Role) {
        self.phase_gen += 1;
        self.events.push(GameEvent::RoleTurn { role, stage: TurnStage::Wake });
        self.events.push(GameEvent::RoleTurn { role, stage: TurnStage::Task });

        // Roles without a decision learn everything the moment they wake;
        // the turn then only waits out its pacing deadline.
        self.apply_wake_effects(role);
        let pending = match role.night_action() {
            NightAction::ViewCard | NightAction::SwapAndView | NightAction::SwapOthers | NightAction::SwapBlind => {
                PendingActions::for_players(self.night_holders(role).into_iter())
            }
            _ => PendingActions::none(),
        };
        self.state = GameState::Night { role, pending };
    }

    fn end_night_turn(&mut self, role: Role) {
        self.events.push(GameEvent::RoleTurn {
            role,
            stage: TurnStage::Sleep,
        });
        match self.next_turn_role(role.night_order()) {
            Some(next) => self.begin_night_turn(next),
            None => self.start_day(),
        }
    }

    /// Finds the next role, in night order, that at least one player was
    /// dealt. Turn membership is judged by original role only: a player's
    /// turn is fixed by the deal, even if their card was swapped away.
    fn next_turn_role(&self, after: Option<u8>) -> Option<Role> {
        role::roles_in_night_order()
            .into_iter()
            .filter(|role| match after {
                Some(order) => role.night_order() > Some(order),
                None => true,
            })
            .find(|role| !self.night_holders(*role).is_empty())
    }

    fn start_day(&mut self) {
        self.phase_gen += 1;
        self.state = GameState::Day {
            ready: PendingActions::for_players(0..self.players.len()),
        };
        self.events.push(GameEvent::Phase { phase: Phase::Day });
    }

    fn start_voting(&mut self) {
        self.phase_gen += 1;
        self.state = GameState::Voting {
            votes: Votes::new(self.players.len()),
        };
        self.events.push(GameEvent::Phase { phase: Phase::Voting });
    }

    fn finish_voting(&mut self) {
        let GameState::Voting { votes } = &self.state else {
            return;
        };
        for (idx, vote) in votes.votes().iter().enumerate() {
            self.players[idx].vote = *vote;
        }
        self.eliminated = votes.tally();
        let outcome = self.determine_outcome();

        self.phase_gen += 1;
        self.state = GameState::GameOver(outcome);
        self.events.push(GameEvent::Phase { phase: Phase::Results });
    }

    /// Decides the winning team from the eliminated players' final cards.
    /// The checks are a strict priority order: an eliminated Tanner trumps
    /// everything, then any eliminated werewolf-team card hands the village
    /// the win, and otherwise the werewolves take it, including when nobody
    /// was eliminated at all.
    fn determine_outcome(&self) -> WinCondition {
        let eliminated_roles = self.eliminated.iter().map(|idx| self.players[*idx].current_role);
        if eliminated_roles.clone().any(|role| role == Role::Tanner) {
            WinCondition::TannerWins
        } else if eliminated_roles.clone().any(|role| role.team() == Team::Werewolf) {
            WinCondition::VillageWins
        } else {
            WinCondition::WerewolfWins
        }
    }

    /// Returns `Ok` if the given player index is valid, and an `Err` otherwise.
    fn check_player_index(&self, player: usize) -> Result<(), GameError> {
        if player < self.num_players() {
            Ok(())
        } else {
            Err(GameError::InvalidPlayerIndex)
        }
    }
}

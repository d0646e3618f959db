mod globals;
pub use globals::*;

pub mod cards;
pub mod trace;

use crate::config::{ConfigError, GameConfig};
use cards::CardEffect;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::fmt;
use trace::{Ledger, StepTrace};

#[derive(Clone, Debug, PartialEq, Eq)]
/// A full snapshot of the game, as seen by whoever is about to move.
pub struct Observation {
    pub positions: Vec<usize>,
    pub cash: Vec<i64>,
    pub in_jail: Vec<bool>,
    /// The owner of every square, with -1 for the bank.
    pub owners: [i32; BOARD_SIZE],
    pub houses: [u8; BOARD_SIZE],
    pub current_player: usize,
}

/// Bookkeeping for the step in progress.
struct Turn {
    player: usize,
    action: Action,
    position_before: usize,
    money_before: i64,
    reward: f64,
    fee_paid: i64,
    ledger: Ledger,
    card_drawn: String,
    card_description: String,
    summary: String,
}

impl Turn {
    fn note(&mut self, text: impl AsRef<str>) {
        self.summary.push_str(text.as_ref());
        self.summary.push(' ');
    }
}

#[derive(Clone)]
/// A simulation of Monopoly, stepped one turn at a time.
pub struct Env {
    pub config: GameConfig,
    /// The players playing the game, indexed by seat.
    pub players: Vec<Player>,
    /// Ownership of every square, indexed by position.
    pub holdings: [Holding; BOARD_SIZE],
    /// The index of the player whose turn it currently is.
    pub current: usize,
    /// The number of steps taken this episode.
    pub steps: usize,
    /// Whether a player has gone irrecoverably bankrupt.
    pub terminal: bool,
    /// Stamped onto every trace.
    pub episode: usize,
    rng: SmallRng,
    last_summary: String,
}

impl Env {
    /*********        PUBLIC INTERFACES        *********/

    /// Return a new game, with its own random stream seeded by `seed`.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            players: Player::multiple_new(config.players, config.start_money),
            config,
            holdings: [Holding::default(); BOARD_SIZE],
            current: 0,
            steps: 0,
            terminal: false,
            episode: 0,
            rng: SmallRng::seed_from_u64(seed),
            last_summary: String::new(),
        })
    }

    /// Replace the game's random stream.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Put every player back on 'Go' with the starting cash and return all squares to the bank.
    pub fn reset(&mut self) -> Observation {
        for holding in self.holdings.iter_mut() {
            holding.forfeit();
        }
        self.players = Player::multiple_new(self.config.players, self.config.start_money);
        self.current = 0;
        self.steps = 0;
        self.terminal = false;
        self.last_summary.clear();
        self.observe()
    }

    /// Play one turn for the current player, rolling the dice from the game's own stream.
    pub fn step(&mut self, action: Action) -> StepTrace {
        let escape = if !self.terminal && self.players[self.current].in_jail {
            Some(Roll::random(&mut self.rng))
        } else {
            None
        };
        let roll = Roll::random(&mut self.rng);
        self.transition(action, escape, roll)
    }

    /// Play one turn with the given dice. `escape` is the attempt to roll doubles
    /// out of jail and only matters if the current player is jailed; `roll` moves
    /// the player. Cards still draw from the game's own stream.
    pub fn transition(&mut self, action: Action, escape: Option<Roll>, roll: Roll) -> StepTrace {
        if self.terminal {
            return self.ended(action);
        }

        let p = self.current;
        let mut turn = Turn {
            player: p,
            action,
            position_before: self.players[p].position,
            money_before: self.players[p].cash,
            reward: 0.,
            fee_paid: 0,
            ledger: Ledger::default(),
            card_drawn: String::new(),
            card_description: String::new(),
            summary: String::new(),
        };

        // Try to get out of jail first
        let mut released = false;
        if self.players[p].in_jail {
            let escape = escape.unwrap_or(roll);
            self.players[p].jail_turns += 1;

            if escape.is_double() {
                self.release(p);
                released = true;
                turn.note(format!(
                    "Player {} rolled doubles ({}) to get out of jail.",
                    p, escape.0
                ));
            } else if self.players[p].jail_turns >= JAIL_TURNS {
                self.release(p);
                released = true;
                self.charge_fee(&mut turn, JAIL_FEE);
                turn.note(format!(
                    "Player {} paid ${} to get out of jail (turn limit).",
                    p, JAIL_FEE
                ));
            } else {
                // The turn is spent in jail
                turn.note(format!(
                    "Player {} failed to roll doubles in jail (Turn {}).",
                    p,
                    self.players[p].jail_turns
                ));
                self.settle(&mut turn);
                let position = self.players[p].position;
                return self.finish(turn, 0, position);
            }
        }

        // Move the player
        let landed = (turn.position_before + roll.sum()) % BOARD_SIZE;
        if landed < turn.position_before && !released {
            let go_reward = self.config.go_reward;
            self.players[p].cash += go_reward;
            turn.ledger.passed_go += go_reward;
            turn.reward += go_reward as f64;
            turn.note(format!("Passed GO, collected ${}.", go_reward));
        }
        self.players[p].position = landed;

        // Draw a card if the player landed on a card square
        let deck: Option<(&str, &[Card])> = match BOARD[landed].kind {
            SquareKind::Chance => Some(("Chance", &CHANCE_DECK[..])),
            SquareKind::Chest => Some(("Community Chest", &CHEST_DECK[..])),
            _ => None,
        };
        let mut jailed_by_card = false;
        if let Some((deck_name, deck)) = deck {
            let card = cards::draw(deck, &mut self.rng);
            turn.note(format!(
                "Landed on {} ({}), drew '{}'.",
                deck_name, landed, card.name
            ));
            let effect: CardEffect = card.kind.apply(self, p);
            turn.reward += effect.reward;
            turn.ledger.card += effect.cash;
            turn.note(&effect.description);
            turn.card_drawn = card.name.to_owned();
            turn.card_description = effect.description;
            jailed_by_card = effect.jailed;
        }

        // Resolve the square the player ended up on
        let position = self.players[p].position;
        let square = &BOARD[position];
        match square.kind {
            SquareKind::GoToJail if !jailed_by_card => {
                turn.note(format!("Landed on Go To Jail ({}).", position));
                self.send_to_jail(p);
                turn.note(format!("Moved to Jail (Position {}).", JAIL_POSITION));
            }
            SquareKind::Tax(fee) => {
                self.charge_fee(&mut turn, fee);
                turn.note(format!(
                    "Paid fee of ${} on square {} ({}).",
                    fee, position, square.name
                ));
            }
            SquareKind::Property => self.resolve_property(&mut turn, position),
            SquareKind::FreeParking => {
                turn.note(format!(
                    "Landed on non-action square {} ({}).",
                    position, square.name
                ));
            }
            _ => (),
        }

        self.settle(&mut turn);
        self.finish(turn, roll.sum(), landed)
    }

    /// Return a snapshot of the game.
    pub fn observe(&self) -> Observation {
        let mut owners = [-1; BOARD_SIZE];
        let mut houses = [0; BOARD_SIZE];
        for (i, holding) in self.holdings.iter().enumerate() {
            owners[i] = holding.owner_index();
            houses[i] = holding.houses;
        }

        Observation {
            positions: self.players.iter().map(|p| p.position).collect(),
            cash: self.players.iter().map(|p| p.cash).collect(),
            in_jail: self.players.iter().map(|p| p.in_jail).collect(),
            owners,
            houses,
            current_player: self.current,
        }
    }

    /*********        ALIASES (FOR CONVENIENCE)        *********/

    /// The player whose turn it currently is.
    pub fn current_player(&self) -> &Player {
        &self.players[self.current]
    }

    /// The number of squares owned by `player`.
    pub fn owned_by(&self, player: usize) -> usize {
        self.holdings
            .iter()
            .filter(|h| h.owner == Some(player))
            .count()
    }

    /// Whether the current player is on a square they could buy or build on right now.
    /// Anywhere else, buying is meaningless and the only sensible action is to pass.
    pub fn decidable(&self) -> bool {
        let player = self.current_player();
        if player.in_jail {
            return false;
        }

        let square = &BOARD[player.position];
        if !square.is_property() {
            return false;
        }

        let holding = &self.holdings[player.position];
        match holding.owner {
            None => player.cash >= square.price,
            Some(owner) => {
                owner == self.current
                    && square.house_cost > 0
                    && holding.houses < MAX_HOUSES
                    && player.cash >= square.house_cost
            }
        }
    }

    /*********        HELPER FUNCTIONS        *********/

    /// Send a player to jail.
    pub fn send_to_jail(&mut self, player: usize) {
        self.players[player].position = JAIL_POSITION;
        self.players[player].in_jail = true;
        self.players[player].jail_turns = 0;
    }

    fn release(&mut self, player: usize) {
        self.players[player].in_jail = false;
        self.players[player].jail_turns = 0;
    }

    /// Charge the current player a fee payable to the bank.
    fn charge_fee(&mut self, turn: &mut Turn, fee: i64) {
        self.players[turn.player].cash -= fee;
        turn.ledger.fees += fee;
        turn.fee_paid += fee;
        turn.reward -= fee as f64;
    }

    /// Buy, build, or pay rent on the property at `position`.
    fn resolve_property(&mut self, turn: &mut Turn, position: usize) {
        let p = turn.player;
        let square = &BOARD[position];
        let holding = self.holdings[position];

        match holding.owner {
            // Nobody owns it yet
            None => {
                if self.players[p].cash < square.price {
                    turn.note(format!(
                        "Player {} cannot afford property {} ({}) (${}).",
                        p, position, square.name, square.price
                    ));
                } else if turn.action == Action::Buy {
                    self.players[p].cash -= square.price;
                    self.holdings[position] = Holding {
                        owner: Some(p),
                        houses: 0,
                    };
                    turn.ledger.purchase += square.price;
                    turn.reward += BUY_BONUS;
                    turn.note(format!(
                        "Player {} chose to BUY property {} ({}) for ${}.",
                        p, position, square.name, square.price
                    ));
                } else {
                    turn.note(format!(
                        "Player {} chose NOT to buy property {} ({}) for ${}.",
                        p, position, square.name, square.price
                    ));
                }
            }
            // Somebody else owns it
            Some(owner) if owner != p => {
                let rent = square.rent * RENT_MULTIPLIERS[holding.houses as usize];
                // Pay what you can
                let payment = rent.min(self.players[p].cash.max(0));
                self.players[p].cash -= payment;
                self.players[owner].cash += payment;
                turn.ledger.rent += payment;
                turn.fee_paid += payment;
                turn.reward -= payment as f64;
                turn.note(format!(
                    "Paid ${} rent to Player {} at property {} ({}) with {} houses.",
                    payment, owner, position, square.name, holding.houses
                ));
            }
            // The player owns it
            Some(_) => {
                let affordable =
                    square.house_cost > 0 && self.players[p].cash >= square.house_cost;
                if turn.action == Action::Buy
                    && affordable
                    && self.holdings[position].build()
                {
                    self.players[p].cash -= square.house_cost;
                    turn.ledger.houses += square.house_cost;
                    turn.note(format!(
                        "Landed on own property {} ({}). Bought 1 house for ${}. Now has {} houses.",
                        position,
                        square.name,
                        square.house_cost,
                        self.holdings[position].houses
                    ));
                } else {
                    turn.note(format!(
                        "Landed on own property {} ({}). No house bought (current: {}).",
                        position, square.name, holding.houses
                    ));
                }
            }
        }
    }

    /// Liquidate the current player's assets if they owe more than they have.
    /// Houses go first, then whole squares, both in board order and both at half
    /// price. If that isn't enough, the player is bankrupt and the episode ends.
    fn settle(&mut self, turn: &mut Turn) {
        let p = turn.player;
        if self.players[p].cash >= 0 {
            return;
        }

        turn.note(format!(
            "Player {} is bankrupt (${}). Attempting to sell assets.",
            p, self.players[p].cash
        ));

        // Phase 1: sell houses
        for position in 0..BOARD_SIZE {
            if self.players[p].cash >= 0 {
                break;
            }
            let holding = &mut self.holdings[position];
            let house_cost = BOARD[position].house_cost;
            if holding.owner != Some(p) || holding.houses == 0 || house_cost <= 0 {
                continue;
            }

            let proceeds = holding.houses as i64 * (house_cost / 2);
            let sold = holding.houses;
            holding.houses = 0;
            self.players[p].cash += proceeds;
            turn.ledger.liquidation += proceeds;
            turn.note(format!(
                "Sold {} houses/hotel on {} ({}) for ${}.",
                sold, BOARD[position].name, position, proceeds
            ));
        }

        // Phase 2: sell squares without houses back to the bank
        for position in 0..BOARD_SIZE {
            if self.players[p].cash >= 0 {
                break;
            }
            let holding = &mut self.holdings[position];
            let price = BOARD[position].price;
            if holding.owner != Some(p) || holding.houses > 0 || price <= 0 {
                continue;
            }

            holding.forfeit();
            self.players[p].cash += price / 2;
            turn.ledger.liquidation += price / 2;
            turn.note(format!(
                "Sold property {} ({}) for ${}.",
                BOARD[position].name,
                position,
                price / 2
            ));
        }

        if self.players[p].cash >= 0 {
            turn.note(format!(
                "Player {} survived bankruptcy. Current balance: ${}.",
                p, self.players[p].cash
            ));
            return;
        }

        self.terminal = true;
        turn.reward -= BANKRUPTCY_PENALTY;
        for holding in self.holdings.iter_mut() {
            if holding.owner == Some(p) {
                holding.forfeit();
            }
        }
        turn.note(format!(
            "Player {} could not raise enough funds. Final balance: ${}. Game Over!",
            p, self.players[p].cash
        ));
    }

    /// Close off the step: build its trace and pass the turn on.
    fn finish(&mut self, turn: Turn, dice_roll: usize, landed: usize) -> StepTrace {
        let p = turn.player;
        let summary = turn.summary.trim_end().to_owned();
        log::trace!("step {} player {}: {}", self.steps, p, summary);

        let trace = StepTrace {
            episode_id: self.episode,
            step: self.steps,
            player: p,
            position_before: turn.position_before,
            dice_roll,
            landed_on_position: landed,
            position_after: self.players[p].position,
            money_before: turn.money_before,
            money_after: self.players[p].cash,
            reward: turn.reward,
            terminal: self.terminal,
            in_jail: self.players[p].in_jail,
            fee_paid: turn.fee_paid,
            action: turn.action,
            properties_owned: self.owned_by(p),
            card_drawn: turn.card_drawn,
            card_description: turn.card_description,
            summary: summary.clone(),
            ledger: turn.ledger,
        };

        self.steps += 1;
        self.last_summary = summary;
        if !self.terminal {
            self.current = (self.current + 1) % self.players.len();
        }
        trace
    }

    /// The trace for stepping a game that's already over.
    fn ended(&self, action: Action) -> StepTrace {
        let p = self.current;
        let player = &self.players[p];
        StepTrace {
            episode_id: self.episode,
            step: self.steps,
            player: p,
            position_before: player.position,
            landed_on_position: player.position,
            position_after: player.position,
            money_before: player.cash,
            money_after: player.cash,
            terminal: true,
            in_jail: player.in_jail,
            action,
            properties_owned: self.owned_by(p),
            summary: "Game already ended.".to_owned(),
            ..StepTrace::default()
        }
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.terminal { " (Game Over)" } else { "" };
        writeln!(
            f,
            "Step: {}, Current Player: \x1b[36m{}\x1b[0m{}",
            self.steps, self.current, status
        )?;

        for (i, player) in self.players.iter().enumerate() {
            writeln!(f, "  Player {}: {}", i, player)?;
        }

        writeln!(f, "  Board Owners (-1 = Bank/None):")?;
        for side in self.holdings.chunks(10) {
            let row: Vec<String> = side
                .iter()
                .map(|h| format!("{:2}", h.owner_index()))
                .collect();
            writeln!(f, "  [ {} ]", row.join(" "))?;
        }

        if !self.last_summary.is_empty() {
            writeln!(f, "Last Action Log: {}", self.last_summary)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Env {
        Env::new(GameConfig::default(), 42).unwrap()
    }

    /// Every square is owned by the bank or a seated player, and houses imply an owner.
    fn assert_partition(env: &Env) {
        for holding in &env.holdings {
            match holding.owner {
                Some(owner) => assert!(owner < env.players.len()),
                None => assert_eq!(holding.houses, 0),
            }
            assert!(holding.houses <= MAX_HOUSES);
        }
    }

    #[test]
    fn invalid_config_builds_nothing() {
        let config = GameConfig {
            players: 9,
            ..GameConfig::default()
        };
        assert!(matches!(
            Env::new(config, 0),
            Err(ConfigError::Players(9))
        ));
    }

    #[test]
    fn reset_restores_the_opening_position() {
        let mut env = env();
        env.holdings[1] = Holding {
            owner: Some(1),
            houses: 3,
        };
        env.players[0].cash = 12;
        env.current = 1;
        let obs = env.reset();
        assert_eq!(obs.cash, vec![1500, 1500]);
        assert_eq!(obs.positions, vec![0, 0]);
        assert!(obs.owners.iter().all(|&o| o == -1));
        assert!(obs.houses.iter().all(|&h| h == 0));
        assert_eq!(obs.current_player, 0);
    }

    #[test]
    fn buying_an_unowned_property() {
        let mut env = env();
        // From Park Place, a 4 lands on Mediterranean Avenue after passing 'Go'
        env.players[0].position = 37;
        let trace = env.transition(Action::Buy, None, Roll(1, 3));

        assert_eq!(trace.landed_on_position, 1);
        assert_eq!(env.players[0].cash, 1500 - 60 + 200);
        assert_eq!(trace.reward, 100. + 200.);
        assert_eq!(env.holdings[1].owner, Some(0));
        assert_eq!(env.holdings[1].houses, 0);
        assert_eq!(trace.properties_owned, 1);
        assert_eq!(env.current, 1);
    }

    #[test]
    fn passing_leaves_the_property_with_the_bank() {
        let mut env = env();
        let trace = env.transition(Action::Pass, None, Roll(2, 4));
        assert_eq!(trace.landed_on_position, 6);
        assert_eq!(env.holdings[6].owner, None);
        assert_eq!(trace.reward, 0.);
        assert_eq!(env.players[0].cash, 1500);
    }

    #[test]
    fn unaffordable_property_is_not_bought() {
        let mut env = env();
        env.players[0].cash = 50;
        let trace = env.transition(Action::Buy, None, Roll(3, 3));
        assert_eq!(env.holdings[6].owner, None);
        assert_eq!(trace.money_after, 50);
    }

    #[test]
    fn rent_payment_is_capped_at_the_balance() {
        let mut env = env();
        env.holdings[6] = Holding {
            owner: Some(1),
            houses: 5,
        };
        env.players[0].cash = 10;
        let trace = env.transition(Action::Pass, None, Roll(2, 4));

        assert_eq!(env.players[0].cash, 0);
        assert_eq!(env.players[1].cash, 1510);
        assert_eq!(trace.fee_paid, 10);
        assert_eq!(trace.reward, -10.);
        assert!(!trace.terminal);
    }

    #[test]
    fn rent_follows_the_house_multipliers() {
        for (houses, multiplier) in RENT_MULTIPLIERS.iter().enumerate() {
            let mut env = env();
            env.holdings[39] = Holding {
                owner: Some(1),
                houses: houses as u8,
            };
            env.players[0].position = 33;
            env.players[0].cash = 100_000;
            let trace = env.transition(Action::Pass, None, Roll(3, 3));
            assert_eq!(trace.fee_paid, 50 * multiplier);
        }
    }

    #[test]
    fn building_on_own_property() {
        let mut env = env();
        env.holdings[6] = Holding {
            owner: Some(0),
            houses: 4,
        };
        let trace = env.transition(Action::Buy, None, Roll(1, 5));
        assert_eq!(env.holdings[6].houses, 5);
        assert_eq!(trace.money_after, 1450);
        assert_eq!(trace.ledger.houses, 50);
        assert_eq!(trace.reward, 0.);
    }

    #[test]
    fn hotel_is_the_cap() {
        let mut env = env();
        env.holdings[6] = Holding {
            owner: Some(0),
            houses: MAX_HOUSES,
        };
        let trace = env.transition(Action::Buy, None, Roll(1, 5));
        assert_eq!(env.holdings[6].houses, MAX_HOUSES);
        assert_eq!(trace.money_after, 1500);
    }

    #[test]
    fn taxes_are_charged() {
        let mut env = env();
        let trace = env.transition(Action::Buy, None, Roll(1, 3));
        assert_eq!(trace.landed_on_position, 4);
        assert_eq!(trace.fee_paid, 200);
        assert_eq!(trace.reward, -200.);
        assert_eq!(env.players[0].cash, 1300);
    }

    #[test]
    fn go_to_jail_square_jails() {
        let mut env = env();
        env.players[0].position = 24;
        let trace = env.transition(Action::Pass, None, Roll(3, 3));
        assert_eq!(trace.landed_on_position, GO_TO_JAIL_POSITION);
        assert_eq!(trace.position_after, JAIL_POSITION);
        assert!(trace.in_jail);
        assert!(env.players[0].in_jail);
    }

    #[test]
    fn failed_escape_spends_the_turn() {
        let mut env = env();
        env.send_to_jail(0);
        let trace = env.transition(Action::Pass, Some(Roll(1, 2)), Roll(4, 4));
        assert_eq!(trace.dice_roll, 0);
        assert_eq!(trace.position_after, JAIL_POSITION);
        assert_eq!(env.players[0].jail_turns, 1);
        assert!(env.players[0].in_jail);
        assert_eq!(env.current, 1);
    }

    #[test]
    fn doubles_release_from_jail() {
        let mut env = env();
        env.send_to_jail(0);
        let trace = env.transition(Action::Pass, Some(Roll(2, 2)), Roll(1, 2));
        assert!(!env.players[0].in_jail);
        assert_eq!(trace.position_after, 13);
        assert_eq!(trace.ledger.passed_go, 0);
    }

    #[test]
    fn third_failed_attempt_pays_the_fee() {
        let mut env = env();
        env.send_to_jail(0);
        env.players[0].jail_turns = JAIL_TURNS - 1;
        let trace = env.transition(Action::Pass, Some(Roll(1, 2)), Roll(4, 6));
        assert!(!env.players[0].in_jail);
        assert_eq!(trace.position_after, 20);
        assert_eq!(trace.fee_paid, JAIL_FEE);
        assert_eq!(trace.money_after, 1500 - JAIL_FEE);
        assert_eq!(trace.reward, -(JAIL_FEE as f64));
    }

    #[test]
    fn liquidation_sells_houses_then_squares() {
        let mut env = env();
        // Two houses on St. Charles Place and a bare Baltic Avenue
        env.holdings[3] = Holding {
            owner: Some(0),
            houses: 0,
        };
        env.holdings[11] = Holding {
            owner: Some(0),
            houses: 2,
        };
        env.players[0].position = 2;
        env.players[0].cash = 120;
        // Income tax of 200 leaves the player at -80
        let trace = env.transition(Action::Pass, None, Roll(1, 1));

        // Houses bring in 2 * 50 = 100
        assert_eq!(env.holdings[11].houses, 0);
        assert_eq!(env.holdings[11].owner, Some(0));
        assert_eq!(env.holdings[3].owner, Some(0));
        assert_eq!(env.players[0].cash, 20);
        assert_eq!(trace.ledger.liquidation, 100);
        assert!(!trace.terminal);
        assert_partition(&env);
    }

    #[test]
    fn selling_squares_stops_once_solvent() {
        let mut env = env();
        for position in [1, 3, 6] {
            env.holdings[position] = Holding {
                owner: Some(0),
                houses: 0,
            };
        }
        env.players[0].position = 2;
        env.players[0].cash = 150;
        // Income tax leaves -50, then two $30 sales cover it
        let trace = env.transition(Action::Pass, None, Roll(1, 1));

        assert_eq!(trace.money_after, 10);
        assert_eq!(trace.ledger.liquidation, 60);
        assert_eq!(env.holdings[1].owner, None);
        assert_eq!(env.holdings[3].owner, None);
        assert_eq!(env.holdings[6].owner, Some(0));
        assert_eq!(trace.properties_owned, 1);
        assert!(!trace.terminal);
        assert_partition(&env);
    }

    #[test]
    fn selling_houses_stops_once_solvent() {
        let mut env = env();
        for (position, houses) in [(1, 2), (3, 3), (6, 1)] {
            env.holdings[position] = Holding {
                owner: Some(0),
                houses,
            };
        }
        env.players[0].position = 2;
        env.players[0].cash = 150;
        let trace = env.transition(Action::Pass, None, Roll(1, 1));

        // Mediterranean's two houses bring in exactly the 50 owed
        assert_eq!(trace.money_after, 0);
        assert_eq!(env.holdings[1].houses, 0);
        assert_eq!(env.holdings[3].houses, 3);
        assert_eq!(env.holdings[6].houses, 1);
        assert!([1, 3, 6].iter().all(|&p| env.holdings[p].owner == Some(0)));
    }

    #[test]
    fn debt_from_the_jail_fee_pays_no_rent() {
        let mut env = env();
        env.send_to_jail(0);
        env.players[0].jail_turns = JAIL_TURNS - 1;
        env.players[0].cash = 20;
        env.holdings[39] = Holding {
            owner: Some(0),
            houses: 0,
        };
        env.holdings[13] = Holding {
            owner: Some(1),
            houses: 0,
        };
        // Paying the fee leaves -30, then States Avenue is owned by player 1
        let trace = env.transition(Action::Pass, Some(Roll(1, 2)), Roll(1, 2));

        assert_eq!(trace.position_after, 13);
        assert_eq!(trace.fee_paid, JAIL_FEE);
        assert_eq!(trace.ledger.rent, 0);
        assert_eq!(env.players[1].cash, 1500);
        // Boardwalk is sold to cover the fee
        assert_eq!(env.holdings[39].owner, None);
        assert_eq!(trace.money_after, 20 - JAIL_FEE + 200);
        assert!(!trace.terminal);
    }

    #[test]
    fn irrecoverable_bankruptcy_ends_the_episode() {
        let mut env = env();
        env.holdings[11] = Holding {
            owner: Some(0),
            houses: 2,
        };
        env.players[0].position = 2;
        env.players[0].cash = -300;
        let trace = env.transition(Action::Pass, None, Roll(1, 1));

        // -500 after tax, +100 for houses, +70 for the square, still -330
        assert_eq!(trace.money_after, -330);
        assert_eq!(trace.ledger.liquidation, 170);
        assert!(trace.terminal);
        assert_eq!(trace.reward, -200. - BANKRUPTCY_PENALTY);
        assert_eq!(env.holdings[11], Holding::default());
        assert_eq!(env.current, 0);
        assert_partition(&env);

        // Stepping a finished game does nothing
        let again = env.step(Action::Buy);
        assert!(again.terminal);
        assert_eq!(again.reward, 0.);
        assert_eq!(again.money_after, -330);
    }

    #[test]
    fn broke_player_pays_no_rent() {
        let mut env = env();
        env.holdings[37] = Holding {
            owner: Some(0),
            houses: 0,
        };
        env.holdings[39] = Holding {
            owner: Some(1),
            houses: 5,
        };
        env.players[0].position = 33;
        env.players[0].cash = 0;
        env.players[1].cash = 0;
        let trace = env.transition(Action::Pass, None, Roll(3, 3));
        // Nothing to pay with, so the player isn't bankrupt
        assert_eq!(trace.fee_paid, 0);
        assert!(!trace.terminal);
        assert_partition(&env);
    }

    #[test]
    fn money_is_conserved_across_random_play() {
        let mut env = Env::new(
            GameConfig {
                players: 4,
                ..GameConfig::default()
            },
            11,
        )
        .unwrap();
        env.reset();
        for i in 0..2000 {
            let action = if i % 3 == 0 { Action::Pass } else { Action::Buy };
            let trace = env.step(action);
            assert_eq!(
                trace.money_after,
                trace.money_before + trace.ledger.total(),
                "{}",
                trace.summary
            );
            assert_partition(&env);
            if trace.terminal {
                env.reset();
            }
        }
    }

    #[test]
    fn decidable_only_where_buying_matters() {
        let mut env = env();
        // 'Go' can't be bought
        assert!(!env.decidable());
        env.players[0].position = 1;
        assert!(env.decidable());
        env.holdings[1].owner = Some(1);
        assert!(!env.decidable());
        env.holdings[1].owner = Some(0);
        assert!(env.decidable());
        env.holdings[1].houses = MAX_HOUSES;
        assert!(!env.decidable());
        env.holdings[1].houses = 0;
        env.players[0].cash = 10;
        assert!(!env.decidable());
    }

    #[test]
    fn render_lists_every_player() {
        let mut env = env();
        env.step(Action::Pass);
        let text = env.to_string();
        assert!(text.contains("Player 0"));
        assert!(text.contains("Player 1"));
        assert!(text.contains("Board Owners"));
    }
}

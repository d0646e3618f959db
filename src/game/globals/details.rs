use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// The outcome of rolling both dice once.
pub struct Roll(pub u8, pub u8);

impl Roll {
    /// Roll two fair six-sided dice.
    pub fn random<R: Rng>(rng: &mut R) -> Roll {
        Roll(rng.random_range(1..=6), rng.random_range(1..=6))
    }

    /// The sum of the two dice.
    pub fn sum(&self) -> usize {
        (self.0 + self.1) as usize
    }

    /// Whether both the dice resulted in the same number.
    pub fn is_double(&self) -> bool {
        self.0 == self.1
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// What a square does when a player lands on it.
pub enum SquareKind {
    Go,
    /// Income tax or luxury tax. The associated value is the fee.
    Tax(i64),
    Jail,
    Chance,
    Chest,
    GoToJail,
    FreeParking,
    /// Streets, railroads and utilities.
    Property,
}

#[derive(Clone, Debug)]
/// A square on the game board.
pub struct Square {
    pub kind: SquareKind,
    /// The price of the square, or 0 if it can't be bought.
    pub price: i64,
    /// Rent with no houses on the square.
    pub rent: i64,
    /// The cost of one house, or 0 if the square can't be built on.
    pub house_cost: i64,
    pub name: &'static str,
}

impl Square {
    /// Creates a purchasable square.
    pub fn property(name: &'static str, price: i64, rent: i64, house_cost: i64) -> Square {
        Square {
            kind: SquareKind::Property,
            price,
            rent,
            house_cost,
            name,
        }
    }

    /// Creates a square that can't be bought.
    pub fn special(name: &'static str, kind: SquareKind) -> Square {
        Square {
            kind,
            price: 0,
            rent: 0,
            house_cost: 0,
            name,
        }
    }

    pub fn is_property(&self) -> bool {
        self.kind == SquareKind::Property && self.price > 0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// The effect a card has when it's drawn.
pub enum CardKind {
    /// Move to 'Go', collecting the pass-go reward unless already there.
    AdvanceToGo,
    /// Move straight to jail.
    GoToJail,
    /// The bank pays the player $50.
    BankDividend,
    /// Pay $15.
    PoorTax,
    /// Pay $50.
    DoctorsFee,
    /// The bank pays the player $20.
    TaxRefund,
}

#[derive(Copy, Clone, Debug)]
/// A chance or community chest card.
pub struct Card {
    pub name: &'static str,
    pub kind: CardKind,
}

impl Card {
    pub const fn new(name: &'static str, kind: CardKind) -> Card {
        Card { name, kind }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// A decision the agent makes at the start of a turn.
pub enum Action {
    #[default]
    /// Don't buy anything.
    Pass = 0,
    /// Buy the property landed on, or build a house on it if it's already ours.
    Buy = 1,
}

impl Action {
    /// Both actions, indexed by their value.
    pub const ALL: [Action; 2] = [Action::Pass, Action::Buy];

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl From<i32> for Action {
    /// Anything other than 1 is treated as a pass.
    fn from(value: i32) -> Self {
        match value {
            1 => Action::Buy,
            _ => Action::Pass,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A player playing the game.
pub struct Player {
    /// The player's position around the board. 'Go' is at 0
    /// and 'Boardwalk' (the last tile going clockwise) is at 39.
    pub position: usize,
    /// The amount of money the player has. This may dip below
    /// zero during a turn until the player's assets are liquidated.
    pub cash: i64,
    /// Whether the player is currently in jail.
    pub in_jail: bool,
    /// The number of turns the player has spent in jail.
    pub jail_turns: u8,
}

impl Player {
    /// Create a vector of players.
    pub fn multiple_new(amount: usize, cash: i64) -> Vec<Player> {
        let mut players = Vec::with_capacity(amount);

        for _ in 0..amount {
            players.push(Player {
                position: 0,
                cash,
                in_jail: false,
                jail_turns: 0,
            })
        }

        players
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos_color = if self.in_jail { "\x1b[31m" } else { "\x1b[36m" };

        write!(
            f,
            "[{}{:02}\x1b[0m] \x1b[33m{}\x1b[0mjail \x1b[32m${}\x1b[0m",
            pos_color, self.position, self.jail_turns, self.cash
        )
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
/// Information about a square related to its ownership.
pub struct Holding {
    /// The index of the player who owns this square, or `None` for the bank.
    pub owner: Option<usize>,
    /// The number of houses on the square. 5 means a hotel.
    pub houses: u8,
}

impl Holding {
    /// Add a house, if possible. Return whether this had any effect.
    pub fn build(&mut self) -> bool {
        if self.houses < super::MAX_HOUSES {
            self.houses += 1;
            true
        } else {
            false
        }
    }

    /// Return the square to the bank.
    pub fn forfeit(&mut self) {
        self.owner = None;
        self.houses = 0;
    }

    /// The owner as a signed index, with -1 standing for the bank.
    pub fn owner_index(&self) -> i32 {
        self.owner.map(|p| p as i32).unwrap_or(-1)
    }
}

mod details;
pub use details::*;

use lazy_static::lazy_static;

/// The number of squares around the board.
pub const BOARD_SIZE: usize = 40;

/// The most players a game can seat.
pub const MAX_PLAYERS: usize = 8;

/// Position of the 'Jail / Just Visiting' square.
pub const JAIL_POSITION: usize = 10;

/// Position of the 'Go To Jail' square.
pub const GO_TO_JAIL_POSITION: usize = 30;

/// The number of failed turns in jail after which a player pays to get out.
pub const JAIL_TURNS: u8 = 3;

/// The fee paid to leave jail after `JAIL_TURNS` failed attempts.
pub const JAIL_FEE: i64 = 50;

/// The bonus reward for buying a property.
pub const BUY_BONUS: f64 = 100.;

/// The penalty for going bankrupt with nothing left to sell.
pub const BANKRUPTCY_PENALTY: f64 = 1000.;

/// The most houses a square can hold. The fifth is a hotel.
pub const MAX_HOUSES: u8 = 5;

/// Rent multipliers on the base rent, indexed by house count.
pub const RENT_MULTIPLIERS: [i64; 6] = [1, 5, 15, 45, 80, 125];

lazy_static! {
    /// All the squares on the game board, indexed by position.
    pub static ref BOARD: [Square; BOARD_SIZE] = [
        Square::special("GO", SquareKind::Go),
        Square::property("Mediterranean Avenue", 60, 2, 50),
        Square::special("Community Chest", SquareKind::Chest),
        Square::property("Baltic Avenue", 60, 4, 50),
        Square::special("Income Tax", SquareKind::Tax(200)),
        Square::property("Reading Railroad", 200, 25, 100),
        Square::property("Oriental Avenue", 100, 6, 50),
        Square::special("Chance", SquareKind::Chance),
        Square::property("Vermont Avenue", 100, 6, 50),
        Square::property("Connecticut Avenue", 120, 8, 50),
        Square::special("Jail/Just Visiting", SquareKind::Jail),
        Square::property("St. Charles Place", 140, 10, 100),
        Square::property("Electric Company", 150, 10, 75),
        Square::property("States Avenue", 140, 10, 100),
        Square::property("Virginia Avenue", 160, 12, 100),
        Square::property("Pennsylvania Railroad", 200, 25, 100),
        Square::property("St. James Place", 180, 14, 100),
        Square::special("Community Chest", SquareKind::Chest),
        Square::property("Tennessee Avenue", 180, 14, 100),
        Square::property("New York Avenue", 200, 16, 100),
        Square::special("Free Parking", SquareKind::FreeParking),
        Square::property("Kentucky Avenue", 220, 18, 150),
        Square::special("Chance", SquareKind::Chance),
        Square::property("Indiana Avenue", 220, 18, 150),
        Square::property("Illinois Avenue", 240, 20, 150),
        Square::property("B. & O. Railroad", 200, 25, 100),
        Square::property("Atlantic Avenue", 260, 22, 150),
        Square::property("Ventnor Avenue", 260, 22, 150),
        Square::property("Water Works", 150, 10, 75),
        Square::property("Marvin Gardens", 280, 24, 150),
        Square::special("Go To Jail", SquareKind::GoToJail),
        Square::property("Pacific Avenue", 300, 26, 200),
        Square::property("North Carolina Avenue", 300, 26, 200),
        Square::special("Community Chest", SquareKind::Chest),
        Square::property("Pennsylvania Avenue", 320, 28, 200),
        Square::property("Short Line Railroad", 200, 25, 100),
        Square::special("Chance", SquareKind::Chance),
        Square::property("Park Place", 350, 35, 200),
        Square::special("Luxury Tax", SquareKind::Tax(100)),
        Square::property("Boardwalk", 400, 50, 200),
    ];
}

/// The chance deck. Cards are drawn uniformly with replacement.
pub static CHANCE_DECK: [Card; 4] = [
    Card::new("Advance to Go", CardKind::AdvanceToGo),
    Card::new("Go to Jail", CardKind::GoToJail),
    Card::new("Bank pays you dividend", CardKind::BankDividend),
    Card::new("Pay poor tax", CardKind::PoorTax),
];

/// The community chest deck. Cards are drawn uniformly with replacement.
pub static CHEST_DECK: [Card; 4] = [
    Card::new("Doctor's fee", CardKind::DoctorsFee),
    Card::new("Income tax refund", CardKind::TaxRefund),
    Card::new("Go to Jail", CardKind::GoToJail),
    Card::new("Advance to Go", CardKind::AdvanceToGo),
];

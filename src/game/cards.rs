use super::globals::*;
use super::Env;
use rand::Rng;

#[derive(Clone, Debug, Default, PartialEq)]
/// The outcome of applying a card to a player.
pub struct CardEffect {
    /// Change to the step reward.
    pub reward: f64,
    /// Change to the player's cash.
    pub cash: i64,
    pub description: String,
    /// Whether the card sent the player to jail.
    pub jailed: bool,
}

/// Draw one card uniformly at random, with replacement.
pub fn draw<R: Rng>(deck: &[Card], rng: &mut R) -> Card {
    deck[rng.random_range(0..deck.len())]
}

impl CardKind {
    /// Apply this card's effect to `player`.
    pub fn apply(&self, env: &mut Env, player: usize) -> CardEffect {
        match self {
            CardKind::AdvanceToGo => advance_to_go(env, player),
            CardKind::GoToJail => go_to_jail(env, player),
            CardKind::BankDividend => adjust_money(env, player, 50),
            CardKind::PoorTax => adjust_money(env, player, -15),
            CardKind::DoctorsFee => adjust_money(env, player, -50),
            CardKind::TaxRefund => adjust_money(env, player, 20),
        }
    }
}

fn adjust_money(env: &mut Env, player: usize, amount: i64) -> CardEffect {
    env.players[player].cash += amount;
    CardEffect {
        reward: amount as f64,
        cash: amount,
        description: format!("Adjusted money by {}.", amount),
        jailed: false,
    }
}

fn advance_to_go(env: &mut Env, player: usize) -> CardEffect {
    let mut effect = CardEffect {
        description: "Advanced to GO.".to_owned(),
        ..CardEffect::default()
    };

    // Collect the pass-go reward unless the player is already there
    if env.players[player].position != 0 {
        let go_reward = env.config.go_reward;
        env.players[player].cash += go_reward;
        effect.cash = go_reward;
        effect.reward = go_reward as f64;
        effect.description += &format!(" Collected ${}.", go_reward);
    }

    env.players[player].position = 0;
    effect
}

fn go_to_jail(env: &mut Env, player: usize) -> CardEffect {
    env.send_to_jail(player);
    CardEffect {
        description: format!("Moved to Jail (Position {}).", JAIL_POSITION),
        jailed: true,
        ..CardEffect::default()
    }
}

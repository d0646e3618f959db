use crate::game::{Env, Observation};
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
/// A lossy summary of the game from the current player's point of view.
/// Everything the value table knows about a state is keyed on this.
pub struct StateKey {
    pub position: usize,
    /// Cash, in whole hundreds (truncated toward zero).
    pub money_bin: i64,
    /// The owner of the square the player stands on, or -1 for the bank.
    pub owner: i32,
    pub in_jail: bool,
}

impl StateKey {
    /// Return the key for the player whose turn it is in `obs`.
    pub fn from_observation(obs: &Observation) -> StateKey {
        let p = obs.current_player;
        let position = obs.positions[p];
        StateKey {
            position,
            money_bin: obs.cash[p] / 100,
            owner: obs.owners[position],
            in_jail: obs.in_jail[p],
        }
    }

    /// Return the key for the player whose turn it is in `env`, without a full snapshot.
    pub fn of(env: &Env) -> StateKey {
        let player = env.current_player();
        StateKey {
            position: player.position,
            money_bin: player.cash / 100,
            owner: env.holdings[player.position].owner_index(),
            in_jail: player.in_jail,
        }
    }

    /// Multiplicative rolling hash of the four fields, reduced modulo `buckets`.
    pub fn bucket(&self, buckets: usize) -> usize {
        let m = buckets as i64;
        let mut h: i64 = 17;
        for field in [
            self.position as i64,
            self.money_bin,
            self.owner as i64 + 10,
            self.in_jail as i64,
        ] {
            h = h.wrapping_mul(31).wrapping_add(field).rem_euclid(m);
        }
        h as usize
    }
}

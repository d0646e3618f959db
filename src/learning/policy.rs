use super::key::StateKey;
use super::table::{QTable, ValueEntry};
use crate::game::Action;
use rand::rngs::SmallRng;
use rand::Rng;

/// Means closer than this are treated as a tie.
pub const TIE_TOLERANCE: f64 = 1e-9;

/// How an agent picks an action when it isn't exploring.
pub trait Policy {
    fn exploit(&mut self, key: StateKey, rng: &mut SmallRng) -> Action;
}

/// Return either action with equal probability.
pub fn random_action(rng: &mut SmallRng) -> Action {
    Action::ALL[rng.random_range(0..Action::ALL.len())]
}

/// Return the action with the higher mean return, breaking ties at random.
pub fn argmax(entry: &ValueEntry, rng: &mut SmallRng) -> Action {
    let pass = entry.mean(Action::Pass);
    let buy = entry.mean(Action::Buy);

    if (pass - buy).abs() < TIE_TOLERANCE {
        random_action(rng)
    } else if buy > pass {
        Action::Buy
    } else {
        Action::Pass
    }
}

/// Act greedily on the live table, creating entries for unseen states.
pub struct Greedy<'a> {
    pub table: &'a mut QTable,
}

impl Policy for Greedy<'_> {
    fn exploit(&mut self, key: StateKey, rng: &mut SmallRng) -> Action {
        match self.table.get_or_create(key) {
            Ok(entry) => argmax(entry, rng),
            Err(e) => {
                log::warn!("no value entry for {:?} ({}), acting at random", key, e);
                random_action(rng)
            }
        }
    }
}

/// Act greedily on a read-only view of the table. Unseen states look like
/// fresh entries, so nothing is written until the batch is folded in.
#[derive(Clone, Copy)]
pub struct Snapshot<'a> {
    pub table: &'a QTable,
}

impl Policy for Snapshot<'_> {
    fn exploit(&mut self, key: StateKey, rng: &mut SmallRng) -> Action {
        match self.table.get(&key) {
            Some(entry) => argmax(entry, rng),
            None => argmax(&ValueEntry::default(), rng),
        }
    }
}

/// Always buy.
#[derive(Clone, Copy, Default)]
pub struct Eager;

impl Policy for Eager {
    fn exploit(&mut self, _key: StateKey, _rng: &mut SmallRng) -> Action {
        Action::Buy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn key() -> StateKey {
        StateKey {
            position: 6,
            money_bin: 15,
            owner: -1,
            in_jail: false,
        }
    }

    #[test]
    fn argmax_prefers_the_higher_mean() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut entry = ValueEntry::default();
        entry.actions[Action::Buy.index()].mean = 10.;
        assert_eq!(argmax(&entry, &mut rng), Action::Buy);
        entry.actions[Action::Pass.index()].mean = 20.;
        assert_eq!(argmax(&entry, &mut rng), Action::Pass);
    }

    #[test]
    fn ties_are_broken_both_ways() {
        let mut rng = SmallRng::seed_from_u64(0);
        let entry = ValueEntry::default();
        let buys = (0..1000)
            .filter(|_| argmax(&entry, &mut rng) == Action::Buy)
            .count();
        assert!(buys > 400 && buys < 600, "{} buys", buys);
    }

    #[test]
    fn greedy_creates_entries_and_snapshot_does_not() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut table = QTable::new();

        Snapshot { table: &table }.exploit(key(), &mut rng);
        assert!(table.is_empty());

        Greedy { table: &mut table }.exploit(key(), &mut rng);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn snapshot_follows_learned_values() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut table = QTable::new();
        table.get_or_create(key()).unwrap().actions[Action::Pass.index()].mean = -5.;
        let mut policy = Snapshot { table: &table };
        for _ in 0..20 {
            assert_eq!(policy.exploit(key(), &mut rng), Action::Buy);
        }
    }

    #[test]
    fn eager_always_buys() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(Eager.exploit(key(), &mut rng), Action::Buy);
    }
}

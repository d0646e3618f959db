use super::episode::Visit;
use super::export::ValueRecord;
use super::key::StateKey;
use crate::game::Action;
use std::collections::TryReserveError;

/// Initial bucket count of the value table.
pub const Q_BUCKETS: usize = 1024;

/// Initial bucket count of the per-update visited set.
pub const VISITED_BUCKETS: usize = 256;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("value store allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
/// Observed returns for one action in one state.
pub struct ActionStats {
    pub sum: f64,
    pub count: u64,
    /// `sum / count`, or 0 before the first visit.
    pub mean: f64,
}

impl ActionStats {
    fn record(&mut self, ret: f64) {
        self.sum += ret;
        self.count += 1;
        self.mean = self.sum / self.count as f64;
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
/// Statistics for both actions of one state, indexed by `Action::index`.
pub struct ValueEntry {
    pub actions: [ActionStats; 2],
}

impl ValueEntry {
    pub fn mean(&self, action: Action) -> f64 {
        self.actions[action.index()].mean
    }

    pub fn count(&self, action: Action) -> u64 {
        self.actions[action.index()].count
    }
}

/*********        CHAINED HASH TABLE        *********/

/// A separate-chaining hash table keyed on `StateKey`. It doubles its bucket
/// count once the load factor passes 3/4, and reports allocation failure
/// instead of aborting.
#[derive(Clone, Debug)]
struct Chained<V> {
    buckets: Vec<Vec<(StateKey, V)>>,
    len: usize,
}

impl<V: Default> Chained<V> {
    fn with_buckets(count: usize) -> Self {
        Self {
            buckets: (0..count.max(1)).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    fn get(&self, key: &StateKey) -> Option<&V> {
        self.buckets[key.bucket(self.buckets.len())]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Return the value stored under `key`, inserting a default one if there is none.
    fn entry(&mut self, key: StateKey) -> Result<&mut V, StoreError> {
        let b = key.bucket(self.buckets.len());
        if let Some(i) = self.buckets[b].iter().position(|(k, _)| *k == key) {
            return Ok(&mut self.buckets[b][i].1);
        }

        if (self.len + 1) * 4 > self.buckets.len() * 3 {
            self.grow()?;
        }

        let b = key.bucket(self.buckets.len());
        let chain = &mut self.buckets[b];
        chain.try_reserve(1)?;
        let i = chain.len();
        chain.push((key, V::default()));
        self.len += 1;
        Ok(&mut chain[i].1)
    }

    /// Double the bucket count and rehash. Nothing moves until every
    /// allocation has succeeded, so a failure leaves the table untouched.
    fn grow(&mut self) -> Result<(), StoreError> {
        let size = self.buckets.len() * 2;
        let mut sizes: Vec<usize> = Vec::new();
        sizes.try_reserve_exact(size)?;
        sizes.resize(size, 0);
        for (key, _) in self.buckets.iter().flatten() {
            sizes[key.bucket(size)] += 1;
        }

        let mut buckets: Vec<Vec<(StateKey, V)>> = Vec::new();
        buckets.try_reserve_exact(size)?;
        for &n in &sizes {
            let mut chain = Vec::new();
            chain.try_reserve_exact(n)?;
            buckets.push(chain);
        }

        for (key, value) in self.buckets.drain(..).flatten() {
            buckets[key.bucket(size)].push((key, value));
        }
        self.buckets = buckets;
        Ok(())
    }

    fn iter(&self) -> impl Iterator<Item = &(StateKey, V)> {
        self.buckets.iter().flatten()
    }

    fn len(&self) -> usize {
        self.len
    }

    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

/*********        VALUE TABLE        *********/

#[derive(Clone, Debug)]
/// The action-value estimates learned so far. Entries are created lazily
/// and never removed.
pub struct QTable {
    table: Chained<ValueEntry>,
}

impl Default for QTable {
    fn default() -> Self {
        Self::new()
    }
}

impl QTable {
    pub fn new() -> Self {
        Self {
            table: Chained::with_buckets(Q_BUCKETS),
        }
    }

    /// Return the entry for `key`, creating a zeroed one if it doesn't exist.
    /// Calling this again with the same key returns the same, unchanged entry.
    pub fn get_or_create(&mut self, key: StateKey) -> Result<&mut ValueEntry, StoreError> {
        self.table.entry(key)
    }

    /// Return the entry for `key`, if it's been created.
    pub fn get(&self, key: &StateKey) -> Option<&ValueEntry> {
        self.table.get(key)
    }

    /// The number of states in the table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &ValueEntry)> {
        self.table.iter().map(|(k, v)| (k, v))
    }

    /// Fold one episode into the table with first-visit Monte Carlo control
    /// (undiscounted). Each state-action pair is credited once, at its earliest
    /// occurrence, with the total reward from there to the end of the episode.
    ///
    /// A visit whose bookkeeping can't be allocated is skipped with a warning.
    /// Return the number of state-action pairs updated.
    pub fn update(&mut self, trajectory: &[Visit]) -> usize {
        // Forward pass: find the earliest occurrence of every pair
        let mut visited = VisitedSet::new();
        let mut first = Vec::new();
        if let Err(e) = first.try_reserve_exact(trajectory.len()) {
            log::warn!("skipping update of a {} step episode: {}", trajectory.len(), e);
            return 0;
        }
        for visit in trajectory {
            first.push(match visited.contains_and_mark(visit.key, visit.action) {
                Ok(seen) => !seen,
                Err(e) => {
                    log::warn!("skipping update of {:?}: {}", visit.key, e);
                    false
                }
            });
        }

        // Backward pass: accumulate returns and credit the earliest occurrences
        let mut ret = 0.;
        let mut updated = 0;
        for (visit, &earliest) in trajectory.iter().zip(&first).rev() {
            ret += visit.reward;
            if !earliest {
                continue;
            }

            match self.get_or_create(visit.key) {
                Ok(entry) => {
                    entry.actions[visit.action.index()].record(ret);
                    updated += 1;
                }
                Err(e) => log::warn!("skipping update of {:?}: {}", visit.key, e),
            }
        }

        updated
    }

    /// Every visited state-action pair, sorted by state then action.
    pub fn export(&self) -> Vec<ValueRecord> {
        let mut records: Vec<ValueRecord> = self
            .iter()
            .flat_map(|(key, entry)| {
                Action::ALL
                    .into_iter()
                    .filter(move |&a| entry.count(a) > 0)
                    .map(move |a| ValueRecord::new(key, a, &entry.actions[a.index()]))
            })
            .collect();
        records.sort_by(|a, b| a.key().cmp(&b.key()).then(a.action.cmp(&b.action)));
        records
    }
}

/*********        VISITED SET        *********/

/// The state-action pairs seen so far in a single update pass.
pub struct VisitedSet {
    table: Chained<[bool; 2]>,
}

impl Default for VisitedSet {
    fn default() -> Self {
        Self::new()
    }
}

impl VisitedSet {
    pub fn new() -> Self {
        Self {
            table: Chained::with_buckets(VISITED_BUCKETS),
        }
    }

    /// Return whether the pair was already present, marking it as present either way.
    pub fn contains_and_mark(&mut self, key: StateKey, action: Action) -> Result<bool, StoreError> {
        let seen = self.table.entry(key)?;
        let was = seen[action.index()];
        seen[action.index()] = true;
        Ok(was)
    }
}

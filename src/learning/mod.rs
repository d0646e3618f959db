pub mod driver;
pub mod episode;
pub mod export;
pub mod key;
pub mod policy;
pub mod table;

pub use driver::{TrainReport, Trainer};
pub use episode::{generate_episode, Agent, Episode, Visit};
pub use key::StateKey;
pub use policy::{Eager, Greedy, Policy, Snapshot};
pub use table::{QTable, StoreError, ValueEntry};

use super::episode::{generate_episode, Agent, Episode};
use super::policy::{Eager, Greedy, Snapshot};
use super::table::QTable;
use crate::config::{ConfigError, GameConfig, Mode, TrainConfig, WorkerPolicy};
use crate::game::Env;
use rayon::prelude::*;
use std::fmt;
use std::time::{Duration, Instant};

/// Episodes between progress reports in sequential mode.
const PROGRESS_INTERVAL: usize = 5000;

/// Return the seed of episode `id`'s environment.
pub fn episode_seed(seed: u64, id: usize) -> u64 {
    seed.wrapping_add((id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Return the seed of episode `id`'s agent, distinct from its environment's.
pub fn agent_seed(seed: u64, id: usize) -> u64 {
    episode_seed(seed, id).rotate_left(32) ^ 0xD1B5_4A32_D192_ED03
}

#[derive(Clone, Debug, Default, PartialEq)]
/// A summary of a training run.
pub struct TrainReport {
    pub episodes: usize,
    pub steps: usize,
    /// Episodes that ended in bankruptcy.
    pub terminal: usize,
    /// States in the value table at the end of the run.
    pub states: usize,
    pub elapsed: Duration,
    pub dropped_traces: usize,
}

impl TrainReport {
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0. {
            self.episodes as f64 / secs
        } else {
            0.
        }
    }

    fn absorb(&mut self, episode: &Episode) {
        self.episodes += 1;
        self.steps += episode.steps;
        self.terminal += episode.terminal as usize;
        self.dropped_traces += episode.traces.dropped();
    }
}

impl fmt::Display for TrainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} episodes ({} bankrupt), {} steps, {} states in {:.2}ms ({:.2} episodes/second)",
            self.episodes,
            self.terminal,
            self.steps,
            self.states,
            self.elapsed.as_secs_f64() * 1000.,
            self.throughput()
        )?;
        if self.dropped_traces > 0 {
            write!(f, ", {} traces dropped", self.dropped_traces)?;
        }
        Ok(())
    }
}

/// Runs Monte Carlo control over many episodes and owns the resulting table.
pub struct Trainer {
    train: TrainConfig,
    /// A fresh game, cloned for every episode.
    board: Env,
    table: QTable,
}

impl Trainer {
    /// Return a trainer with an empty table. Nothing is built if either config is invalid.
    pub fn new(game: GameConfig, train: TrainConfig) -> Result<Trainer, ConfigError> {
        train.validate()?;
        let board = Env::new(game, train.seed)?;
        Ok(Trainer {
            train,
            board,
            table: QTable::new(),
        })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.train
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn into_table(self) -> QTable {
        self.table
    }

    /// Run every configured episode, handing each one to `sink` in episode
    /// order once it has been folded into the table.
    pub fn run<F: FnMut(&Episode)>(&mut self, sink: F) -> TrainReport {
        let start = Instant::now();
        log::info!(
            "training for {} episodes ({:?}, epsilon {}, seed {})",
            self.train.episodes,
            self.train.mode,
            self.train.epsilon,
            self.train.seed
        );

        let mut report = match self.train.mode {
            Mode::Sequential => self.run_sequential(sink),
            Mode::Parallel => self.run_parallel(sink),
        };

        report.states = self.table.len();
        report.elapsed = start.elapsed();
        log::info!("{}", report);
        report
    }

    /// One worker, folding each episode in before the next one starts.
    fn run_sequential<F: FnMut(&Episode)>(&mut self, mut sink: F) -> TrainReport {
        let mut report = TrainReport::default();
        let total = self.train.episodes;

        for id in 0..total {
            let (mut env, mut agent) = self.worker(id);
            let episode = generate_episode(
                &mut env,
                &mut agent,
                &mut Greedy {
                    table: &mut self.table,
                },
                self.train.step_cap,
                self.train.trace_capacity,
            );

            self.table.update(&episode.trajectory);
            report.absorb(&episode);
            sink(&episode);

            if (id + 1) % PROGRESS_INTERVAL == 0 || id + 1 == total {
                log::info!(
                    "episode {}/{} completed, {} states",
                    id + 1,
                    total,
                    self.table.len()
                );
            }
        }
        report
    }

    /// Batches of independent workers. During a batch the table is only read;
    /// afterwards the episodes are folded in one at a time, in id order.
    fn run_parallel<F: FnMut(&Episode)>(&mut self, mut sink: F) -> TrainReport {
        let mut report = TrainReport::default();
        let total = self.train.episodes;
        let mut next = 0;

        while next < total {
            let ids = next..(next + self.train.batch).min(total);
            next = ids.end;

            let episodes: Vec<Episode> = ids
                .into_par_iter()
                .map(|id| self.simulate(id))
                .collect();

            for episode in &episodes {
                self.table.update(&episode.trajectory);
                report.absorb(episode);
                sink(episode);
            }

            log::info!(
                "episode {}/{} completed, {} states",
                next,
                total,
                self.table.len()
            );
        }
        report
    }

    /// Play episode `id` against the table as it currently stands, without writing to it.
    fn simulate(&self, id: usize) -> Episode {
        let (mut env, mut agent) = self.worker(id);
        let (cap, capacity) = (self.train.step_cap, self.train.trace_capacity);
        match self.train.policy {
            WorkerPolicy::Snapshot => {
                let mut policy = Snapshot { table: &self.table };
                generate_episode(&mut env, &mut agent, &mut policy, cap, capacity)
            }
            WorkerPolicy::Eager => generate_episode(&mut env, &mut agent, &mut Eager, cap, capacity),
        }
    }

    /// A fresh game and agent for episode `id`, each with its own stream.
    fn worker(&self, id: usize) -> (Env, Agent) {
        let mut env = self.board.clone();
        env.reseed(episode_seed(self.train.seed, id));
        env.episode = id;
        let agent = Agent::new(self.train.epsilon, agent_seed(self.train.seed, id));
        (env, agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: Mode, episodes: usize, batch: usize) -> TrainConfig {
        TrainConfig {
            episodes,
            batch,
            mode,
            seed: 1234,
            step_cap: 200,
            trace_capacity: 10,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let game = GameConfig {
            players: 1,
            ..GameConfig::default()
        };
        assert!(matches!(
            Trainer::new(game, TrainConfig::default()),
            Err(ConfigError::Players(1))
        ));
        let train = TrainConfig {
            episodes: 0,
            ..TrainConfig::default()
        };
        assert!(matches!(
            Trainer::new(GameConfig::default(), train),
            Err(ConfigError::Episodes)
        ));
    }

    #[test]
    fn seeds_differ_per_episode_and_stream() {
        assert_ne!(episode_seed(7, 0), episode_seed(7, 1));
        assert_ne!(episode_seed(7, 3), agent_seed(7, 3));
        assert_eq!(episode_seed(7, 3), episode_seed(7, 3));
    }

    #[test]
    fn sink_sees_every_episode_in_order() {
        let mut trainer =
            Trainer::new(GameConfig::default(), config(Mode::Parallel, 37, 8)).unwrap();
        let mut ids = Vec::new();
        let report = trainer.run(|e| ids.push(e.id));

        assert_eq!(ids, (0..37).collect::<Vec<_>>());
        assert_eq!(report.episodes, 37);
        assert_eq!(report.states, trainer.table().len());
        assert!(!trainer.table().is_empty());
    }

    #[test]
    fn report_counts_steps_and_drops() {
        let mut trainer =
            Trainer::new(GameConfig::default(), config(Mode::Sequential, 10, 1)).unwrap();
        let mut steps = 0;
        let mut dropped = 0;
        let report = trainer.run(|e| {
            steps += e.steps;
            dropped += e.traces.dropped();
        });
        assert_eq!(report.steps, steps);
        assert_eq!(report.dropped_traces, dropped);
        assert!(report.to_string().contains("10 episodes"));
    }
}

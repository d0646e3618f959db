use super::key::StateKey;
use super::policy::{random_action, Policy};
use crate::game::trace::TraceLog;
use crate::game::{Action, Env};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[derive(Copy, Clone, Debug, PartialEq)]
/// One step of an episode, as the value table sees it.
pub struct Visit {
    /// The state before the action was taken.
    pub key: StateKey,
    pub action: Action,
    pub reward: f64,
}

/// Everything one simulated episode produced.
#[derive(Debug)]
pub struct Episode {
    pub id: usize,
    pub trajectory: Vec<Visit>,
    pub traces: TraceLog,
    /// Whether the episode ended in bankruptcy rather than at the step cap.
    pub terminal: bool,
    pub steps: usize,
    /// Cash of every player when the episode ended.
    pub final_cash: Vec<i64>,
}

impl Episode {
    /// The undiscounted return of the whole episode.
    pub fn total_reward(&self) -> f64 {
        self.trajectory.iter().map(|v| v.reward).sum()
    }
}

/// The decision maker, with its own random stream.
pub struct Agent {
    /// Probability of picking a random action at a decision point.
    pub epsilon: f64,
    rng: SmallRng,
}

impl Agent {
    pub fn new(epsilon: f64, seed: u64) -> Agent {
        Agent {
            epsilon,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Pick the action for the current player of `env`. Off a buyable or
    /// buildable square, this is always a pass. Otherwise, explore with
    /// probability `epsilon` and defer to `policy` the rest of the time.
    pub fn select_action<P: Policy>(&mut self, env: &Env, policy: &mut P) -> Action {
        if !env.decidable() {
            return Action::Pass;
        }

        if self.rng.random::<f64>() < self.epsilon {
            random_action(&mut self.rng)
        } else {
            policy.exploit(StateKey::of(env), &mut self.rng)
        }
    }
}

/// Play one episode from a fresh board until a player goes bankrupt or
/// `step_cap` steps have been taken.
pub fn generate_episode<P: Policy>(
    env: &mut Env,
    agent: &mut Agent,
    policy: &mut P,
    step_cap: usize,
    trace_capacity: usize,
) -> Episode {
    env.reset();
    let mut episode = Episode {
        id: env.episode,
        trajectory: Vec::new(),
        traces: TraceLog::new(trace_capacity),
        terminal: false,
        steps: 0,
        final_cash: Vec::new(),
    };

    while episode.steps < step_cap {
        let key = StateKey::of(env);
        let action = agent.select_action(env, policy);
        let trace = env.step(action);
        let (reward, terminal) = (trace.reward, trace.terminal);
        episode.steps += 1;

        if episode.trajectory.try_reserve(1).is_ok() {
            episode.trajectory.push(Visit {
                key,
                action,
                reward,
            });
        } else {
            log::warn!(
                "episode {}: no room to record step {}, skipping it",
                episode.id,
                trace.step
            );
        }
        episode.traces.push(trace);

        if terminal {
            episode.terminal = true;
            break;
        }
    }

    episode.final_cash = env.players.iter().map(|p| p.cash).collect();
    log::debug!(
        "episode {} finished after {} steps ({}), return {:.1}, final cash {:?}",
        episode.id,
        episode.steps,
        if episode.terminal { "bankruptcy" } else { "step cap" },
        episode.total_reward(),
        episode.final_cash
    );
    episode
}

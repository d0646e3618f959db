use anyhow::Context;
use clap::Parser;
use monopoly_mc::config::{Mode, Settings, WorkerPolicy};
use monopoly_mc::game::trace::CSV_HEADER;
use monopoly_mc::game::{Action, Env};
use monopoly_mc::learning::episode::Agent;
use monopoly_mc::learning::{export, QTable, Snapshot, Trainer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// The number of learned values printed at the end of a run.
const SHOWN_VALUES: usize = 20;

#[derive(Parser, Debug)]
#[command(
    name = "monopoly-mc",
    version,
    about = "Train a buy/pass Monopoly policy with Monte Carlo control"
)]
struct Cli {
    /// JSON settings file; flags override its values
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
    /// Number of episodes to train for
    #[arg(short = 'n', long)]
    episodes: Option<usize>,
    /// Exploration rate
    #[arg(short = 'e', long)]
    epsilon: Option<f64>,
    /// Seed of every random stream in the run
    #[arg(short = 's', long)]
    seed: Option<u64>,
    /// Number of players
    #[arg(short = 'p', long)]
    players: Option<usize>,
    /// Starting cash of every player
    #[arg(long)]
    start_money: Option<i64>,
    /// Cash collected for passing 'Go'
    #[arg(long)]
    go_reward: Option<i64>,
    /// Simulate episodes in parallel batches
    #[arg(long)]
    parallel: bool,
    /// Episodes per parallel batch
    #[arg(short = 'b', long)]
    batch: Option<usize>,
    /// What parallel workers do when not exploring
    #[arg(long, value_enum)]
    policy: Option<WorkerPolicy>,
    /// Write every step trace to this CSV file
    #[arg(short = 't', long, value_name = "FILE")]
    traces: Option<PathBuf>,
    /// Write the learned values to this file
    #[arg(short = 'o', long, value_name = "FILE")]
    values: Option<PathBuf>,
    /// Write the learned values as JSON instead of CSV
    #[arg(long)]
    json: bool,
    /// After training, play and render this many greedy steps
    #[arg(long, value_name = "STEPS")]
    render: Option<usize>,
    /// Log more (repeat for even more)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Return the settings file (or the defaults) with flags applied on top.
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        let game = &mut settings.game;
        game.players = self.players.unwrap_or(game.players);
        game.start_money = self.start_money.unwrap_or(game.start_money);
        game.go_reward = self.go_reward.unwrap_or(game.go_reward);

        let train = &mut settings.train;
        train.episodes = self.episodes.unwrap_or(train.episodes);
        train.epsilon = self.epsilon.unwrap_or(train.epsilon);
        train.seed = self.seed.unwrap_or(train.seed);
        train.batch = self.batch.unwrap_or(train.batch);
        train.policy = self.policy.unwrap_or(train.policy);
        if self.parallel {
            train.mode = Mode::Parallel;
        }

        settings.validate()?;
        Ok(settings)
    }

    fn level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    monopoly_mc::log(cli.level())?;
    let settings = cli.settings()?;

    let mut traces = match &cli.traces {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("create trace file {}", path.display()))?;
            let mut out = BufWriter::new(file);
            writeln!(out, "{}", CSV_HEADER)?;
            Some(out)
        }
        None => None,
    };

    let mut trainer = Trainer::new(settings.game.clone(), settings.train.clone())?;
    let mut write_error = None;
    trainer.run(|episode| {
        let Some(out) = traces.as_mut() else {
            return;
        };
        if write_error.is_some() {
            return;
        }
        for trace in episode.traces.traces() {
            if let Err(e) = trace.write_csv(out) {
                write_error = Some(e);
                return;
            }
        }
    });

    if let Some(e) = write_error {
        log::warn!("stopped writing traces: {}", e);
    }
    if let (Some(mut out), Some(path)) = (traces, &cli.traces) {
        out.flush()?;
        log::info!("traces saved to {}", path.display());
    }

    let table = trainer.into_table();
    if let Some(path) = &cli.values {
        save_values(&table, path, cli.json)?;
        log::info!("values saved to {}", path.display());
    }

    print_values(&table);

    if let Some(steps) = cli.render {
        let mut env = Env::new(settings.game, settings.train.seed)?;
        render(&mut env, &table, steps);
    }
    Ok(())
}

fn save_values(table: &QTable, path: &Path, json: bool) -> anyhow::Result<()> {
    let records = table.export();
    let file =
        File::create(path).with_context(|| format!("create value file {}", path.display()))?;
    let mut out = BufWriter::new(file);
    if json {
        export::write_json(&records, &mut out)?;
    } else {
        export::write_csv(&records, &mut out)?;
    }
    out.flush()?;
    Ok(())
}

/// Print the most visited states and their values.
fn print_values(table: &QTable) {
    let mut entries: Vec<_> = table
        .iter()
        .filter(|(_, e)| e.count(Action::Pass) + e.count(Action::Buy) > 0)
        .collect();
    entries.sort_by_key(|(k, e)| (std::cmp::Reverse(e.count(Action::Pass) + e.count(Action::Buy)), **k));

    println!("Most visited states (position, money bin, owner, in jail):");
    if entries.is_empty() {
        println!(" No values learned.");
    }
    for (key, entry) in entries.iter().take(SHOWN_VALUES) {
        println!(
            " ({:2}, {:3}, {:2}, {}): Pass \x1b[33m{:8.2}\x1b[0m ({:5} visits), Buy \x1b[33m{:8.2}\x1b[0m ({:5} visits)",
            key.position,
            key.money_bin,
            key.owner,
            key.in_jail as u8,
            entry.mean(Action::Pass),
            entry.count(Action::Pass),
            entry.mean(Action::Buy),
            entry.count(Action::Buy),
        );
    }
}

/// Play a greedy game on the learned table, printing the board after every step.
fn render(env: &mut Env, table: &QTable, steps: usize) {
    let mut agent = Agent::new(0., env.episode as u64);
    let mut policy = Snapshot { table };
    env.reset();
    println!("{}", env);
    for _ in 0..steps {
        let action = agent.select_action(env, &mut policy);
        let trace = env.step(action);
        println!("{}", env);
        if trace.terminal {
            break;
        }
    }
}

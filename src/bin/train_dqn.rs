//! Trains a DQN agent on CartPole.
//!
//! ```text
//! train_dqn --config experiment.json --save dqn.bin --curve dqn_training_curve.csv
//! ```
use clap::Parser;
use deepq::agent::DqnAgent;
use deepq::config::ExperimentConfig;
use deepq::env::CartPole;
use deepq::error::Result;
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON experiment file; built-in defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Total environment frames (overrides the experiment file)
    #[arg(long)]
    frames: Option<usize>,

    /// Frames between progress reports (overrides the experiment file)
    #[arg(long)]
    eval_interval: Option<usize>,

    /// Random seed (overrides the experiment file)
    #[arg(long)]
    seed: Option<u64>,

    /// Checkpoint to restore before training
    #[arg(long)]
    load: Option<PathBuf>,

    /// Where to write the checkpoint after training
    #[arg(long)]
    save: Option<PathBuf>,

    /// Where to write the training curve as CSV
    #[arg(long, default_value = "dqn_training_curve.csv")]
    curve: PathBuf,

    /// Greedy episodes to run after training
    #[arg(long, default_value_t = 0)]
    eval_episodes: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ExperimentConfig::from_file(path)?,
        None => ExperimentConfig::default(),
    };
    if let Some(frames) = args.frames {
        config.train.num_frames = frames;
    }
    if let Some(eval_interval) = args.eval_interval {
        config.train.eval_interval = eval_interval;
    }
    if let Some(seed) = args.seed {
        config.agent.seed = seed;
    }
    info!("{:?}", config);

    let env = CartPole::new(config.env.clone());
    let mut agent = DqnAgent::new(env, config.agent.clone())?;
    if let Some(path) = &args.load {
        agent.load(path)?;
    }

    agent.train(config.train.num_frames, config.train.eval_interval)?;

    if agent.history().is_empty() {
        warn!("No data collected, skipping training curve");
    } else {
        agent.history().write_csv(&args.curve)?;
        info!("Training curve saved to {}", args.curve.display());
    }

    if let Some(path) = &args.save {
        agent.save(path)?;
    }

    if args.eval_episodes > 0 {
        let mean_reward = agent.evaluate(args.eval_episodes)?;
        info!("Greedy evaluation over {} episodes: {:.2}", args.eval_episodes, mean_reward);
    }

    Ok(())
}

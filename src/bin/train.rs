use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use ml_tic_tac_toe::ai::QAgent;
use ml_tic_tac_toe::checkpoint::CheckpointManager;
use ml_tic_tac_toe::config::AppConfig;
use ml_tic_tac_toe::training::episode::{evaluate, self_play_report};
use ml_tic_tac_toe::training::trainer::Trainer;

/// Train a tic-tac-toe Q-learning agent via self-play.
#[derive(Parser)]
#[command(name = "train", about = "Train a tic-tac-toe Q-learning agent")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override number of training stages
    #[arg(long)]
    stages: Option<usize>,

    /// Override episodes per stage
    #[arg(long)]
    episodes: Option<usize>,

    /// Override learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Seed every random source for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for stage checkpoints and the final model
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Ignore any final model on disk and start from a random network
    #[arg(long)]
    fresh: bool,

    /// Games in the post-training evaluation against a random opponent
    #[arg(long)]
    eval_games: Option<usize>,

    /// Stop cleanly after this long, e.g. "90s", "30m", "2h"
    #[arg(long, value_parser = parse_duration)]
    max_duration: Option<Duration>,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", AppConfig::default_toml().context("rendering default config")?);
        return Ok(());
    }

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(stages) = cli.stages {
        app_config.training.stages = stages;
    }
    if let Some(episodes) = cli.episodes {
        app_config.training.episodes_per_stage = episodes;
    }
    if let Some(lr) = cli.lr {
        app_config.agent.learning_rate = lr;
    }
    if let Some(seed) = cli.seed {
        app_config.agent.seed = Some(seed);
    }
    if let Some(dir) = cli.checkpoint_dir {
        app_config.training.checkpoint_dir = dir;
    }
    if let Some(games) = cli.eval_games {
        app_config.training.eval_games = games;
    }
    app_config.validate().context("invalid configuration")?;

    let mut agent = QAgent::new(app_config.agent.clone());
    let eval_games = app_config.training.eval_games;
    let trainer = Trainer::new(app_config.training);
    log::info!("checkpoints go to {}", trainer.checkpoints().dir().display());

    if cli.fresh {
        log::info!("--fresh given, starting from a random network");
    } else {
        resume_agent(&mut agent, trainer.checkpoints());
    }

    let stop = Arc::new(AtomicBool::new(false));
    watch_stdin(Arc::clone(&stop));
    if let Some(limit) = cli.max_duration {
        stop_after(Arc::clone(&stop), limit);
    }
    log::info!("type 'q' + Enter to stop after the current episode");

    let summary = trainer
        .train(&mut agent, &stop)
        .context("training failed")?;
    log::info!(
        "training {} after {} episodes ({} stages), epsilon {:.4}",
        if summary.interrupted { "stopped" } else { "complete" },
        summary.episodes,
        summary.stages_completed,
        summary.final_epsilon
    );
    if let Some(rate) = summary.last_win_rate {
        log::info!("last sampled X win rate: {:.1}%", rate * 100.0);
    }

    let seed = agent.config().seed.unwrap_or(0);
    let win_rate = evaluate(&mut agent, eval_games, seed);
    log::info!(
        "final eval vs random ({eval_games} games): {:.1}% win rate",
        win_rate * 100.0
    );
    let report = self_play_report(&mut agent, eval_games);
    log::info!(
        "greedy self-play ({} games): X wins {}, O wins {}, draws {}",
        report.games(),
        report.x_wins,
        report.o_wins,
        report.draws
    );

    Ok(())
}

/// Continue from the final model if one loads; otherwise keep the fresh network.
fn resume_agent(agent: &mut QAgent, checkpoints: &CheckpointManager) {
    match checkpoints.load_final(agent) {
        Ok(_) => match checkpoints.remove_stage_checkpoints() {
            Ok(0) => {}
            Ok(n) => log::info!("removed {n} stale stage checkpoints"),
            Err(e) => log::warn!("could not remove stale stage checkpoints: {e}"),
        },
        Err(e) => log::info!("no usable final model ({e}), starting fresh"),
    }
}

/// Set `stop` once "q" is entered on stdin.
fn watch_stdin(stop: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        let mut buffer = String::new();
        loop {
            buffer.clear();
            match std::io::stdin().read_line(&mut buffer) {
                Ok(0) | Err(_) => break,
                Ok(_) if buffer.trim().eq_ignore_ascii_case("q") => {
                    log::warn!("stop requested, finishing current episode...");
                    stop.store(true, Ordering::Relaxed);
                    break;
                }
                Ok(_) => {}
            }
        }
    });
}

fn stop_after(stop: Arc<AtomicBool>, limit: Duration) {
    log::info!("training will stop after {}s", limit.as_secs());
    std::thread::spawn(move || {
        std::thread::sleep(limit);
        log::warn!("time limit reached, stopping after current episode");
        stop.store(true, Ordering::Relaxed);
    });
}

/// Parse "30s", "5m", "2h" or "1d".
fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let (split, unit) = s
        .char_indices()
        .last()
        .ok_or_else(|| anyhow!("empty duration"))?;
    let value: u64 = s[..split]
        .parse()
        .with_context(|| format!("invalid duration '{s}'"))?;
    let scale = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86_400,
        _ => return Err(anyhow!("unknown duration unit in '{s}' (use s, m, h or d)")),
    };
    let secs = value
        .checked_mul(scale)
        .ok_or_else(|| anyhow!("duration '{s}' is too long"))?;
    Ok(Duration::from_secs(secs))
}

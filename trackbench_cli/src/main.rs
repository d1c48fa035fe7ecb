use clap::Parser;
use eyre::WrapErr;
use std::path::Path;

mod analyse;
mod cli;
mod error_fmt;
mod logging;
mod sim;
mod stability;

use cli::{Cli, Commands, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};

fn load_config(path: Option<&Path>) -> eyre::Result<trackbench_config::Config> {
    let cfg = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("read config {}", path.display()))?;
            trackbench_config::load_toml(&text)
                .wrap_err_with(|| format!("parse config {}", path.display()))?
        }
        None => trackbench_config::Config::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    let level = cli
        .log_level
        .as_deref()
        .or(cfg.logging.level.as_deref())
        .unwrap_or("info");
    logging::init(cli.json, level, &cfg.logging)?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    match cli.cmd {
        Commands::Analyse { file, other } => {
            analyse::run_analyse(&cfg, &file, other.as_deref(), cli.json)
        }
        Commands::Degrees { raw, center } => analyse::run_degrees(&cfg, raw, center, cli.json),
        Commands::Stability { levels, preset } => {
            stability::run_stability(&cfg, &levels, &preset, cli.json)
        }
        Commands::Presets => stability::run_presets(&cfg, cli.json),
        Commands::Calibrate {
            preset,
            ramp_ms,
            save,
        } => stability::run_calibrate(&cfg, &preset, ramp_ms, save, cli.json),
    }
}

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = run(cli) {
        tracing::debug!(error = ?err, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use loadtrace_driver::ReplayDriver;
use loadtrace_session::SessionConfig;
use std::path::{Path, PathBuf};

mod cli;
use cli::{Args, RuleArgs};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("LOADTRACE_LOG").unwrap_or_else(|_| "loadtrace=info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "loadtrace starting");

    match args.command {
        cli::Command::Replay {
            recording,
            config,
            rule,
            quiet_ms,
            timeout_sec,
            pre_navigation_ms,
            correlation,
            output,
        } => {
            let mut session_config = load_config(config.as_deref())?;
            rule.apply(&mut session_config);
            if let Some(quiet_ms) = quiet_ms {
                session_config.quiet_period_ms = quiet_ms;
            }
            if let Some(timeout_sec) = timeout_sec {
                session_config.timeout_sec = timeout_sec;
            }
            if let Some(pre_navigation_ms) = pre_navigation_ms {
                session_config.pre_navigation_delay_ms = pre_navigation_ms;
            }
            if let Some(correlation) = correlation {
                session_config.correlation = correlation.into();
            }
            replay(recording, session_config, output).await
        }
        cli::Command::Match { rule, candidates } => match_urls(&rule, &candidates),
    }
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = SessionConfig::from_toml(&source)
        .with_context(|| format!("parsing config {}", path.display()))?;
    tracing::info!(path = ?path, "config loaded");
    Ok(config)
}

async fn replay(recording: PathBuf, config: SessionConfig, output: Option<PathBuf>) -> Result<()> {
    let driver = ReplayDriver::from_path(&recording)
        .with_context(|| format!("loading recording {}", recording.display()))?;
    let report = loadtrace_session::run(&config, &driver).await?;
    let rendered = serde_json::to_string_pretty(&report)?;

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("writing report {}", path.display()))?;
            tracing::info!(path = ?path, "report written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn match_urls(rule: &RuleArgs, candidates: &[String]) -> Result<()> {
    let mut config = SessionConfig::default();
    rule.apply(&mut config);
    let rule = config.match_rule();
    for candidate in candidates {
        let verdict = if rule.is_of_interest(candidate) {
            "keep"
        } else {
            "drop"
        };
        println!("{verdict}\t{candidate}");
    }
    Ok(())
}

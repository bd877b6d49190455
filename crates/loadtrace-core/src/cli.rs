use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use loadtrace_session::{CorrelationPolicy, SessionConfig};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "loadtrace", version, about = "Page-load network timeline capture")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a recorded page load and print its timeline report as JSON.
    Replay {
        recording: PathBuf,
        /// TOML session config; flags below override it.
        #[arg(long, env = "LOADTRACE_CONFIG")]
        config: Option<PathBuf>,
        #[command(flatten)]
        rule: RuleArgs,
        #[arg(long)]
        quiet_ms: Option<u64>,
        #[arg(long)]
        timeout_sec: Option<u64>,
        #[arg(long)]
        pre_navigation_ms: Option<u64>,
        #[arg(long, value_enum)]
        correlation: Option<CorrelationChoice>,
        /// Write the report here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show which URLs a match rule would keep.
    Match {
        #[command(flatten)]
        rule: RuleArgs,
        candidates: Vec<String>,
    },
}

#[derive(Debug, Clone, ClapArgs)]
pub struct RuleArgs {
    /// Page URL; always kept.
    #[arg(long)]
    pub url: Option<String>,
    /// Keep URLs containing this substring (repeatable).
    #[arg(long = "filter")]
    pub filters: Vec<String>,
    /// Drop URLs containing this substring (repeatable).
    #[arg(long = "exclude")]
    pub excludes: Vec<String>,
}

impl RuleArgs {
    pub fn apply(&self, config: &mut SessionConfig) {
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if !self.filters.is_empty() {
            config.include_substrings = self.filters.clone();
        }
        if !self.excludes.is_empty() {
            config.exclude_substrings = self.excludes.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CorrelationChoice {
    Nearest,
    Earliest,
}

impl From<CorrelationChoice> for CorrelationPolicy {
    fn from(value: CorrelationChoice) -> Self {
        match value {
            CorrelationChoice::Nearest => CorrelationPolicy::Nearest,
            CorrelationChoice::Earliest => CorrelationPolicy::Earliest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_filters_replace_config_lists() {
        let args = Args::parse_from([
            "loadtrace",
            "match",
            "--url",
            "http://www.opt.ne.jp/",
            "--filter",
            "gtm.js",
            "--filter",
            ".adplan7.com/",
            "--exclude",
            ".adplan7.com/cs/",
            "https://x.adplan7.com/a.js",
        ]);
        let Command::Match { rule, candidates } = args.command else {
            panic!("expected match subcommand");
        };

        let mut config = SessionConfig::default();
        rule.apply(&mut config);
        assert_eq!(config.url, "http://www.opt.ne.jp/");
        assert_eq!(config.include_substrings, vec!["gtm.js", ".adplan7.com/"]);
        assert_eq!(config.exclude_substrings, vec![".adplan7.com/cs/"]);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let rule = RuleArgs {
            url: None,
            filters: Vec::new(),
            excludes: Vec::new(),
        };
        let mut config = SessionConfig::default();
        rule.apply(&mut config);
        assert_eq!(config, SessionConfig::default());
    }
}

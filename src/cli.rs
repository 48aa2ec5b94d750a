use std::path::PathBuf;

use anyhow::Result;
use chrono::Duration;
use clap::Parser;
use tracing::warn;

use crate::{
    config::{Config, DEFAULT_STATE_FILE, MIN_INTERVAL_MINUTES, SlackConfig},
    types::TargetHandle,
};

const BUILD_INFO_HUMAN: &str = env!("BUILD_INFO_HUMAN");

#[derive(Parser, Debug)]
#[command(
    name = "pingback",
    about = "Slack DM on GitHub mentions and replies across an organization"
)]
#[command(long_version = BUILD_INFO_HUMAN)]
struct CliArgs {
    /// GitHub organization to watch
    #[arg(long, env = "PINGBACK_ORG", value_name = "ORG")]
    pub org: String,

    /// GitHub handle to collect notifications for
    #[arg(long, env = "PINGBACK_HANDLE", value_name = "USERNAME")]
    pub handle: String,

    /// Polling interval in minutes; also the look-back window when no state exists
    #[arg(
        long,
        env = "PINGBACK_INTERVAL_MINUTES",
        default_value_t = MIN_INTERVAL_MINUTES,
        value_name = "MINUTES"
    )]
    pub interval: u32,

    /// File holding the last-checked timestamp
    #[arg(
        long,
        env = "PINGBACK_STATE_FILE",
        default_value = DEFAULT_STATE_FILE,
        value_name = "PATH"
    )]
    pub state_file: PathBuf,

    /// GitHub token (falls back to GH_TOKEN, then `gh auth token`)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub github_token: Option<String>,

    /// Slack bot token
    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub slack_token: Option<String>,

    /// Slack user ID to send the direct message to
    #[arg(long, env = "SLACK_USER_ID", value_name = "USER-ID")]
    pub slack_user: Option<String>,

    /// Print the message instead of sending it and leave the state file untouched
    #[arg(long)]
    pub dry_run: bool,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl CliArgs {
    pub fn validate(&self) -> Result<()> {
        if self.org.trim().is_empty() {
            anyhow::bail!("--org must not be empty");
        }

        if self.handle.trim().is_empty() {
            anyhow::bail!("--handle must not be empty");
        }

        if self.interval == 0 {
            anyhow::bail!("--interval must be at least 1 minute");
        }

        if !self.dry_run {
            if non_empty(&self.slack_token).is_none() {
                anyhow::bail!("--slack-token (or SLACK_BOT_TOKEN) is required unless --dry-run");
            }
            if non_empty(&self.slack_user).is_none() {
                anyhow::bail!("--slack-user (or SLACK_USER_ID) is required unless --dry-run");
            }
        }

        Ok(())
    }
}

fn build_config(cli: CliArgs) -> Result<Config> {
    cli.validate()?;

    if cli.interval < MIN_INTERVAL_MINUTES {
        warn!(
            "Interval of {} minutes is below {}; frequent runs may hit GitHub rate limits",
            cli.interval, MIN_INTERVAL_MINUTES
        );
    }

    let slack = match (non_empty(&cli.slack_token), non_empty(&cli.slack_user)) {
        (Some(token), Some(user)) => Some(SlackConfig { token, user }),
        _ => None,
    };

    Ok(Config {
        org: cli.org.trim().to_string(),
        target: TargetHandle::new(cli.handle.trim()),
        interval: Duration::minutes(i64::from(cli.interval)),
        state_file: cli.state_file,
        github_token: non_empty(&cli.github_token),
        slack,
        dry_run: cli.dry_run,
    })
}

/// Parses command-line arguments, with environment fallbacks, into a
/// validated configuration.
pub fn parse_args<I, T>(args: I) -> Result<Config>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = CliArgs::try_parse_from(args)?;
    build_config(cli)
}

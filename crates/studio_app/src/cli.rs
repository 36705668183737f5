use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::logging::LogDestination;

/// Page the client pretends to be served from when none is given.
pub const DEFAULT_PAGE_URL: &str = "https://web3growthlab.com/tool-studio.html";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tool-studio",
    about = "Submit Tool Studio jobs and follow them to completion"
)]
pub struct Cli {
    /// Location of the hosting page; its `api`, `key` and `tool` query parameters apply
    #[arg(long, default_value = DEFAULT_PAGE_URL)]
    pub page_url: String,
    /// Backend origin override (same as `?api=`)
    #[arg(long)]
    pub api: Option<String>,
    /// Access key to store and send (same as `?key=`)
    #[arg(long)]
    pub key: Option<String>,
    /// Backup origin used after a connection failure against the primary
    #[arg(long)]
    pub backup_origin: Option<String>,
    /// Directory holding the persisted access key
    #[arg(long, default_value = ".")]
    pub state_dir: PathBuf,
    /// Where log records go
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,
    /// Log at debug level
    #[arg(long, short)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Submit a job and poll it until it finishes
    Run(RunArgs),
    /// Query the backend health endpoint
    Health,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Tool to run (same as `?tool=`)
    #[arg(long)]
    pub tool: Option<String>,
    /// Form field as key=value; repeatable
    #[arg(long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
    /// Download artifacts of a completed job into this directory
    #[arg(long)]
    pub download_dir: Option<PathBuf>,
    /// Delay between status polls
    #[arg(long, default_value_t = 1250)]
    pub poll_interval_ms: u64,
    /// Give up after this many consecutive "not yet available" replies
    #[arg(long)]
    pub max_not_ready_polls: Option<u32>,
    /// Request timeout in seconds; transport default when unset
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty field name in {raw:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_split_on_first_equals() {
        assert_eq!(
            parse_field("competitor_context=a=b").unwrap(),
            ("competitor_context".to_string(), "a=b".to_string())
        );
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn run_command_parses() {
        let cli = Cli::try_parse_from([
            "tool-studio",
            "--api",
            "http://127.0.0.1:9000",
            "run",
            "--tool",
            "protocol-positioning",
            "--field",
            "url=example.com",
        ])
        .unwrap();
        let Command::Run(run) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(run.tool.as_deref(), Some("protocol-positioning"));
        assert_eq!(run.fields, vec![("url".to_string(), "example.com".to_string())]);
        assert_eq!(run.poll_interval_ms, 1250);
        assert_eq!(cli.page_url, DEFAULT_PAGE_URL);
    }
}

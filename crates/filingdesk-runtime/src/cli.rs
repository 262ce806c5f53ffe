//! CLI definition using clap derive.

use std::path::Path;

use clap::{Parser, Subcommand};

use filingdesk_core::TransportConfig;

#[derive(Parser)]
#[command(name = "filingdesk", about = "disclosure dashboard transport client")]
pub struct Cli {
    /// TOML transport config (reconnect, retry, heartbeat, timeouts)
    #[arg(long, short = 'c', global = true, env = "FILINGDESK_CONFIG")]
    pub config: Option<String>,

    /// REST API base URL
    #[arg(long, global = true, env = "FILINGDESK_API_BASE", default_value = "http://127.0.0.1:8000/api")]
    pub api_base: String,

    /// Realtime alert channel URL
    #[arg(long, global = true, env = "FILINGDESK_WS_URL", default_value = "ws://127.0.0.1:8000/ws/alerts")]
    pub ws_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Stream alerts as JSON lines until Ctrl-C
    Watch(WatchOpts),
    /// GET a path through the retrying client and print the JSON body
    Get(GetOpts),
}

#[derive(clap::Args)]
pub struct WatchOpts {
    /// Exit when the connection drops instead of reconnecting
    #[arg(long)]
    pub no_reconnect: bool,
}

#[derive(clap::Args)]
pub struct GetOpts {
    /// Path relative to the API base, e.g. /insider-trades
    pub path: String,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "query", short = 'q', value_parser = parse_key_val)]
    pub query: Vec<(String, String)>,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

/// Load the transport config, or defaults when no path is given.
pub fn load_config(path: Option<&str>) -> anyhow::Result<TransportConfig> {
    match path {
        Some(p) => Ok(TransportConfig::load(Path::new(p))?),
        None => Ok(TransportConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_val_parsing() {
        assert_eq!(
            parse_key_val("ticker=ACME").unwrap(),
            ("ticker".to_string(), "ACME".to_string())
        );
        assert_eq!(
            parse_key_val("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn get_with_queries_parses() {
        let cli = Cli::try_parse_from([
            "filingdesk",
            "get",
            "/congress-trades",
            "-q",
            "chamber=house",
            "--query",
            "limit=10",
        ])
        .unwrap();
        match cli.command {
            Command::Get(opts) => {
                assert_eq!(opts.path, "/congress-trades");
                assert_eq!(opts.query.len(), 2);
            }
            Command::Watch(_) => panic!("expected get"),
        }
    }

    #[test]
    fn watch_flag_parses() {
        let cli = Cli::try_parse_from(["filingdesk", "watch", "--no-reconnect"]).unwrap();
        assert!(matches!(cli.command, Command::Watch(WatchOpts { no_reconnect: true })));
    }

    #[test]
    fn no_config_path_is_default() {
        assert_eq!(load_config(None).unwrap(), TransportConfig::default());
    }
}

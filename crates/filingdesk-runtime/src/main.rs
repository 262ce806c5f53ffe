//! filingdesk: drives the dashboard transport layer from the command line.
//! `watch` mounts the realtime alert channel; `get` issues a request through
//! the retrying client.

use clap::Parser;

mod cli;
mod cmd_get;
mod cmd_watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("FILINGDESK_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = cli::load_config(args.config.as_deref())?;

    match args.command {
        cli::Command::Watch(opts) => {
            cmd_watch::cmd_watch(&args.ws_url, &config, opts.no_reconnect).await?;
        }
        cli::Command::Get(opts) => {
            let ok = cmd_get::cmd_get(&args.api_base, &config, &opts.path, &opts.query).await?;
            if !ok {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

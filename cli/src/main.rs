use crate::opts::{Command, Opts};
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod command;
mod opts;

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();

    try_init_tracing_subscriber()?;

    match opts.command {
        Command::Decode(cmd) => command::decode::decode(cmd).await?,
        Command::Frame(cmd) => command::frame::frame(cmd)?,
    }

    Ok(())
}

fn try_init_tracing_subscriber() -> Result<()> {
    let builder = tracing_subscriber::fmt::Subscriber::builder();
    let env_filter = std::env::var(EnvFilter::DEFAULT_ENV)
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = builder
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    let subscriber = builder.finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

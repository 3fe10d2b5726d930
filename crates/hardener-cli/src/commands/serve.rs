use anyhow::{Context, Result};
use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;

use hardener_server::AppState;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Config file supplying the assessor and generator sections
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    hardener_server::serve(args.bind, AppState::new(config))
        .await
        .with_context(|| format!("serving on {}", args.bind))
}

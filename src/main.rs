use std::net::SocketAddr;

use clap::Parser;
use eyre::Result;
use log::info;

mod cli;

use cli::Cli;
use songstash::config::Config;
use songstash::pipeline::Pipeline;
use songstash::server;

fn setup_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    let port = cli.port.unwrap_or(config.settings.port);

    let pipeline = Pipeline::from_config(&config);
    let app = server::router(pipeline);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

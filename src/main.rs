mod app;
mod cli;
mod config;
mod domain;
mod engine;
mod fetch;
mod infrastructure;
mod matcher;
mod navigation;
mod platforms;
mod rules;
mod tabular;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use infrastructure::{directories, logging, pause::TokioPause};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = config::load_config()?;

    match cli.command {
        Command::Platforms { json } => app::list_platforms(json),
        Command::Check(args) => {
            args.apply(&mut config)?;
            let paths = directories::ensure_directories(&config.directories)?;
            logging::init_tracing(&config.logging, &paths)?;

            let app = app::AccessCheckApp::initialize(config, &args)?;
            let mut session = app.open_session().await?;
            app.run(session.as_mut(), &TokioPause).await?;
            Ok(())
        }
    }
}

pub mod commands;
pub mod dispatch;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "testpilot")]
#[command(version, about = "Record browser interactions as end-to-end tests")]
#[command(
    long_about = "Records clicks in a Chrome window and compiles them into Cypress or Playwright test scripts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<commands::Command>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Run Chrome in headless mode")]
    pub headless: Option<bool>,

    #[arg(long, global = true, help = "Path to Chrome executable")]
    pub chrome_path: Option<PathBuf>,
}

pub async fn run() -> crate::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(config_path) => crate::config::Config::from_file(config_path)?,
        None => crate::config::Config::load()?,
    };

    let artifacts_dir = match &cli.command {
        Some(commands::Command::Record { artifacts_dir, .. }) => artifacts_dir.clone(),
        _ => None,
    };

    let overrides = crate::config::ConfigOverrides {
        headless: cli.headless,
        chrome_path: cli.chrome_path.clone(),
        json: cli.json.then_some(true),
        dialect: None,
        artifacts_dir,
    };

    let config = config.load_with_overrides(overrides);
    config.validate()?;

    dispatch::dispatch(cli, config).await
}

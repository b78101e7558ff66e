use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::run::RunArgs;

mod config;
mod report;
mod run;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generates scenarios and compares optimizers on them
    Run {
        #[command(flatten)]
        args: RunArgs,
    },
    /// Prints the default experiment configuration
    Config,
}

fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Some(Commands::Run { args }) => run::run(args)?,
        Some(Commands::Config) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&config::ExperimentConfig::default())?
            );
        }
        None => {}
    }

    Ok(())
}

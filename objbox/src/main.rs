mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use objbox::observability;
use objbox_core::config::Config;

fn main() -> Result<()> {
    observability::init_tracing();
    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Register {
            name,
            run_script,
            factory,
            force,
        } => commands::register(&config, &name, run_script, factory, force),
        Commands::Delete { name } => commands::delete(&config, &name),
        Commands::List {
            include_provisionable,
        } => commands::list(&config, include_provisionable),
        Commands::SetObserver { run_script } => commands::set_observer(&config, run_script),
        Commands::DeleteObserver => commands::delete_observer(&config),
        Commands::Install { name } => commands::install(&config, &name),
        Commands::Child {
            factory,
            port,
            secret,
        } => commands::child(&factory, port, &secret),
        Commands::Create {
            name,
            seed,
            force_isolation,
            yes,
        } => commands::create(&config, &name, seed, force_isolation, yes),
    }
}

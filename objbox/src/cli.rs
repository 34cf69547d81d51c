use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ObjBox - a lightweight isolation and evaluation engine for black-box
/// objective functions
#[derive(Parser, Debug)]
#[command(name = "objbox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a problem under a name
    Register {
        /// Problem name
        #[arg(value_name = "NAME")]
        name: String,

        /// Run script to launch the problem's isolated process
        /// (must accept port and secret as its first two arguments)
        #[arg(long, value_name = "PATH", conflicts_with = "factory")]
        run_script: Option<PathBuf>,

        /// Generate a run script for a built-in factory instead
        #[arg(long, value_name = "FACTORY")]
        factory: Option<String>,

        /// Overwrite an existing registration
        #[arg(long, default_value = "false")]
        force: bool,
    },

    /// Remove a registered problem
    Delete {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// List known problems
    List {
        /// Also show problems that could be installed from the repository
        #[arg(long, default_value = "false")]
        include_provisionable: bool,
    },

    /// Set the global observer run script
    SetObserver {
        #[arg(value_name = "PATH")]
        run_script: PathBuf,
    },

    /// Clear the global observer run script
    DeleteObserver,

    /// Build a problem's isolated environment and self-register it
    Install {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Serve one black box over the wire protocol (run-script entrypoint)
    Child {
        /// Factory name from the compile-time catalog
        #[arg(long, value_name = "FACTORY")]
        factory: String,

        /// Port the caller is listening on
        #[arg(value_name = "PORT")]
        port: u16,

        /// Shared channel secret
        #[arg(value_name = "SECRET")]
        secret: String,
    },

    /// Create a problem and print its initial design (smoke check)
    Create {
        #[arg(value_name = "NAME")]
        name: String,

        /// Seed for randomized problems
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Run isolated even if the problem is in the local catalog
        #[arg(long, default_value = "false")]
        force_isolation: bool,

        /// Provision without asking for confirmation
        #[arg(long, short = 'y', default_value = "false")]
        yes: bool,
    },
}

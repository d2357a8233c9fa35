pub mod status;
pub mod watch;

use clap::{Parser, Subcommand};
use reachr_common::target::Target;

#[derive(Parser)]
#[command(name = "reachr")]
#[command(about = "Report and watch network reachability.")]
pub struct CommandLine {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report the current reachability of a target once
    #[command(alias = "s")]
    Status {
        /// "internet", "local-wifi", an IPv4 address, or a host name
        target: Target,
    },
    /// Watch a target and print every reachability change until Ctrl-C
    #[command(alias = "w")]
    Watch {
        /// "internet", "local-wifi", an IPv4 address, or a host name
        target: Target,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

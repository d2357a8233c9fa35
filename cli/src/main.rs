mod commands;
mod terminal;

use commands::{CommandLine, Commands, status, watch};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    terminal::logging::init(commands.verbose);

    match commands.command {
        Commands::Status { target } => status::status(&target),
        Commands::Watch { target } => watch::watch(target).await,
    }
}

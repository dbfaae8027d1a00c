mod commands;
mod terminal;

use commands::{CommandLine, Commands, check, watch};
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging();

    match commands.command {
        Commands::Check { args } => check::check(args).await,
        Commands::Watch {
            args,
            interval,
            no_input,
        } => watch::watch(args, interval, no_input).await,
    }
}

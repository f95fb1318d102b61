use clap::{Args, Subcommand};

use super::Ctx;
use crate::Result;

pub(super) mod config;
pub(super) mod console;
pub(super) mod run;
pub(super) mod top;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to IRC and serve the ladder.
    Run,

    /// Talk to the ladder over stdin/stdout without IRC.
    Console(ConsoleArgs),

    /// Print the standings from the saved ladder.
    Top(TopArgs),

    /// Print the effective configuration.
    Config,
}

#[derive(Args, Debug)]
pub struct ConsoleArgs {
    /// Nick to send commands as.
    #[arg(long = "as", value_name = "NICK")]
    pub nick: String,
}

#[derive(Args, Debug)]
pub struct TopArgs {
    /// Number of players (default: ladder.top_count).
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

pub(super) fn dispatch(ctx: &Ctx, command: Commands) -> Result<()> {
    match command {
        Commands::Run => run::handle(ctx),
        Commands::Console(args) => console::handle(ctx, &args),
        Commands::Top(args) => top::handle(ctx, &args),
        Commands::Config => config::handle(ctx),
    }
}

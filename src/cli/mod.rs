//! CLI surface for elobot.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::Result;
use crate::config::{self, Config};

mod commands;

pub use commands::Commands;

#[derive(Parser, Debug)]
#[command(
    name = "elobot",
    version,
    about = "Elo ladder bot for IRC channels",
    infer_subcommands = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Extra config file, layered over the user config.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Machine-readable JSON output where supported.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// More log output (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Loads the merged config for this invocation. `run` refuses to start
    /// on a broken config and seeds the user config file; other commands
    /// fall back to defaults with a note on stderr.
    pub fn load_config(&self) -> std::result::Result<Config, config::ConfigError> {
        let extra = self.config.as_deref();
        if matches!(self.command, Commands::Run) {
            let mut cfg = config::load_or_init(extra)?;
            crate::telemetry::apply_daemon_logging_defaults(&mut cfg.logging);
            return Ok(cfg);
        }
        Ok(config::load(extra).unwrap_or_else(|err| {
            eprintln!("config load failed, using defaults: {err}");
            let mut cfg = Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }))
    }
}

pub(crate) struct Ctx {
    pub config: Config,
    pub json: bool,
}

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::parse_from(args)
}

/// Run the CLI (used by bin).
pub fn run(cli: Cli, config: Config) -> Result<()> {
    let ctx = Ctx {
        config,
        json: cli.json,
    };
    commands::dispatch(&ctx, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_console_and_top() {
        let cli = parse_from(["elobot", "console", "--as", "alice"]);
        assert!(matches!(cli.command, Commands::Console(ref args) if args.nick == "alice"));

        let cli = parse_from(["elobot", "-vv", "top", "--count", "3", "--json"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Top(ref args) if args.count == Some(3)));
    }
}

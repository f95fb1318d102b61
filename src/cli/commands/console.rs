use std::io;

use super::super::Ctx;
use super::ConsoleArgs;
use crate::Result;

pub(crate) fn handle(ctx: &Ctx, args: &ConsoleArgs) -> Result<()> {
    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    crate::daemon::run_console(&ctx.config, &args.nick, stdin, stdout)
}

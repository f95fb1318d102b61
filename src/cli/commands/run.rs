use super::super::Ctx;
use crate::Result;

pub(crate) fn handle(ctx: &Ctx) -> Result<()> {
    tracing::info!(
        server = %ctx.config.irc.server,
        port = ctx.config.irc.port,
        channel = %ctx.config.irc.channel,
        nickname = %ctx.config.irc.nickname,
        "starting elobot"
    );
    crate::daemon::run_bot(&ctx.config)
}

use std::io::{self, Write};

use serde::Serialize;

use super::super::Ctx;
use super::TopArgs;
use crate::Result;
use crate::daemon::{SnapshotStore, standings_lines};

#[derive(Serialize)]
struct Standing<'a> {
    rank: usize,
    name: &'a str,
    rating: i64,
    games: u64,
    wins: u64,
    losses: u64,
    draws: u64,
}

/// Reads the snapshot without taking the lock; a running bot may hold it.
pub(crate) fn handle(ctx: &Ctx, args: &TopArgs) -> Result<()> {
    let count = args.count.unwrap_or(ctx.config.ladder.top_count);
    let state = SnapshotStore::new(ctx.config.state_file()).load()?;
    let mut out = io::stdout().lock();

    if ctx.json {
        let rows: Vec<Standing<'_>> = state
            .standings(count)
            .into_iter()
            .enumerate()
            .map(|(rank, (name, player))| Standing {
                rank: rank + 1,
                name: name.as_str(),
                rating: player.rating(),
                games: player.games(),
                wins: player.wins(),
                losses: player.losses(),
                draws: player.draws(),
            })
            .collect();
        let json = serde_json::to_string_pretty(&rows).map_err(io::Error::other)?;
        writeln!(out, "{json}")?;
        return Ok(());
    }

    for line in standings_lines(&state, count) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

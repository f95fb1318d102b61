//! Process wiring for `elobot run` and `elobot console`.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use crate::Result;
use crate::config::Config;
use crate::irc::IrcClient;

use super::calendar::SystemCalendar;
use super::processor::{Inbound, LadderSettings, Processor, Reply};
use super::server::run_state_loop;
use super::snapshot::SnapshotStore;
use super::store_lock::StoreLock;

/// Serve the configured channel until SIGINT/SIGTERM.
pub fn run_bot(config: &Config) -> Result<()> {
    let (lock, processor) = open_ladder(config)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGTERM, shutdown.clone())?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, shutdown.clone())?;

    let (inbound_tx, inbound_rx) = crossbeam::channel::unbounded::<Inbound>();
    let (reply_tx, reply_rx) = crossbeam::channel::unbounded::<Reply>();
    let (stop_tx, stop_rx) = crossbeam::channel::bounded::<()>(1);

    let state_handle = thread::Builder::new()
        .name("ladder-state".into())
        .spawn(move || run_state_loop(processor, inbound_rx, reply_tx, stop_rx))?;

    let client = IrcClient::new(config.irc.clone(), shutdown);
    client.run(&inbound_tx, &reply_rx);
    info!("shutdown requested");

    let _ = stop_tx.send(());
    drop(inbound_tx);
    let _ = state_handle.join();

    lock.release()?;
    info!("stopped");
    Ok(())
}

/// Feed stdin lines through the processor as `nick`, in the configured
/// channel. Replies are written as `<target> <text>`; private ones get a
/// `-notice-` marker.
pub fn run_console<R, W>(config: &Config, nick: &str, input: R, mut output: W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let (lock, mut processor) = open_ladder(config)?;
    let channel = config.irc.channel.as_str();

    for line in input.lines() {
        let line = line?;
        let text = line.trim_end_matches('\r');
        for reply in processor.handle(&Inbound::new(nick, channel, text)) {
            match &reply {
                Reply::Say { target, text } => writeln!(output, "{target} {text}")?,
                Reply::Notice { target, text } => writeln!(output, "-notice- {target} {text}")?,
            }
        }
        output.flush()?;
    }

    lock.release()?;
    Ok(())
}

fn open_ladder(config: &Config) -> Result<(StoreLock, Processor)> {
    let path = config.state_file();
    let lock = StoreLock::acquire(&path, now_ms())?;
    let store = SnapshotStore::new(&path);
    let state = store.load_or_recover();
    info!(
        path = %path.display(),
        players = state.registry().len(),
        pending = state.ledger().pending().len(),
        next_id = %state.ledger().next_id(),
        "ladder loaded"
    );
    let processor = Processor::new(
        state,
        store,
        SystemCalendar,
        LadderSettings::from(&config.ladder),
    );
    Ok((lock, processor))
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

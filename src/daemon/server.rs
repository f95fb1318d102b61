//! The state thread.
//!
//! This is the serialization point: the processor is owned here and every
//! inbound line is handled to completion, commit included, before the
//! next one is received.

use crossbeam::channel::{Receiver, Sender};
use tracing::{debug, info};

use super::calendar::Calendar;
use super::processor::{Inbound, Processor, Reply};
use super::snapshot::SnapshotSink;

/// Runs until `inbound` disconnects or `shutdown` fires. Returns the
/// processor so the caller can inspect final state.
pub fn run_state_loop<S, C>(
    mut processor: Processor<S, C>,
    inbound: Receiver<Inbound>,
    replies: Sender<Reply>,
    shutdown: Receiver<()>,
) -> Processor<S, C>
where
    S: SnapshotSink,
    C: Calendar,
{
    loop {
        crossbeam::select! {
            recv(inbound) -> msg => {
                let Ok(msg) = msg else {
                    debug!("inbound closed");
                    break;
                };
                for reply in processor.handle(&msg) {
                    if replies.send(reply).is_err() {
                        debug!("reply channel closed");
                        return processor;
                    }
                }
            }
            recv(shutdown) -> _ => {
                // Finish what the transport already handed over.
                for msg in inbound.try_iter() {
                    for reply in processor.handle(&msg) {
                        let _ = replies.send(reply);
                    }
                }
                info!("state loop stopping");
                break;
            }
        }
    }
    processor
}

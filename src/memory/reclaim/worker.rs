/*!
 * Reclaim Worker
 *
 * One named thread per allocator. Dropping an unreleased `Handle` queues a
 * `ReclaimNotice`; the worker performs a ticket-checked release for each one.
 *
 * The worker only holds a `Weak` to the allocator state. It never keeps the
 * allocator alive, and it ends when the state (the channel's only sender) is
 * dropped. A panic while handling one notice is caught and counted; the loop
 * keeps going, otherwise automatic reclamation would silently stop for the
 * rest of the allocator's life.
 */

use crate::core::types::{Address, AllocatorId, Ticket};
use crate::memory::manager::AllocatorState;
use crate::memory::types::{panic_message, ReclaimFault, ReleaseCause};
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::thread;
use tracing::{debug, info};

/// A dropped handle's address and the ticket it was issued with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReclaimNotice {
    pub address: Address,
    pub ticket: Ticket,
}

/// Messages for the reclaim worker
pub(crate) enum WorkerMessage {
    /// Release a dropped handle's block
    Reclaim(ReclaimNotice),
    /// Acknowledge once every earlier message has been handled
    Barrier(flume::Sender<()>),
}

/// Start the reclaim worker for `state`
pub(crate) fn spawn_worker(
    state: &Arc<AllocatorState>,
    inbox: flume::Receiver<WorkerMessage>,
) -> io::Result<()> {
    let allocator = state.id;
    let weak = Arc::downgrade(state);
    let name = format!("{}-{}", state.config.worker_name, allocator);

    thread::Builder::new()
        .name(name.clone())
        .spawn(move || run(allocator, weak, inbox))?;

    info!(allocator, thread = %name, "Reclaim worker spawned");
    Ok(())
}

fn run(allocator: AllocatorId, state: Weak<AllocatorState>, inbox: flume::Receiver<WorkerMessage>) {
    debug!(allocator, "Reclaim loop started");

    for message in inbox.iter() {
        match message {
            WorkerMessage::Reclaim(notice) => {
                let Some(state) = state.upgrade() else {
                    // State is mid-drop; its teardown sweep frees what is left
                    break;
                };
                handle_notice(&state, notice);
            }
            WorkerMessage::Barrier(ack) => {
                let _ = ack.send(());
            }
        }
    }

    debug!(allocator, "Reclaim loop stopped");
}

/// Ticket-checked release of one notice, panics contained
pub(crate) fn handle_notice(state: &AllocatorState, notice: ReclaimNotice) {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        state.release_block(notice.address, Some(notice.ticket), ReleaseCause::Reclaimed)
    }));

    if let Err(payload) = outcome {
        state.record_fault(&ReclaimFault::NoticePanicked {
            address: notice.address,
            message: panic_message(payload.as_ref()),
        });
    }
}

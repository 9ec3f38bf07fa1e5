/*!
 * Reclamation
 * Background release of blocks whose handles were dropped without `free`
 */

mod worker;

pub use worker::ReclaimNotice;
pub(crate) use worker::{handle_notice, spawn_worker, WorkerMessage};

//! Queue between the network task and the control loop.
//!
//! The remote side pushes [`RemoteCommand`]s from its own task; the main
//! loop drains them once per tick with
//! [`AppService::drain_remote`](super::service::AppService::drain_remote).
//! The channel is bounded and never blocks the sender: when the control
//! loop falls behind, new commands are dropped and reported.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use super::commands::RemoteCommand;

/// Commands buffered between two control ticks.
pub const REMOTE_QUEUE_DEPTH: usize = 8;

pub type RemoteQueue = Channel<CriticalSectionRawMutex, RemoteCommand, REMOTE_QUEUE_DEPTH>;

/// Process-wide queue used by the firmware binary.
pub static REMOTE_QUEUE: RemoteQueue = Channel::new();

/// Enqueue without blocking.  Returns `false` if the queue was full.
pub fn submit(queue: &RemoteQueue, cmd: RemoteCommand) -> bool {
    match queue.try_send(cmd) {
        Ok(()) => true,
        Err(_) => {
            warn!("remote: queue full, dropping {:?}", cmd);
            false
        }
    }
}

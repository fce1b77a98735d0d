//! Inbound commands from the remote-control collaborator.
//!
//! Each variant maps to one remote operation on
//! [`AppService`](super::service::AppService).  An accepted command has
//! the same downstream effect as the equivalent encoder input.

use crate::mixing::Liquid;
use crate::mixing::bottles::Bottle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Move one mixer boundary by a signed number of degrees (|deg| ≤ 360).
    AdjustAngle { liquid: Liquid, degrees: i32 },

    /// New duty-cycle length in ms, within the profile bounds.
    SetCycleLength(u32),

    /// Put a bottle type into a slot (pour devices only).
    AssignBottle { slot: usize, bottle: Bottle },
}

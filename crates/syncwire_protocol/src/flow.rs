//! Synchronization direction and participant roles.

use std::fmt;
use thiserror::Error;

/// Raised when a status half does not name a known flow.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown flow code: {0}")]
pub struct InvalidFlowCode(pub u32);

/// Direction of a synchronization run.
///
/// Chosen by the initiator, carried in the start-flow packet and adopted
/// verbatim by the responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum Flow {
    /// Not chosen yet. A responder starts with this value.
    #[default]
    Unknown = 0,
    /// The initiator publishes its objects to the responder.
    Push = 1,
    /// The initiator subscribes to the responder's objects.
    Pull = 2,
}

impl Flow {
    /// Returns the wire value.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Returns `true` once a direction has been chosen.
    pub const fn is_known(self) -> bool {
        !matches!(self, Flow::Unknown)
    }

    /// Derives the role of a participant in this flow.
    ///
    /// Returns `None` for [`Flow::Unknown`].
    pub const fn role(self, is_initiator: bool) -> Option<Role> {
        match (self, is_initiator) {
            (Flow::Pull, true) | (Flow::Push, false) => Some(Role::Subscriber),
            (Flow::Pull, false) | (Flow::Push, true) => Some(Role::Publisher),
            (Flow::Unknown, _) => None,
        }
    }
}

impl TryFrom<u32> for Flow {
    type Error = InvalidFlowCode;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Flow::Unknown),
            1 => Ok(Flow::Push),
            2 => Ok(Flow::Pull),
            other => Err(InvalidFlowCode(other)),
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Flow::Unknown => "unknown",
            Flow::Push => "push",
            Flow::Pull => "pull",
        })
    }
}

/// Which side of the object set a participant holds for the current flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Serves the authoritative object set and sends the data stream.
    Publisher,
    /// Requests or receives objects and consumes the data stream.
    Subscriber,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Publisher => "publisher",
            Role::Subscriber => "subscriber",
        })
    }
}

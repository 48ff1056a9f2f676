//! Device event records and their validation.
//!
//! The host hands events to the guest as [`EventFrame`]s. A frame carries a
//! [`RawEvent`] whose fields are untrusted; [`EventRecord::try_from`] turns it
//! into a well-formed record or rejects it with a [`MalformedEvent`], and
//! [`EventRecord::route`] decides which dispatcher (if any) receives it.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use thiserror::Error;

use crate::error::EmberResult;

/// Classification of an event or a callback registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResourceKind {
    Timer = 0,
    Gpio = 1,
    /// Known to the runtime, never dispatched by the guest.
    Sensor = 2,
}

impl ResourceKind {
    /// Number of recognized kinds. Raw kinds at or above this are invalid.
    pub const COUNT: i32 = 3;

    /// Raw integer value used on the wire.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Map a wire value to a kind.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Timer),
            1 => Some(Self::Gpio),
            2 => Some(Self::Sensor),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timer => f.write_str("timer"),
            Self::Gpio => f.write_str("gpio"),
            Self::Sensor => f.write_str("sensor"),
        }
    }
}

/// Logic level of a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum PinState {
    Reset = 0,
    Set = 1,
}

impl PinState {
    /// Map a raw state to a pin level.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Reset),
            1 => Some(Self::Set),
            _ => None,
        }
    }

    /// Raw integer value used on the wire.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// An event exactly as the host wrote it. Nothing here is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BorshSerialize, BorshDeserialize)]
pub struct RawEvent {
    pub kind: i32,
    pub id: i32,
    pub port: i32,
    pub state: i32,
}

impl RawEvent {
    #[must_use]
    pub const fn new(kind: i32, id: i32, port: i32, state: i32) -> Self {
        Self {
            kind,
            id,
            port,
            state,
        }
    }
}

/// Wire layout of the `ember_fetch_event` result: a status word followed by
/// the four event fields, all little-endian `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct EventFrame {
    pub status: i32,
    pub event: RawEvent,
}

impl EventFrame {
    /// Encoded size of a frame that carries an event.
    pub const LEN: usize = 20;

    /// Frame carrying `event` with a success status.
    #[must_use]
    pub const fn with_event(event: RawEvent) -> Self {
        Self { status: 0, event }
    }

    /// Encode the frame as the host would write it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EmberError::BorshError`] if encoding fails.
    pub fn to_bytes(&self) -> EmberResult<Vec<u8>> {
        Ok(borsh::to_vec(self)?)
    }

    /// Decode a fetched buffer.
    ///
    /// An empty buffer or a nonzero status means no event was available and
    /// yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EmberError::BorshError`] if the buffer is not a
    /// complete frame.
    pub fn decode(bytes: &[u8]) -> EmberResult<Option<RawEvent>> {
        if bytes.is_empty() {
            return Ok(None);
        }
        // A failing host may send the status word alone.
        if let Some(head) = bytes.get(..4)
            && borsh::from_slice::<i32>(head)? != 0
        {
            return Ok(None);
        }
        let frame: Self = borsh::from_slice(bytes)?;
        Ok(Some(frame.event))
    }
}

/// Why a fetched event was discarded before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedEvent {
    #[error("unknown resource type {0}")]
    UnknownKind(i32),
    #[error("negative id {0}")]
    NegativeId(i32),
    #[error("negative port {0}")]
    NegativePort(i32),
    #[error("gpio state {0} is neither reset nor set")]
    InvalidPinState(i32),
}

/// A well-formed event: recognized kind, non-negative id and port, and for
/// GPIO a valid pin state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    kind: ResourceKind,
    id: i32,
    port: i32,
    state: i32,
}

impl EventRecord {
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[must_use]
    pub fn id(&self) -> i32 {
        self.id
    }

    #[must_use]
    pub fn port(&self) -> i32 {
        self.port
    }

    #[must_use]
    pub fn state(&self) -> i32 {
        self.state
    }

    /// Decide where this record goes.
    ///
    /// Timer events are only routed from port 0; GPIO events from any port.
    #[must_use]
    pub fn route(&self) -> Route {
        match self.kind {
            ResourceKind::Timer if self.port == 0 => Route::Timer { id: self.id },
            ResourceKind::Gpio => match PinState::from_code(self.state) {
                Some(state) => Route::Gpio {
                    pin: self.id,
                    state,
                    port: self.port,
                },
                None => Route::Unrouted,
            },
            _ => Route::Unrouted,
        }
    }
}

impl TryFrom<RawEvent> for EventRecord {
    type Error = MalformedEvent;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let kind = ResourceKind::from_code(raw.kind).ok_or(MalformedEvent::UnknownKind(raw.kind))?;
        if raw.id < 0 {
            return Err(MalformedEvent::NegativeId(raw.id));
        }
        if raw.port < 0 {
            return Err(MalformedEvent::NegativePort(raw.port));
        }
        if kind == ResourceKind::Gpio && PinState::from_code(raw.state).is_none() {
            return Err(MalformedEvent::InvalidPinState(raw.state));
        }
        Ok(Self {
            kind,
            id: raw.id,
            port: raw.port,
            state: raw.state,
        })
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type={}, id={}, port={}, state={}",
            self.kind, self.id, self.port, self.state
        )
    }
}

/// Dispatch target of a well-formed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Timer { id: i32 },
    Gpio { pin: i32, state: PinState, port: i32 },
    /// Well-formed but no dispatcher handles it (sensor events, timer events
    /// on a non-zero port).
    Unrouted,
}

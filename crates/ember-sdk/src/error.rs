//! Error and status types shared by every SDK operation.

use thiserror::Error;

use crate::event::ResourceKind;

/// Core error type for SDK operations.
#[derive(Error, Debug)]
pub enum EmberError {
    /// An id, pin or port is out of range, or the callback is absent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Every GPIO slot is taken by a distinct (pin, port) key.
    #[error("No free GPIO callback slot (capacity {capacity})")]
    ResourceExhausted {
        /// Fixed registry capacity.
        capacity: usize,
    },
    /// Unregistration of a key that has no callback.
    #[error("No callback registered for {0}")]
    NotFound(String),
    /// The host refused to bind a dispatcher for a resource kind.
    #[error("Host failed to register {kind} dispatcher (status {status})")]
    HostCallFailed {
        /// Resource kind whose dispatcher was being registered.
        kind: ResourceKind,
        /// Status code as returned by the host, unmodified.
        status: i32,
    },
    /// The host rejected a suspend request.
    #[error("Host rejected suspend (status {status})")]
    SuspendFailed {
        /// Status code as returned by the host.
        status: i32,
    },
    /// The host import itself failed inside the runtime.
    #[cfg(target_arch = "wasm32")]
    #[error("Host function call failed: {0}")]
    HostError(#[from] extism_pdk::Error),
    /// A frame crossing the boundary could not be decoded.
    #[error("Borsh serialization error: {0}")]
    BorshError(#[from] std::io::Error),
    /// Configuration payload was not valid JSON for the expected shape.
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    /// Configuration decoded but violates a constraint.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// Offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

impl EmberError {
    /// Status code reported across the C-style boundary for this error.
    ///
    /// Host failures keep the host's own code.
    #[must_use]
    pub fn status_code(&self) -> i32 {
        match self {
            Self::NotFound(_) => Status::NotFound.code(),
            Self::HostCallFailed { status, .. } | Self::SuspendFailed { status } => *status,
            _ => Status::Invalid.code(),
        }
    }
}

/// A specialized Result type for SDK operations.
pub type EmberResult<T> = Result<T, EmberError>;

/// Numeric status codes understood by the device runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Success = 0,
    Invalid = -1,
    Timeout = -2,
    NotFound = -3,
    Busy = -4,
    NoMemory = -5,
}

impl Status {
    /// Raw integer value.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Map a raw integer back to a known status.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            -1 => Some(Self::Invalid),
            -2 => Some(Self::Timeout),
            -3 => Some(Self::NotFound),
            -4 => Some(Self::Busy),
            -5 => Some(Self::NoMemory),
            _ => None,
        }
    }
}

/// Conversion of an application entry point's return value into the status
/// code handed back to the host.
pub trait IntoStatus {
    /// Collapse `self` into a raw status code.
    fn into_status(self) -> i32;
}

impl IntoStatus for () {
    fn into_status(self) -> i32 {
        Status::Success.code()
    }
}

impl IntoStatus for Status {
    fn into_status(self) -> i32 {
        self.code()
    }
}

impl<T> IntoStatus for EmberResult<T> {
    fn into_status(self) -> i32 {
        match self {
            Ok(_) => Status::Success.code(),
            Err(e) => e.status_code(),
        }
    }
}

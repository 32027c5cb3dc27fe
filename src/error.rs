//! Unified error types for the Skynode firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level boot path's error handling uniform. All variants are `Copy`
//! so they can be passed across task boundaries without allocation.
//!
//! None of these errors is fatal to the system as a whole: a component
//! whose `start()` fails stays inert while its siblings keep running.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The scheduler could not create a task (thread spawn failed, or a
    /// resource held by a previous unacknowledged task is unavailable).
    Spawn(&'static str),
    /// WiFi credentials failed syntactic validation.
    Credentials(CredentialsError),
    /// A radio-link operation failed.
    Link(LinkError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(msg) => write!(f, "task spawn: {msg}"),
            Self::Credentials(e) => write!(f, "credentials: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Credential errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsError {
    /// SSID must be 1-32 printable ASCII bytes.
    InvalidSsid,
    /// Password must be 8-64 bytes for WPA2, or empty for open networks.
    InvalidPassword,
}

impl fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
        }
    }
}

impl From<CredentialsError> for Error {
    fn from(e: CredentialsError) -> Self {
        Self::Credentials(e)
    }
}

// ---------------------------------------------------------------------------
// Radio link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The association request could not be issued.
    AssociateFailed,
    /// The radio driver is not available (still held by a task that did
    /// not acknowledge its stop request).
    RadioUnavailable,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssociateFailed => write!(f, "association request failed"),
            Self::RadioUnavailable => write!(f, "radio driver unavailable"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

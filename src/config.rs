//! System configuration parameters.
//!
//! All tunable timing for the Skynode tasks lives here, expressed in
//! milliseconds. The defaults reproduce the production cadence: a 100 ms
//! indicator tick, a 1 s link poll, a 2 s sample cycle and a 10 s status
//! report.

use serde::{Deserialize, Serialize};

use crate::error::{CredentialsError, Result};

/// Core system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Indicator ---
    /// Indicator evaluation tick (milliseconds). One "tick unit" T.
    pub indicator_tick_ms: u32,

    // --- Connectivity ---
    /// Link status poll interval (milliseconds).
    pub link_poll_interval_ms: u32,
    /// Fixed delay between reassociation attempts while the link is
    /// Failed or Disconnected (milliseconds). No backoff growth.
    pub link_retry_delay_ms: u32,

    // --- Sampler ---
    /// Sample synthesis interval (milliseconds). Must be well above the
    /// indicator tick.
    pub sample_interval_ms: u32,

    // --- Reporting ---
    /// Status report interval for the coordinator loop (milliseconds).
    pub status_interval_ms: u32,

    // --- Teardown ---
    /// Grace period a stopping task is given to acknowledge the stop
    /// request before it is detached (milliseconds).
    pub stop_grace_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            indicator_tick_ms: 100,
            link_poll_interval_ms: 1000,
            link_retry_delay_ms: 5000,
            sample_interval_ms: 2000,
            status_interval_ms: 10_000,
            stop_grace_ms: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// WiFi credentials
// ---------------------------------------------------------------------------

/// Opaque station credentials supplied at construction.
///
/// Validated once here so the connectivity manager never has to deal with
/// malformed input. Backed by `heapless` strings — no allocation, fixed
/// upper bounds matching the 802.11 limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

impl WifiCredentials {
    /// Validate and store SSID + password.
    ///
    /// An empty password selects an open network; otherwise WPA2 rules
    /// apply (8-64 bytes).
    pub fn new(ssid: &str, password: &str) -> Result<Self> {
        if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
            return Err(CredentialsError::InvalidSsid.into());
        }
        if !password.is_empty() && (password.len() < 8 || password.len() > 64) {
            return Err(CredentialsError::InvalidPassword.into());
        }

        let mut s = heapless::String::new();
        s.push_str(ssid).map_err(|_| CredentialsError::InvalidSsid)?;
        let mut p = heapless::String::new();
        p.push_str(password).map_err(|_| CredentialsError::InvalidPassword)?;
        Ok(Self { ssid: s, password: p })
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

//! Radio link port.
//!
//! The management task talks to the radio exclusively through
//! [`LinkPort`], so the state machine and the task loop are identical on
//! hardware and on host. On ESP-IDF the port wraps `EspWifi`; on host it
//! is a deterministic simulation used by the tests and the workstation
//! build.

use crate::config::WifiCredentials;
use crate::error::LinkError;

use super::machine::LinkStatus;

/// Driver-side view of one logical 802.11 station association.
pub trait LinkPort: Send {
    /// Issue an association request with the given credentials. Returns
    /// an error only if the request could not be *issued*; the outcome of
    /// the association itself is observed via [`status`](Self::status).
    fn associate(&mut self, credentials: &WifiCredentials) -> Result<(), LinkError>;

    /// Tear down the association. Infallible by contract — a link that
    /// is already down stays down.
    fn disassociate(&mut self);

    /// Current link status, non-blocking.
    fn status(&mut self) -> LinkStatus;
}

// ---------------------------------------------------------------------------
// ESP-IDF station
// ---------------------------------------------------------------------------

#[cfg(target_os = "espidf")]
pub use espidf::WifiLink;

#[cfg(target_os = "espidf")]
mod espidf {
    use esp_idf_svc::wifi::{ClientConfiguration, Configuration, EspWifi};
    use log::{info, warn};

    use super::{LinkPort, LinkStatus, WifiCredentials};
    use crate::error::LinkError;

    /// WiFi station driver.
    ///
    /// The owner constructs the `EspWifi` handle at boot (it needs the
    /// modem peripheral and the system event loop) and hands it in here.
    pub struct WifiLink {
        wifi: EspWifi<'static>,
        associating: bool,
    }

    impl WifiLink {
        pub fn new(wifi: EspWifi<'static>) -> Self {
            Self {
                wifi,
                associating: false,
            }
        }
    }

    impl LinkPort for WifiLink {
        fn associate(&mut self, credentials: &WifiCredentials) -> Result<(), LinkError> {
            let client = ClientConfiguration {
                ssid: credentials
                    .ssid()
                    .try_into()
                    .map_err(|_| LinkError::AssociateFailed)?,
                password: credentials
                    .password()
                    .try_into()
                    .map_err(|_| LinkError::AssociateFailed)?,
                ..Default::default()
            };
            self.wifi
                .set_configuration(&Configuration::Client(client))
                .map_err(|_| LinkError::AssociateFailed)?;

            if !self.wifi.is_started().unwrap_or(false) {
                self.wifi.start().map_err(|_| LinkError::RadioUnavailable)?;
            }
            info!("wifi: associating with '{}'", credentials.ssid());
            self.wifi.connect().map_err(|_| LinkError::AssociateFailed)?;
            self.associating = true;
            Ok(())
        }

        fn disassociate(&mut self) {
            self.associating = false;
            if let Err(e) = self.wifi.disconnect() {
                warn!("wifi: disconnect failed: {e}");
            }
        }

        fn status(&mut self) -> LinkStatus {
            match self.wifi.is_connected() {
                Ok(true) => {
                    self.associating = false;
                    LinkStatus::Connected
                }
                Ok(false) if self.associating => LinkStatus::Searching,
                Ok(false) => LinkStatus::Disconnected,
                Err(_) => LinkStatus::Failed,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "espidf"))]
pub use sim::WifiLink;

#[cfg(not(target_os = "espidf"))]
mod sim {
    use log::debug;

    use super::{LinkPort, LinkStatus, WifiCredentials};
    use crate::error::LinkError;

    /// Deterministic in-memory station: an association searches for a
    /// fixed number of status polls and then connects. Attempts listed in
    /// `failing_attempts` report Failed instead, which exercises the
    /// retry path end to end without a radio.
    pub struct WifiLink {
        status: LinkStatus,
        search_polls: u32,
        countdown: u32,
        attempts: u32,
        failing_attempts: &'static [u32],
    }

    impl WifiLink {
        pub fn new() -> Self {
            Self::with_search_polls(2)
        }

        /// Number of status polls an association spends in Searching
        /// before reporting Connected.
        pub fn with_search_polls(search_polls: u32) -> Self {
            Self {
                status: LinkStatus::Disconnected,
                search_polls,
                countdown: 0,
                attempts: 0,
                failing_attempts: &[],
            }
        }

        /// Make the listed association attempts (1-based) fail.
        pub fn failing_attempts(mut self, attempts: &'static [u32]) -> Self {
            self.failing_attempts = attempts;
            self
        }

        pub fn attempts(&self) -> u32 {
            self.attempts
        }
    }

    impl Default for WifiLink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl LinkPort for WifiLink {
        fn associate(&mut self, credentials: &WifiCredentials) -> Result<(), LinkError> {
            self.attempts += 1;
            debug!(
                "sim link: attempt {} for '{}'",
                self.attempts,
                credentials.ssid()
            );
            if self.failing_attempts.contains(&self.attempts) {
                self.status = LinkStatus::Failed;
            } else {
                self.status = LinkStatus::Searching;
                self.countdown = self.search_polls;
            }
            Ok(())
        }

        fn disassociate(&mut self) {
            self.status = LinkStatus::Disconnected;
        }

        fn status(&mut self) -> LinkStatus {
            if self.status == LinkStatus::Searching {
                if self.countdown == 0 {
                    self.status = LinkStatus::Connected;
                } else {
                    self.countdown -= 1;
                }
            }
            self.status
        }
    }

}

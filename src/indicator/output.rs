//! Binary indicator output driver.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives one GPIO pin via the raw `gpio_*` API.
//! On host/test: tracks the level in an `AtomicBool` for inspection.
//!
//! Handles are cheap clones of the same underlying output, so the
//! evaluation task and its owner can both force the level (the owner
//! needs this to guarantee the inactive level even when a stopping task
//! had to be detached).

#[cfg(not(target_os = "espidf"))]
use std::sync::Arc;
#[cfg(not(target_os = "espidf"))]
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Clone)]
pub struct IndicatorOutput {
    pin: i32,
    #[cfg(not(target_os = "espidf"))]
    level: Arc<AtomicBool>,
}

impl IndicatorOutput {
    pub fn new(pin: i32) -> Self {
        Self {
            pin,
            #[cfg(not(target_os = "espidf"))]
            level: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn pin(&self) -> i32 {
        self.pin
    }

    /// Configure the pin as a push-pull output, driven inactive.
    #[cfg(target_os = "espidf")]
    pub fn init(&self) {
        unsafe {
            esp_idf_svc::sys::gpio_set_direction(
                self.pin,
                esp_idf_svc::sys::gpio_mode_t_GPIO_MODE_OUTPUT,
            );
        }
        self.set_active(false);
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn init(&self) {
        self.set_active(false);
    }

    #[cfg(target_os = "espidf")]
    pub fn set_active(&self, active: bool) {
        unsafe {
            esp_idf_svc::sys::gpio_set_level(self.pin, u32::from(active));
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn set_active(&self, active: bool) {
        self.level.store(active, Ordering::Release);
    }

    /// Current driven level (simulation only — the real GPIO register is
    /// write-only from this driver's point of view).
    #[cfg(not(target_os = "espidf"))]
    pub fn is_active(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }
}

impl embedded_hal::digital::ErrorType for IndicatorOutput {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for IndicatorOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_active(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_active(true);
        Ok(())
    }
}

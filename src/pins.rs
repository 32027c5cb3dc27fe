//! GPIO pin assignments for the Skynode main board.
//!
//! Single source of truth — drivers reference this module rather than
//! hard-coding pin numbers.

/// Status indicator LED — digital output, active HIGH.
/// GPIO 48 drives the on-board LED on the ESP32-S3 DevKit.
pub const INDICATOR_GPIO: i32 = 48;

/// UART debug console.
pub const UART_TX_GPIO: i32 = 43;
pub const UART_RX_GPIO: i32 = 44;

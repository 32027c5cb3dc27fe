//! Status reporting helpers for the coordinator loop.
//!
//! Pure mappings, kept out of `main.rs` so they are testable on host:
//! connectivity state → indicator pattern, and the periodic telemetry
//! line.

use crate::indicator::IndicatorPattern;
use crate::net::ConnectionState;
use crate::sampler::Sample;

/// Indicator pattern shown for a connectivity state.
///
/// Failed is shown the same as Disconnected: from the operator's point
/// of view both mean "not on the network, retrying".
pub fn pattern_for(state: ConnectionState) -> IndicatorPattern {
    match state {
        ConnectionState::Connected => IndicatorPattern::Solid,
        ConnectionState::Connecting => IndicatorPattern::BlinkFast,
        ConnectionState::Disconnected | ConnectionState::Failed => IndicatorPattern::BlinkSlow,
    }
}

/// One periodic telemetry line.
pub fn status_line(state: ConnectionState, sample: &Sample, uptime_ms: u64) -> String {
    format!(
        "TELEM | up={}s link={} raw={} v={:.2}V t={:.1}C rh={:.1}%",
        uptime_ms / 1000,
        state,
        sample.raw_value,
        sample.voltage,
        sample.temperature_c,
        sample.humidity_pct,
    )
}

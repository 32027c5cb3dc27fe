//! Skynode firmware — main entry point.
//!
//! Boot sequence: ESP-IDF bootstrap, credential validation, component
//! construction, then the coordinator loop. The three component tasks
//! (sampler > indicator > connectivity, by priority) run on their own
//! FreeRTOS-backed threads; this thread becomes the low-priority
//! reporting loop that maps connectivity state onto the indicator and
//! prints one telemetry line per status interval.
//!
//! A component whose `start()` fails is logged and left inert — the
//! rest of the system keeps running degraded.

use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;

use skynode::config::{SystemConfig, WifiCredentials};
use skynode::indicator::{IndicatorEngine, IndicatorOutput};
use skynode::net::{ConnectivityManager, LogLinkSink, WifiLink};
use skynode::pins;
use skynode::runtime::clock::MonotonicClock;
use skynode::sampler::SampleProducer;
use skynode::status;

// Station credentials are baked in at build time; override via the
// environment when flashing a unit for a different site.
const WIFI_SSID: &str = match option_env!("SKYNODE_WIFI_SSID") {
    Some(s) => s,
    None => "skynode-lab",
};
const WIFI_PASSWORD: &str = match option_env!("SKYNODE_WIFI_PASSWORD") {
    Some(s) => s,
    None => "lab-password",
};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Skynode v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    let clock = MonotonicClock::new();

    // ── 2. Peripherals and the WiFi driver ────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs))?;

    let credentials = WifiCredentials::new(WIFI_SSID, WIFI_PASSWORD)?;

    // ── 3. Construct components ───────────────────────────────
    let output = IndicatorOutput::new(pins::INDICATOR_GPIO);
    output.init();

    let mut sampler = SampleProducer::new(&config);
    let mut indicator = IndicatorEngine::new(output, &config);
    let mut net = ConnectivityManager::new(credentials, WifiLink::new(wifi), LogLinkSink, &config);

    // ── 4. Start tasks (degraded-continue on failure) ─────────
    if let Err(e) = sampler.start() {
        warn!("sampler unavailable: {e}");
    }
    if let Err(e) = indicator.start() {
        warn!("indicator unavailable: {e}");
    }
    match net.start() {
        Ok(()) => net.connect(),
        Err(e) => warn!("connectivity unavailable: {e}"),
    }

    info!("System ready. Entering reporting loop.");

    // ── 5. Reporting loop ─────────────────────────────────────
    loop {
        std::thread::sleep(Duration::from_millis(u64::from(config.status_interval_ms)));

        let state = net.state();
        let sample = sampler.latest();
        indicator.set_pattern(status::pattern_for(state));
        info!("{}", status::status_line(state, &sample, clock.uptime_ms()));

        let (free, min_free) = unsafe {
            (
                esp_idf_svc::sys::esp_get_free_heap_size(),
                esp_idf_svc::sys::esp_get_minimum_free_heap_size(),
            )
        };
        info!("heap: free={free} min={min_free}");
    }
}

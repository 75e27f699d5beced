//! Radio subsystem: band plan, the radio port contract, and the RTL-SDR backend.

pub mod band;
mod rtlsdr;

pub use rtlsdr::RtlSdrPort;

use anyhow::Result;

use crate::scanner::Modulation;

/// Contract between the scan controller and the receiver hardware.
///
/// The controller is the port's only caller. Retunes must follow the
/// flush_rx → stop_async_rx → idle → set_frequency → start_async_rx order;
/// anything else can leave the receiver idle or drop buffered samples.
/// Subsystem init/deinit map to construction and `Drop`.
pub trait RadioPort {
    /// Whether the hardware can tune to `frequency`.
    fn is_frequency_valid(&self, frequency: u32) -> bool;

    /// Program the tuner center frequency.
    fn set_frequency(&mut self, frequency: u32) -> Result<()>;

    /// Load a demodulation preset into the receiver.
    fn load_preset(&mut self, modulation: Modulation) -> Result<()>;

    /// Start background sampling.
    fn start_async_rx(&mut self) -> Result<()>;

    /// Stop background sampling and join the RX thread.
    fn stop_async_rx(&mut self) -> Result<()>;

    /// Discard any buffered samples.
    fn flush_rx(&mut self) -> Result<()>;

    /// Put the receiver in idle (tuned but not sampling).
    fn idle(&mut self) -> Result<()>;

    /// Power the receiver down for teardown.
    fn sleep(&mut self) -> Result<()>;

    /// Last sampled signal strength in dBm, or `None` when the device is
    /// unavailable (the caller substitutes the noise-floor sentinel).
    fn read_rssi(&self) -> Option<f32>;

    /// Open a device session.
    fn begin(&mut self) -> Result<()>;

    /// Close the device session.
    fn end(&mut self) -> Result<()>;
}

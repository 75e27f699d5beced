//! RTL-SDR radio port (receive-only).
//!
//! Samples IQ on a background thread and publishes signal strength through
//! an atomic, so the scan loop reads RSSI without blocking. Falls back to a
//! demo loop at runtime when no dongle is detected.

use anyhow::Result;
use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Arc, Mutex,
};
use std::thread::{self, JoinHandle};

use num_complex::Complex;
use rtl_sdr_rs::{DeviceId, RtlSdr, TunerGain, DEFAULT_BUF_LENGTH};

use super::{band, RadioPort};
use crate::scanner::{Modulation, DEFAULT_RSSI};

/// Calibration offset applied to the dBFS magnitude so the reported figure
/// lands on an approximate dBm scale (8-bit dongle, auto gain).
const RSSI_CAL_OFFSET_DB: f32 = -70.0;

/// RTL-SDR radio port: tune, sample RSSI, no transmit.
pub struct RtlSdrPort {
    /// Whether a dongle was found at probe time
    available: bool,
    /// RX thread continue flag
    receiving: Arc<AtomicBool>,
    /// RX thread handle
    rx_thread: Option<JoinHandle<()>>,
    /// Tuner center frequency (Hz), read by the RX thread at start
    frequency: Arc<Mutex<u32>>,
    /// Active demodulation preset, read by the RX thread at start
    modulation: Arc<Mutex<Modulation>>,
    /// RSSI in dBm (f32 bits) written by the RX thread - never blocks readers
    rssi_dbm: Arc<AtomicU32>,
}

impl RtlSdrPort {
    /// Probe for a dongle and build the port. A missing device is not an
    /// error; the port degrades to demo mode.
    pub fn new(frequency: u32, modulation: Modulation) -> Result<Self> {
        let available = check_rtlsdr_available();

        if available {
            tracing::info!("RTL-SDR device detected");
        } else {
            tracing::warn!("RTL-SDR not detected - running in demo mode");
        }

        Ok(Self {
            available,
            receiving: Arc::new(AtomicBool::new(false)),
            rx_thread: None,
            frequency: Arc::new(Mutex::new(frequency)),
            modulation: Arc::new(Mutex::new(modulation)),
            rssi_dbm: Arc::new(AtomicU32::new(DEFAULT_RSSI.to_bits())),
        })
    }

    /// Returns true if a dongle was found.
    pub fn is_available(&self) -> bool {
        self.available
    }
}

impl RadioPort for RtlSdrPort {
    fn is_frequency_valid(&self, frequency: u32) -> bool {
        band::is_frequency_valid(frequency)
    }

    fn set_frequency(&mut self, frequency: u32) -> Result<()> {
        *self.frequency.lock().unwrap() = frequency;
        tracing::debug!("Set frequency to {} Hz", frequency);
        Ok(())
    }

    fn load_preset(&mut self, modulation: Modulation) -> Result<()> {
        *self.modulation.lock().unwrap() = modulation;
        tracing::info!("Loaded preset {}", modulation.label());
        Ok(())
    }

    fn start_async_rx(&mut self) -> Result<()> {
        if self.receiving.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.receiving.store(true, Ordering::SeqCst);

        let receiving = self.receiving.clone();
        let frequency = self.frequency.clone();
        let modulation = self.modulation.clone();
        let rssi_dbm = self.rssi_dbm.clone();
        let available = self.available;

        self.rx_thread = Some(thread::spawn(move || {
            if available {
                if let Err(e) =
                    run_receiver(receiving, frequency, modulation, rssi_dbm)
                {
                    tracing::warn!("RTL-SDR receiver error: {}", e);
                }
            } else {
                run_demo_receiver(receiving);
            }
        }));

        Ok(())
    }

    fn stop_async_rx(&mut self) -> Result<()> {
        self.receiving.store(false, Ordering::SeqCst);

        if let Some(handle) = self.rx_thread.take() {
            let _ = handle.join();
        }
        Ok(())
    }

    fn flush_rx(&mut self) -> Result<()> {
        // Sampling is pull-based; the next RX session starts from a reset
        // buffer, so there is nothing queued to discard here.
        Ok(())
    }

    fn idle(&mut self) -> Result<()> {
        tracing::trace!("Receiver idle");
        Ok(())
    }

    fn sleep(&mut self) -> Result<()> {
        tracing::debug!("Receiver sleep");
        Ok(())
    }

    fn read_rssi(&self) -> Option<f32> {
        if !self.available {
            return None;
        }
        Some(f32::from_bits(self.rssi_dbm.load(Ordering::Relaxed)))
    }

    fn begin(&mut self) -> Result<()> {
        tracing::info!(
            "Radio session started ({})",
            if self.available { "RTL-SDR" } else { "demo" }
        );
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.stop_async_rx()
    }
}

impl Drop for RtlSdrPort {
    fn drop(&mut self) {
        self.receiving.store(false, Ordering::SeqCst);
        if let Some(handle) = self.rx_thread.take() {
            let _ = handle.join();
        }
    }
}

fn check_rtlsdr_available() -> bool {
    match RtlSdr::open(DeviceId::Index(0)) {
        Ok(mut dev) => {
            if let Err(e) = dev.close() {
                tracing::debug!("RTL-SDR close after probe: {:?}", e);
            }
            true
        }
        Err(e) => {
            tracing::debug!("RTL-SDR not available: {:?}", e);
            false
        }
    }
}

/// Sample rate for a preset: the preset's RX bandwidth, bumped to the next
/// supported rate where needed (the dongle cannot sample between 300 kHz
/// and 900 kHz).
fn sample_rate_for(modulation: Modulation) -> u32 {
    let bandwidth = modulation.bandwidth_hz();
    if bandwidth <= 300_000 {
        bandwidth
    } else {
        1_024_000
    }
}

/// Convert interleaved u8 IQ (0-255) to complex samples centered on zero.
fn u8_iq_to_complex(buf: &[u8]) -> Vec<Complex<f32>> {
    buf.chunks_exact(2)
        .map(|c| {
            Complex::new(
                (c[0] as f32 - 127.5) / 128.0,
                (c[1] as f32 - 127.5) / 128.0,
            )
        })
        .collect()
}

/// Mean magnitude of an IQ buffer mapped to an approximate dBm figure.
fn compute_rssi_dbm(samples: &[Complex<f32>]) -> f32 {
    if samples.is_empty() {
        return DEFAULT_RSSI;
    }
    let mean_mag: f32 =
        samples.iter().map(|c| c.norm()).sum::<f32>() / samples.len() as f32;
    20.0 * mean_mag.max(1e-5).log10() + RSSI_CAL_OFFSET_DB
}

fn run_demo_receiver(receiving: Arc<AtomicBool>) {
    tracing::info!("Demo receiver thread started (no RTL-SDR)");

    while receiving.load(Ordering::SeqCst) {
        thread::sleep(std::time::Duration::from_millis(100));
    }

    tracing::info!("Demo receiver thread stopped");
}

/// RX session: open the dongle, tune, and sample until stopped.
fn run_receiver(
    receiving: Arc<AtomicBool>,
    frequency: Arc<Mutex<u32>>,
    modulation: Arc<Mutex<Modulation>>,
    rssi_dbm: Arc<AtomicU32>,
) -> Result<()> {
    use anyhow::Context;

    let mut sdr = RtlSdr::open(DeviceId::Index(0)).context("Failed to open RTL-SDR device")?;

    let freq = *frequency.lock().unwrap();
    let preset = *modulation.lock().unwrap();
    let sample_rate = sample_rate_for(preset);

    sdr.reset_buffer().context("Failed to reset RTL-SDR buffer")?;
    sdr.set_center_freq(freq).context("Failed to set RTL-SDR frequency")?;
    sdr.set_sample_rate(sample_rate).context("Failed to set RTL-SDR sample rate")?;
    sdr.set_bias_tee(false).context("Failed to set bias-tee")?;
    sdr.set_tuner_gain(TunerGain::Auto).context("Failed to set RTL-SDR gain")?;

    tracing::debug!(
        "RTL-SDR configured: freq={} Hz, preset={}, sample_rate={} Hz",
        freq,
        preset.label(),
        sample_rate
    );

    let mut buf = vec![0u8; DEFAULT_BUF_LENGTH];

    while receiving.load(Ordering::SeqCst) {
        match sdr.read_sync(&mut buf) {
            Ok(n) if n > 0 => {
                let samples = u8_iq_to_complex(&buf[..n]);
                rssi_dbm.store(compute_rssi_dbm(&samples).to_bits(), Ordering::Relaxed);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("RTL-SDR read error: {:?}", e);
            }
        }
    }

    sdr.close().context("Failed to close RTL-SDR")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iq_conversion_centers_on_zero() {
        let samples = u8_iq_to_complex(&[128, 128, 255, 0]);
        assert_eq!(samples.len(), 2);
        assert!(samples[0].norm() < 0.01);
        assert!(samples[1].norm() > 1.0);
    }

    #[test]
    fn test_rssi_of_silence_is_noise_floor() {
        assert_eq!(compute_rssi_dbm(&[]), DEFAULT_RSSI);

        let quiet = vec![Complex::new(0.0f32, 0.0); 64];
        assert!(compute_rssi_dbm(&quiet) < -120.0);
    }

    #[test]
    fn test_rssi_grows_with_magnitude() {
        let weak = vec![Complex::new(0.01f32, 0.0); 64];
        let strong = vec![Complex::new(0.5f32, 0.0); 64];
        assert!(compute_rssi_dbm(&strong) > compute_rssi_dbm(&weak));
    }

    #[test]
    fn test_sample_rate_for_presets() {
        assert_eq!(sample_rate_for(Modulation::Ook650), 1_024_000);
        assert_eq!(sample_rate_for(Modulation::Ook270), 270_833);
        assert_eq!(sample_rate_for(Modulation::Fsk238), 270_833);
    }
}

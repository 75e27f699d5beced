//! Scan/lock state machine: detection, mode transitions, and frequency stepping.

use crate::radio::band;

/// Default tuned frequency on launch (310 MHz)
pub const DEFAULT_FREQUENCY: u32 = 310_000_000;

/// RSSI sentinel used until the first sample (and when the radio is unavailable)
pub const DEFAULT_RSSI: f32 = -100.0;

/// Default detection threshold in dBm
pub const DEFAULT_SENSITIVITY: f32 = -85.0;

/// Fixed scan granularity in Hz. Autonomous sweeping always advances by this
/// amount; the user-configurable step applies to manual nudges only.
pub const SCAN_STEP: u32 = 10_000;

/// Frequency presets offered in the settings menu. "Custom" (the index past
/// the end of this table) leaves the frequency at its last manual value.
pub const FREQ_PRESETS: [(u32, &str); 5] = [
    (310_000_000, "310 MHz"),
    (315_000_000, "315 MHz"),
    (433_920_000, "433.92 MHz"),
    (868_000_000, "868 MHz"),
    (915_000_000, "915 MHz"),
];

/// Label for the preset slot that keeps the current frequency.
pub const FREQ_CUSTOM_LABEL: &str = "Custom";

/// Manual tune step presets (Hz)
pub const STEP_PRESETS: [(u32, &str); 6] = [
    (10_000, "10 kHz"),
    (25_000, "25 kHz"),
    (50_000, "50 kHz"),
    (100_000, "100 kHz"),
    (500_000, "500 kHz"),
    (1_000_000, "1 MHz"),
];

/// Sensitivity table for the settings menu: 17 values, -120..-40 dBm in 5 dBm steps
pub const SENSITIVITY_STEPS: usize = 17;
pub const SENSITIVITY_MIN_DBM: f32 = -120.0;
pub const SENSITIVITY_STEP_DBM: f32 = 5.0;

/// Sweep direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    Up,
    Down,
}

impl ScanDirection {
    pub const ALL: [ScanDirection; 2] = [ScanDirection::Up, ScanDirection::Down];

    pub fn label(&self) -> &'static str {
        match self {
            ScanDirection::Up => "Up",
            ScanDirection::Down => "Down",
        }
    }
}

/// Receiver demodulation preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulation {
    Ook270,
    Ook650,
    Fsk238,
    Fsk476,
}

impl Modulation {
    pub const ALL: [Modulation; 4] = [
        Modulation::Ook270,
        Modulation::Ook650,
        Modulation::Fsk238,
        Modulation::Fsk476,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Modulation::Ook270 => "OOK270",
            Modulation::Ook650 => "OOK650",
            Modulation::Fsk238 => "2FSK238",
            Modulation::Fsk476 => "2FSK476",
        }
    }

    /// Approximate RX filter bandwidth of the preset in Hz.
    pub fn bandwidth_hz(&self) -> u32 {
        match self {
            Modulation::Ook270 | Modulation::Fsk238 | Modulation::Fsk476 => 270_833,
            Modulation::Ook650 => 650_000,
        }
    }
}

/// Mutable scanner state. One instance per process, owned by the `App`;
/// every field is written only from the control loop.
#[derive(Debug, Clone)]
pub struct ScannerState {
    /// Current tuned center frequency in Hz
    pub frequency: u32,
    /// Manual tune step in Hz (one of `STEP_PRESETS`)
    pub frequency_step: u32,
    /// Last sampled signal strength in dBm
    pub rssi: f32,
    /// Detection threshold in dBm
    pub sensitivity: f32,
    /// true = sweeping, false = locked on a signal
    pub scanning: bool,
    /// Sweep direction
    pub scan_direction: ScanDirection,
    /// Receiver demodulation preset
    pub modulation: Modulation,
    /// Process-level continue flag
    pub running: bool,
}

impl Default for ScannerState {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY,
            frequency_step: SCAN_STEP,
            rssi: DEFAULT_RSSI,
            sensitivity: DEFAULT_SENSITIVITY,
            scanning: false,
            scan_direction: ScanDirection::Up,
            modulation: Modulation::Ook650,
            running: true,
        }
    }
}

impl ScannerState {
    /// Strict threshold test: an RSSI exactly at the sensitivity does not count.
    pub fn signal_detected(&self) -> bool {
        self.rssi > self.sensitivity
    }

    /// Edge-triggered scan/lock transition. Locks when a signal appears while
    /// sweeping, resumes the sweep when the signal disappears while locked;
    /// all other combinations leave the mode unchanged.
    pub fn update_mode(&mut self) {
        let detected = self.signal_detected();
        if detected && self.scanning {
            self.scanning = false;
            tracing::debug!(frequency = self.frequency, rssi = self.rssi, "signal lock");
        } else if !detected && !self.scanning {
            self.scanning = true;
            tracing::debug!(frequency = self.frequency, "sweep resumed");
        }
    }

    /// Next raw scan candidate: one fixed 10 kHz step in the sweep direction.
    pub fn scan_candidate(&self) -> u32 {
        match self.scan_direction {
            ScanDirection::Up => self.frequency + SCAN_STEP,
            ScanDirection::Down => self.frequency - SCAN_STEP,
        }
    }

    /// Settings-menu index for the current frequency: the matching preset, or
    /// the trailing "Custom" slot when no preset matches.
    pub fn frequency_preset_index(&self) -> usize {
        FREQ_PRESETS
            .iter()
            .position(|(hz, _)| *hz == self.frequency)
            .unwrap_or(FREQ_PRESETS.len())
    }

    /// Settings-menu index for the current step size.
    pub fn step_preset_index(&self) -> usize {
        STEP_PRESETS
            .iter()
            .position(|(hz, _)| *hz == self.frequency_step)
            .unwrap_or(0)
    }

    /// Settings-menu index for the current sensitivity, clamped onto the
    /// 17-step table (nudged values between steps round down).
    pub fn sensitivity_index(&self) -> usize {
        let idx = (self.sensitivity - SENSITIVITY_MIN_DBM) / SENSITIVITY_STEP_DBM;
        idx.clamp(0.0, (SENSITIVITY_STEPS - 1) as f32) as usize
    }
}

/// Sensitivity value for a settings-menu index.
pub fn sensitivity_for_index(index: usize) -> f32 {
    SENSITIVITY_MIN_DBM + index as f32 * SENSITIVITY_STEP_DBM
}

/// Remap a scan candidate that fell outside the tunable sub-bands. Jumps to
/// the nearest valid edge in the direction of travel, or wraps at the band
/// extremes. Valid candidates pass through unchanged.
pub fn correct_candidate(candidate: u32, direction: ScanDirection) -> u32 {
    if band::is_frequency_valid(candidate) {
        return candidate;
    }
    match direction {
        ScanDirection::Up => {
            if candidate < 387_000_000 {
                387_000_000
            } else if candidate < 779_000_000 {
                779_000_000
            } else if candidate > band::FREQUENCY_MAX {
                band::FREQUENCY_MIN
            } else {
                candidate
            }
        }
        ScanDirection::Down => {
            if candidate > 464_000_000 {
                464_000_000
            } else if candidate > 348_000_000 {
                348_000_000
            } else if candidate < band::FREQUENCY_MIN {
                band::FREQUENCY_MAX
            } else {
                candidate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanning_state(rssi: f32, sensitivity: f32, scanning: bool) -> ScannerState {
        ScannerState {
            rssi,
            sensitivity,
            scanning,
            ..ScannerState::default()
        }
    }

    #[test]
    fn test_detection_is_strict() {
        let state = scanning_state(-85.0, -85.0, true);
        assert!(!state.signal_detected());

        let state = scanning_state(-84.9, -85.0, true);
        assert!(state.signal_detected());

        let state = scanning_state(-85.1, -85.0, true);
        assert!(!state.signal_detected());
    }

    #[test]
    fn test_mode_transition_locks_on_signal() {
        let mut state = scanning_state(-60.0, -85.0, true);
        state.update_mode();
        assert!(!state.scanning);
    }

    #[test]
    fn test_mode_transition_resumes_on_silence() {
        let mut state = scanning_state(-100.0, -85.0, false);
        state.update_mode();
        assert!(state.scanning);
    }

    #[test]
    fn test_mode_transition_holds_lock_while_signal_present() {
        let mut state = scanning_state(-60.0, -85.0, false);
        state.update_mode();
        assert!(!state.scanning);
    }

    #[test]
    fn test_mode_transition_keeps_scanning_in_silence() {
        let mut state = scanning_state(-100.0, -85.0, true);
        state.update_mode();
        assert!(state.scanning);
    }

    #[test]
    fn test_scan_candidate_steps_by_fixed_granularity() {
        let mut state = ScannerState::default();
        state.frequency = 433_920_000;
        state.scan_direction = ScanDirection::Up;
        assert_eq!(state.scan_candidate(), 433_930_000);

        state.scan_direction = ScanDirection::Down;
        assert_eq!(state.scan_candidate(), 433_910_000);
    }

    #[test]
    fn test_correction_passes_valid_candidates_through() {
        for freq in [300_000_000, 310_000_000, 348_000_000, 387_000_000, 928_000_000] {
            assert_eq!(correct_candidate(freq, ScanDirection::Up), freq);
            assert_eq!(correct_candidate(freq, ScanDirection::Down), freq);
        }
    }

    #[test]
    fn test_scan_up_wraps_at_band_top() {
        assert_eq!(correct_candidate(928_010_000, ScanDirection::Up), 300_000_000);
    }

    #[test]
    fn test_scan_up_skips_first_dead_zone() {
        assert_eq!(correct_candidate(348_010_000, ScanDirection::Up), 387_000_000);
    }

    #[test]
    fn test_scan_up_skips_second_dead_zone() {
        // 464 MHz is past the 387 MHz edge, so the remap jumps the wide gap
        assert_eq!(correct_candidate(464_000_000, ScanDirection::Up), 779_000_000);
    }

    #[test]
    fn test_scan_down_wraps_at_band_bottom() {
        assert_eq!(correct_candidate(299_990_000, ScanDirection::Down), 928_000_000);
    }

    #[test]
    fn test_scan_down_lands_on_dead_zone_edges() {
        assert_eq!(correct_candidate(778_990_000, ScanDirection::Down), 464_000_000);
        assert_eq!(correct_candidate(386_990_000, ScanDirection::Down), 348_000_000);
    }

    #[test]
    fn test_frequency_preset_index_falls_back_to_custom() {
        let mut state = ScannerState::default();
        state.frequency = 310_000_000;
        assert_eq!(state.frequency_preset_index(), 0);

        state.frequency = 433_920_000;
        assert_eq!(state.frequency_preset_index(), 2);

        state.frequency = 400_010_000;
        assert_eq!(state.frequency_preset_index(), FREQ_PRESETS.len());
    }

    #[test]
    fn test_sensitivity_index_mapping() {
        let mut state = ScannerState::default();
        state.sensitivity = -120.0;
        assert_eq!(state.sensitivity_index(), 0);

        state.sensitivity = -85.0;
        assert_eq!(state.sensitivity_index(), 7);

        state.sensitivity = -40.0;
        assert_eq!(state.sensitivity_index(), 16);

        // Nudged off-grid values round down onto the table
        state.sensitivity = -86.0;
        assert_eq!(state.sensitivity_index(), 6);

        // Unclamped nudges outside the table still map to its ends
        state.sensitivity = -140.0;
        assert_eq!(state.sensitivity_index(), 0);
        state.sensitivity = -10.0;
        assert_eq!(state.sensitivity_index(), 16);
    }

    #[test]
    fn test_sensitivity_for_index() {
        assert_eq!(sensitivity_for_index(0), -120.0);
        assert_eq!(sensitivity_for_index(7), -85.0);
        assert_eq!(sensitivity_for_index(16), -40.0);
    }
}

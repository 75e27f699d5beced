//! Application state management: the scan controller and its command surface.

use anyhow::Result;

use crate::input::Command;
use crate::radio::RadioPort;
use crate::scanner::{
    self, Modulation, ScanDirection, ScannerState, FREQ_PRESETS, SENSITIVITY_STEPS, STEP_PRESETS,
};
use crate::storage::Config;

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal scanner view
    Normal,
    /// Command input mode (after pressing :)
    Command,
    /// Settings surface - selecting which field
    SettingsSelect,
    /// Settings surface - editing a field value
    SettingsEdit,
}

/// Fields of the settings surface, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Frequency,
    Modulation,
    Direction,
    Mode,
    Sensitivity,
    StepSize,
}

impl SettingsField {
    pub const ALL: [SettingsField; 6] = [
        SettingsField::Frequency,
        SettingsField::Modulation,
        SettingsField::Direction,
        SettingsField::Mode,
        SettingsField::Sensitivity,
        SettingsField::StepSize,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SettingsField::Frequency => "Frequency",
            SettingsField::Modulation => "Modulation",
            SettingsField::Direction => "Direction",
            SettingsField::Mode => "Mode",
            SettingsField::Sensitivity => "Sensitivity",
            SettingsField::StepSize => "Step Size",
        }
    }
}

/// Read-only view of the scanner state handed to the presentation layer.
#[derive(Debug, Clone, Copy)]
pub struct ScanSnapshot {
    pub frequency: u32,
    pub rssi: f32,
    pub sensitivity: f32,
    pub modulation: Modulation,
    pub scanning: bool,
}

/// Main application state: scanner state plus its exclusively-owned radio.
pub struct App {
    /// Current input mode
    pub input_mode: InputMode,
    /// Command input buffer
    pub command_input: String,
    /// Scanner state
    pub scanner: ScannerState,
    /// Whether the radio hardware was found (demo mode otherwise)
    pub radio_attached: bool,
    /// Last error message
    pub last_error: Option<String>,
    /// Last status message
    pub status_message: Option<String>,

    // -- Settings surface state --
    /// Currently selected settings field
    pub settings_field_index: usize,
    /// Currently selected value index within the field editor
    pub settings_value_index: usize,

    /// Ring the terminal bell on a scanning→locked transition
    lock_bell: bool,
    /// Bell queued for the next frame
    bell_pending: bool,

    /// Radio device handle; this controller is its only caller
    radio: Box<dyn RadioPort>,
}

impl App {
    /// Build the application from launch defaults and a radio port.
    ///
    /// Fatal if the configured frequency is not tunable; a missing device is
    /// not fatal (the port degrades to demo mode).
    pub fn new(config: Config, mut radio: Box<dyn RadioPort>, radio_attached: bool) -> Result<Self> {
        let scanner = ScannerState {
            frequency: config.default_frequency,
            frequency_step: config.default_step,
            sensitivity: config.default_sensitivity,
            scan_direction: config.default_direction,
            modulation: config.default_modulation,
            ..ScannerState::default()
        };

        radio.begin()?;

        if !radio.is_frequency_valid(scanner.frequency) {
            anyhow::bail!(
                "Configured frequency {} Hz is outside the tunable bands",
                scanner.frequency
            );
        }

        radio.load_preset(scanner.modulation)?;
        radio.set_frequency(scanner.frequency)?;
        radio.start_async_rx()?;

        tracing::info!(
            frequency = scanner.frequency,
            sensitivity = scanner.sensitivity,
            "Scanner initialized"
        );

        Ok(Self {
            input_mode: InputMode::Normal,
            command_input: String::new(),
            scanner,
            radio_attached,
            last_error: None,
            status_message: None,
            settings_field_index: 0,
            settings_value_index: 0,
            lock_bell: config.lock_bell,
            bell_pending: false,
            radio,
        })
    }

    pub fn is_running(&self) -> bool {
        self.scanner.running
    }

    /// Get the frequency in MHz
    pub fn frequency_mhz(&self) -> f64 {
        self.scanner.frequency as f64 / 1_000_000.0
    }

    /// Snapshot for the presentation layer
    pub fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            frequency: self.scanner.frequency,
            rssi: self.scanner.rssi,
            sensitivity: self.scanner.sensitivity,
            modulation: self.scanner.modulation,
            scanning: self.scanner.scanning,
        }
    }

    /// Consume a queued bell, if any
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell_pending)
    }

    /// Handle one discrete command from the main view.
    pub fn handle_command(&mut self, command: Command) -> Result<()> {
        self.last_error = None;

        match command {
            Command::NudgeSensitivity(delta) => {
                // Intentionally unclamped; only the settings surface is
                // bounded to the 17-step table.
                self.scanner.sensitivity += delta;
                self.status_message =
                    Some(format!("Sensitivity: {:.1} dBm", self.scanner.sensitivity));
            }
            Command::TuneManual(direction) => self.tune_manual(direction)?,
            Command::ResumeScan(direction) => {
                self.scanner.scan_direction = direction;
                self.scanner.scanning = true;
                self.status_message = Some(format!("Scanning {}", direction.label().to_lowercase()));
                tracing::info!("Resume scanning {}", direction.label().to_lowercase());
            }
            Command::OpenSettings => {
                self.input_mode = InputMode::SettingsSelect;
                self.settings_field_index = 0;
            }
            Command::OpenCommandLine => {
                self.input_mode = InputMode::Command;
                self.command_input.clear();
            }
            Command::Quit => {
                self.scanner.running = false;
                tracing::info!("Exiting");
            }
        }
        Ok(())
    }

    /// Manual tune by one `frequency_step`. An untunable target drops the
    /// command without touching any state.
    fn tune_manual(&mut self, direction: ScanDirection) -> Result<()> {
        let new_frequency = match direction {
            ScanDirection::Up => self.scanner.frequency.saturating_add(self.scanner.frequency_step),
            ScanDirection::Down => self.scanner.frequency.saturating_sub(self.scanner.frequency_step),
        };

        if !self.radio.is_frequency_valid(new_frequency) {
            tracing::debug!("Manual tune to {} Hz dropped (untunable)", new_frequency);
            return Ok(());
        }

        self.scanner.scanning = false;
        self.scanner.frequency = new_frequency;
        self.retune()?;
        self.status_message = Some(format!("Tuned to {:.2} MHz", self.frequency_mhz()));
        tracing::info!(
            "Manual tune {}: {} Hz (step: {})",
            direction.label().to_lowercase(),
            self.scanner.frequency,
            self.scanner.frequency_step
        );
        Ok(())
    }

    /// One iteration of the scan loop: sample RSSI, run the lock/resume
    /// transition, and step the sweep. Suspended while the settings surface
    /// or command line is active.
    pub fn tick(&mut self) -> Result<()> {
        if self.input_mode != InputMode::Normal {
            return Ok(());
        }

        self.scanner.rssi = self.radio.read_rssi().unwrap_or(scanner::DEFAULT_RSSI);

        let was_scanning = self.scanner.scanning;
        self.scanner.update_mode();
        if was_scanning && !self.scanner.scanning && self.lock_bell {
            self.bell_pending = true;
        }

        if self.scanner.scanning {
            let raw = self.scanner.scan_candidate();
            let candidate = if self.radio.is_frequency_valid(raw) {
                raw
            } else {
                scanner::correct_candidate(raw, self.scanner.scan_direction)
            };

            if candidate != self.scanner.frequency {
                self.scanner.frequency = candidate;
                self.retune()?;
            }
        }

        Ok(())
    }

    /// Full retune sequence for the current frequency. The order is a
    /// correctness invariant: flush → stop → idle → set → start.
    fn retune(&mut self) -> Result<()> {
        if !self.radio.is_frequency_valid(self.scanner.frequency) {
            return Ok(());
        }
        self.radio.flush_rx()?;
        self.radio.stop_async_rx()?;
        self.radio.idle()?;
        self.radio.set_frequency(self.scanner.frequency)?;
        self.radio.start_async_rx()?;
        Ok(())
    }

    /// Retune sequence that also reloads the demodulation preset.
    fn retune_with_preset(&mut self) -> Result<()> {
        self.radio.flush_rx()?;
        self.radio.stop_async_rx()?;
        self.radio.idle()?;
        self.radio.load_preset(self.scanner.modulation)?;
        self.radio.set_frequency(self.scanner.frequency)?;
        self.radio.start_async_rx()?;
        Ok(())
    }

    /// Wind the radio down on exit: flush → stop → idle → sleep → end.
    pub fn shutdown(&mut self) -> Result<()> {
        self.radio.flush_rx()?;
        self.radio.stop_async_rx()?;
        self.radio.idle()?;
        self.radio.sleep()?;
        self.radio.end()?;
        tracing::info!("Radio shut down");
        Ok(())
    }

    /// Execute a `:` command
    pub fn execute_command(&mut self, command: &str) -> Result<()> {
        let parts: Vec<&str> = command.trim().split_whitespace().collect();
        if parts.is_empty() {
            return Ok(());
        }

        self.last_error = None;
        self.status_message = None;

        match parts[0] {
            "q" | "quit" => {
                self.scanner.running = false;
            }
            "freq" => {
                if parts.len() < 2 {
                    self.last_error = Some("Usage: :freq <MHz>".to_string());
                    return Ok(());
                }
                match parts[1].parse::<f64>() {
                    Ok(mhz) => {
                        let hz = (mhz * 1_000_000.0) as u32;
                        if self.radio.is_frequency_valid(hz) {
                            self.scanner.scanning = false;
                            self.scanner.frequency = hz;
                            self.retune()?;
                            self.status_message =
                                Some(format!("Tuned to {:.2} MHz", self.frequency_mhz()));
                        } else {
                            self.last_error = Some(
                                "Frequency must be within 300-348, 387-464 or 779-928 MHz"
                                    .to_string(),
                            );
                        }
                    }
                    Err(_) => {
                        self.last_error = Some("Invalid frequency".to_string());
                    }
                }
            }
            "sens" => {
                if parts.len() < 2 {
                    self.last_error = Some("Usage: :sens <dBm>".to_string());
                    return Ok(());
                }
                match parts[1].parse::<f32>() {
                    Ok(dbm) => {
                        self.scanner.sensitivity = dbm;
                        self.status_message = Some(format!("Sensitivity: {:.1} dBm", dbm));
                    }
                    Err(_) => {
                        self.last_error = Some("Invalid sensitivity".to_string());
                    }
                }
            }
            _ => {
                self.last_error = Some(format!("Unknown command: {}", parts[0]));
            }
        }

        Ok(())
    }

    // -- Settings surface helpers --

    /// Get the current value index for the active settings field
    pub fn current_settings_value_index(&self) -> usize {
        let field = SettingsField::ALL[self.settings_field_index];
        match field {
            SettingsField::Frequency => self.scanner.frequency_preset_index(),
            SettingsField::Modulation => Modulation::ALL
                .iter()
                .position(|m| *m == self.scanner.modulation)
                .unwrap_or(0),
            SettingsField::Direction => match self.scanner.scan_direction {
                ScanDirection::Up => 0,
                ScanDirection::Down => 1,
            },
            SettingsField::Mode => {
                if self.scanner.scanning {
                    1
                } else {
                    0
                }
            }
            SettingsField::Sensitivity => self.scanner.sensitivity_index(),
            SettingsField::StepSize => self.scanner.step_preset_index(),
        }
    }

    /// Get the number of values for the active settings field
    pub fn settings_value_count(&self) -> usize {
        let field = SettingsField::ALL[self.settings_field_index];
        match field {
            SettingsField::Frequency => FREQ_PRESETS.len() + 1, // presets + Custom
            SettingsField::Modulation => Modulation::ALL.len(),
            SettingsField::Direction => 2,
            SettingsField::Mode => 2, // Locked / Scanning
            SettingsField::Sensitivity => SENSITIVITY_STEPS,
            SettingsField::StepSize => STEP_PRESETS.len(),
        }
    }

    /// Apply the selected settings value as a completed field edit.
    pub fn apply_settings_value(&mut self) -> Result<()> {
        let field = SettingsField::ALL[self.settings_field_index];
        match field {
            SettingsField::Frequency => {
                // The trailing "Custom" slot keeps the last manual value.
                if self.settings_value_index < FREQ_PRESETS.len() {
                    let (hz, _) = FREQ_PRESETS[self.settings_value_index];
                    self.scanner.frequency = hz;
                    self.retune()?;
                }
            }
            SettingsField::Modulation => {
                if self.settings_value_index < Modulation::ALL.len() {
                    self.scanner.modulation = Modulation::ALL[self.settings_value_index];
                    self.retune_with_preset()?;
                }
            }
            SettingsField::Direction => {
                self.scanner.scan_direction = if self.settings_value_index == 0 {
                    ScanDirection::Up
                } else {
                    ScanDirection::Down
                };
            }
            SettingsField::Mode => {
                self.scanner.scanning = self.settings_value_index == 1;
            }
            SettingsField::Sensitivity => {
                if self.settings_value_index < SENSITIVITY_STEPS {
                    self.scanner.sensitivity =
                        scanner::sensitivity_for_index(self.settings_value_index);
                }
            }
            SettingsField::StepSize => {
                if self.settings_value_index < STEP_PRESETS.len() {
                    self.scanner.frequency_step = STEP_PRESETS[self.settings_value_index].0;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::radio::band;

    /// Scripted radio port recording every call for order assertions.
    struct TestRadio {
        calls: Rc<RefCell<Vec<String>>>,
        rssi: Rc<RefCell<Option<f32>>>,
    }

    impl RadioPort for TestRadio {
        fn is_frequency_valid(&self, frequency: u32) -> bool {
            band::is_frequency_valid(frequency)
        }
        fn set_frequency(&mut self, frequency: u32) -> Result<()> {
            self.calls.borrow_mut().push(format!("set:{}", frequency));
            Ok(())
        }
        fn load_preset(&mut self, modulation: Modulation) -> Result<()> {
            self.calls.borrow_mut().push(format!("preset:{}", modulation.label()));
            Ok(())
        }
        fn start_async_rx(&mut self) -> Result<()> {
            self.calls.borrow_mut().push("start".into());
            Ok(())
        }
        fn stop_async_rx(&mut self) -> Result<()> {
            self.calls.borrow_mut().push("stop".into());
            Ok(())
        }
        fn flush_rx(&mut self) -> Result<()> {
            self.calls.borrow_mut().push("flush".into());
            Ok(())
        }
        fn idle(&mut self) -> Result<()> {
            self.calls.borrow_mut().push("idle".into());
            Ok(())
        }
        fn sleep(&mut self) -> Result<()> {
            self.calls.borrow_mut().push("sleep".into());
            Ok(())
        }
        fn read_rssi(&self) -> Option<f32> {
            *self.rssi.borrow()
        }
        fn begin(&mut self) -> Result<()> {
            self.calls.borrow_mut().push("begin".into());
            Ok(())
        }
        fn end(&mut self) -> Result<()> {
            self.calls.borrow_mut().push("end".into());
            Ok(())
        }
    }

    struct Harness {
        app: App,
        calls: Rc<RefCell<Vec<String>>>,
        rssi: Rc<RefCell<Option<f32>>>,
    }

    fn harness(config: Config) -> Harness {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let rssi = Rc::new(RefCell::new(None));
        let radio = TestRadio {
            calls: calls.clone(),
            rssi: rssi.clone(),
        };
        let app = App::new(config, Box::new(radio), true).unwrap();
        calls.borrow_mut().clear();
        Harness { app, calls, rssi }
    }

    #[test]
    fn test_startup_rejects_untunable_frequency() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let rssi = Rc::new(RefCell::new(None));
        let radio = TestRadio { calls, rssi };
        let config = Config {
            default_frequency: 600_000_000,
            ..Config::default()
        };
        assert!(App::new(config, Box::new(radio), true).is_err());
    }

    #[test]
    fn test_degraded_rssi_uses_sentinel() {
        let mut h = harness(Config::default());
        h.app.tick().unwrap();
        assert_eq!(h.app.scanner.rssi, -100.0);
    }

    #[test]
    fn test_tick_locks_on_signal_without_stepping() {
        let mut h = harness(Config::default());
        h.app.scanner.scanning = true;
        *h.rssi.borrow_mut() = Some(-60.0);

        h.app.tick().unwrap();

        assert!(!h.app.scanner.scanning);
        assert_eq!(h.app.scanner.frequency, 310_000_000);
        assert!(h.calls.borrow().is_empty());
        assert!(h.app.take_bell());
        assert!(!h.app.take_bell());
    }

    #[test]
    fn test_tick_steps_and_retunes_while_scanning() {
        let mut h = harness(Config::default());
        h.app.scanner.scanning = true;

        h.app.tick().unwrap();

        assert_eq!(h.app.scanner.frequency, 310_010_000);
        assert_eq!(
            *h.calls.borrow(),
            vec!["flush", "stop", "idle", "set:310010000", "start"]
        );
    }

    #[test]
    fn test_tick_resumes_sweep_when_signal_drops() {
        let mut h = harness(Config::default());
        h.app.scanner.scanning = false;

        h.app.tick().unwrap();

        assert!(h.app.scanner.scanning);
        assert_eq!(h.app.scanner.frequency, 310_010_000);
    }

    #[test]
    fn test_tick_holds_lock_while_signal_present() {
        let mut h = harness(Config::default());
        h.app.scanner.scanning = false;
        *h.rssi.borrow_mut() = Some(-50.0);

        h.app.tick().unwrap();

        assert!(!h.app.scanner.scanning);
        assert!(!h.app.take_bell());
    }

    #[test]
    fn test_tick_wraps_at_band_top() {
        let mut h = harness(Config::default());
        h.app.scanner.scanning = true;
        h.app.scanner.frequency = 928_000_000;

        h.app.tick().unwrap();

        assert_eq!(h.app.scanner.frequency, 300_000_000);
    }

    #[test]
    fn test_tick_skips_dead_zone_scanning_up() {
        let mut h = harness(Config::default());
        h.app.scanner.scanning = true;
        h.app.scanner.frequency = 463_990_000;

        h.app.tick().unwrap();

        assert_eq!(h.app.scanner.frequency, 779_000_000);
    }

    #[test]
    fn test_tick_suspended_while_settings_open() {
        let mut h = harness(Config::default());
        h.app.scanner.scanning = true;
        h.app.input_mode = InputMode::SettingsSelect;

        h.app.tick().unwrap();

        assert_eq!(h.app.scanner.frequency, 310_000_000);
        assert!(h.calls.borrow().is_empty());
    }

    #[test]
    fn test_manual_tune_uses_configured_step_and_locks() {
        let config = Config {
            default_step: 500_000,
            ..Config::default()
        };
        let mut h = harness(config);
        h.app.scanner.scanning = true;

        h.app.handle_command(Command::TuneManual(ScanDirection::Up)).unwrap();

        assert_eq!(h.app.scanner.frequency, 310_500_000);
        assert!(!h.app.scanner.scanning);
    }

    #[test]
    fn test_manual_tune_to_dead_zone_is_dropped() {
        let mut h = harness(Config::default());
        h.app.scanner.frequency = 348_000_000;
        h.app.scanner.scanning = true;

        h.app.handle_command(Command::TuneManual(ScanDirection::Up)).unwrap();

        // Command silently dropped: frequency AND mode untouched
        assert_eq!(h.app.scanner.frequency, 348_000_000);
        assert!(h.app.scanner.scanning);
        assert!(h.calls.borrow().is_empty());
    }

    #[test]
    fn test_nudge_sensitivity_is_unclamped() {
        let mut h = harness(Config::default());
        h.app.scanner.sensitivity = -120.0;

        for _ in 0..10 {
            h.app.handle_command(Command::NudgeSensitivity(-1.0)).unwrap();
        }

        assert_eq!(h.app.scanner.sensitivity, -130.0);
    }

    #[test]
    fn test_resume_scan_sets_direction_and_mode() {
        let mut h = harness(Config::default());
        h.app.scanner.scanning = false;

        h.app.handle_command(Command::ResumeScan(ScanDirection::Down)).unwrap();

        assert!(h.app.scanner.scanning);
        assert_eq!(h.app.scanner.scan_direction, ScanDirection::Down);
    }

    #[test]
    fn test_settings_custom_frequency_is_untouched() {
        let mut h = harness(Config::default());
        h.app.scanner.frequency = 433_930_000; // off-preset manual value
        h.app.settings_field_index = 0; // Frequency
        h.app.settings_value_index = FREQ_PRESETS.len(); // Custom

        h.app.apply_settings_value().unwrap();

        assert_eq!(h.app.scanner.frequency, 433_930_000);
        assert!(h.calls.borrow().is_empty());
    }

    #[test]
    fn test_settings_frequency_preset_retunes() {
        let mut h = harness(Config::default());
        h.app.settings_field_index = 0; // Frequency
        h.app.settings_value_index = 2; // 433.92 MHz

        h.app.apply_settings_value().unwrap();

        assert_eq!(h.app.scanner.frequency, 433_920_000);
        assert_eq!(
            *h.calls.borrow(),
            vec!["flush", "stop", "idle", "set:433920000", "start"]
        );
    }

    #[test]
    fn test_settings_modulation_reloads_preset() {
        let mut h = harness(Config::default());
        h.app.settings_field_index = 1; // Modulation
        h.app.settings_value_index = 2; // 2FSK238

        h.app.apply_settings_value().unwrap();

        assert_eq!(h.app.scanner.modulation, Modulation::Fsk238);
        assert_eq!(
            *h.calls.borrow(),
            vec!["flush", "stop", "idle", "preset:2FSK238", "set:310000000", "start"]
        );
    }

    #[test]
    fn test_settings_sensitivity_table() {
        let mut h = harness(Config::default());
        h.app.settings_field_index = 4; // Sensitivity
        h.app.settings_value_index = 0;

        h.app.apply_settings_value().unwrap();
        assert_eq!(h.app.scanner.sensitivity, -120.0);

        h.app.settings_value_index = 16;
        h.app.apply_settings_value().unwrap();
        assert_eq!(h.app.scanner.sensitivity, -40.0);
    }

    #[test]
    fn test_freq_command_tunes_and_locks() {
        let mut h = harness(Config::default());
        h.app.scanner.scanning = true;

        h.app.execute_command("freq 433.92").unwrap();

        assert_eq!(h.app.scanner.frequency, 433_920_000);
        assert!(!h.app.scanner.scanning);

        h.app.execute_command("freq 600").unwrap();
        assert_eq!(h.app.scanner.frequency, 433_920_000);
        assert!(h.app.last_error.is_some());
    }

    #[test]
    fn test_shutdown_order() {
        let mut h = harness(Config::default());
        h.app.shutdown().unwrap();
        assert_eq!(
            *h.calls.borrow(),
            vec!["flush", "stop", "idle", "sleep", "end"]
        );
    }
}

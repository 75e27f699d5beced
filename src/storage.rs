//! Configuration storage.
//!
//! All application data lives under `~/.config/subscan/`:
//!
//! ```text
//! ~/.config/subscan/
//!   config.ini          — Launch defaults
//!   subscan.log         — Log output (the TUI owns stdout)
//! ```
//!
//! The config file supplies launch defaults only; the scanner never writes
//! runtime state back, so every run starts from the configured defaults.

use anyhow::{Context, Result};
use configparser::ini::Ini;
use std::fs;
use std::path::PathBuf;

use crate::scanner::{
    self, Modulation, ScanDirection, DEFAULT_FREQUENCY, DEFAULT_SENSITIVITY, SCAN_STEP,
};

// ─── Config ──────────────────────────────────────────────────────────────────

/// Launch defaults loaded from `~/.config/subscan/config.ini`
#[derive(Debug, Clone)]
pub struct Config {
    // [radio]
    /// Frequency tuned at startup, Hz
    pub default_frequency: u32,
    /// Detection threshold at startup, dBm
    pub default_sensitivity: f32,
    /// Demodulation preset at startup
    pub default_modulation: Modulation,
    /// Manual tune step at startup, Hz
    pub default_step: u32,
    /// Sweep direction at startup
    pub default_direction: ScanDirection,

    // [ui]
    /// Ring the terminal bell when a sweep locks onto a signal
    pub lock_bell: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_frequency: DEFAULT_FREQUENCY,
            default_sensitivity: DEFAULT_SENSITIVITY,
            default_modulation: Modulation::Ook650,
            default_step: SCAN_STEP,
            default_direction: ScanDirection::Up,
            lock_bell: true,
        }
    }
}

impl Config {
    /// Load config from an INI file, falling back to defaults for missing keys.
    fn load_from_ini(path: &std::path::Path) -> Result<Self> {
        let mut ini = Ini::new();
        ini.load(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        let defaults = Config::default();

        let default_frequency = ini
            .getuint("radio", "default_frequency")
            .ok()
            .flatten()
            .map(|v| v as u32)
            .unwrap_or(defaults.default_frequency);

        let default_sensitivity = ini
            .getfloat("radio", "default_sensitivity")
            .ok()
            .flatten()
            .map(|v| v as f32)
            .unwrap_or(defaults.default_sensitivity);

        let default_modulation = ini
            .get("radio", "default_modulation")
            .and_then(|s| modulation_from_name(&s))
            .unwrap_or(defaults.default_modulation);

        let default_step = ini
            .getuint("radio", "default_step")
            .ok()
            .flatten()
            .map(|v| v as u32)
            .filter(|hz| scanner::STEP_PRESETS.iter().any(|(step, _)| step == hz))
            .unwrap_or(defaults.default_step);

        let default_direction = ini
            .get("radio", "default_direction")
            .and_then(|s| direction_from_name(&s))
            .unwrap_or(defaults.default_direction);

        let lock_bell = ini
            .getbool("ui", "lock_bell")
            .ok()
            .flatten()
            .unwrap_or(defaults.lock_bell);

        Ok(Self {
            default_frequency,
            default_sensitivity,
            default_modulation,
            default_step,
            default_direction,
            lock_bell,
        })
    }

    /// Save config to an INI-style file with comments explaining each field.
    fn save_to_ini(&self, path: &std::path::Path) -> Result<()> {
        let freq_mhz = self.default_frequency as f64 / 1_000_000.0;

        let content = format!(
            r#"; SubScan — Sub-GHz band scanner configuration
; Location: {path}
;
; Edit this file to change launch defaults. The scanner never writes
; runtime state back here; every run starts from these values.
; Lines starting with ; or # are comments.

[radio]
; Frequency tuned at startup, in Hz ({freq_mhz:.2} MHz).
; Must fall inside a tunable sub-band: 300-348, 387-464, 779-928 MHz.
default_frequency = {frequency}

; Detection threshold in dBm. RSSI above this counts as a signal.
default_sensitivity = {sensitivity}

; Demodulation preset: OOK270, OOK650, 2FSK238 or 2FSK476
default_modulation = {modulation}

; Manual tune step in Hz (10000, 25000, 50000, 100000, 500000, 1000000)
default_step = {step}

; Sweep direction at startup: Up or Down
default_direction = {direction}

[ui]
; Ring the terminal bell when a sweep locks onto a signal (true/false)
lock_bell = {lock_bell}
"#,
            path = path.display(),
            freq_mhz = freq_mhz,
            frequency = self.default_frequency,
            sensitivity = self.default_sensitivity,
            modulation = self.default_modulation.label(),
            step = self.default_step,
            direction = self.default_direction.label(),
            lock_bell = self.lock_bell,
        );

        fs::write(path, content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }
}

fn modulation_from_name(name: &str) -> Option<Modulation> {
    Modulation::ALL
        .iter()
        .copied()
        .find(|m| m.label().eq_ignore_ascii_case(name.trim()))
}

fn direction_from_name(name: &str) -> Option<ScanDirection> {
    ScanDirection::ALL
        .iter()
        .copied()
        .find(|d| d.label().eq_ignore_ascii_case(name.trim()))
}

/// Resolve the config directory to `~/.config/subscan/` regardless of OS.
pub fn resolve_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("subscan"))
}

// ─── Storage ─────────────────────────────────────────────────────────────────

/// Storage manager for the config directory.
///
/// On construction it ensures `~/.config/subscan/` exists and loads
/// `config.ini`, writing a commented default file on first run.
pub struct Storage {
    /// Base config directory (~/.config/subscan)
    config_dir: PathBuf,
    /// Launch defaults
    pub config: Config,
}

impl Storage {
    pub fn new() -> Result<Self> {
        let config_dir = resolve_config_dir()
            .context("Could not determine home directory (is $HOME set?)")?;

        let config_path = config_dir.join("config.ini");

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config dir: {:?}", config_dir))?;
            tracing::info!("Created config directory: {:?}", config_dir);
        }

        let config = if config_path.exists() {
            tracing::info!("Loading config from {:?}", config_path);
            match Config::load_from_ini(&config_path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!("Failed to parse config.ini, using defaults: {}", e);
                    Config::default()
                }
            }
        } else {
            tracing::info!("No config.ini found — creating default at {:?}", config_path);
            let config = Config::default();
            if let Err(e) = config.save_to_ini(&config_path) {
                tracing::warn!("Could not write default config.ini: {}", e);
            }
            config
        };

        Ok(Self { config_dir, config })
    }

    /// Get the config directory path (`~/.config/subscan`)
    #[allow(dead_code)]
    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }
}

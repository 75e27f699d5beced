//! Tunable band plan.
//!
//! Models a receiver whose usable range is split by dead-zones: three
//! sub-bands between 300 and 928 MHz. Frequencies outside these ranges are
//! rejected by the radio port and remapped by the scan loop.

/// Lowest tunable frequency (Hz)
pub const FREQUENCY_MIN: u32 = 300_000_000;

/// Highest tunable frequency (Hz)
pub const FREQUENCY_MAX: u32 = 928_000_000;

/// Tunable sub-bands, low..=high Hz. 464 MHz itself is not tunable; it is
/// only reachable as a scan-down remap target and is stepped off on the
/// next tick.
const BANDS: [(u32, u32); 3] = [
    (300_000_000, 348_000_000),
    (387_000_000, 463_999_999),
    (779_000_000, 928_000_000),
];

/// Whether `frequency` falls inside a tunable sub-band.
pub fn is_frequency_valid(frequency: u32) -> bool {
    BANDS
        .iter()
        .any(|(low, high)| frequency >= *low && frequency <= *high)
}

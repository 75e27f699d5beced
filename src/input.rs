//! Key-to-command mapping for the main scanner view.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::scanner::ScanDirection;

/// Discrete commands the scan controller consumes, at most one per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Adjust sensitivity by the given dBm delta (unclamped)
    NudgeSensitivity(f32),
    /// Manual tune by one `frequency_step` down (Left) or up (Right)
    TuneManual(ScanDirection),
    /// Restart sweeping in the given direction (long-press equivalent)
    ResumeScan(ScanDirection),
    /// Open the settings surface
    OpenSettings,
    /// Open the `:` command line
    OpenCommandLine,
    /// Exit the application
    Quit,
}

/// Map a key press in the main view to a command. Shifted arrows (and H/L)
/// stand in for the original hardware's long-press resume gestures.
pub fn command_for_key(key: KeyEvent) -> Option<Command> {
    let shifted = key.modifiers.contains(KeyModifiers::SHIFT);
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(Command::NudgeSensitivity(1.0)),
        KeyCode::Down | KeyCode::Char('j') => Some(Command::NudgeSensitivity(-1.0)),
        KeyCode::Left if shifted => Some(Command::ResumeScan(ScanDirection::Down)),
        KeyCode::Right if shifted => Some(Command::ResumeScan(ScanDirection::Up)),
        KeyCode::Char('H') => Some(Command::ResumeScan(ScanDirection::Down)),
        KeyCode::Char('L') => Some(Command::ResumeScan(ScanDirection::Up)),
        KeyCode::Left | KeyCode::Char('h') => Some(Command::TuneManual(ScanDirection::Down)),
        KeyCode::Right | KeyCode::Char('l') => Some(Command::TuneManual(ScanDirection::Up)),
        KeyCode::Tab | KeyCode::Enter => Some(Command::OpenSettings),
        KeyCode::Char(':') => Some(Command::OpenCommandLine),
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn shift_key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::SHIFT)
    }

    #[test]
    fn test_sensitivity_keys() {
        assert_eq!(
            command_for_key(key(KeyCode::Up)),
            Some(Command::NudgeSensitivity(1.0))
        );
        assert_eq!(
            command_for_key(key(KeyCode::Down)),
            Some(Command::NudgeSensitivity(-1.0))
        );
    }

    #[test]
    fn test_tap_arrows_tune_manually() {
        assert_eq!(
            command_for_key(key(KeyCode::Left)),
            Some(Command::TuneManual(ScanDirection::Down))
        );
        assert_eq!(
            command_for_key(key(KeyCode::Right)),
            Some(Command::TuneManual(ScanDirection::Up))
        );
    }

    #[test]
    fn test_shifted_arrows_resume_scan() {
        assert_eq!(
            command_for_key(shift_key(KeyCode::Left)),
            Some(Command::ResumeScan(ScanDirection::Down))
        );
        assert_eq!(
            command_for_key(shift_key(KeyCode::Right)),
            Some(Command::ResumeScan(ScanDirection::Up))
        );
        assert_eq!(
            command_for_key(shift_key(KeyCode::Char('L'))),
            Some(Command::ResumeScan(ScanDirection::Up))
        );
    }

    #[test]
    fn test_mode_and_quit_keys() {
        assert_eq!(command_for_key(key(KeyCode::Tab)), Some(Command::OpenSettings));
        assert_eq!(command_for_key(key(KeyCode::Char(':'))), Some(Command::OpenCommandLine));
        assert_eq!(command_for_key(key(KeyCode::Char('q'))), Some(Command::Quit));
        assert_eq!(command_for_key(key(KeyCode::Char('x'))), None);
    }
}

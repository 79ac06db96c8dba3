//! Platform detection utilities

use std::fs;

/// Detect if running in WSL (Windows Subsystem for Linux)
///
/// WSL changes both the preferred speech backend and how the console
/// can be polled, so several places ask this.
pub fn is_wsl() -> bool {
    if let Ok(contents) = fs::read_to_string("/proc/version") {
        let lower = contents.to_lowercase();
        if lower.contains("microsoft") || lower.contains("wsl") {
            return true;
        }
    }

    std::env::var("WSL_DISTRO_NAME").is_ok()
}

/// Whether an executable can be started with `--version`
///
/// Used to probe optional helper programs (espeak-ng, recognizers)
/// before committing to a backend.
pub fn has_program(program: &str) -> bool {
    std::process::Command::new(program)
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_wsl() {
        // Result depends on the host; only check it doesn't panic
        let _ = is_wsl();
    }

    #[test]
    fn test_missing_program() {
        assert!(!has_program("kidspeak-definitely-not-installed"));
    }
}

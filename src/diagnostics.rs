//! System diagnostics and dependency checking.
//!
//! Verifies that the external tools and backends a session relies on are
//! installed and configured.

use crate::config::Config;
use crate::defaults;
use crate::environment::detect_environment;
use std::process::Command;

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Tool is installed and working
    Ok,
    /// Tool is not found
    NotFound,
    /// Tool is found but has issues
    Warning(String),
}

/// Check if a command exists and is executable.
fn check_command(command: &str) -> CheckResult {
    match Command::new(command).arg("--version").output() {
        Ok(output) if output.status.success() => CheckResult::Ok,
        Ok(_) => CheckResult::Warning(format!("'{}' found but --version failed", command)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(format!("Error checking '{}': {}", command, e)),
    }
}

/// pdftotext prints its version to stderr and exits 0 or 99 depending on
/// the poppler release, so any successful spawn counts.
fn check_pdftotext() -> CheckResult {
    match Command::new(defaults::PDFTOTEXT_BINARY).arg("-v").output() {
        Ok(_) => CheckResult::Ok,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(format!("Error checking pdftotext: {}", e)),
    }
}

#[cfg(feature = "cpal-audio")]
fn check_output_device() -> CheckResult {
    if crate::audio::output::has_default_output_device() {
        CheckResult::Ok
    } else {
        CheckResult::Warning("no default output device; audio will be written to files".to_string())
    }
}

#[cfg(not(feature = "cpal-audio"))]
fn check_output_device() -> CheckResult {
    CheckResult::Warning("built without cpal-audio; audio will be written to files".to_string())
}

/// Premium voice needs the backend compiled in and an API key.
fn check_premium(backend_compiled: bool, has_api_key: bool) -> CheckResult {
    match (backend_compiled, has_api_key) {
        (true, true) => CheckResult::Ok,
        (true, false) => CheckResult::NotFound,
        (false, _) => CheckResult::Warning(
            "built without premium-voice; rebuild with: cargo build --release --features premium-voice"
                .to_string(),
        ),
    }
}

/// Run all dependency checks and print results.
pub fn check_dependencies(config: &Config) {
    println!("rehearse {}", crate::version_string());
    println!("Checking system dependencies...\n");

    print!("{} (standard voice): ", config.voice.espeak_binary);
    let espeak_available = match check_command(&config.voice.espeak_binary) {
        CheckResult::Ok => {
            println!("✓ OK");
            true
        }
        CheckResult::NotFound => {
            println!("✗ NOT FOUND");
            println!("  Install: sudo apt install espeak-ng  (Debian/Ubuntu)");
            println!("           sudo pacman -S espeak-ng    (Arch)");
            false
        }
        CheckResult::Warning(msg) => {
            println!("⚠ WARNING: {}", msg);
            true
        }
    };

    print!("pdftotext (PDF documents): ");
    match check_pdftotext() {
        CheckResult::Ok => println!("✓ OK"),
        CheckResult::NotFound => {
            println!("- not installed (plain text documents still work)");
            println!("  Install: sudo apt install poppler-utils  (Debian/Ubuntu)");
            println!("           sudo pacman -S poppler          (Arch)");
        }
        CheckResult::Warning(msg) => println!("⚠ WARNING: {}", msg),
    }

    print!("Audio output device: ");
    match check_output_device() {
        CheckResult::Ok => println!("✓ OK"),
        CheckResult::NotFound => println!("✗ NOT FOUND"),
        CheckResult::Warning(msg) => println!("- {}", msg),
    }

    print!("ElevenLabs (premium voice): ");
    match check_premium(
        cfg!(feature = "premium-voice"),
        config.voice.api_key().is_some(),
    ) {
        CheckResult::Ok => println!("✓ OK (API key configured)"),
        CheckResult::NotFound => {
            println!("- no API key");
            println!("  Set ELEVENLABS_API_KEY or voice.api_key in the config file");
        }
        CheckResult::Warning(msg) => println!("- {}", msg),
    }

    println!();
    println!("Session environment: {}", detect_environment(config));

    println!();
    if espeak_available {
        println!("✓ Ready to rehearse.");
    } else {
        println!("⚠ Narration will be silent until espeak-ng is installed.");
    }
}

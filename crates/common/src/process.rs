//! Helpers for the external tools Reelcap drives (ffmpeg, ffprobe, whisper).

use std::process::{Command, Stdio};

/// Whether `binary` resolves on `PATH` (or is an existing path).
///
/// The name is passed to the shell as a positional argument and never
/// spliced into the script.
pub fn command_exists(binary: &str) -> bool {
    if binary.contains('/') {
        return std::path::Path::new(binary).is_file();
    }
    Command::new("sh")
        .arg("-c")
        .arg(r#"command -v "$1" >/dev/null 2>&1"#)
        .arg("sh")
        .arg(binary)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

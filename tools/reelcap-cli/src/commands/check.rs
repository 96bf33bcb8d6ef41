//! Check that the external tools are installed.

use reelcap_common::config::{config_file_path, AppConfig};
use reelcap_common::process::command_exists;

pub fn run(app: &AppConfig) -> anyhow::Result<()> {
    println!("Reelcap System Check");
    println!("{}", "=".repeat(50));

    let tools = [
        ("Renderer", app.render.ffmpeg.as_str(), true),
        ("Media probe", app.render.ffprobe.as_str(), true),
        ("Transcriber", app.transcription.command.as_str(), false),
    ];

    let mut all_required_ok = true;
    for (label, binary, required) in tools {
        if command_exists(binary) {
            println!("[OK] {label}: {binary}");
        } else if required {
            all_required_ok = false;
            println!("[MISSING] {label}: {binary}");
        } else {
            println!("[WARN] {label}: {binary} not found (use --transcript to skip it)");
        }
    }

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!(
            "[WARN] Config: {} not found, using defaults (run `reelcap init-config`)",
            config_path.display()
        );
    }

    println!();
    if all_required_ok {
        println!("All required tools are available. Reelcap is ready.");
    } else {
        println!("Some required tools are missing. See above.");
    }

    Ok(())
}

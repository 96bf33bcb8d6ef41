//! List the known background tracks.

use reelcap_common::config::AppConfig;

pub fn run(app: &AppConfig) -> anyhow::Result<()> {
    if app.background_tracks.is_empty() {
        println!("No background tracks configured.");
        return Ok(());
    }

    println!("Background tracks");
    println!("{}", "=".repeat(50));
    for (id, track) in app.background_tracks.iter() {
        let status = if track.path.exists() { "OK" } else { "MISSING" };
        println!(
            "[{status}] {id}: {} (gain {}, seek {}s)",
            track.path.display(),
            track.gain,
            track.seek_offset_secs
        );
    }
    Ok(())
}

//! Print the composition timeline without rendering.

use std::path::PathBuf;

use reelcap_common::config::AppConfig;

use super::{prepare_short, ShortArgs};

pub fn run(app: &AppConfig, input: PathBuf, short: ShortArgs) -> anyhow::Result<()> {
    let (_, prepared) = prepare_short(app, &input, &short)?;
    println!("{}", serde_json::to_string_pretty(&prepared.timeline)?);
    Ok(())
}

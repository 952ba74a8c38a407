//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::Comet;

/// Delete everything a previous generate run wrote
pub fn run(app: &Comet) -> Result<()> {
    if app.public_dir.exists() {
        fs::remove_dir_all(&app.public_dir)?;
        tracing::info!("Deleted: {:?}", app.public_dir);
    }

    Ok(())
}

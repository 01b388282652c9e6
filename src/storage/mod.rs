//! Persistence layer.
//!
//! Appends completed-session summaries to a JSON archive file and loads
//! them back. A flat JSON file is sufficient here — sessions end at most a
//! few times per hour and the archive is read only by humans and tests.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::types::SessionSummary;

/// Default archive file path.
const DEFAULT_ARCHIVE_FILE: &str = "pulse_sessions.json";

/// Append sessions to the archive file, creating it if missing.
pub fn archive_sessions(sessions: &[SessionSummary], path: Option<&str>) -> Result<()> {
    if sessions.is_empty() {
        return Ok(());
    }
    let path = path.unwrap_or(DEFAULT_ARCHIVE_FILE);

    let mut archive = load_sessions(Some(path))?;
    archive.extend_from_slice(sessions);

    let json = serde_json::to_string_pretty(&archive)
        .context("Failed to serialise session archive")?;
    std::fs::write(path, &json)
        .context(format!("Failed to write session archive to {path}"))?;

    debug!(path, appended = sessions.len(), total = archive.len(), "Sessions archived");
    Ok(())
}

/// Load all archived sessions. Returns an empty list if the file doesn't
/// exist yet.
pub fn load_sessions(path: Option<&str>) -> Result<Vec<SessionSummary>> {
    let path = path.unwrap_or(DEFAULT_ARCHIVE_FILE);

    if !Path::new(path).exists() {
        return Ok(Vec::new());
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read session archive from {path}"))?;
    let sessions: Vec<SessionSummary> = serde_json::from_str(&json)
        .context(format!("Failed to parse session archive from {path}"))?;

    info!(path, count = sessions.len(), "Session archive loaded");
    Ok(sessions)
}

/// Delete the archive file (for testing or reset).
pub fn delete_archive(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_ARCHIVE_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete session archive {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

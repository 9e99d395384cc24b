//! Application constants and default locations.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Server state directory under the home directory.
pub const SERVER_DIR: &str = ".medtimer";
pub const PID_FILE: &str = "server.pid";
pub const PORT_FILE: &str = "server.port";

/// Port used when no server is running yet.
pub const DEFAULT_PORT: u16 = 58_640;

/// Number of history rows the dashboard shows.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Log filter used when `RUST_LOG` is unset.
pub const fn default_log_filter() -> &'static str {
    "medtimer=info,tower_http=warn"
}

/// `~/.medtimer`, where the server keeps its pid and port files.
pub fn server_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(SERVER_DIR))
}

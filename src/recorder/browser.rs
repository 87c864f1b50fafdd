//! Browser process management.
//!
//! Each measurement launches its own headless Chromium with a fresh
//! temporary profile, so no cookies or cache survive between calls. The
//! process is spawned with `kill_on_drop`, which guarantees the session is
//! released even if the measuring future is cancelled mid-load.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tempfile::TempDir;
use tokio::process::{Child, Command};

use crate::config::{
    BROWSER_CANDIDATES, BROWSER_SHUTDOWN_GRACE, BROWSER_STARTUP_TIMEOUT, VIEWPORT_HEIGHT,
    VIEWPORT_WIDTH,
};
use crate::error_handling::LoadError;

/// Environment variable naming the browser binary, checked when no path is
/// configured.
const BROWSER_ENV_VAR: &str = "PAGE_CARBON_BROWSER";

/// A running headless browser and its temporary profile.
pub(crate) struct BrowserProcess {
    child: Child,
    /// Held for its Drop: removing the directory wipes the cold profile.
    _profile: TempDir,
    /// WebSocket URL of the browser-level DevTools endpoint.
    pub ws_url: String,
}

/// Resolves the browser binary to launch: explicit config, then the
/// `PAGE_CARBON_BROWSER` environment variable, then common Chromium names on
/// PATH.
pub(crate) fn resolve_browser_path(configured: Option<&Path>) -> Result<PathBuf, LoadError> {
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = std::env::var(BROWSER_ENV_VAR) {
        return Ok(PathBuf::from(env_path));
    }
    for candidate in BROWSER_CANDIDATES {
        if let Some(found) = find_on_path(candidate) {
            return Ok(found);
        }
    }
    Err(LoadError::BrowserLaunch(format!(
        "no Chromium binary found; set --browser-path or {}",
        BROWSER_ENV_VAR
    )))
}

fn find_on_path(binary: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

impl BrowserProcess {
    /// Spawns the browser and waits for it to publish its DevTools endpoint.
    pub(crate) async fn launch(binary: &Path) -> Result<Self, LoadError> {
        let profile = TempDir::new().map_err(|e| {
            LoadError::BrowserLaunch(format!("failed to create profile directory: {}", e))
        })?;

        let mut command = Command::new(binary);
        command
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--remote-debugging-port=0")
            .arg(format!("--user-data-dir={}", profile.path().display()))
            .arg(format!(
                "--window-size={},{}",
                VIEWPORT_WIDTH, VIEWPORT_HEIGHT
            ))
            .arg("about:blank")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| {
            LoadError::BrowserLaunch(format!("failed to spawn {}: {}", binary.display(), e))
        })?;

        let ws_url = wait_for_devtools_endpoint(profile.path()).await?;
        log::debug!("Browser ready at {}", ws_url);

        Ok(BrowserProcess {
            child,
            _profile: profile,
            ws_url,
        })
    }

    /// Reaps the browser process, killing it if it does not exit within the
    /// grace period. Callers send `Browser.close` over the wire first; this
    /// is the backstop.
    pub(crate) async fn shutdown(mut self) {
        match tokio::time::timeout(BROWSER_SHUTDOWN_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => log::debug!("Browser exited with {}", status),
            Ok(Err(e)) => log::warn!("Failed to reap browser process: {}", e),
            Err(_) => {
                log::debug!("Browser did not exit in time, killing it");
                if let Err(e) = self.child.start_kill() {
                    log::warn!("Failed to kill browser process: {}", e);
                }
                let _ = self.child.wait().await;
            }
        }
    }
}

/// Polls the profile's `DevToolsActivePort` file until the browser has
/// written its chosen port and browser-target path.
async fn wait_for_devtools_endpoint(profile: &Path) -> Result<String, LoadError> {
    let port_file = profile.join("DevToolsActivePort");
    let deadline = tokio::time::Instant::now() + BROWSER_STARTUP_TIMEOUT;

    loop {
        if let Ok(content) = tokio::fs::read_to_string(&port_file).await {
            let mut lines = content.lines();
            if let (Some(port), Some(path)) = (lines.next(), lines.next()) {
                if let Ok(port) = port.trim().parse::<u16>() {
                    return Ok(format!("ws://127.0.0.1:{}{}", port, path.trim()));
                }
            }
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(LoadError::BrowserLaunch(format!(
                "browser did not publish a DevTools endpoint within {:?}",
                BROWSER_STARTUP_TIMEOUT
            )));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

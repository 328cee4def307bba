use crate::{RecorderError, Result};
use std::path::{Path, PathBuf};

pub fn find_chrome_executable() -> Result<PathBuf> {
    if let Some(path) = find_in_standard_locations()? {
        return Ok(path);
    }

    if let Some(path) = find_in_path() {
        return Ok(path);
    }

    Err(RecorderError::LaunchFailed(
        "no Chrome/Chromium executable found; set browser.chrome_path or pass --chrome-path"
            .into(),
    ))
}

#[cfg(target_os = "macos")]
fn find_in_standard_locations() -> Result<Option<PathBuf>> {
    let paths = [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/Applications/Google Chrome Canary.app/Contents/MacOS/Google Chrome Canary",
        "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
    ];

    for path in &paths {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(Some(p));
        }
    }

    Ok(None)
}

#[cfg(target_os = "linux")]
fn find_in_standard_locations() -> Result<Option<PathBuf>> {
    let paths = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
    ];

    for path in &paths {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(Some(p));
        }
    }

    Ok(None)
}

#[cfg(target_os = "windows")]
fn find_in_standard_locations() -> Result<Option<PathBuf>> {
    let paths = [
        r"C:\Program Files\Google\Chrome\Application\chrome.exe",
        r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        r"C:\Program Files\Chromium\Application\chrome.exe",
        r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
    ];

    for path in &paths {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(Some(p));
        }
    }

    if let Ok(local_app_data) = std::env::var("LOCALAPPDATA") {
        let user_chrome = PathBuf::from(&local_app_data)
            .join("Google")
            .join("Chrome")
            .join("Application")
            .join("chrome.exe");
        if user_chrome.exists() {
            return Ok(Some(user_chrome));
        }
    }

    Ok(None)
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn find_in_standard_locations() -> Result<Option<PathBuf>> {
    Ok(None)
}

fn find_in_path() -> Option<PathBuf> {
    let binaries = if cfg!(windows) {
        vec!["chrome.exe", "chromium.exe"]
    } else {
        vec!["google-chrome", "chromium", "chromium-browser", "chrome"]
    };

    for binary in binaries {
        if let Ok(path) = which::which(binary) {
            return Some(path);
        }
    }

    None
}

/// Configured executable if given, otherwise the first one found on this machine.
pub fn resolve_chrome_executable(configured: Option<&Path>) -> Result<PathBuf> {
    match configured {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        Some(path) => Err(RecorderError::LaunchFailed(format!(
            "Chrome executable not found at {}",
            path.display()
        ))),
        None => find_chrome_executable(),
    }
}

/// Milliseconds since the epoch, rendered as local wall-clock time.
pub fn format_epoch_ms(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%H:%M:%S%.3f")
                .to_string()
        })
        .unwrap_or_else(|| format!("+{}ms", timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_missing_configured_path() {
        let err = resolve_chrome_executable(Some(Path::new("/nonexistent/chrome"))).unwrap_err();
        assert!(matches!(err, RecorderError::LaunchFailed(_)));
    }

    #[test]
    fn test_format_epoch_ms_out_of_range() {
        assert_eq!(format_epoch_ms(u64::MAX), format!("+{}ms", u64::MAX));
        assert!(!format_epoch_ms(1_700_000_000_000).is_empty());
    }
}

//! Device scan port: lists candidate board tty paths.
//!
//! The default adapter walks `/dev` and matches names against simple
//! `prefix*` glob patterns (`/dev/ttyUSB*`, `/dev/ttyACM*`, `/dev/cu.usb*`
//! on macOS) — the only shape the patterns need.  Results are sorted so
//! "the first registered device" is stable across scans.

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;

/// Error type for device scans.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The device directory could not be listed.
    #[error("failed to list {dir}: {source}")]
    List {
        dir: String,
        #[source]
        source: std::io::Error,
    },
}

/// Lists the paths of currently present candidate boards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceScanner: Send + Sync {
    async fn scan(&self) -> Result<Vec<String>, ScanError>;
}

/// A [`DeviceScanner`] over `prefix*` patterns in the filesystem.
#[derive(Debug, Clone)]
pub struct GlobScanner {
    patterns: Vec<String>,
}

impl GlobScanner {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }
}

#[async_trait]
impl DeviceScanner for GlobScanner {
    async fn scan(&self) -> Result<Vec<String>, ScanError> {
        let mut found = Vec::new();
        for pattern in &self.patterns {
            let (dir, prefix) = split_pattern(pattern);
            let mut entries = match fs::read_dir(dir).await {
                Ok(entries) => entries,
                // A missing device directory just means no boards.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(ScanError::List {
                        dir: dir.to_string(),
                        source,
                    })
                }
            };
            while let Some(entry) = entries.next_entry().await.map_err(|source| {
                ScanError::List {
                    dir: dir.to_string(),
                    source,
                }
            })? {
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                if name.starts_with(prefix) {
                    found.push(format!("{dir}/{name}"));
                }
            }
        }
        found.sort();
        found.dedup();
        Ok(found)
    }
}

/// Splits `"/dev/ttyUSB*"` into `("/dev", "ttyUSB")`.
fn split_pattern(pattern: &str) -> (&str, &str) {
    let trimmed = pattern.strip_suffix('*').unwrap_or(pattern);
    match trimmed.rsplit_once('/') {
        Some((dir, prefix)) if !dir.is_empty() => (dir, prefix),
        _ => ("/", trimmed.trim_start_matches('/')),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pattern_separates_dir_and_prefix() {
        assert_eq!(split_pattern("/dev/ttyUSB*"), ("/dev", "ttyUSB"));
        assert_eq!(split_pattern("/dev/cu.usb*"), ("/dev", "cu.usb"));
    }

    #[tokio::test]
    async fn test_glob_scanner_matches_prefixes_in_a_temp_dir() {
        // Arrange: a fake /dev with two boards and a distractor
        let dir = std::env::temp_dir().join(format!("boardlink_scan_{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        for name in ["ttyUSB0", "ttyUSB1", "console"] {
            tokio::fs::write(dir.join(name), b"").await.unwrap();
        }
        let dir_str = dir.to_string_lossy().to_string();

        // Act
        let scanner = GlobScanner::new(vec![format!("{dir_str}/ttyUSB*")]);
        let found = scanner.scan().await.unwrap();

        // Assert: sorted, distractor excluded
        assert_eq!(
            found,
            vec![format!("{dir_str}/ttyUSB0"), format!("{dir_str}/ttyUSB1")]
        );

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_missing_device_directory_scans_empty() {
        let scanner = GlobScanner::new(vec!["/nonexistent-dir/ttyUSB*".to_string()]);
        assert!(scanner.scan().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mock_scanner_returns_scripted_paths() {
        // MockDeviceScanner is generated by mockall for use in service tests.
        let mut scanner = MockDeviceScanner::new();
        scanner
            .expect_scan()
            .returning(|| Ok(vec!["/dev/ttyUSB0".to_string()]));

        assert_eq!(scanner.scan().await.unwrap(), vec!["/dev/ttyUSB0"]);
    }
}

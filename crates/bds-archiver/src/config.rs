//! Archiver settings, loaded from an optional TOML file.

use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    path::{Path, PathBuf},
    time::Duration,
};

use bds_packets::registry::DEFAULT_LEVEL_NAME;
use bds_palette::CanonicalPolicy;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ArchiverError, Result};

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "BDS_ARCHIVER_CONFIG";

#[cfg(windows)]
const SERVER_BINARY: &str = "bedrock_server.exe";
#[cfg(not(windows))]
const SERVER_BINARY: &str = "bedrock_server";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiverConfig {
    /// Root for relative `server_dir`.
    pub scratch_dir: PathBuf,
    /// Unpacked dedicated server; the process runs with this as its cwd.
    pub server_dir: PathBuf,
    pub server_binary: String,
    pub export_dir: PathBuf,
    pub handoff_addr: SocketAddr,
    pub relay_addr: SocketAddr,
    pub startup_timeout_secs: u64,
    pub handoff_timeout_secs: u64,
    pub capture_timeout_secs: u64,
    /// World name the server reports in StartGame.
    pub level_name: String,
    pub palette: CanonicalPolicy,
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from("scratch"),
            server_dir: PathBuf::from("server"),
            server_binary: SERVER_BINARY.to_owned(),
            export_dir: PathBuf::from("export"),
            handoff_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 2001)),
            relay_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 19140)),
            startup_timeout_secs: 300,
            handoff_timeout_secs: 300,
            capture_timeout_secs: 30,
            level_name: DEFAULT_LEVEL_NAME.to_owned(),
            palette: CanonicalPolicy::default(),
        }
    }
}

impl ArchiverConfig {
    /// Load `path`, else the file named by [`CONFIG_ENV`], else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = toml::from_str(&text).map_err(|source| ArchiverError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    #[must_use]
    pub fn server_dir(&self) -> PathBuf {
        self.scratch_dir.join(&self.server_dir)
    }

    #[must_use]
    pub fn server_binary_path(&self) -> PathBuf {
        self.server_dir().join(&self.server_binary)
    }

    #[must_use]
    pub fn export_path(&self, file: &str) -> PathBuf {
        self.export_dir.join(file)
    }

    #[must_use]
    pub const fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    #[must_use]
    pub const fn handoff_timeout(&self) -> Duration {
        Duration::from_secs(self.handoff_timeout_secs)
    }

    #[must_use]
    pub const fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use bds_palette::DedupScope;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config: ArchiverConfig = toml::from_str("").unwrap();
        assert_eq!(config, ArchiverConfig::default());
        assert_eq!(config.handoff_addr.port(), 2001);
        assert_eq!(config.capture_timeout(), Duration::from_secs(30));
        assert_eq!(
            config.server_binary_path(),
            Path::new("scratch").join("server").join(SERVER_BINARY)
        );
    }

    #[test]
    fn test_partial_file() {
        let config: ArchiverConfig = toml::from_str(
            r#"
            export_dir = "/tmp/out"
            relay_addr = "127.0.0.1:4000"
            level_name = "Archive"

            [palette]
            allow_list = ["color"]
            dedup_scope = "flagged_blocks"

            [[palette.overrides]]
            blocks = ["minecraft:lever"]
            drop = ["lever_direction"]
            "#,
        )
        .unwrap();
        assert_eq!(config.export_path("report.json"), Path::new("/tmp/out/report.json"));
        assert_eq!(config.relay_addr.port(), 4000);
        assert_eq!(config.level_name, "Archive");
        assert_eq!(config.startup_timeout_secs, 300);
        assert_eq!(config.palette.allow_list, ["color"]);
        assert_eq!(config.palette.dedup_scope, DedupScope::FlaggedBlocks);
        assert_eq!(config.palette.overrides.len(), 1);
        // supersession rules untouched
        assert_eq!(
            config.palette.supersedes,
            CanonicalPolicy::default().supersedes
        );
    }

    #[test]
    fn test_bad_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archiver.toml");
        std::fs::write(&path, "capture_timeout_secs = \"soon\"").unwrap();
        let err = ArchiverConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ArchiverError::Config { path: ref p, .. } if p == &path));
    }
}

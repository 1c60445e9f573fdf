//! The dedicated server as a scoped child process.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines},
    process::{Child, ChildStderr, ChildStdout, Command},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{ArchiverError, Result, config::ArchiverConfig};

/// Line the server prints once the world is loaded.
pub const READY_LINE: &str = "Server started";

type StdoutLines = Lines<BufReader<ChildStdout>>;
type StderrLines = Lines<BufReader<ChildStderr>>;

/// A running dedicated server.
///
/// [`ServerProcess::shutdown`] may be called from every exit path; only the
/// first call does anything. Dropping the value performs the same release
/// without waiting for the child.
pub struct ServerProcess {
    binary: PathBuf,
    child: Option<Child>,
    forwarders: Vec<JoinHandle<()>>,
}

impl ServerProcess {
    pub async fn spawn(config: &ArchiverConfig) -> Result<Self> {
        Self::start(
            &config.server_binary_path(),
            &config.server_dir(),
            config.startup_timeout(),
        )
        .await
    }

    /// Start `binary` in `cwd` and wait for [`READY_LINE`].
    ///
    /// Any stderr output before that line is a failed start.
    pub async fn start(binary: &Path, cwd: &Path, startup_timeout: Duration) -> Result<Self> {
        make_executable(binary)?;
        info!("Starting {}", binary.display());

        let mut child = Command::new(binary)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ArchiverError::Spawn {
                path: binary.to_path_buf(),
                source,
            })?;

        let stdout = child.stdout.take().map(|s| BufReader::new(s).lines());
        let stderr = child.stderr.take().map(|s| BufReader::new(s).lines());
        let mut server = Self {
            binary: binary.to_path_buf(),
            child: Some(child),
            forwarders: Vec::new(),
        };

        let (Some(mut stdout), Some(mut stderr)) = (stdout, stderr) else {
            server.shutdown().await?;
            return Err(ArchiverError::ServerExited);
        };

        let ready = tokio::time::timeout(
            startup_timeout,
            wait_ready(&mut stdout, &mut stderr),
        )
        .await
        .unwrap_or(Err(ArchiverError::Timeout {
            what: "server startup",
            timeout: startup_timeout,
        }));

        if let Err(e) = ready {
            warn!("Server failed to start: {}", e);
            server.shutdown().await?;
            return Err(e);
        }

        info!("Server ready");
        server.forwarders.push(tokio::spawn(forward_stdout(stdout)));
        server.forwarders.push(tokio::spawn(forward_stderr(stderr)));
        Ok(server)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Detach the output streams, then kill and reap the child.
    pub async fn shutdown(&mut self) -> Result<()> {
        for forwarder in self.forwarders.drain(..) {
            forwarder.abort();
        }
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        if let Err(e) = child.kill().await {
            // already exited
            debug!("kill: {}", e);
        }
        let status = child.wait().await?;
        info!("Server stopped ({})", status);
        Ok(())
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        for forwarder in &self.forwarders {
            forwarder.abort();
        }
        if let Some(child) = &mut self.child {
            // Best-effort kill
            let _ = child.start_kill();
        }
    }
}

async fn wait_ready(stdout: &mut StdoutLines, stderr: &mut StderrLines) -> Result<()> {
    let mut stderr_open = true;
    loop {
        tokio::select! {
            line = stdout.next_line() => match line? {
                Some(line) => {
                    info!(target: "bds_server", "{}", line);
                    if line.contains(READY_LINE) {
                        return Ok(());
                    }
                }
                None => return Err(ArchiverError::ServerExited),
            },
            line = stderr.next_line(), if stderr_open => match line? {
                Some(line) => {
                    warn!(target: "bds_server", "{}", line);
                    return Err(ArchiverError::ServerStderr(line));
                }
                None => stderr_open = false,
            },
        }
    }
}

async fn forward_stdout(mut lines: StdoutLines) {
    while let Ok(Some(line)) = lines.next_line().await {
        info!(target: "bds_server", "{}", line);
    }
}

async fn forward_stderr(mut lines: StderrLines) {
    while let Ok(Some(line)) = lines.next_line().await {
        warn!(target: "bds_server", "{}", line);
    }
}

#[cfg(unix)]
fn make_executable(binary: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(binary)
        .map_err(|source| ArchiverError::Spawn {
            path: binary.to_path_buf(),
            source,
        })?
        .permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(binary, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_binary: &Path) -> Result<()> {
    Ok(())
}

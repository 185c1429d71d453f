//! Pin oracle: runs the target under Intel Pin's `inscount0` tracer
//!
//! Command line: `pin -t <tool> -o <artifact> -- <target> [args...] [value]`.
//! The candidate goes either on stdin (followed by a newline) or as the last
//! argument. Every call writes its own artifact inside a private temporary
//! directory, named after the position, the symbol and a call counter, so
//! concurrent probes never read each other's output.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, trace};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use crate::core::Oracle;
use crate::types::{Architecture, InputMode, OracleError, ProbeRequest};
use crate::{INSCOUNT_TOOL, MANUAL_EXAMPLES_DIR};

/// How to invoke Pin and the target
#[derive(Debug, Clone)]
pub struct PinSettings {
    /// The `pin` driver executable
    pub pin: PathBuf,
    /// Tracer module passed with `-t`
    pub tool: PathBuf,
    /// Binary under test
    pub target: PathBuf,
    /// Extra arguments placed before the candidate
    pub target_args: Vec<String>,
    pub input: InputMode,
    /// Kill a probe that runs longer than this
    pub timeout: Option<Duration>,
}

impl PinSettings {
    /// Standard layout under a Pin installation root
    pub fn from_root(root: &Path, arch: Architecture, target: impl Into<PathBuf>) -> Self {
        Self {
            pin: root.join("pin"),
            tool: root.join(MANUAL_EXAMPLES_DIR).join(arch.object_dir()).join(INSCOUNT_TOOL),
            target: target.into(),
            target_args: Vec::new(),
            input: InputMode::Stdin,
            timeout: None,
        }
    }
}

/// Oracle backed by real instrumented executions
#[derive(Debug)]
pub struct PinOracle {
    settings: PinSettings,
    workdir: TempDir,
    counter: AtomicU64,
}

impl PinOracle {
    /// Create the oracle and its private artifact directory.
    /// The directory and everything in it is removed on drop.
    pub fn new(settings: PinSettings) -> Result<Self, OracleError> {
        let workdir = tempfile::Builder::new()
            .prefix("pintool-")
            .tempdir()
            .map_err(OracleError::Workspace)?;
        debug!("Artifacts go to {}", workdir.path().display());
        Ok(Self { settings, workdir, counter: AtomicU64::new(0) })
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    /// Unique artifact path for one call
    fn artifact_path(&self, request: &ProbeRequest) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        // Symbol as a code point so '/' or '.' never end up in a file name
        self.workdir.path().join(format!(
            "inscount-{}-{:x}-{}.out",
            request.position, request.symbol as u32, n
        ))
    }

    fn command(&self, request: &ProbeRequest, artifact: &Path) -> Command {
        let s = &self.settings;
        let mut cmd = Command::new(&s.pin);
        cmd.arg("-t")
            .arg(&s.tool)
            .arg("-o")
            .arg(artifact)
            .arg("--")
            .arg(&s.target)
            .args(&s.target_args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match s.input {
            InputMode::Argv => {
                cmd.arg(&request.value).stdin(Stdio::null());
            }
            InputMode::Stdin => {
                cmd.stdin(Stdio::piped());
            }
        }
        cmd
    }

    async fn run(
        &self,
        request: &ProbeRequest,
        artifact: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), OracleError> {
        let mut child = self.command(request, artifact).spawn().map_err(OracleError::Launch)?;

        if let Some(mut stdin) = child.stdin.take() {
            let line = format!("{}\n", request.value);
            if let Err(e) = stdin.write_all(line.as_bytes()).await {
                // The target may exit without reading its input
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    terminate(&mut child).await;
                    return Err(OracleError::Stdin(e));
                }
            }
        }

        let deadline = async {
            match self.settings.timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                terminate(&mut child).await;
                debug!("{} cancelled", request.value);
                return Err(OracleError::Cancelled);
            }
            _ = deadline => {
                terminate(&mut child).await;
                return Err(OracleError::Timeout(self.settings.timeout.unwrap_or_default()));
            }
            status = child.wait() => status.map_err(OracleError::Wait)?,
        };

        // Non-zero codes are normal: the target rejects wrong input.
        // Death by signal is not.
        if status.code().is_none() {
            return Err(OracleError::AbnormalExit(status.to_string()));
        }
        Ok(())
    }
}

impl Oracle for PinOracle {
    async fn probe(
        &self,
        request: &ProbeRequest,
        cancel: &CancellationToken,
    ) -> Result<i64, OracleError> {
        if cancel.is_cancelled() {
            return Err(OracleError::Cancelled);
        }
        let artifact = self.artifact_path(request);
        trace!("{} -> {}", request.value, artifact.display());

        let outcome = self.run(request, &artifact, cancel).await;
        let metric = match outcome {
            Ok(()) => read_artifact(&artifact).await,
            Err(e) => Err(e),
        };
        let _ = tokio::fs::remove_file(&artifact).await;
        metric
    }
}

/// Kill the child and wait for it to be reaped
async fn terminate(child: &mut Child) {
    if let Err(e) = child.kill().await {
        debug!("kill failed: {}", e);
    }
}

async fn read_artifact(path: &Path) -> Result<i64, OracleError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(OracleError::MissingArtifact(path.to_path_buf()));
        }
        Err(source) => {
            return Err(OracleError::Artifact { path: path.to_path_buf(), source });
        }
    };
    parse_inscount(&content)
}

/// Extract the instruction count from artifact text.
///
/// The count is the token before the first space. When that token is a
/// label (`inscount0` writes `Count 12345`), the token after it is used.
/// Counts are non-negative; a signed or oversized token is unparsable.
pub fn parse_inscount(content: &str) -> Result<i64, OracleError> {
    let content = content.trim();
    let (head, tail) = content.split_once(' ').unwrap_or((content, ""));
    let count = |token: &str| token.parse::<u64>().ok().and_then(|n| i64::try_from(n).ok());

    count(head)
        .or_else(|| count(tail.split_whitespace().next().unwrap_or("")))
        .ok_or_else(|| OracleError::Unparsable(content.chars().take(64).collect()))
}

// =============================================================================
// TESTS
// =============================================================================

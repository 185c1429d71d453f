//! Integration tests for the Pin oracle
//!
//! A shell script stands in for the `pin` driver. It takes the same command
//! line (`-t TOOL -o OUT -- TARGET ARGS...`), runs the target, and writes
//! the target's stdout as the instruction count into OUT.

#![cfg(unix)]

use pintool::core::{Comparator, Oracle, PinOracle, PinSettings, SearchEngine};
use pintool::types::{InputMode, OracleError, ProbeRequest, SolverConfig};
use pretty_assertions::assert_eq;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const DRIVER: &str = r#"
out="$4"
shift 5
count=$("$@")
echo "$count instructions" > "$out"
"#;

/// Prints 1000 + 7 per leading character matching "pin"
const PREFIX_TARGET: &str = r#"
if [ $# -gt 0 ]; then value="$1"; else read -r value; fi
s="pin"
v="$value"
n=0
while [ -n "$v" ] && [ -n "$s" ]; do
  vc="${v%"${v#?}"}"
  sc="${s%"${s#?}"}"
  [ "$vc" = "$sc" ] || break
  n=$((n + 1))
  v="${v#?}"
  s="${s#?}"
done
echo $((1000 + n * 7))
"#;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn settings(driver: PathBuf, target: PathBuf, input: InputMode) -> PinSettings {
    PinSettings {
        pin: driver,
        tool: PathBuf::from("/dev/null"),
        target,
        target_args: Vec::new(),
        input,
        timeout: None,
    }
}

fn probe_request(value: &str) -> ProbeRequest {
    ProbeRequest::new(0, value.chars().next().unwrap_or('-'), value)
}

#[tokio::test]
async fn test_stdin_delivery() {
    let dir = TempDir::new().unwrap();
    let driver = script(dir.path(), "pin", DRIVER);
    let target = script(dir.path(), "target", PREFIX_TARGET);
    let oracle = PinOracle::new(settings(driver, target, InputMode::Stdin)).unwrap();
    let token = CancellationToken::new();

    assert_eq!(oracle.probe(&probe_request("---"), &token).await.unwrap(), 1000);
    assert_eq!(oracle.probe(&probe_request("pi-"), &token).await.unwrap(), 1014);
}

#[tokio::test]
async fn test_argv_delivery() {
    let dir = TempDir::new().unwrap();
    let driver = script(dir.path(), "pin", DRIVER);
    let target = script(dir.path(), "target", PREFIX_TARGET);
    let oracle = PinOracle::new(settings(driver, target, InputMode::Argv)).unwrap();

    let metric = oracle.probe(&probe_request("pin"), &CancellationToken::new()).await.unwrap();
    assert_eq!(metric, 1021);
}

#[tokio::test]
async fn test_extra_args_come_before_candidate() {
    let dir = TempDir::new().unwrap();
    let driver = script(dir.path(), "pin", DRIVER);
    let target = script(dir.path(), "target", r#"echo "$#$1""#);
    let mut settings = settings(driver, target, InputMode::Argv);
    settings.target_args = vec!["7".to_string(), "x".to_string()];
    let oracle = PinOracle::new(settings).unwrap();

    // Three arguments, the first being "7"
    let metric = oracle.probe(&probe_request("abc"), &CancellationToken::new()).await.unwrap();
    assert_eq!(metric, 37);
}

#[tokio::test]
async fn test_missing_artifact() {
    let dir = TempDir::new().unwrap();
    let driver = script(dir.path(), "pin", "exit 0");
    let target = script(dir.path(), "target", "exit 0");
    let oracle = PinOracle::new(settings(driver, target, InputMode::Stdin)).unwrap();

    let result = oracle.probe(&probe_request("a"), &CancellationToken::new()).await;
    assert!(matches!(result, Err(OracleError::MissingArtifact(_))), "{:?}", result);
}

#[tokio::test]
async fn test_unparsable_artifact() {
    let dir = TempDir::new().unwrap();
    let driver = script(dir.path(), "pin", r#"echo "many instructions" > "$4""#);
    let target = script(dir.path(), "target", "exit 0");
    let oracle = PinOracle::new(settings(driver, target, InputMode::Argv)).unwrap();

    let result = oracle.probe(&probe_request("a"), &CancellationToken::new()).await;
    assert!(matches!(result, Err(OracleError::Unparsable(_))), "{:?}", result);
}

#[tokio::test]
async fn test_labelled_count_artifact() {
    let dir = TempDir::new().unwrap();
    let driver = script(dir.path(), "pin", r#"echo "Count 4242" > "$4""#);
    let target = script(dir.path(), "target", "exit 0");
    let oracle = PinOracle::new(settings(driver, target, InputMode::Argv)).unwrap();

    let metric = oracle.probe(&probe_request("a"), &CancellationToken::new()).await.unwrap();
    assert_eq!(metric, 4242);
}

#[tokio::test]
async fn test_killed_driver_is_abnormal() {
    let dir = TempDir::new().unwrap();
    let driver = script(dir.path(), "pin", "kill -9 $$");
    let target = script(dir.path(), "target", "exit 0");
    let oracle = PinOracle::new(settings(driver, target, InputMode::Argv)).unwrap();

    let result = oracle.probe(&probe_request("a"), &CancellationToken::new()).await;
    assert!(matches!(result, Err(OracleError::AbnormalExit(_))), "{:?}", result);
}

#[tokio::test]
async fn test_cancellation_kills_probe() {
    let dir = TempDir::new().unwrap();
    let driver = script(dir.path(), "pin", "exec sleep 30");
    let target = script(dir.path(), "target", "exit 0");
    let oracle = PinOracle::new(settings(driver, target, InputMode::Argv)).unwrap();
    let token = CancellationToken::new();

    let started = Instant::now();
    let trigger = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    };
    let request = probe_request("a");
    let (result, ()) = tokio::join!(oracle.probe(&request, &token), trigger);

    assert!(matches!(result, Err(OracleError::Cancelled)), "{:?}", result);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_timeout_kills_probe() {
    let dir = TempDir::new().unwrap();
    let driver = script(dir.path(), "pin", "exec sleep 30");
    let target = script(dir.path(), "target", "exit 0");
    let mut settings = settings(driver, target, InputMode::Stdin);
    settings.timeout = Some(Duration::from_millis(100));
    let oracle = PinOracle::new(settings).unwrap();

    let result = oracle.probe(&probe_request("a"), &CancellationToken::new()).await;
    assert!(matches!(result, Err(OracleError::Timeout(_))), "{:?}", result);
}

/// Full solve through real processes, artifacts cleaned up per call
#[tokio::test]
async fn test_solve_through_driver() {
    let dir = TempDir::new().unwrap();
    let driver = script(dir.path(), "pin", DRIVER);
    let target = script(dir.path(), "target", PREFIX_TARGET);
    let oracle = PinOracle::new(settings(driver, target, InputMode::Stdin)).unwrap();

    let engine = SearchEngine::new(
        SolverConfig::with_length(3),
        "abcdefghijklmnop".chars().collect(),
        Comparator::parse("== 7").unwrap(),
    )
    .unwrap();
    let report = engine.solve(&oracle).await.unwrap();

    assert_eq!(report.secret, "pin");
    assert_eq!(std::fs::read_dir(oracle.workdir()).unwrap().count(), 0);
}

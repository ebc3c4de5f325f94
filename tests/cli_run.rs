// tests/cli_run.rs
//
// End-to-end through the library entry point with real shell commands.
#![cfg(unix)]

use std::error::Error;
use std::fs;
use std::path::Path;

use clap::Parser;

use testdag::cli::{CliArgs, Command};
use testdag::errors::EXIT_PRE_EXECUTION;
use testdag_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn args(manifest: &Path, extra: &[&str]) -> Result<CliArgs, clap::Error> {
    let manifest = manifest.display().to_string();
    let mut argv = vec!["testdag", "run", "--manifest", manifest.as_str()];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv)
}

fn manifest(dir: &Path, contents: &str) -> Result<std::path::PathBuf, Box<dyn Error>> {
    let path = dir.join("Testdag.toml");
    fs::write(&path, contents)?;
    Ok(path)
}

const PASSING: &str = r#"
[[unit]]
name = "Login"
cmd = "true"

[[unit]]
name = "Collection"
cmd = "true"
depends_on = ["Login"]
"#;

#[tokio::test]
async fn passing_run_exits_zero() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = manifest(dir.path(), PASSING)?;

    let code = with_timeout(testdag::run(args(&path, &["--format", "json"])?)).await?;
    assert_eq!(code, 0);
    Ok(())
}

#[tokio::test]
async fn failing_unit_exits_one() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = manifest(
        dir.path(),
        r#"
[[unit]]
name = "Login"
cmd = "exit 1"

[[unit]]
name = "Collection"
cmd = "true"
depends_on = ["Login"]
"#,
    )?;

    let code = with_timeout(testdag::run(args(&path, &["-j", "2"])?)).await?;
    assert_eq!(code, 1);
    Ok(())
}

#[tokio::test]
async fn cycle_exits_before_execution() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("ran");
    let path = manifest(
        dir.path(),
        &format!(
            r#"
[[unit]]
name = "A"
cmd = "touch {}"
depends_on = ["B"]

[[unit]]
name = "B"
cmd = "true"
depends_on = ["A"]
"#,
            marker.display()
        ),
    )?;

    let err = with_timeout(testdag::run(args(&path, &[])?))
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), EXIT_PRE_EXECUTION);
    assert!(err.to_string().contains("A -> B -> A"), "{err}");
    assert!(!marker.exists());
    Ok(())
}

#[tokio::test]
async fn selecting_a_unit_runs_its_prerequisites_only() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = manifest(
        dir.path(),
        r#"
[[unit]]
name = "Login"
cmd = "touch login.ran"

[[unit]]
name = "Collection"
cmd = "touch collection.ran"
depends_on = ["Login"]

[[unit]]
name = "Unrelated"
cmd = "touch unrelated.ran"
"#,
    )?;

    let code = with_timeout(testdag::run(args(&path, &["--unit", "Collection"])?)).await?;
    assert_eq!(code, 0);
    assert!(dir.path().join("login.ran").exists());
    assert!(dir.path().join("collection.ran").exists());
    assert!(!dir.path().join("unrelated.ran").exists());
    Ok(())
}

#[tokio::test]
async fn check_does_not_execute() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = manifest(
        dir.path(),
        "[[unit]]\nname = \"A\"\ncmd = \"touch a.ran\"\n",
    )?;

    let cli = CliArgs::try_parse_from([
        "testdag",
        "check",
        "--manifest",
        path.display().to_string().as_str(),
    ])?;
    assert!(matches!(cli.command, Command::Check(_)));

    let code = with_timeout(testdag::run(cli)).await?;
    assert_eq!(code, 0);
    assert!(!dir.path().join("a.ran").exists());
    Ok(())
}

#[test]
fn cli_rejects_zero_concurrency_and_bad_durations() {
    let parse = |extra: &[&str]| {
        let mut argv = vec!["testdag", "run"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv)
    };

    assert!(parse(&["--concurrency", "0"]).is_err());
    assert!(parse(&["--timeout", "soon"]).is_err());
    assert!(parse(&["--format", "xml"]).is_err());

    let ok = parse(&[
        "--concurrency",
        "4",
        "--timeout",
        "10m",
        "--unit-timeout",
        "90s",
        "--unit",
        "A",
        "--unit",
        "B",
        "--hard-cancel",
    ])
    .expect("valid arguments");
    let Command::Run(run) = ok.command else {
        panic!("expected run subcommand");
    };
    assert_eq!(run.concurrency, Some(4));
    assert_eq!(run.units, vec!["A", "B"]);
    assert!(run.hard_cancel);
    assert_eq!(run.overrides().timeout, Some(std::time::Duration::from_secs(600)));
}

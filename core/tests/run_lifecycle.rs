#![cfg(unix)]

mod common;

use common::{cab, params};

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use cabrig_core::api::{run_cab, RuntimeStatus, ValidationFlags};
use pretty_assertions::assert_eq;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("script body");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("script mode");
    path
}

#[tokio::test]
async fn clean_runs_report_success() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tool = script(dir.path(), "greet", "#!/bin/sh\necho \"hello $1\"\n");

    let mut greet = cab(&format!(
        r#"
        name = "greet"
        command = "{}"

        [inputs.who]
        dtype = "str"
        required = true
        [inputs.who.policies]
        positional = true
        "#,
        tool.display()
    ));
    greet
        .validate(
            &params(&[("who", "world".into())]),
            None,
            ValidationFlags::default(),
        )
        .expect("validation passes");

    let outcome = run_cab(&mut greet, None).await.expect("run completes");
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.status, RuntimeStatus::Unknown);
    assert!(outcome.success());
}

#[tokio::test]
async fn failure_verdict_beats_a_clean_exit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tool = script(
        dir.path(),
        "flaky",
        "#!/bin/sh\necho \"error: disk on fire\"\nexit 0\n",
    );

    let mut flaky = cab(&format!(
        r#"
        name = "flaky"
        command = "{}"

        [management.wranglers]
        "error: " = "DECLARE_FAILURE"
        "#,
        tool.display()
    ));
    flaky
        .validate(&params(&[]), None, ValidationFlags::default())
        .expect("no parameters");

    let outcome = run_cab(&mut flaky, None).await.expect("run completes");
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.status, RuntimeStatus::Failure);
    assert!(!outcome.success());
    assert_eq!(flaky.runtime_status(), RuntimeStatus::Failure);
}

#[tokio::test]
async fn cleanup_globs_sweep_task_droppings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tool = script(
        dir.path(),
        "messy",
        "#!/bin/sh\ncd \"$(dirname \"$0\")\"\ntouch scratch-a.tmp scratch-b.tmp result.out\n",
    );

    let mut messy = cab(&format!(
        r#"
        name = "messy"
        command = "{tool}"

        [management.cleanup]
        "{base}" = "*.tmp"
        "#,
        tool = tool.display(),
        base = dir.path().display()
    ));
    messy
        .validate(&params(&[]), None, ValidationFlags::default())
        .expect("no parameters");

    let outcome = run_cab(&mut messy, None).await.expect("run completes");
    assert!(outcome.success());
    assert!(!dir.path().join("scratch-a.tmp").exists());
    assert!(!dir.path().join("scratch-b.tmp").exists());
    assert!(dir.path().join("result.out").exists());
}

#[tokio::test]
async fn verdicts_reset_between_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tool = script(dir.path(), "parrot", "#!/bin/sh\necho \"$1\"\n");

    let mut parrot = cab(&format!(
        r#"
        name = "parrot"
        command = "{}"

        [inputs.say]
        dtype = "str"
        required = true
        [inputs.say.policies]
        positional = true

        [management.wranglers]
        "boom" = "DECLARE_FAILURE"
        "#,
        tool.display()
    ));
    parrot
        .validate(
            &params(&[("say", "boom".into())]),
            None,
            ValidationFlags::default(),
        )
        .expect("validation passes");

    let first = run_cab(&mut parrot, None).await.expect("first run");
    assert_eq!(first.status, RuntimeStatus::Failure);

    parrot.update_parameter("say", "calm".into());
    let second = run_cab(&mut parrot, None).await.expect("second run");
    assert_eq!(second.status, RuntimeStatus::Unknown);
    assert!(second.success());
}

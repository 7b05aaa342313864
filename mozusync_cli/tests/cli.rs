use assert_cmd::Command;
use mozusync_test_utils::TestProjectBuilder;
use predicates::prelude::*;
use tempfile::TempDir;

const ACCOUNT: &str = r#"
[options]
application_key = "APPKEY"

[options.context]
base_url = "https://home.mozu.com"

[options.context.developer_account]
email_address = "dev@example.com"
"#;

fn mozusync(project: &TempDir, store: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mozusync").unwrap();
    cmd.current_dir(project.path())
        .env("MOZUSYNC_CREDENTIAL_STORE_DIR", store.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_version() {
    let mut cmd = Command::cargo_bin("mozusync").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_action_exits_with_misuse_and_lists_actions() {
    let project = TestProjectBuilder::new()
        .with_config(&format!(
            "{ACCOUNT}\n[targets.bad]\noptions = {{ action = \"sync\" }}\n"
        ))
        .build();
    let store = TempDir::new().unwrap();

    mozusync(&project, &store)
        .args(["run", "bad"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown mozusync action sync."))
        .stderr(predicate::str::contains(
            "Valid actions are: upload, delete, rename, deleteAll",
        ));
}

#[test]
fn test_missing_application_key_exits_with_misuse() {
    let project = TestProjectBuilder::new()
        .with_config("[targets.up]\nsrc = [\"*.js\"]\n")
        .build();
    let store = TempDir::new().unwrap();

    mozusync(&project, &store)
        .args(["run", "up"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("`application_key`"));
}

#[test]
fn test_upload_with_nothing_to_send_is_canceled() {
    let project = TestProjectBuilder::new()
        .with_dir("templates")
        .with_config(&format!(
            "{ACCOUNT}\n[targets.up]\nsrc = [\"missing.js\", \"templates\"]\n"
        ))
        .build();
    let store = TempDir::new().unwrap();

    mozusync(&project, &store)
        .args(["run", "up"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Uploading canceled; no qualifying files were found.",
        ));
}

#[test]
fn test_delete_must_run_alone() {
    let project = TestProjectBuilder::new()
        .with_config(&format!(
            "{ACCOUNT}\n[targets.clean]\nremove = [\"x.css\"]\noptions = {{ action = \"delete\" }}\n\n[targets.up]\nsrc = [\"*.js\"]\n"
        ))
        .build();
    let store = TempDir::new().unwrap();

    mozusync(&project, &store)
        .args(["run", "clean", "up"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "The `mozusync:clean` task is meant to be run only by itself",
        ));
}

#[test]
fn test_targets_lists_actions() {
    let project = TestProjectBuilder::new()
        .with_config(&format!(
            "{ACCOUNT}\n[targets.up]\nsrc = [\"*.js\"]\n\n[targets.wipe]\noptions = {{ action = \"deleteAll\" }}\n"
        ))
        .build();
    let store = TempDir::new().unwrap();

    mozusync(&project, &store)
        .arg("targets")
        .assert()
        .success()
        .stdout(predicate::str::contains("up (upload)"))
        .stdout(predicate::str::contains("wipe (deleteAll)"));
}

#[test]
fn test_targets_show_hides_password() {
    let project = TestProjectBuilder::new()
        .with_config(
            "[options.context.developer_account]\nemail_address = \"dev@example.com\"\npassword = \"hunter2\"\n\n[targets.up]\nsrc = []\n",
        )
        .build();
    let store = TempDir::new().unwrap();

    mozusync(&project, &store)
        .args(["targets", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[targets.up]"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_completions() {
    let mut cmd = Command::cargo_bin("mozusync").unwrap();
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mozusync"));
}

use assert_cmd::Command;
use predicates::str::{contains, starts_with};

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vitabot"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("VitaBot"))
        .stdout(contains("--endpoint"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vitabot"));
    cmd.arg("--version").assert().success();
}

#[test]
fn test_cli_completions() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vitabot"));
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(starts_with("_vitabot"));
}

#[test]
fn test_welcome_banner_and_quit() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vitabot"));
    cmd.env_remove("VITABOT_SPEECH_COMMAND")
        .write_stdin("/quit\n")
        .assert()
        .success()
        .stdout(contains("VITABOT"))
        .stdout(contains("Your personalized supplements recommender"))
        .stdout(contains("/voice  -> (not available)"));
}

#[test]
fn test_unreachable_server_fails_one_shot_message() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vitabot"));
    cmd.args(["--endpoint", "http://127.0.0.1:9/api/chat", "--message", "hello"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Error:"));
}

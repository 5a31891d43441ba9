#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use mockito::{Matcher, Server};
use predicates::prelude::*;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;
use wolframalpha_cli::config::Config;

fn wa_cmd(config_file: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wa-cli"));
    cmd.timeout(Duration::from_secs(15));
    cmd.env("WA_CLI_CONFIG", config_file);
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn set_key_persists_the_key() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    wa_cmd(&path)
        .args(["--set-key", "MY-APP-ID"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API key saved"));

    assert_eq!(Config::load(&path).unwrap().api_key, "MY-APP-ID");
}

#[test]
fn single_query_prints_result() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut server = Server::new();
    let mock = server
        .mock("GET", "/v2/query")
        .match_query(Matcher::UrlEncoded("input".into(), "2+2".into()))
        .with_body(
            "<queryresult success='true'>\
             <pod title='Result'><subpod title=''><plaintext>4</plaintext></subpod></pod>\
             </queryresult>",
        )
        .create();

    let mut config = Config {
        api_key: "KEY".into(),
        show_url: false,
        api_url: format!("{}/v2/query", server.url()),
        ..Config::default()
    };
    config.colors.pod = "none".into();
    config.save(&path).unwrap();

    wa_cmd(&path)
        .args(["-q", "2+2"])
        .assert()
        .success()
        .stdout("** Result **\n4\n");
    mock.assert();
}

#[test]
fn malformed_config_is_fatal_with_signup_hint() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "api_key = [1, 2\n").unwrap();

    wa_cmd(&path)
        .args(["-q", "pi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("developer.wolframalpha.com"));
}

#[cfg(unix)]
#[test]
fn config_flag_creates_file_and_runs_editor() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sub").join("config.toml");

    wa_cmd(&path)
        .arg("--config")
        .env_remove("VISUAL")
        .env("EDITOR", "true")
        .assert()
        .success();

    assert_eq!(Config::load(&path).unwrap(), Config::default());
}

#[cfg(unix)]
#[test]
fn failing_editor_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    wa_cmd(&path)
        .arg("--config")
        .env_remove("VISUAL")
        .env("EDITOR", "false")
        .assert()
        .failure()
        .stderr(predicate::str::contains("editor 'false' failed"));
}

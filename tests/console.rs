//! End-to-end tests: drive the `elobot` binary through `console`, `top`
//! and `config` against a temp data dir.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Temp data + config dirs for one ladder.
struct TestLadder {
    data_dir: TempDir,
    config_dir: TempDir,
}

impl TestLadder {
    fn new() -> Self {
        Self {
            data_dir: TempDir::new().expect("failed to create data dir"),
            config_dir: TempDir::new().expect("failed to create config dir"),
        }
    }

    fn state_file(&self) -> std::path::PathBuf {
        self.data_dir.path().join("ladder.json")
    }

    fn elobot(&self) -> Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("elobot");
        cmd.env("ELOBOT_DATA_DIR", self.data_dir.path());
        cmd.env("ELOBOT_CONFIG_DIR", self.config_dir.path());
        cmd.env("ELOBOT_TESTING", "1");
        for key in [
            "ELOBOT_STATE_FILE",
            "ELOBOT_COMMAND_PREFIX",
            "ELOBOT_CHANNEL",
            "ELOBOT_LOG",
        ] {
            cmd.env_remove(key);
        }
        cmd
    }

    /// Runs `console --as nick` with `script` on stdin and returns stdout.
    fn say(&self, nick: &str, script: &str) -> String {
        let output = self
            .elobot()
            .args(["console", "--as", nick])
            .write_stdin(script)
            .output()
            .expect("failed to run elobot");
        assert!(
            output.status.success(),
            "console failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("utf8 stdout")
    }
}

#[test]
fn test_register_claim_verify() {
    let ladder = TestLadder::new();

    assert_eq!(
        ladder.say("alice", ".register\n"),
        "#openra Thanks for registering, alice. Your initial rating is 1200.\n"
    );
    ladder.say("bob", ".register\n");

    assert_eq!(
        ladder.say("alice", ".win vs bob\n"),
        "#openra Added unverified claim 0; ratings will be adjusted when the other party verifies it\n"
    );

    let incoming = ladder.say("bob", ".incoming\n");
    let lines: Vec<&str> = incoming.lines().collect();
    assert_eq!(lines.len(), 2, "{incoming}");
    assert_eq!(lines[0], "-notice- bob incoming claims:");
    assert!(lines[1].starts_with("-notice- bob 0: alice win vs bob ("));

    assert_eq!(
        ladder.say("bob", ".verify 0\n"),
        "#openra Ratings updated. alice now on 1216 (+16). bob now on 1184 (-16)\n"
    );

    let snapshot: serde_json::Value =
        serde_json::from_slice(&fs::read(ladder.state_file()).expect("snapshot")).expect("json");
    assert_eq!(snapshot["next_id"], 1);
    assert_eq!(snapshot["players"]["alice"]["rating"], 1216);
    assert_eq!(snapshot["players"]["bob"]["losses"], 1);
    assert_eq!(snapshot["pending"].as_array().map(Vec::len), Some(0));
    assert_eq!(snapshot["archived"][0]["p1"], "alice");
    assert_eq!(snapshot["archived"][0]["outcome"], "win");
}

#[test]
fn test_reject_unknown_claim_changes_nothing() {
    let ladder = TestLadder::new();
    ladder.say("alice", ".register\n");
    let before = fs::read(ladder.state_file()).expect("snapshot");

    assert_eq!(
        ladder.say("alice", ".reject 99\n"),
        "#openra Sorry, couldn't find your game\n"
    );

    let after: serde_json::Value =
        serde_json::from_slice(&fs::read(ladder.state_file()).expect("snapshot")).expect("json");
    let before: serde_json::Value = serde_json::from_slice(&before).expect("json");
    assert_eq!(before, after);
}

#[test]
fn test_one_session_many_commands() {
    let ladder = TestLadder::new();
    ladder.say("alice", ".register\n");
    ladder.say("bob", ".register\n");

    let out = ladder.say(
        "bob",
        "hello everyone\n.draw vs alice\n.dance\n.outgoing\n.cancel 0\n.outgoing\n",
    );
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "#openra Added unverified claim 0; ratings will be adjusted when the other party verifies it");
    assert_eq!(lines[1], "#openra Eh?");
    assert_eq!(lines[2], "-notice- bob outgoing claims:");
    assert!(lines[3].starts_with("-notice- bob 0: bob draw vs alice ("));
    assert_eq!(lines[4], "#openra Claim removed.");
    assert_eq!(lines[5], "-notice- bob outgoing claims:");
    assert_eq!(lines.len(), 6);
}

#[test]
fn test_top_reads_saved_ladder() {
    let ladder = TestLadder::new();
    ladder.say("alice", ".register\n");
    ladder.say("bob", ".register\n");
    ladder.say("bob", ".loss vs alice\n");
    ladder.say("alice", ".verify 0\n");

    ladder
        .elobot()
        .arg("top")
        .assert()
        .success()
        .stdout("#1: alice (1216)\n#2: bob (1184)\n");

    ladder
        .elobot()
        .args(["top", "--count", "1", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"alice\""))
        .stdout(predicate::str::contains("bob").not());
}

#[test]
fn test_second_process_is_locked_out() {
    let ladder = TestLadder::new();
    // This test process is alive for as long as the child runs.
    fs::write(
        ladder.data_dir.path().join("ladder.json.lock"),
        format!(
            r#"{{"pid": {}, "started_at_ms": 0, "version": "0.0.0"}}"#,
            std::process::id()
        ),
    )
    .expect("write lock");

    ladder
        .elobot()
        .args(["console", "--as", "alice"])
        .write_stdin(".register\n")
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("locked by another process").count(1));
}

#[cfg(target_os = "linux")]
#[test]
fn test_lock_left_by_dead_process_is_taken_over() {
    let ladder = TestLadder::new();
    let lock = ladder.data_dir.path().join("ladder.json.lock");
    fs::write(
        &lock,
        r#"{"pid": 4194305, "started_at_ms": 0, "version": "0.0.0"}"#,
    )
    .expect("write lock");

    assert_eq!(
        ladder.say("alice", ".register\n"),
        "#openra Thanks for registering, alice. Your initial rating is 1200.\n"
    );
    assert!(!lock.exists());
}

#[test]
fn test_corrupt_snapshot_is_set_aside() {
    let ladder = TestLadder::new();
    fs::write(ladder.state_file(), "not json").expect("write");

    assert_eq!(
        ladder.say("alice", ".register\n"),
        "#openra Thanks for registering, alice. Your initial rating is 1200.\n"
    );
    assert_eq!(
        fs::read_to_string(ladder.data_dir.path().join("ladder.json.corrupt")).expect("aside"),
        "not json"
    );
}

#[test]
fn test_config_file_and_env_layers() {
    let ladder = TestLadder::new();
    let extra = ladder.config_dir.path().join("extra.toml");
    fs::write(
        &extra,
        "[ladder]\ncommand_prefix = \"!\"\ninitial_rating = 1500\n\n[irc]\nchannel = \"#ladder\"\n",
    )
    .expect("write config");

    ladder
        .elobot()
        .args(["--config", extra.to_str().expect("utf8 path"), "console", "--as", "alice"])
        .write_stdin(".register\n!register\n")
        .assert()
        .success()
        .stdout("#ladder Thanks for registering, alice. Your initial rating is 1500.\n");

    ladder
        .elobot()
        .env("ELOBOT_IRC_PORT", "7000")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("port = 7000"))
        .stdout(predicate::str::contains("k_factor = 32"));
}

#[test]
fn test_help_is_public() {
    let ladder = TestLadder::new();
    assert_eq!(
        ladder.say("anyone", ".help\n"),
        "#openra Supported commands:\n#openra   .register .win .loss .draw .verify .reject .cancel .incoming .outgoing .top .help\n"
    );
}

#[test]
fn test_invalid_ladder_settings_fall_back_to_defaults() {
    let ladder = TestLadder::new();
    let extra = ladder.config_dir.path().join("extra.toml");
    fs::write(&extra, "[ladder]\nk_factor = -32\ncommand_prefix = \"\"\n").expect("write config");
    let extra = extra.to_str().expect("utf8 path");

    let console = |nick: &str, script: &str| {
        ladder
            .elobot()
            .args(["--config", extra, "console", "--as", nick])
            .write_stdin(script.to_string())
            .assert()
            .success()
            .stderr(predicate::str::contains("invalid config: ladder.k_factor"))
    };

    console("alice", ".register\nhello all\n")
        .stdout("#openra Thanks for registering, alice. Your initial rating is 1200.\n");
    console("bob", ".register\n");
    console("alice", ".win vs bob\n");
    console("bob", ".verify 0\n")
        .stdout("#openra Ratings updated. alice now on 1216 (+16). bob now on 1184 (-16)\n");
}

#[test]
fn test_run_refuses_broken_config() {
    let ladder = TestLadder::new();
    let bad = ladder.config_dir.path().join("bad.toml");
    fs::write(&bad, "[irc\nport = ").expect("write config");

    ladder
        .elobot()
        .args(["--config", bad.to_str().expect("utf8 path"), "run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse"));

    let missing = ladder.config_dir.path().join("absent.toml");
    ladder
        .elobot()
        .args(["--config", missing.to_str().expect("utf8 path"), "run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));

    let invalid = ladder.config_dir.path().join("invalid.toml");
    fs::write(&invalid, "[ladder]\ntop_count = 0\n").expect("write config");
    ladder
        .elobot()
        .args(["--config", invalid.to_str().expect("utf8 path"), "run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config: ladder.top_count"));

    assert!(!ladder.state_file().exists());
}

//! Integration tests for the `il2ssd` binary entry point.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn help_lists_the_commands() {
    let mut command = cargo_bin_cmd!("il2ssd");
    command.arg("--help");
    command
        .assert()
        .success()
        .stdout(contains("status"))
        .stdout(contains("next"));
}

#[test]
fn missing_command_exits_with_failure() {
    let mut command = cargo_bin_cmd!("il2ssd");
    command.assert().failure().stderr(contains("Usage"));
}

#[test]
fn unreachable_server_is_reported() {
    let port = {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind probe");
        listener.local_addr().expect("probe address").port()
    };
    let mut command = cargo_bin_cmd!("il2ssd");
    command
        .env("IL2SSD_LOG_FILTER", "off")
        .args(["--host", "127.0.0.1", "--port"])
        .arg(port.to_string())
        .args(["--connect-timeout-ms", "500", "status"]);
    command
        .assert()
        .failure()
        .stderr(contains("failed to connect to server console at 127.0.0.1:"));
}

#[test]
fn status_with_default_logging_reports_the_running_mission() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind console");
    let port = listener.local_addr().expect("console address").port();
    let console = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept client");
        let mut writer = stream.try_clone().expect("clone stream");
        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            if line == "mission" {
                writer
                    .write_all(b"Mission: net/dogfight/test.mis is Loaded\n")
                    .expect("write status");
            }
        }
    });

    let mut command = cargo_bin_cmd!("il2ssd");
    command
        .env_remove("IL2SSD_LOG_FILTER")
        .timeout(Duration::from_secs(10))
        .args(["--port"])
        .arg(port.to_string())
        .args(["--connect-timeout-ms", "2000", "status"]);
    command
        .assert()
        .success()
        .stdout(contains("mission net/dogfight/test.mis is running"))
        .stderr(contains("console"));

    console.join().expect("console thread");
}

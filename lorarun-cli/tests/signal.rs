//! Terminating the runner also terminates the trial it is waiting on.

#![cfg(unix)]

use std::fs;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

#[test]
fn sigterm_reaches_running_trial() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("slow.sh");
    fs::write(&script, "#!/bin/sh\nexec sleep 10\n").unwrap();

    let mut runner = Command::new(env!("CARGO_BIN_EXE_lorarun"))
        .args(&["-v", "0", "run", "--interpreter", "sh", "--trials", "3"])
        .arg("--script")
        .arg(&script)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // give the runner time to install its handler and start the first trial
    thread::sleep(Duration::from_millis(1000));
    let sent = unsafe { libc::kill(runner.id() as libc::pid_t, libc::SIGTERM) };
    assert_eq!(sent, 0);

    let deadline = Instant::now() + Duration::from_secs(5);
    let status = loop {
        if let Some(status) = runner.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            runner.kill().unwrap();
            panic!("runner still waiting on its trial after SIGTERM");
        }
        thread::sleep(Duration::from_millis(20));
    };
    assert!(status.success());
}

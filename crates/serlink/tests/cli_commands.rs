#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const ECHO_FRAME: &str = "#AgCFAQEBKjnS;";

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/serlink-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn serlink() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_serlink"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn json_line(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().expect("command should print a line");
    serde_json::from_str(line).expect("stdout should be json")
}

fn wait_for_socket(path: &Path, timeout: Duration) {
    let start = Instant::now();
    while !path.exists() {
        if start.elapsed() >= timeout {
            panic!("socket did not appear: {}", path.display());
        }
        thread::sleep(Duration::from_millis(25));
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Option<std::process::ExitStatus> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().expect("child status should be readable") {
            return Some(status);
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return None;
        }
        thread::sleep(Duration::from_millis(25));
    }
}

#[test]
fn encode_echo_message_prints_known_frame() {
    let output = serlink()
        .args(["--format", "json", "encode", "--task", "5", "--field", "u8:42"])
        .output()
        .expect("encode should run");

    assert!(output.status.success());
    let payload = json_line(&output);
    assert_eq!(payload["frame"], ECHO_FRAME);
    assert_eq!(payload["checksum"], "39D2");
    assert_eq!(payload["data_size"], 1);
}

#[test]
fn raw_encode_output_feeds_decode() {
    let encoded = serlink()
        .args(["--format", "raw", "encode", "--task", "9", "--number", "2", "--total", "3"])
        .args(["-f", "str:ab", "-f", "u16:300", "-f", "int:-7"])
        .output()
        .expect("encode should run");
    assert!(encoded.status.success());
    let frame = String::from_utf8(encoded.stdout).expect("frame should be ascii");

    let decoded = serlink()
        .args(["--format", "json", "decode", frame.trim()])
        .output()
        .expect("decode should run");
    assert!(decoded.status.success());

    let payload = json_line(&decoded);
    assert_eq!(payload["task_value"], 9);
    assert_eq!(payload["succeeded"], true);
    assert_eq!(payload["message_number"], 2);
    assert_eq!(payload["total_quantity"], 3);
    let fields = payload["fields"].as_array().expect("fields should be an array");
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0]["text"], "ab");
    assert_eq!(fields[1]["hex"], "012c");
    assert_eq!(fields[2]["hex"], "fff9");
}

#[test]
fn decode_reads_frame_from_stdin_with_noise() {
    use std::io::Write;

    let mut child = serlink()
        .args(["--format", "json", "decode"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("decode should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(b"noise\r\n#AgCFAQEB\r\nKjnS;\r\n")
        .expect("stdin should accept input");

    let output = child.wait_with_output().expect("decode should finish");
    assert!(output.status.success());
    assert_eq!(json_line(&output)["task_value"], 5);
}

#[test]
fn decode_corrupted_checksum_returns_60() {
    // Last checksum byte 0xD2 flipped to 0xD3.
    let output = serlink()
        .args(["decode", "#AgCFAQEBKjnT;"])
        .output()
        .expect("decode should run");

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("checksum"));
}

#[test]
fn decode_without_frame_returns_60() {
    let output = serlink()
        .args(["decode", "no sentinels here"])
        .output()
        .expect("decode should run");

    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn send_to_missing_socket_returns_transport_error() {
    let dir = unique_temp_dir("missing");
    let output = serlink()
        .arg("send")
        .arg(dir.join("absent.sock"))
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_is_acked_by_listen() {
    let dir = unique_temp_dir("roundtrip");
    let sock_path = dir.join("link.sock");

    let mut listener = serlink()
        .args(["--format", "json", "listen"])
        .arg(&sock_path)
        .args(["--count", "1", "--timeout", "200ms"])
        .stdout(Stdio::piped())
        .spawn()
        .expect("listen should start");
    wait_for_socket(&sock_path, Duration::from_secs(3));

    let sent = serlink()
        .args(["--format", "json", "send"])
        .arg(&sock_path)
        .args(["--task", "3", "-f", "str:hi", "--quiet", "0ms", "--timeout", "2s"])
        .output()
        .expect("send should run");
    assert!(sent.status.success());
    let report = json_line(&sent);
    assert_eq!(report["acked"], true);
    assert_eq!(report["attempts"], 1);

    let status = wait_with_timeout(&mut listener, Duration::from_secs(5))
        .expect("listen should exit after one message");
    assert!(status.success());

    let output = listener.wait_with_output().expect("listen output should be readable");
    let received = json_line(&output);
    assert_eq!(received["event"], "received");
    assert_eq!(received["task_value"], 3);
    assert_eq!(received["fields"][0]["text"], "hi");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn failed_task_is_nacked_and_exits_1() {
    let dir = unique_temp_dir("nack");
    let sock_path = dir.join("link.sock");

    let mut listener = serlink()
        .arg("listen")
        .arg(&sock_path)
        .args(["--count", "2", "--timeout", "200ms"])
        .stdout(Stdio::null())
        .spawn()
        .expect("listen should start");
    wait_for_socket(&sock_path, Duration::from_secs(3));

    let sent = serlink()
        .args(["--format", "json", "send"])
        .arg(&sock_path)
        .args(["--failed", "--retries", "2", "--quiet", "0ms"])
        .output()
        .expect("send should run");

    assert_eq!(sent.status.code(), Some(1));
    let report = json_line(&sent);
    assert_eq!(report["acked"], false);
    assert_eq!(report["attempts"], 2);

    assert!(wait_with_timeout(&mut listener, Duration::from_secs(5)).is_some());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_package_version() {
    let output = serlink()
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("serlink {}", env!("CARGO_PKG_VERSION"))
    );
}

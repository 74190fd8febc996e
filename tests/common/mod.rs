#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_vgwm") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "vgwm.exe" } else { "vgwm" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve vgwm binary path for integration test"),
    }
}

pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    run_cli_case_with_env(case_name, args, &[])
}

/// Run the binary with color off, no ambient config, and the audit trail in
/// the temp dir, plus any extra environment.
pub fn run_cli_case_with_env(case_name: &str, args: &[&str], env: &[(&str, &str)]) -> CmdResult {
    let root = std::env::temp_dir().join("vgwm-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let stamp = format!("{}-{}", sanitize(case_name), now_millis());
    let log_path = root.join(format!("{stamp}.log"));
    let audit_path = root.join(format!("{stamp}-audit.jsonl"));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command
        .args(args)
        .env("NO_COLOR", "1")
        .env("RUST_BACKTRACE", "1")
        .env("VGW_AUDIT_LOG", &audit_path)
        .env_remove("VGW_CONFIG_PATH")
        .env_remove("VGW_OUTPUT_FORMAT")
        .env_remove("VGW_LOG");
    for (key, value) in env {
        command.env(key, value);
    }
    let output = command.output().expect("execute vgwm command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Write a config pointing at `users_json` and an unreachable gateway.
pub fn write_config(dir: &Path, users_json: &str) -> PathBuf {
    let users_path = dir.join("users.json");
    fs::write(&users_path, users_json).expect("write users.json");
    let config_path = dir.join("vgw-manager.toml");
    let config = format!(
        r#"[gateway]
admin_access = "admin"
admin_secret = "admin-secret"
endpoint_url = "http://127.0.0.1:9"
region = "us-east-1"
request_timeout_secs = 2

[storage]
users_json_path = "{}"
pool_base = "tank/s3/buckets"
mount_base = "/tank/s3/buckets"
zfs_binary = "/nonexistent/zfs"

[logging]
audit_log = "{}"
"#,
        users_path.display(),
        dir.join("audit.jsonl").display()
    );
    fs::write(&config_path, config).expect("write config");
    config_path
}

use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "gremios-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_writes_a_json_report_per_seed() {
    let exe = env!("CARGO_BIN_EXE_gremios-tester");
    let output_path = temp_path("json");
    let status = Command::new(exe)
        .args([
            "--seeds",
            "1,2",
            "--players",
            "3",
            "--iterations",
            "1",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    let value: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    let seeds = value.as_array().expect("array of seed results");
    assert_eq!(seeds.len(), 2);
    assert!(seeds.iter().all(|s| s["passed"] == true));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_markdown_covers_every_difficulty() {
    let exe = env!("CARGO_BIN_EXE_gremios-tester");
    let output = Command::new(exe)
        .args([
            "--seeds",
            "5",
            "--players",
            "2",
            "--iterations",
            "1",
            "--difficulty",
            "all",
            "--report",
            "markdown",
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Gremios Match Results"));
    for difficulty in ["easy", "normal", "hard"] {
        assert!(stdout.contains(difficulty), "missing {difficulty}");
    }
}

#[test]
fn cli_console_report_shows_banner() {
    let exe = env!("CARGO_BIN_EXE_gremios-tester");
    let output = Command::new(exe)
        .args(["--seeds", "8", "--players", "2", "--iterations", "1"])
        .env("NO_COLOR", "1")
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Gremios Automated Tester"));
    assert!(stdout.contains("Win Distribution"));
}

#[test]
fn cli_rejects_bad_arguments() {
    let exe = env!("CARGO_BIN_EXE_gremios-tester");
    for args in [
        ["--players", "7"],
        ["--seeds", "banana"],
        ["--difficulty", "brutal"],
    ] {
        let output = Command::new(exe).args(args).output().expect("run cli");
        assert!(!output.status.success(), "{args:?} should fail");
    }
}

use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_codevis"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "codevis init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let config_path = dir.path().join(".codevis.toml");
    assert!(config_path.exists(), ".codevis.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[analyze]"));
    assert!(content.contains("[serve]"));

    let config: codevis_core::CodevisConfig = toml::from_str(&content).unwrap();
    assert_eq!(config.serve.port, 3001);
    assert!(config.analyze.detect_renames);
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".codevis.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_codevis"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let content = std::fs::read_to_string(dir.path().join(".codevis.toml")).unwrap();
    assert_eq!(content, "# existing");
}

#[test]
fn no_subcommand_prints_welcome() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_codevis"))
        .args(["--color", "never"])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Quick start:"));
    assert!(stdout.contains("codevis analyze ."));
}

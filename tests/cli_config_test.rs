use std::process::Command;
use tempfile::TempDir;

fn dicanchor(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dicanchor"));
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_init_command() {
    let temp_dir = TempDir::new().unwrap();

    let output = dicanchor(temp_dir.path())
        .arg("init")
        .output()
        .expect("Failed to run init command");
    assert!(output.status.success());

    let config_path = temp_dir.path().join(".dicanchor/settings.toml");
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("version = 1"));
    assert!(content.contains("[annotate]"));
    assert!(content.contains("id_prefix = \"term-\""));

    // A second init without --force refuses to overwrite.
    let again = dicanchor(temp_dir.path()).arg("init").output().unwrap();
    assert!(!again.status.success());
}

#[test]
fn test_config_command_layers_env_over_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join(".dicanchor");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("settings.toml"),
        "version = 2\n[annotate]\nhighlight_ms = 1500\nid_prefix = \"gl-\"\n",
    )
    .unwrap();

    let output = dicanchor(temp_dir.path())
        .arg("config")
        .env("DICANCHOR_ANNOTATE__HIGHLIGHT_MS", "4500")
        .output()
        .expect("Failed to run config command");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("version = 2"));
    assert!(stdout.contains("id_prefix = \"gl-\""));
    assert!(stdout.contains("highlight_ms = 4500"));
}

#[test]
fn test_config_output_is_a_settings_file() {
    let temp_dir = TempDir::new().unwrap();
    let output = dicanchor(temp_dir.path())
        .arg("config")
        .env("DICANCHOR_LINK__MAX_LOOKAHEAD", "5")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let settings: dicanchor::Settings = toml::from_str(&stdout).unwrap();
    assert_eq!(settings.link.max_lookahead, 5);
    assert_eq!(settings.annotate.id_prefix, "term-");
}

#[test]
fn test_annotate_command() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("dic.html"),
        "<div class=\"row\"><div><span class=\"german\">Über-Lied</span></div></div>\n",
    )
    .unwrap();

    let output = dicanchor(temp_dir.path())
        .args([
            "annotate",
            "--input",
            "dic.html",
            "--output",
            "out.html",
            "--index",
            "terms.json",
        ])
        .output()
        .expect("Failed to run annotate command");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("out.html"));
    assert!(stdout.contains("(1 terms)"));

    let page = std::fs::read_to_string(temp_dir.path().join("out.html")).unwrap();
    assert_eq!(
        page,
        "<div class=\"row\" data-term-id=\"term-ueber-lied\"><div><span class=\"german\">Über-Lied</span></div></div>\r\n"
    );
}

#[test]
fn test_annotate_missing_input_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = dicanchor(temp_dir.path())
        .args(["annotate", "--input", "absent.html"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("absent.html"));
}

#[test]
fn test_normalize_command() {
    let temp_dir = TempDir::new().unwrap();
    let output = dicanchor(temp_dir.path())
        .args(["normalize", "Über-Lied", "Sehr langsam"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Über-Lied\tueber-lied\tterm-ueber-lied"));
    assert!(stdout.contains("Sehr langsam\tsehr-langsam\tterm-sehr-langsam"));
}

//! Integration tests for shellcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn shellcache() -> Command {
        cargo_bin_cmd!("shellcache")
    }

    /// Write a config + manifest pair into `dir`, returning the config path
    fn write_config(dir: &Path) -> std::path::PathBuf {
        let manifest_path = dir.join("manifest.json");
        std::fs::write(
            &manifest_path,
            r#"{"/": "h0", "index.html": "h0", "app.js": "h1"}"#,
        )
        .unwrap();

        let config_path = dir.join("shellcache.toml");
        std::fs::write(
            &config_path,
            format!(
                r#"
origin = "https://app.example.com"
manifest_path = "{}"
shell = ["index.html"]
mirror_dir = "{}"
"#,
                manifest_path.display(),
                dir.join("mirror").display()
            ),
        )
        .unwrap();
        config_path
    }

    #[test]
    fn help_displays() {
        shellcache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline mirror"));
    }

    #[test]
    fn version_displays() {
        shellcache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("shellcache"));
    }

    #[test]
    fn missing_config_errors() {
        shellcache()
            .args(["status", "--config", "/nonexistent/shellcache.toml"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration file not found"));
    }

    #[test]
    fn invalid_config_errors() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("shellcache.toml");
        std::fs::write(&config_path, "origin = 42").unwrap();

        shellcache()
            .args(["status"])
            .arg("--config")
            .arg(&config_path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn status_on_empty_mirror() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(dir.path());

        shellcache()
            .args(["status"])
            .arg("--config")
            .arg(&config_path)
            .assert()
            .success()
            .stdout(predicate::str::contains("0 / 3"))
            .stdout(predicate::str::contains("absent"));
    }

    #[test]
    fn fetch_outside_manifest_is_not_intercepted() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(dir.path());

        shellcache()
            .args(["fetch", "https://app.example.com/api/data"])
            .arg("--config")
            .arg(&config_path)
            .assert()
            .success()
            .stdout(predicate::str::contains("Not intercepted"));
    }

    #[test]
    fn shell_path_outside_manifest_errors() {
        let dir = TempDir::new().unwrap();
        let manifest_path = dir.path().join("manifest.json");
        std::fs::write(&manifest_path, r#"{"/": "h0"}"#).unwrap();
        let config_path = dir.path().join("shellcache.toml");
        std::fs::write(
            &config_path,
            format!(
                r#"
origin = "https://app.example.com"
manifest_path = "{}"
shell = ["missing.js"]
"#,
                manifest_path.display()
            ),
        )
        .unwrap();

        shellcache()
            .args(["status"])
            .arg("--config")
            .arg(&config_path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Shell path not present"));
    }
}

#![allow(deprecated)] // cargo_bin is deprecated but still functional

use assert_cmd::Command;
use httpmock::Method::GET;
use httpmock::MockServer;
use ota_core::{ContentHash, Manifest};
use predicates::str::contains;
use std::fs;
use std::net::TcpListener;
use std::path::Path;
use tempfile::TempDir;

const METADATA: &str = r#"{"version":0,"bundler":"metro","fileMetadata":{"ios":{"bundle":"_expo/static/js/ios/entry.hbc","assets":[{"path":"assets/b.png","ext":"png"},{"path":"assets/a.ttf","ext":"ttf"}]},"android":{"bundle":"_expo/static/js/android/entry.hbc","assets":[{"path":"assets/b.png","ext":"png"}]}}}"#;

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn write(root: &Path, path: &str, contents: &[u8]) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn export_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "metadata.json", METADATA.as_bytes());
    write(root, "expoConfig.json", br#"{"name":"demo","slug":"demo"}"#);
    write(root, "_expo/static/js/ios/entry.hbc", b"ios bundle");
    write(root, "_expo/static/js/android/entry.hbc", b"android bundle");
    write(root, "assets/b.png", b"png bytes");
    write(root, "assets/a.ttf", b"ttf bytes");
    temp
}

fn otactl(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("otactl").unwrap();
    cmd.env_remove("MANDATORY")
        .env_remove("UPLOAD_PATH")
        .env_remove("EXPO_UPDATES_ASSETS_URL")
        .env("OTA_CLIENT_CONFIG", temp.path().join("missing.toml"));
    cmd
}

#[test]
fn generate_manifests_writes_both_platforms() {
    let dist = export_dir();

    otactl(&dist)
        .arg("generate-manifests")
        .arg("--dist")
        .arg(dist.path())
        .args(["--upload-path", "1.0.0/3"])
        .args(["--assets-url", "https://cdn.example.com"])
        .args(["--mandatory", "y"])
        .assert()
        .success()
        .stdout(contains("ios"))
        .stdout(contains("android"));

    let expected_id = ContentHash::compute(METADATA.as_bytes()).to_uuid();
    let ios: Manifest =
        Manifest::from_json(&fs::read(dist.path().join("manifests/ios.json")).unwrap()).unwrap();
    let android: Manifest =
        Manifest::from_json(&fs::read(dist.path().join("manifests/android.json")).unwrap())
            .unwrap();

    assert_eq!(ios.id, expected_id);
    assert_eq!(android.id, expected_id);
    assert_eq!(ios.runtime_version, "1.0.0");
    assert_eq!(ios.extra.ota_update_version, "3");
    assert!(ios.extra.mandatory);
    assert_eq!(ios.extra.expo_client["name"], "demo");

    let paths: Vec<&str> = ios.assets.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(
        paths,
        [
            "https://cdn.example.com/1.0.0/3/assets/b.png",
            "https://cdn.example.com/1.0.0/3/assets/a.ttf",
        ]
    );
    assert_eq!(ios.assets[0].file_extension, ".png");
    assert_eq!(ios.assets[0].content_type, "image/png");
    assert_eq!(ios.launch_asset.file_extension, ".bundle");
    assert_eq!(ios.launch_asset.content_type, "application/javascript");
    assert_eq!(android.assets.len(), 1);
    assert_eq!(android.assets[0].key, ios.assets[0].key);
}

#[test]
fn generate_manifests_is_stable_across_runs() {
    let dist = export_dir();
    let run = || {
        otactl(&dist)
            .arg("generate-manifests")
            .arg("--dist")
            .arg(dist.path())
            .args(["--upload-path", "1.0.0/1"])
            .args(["--assets-url", "https://cdn.example.com"])
            .assert()
            .success();
        fs::read(dist.path().join("manifests/android.json")).unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
}

#[test]
fn generate_manifests_without_expo_config_fails() {
    let dist = export_dir();
    fs::remove_file(dist.path().join("expoConfig.json")).unwrap();

    otactl(&dist)
        .arg("generate-manifests")
        .arg("--dist")
        .arg(dist.path())
        .args(["--upload-path", "2.1.0/1"])
        .args(["--assets-url", "https://cdn.example.com"])
        .assert()
        .failure()
        .stderr(contains(
            "No expo config json found with runtime version: 2.1.0",
        ));

    assert!(!dist.path().join("manifests").exists());
}

#[test]
fn generate_manifests_requires_assets_url() {
    let dist = export_dir();

    otactl(&dist)
        .arg("generate-manifests")
        .arg("--dist")
        .arg(dist.path())
        .args(["--upload-path", "1.0.0/1"])
        .assert()
        .failure()
        .stderr(contains("no assets base URL"));
}

#[test]
fn upload_path_prints_allocated_path() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/get-upload-path")
            .query_param("runtime-version", "1.0.0");
        then.status(200).json_body(serde_json::json!({ "path": "1.0.0/2" }));
    });

    let temp = TempDir::new().unwrap();
    otactl(&temp)
        .arg("upload-path")
        .args(["--runtime-version", "1.0.0"])
        .args(["--server", &server.base_url()])
        .assert()
        .success()
        .stdout("1.0.0/2\n");
}

#[test]
fn check_rejects_unknown_platform() {
    let temp = TempDir::new().unwrap();
    otactl(&temp)
        .arg("check")
        .args(["--platform", "web"])
        .args(["--runtime-version", "1.0.0"])
        .args(["--server", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(contains("Unsupported platform"));
}

//! End-to-end tests for the staging commands against real files and a
//! local HTTP stub.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs::{self, File};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use zip::write::SimpleFileOptions;

/// Variables the buildpack reads, cleared so the host environment cannot
/// leak into a test.
const BUILDPACK_VARS: &[&str] = &[
    "VCAP_SERVICES",
    "VCAP_APPLICATION",
    "APPD_AGENT_HTTP_URL",
    "APPD_CONF_HTTP_URL",
    "APPD_PACKAGE_PATTERN",
    "APPD_INSTALL_DIR_NAME",
    "APPD_CONFIG_FILES",
    "APPD_HTTP_TIMEOUT_SECS",
    "BP_DEBUG",
    "APPDYNAMICS_AGENT_APPLICATION_NAME",
    "APPDYNAMICS_NODE_PREFIX",
];

fn appd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("appd-buildpack"));
    cmd.env("NO_COLOR", "1");
    for var in BUILDPACK_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn build_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).expect("create zip");
    let mut zip = zip::ZipWriter::new(file);
    for (name, content) in entries {
        zip.start_file(*name, SimpleFileOptions::default())
            .expect("start file");
        zip.write_all(content).expect("write");
    }
    zip.finish().expect("finish");
}

/// Answer a single request with `status` and `body`, returning the URL.
fn serve_once(status: &'static str, body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
        }
    });
    format!("http://127.0.0.1:{port}/AppServerAgent.zip")
}

// --- extract ---

#[test]
fn test_extract_unpacks_archive() {
    let work = tempfile::tempdir().expect("tempdir");
    let archive = work.path().join("agent.zip");
    build_zip(&archive, &[("javaagent.jar", b"jar"), ("conf/app-agent-config.xml", b"<x/>")]);
    let dest = work.path().join("install");

    appd()
        .arg("extract")
        .arg(&archive)
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicate::str::contains("extracted 2 entries"));
    assert_eq!(fs::read(dest.join("javaagent.jar")).unwrap(), b"jar");
    assert!(dest.join("conf/app-agent-config.xml").is_file());
}

#[test]
fn test_extract_json_lists_paths() {
    let work = tempfile::tempdir().expect("tempdir");
    let archive = work.path().join("agent.zip");
    build_zip(&archive, &[("javaagent.jar", b"jar")]);
    let dest = work.path().join("install");

    let output = appd()
        .arg("extract")
        .arg(&archive)
        .arg(&dest)
        .arg("--json")
        .output()
        .expect("run extract");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON");
    let paths = value.as_array().expect("array");
    assert_eq!(paths.len(), 1);
    assert!(paths[0].as_str().unwrap().ends_with("javaagent.jar"));
}

#[test]
fn test_extract_rejects_traversal_entry() {
    let work = tempfile::tempdir().expect("tempdir");
    let archive = work.path().join("evil.zip");
    build_zip(&archive, &[("../../escape.sh", b"#!/bin/sh\n")]);
    let dest = work.path().join("a").join("install");

    appd()
        .arg("extract")
        .arg(&archive)
        .arg(&dest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("illegal file path"));
    assert!(!work.path().join("escape.sh").exists());
}

#[test]
fn test_extract_traversal_json_error_code() {
    let work = tempfile::tempdir().expect("tempdir");
    let archive = work.path().join("evil.zip");
    build_zip(&archive, &[("../x", b"x")]);

    let output = appd()
        .arg("extract")
        .arg(&archive)
        .arg(work.path().join("install"))
        .arg("--json")
        .output()
        .expect("run extract");
    assert!(!output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "PATH_TRAVERSAL");
}

// --- write-env ---

#[test]
fn test_write_env_writes_agent_line_and_exports() {
    let work = tempfile::tempdir().expect("tempdir");
    let env_file = work.path().join("appd.sh");

    appd()
        .args(["write-env", "/home/vcap/app/.appdynamics"])
        .arg(&env_file)
        .args(["--prefix", "shop", "APPDYNAMICS_AGENT_TIER_NAME=web", "A=1"])
        .assert()
        .success();

    let text = fs::read_to_string(&env_file).unwrap();
    assert!(text.contains("-javaagent:/home/vcap/app/.appdynamics/javaagent.jar"));
    assert!(text.contains("shop"));
    assert!(text.lines().any(|l| l == "export APPDYNAMICS_AGENT_TIER_NAME=\"web\""));
    assert!(text.lines().any(|l| l == "export A=\"1\""));
}

#[test]
fn test_write_env_rejects_invalid_name() {
    let work = tempfile::tempdir().expect("tempdir");
    let env_file = work.path().join("appd.sh");

    appd()
        .args(["write-env", "/opt/agent"])
        .arg(&env_file)
        .args(["--prefix", "n", "BAD-NAME=x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("BAD-NAME"));
    assert!(!env_file.exists());
}

// --- detect ---

#[test]
fn test_detect_empty_build_dir_exits_one() {
    let build = tempfile::tempdir().expect("tempdir");
    appd().arg("detect").arg(build.path()).assert().code(1);
}

#[test]
fn test_detect_vendored_package_exits_zero() {
    let build = tempfile::tempdir().expect("tempdir");
    fs::create_dir(build.path().join("vendor")).unwrap();
    fs::write(build.path().join("vendor/AppServerAgent-4.5.zip"), b"zip").unwrap();
    appd().arg("detect").arg(build.path()).assert().success();
}

#[test]
fn test_detect_service_binding_exits_zero() {
    let build = tempfile::tempdir().expect("tempdir");
    appd()
        .env(
            "VCAP_SERVICES",
            r#"{"appdynamics":[{"name":"appd","credentials":{"host-name":"c.example.com"}}]}"#,
        )
        .arg("detect")
        .arg(build.path())
        .assert()
        .success();
}

// --- fetch ---

#[test]
fn test_fetch_downloads_into_directory() {
    let work = tempfile::tempdir().expect("tempdir");
    let url = serve_once("200 OK", b"agent bytes");

    appd()
        .arg("fetch")
        .arg(&url)
        .arg(work.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("sha256"));
    assert_eq!(
        fs::read(work.path().join("AppServerAgent.zip")).unwrap(),
        b"agent bytes"
    );
}

#[test]
fn test_fetch_not_found_fails_without_file() {
    let work = tempfile::tempdir().expect("tempdir");
    let url = serve_once("404 Not Found", b"missing");

    appd()
        .arg("fetch")
        .arg(&url)
        .arg(work.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP 404"));
    assert!(!work.path().join("AppServerAgent.zip").exists());
}

#[test]
fn test_fetch_not_found_json_error_code() {
    let work = tempfile::tempdir().expect("tempdir");
    let url = serve_once("404 Not Found", b"missing");

    let output = appd()
        .arg("fetch")
        .arg(&url)
        .arg(work.path())
        .arg("--json")
        .output()
        .expect("run fetch");
    assert!(!output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON");
    assert_eq!(value["code"], "HTTP_STATUS");
}

// --- supply ---

#[test]
fn test_supply_installs_vendored_agent() {
    let build = tempfile::tempdir().expect("tempdir");
    fs::create_dir(build.path().join("vendor")).unwrap();
    build_zip(
        &build.path().join("vendor/AppServerAgent-4.5.zip"),
        &[("javaagent.jar", b"jar"), ("conf/controller-info.xml", b"<c/>")],
    );

    appd()
        .env(
            "VCAP_APPLICATION",
            r#"{"application_name":"shop","space_name":"prod"}"#,
        )
        .arg("supply")
        .arg(build.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("AppDynamics agent installed"));

    assert!(build.path().join(".appdynamics/javaagent.jar").is_file());
    let env = fs::read_to_string(build.path().join(".profile.d/appd.sh")).unwrap();
    assert!(env.contains("${HOME}/.appdynamics/javaagent.jar"));
    assert!(env.contains("export APPDYNAMICS_AGENT_APPLICATION_NAME=\"prod:shop\""));
}

#[test]
fn test_supply_without_package_fails() {
    let build = tempfile::tempdir().expect("tempdir");
    appd()
        .arg("supply")
        .arg(build.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no AppDynamics agent package"));
    assert!(!build.path().join(".profile.d/appd.sh").exists());
}

#[test]
fn test_supply_json_reports_source() {
    let build = tempfile::tempdir().expect("tempdir");
    fs::create_dir(build.path().join("vendor")).unwrap();
    build_zip(
        &build.path().join("vendor/AppServerAgent-4.5.zip"),
        &[("javaagent.jar", b"jar")],
    );

    let output = appd()
        .arg("supply")
        .arg(build.path())
        .arg("--json")
        .output()
        .expect("run supply");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON");
    assert_eq!(value["source"]["kind"], "vendored");
    assert_eq!(value["extracted"], 1);
}

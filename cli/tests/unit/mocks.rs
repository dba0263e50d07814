//! Shared mock infrastructure for unit tests.
//!
//! Provides a recording [`ProgressReporter`], a `mockall` fetcher, a fetcher
//! that serves canned bodies, and a zip builder so each test file doesn't
//! have to re-define the same boilerplate.

#![allow(clippy::expect_used, dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use appd_buildpack::application::ports::{FetchedResource, Fetcher, ProgressReporter};
use appd_buildpack::domain::BuildpackError;
use appd_buildpack::infra::fs::hex_encode;
use appd_buildpack::infra::http::destination_for;
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;

// ── Reporter ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Step,
    Info,
    Success,
    Warn,
    Debug,
}

/// Records every line instead of printing it.
#[derive(Default)]
pub struct RecordingReporter {
    lines: RefCell<Vec<(Line, String)>>,
}

impl RecordingReporter {
    pub fn lines(&self, kind: Line) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn warned(&self, needle: &str) -> bool {
        self.lines(Line::Warn).iter().any(|l| l.contains(needle))
    }

    fn push(&self, kind: Line, message: &str) {
        self.lines.borrow_mut().push((kind, message.to_string()));
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.push(Line::Step, message);
    }
    fn info(&self, message: &str) {
        self.push(Line::Info, message);
    }
    fn success(&self, message: &str) {
        self.push(Line::Success, message);
    }
    fn warn(&self, message: &str) {
        self.push(Line::Warn, message);
    }
    fn debug(&self, message: &str) {
        self.push(Line::Debug, message);
    }
}

// ── Fetchers ─────────────────────────────────────────────────────────────────

mockall::mock! {
    pub Fetcher {}

    impl Fetcher for Fetcher {
        fn fetch(&self, url: &str, dest: &Path) -> Result<FetchedResource, BuildpackError>;
    }
}

/// Serves canned bodies by URL; unknown URLs answer 404.
#[derive(Default)]
pub struct CannedFetcher {
    bodies: HashMap<String, Vec<u8>>,
    pub requests: RefCell<Vec<String>>,
}

impl CannedFetcher {
    pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }
}

impl Fetcher for CannedFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<FetchedResource, BuildpackError> {
        self.requests.borrow_mut().push(url.to_string());
        let Some(body) = self.bodies.get(url) else {
            return Err(BuildpackError::HttpStatus {
                url: url.to_string(),
                status: 404,
            });
        };
        let path = destination_for(url, dest)?;
        std::fs::write(&path, body).expect("write canned body");
        Ok(FetchedResource {
            path,
            bytes: body.len() as u64,
            sha256: hex_encode(&Sha256::digest(body)),
        })
    }
}

// ── Archives ─────────────────────────────────────────────────────────────────

/// Write a zip at `path`. Entries ending in `/` are directories.
pub fn build_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).expect("create zip");
    let mut zip = zip::ZipWriter::new(file);
    for (name, content) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, SimpleFileOptions::default())
                .expect("add dir");
        } else {
            zip.start_file(*name, SimpleFileOptions::default().unix_permissions(0o644))
                .expect("start file");
            zip.write_all(content).expect("write entry");
        }
    }
    zip.finish().expect("finish zip");
}

/// Minimal agent package layout.
pub fn agent_zip(path: &Path) {
    build_zip(
        path,
        &[
            ("conf/", b""),
            ("conf/controller-info.xml", b"<controller-info/>"),
            ("javaagent.jar", b"PK-agent"),
            ("ver4.5.7/lib/agent.jar", b"PK-lib"),
        ],
    );
}

// ── Platform metadata ────────────────────────────────────────────────────────

pub const VCAP_APPLICATION: &str =
    r#"{"application_name":"orders","application_id":"6c1d","space_name":"prod","limits":{"mem":1024}}"#;

pub const VCAP_SERVICES: &str = r#"{
  "appdynamics": [{
    "name": "appd",
    "credentials": {
      "host-name": "controller.example.com",
      "port": "443",
      "ssl-enabled": true,
      "account-access-key": "s3cret",
      "account-name": "customer1"
    }
  }]
}"#;

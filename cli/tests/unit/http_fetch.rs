//! Tests for `UreqFetcher` against a local one-shot HTTP server.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;
use std::time::Duration;

use appd_buildpack::application::ports::Fetcher;
use appd_buildpack::domain::BuildpackError;
use appd_buildpack::infra::http::UreqFetcher;

/// Answer exactly one request with `status` and `body`; returns the base URL.
fn serve_once(status: &'static str, body: &'static [u8]) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = std::thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut request = [0u8; 4096];
        let _ = stream.read(&mut request);
        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(body);
    });
    (format!("http://{addr}"), handle)
}

fn fetcher() -> UreqFetcher {
    UreqFetcher::new(Duration::from_secs(5))
}

#[test]
fn ok_response_is_written_verbatim() {
    let (base, server) = serve_once("200 OK", b"abc");
    let dir = tempfile::tempdir().expect("tempdir");
    let dest = dir.path().join("agent.zip");

    let fetched = fetcher()
        .fetch(&format!("{base}/AppServerAgent.zip"), &dest)
        .expect("fetch");
    server.join().unwrap();

    assert_eq!(fetched.path, dest);
    assert_eq!(fetched.bytes, 3);
    assert_eq!(
        fetched.sha256,
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(std::fs::read(&dest).unwrap(), b"abc");
}

#[test]
fn directory_destination_uses_url_basename() {
    let (base, server) = serve_once("200 OK", b"<controller-info/>");
    let dir = tempfile::tempdir().expect("tempdir");

    let fetched = fetcher()
        .fetch(&format!("{base}/conf/controller-info.xml"), dir.path())
        .expect("fetch");
    server.join().unwrap();

    assert_eq!(fetched.path, dir.path().join("controller-info.xml"));
    assert!(fetched.path.is_file());
}

#[test]
fn not_found_leaves_no_file() {
    let (base, server) = serve_once("404 Not Found", b"<html>missing</html>");
    let dir = tempfile::tempdir().expect("tempdir");
    let dest = dir.path().join("log4j2.xml");

    let err = fetcher()
        .fetch(&format!("{base}/conf/log4j2.xml"), &dest)
        .unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, BuildpackError::HttpStatus { status: 404, .. }), "{err}");
    assert!(!dest.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0, "no temp file left");
}

#[test]
fn non_200_success_status_is_rejected() {
    let (base, server) = serve_once("204 No Content", b"");
    let dir = tempfile::tempdir().expect("tempdir");
    let dest = dir.path().join("x.zip");

    let err = fetcher().fetch(&format!("{base}/x.zip"), &dest).unwrap_err();
    server.join().unwrap();

    assert_eq!(err.http_status(), Some(204));
    assert!(!dest.exists());
}

#[test]
fn existing_file_is_replaced_on_success() {
    let (base, server) = serve_once("200 OK", b"new");
    let dir = tempfile::tempdir().expect("tempdir");
    let dest = dir.path().join("agent.zip");
    std::fs::write(&dest, b"old and longer").unwrap();

    fetcher().fetch(&format!("{base}/agent.zip"), &dest).expect("fetch");
    server.join().unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"new");
}

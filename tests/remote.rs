//! Remote sources against a local one-shot HTTP server.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use kiru::{Chunk, Chunker, ErrorKind, Source, SourceId};

/// Read the request head so the client sees a clean exchange.
fn read_request(stream: &mut TcpStream) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
}

/// Serve one response and return the URL to fetch it from.
fn serve_once(status: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            read_request(&mut stream);
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
        }
    });
    format!("http://{addr}/doc.txt")
}

/// Accept one connection and never answer.
fn serve_silence(hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            read_request(&mut stream);
            thread::sleep(hold);
        }
    });
    format!("http://{addr}/slow")
}

fn chunker_chars(size: usize, overlap: usize) -> Chunker {
    Chunker::by_characters(size, overlap)
        .unwrap()
        .with_system_proxy(false)
        .with_remote_timeout(Duration::from_secs(5))
}

#[test]
fn remote_body_chunks_like_string() {
    let text: String = "Grüße aus dem Netz. ".repeat(500);
    let url = serve_once("200 OK", text.clone().into_bytes());

    let chunker = chunker_chars(64, 8);
    let items: Vec<_> = chunker.on_sources([url.as_str()]).collect();
    let remote: Vec<Chunk> = items
        .into_iter()
        .map(|i| i.map(|tagged| tagged.chunk))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(remote, chunker.chunk(&text));
}

#[test]
fn not_found_is_network_error() {
    let url = serve_once("404 Not Found", b"missing".to_vec());

    let chunker = chunker_chars(8, 0);
    let items: Vec<_> = chunker.on_sources([Source::parse(&url)]).collect();
    assert_eq!(items.len(), 1);
    let failure = items[0].as_ref().unwrap_err();
    assert_eq!(failure.error.kind(), ErrorKind::Network);
    assert_eq!(failure.id, SourceId { input: 0, member: 0 });
}

#[test]
fn connection_refused_is_network_error() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let chunker = chunker_chars(8, 0);
    let mut iter = chunker.on_source(Source::Remote(format!("http://{addr}/")));
    let err = iter.next().unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(iter.next().is_none());
}

#[test]
fn timeout_is_network_error() {
    let url = serve_silence(Duration::from_secs(3));

    let chunker = chunker_chars(8, 0).with_remote_timeout(Duration::from_millis(200));
    let err = chunker
        .on_source(Source::parse(&url))
        .next()
        .unwrap()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[test]
fn remote_failure_does_not_stop_siblings() {
    let bad = serve_once("500 Internal Server Error", Vec::new());
    let good = serve_once("200 OK", b"abcdefgh".to_vec());

    let chunker = chunker_chars(4, 0);
    let items: Vec<_> = chunker
        .on_sources_par([Source::parse(&bad), Source::parse(&good), Source::text("xyz")], 2)
        .unwrap()
        .collect();

    let failures: Vec<_> = items.iter().filter_map(|i| i.as_ref().err()).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].id.input, 0);

    let mut good_chunks: Vec<&str> = items
        .iter()
        .filter_map(|i| i.as_ref().ok())
        .filter(|t| t.id.input == 1)
        .filter_map(|t| t.chunk.as_str())
        .collect();
    good_chunks.sort_unstable();
    assert_eq!(good_chunks, ["abcd", "efgh"]);
}

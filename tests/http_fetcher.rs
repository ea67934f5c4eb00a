// tests/http_fetcher.rs
//
// HttpFetcher against a local one-page HTTP server that counts requests.
//
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use hero_counters::config::consts::MAX_MARKER_REPOLLS;
use hero_counters::config::SiteOptions;
use hero_counters::core::HttpFetcher;
use hero_counters::error::FetchError;
use hero_counters::fetch::{self, Marker};

/// Serve `body` with 200 to every request; returns the base URL and a hit counter.
fn serve(body: String) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            }
            counter.fetch_add(1, Ordering::SeqCst);
            let resp = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes());
            let _ = stream.flush();
        }
    });

    (format!("http://{addr}"), hits)
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(&SiteOptions::default(), Duration::from_secs(5))
        .unwrap()
        .with_poll(Duration::from_millis(50))
}

fn ready_page() -> String {
    let rows: String = (0..12)
        .map(|i| {
            format!(
                r#"<tr><td></td><td><a href="/heroes/h{i}">H</a></td><td>1%</td><td>50%</td><td>10</td></tr>"#
            )
        })
        .collect();
    format!("<table><thead><tr><th>Hero</th><th>Win Rate</th></tr></thead><tbody>{rows}</tbody></table>")
}

#[test]
fn block_page_costs_a_bounded_number_of_requests() {
    let (base, hits) = serve(String::from("<html><title>Just a moment...</title></html>"));
    let mut f = fetcher();

    let started = Instant::now();
    let err = fetch::fetch_page(&mut f, &format!("{base}/heroes/axe/counters"), &Marker::MatchupTable, Duration::from_secs(5))
        .unwrap_err();

    assert!(matches!(err, FetchError::MarkerTimeout { .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 1 + MAX_MARKER_REPOLLS as usize);
    // 50 ms + 100 ms of backoff, nowhere near the 5 s timeout.
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[test]
fn without_repolls_only_the_navigated_body_is_checked() {
    let (base, hits) = serve(String::from("<html><body>blocked</body></html>"));
    let mut f = fetcher().with_max_repolls(0);

    let res = fetch::fetch_page(&mut f, &base, &Marker::MatchupTable, Duration::from_secs(5));
    assert!(res.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn ready_page_is_fetched_once() {
    let page = ready_page();
    let (base, hits) = serve(page.clone());
    let mut f = fetcher();

    let markup = fetch::fetch_page(&mut f, &base, &Marker::MatchupTable, Duration::from_secs(5)).unwrap();
    assert_eq!(markup, page);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

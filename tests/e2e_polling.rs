// LogPoller - tests/e2e_polling.rs
//
// End-to-end tests for the fetch / compare / render cycle.
//
// A mockito server on 127.0.0.1 serves scripted responses, so these tests go
// through real sockets, the real reqwest client and the real poll drivers.
// Only time is virtual, and only where a ManualClock is passed in.
//
// Mocks registered for the same path with `expect(1)` answer in the order
// they were created, which is how response sequences are scripted.

use logpoller::app::fetch::{HttpSource, SnapshotSource};
use logpoller::app::headless::{run_headless, HeadlessOptions};
use logpoller::app::poll::PollManager;
use logpoller::app::poller::{LogPoller, PollSettings};
use logpoller::core::model::{ComparisonMode, CycleOutcome, FeedStatus, PollProgress};
use logpoller::core::region::{DisplayRegion, MemoryRegion};
use logpoller::core::schedule::ManualClock;
use logpoller::util::constants::MAX_SNAPSHOT_BYTES;
use logpoller::util::error::FetchError;
use mockito::{Mock, Server, ServerGuard};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::time::{Duration, Instant};

// =============================================================================
// Helpers
// =============================================================================

const LOG_PATH: &str = "/log_stream";

/// Register a 200 response carrying `body`, answered `hits` times.
fn mock_log(server: &mut ServerGuard, body: &str, hits: usize) -> Mock {
    server
        .mock("GET", LOG_PATH)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(body)
        .expect(hits)
        .create()
}

/// Register an error response with `status`, answered `hits` times.
fn mock_status(server: &mut ServerGuard, status: usize, hits: usize) -> Mock {
    server
        .mock("GET", LOG_PATH)
        .with_status(status)
        .with_body("server error")
        .expect(hits)
        .create()
}

fn source_for(server: &ServerGuard) -> HttpSource {
    HttpSource::new(&format!("{}{LOG_PATH}", server.url()), Duration::from_secs(5)).unwrap()
}

fn settings() -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(1_000),
        compare: ComparisonMode::Exact,
        max_in_flight: 2,
    }
}

// =============================================================================
// HttpSource E2E
// =============================================================================

#[test]
fn e2e_http_source_returns_body_verbatim() {
    let mut server = Server::new();
    let mock = mock_log(
        &mut server,
        "<div style=\"color:black\">INFO ready</div>\n",
        1,
    );

    let snapshot = source_for(&server).fetch().unwrap();
    assert_eq!(
        snapshot.as_str(),
        "<div style=\"color:black\">INFO ready</div>\n"
    );
    mock.assert();
}

#[test]
fn e2e_http_source_maps_non_success_status() {
    let mut server = Server::new();
    let mock = mock_status(&mut server, 500, 1);

    let err = source_for(&server).fetch().unwrap_err();
    assert!(
        matches!(err, FetchError::Server { status: 500, .. }),
        "got {err:?}"
    );
    mock.assert();
}

#[test]
fn e2e_http_source_rejects_oversized_body_with_content_length() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", LOG_PATH)
        .with_status(200)
        .with_body(vec![b'x'; MAX_SNAPSHOT_BYTES + 1])
        .expect(1)
        .create();

    let err = source_for(&server).fetch().unwrap_err();
    assert!(
        matches!(
            err,
            FetchError::BodyTooLarge { size, max_size, .. }
                if size == MAX_SNAPSHOT_BYTES + 1 && max_size == MAX_SNAPSHOT_BYTES
        ),
        "got {err:?}"
    );
    mock.assert();
}

#[test]
fn e2e_http_source_rejects_oversized_body_without_content_length() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", LOG_PATH)
        .with_status(200)
        .with_chunked_body(|w| {
            let chunk = vec![b'x'; 64 * 1024];
            let mut written = 0;
            while written <= MAX_SNAPSHOT_BYTES {
                w.write_all(&chunk)?;
                written += chunk.len();
            }
            Ok(())
        })
        .expect(1)
        .create();

    let err = source_for(&server).fetch().unwrap_err();
    assert!(
        matches!(
            err,
            FetchError::BodyTooLarge { size, max_size, .. }
                if size == MAX_SNAPSHOT_BYTES + 1 && max_size == MAX_SNAPSHOT_BYTES
        ),
        "got {err:?}"
    );
    mock.assert();
}

#[test]
fn e2e_http_source_accepts_body_at_the_cap() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", LOG_PATH)
        .with_status(200)
        .with_chunked_body(|w| w.write_all(&vec![b'x'; MAX_SNAPSHOT_BYTES]))
        .expect(1)
        .create();

    let snapshot = source_for(&server).fetch().unwrap();
    assert_eq!(snapshot.as_str().len(), MAX_SNAPSHOT_BYTES);
    mock.assert();
}

#[test]
fn e2e_http_source_maps_connection_refused() {
    // Bind then drop, so nothing listens on the port.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let source = HttpSource::new(
        &format!("http://127.0.0.1:{port}{LOG_PATH}"),
        Duration::from_secs(2),
    )
    .unwrap();
    let err = source.fetch().unwrap_err();
    assert!(matches!(err, FetchError::Network { .. }), "got {err:?}");
}

#[test]
fn e2e_http_source_times_out() {
    // mockito always sends the status line promptly; a listener that reads
    // the request and never answers is needed to hit the request timeout.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            std::thread::sleep(Duration::from_secs(3));
        }
    });

    let source = HttpSource::new(
        &format!("http://{addr}{LOG_PATH}"),
        Duration::from_millis(200),
    )
    .unwrap();
    let started = Instant::now();
    let err = source.fetch().unwrap_err();
    assert!(
        matches!(err, FetchError::Timeout { timeout_ms: 200, .. }),
        "got {err:?}"
    );
    assert!(started.elapsed() < Duration::from_secs(2));
}

// =============================================================================
// Poll cycle over HTTP (virtual time)
// =============================================================================

/// Identical snapshots on consecutive ticks render once.
#[test]
fn e2e_unchanged_log_is_not_redrawn() {
    let mut server = Server::new();
    let mock = mock_log(&mut server, "<div>log A</div>", 2);
    let clock = ManualClock::new();
    let mut poller = LogPoller::new(source_for(&server), clock.clone(), settings());
    let mut region = MemoryRegion::new();

    poller.start();
    let first = poller.run_due(&mut region).unwrap();
    assert!(matches!(first, CycleOutcome::Rendered { .. }));

    assert!(poller.run_due(&mut region).is_none(), "next tick not due yet");
    clock.advance(Duration::from_millis(1_000));
    let second = poller.run_due(&mut region).unwrap();
    assert!(matches!(second, CycleOutcome::Unchanged { .. }));

    assert_eq!(region.mutations(), 1);
    assert_eq!(region.content().unwrap(), "<div>log A</div>");
    mock.assert();
}

/// A server failure leaves the last good log on screen; recovery redraws.
#[test]
fn e2e_failure_keeps_last_content_then_recovers() {
    let mut server = Server::new();
    let first = mock_log(&mut server, "<div>log A</div>", 1);
    let failure = mock_status(&mut server, 503, 1);
    let recovery = mock_log(&mut server, "<div>log A</div><div>log B</div>", 1);

    let clock = ManualClock::new();
    let mut poller = LogPoller::new(source_for(&server), clock.clone(), settings());
    let mut region = MemoryRegion::new();
    let mut status = FeedStatus::default();

    poller.start();
    let mut outcomes = Vec::new();
    for _ in 0..3 {
        let outcome = poller.run_due(&mut region).unwrap();
        status = status.advance(&outcome, chrono::Local::now());
        if outcomes.len() == 1 {
            assert!(status.is_unavailable());
            assert_eq!(region.text(), "<div>log A</div>");
        }
        outcomes.push(outcome);
        clock.advance(Duration::from_millis(1_000));
    }

    assert!(matches!(outcomes[0], CycleOutcome::Rendered { .. }));
    assert!(matches!(
        outcomes[1],
        CycleOutcome::FetchFailed {
            error: FetchError::Server { status: 503, .. },
            ..
        }
    ));
    assert!(matches!(outcomes[2], CycleOutcome::Rendered { .. }));
    assert!(matches!(status, FeedStatus::Live { .. }));
    assert_eq!(region.text(), "<div>log A</div><div>log B</div>");
    assert_eq!(region.mutations(), 2);

    first.assert();
    failure.assert();
    recovery.assert();
}

/// Only the fetched body is ever displayed: whatever was there before is
/// replaced wholesale.
#[test]
fn e2e_render_replaces_previous_content_wholesale() {
    let mut server = Server::new();
    let mock = mock_log(&mut server, "<div>new</div>", 1);
    let mut poller = LogPoller::new(source_for(&server), ManualClock::new(), settings());
    let mut region = MemoryRegion::with_content("<div>old</div><p>stale footer</p>");

    let outcome = poller.poll_once(&mut region);
    assert!(matches!(outcome, CycleOutcome::Rendered { .. }));
    assert_eq!(region.text(), "<div>new</div>");
    mock.assert();
}

/// In text mode a markup-only change is not a redraw.
#[test]
fn e2e_text_mode_ignores_markup_only_changes() {
    let mut server = Server::new();
    let black = mock_log(&mut server, "<div style=\"color:black\">INFO up</div>", 1);
    let green = mock_log(&mut server, "<div style=\"color:green\">INFO up</div>", 1);

    let clock = ManualClock::new();
    let mut poller = LogPoller::new(
        source_for(&server),
        clock.clone(),
        PollSettings {
            compare: ComparisonMode::TextContent,
            ..settings()
        },
    );
    let mut region = MemoryRegion::new();

    poller.start();
    assert!(matches!(
        poller.run_due(&mut region),
        Some(CycleOutcome::Rendered { .. })
    ));
    clock.advance(Duration::from_millis(1_000));
    assert!(matches!(
        poller.run_due(&mut region),
        Some(CycleOutcome::Unchanged { .. })
    ));
    assert_eq!(region.mutations(), 1);

    black.assert();
    green.assert();
}

// =============================================================================
// Threaded driver and terminal driver over HTTP (real time)
// =============================================================================

#[test]
fn e2e_poll_manager_delivers_render_and_outcome() {
    let mut server = Server::new();
    // The poll thread keeps fetching until stopped, so the hit count varies.
    let mock = server
        .mock("GET", LOG_PATH)
        .with_status(200)
        .with_body("<div>live line</div>")
        .expect_at_least(1)
        .create();

    let mut manager = PollManager::new();
    manager.start_polling(
        source_for(&server),
        PollSettings {
            interval: Duration::from_millis(100),
            ..settings()
        },
        String::new(),
    );

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut rendered = None;
    let mut outcome = None;
    while Instant::now() < deadline && (rendered.is_none() || outcome.is_none()) {
        for msg in manager.poll_progress() {
            match msg {
                PollProgress::Render { markup } => rendered = Some(markup),
                PollProgress::Outcome(o) if outcome.is_none() => outcome = Some(o),
                _ => {}
            }
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    manager.stop_polling();

    assert_eq!(rendered.as_deref(), Some("<div>live line</div>"));
    assert!(matches!(outcome, Some(CycleOutcome::Rendered { .. })));
    mock.assert();
}

#[test]
fn e2e_headless_once_prints_current_log() {
    let mut server = Server::new();
    let mock = mock_log(
        &mut server,
        "<div style=\"color:red\">ERROR disk full</div>\n<div style=\"color:black\">INFO retrying</div>",
        1,
    );

    let mut out = Vec::new();
    let summary = run_headless(
        source_for(&server),
        settings(),
        &mut out,
        HeadlessOptions {
            max_cycles: Some(1),
            fail_fast: true,
        },
    )
    .unwrap();
    assert_eq!(summary.renders, 1);

    let text = String::from_utf8(out).unwrap();
    let body: Vec<&str> = text.lines().skip(1).collect();
    assert_eq!(body, vec!["ERROR disk full", "INFO retrying"]);
    mock.assert();
}

#[test]
fn e2e_headless_once_fails_when_log_unavailable() {
    let mut server = Server::new();
    let mock = mock_status(&mut server, 502, 1);

    let mut out = Vec::new();
    let result = run_headless(
        source_for(&server),
        settings(),
        &mut out,
        HeadlessOptions {
            max_cycles: Some(1),
            fail_fast: true,
        },
    );
    assert!(result.is_err());
    assert!(out.is_empty());
    mock.assert();
}

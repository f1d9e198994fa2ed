use crate::banner;
use crate::types::{ScanConfig, ScanOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::time;

/// Attempt a single outbound TCP connection bounded by `timeout`.
///
/// Every failure mode — refused, timed out, unreachable, DNS error —
/// collapses to `None`; the caller learns nothing beyond open/closed.
pub async fn probe(host: &str, port: u16, timeout: Duration) -> Option<TcpStream> {
    match time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => Some(stream),
        _ => None,
    }
}

/// Scan every port in `config.ports` and return only the open outcomes.
///
/// One task is dispatched per requested port. When `config.concurrency`
/// is nonzero, a `Semaphore` of that capacity gates how many probes run
/// at once; excess tasks suspend waiting for a permit. With a ceiling of
/// zero every task runs immediately with no bound. Both paths share one
/// dispatch loop parameterized by the optional gate.
///
/// Each task emits exactly one outcome into a channel sized to the total
/// port count, so hand-off never blocks a producer. After every task has
/// finished the channel is drained and filtered to `open == true`.
/// Outcome order follows completion order and is nondeterministic.
pub async fn scan(config: &ScanConfig) -> Vec<ScanOutcome> {
    if config.ports.is_empty() {
        return Vec::new();
    }

    let (tx, mut rx) = mpsc::channel::<ScanOutcome>(config.ports.len());
    let gate = if config.concurrency > 0 {
        Some(Arc::new(Semaphore::new(config.concurrency)))
    } else {
        None
    };

    let mut set = JoinSet::new();
    for &port in &config.ports {
        let host = config.host.clone();
        let timeout = config.timeout;
        let grab_banner = config.grab_banner;
        let gate = gate.clone();
        let tx = tx.clone();

        set.spawn(async move {
            let _permit = match gate {
                Some(sem) => Some(sem.acquire_owned().await.expect("semaphore in scope")),
                None => None,
            };
            let outcome = probe_port(&host, port, timeout, grab_banner).await;
            // Capacity covers every producer, so this cannot block.
            let _ = tx.send(outcome).await;
        });
    }
    drop(tx);

    // Join-all barrier before draining.
    while set.join_next().await.is_some() {}

    let mut open = Vec::new();
    while let Ok(outcome) = rx.try_recv() {
        if outcome.open {
            open.push(outcome);
        }
    }
    open
}

/// Probe one port and produce its outcome. The connection, if any, lives
/// only within this call and is closed on return whichever path is taken.
async fn probe_port(host: &str, port: u16, timeout: Duration, grab_banner: bool) -> ScanOutcome {
    let stream = match probe(host, port, timeout).await {
        Some(stream) => stream,
        None => return ScanOutcome::closed(port),
    };

    let (service, banner) = if grab_banner {
        banner::identify(stream, port, timeout).await
    } else {
        (banner::well_known_service(port).to_string(), String::new())
    };

    ScanOutcome {
        port,
        open: true,
        service,
        banner,
    }
}

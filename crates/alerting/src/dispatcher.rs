//! Asynchronous alert dispatch
//!
//! The frame loop hands requests over without waiting. A background task
//! fans each request out to every notifier that accepts it, running the
//! (possibly slow) delivery on blocking worker threads.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::notifier::Notifier;
use crate::request::AlertRequest;
use crate::AlertError;

/// Delivery outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub requests: usize,
    pub delivered: usize,
    pub failed: usize,
}

type Delivery = (&'static str, Result<(), AlertError>);

/// Fire-and-forget alert dispatcher
pub struct AlertDispatcher {
    tx: mpsc::UnboundedSender<AlertRequest>,
    worker: JoinHandle<DispatchStats>,
}

impl AlertDispatcher {
    /// Start the dispatch task. Must be called from within a tokio runtime.
    pub fn spawn(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        info!("Starting alert dispatcher with {} notifier(s)", notifiers.len());
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run(rx, notifiers));
        Self { tx, worker }
    }

    /// Queue a request; never waits on delivery
    pub fn dispatch(&self, request: AlertRequest) -> Result<(), AlertError> {
        debug!(kind = ?request.kind, test = request.test, "Queueing alert");
        self.tx.send(request).map_err(|_| AlertError::DispatcherClosed)
    }

    /// Stop accepting requests and wait for in-flight deliveries
    pub async fn shutdown(self) -> DispatchStats {
        drop(self.tx);
        match self.worker.await {
            Ok(stats) => stats,
            Err(e) => {
                error!("Alert dispatcher task failed: {}", e);
                DispatchStats::default()
            }
        }
    }
}

async fn run(mut rx: mpsc::UnboundedReceiver<AlertRequest>, notifiers: Vec<Arc<dyn Notifier>>) -> DispatchStats {
    let mut stats = DispatchStats::default();
    let mut in_flight: JoinSet<Delivery> = JoinSet::new();

    loop {
        tokio::select! {
            maybe = rx.recv() => match maybe {
                Some(request) => {
                    stats.requests += 1;
                    fan_out(&mut in_flight, &notifiers, request);
                }
                None => break,
            },
            Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                record(&mut stats, done);
            }
        }
    }

    while let Some(done) = in_flight.join_next().await {
        record(&mut stats, done);
    }

    info!(
        requests = stats.requests,
        delivered = stats.delivered,
        failed = stats.failed,
        "Alert dispatcher stopped"
    );
    stats
}

fn fan_out(in_flight: &mut JoinSet<Delivery>, notifiers: &[Arc<dyn Notifier>], request: AlertRequest) {
    let request = Arc::new(request);
    let mut accepted = 0;

    for notifier in notifiers.iter().filter(|n| n.accepts(&request)) {
        let notifier = Arc::clone(notifier);
        let request = Arc::clone(&request);
        accepted += 1;
        in_flight.spawn_blocking(move || (notifier.name(), notifier.deliver(&request)));
    }

    if accepted == 0 {
        warn!(kind = ?request.kind, "No notifier accepts alert, dropping it");
    }
}

fn record(stats: &mut DispatchStats, done: Result<Delivery, JoinError>) {
    match done {
        Ok((name, Ok(()))) => {
            stats.delivered += 1;
            debug!(notifier = name, "Alert delivered");
        }
        Ok((name, Err(e))) => {
            stats.failed += 1;
            warn!(notifier = name, "Alert delivery failed: {}", e);
        }
        Err(e) => {
            stats.failed += 1;
            error!("Alert delivery task panicked: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{AlertKind, EmergencyContact};
    use dms::Timestamp;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<AlertRequest>>,
    }

    impl Notifier for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn accepts(&self, _request: &AlertRequest) -> bool {
            true
        }

        fn deliver(&self, request: &AlertRequest) -> Result<(), AlertError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    struct Failing;

    impl Notifier for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn accepts(&self, request: &AlertRequest) -> bool {
            request.kind == AlertKind::Emergency
        }

        fn deliver(&self, _request: &AlertRequest) -> Result<(), AlertError> {
            Err(AlertError::Delivery("transport unavailable".to_string()))
        }
    }

    fn request(kind: AlertKind) -> AlertRequest {
        AlertRequest {
            kind,
            contact: Some(EmergencyContact {
                name: "Dana".to_string(),
                phone: Some("+15550100".to_string()),
                email: None,
            }),
            test: false,
            requested_at: Timestamp::from_secs(1),
            drowsy_ms: None,
        }
    }

    #[tokio::test]
    async fn test_delivers_to_all_accepting_notifiers() {
        let recording = Arc::new(Recording::default());
        let notifiers: Vec<Arc<dyn Notifier>> = vec![recording.clone(), Arc::new(Failing)];
        let dispatcher = AlertDispatcher::spawn(notifiers);

        dispatcher.dispatch(request(AlertKind::YawnAlarm)).unwrap();
        dispatcher.dispatch(request(AlertKind::Emergency)).unwrap();

        let stats = dispatcher.shutdown().await;
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.failed, 1);

        let seen = recording.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().any(|r| r.kind == AlertKind::Emergency));
    }

    #[tokio::test]
    async fn test_unaccepted_request_is_dropped() {
        let notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(Failing)];
        let dispatcher = AlertDispatcher::spawn(notifiers);
        dispatcher.dispatch(request(AlertKind::DrowsinessAlarm)).unwrap();

        let stats = dispatcher.shutdown().await;
        assert_eq!(stats.requests, 1);
        assert_eq!(stats.delivered + stats.failed, 0);
    }
}

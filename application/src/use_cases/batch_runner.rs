//! Batch harness.
//!
//! Drives independent session clients directly, bypassing the pool. Every
//! attempt gets a fresh transport (and so a fresh proxy session) and a fresh
//! client; answers must pass the quality gate to count as a success.

use crate::client::{ClientError, SessionClient};
use crate::config::BatchParams;
use crate::ports::result_sink::{NoResultSink, RequestRecord, ResultSink};
use crate::ports::transport::TransportFactory;
use abra_domain::util::preview;
use abra_domain::{ExhaustionPolicy, PromptOutcome, StructuredResult, check_quality};
use futures::future::join_all;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Final tally of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub ok: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.ok + self.failed
    }

    /// Percentage of successful requests (0.0 for an empty batch).
    pub fn success_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.ok as f64 / total as f64 * 100.0,
        }
    }
}

pub struct BatchRunner {
    factory: Arc<dyn TransportFactory>,
    params: BatchParams,
    exhaustion: ExhaustionPolicy,
    sink: Arc<dyn ResultSink>,
}

impl BatchRunner {
    pub fn new(factory: Arc<dyn TransportFactory>, params: BatchParams) -> Self {
        Self {
            factory,
            params,
            exhaustion: ExhaustionPolicy::default(),
            sink: Arc::new(NoResultSink),
        }
    }

    pub fn with_exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion = policy;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn params(&self) -> &BatchParams {
        &self.params
    }

    /// Send `prompt` `total` times with at most `parallel` in flight.
    pub async fn run(&self, prompt: &str, total: usize) -> BatchSummary {
        info!(
            "Starting batch: {} requests, {} parallel",
            total, self.params.parallel
        );
        info!("Prompt: {}", preview(prompt, 80));

        let semaphore = &Semaphore::new(self.params.parallel.max(1));
        let progress = &Mutex::new(BatchSummary::default());

        join_all((0..total).map(|index| async move {
            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            let started = Instant::now();
            let success = self.run_single(index, prompt, started).await;
            self.report(progress, success, total, started.elapsed());
        }))
        .await;

        let summary = *progress.lock().unwrap_or_else(PoisonError::into_inner);
        info!(
            "Batch complete: {} requests, success: {} ({:.1}%), failed: {}",
            summary.total(),
            summary.ok,
            summary.success_rate(),
            summary.failed
        );
        summary
    }

    fn report(&self, progress: &Mutex<BatchSummary>, success: bool, total: usize, last: Duration) {
        let mut summary = progress.lock().unwrap_or_else(PoisonError::into_inner);
        if success {
            summary.ok += 1;
        } else {
            summary.failed += 1;
        }
        info!(
            "{}/{} done | OK: {} FAIL: {} | rate: {:.1}% | last: {}ms",
            summary.total(),
            total,
            summary.ok,
            summary.failed,
            summary.success_rate(),
            last.as_millis()
        );
    }

    /// One request with retries. Records the final outcome and returns
    /// whether it succeeded.
    async fn run_single(&self, index: usize, prompt: &str, started: Instant) -> bool {
        let max_retries = self.params.max_retries;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            match self.attempt(index, prompt).await {
                Ok(result) => {
                    self.sink.record(
                        RequestRecord::new(prompt, &self.params.country, &PromptOutcome::from(result))
                            .with_duration(started.elapsed())
                            .with_retried(attempt > 0),
                    );
                    return true;
                }
                Err(e) => {
                    if attempt < max_retries {
                        info!("#{} retry {}/{}: {}", index, attempt + 1, max_retries, e);
                    }
                    last_error = Some(e);
                }
            }
        }

        let error = last_error.map(|e| e.to_string()).unwrap_or_default();
        warn!("#{} failed after {} attempt(s): {}", index, max_retries + 1, error);
        self.sink.record(
            RequestRecord::new(prompt, &self.params.country, &PromptOutcome::failure(error))
                .with_duration(started.elapsed())
                .with_retried(max_retries > 0),
        );
        false
    }

    async fn attempt(&self, index: usize, prompt: &str) -> Result<StructuredResult, ClientError> {
        let transport = self.factory.create(Some(index))?;
        let client = SessionClient::new(transport, Some(index))
            .with_exhaustion_policy(self.exhaustion.clone());

        let result = client.send_prompt(prompt).await.and_then(|result| {
            check_quality(&result).map_err(|e| ClientError::LowQualityResponse(e.to_string()))?;
            Ok(result)
        });

        if let Err(e) = client.close().await {
            debug!("#{} close failed: {}", index, e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{
        ScriptedTransport, landing_html, long_answer, message_body, token_body,
    };
    use crate::ports::transport::{HttpResponse, HttpTransport, TransportError};
    use std::collections::VecDeque;

    // ==================== Test Mocks ====================

    struct QueueFactory {
        transports: Mutex<VecDeque<Arc<ScriptedTransport>>>,
        created: Mutex<Vec<Option<usize>>>,
    }

    impl QueueFactory {
        fn new(transports: Vec<Arc<ScriptedTransport>>) -> Arc<Self> {
            Arc::new(Self {
                transports: Mutex::new(VecDeque::from(transports)),
                created: Mutex::new(Vec::new()),
            })
        }
    }

    impl TransportFactory for QueueFactory {
        fn create(&self, client_id: Option<usize>) -> Result<Arc<dyn HttpTransport>, TransportError> {
            self.created.lock().unwrap().push(client_id);
            let transport = self
                .transports
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| TransportError::InvalidProxy("no transports left".into()))?;
            Ok(transport)
        }
    }

    #[derive(Default)]
    struct MemorySink {
        records: Mutex<Vec<RequestRecord>>,
    }

    impl ResultSink for MemorySink {
        fn record(&self, record: RequestRecord) {
            self.records.lock().unwrap().push(record);
        }
    }

    fn scripted(answer: &str) -> Arc<ScriptedTransport> {
        ScriptedTransport::new(vec![
            HttpResponse::new(200, landing_html("LSD")),
            HttpResponse::new(200, token_body("TOKEN")),
            HttpResponse::new(200, message_body(answer, None)),
        ])
    }

    fn runner(
        factory: Arc<QueueFactory>,
        params: BatchParams,
    ) -> (BatchRunner, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        (BatchRunner::new(factory, params).with_sink(sink.clone()), sink)
    }

    #[tokio::test]
    async fn test_all_requests_succeed() {
        let transports = vec![scripted(&long_answer()), scripted(&long_answer()), scripted(&long_answer())];
        let factory = QueueFactory::new(transports.clone());
        let params = BatchParams::default().with_parallel(2);
        let (runner, sink) = runner(factory.clone(), params);

        let summary = runner.run("prompt", 3).await;
        assert_eq!(summary, BatchSummary { ok: 3, failed: 0 });
        assert_eq!(summary.success_rate(), 100.0);

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.success && !r.retried));
        // Every attempt closes its client
        assert!(transports.iter().all(|t| t.close_count() == 1));
    }

    #[tokio::test]
    async fn test_quality_gate_triggers_retry_with_fresh_client() {
        let factory = QueueFactory::new(vec![scripted("Hi"), scripted(&long_answer())]);
        let params = BatchParams::default().with_parallel(1).with_max_retries(2);
        let (runner, sink) = runner(factory.clone(), params);

        let summary = runner.run("prompt", 1).await;
        assert_eq!(summary, BatchSummary { ok: 1, failed: 0 });
        assert_eq!(*factory.created.lock().unwrap(), vec![Some(0), Some(0)]);

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].retried);
        assert_eq!(records[0].status_code, 200);
    }

    #[tokio::test]
    async fn test_exhausted_retries_record_failure() {
        let factory = QueueFactory::new(vec![scripted("Hi"), scripted("  ")]);
        let params = BatchParams::default().with_parallel(1).with_max_retries(1);
        let (runner, sink) = runner(factory, params);

        let summary = runner.run("prompt", 1).await;
        assert_eq!(summary, BatchSummary { ok: 0, failed: 1 });

        let records = sink.records.lock().unwrap();
        assert!(!records[0].success);
        assert_eq!(records[0].status_code, 502);
        assert_eq!(records[0].result["error"], "Empty response from Meta AI");
    }

    #[tokio::test]
    async fn test_transport_creation_failure_counts_as_failure() {
        let factory = QueueFactory::new(vec![]);
        let params = BatchParams::default().with_parallel(1).with_max_retries(0);
        let (runner, sink) = runner(factory, params);

        let summary = runner.run("prompt", 2).await;
        assert_eq!(summary, BatchSummary { ok: 0, failed: 2 });
        assert_eq!(sink.records.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_summary_rate() {
        assert_eq!(BatchSummary::default().success_rate(), 0.0);
        assert_eq!(BatchSummary { ok: 1, failed: 3 }.success_rate(), 25.0);
    }
}

//! Ingestion consumer loop.

use crate::metrics::IngestMetrics;
use crate::source::{BrokerMessage, MessageSource};
use orderly_config::{BrokerConfig, IngestConfig};
use orderly_core::{OrderlyError, OrderlyResult};
use orderly_service::IngestService;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Consumer configuration.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// How long one fetch blocks.
    pub poll_timeout: Duration,

    /// Deadline for ingesting one message.
    pub message_timeout: Duration,

    /// Pause after a redelivery or broker failure.
    pub retry_backoff: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(1),
            message_timeout: Duration::from_secs(10),
            retry_backoff: Duration::from_secs(1),
        }
    }
}

impl ConsumerConfig {
    #[must_use]
    pub fn new(broker: &BrokerConfig, ingest: &IngestConfig) -> Self {
        Self {
            poll_timeout: broker.poll_timeout(),
            message_timeout: ingest.message_timeout(),
            retry_backoff: ingest.retry_backoff(),
        }
    }
}

/// What happened to a message after one ingestion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Persisted and acknowledged.
    Ingested,
    /// Definitively rejected and acknowledged.
    Rejected,
    /// Handed back to the broker after a transient failure.
    Redelivered,
}

/// Pulls messages from a [`MessageSource`] and feeds them to the
/// ingestion service one at a time.
pub struct IngestConsumer<S: MessageSource> {
    id: String,
    source: Arc<S>,
    service: Arc<dyn IngestService>,
    config: ConsumerConfig,
    stop_tx: watch::Sender<bool>,
    running: AtomicBool,
    processed: AtomicU64,
    rejected: AtomicU64,
    redelivered: AtomicU64,
}

impl<S: MessageSource + 'static> IngestConsumer<S> {
    /// Create a new consumer.
    pub fn new(source: Arc<S>, service: Arc<dyn IngestService>, config: ConsumerConfig) -> Self {
        let (stop_tx, _) = watch::channel(false);

        Self {
            id: format!("consumer-{}", Uuid::new_v4()),
            source,
            service,
            config,
            stop_tx,
            running: AtomicBool::new(false),
            processed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            redelivered: AtomicU64::new(0),
        }
    }

    /// Run the consumer loop until [`stop`](Self::stop) is called.
    ///
    /// In-flight messages left by a previous run are recovered first.
    pub async fn start(&self) -> OrderlyResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(OrderlyError::internal("Consumer already running"));
        }

        info!(consumer_id = %self.id, "Starting ingestion consumer");
        let mut stop_rx = self.stop_tx.subscribe();

        if let Err(e) = self.source.recover().await {
            IngestMetrics::broker_error("recover");
            warn!(consumer_id = %self.id, error = %e, "Failed to recover in-flight messages");
        }

        while !*stop_rx.borrow() {
            let fetched = tokio::select! {
                _ = stop_rx.changed() => break,
                fetched = self.source.fetch(self.config.poll_timeout) => fetched,
            };

            let backoff = match fetched {
                Ok(Some(message)) => {
                    let span = tracing::info_span!("ingest", consumer_id = %self.id);
                    self.process(&message).instrument(span).await == Disposition::Redelivered
                }
                Ok(None) => false,
                Err(e) => {
                    IngestMetrics::broker_error("fetch");
                    error!(consumer_id = %self.id, error = %e, "Failed to fetch message");
                    true
                }
            };

            if backoff {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    () = tokio::time::sleep(self.config.retry_backoff) => {}
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);

        info!(
            consumer_id = %self.id,
            processed = self.processed(),
            rejected = self.rejected(),
            redelivered = self.redelivered(),
            "Ingestion consumer stopped"
        );

        Ok(())
    }

    /// Ingest one message and settle it with the broker.
    pub async fn process(&self, message: &BrokerMessage) -> Disposition {
        IngestMetrics::received();
        let started = Instant::now();

        let outcome = match timeout(self.config.message_timeout, self.service.ingest(message.payload())).await {
            Ok(outcome) => outcome,
            Err(_) => Err(OrderlyError::Timeout(format!(
                "ingestion exceeded {}ms",
                self.config.message_timeout.as_millis()
            ))),
        };

        match outcome {
            Ok(order_uid) => {
                debug!(order_uid = %order_uid, "Message ingested");
                self.settle_ack(message).await;
                self.processed.fetch_add(1, Ordering::Relaxed);
                IngestMetrics::ingested(started.elapsed());
                Disposition::Ingested
            }
            Err(e) if e.is_retriable() => {
                warn!(error = %e, code = e.error_code(), "Transient ingestion failure, redelivering");
                if let Err(redeliver_err) = self.source.redeliver(message).await {
                    IngestMetrics::broker_error("redeliver");
                    error!(error = %redeliver_err, "Failed to redeliver message");
                }
                self.redelivered.fetch_add(1, Ordering::Relaxed);
                IngestMetrics::redelivered(e.error_code());
                Disposition::Redelivered
            }
            Err(e) => {
                warn!(
                    error = %e,
                    code = e.error_code(),
                    field = e.field().unwrap_or_default(),
                    bytes = message.len(),
                    "Message rejected"
                );
                self.settle_ack(message).await;
                self.rejected.fetch_add(1, Ordering::Relaxed);
                IngestMetrics::rejected(e.error_code(), started.elapsed());
                Disposition::Rejected
            }
        }
    }

    async fn settle_ack(&self, message: &BrokerMessage) {
        // An unacknowledged message stays in flight and is recovered on restart.
        if let Err(e) = self.source.ack(message).await {
            IngestMetrics::broker_error("ack");
            error!(error = %e, "Failed to acknowledge message");
        }
    }

    /// Signal the loop to stop after the current message.
    pub fn stop(&self) {
        info!(consumer_id = %self.id, "Stopping ingestion consumer...");
        self.stop_tx.send_replace(true);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn redelivered(&self) -> u64 {
        self.redelivered.load(Ordering::Relaxed)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get consumer statistics.
    pub fn stats(&self) -> ConsumerStats {
        ConsumerStats {
            id: self.id.clone(),
            running: self.is_running(),
            processed: self.processed(),
            rejected: self.rejected(),
            redelivered: self.redelivered(),
        }
    }
}

/// Consumer statistics.
#[derive(Debug, Clone)]
pub struct ConsumerStats {
    pub id: String,
    pub running: bool,
    pub processed: u64,
    pub rejected: u64,
    pub redelivered: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// In-memory reliable queue mirroring the Redis list semantics.
    #[derive(Default)]
    struct MemorySource {
        queue: Mutex<VecDeque<BrokerMessage>>,
        processing: Mutex<Vec<BrokerMessage>>,
        acked: Mutex<Vec<BrokerMessage>>,
        recover_calls: AtomicU64,
    }

    impl MemorySource {
        fn with_payloads(payloads: &[&str]) -> Self {
            let source = Self::default();
            source
                .queue
                .lock()
                .extend(payloads.iter().map(|p| BrokerMessage::new(p.as_bytes())));
            source
        }

        fn acked(&self) -> Vec<String> {
            self.acked
                .lock()
                .iter()
                .map(|m| String::from_utf8_lossy(m.payload()).into_owned())
                .collect()
        }
    }

    #[async_trait]
    impl MessageSource for MemorySource {
        async fn fetch(&self, timeout: Duration) -> OrderlyResult<Option<BrokerMessage>> {
            let next = self.queue.lock().pop_front();
            match next {
                Some(message) => {
                    self.processing.lock().push(message.clone());
                    Ok(Some(message))
                }
                None => {
                    tokio::time::sleep(timeout).await;
                    Ok(None)
                }
            }
        }

        async fn ack(&self, message: &BrokerMessage) -> OrderlyResult<()> {
            let mut processing = self.processing.lock();
            if let Some(pos) = processing.iter().position(|m| m == message) {
                processing.remove(pos);
            }
            self.acked.lock().push(message.clone());
            Ok(())
        }

        async fn redeliver(&self, message: &BrokerMessage) -> OrderlyResult<()> {
            let mut processing = self.processing.lock();
            if let Some(pos) = processing.iter().position(|m| m == message) {
                processing.remove(pos);
            }
            self.queue.lock().push_front(message.clone());
            Ok(())
        }

        async fn recover(&self) -> OrderlyResult<u64> {
            self.recover_calls.fetch_add(1, Ordering::SeqCst);
            let stranded: Vec<_> = self.processing.lock().drain(..).collect();
            let count = stranded.len() as u64;
            let mut queue = self.queue.lock();
            for message in stranded.into_iter().rev() {
                queue.push_front(message);
            }
            Ok(count)
        }
    }

    /// Ingestion service scripted by payload text.
    struct ScriptedService;

    #[async_trait]
    impl IngestService for ScriptedService {
        async fn ingest(&self, payload: &[u8]) -> OrderlyResult<String> {
            match payload {
                b"malformed" => Err(OrderlyError::parse("expected value at line 1 column 1")),
                b"invalid" => Err(OrderlyError::invalid_entity("order.delivery.email", "malformed")),
                b"constraint" => Err(OrderlyError::Database("check violation".into())),
                b"store-down" => Err(OrderlyError::StoreUnavailable("connection refused".into())),
                b"slow" => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok("slow".to_string())
                }
                other => Ok(String::from_utf8_lossy(other).into_owned()),
            }
        }
    }

    fn consumer(source: Arc<MemorySource>) -> IngestConsumer<MemorySource> {
        let config = ConsumerConfig {
            poll_timeout: Duration::from_millis(10),
            message_timeout: Duration::from_secs(5),
            retry_backoff: Duration::from_millis(50),
        };
        IngestConsumer::new(source, Arc::new(ScriptedService), config)
    }

    async fn fetch_one(source: &MemorySource) -> BrokerMessage {
        source.fetch(Duration::ZERO).await.unwrap().unwrap()
    }

    #[test]
    fn test_consumer_config_from_app_config() {
        let config = ConsumerConfig::new(&BrokerConfig::default(), &IngestConfig::default());
        assert_eq!(config.poll_timeout, Duration::from_secs(1));
        assert_eq!(config.message_timeout, Duration::from_secs(10));
        assert_eq!(config.retry_backoff, Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_success_is_acknowledged() {
        let source = Arc::new(MemorySource::with_payloads(&["ORD1"]));
        let consumer = consumer(source.clone());

        let message = fetch_one(&source).await;
        assert_eq!(consumer.process(&message).await, Disposition::Ingested);
        assert_eq!(source.acked(), vec!["ORD1"]);
        assert!(source.processing.lock().is_empty());
        assert_eq!(consumer.processed(), 1);
    }

    #[tokio::test]
    async fn test_content_failures_are_acknowledged() {
        let source = Arc::new(MemorySource::with_payloads(&["malformed", "invalid", "constraint"]));
        let consumer = consumer(source.clone());

        for _ in 0..3 {
            let message = fetch_one(&source).await;
            assert_eq!(consumer.process(&message).await, Disposition::Rejected);
        }

        assert_eq!(source.acked(), vec!["malformed", "invalid", "constraint"]);
        assert!(source.queue.lock().is_empty());
        assert_eq!(consumer.rejected(), 3);
        assert_eq!(consumer.redelivered(), 0);
    }

    #[tokio::test]
    async fn test_store_outage_is_redelivered() {
        let source = Arc::new(MemorySource::with_payloads(&["store-down", "ORD2"]));
        let consumer = consumer(source.clone());

        let message = fetch_one(&source).await;
        assert_eq!(consumer.process(&message).await, Disposition::Redelivered);

        assert!(source.acked().is_empty());
        assert!(source.processing.lock().is_empty());
        assert_eq!(fetch_one(&source).await.payload(), b"store-down");
        assert_eq!(consumer.redelivered(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_ingest_times_out_and_is_redelivered() {
        let source = Arc::new(MemorySource::with_payloads(&["slow"]));
        let consumer = consumer(source.clone());

        let message = fetch_one(&source).await;
        assert_eq!(consumer.process(&message).await, Disposition::Redelivered);
        assert!(source.acked().is_empty());
        assert_eq!(source.queue.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_loop_drains_queue_until_stopped() {
        let source = Arc::new(MemorySource::with_payloads(&["ORD1", "malformed", "ORD2"]));
        let consumer = Arc::new(consumer(source.clone()));

        let handle = tokio::spawn({
            let consumer = consumer.clone();
            async move { consumer.start().await }
        });

        while consumer.processed() + consumer.rejected() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(consumer.is_running());

        consumer.stop();
        tokio_test::assert_ok!(handle.await.unwrap());

        let stats = consumer.stats();
        assert!(!stats.running);
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.rejected, 1);
        assert_eq!(source.acked(), vec!["ORD1", "malformed", "ORD2"]);
    }

    #[tokio::test]
    async fn test_start_recovers_stranded_messages() {
        let source = Arc::new(MemorySource::with_payloads(&["ORD1"]));
        let stranded = fetch_one(&source).await;
        assert_eq!(source.processing.lock().len(), 1);

        let consumer = Arc::new(consumer(source.clone()));
        let handle = tokio::spawn({
            let consumer = consumer.clone();
            async move { consumer.start().await }
        });

        while consumer.processed() < 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        consumer.stop();
        tokio_test::assert_ok!(handle.await.unwrap());

        assert_eq!(source.recover_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.acked(), vec![String::from_utf8_lossy(stranded.payload()).into_owned()]);
    }

    #[tokio::test]
    async fn test_stop_before_start_exits_immediately() {
        let source = Arc::new(MemorySource::with_payloads(&["ORD1"]));
        let consumer = consumer(source.clone());

        consumer.stop();
        consumer.start().await.unwrap();
        assert_eq!(consumer.processed(), 0);
        assert_eq!(source.queue.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_double_start_is_rejected() {
        let consumer = Arc::new(consumer(Arc::new(MemorySource::default())));
        let handle = tokio::spawn({
            let consumer = consumer.clone();
            async move { consumer.start().await }
        });

        while !consumer.is_running() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(consumer.start().await.is_err());

        consumer.stop();
        tokio_test::assert_ok!(handle.await.unwrap());
    }
}

//! Prometheus metrics for the ingestion consumer.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Metric names for the ingestion path.
pub mod names {
    /// Messages fetched from the broker.
    pub const MESSAGES_RECEIVED_TOTAL: &str = "orderly_ingest_messages_received_total";
    /// Orders persisted.
    pub const ORDERS_INGESTED_TOTAL: &str = "orderly_ingest_orders_ingested_total";
    /// Messages acknowledged without persisting, by error code.
    pub const MESSAGES_REJECTED_TOTAL: &str = "orderly_ingest_messages_rejected_total";
    /// Messages handed back to the broker.
    pub const MESSAGES_REDELIVERED_TOTAL: &str = "orderly_ingest_messages_redelivered_total";
    /// Broker operations that failed.
    pub const BROKER_ERRORS_TOTAL: &str = "orderly_ingest_broker_errors_total";
    /// Time spent ingesting one message.
    pub const INGEST_DURATION_SECONDS: &str = "orderly_ingest_duration_seconds";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        names::MESSAGES_RECEIVED_TOTAL,
        "Total number of messages fetched from the broker"
    );
    describe_counter!(
        names::ORDERS_INGESTED_TOTAL,
        "Total number of orders persisted"
    );
    describe_counter!(
        names::MESSAGES_REJECTED_TOTAL,
        "Total number of messages acknowledged without persisting"
    );
    describe_counter!(
        names::MESSAGES_REDELIVERED_TOTAL,
        "Total number of messages returned to the broker"
    );
    describe_counter!(
        names::BROKER_ERRORS_TOTAL,
        "Total number of failed broker operations"
    );
    describe_histogram!(
        names::INGEST_DURATION_SECONDS,
        "Time spent ingesting a single message in seconds"
    );
}

/// Ingestion metrics recorder.
#[derive(Clone)]
pub struct IngestMetrics;

impl IngestMetrics {
    pub fn received() {
        counter!(names::MESSAGES_RECEIVED_TOTAL).increment(1);
    }

    pub fn ingested(duration: Duration) {
        counter!(names::ORDERS_INGESTED_TOTAL).increment(1);
        histogram!(names::INGEST_DURATION_SECONDS, "status" => "ingested")
            .record(duration.as_secs_f64());
    }

    /// Record a message rejected with the given error code.
    pub fn rejected(reason: &'static str, duration: Duration) {
        counter!(names::MESSAGES_REJECTED_TOTAL, "reason" => reason).increment(1);
        histogram!(names::INGEST_DURATION_SECONDS, "status" => "rejected")
            .record(duration.as_secs_f64());
    }

    pub fn redelivered(reason: &'static str) {
        counter!(names::MESSAGES_REDELIVERED_TOTAL, "reason" => reason).increment(1);
    }

    /// Record a failed broker operation (`fetch`, `ack`, `redeliver`, `recover`).
    pub fn broker_error(operation: &'static str) {
        counter!(names::BROKER_ERRORS_TOTAL, "operation" => operation).increment(1);
    }
}

use prometheus::{Counter, CounterVec, Opts, Registry};
use prometheus::proto::MetricFamily;

use errors::Result;
use network::ConnectionObserver;
use protocol::ApiKeys;

/// Request and connection counters, registered in an owned registry
/// and fed by the connection observer events.
pub struct Metrics {
    registry: Registry,
    requests: CounterVec,
    server_disconnects: Counter,
    reconnection_attempts: Counter,
    bytes_sent: Counter,
    bytes_received: Counter,
}

impl Metrics {
    pub fn new() -> Result<Metrics> {
        let registry = Registry::new();

        let requests = CounterVec::new(Opts::new("kafka_requests_total",
                                                 "Requests sent, by api kind."),
                                       &["api"])?;
        let server_disconnects = Counter::new("kafka_server_disconnects_total",
                                              "Connections lost to a broker.")?;
        let reconnection_attempts = Counter::new("kafka_reconnection_attempts_total",
                                                 "Broker connect attempts.")?;
        let bytes_sent = Counter::new("kafka_bytes_sent_total",
                                      "Bytes written to broker sockets.")?;
        let bytes_received = Counter::new("kafka_bytes_received_total",
                                          "Bytes read from broker sockets.")?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(server_disconnects.clone()))?;
        registry.register(Box::new(reconnection_attempts.clone()))?;
        registry.register(Box::new(bytes_sent.clone()))?;
        registry.register(Box::new(bytes_received.clone()))?;

        Ok(Metrics {
               registry: registry,
               requests: requests,
               server_disconnects: server_disconnects,
               reconnection_attempts: reconnection_attempts,
               bytes_sent: bytes_sent,
               bytes_received: bytes_received,
           })
    }

    pub fn record_request(&self, api_key: ApiKeys) {
        self.requests.with_label_values(&[api_key.name()]).inc();
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }
}

impl ConnectionObserver for Metrics {
    fn server_disconnected(&self) {
        self.server_disconnects.inc();
    }

    fn reconnection_attempt(&self, _attempt: usize) {
        self.reconnection_attempts.inc();
    }

    fn sent_to_socket(&self, bytes: usize) {
        let _ = self.bytes_sent.inc_by(bytes as f64);
    }

    fn received_from_socket(&self, bytes: usize) {
        let _ = self.bytes_received.inc_by(bytes as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_record() {
        let metrics = Metrics::new().unwrap();

        metrics.record_request(ApiKeys::Produce);
        metrics.record_request(ApiKeys::Produce);
        metrics.record_request(ApiKeys::Metadata);
        metrics.server_disconnected();
        metrics.sent_to_socket(128);

        let families = metrics.gather();

        assert!(families
                    .iter()
                    .any(|family| family.get_name() == "kafka_requests_total"));
        assert!(families
                    .iter()
                    .any(|family| family.get_name() == "kafka_bytes_sent_total"));
    }
}

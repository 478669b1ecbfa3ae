use std::net::SocketAddr;
use std::time::Duration;

use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_timer::Timer;

use client::KafkaVersion;
use compression::Compression;
use network::ConnectionConfig;
use protocol::RequiredAcks;

pub const DEFAULT_REQUEST_TIMEOUT_MILLS: u64 = 30_000;
pub const DEFAULT_CONNECT_TIMEOUT_MILLIS: u64 = 5_000;
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: usize = 4;
pub const DEFAULT_RECONNECT_BACKOFF_MILLIS: u64 = 100;
pub const DEFAULT_METADATA_MAX_AGE_MILLS: u64 = 300_000;
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_RETRY_BACKOFF_MILLIS: u64 = 100;
pub const DEFAULT_ACK_TIMEOUT_MILLIS: u64 = 30_000;

pub trait ToMilliseconds {
    fn to_millis(&self) -> u64;
}

impl ToMilliseconds for Duration {
    fn to_millis(&self) -> u64 {
        self.as_secs() * 1_000 + u64::from(self.subsec_nanos()) / 1_000_000
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// The brokers the first metadata request may be sent to.
    #[serde(rename = "bootstrap.servers")]
    pub hosts: Vec<SocketAddr>,

    /// An id string to pass to the server when making requests.
    #[serde(rename = "client.id")]
    pub client_id: Option<String>,

    /// The maximum amount of time the client will wait for a response, in milliseconds.
    #[serde(rename = "request.timeout.ms")]
    pub request_timeout: u64,

    /// The upper bound on a single connect attempt, in milliseconds.
    #[serde(rename = "connect.timeout.ms")]
    pub connect_timeout: u64,

    /// How many connect attempts one acquire may take.
    #[serde(rename = "reconnect.max.attempts")]
    pub max_reconnect_attempts: usize,

    /// The base backoff between connect attempts, in milliseconds.
    #[serde(rename = "reconnect.backoff.ms")]
    pub reconnect_backoff: u64,

    /// How long a cached topic snapshot stays fresh, in milliseconds.
    #[serde(rename = "metadata.max.age.ms")]
    pub metadata_max_age: u64,

    /// How many times a retriable request failure is retried.
    #[serde(rename = "retries")]
    pub max_retries: usize,

    /// The base backoff between request attempts, in milliseconds.
    #[serde(rename = "retry.backoff.ms")]
    pub retry_backoff: u64,

    /// The acknowledgements the leader must receive before answering a
    /// produce request.
    #[serde(rename = "acks")]
    pub required_acks: RequiredAcks,

    /// The server-side time to await the required acknowledgements, in
    /// milliseconds.
    #[serde(rename = "ack.timeout.ms")]
    pub ack_timeout: u64,

    /// The compression codec applied to produced message sets.
    #[serde(rename = "compression.type")]
    pub compression: Compression,

    /// Probe every broker with an `ApiVersions` request after a
    /// metadata refresh.
    #[serde(rename = "api.version.request")]
    pub api_version_request: bool,

    /// The broker release assumed when the probe is off.
    #[serde(rename = "broker.version.fallback")]
    pub broker_version_fallback: KafkaVersion,

    /// Track request and connection counters.
    #[serde(rename = "metrics")]
    pub metrics: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            hosts: Vec::new(),
            client_id: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_MILLS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_MILLIS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF_MILLIS,
            metadata_max_age: DEFAULT_METADATA_MAX_AGE_MILLS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF_MILLIS,
            required_acks: RequiredAcks::default(),
            ack_timeout: DEFAULT_ACK_TIMEOUT_MILLIS,
            compression: Compression::default(),
            api_version_request: false,
            broker_version_fallback: KafkaVersion::default(),
            metrics: false,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout)
    }

    pub fn metadata_max_age(&self) -> Duration {
        Duration::from_millis(self.metadata_max_age)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout)
    }

    pub fn timer(&self) -> Timer {
        Timer::default()
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            connect_timeout: self.connect_timeout(),
            max_connect_attempts: self.max_reconnect_attempts,
            reconnect_backoff_millis: self.reconnect_backoff,
        }
    }

    /// The backoff schedule of one dispatch: `max_retries` delays
    /// growing exponentially from `retry_backoff`.
    pub fn retry_strategy(&self) -> Vec<Duration> {
        ExponentialBackoff::from_millis(self.retry_backoff)
            .map(jitter)
            .take(self.max_retries)
            .collect()
    }
}

use std::marker::PhantomData;
use std::net::SocketAddr;
use std::time::Duration;

use tokio_core::reactor::Handle;

use client::{ClientConfig, KafkaClient, KafkaVersion, ToMilliseconds};
use compression::Compression;
use protocol::RequiredAcks;

/// Assembles a `KafkaClient` from individual settings.
pub struct ClientBuilder<'a> {
    config: ClientConfig,
    handle: Handle,
    phantom: PhantomData<&'a ()>,
}

impl<'a> ClientBuilder<'a> {
    pub fn from_config(config: ClientConfig, handle: Handle) -> Self {
        ClientBuilder {
            config: config,
            handle: handle,
            phantom: PhantomData,
        }
    }

    pub fn from_hosts<I>(hosts: I, handle: Handle) -> Self
        where I: Iterator<Item = SocketAddr>
    {
        ClientBuilder::from_config(ClientConfig {
                                       hosts: hosts.collect(),
                                       ..Default::default()
                                   },
                                   handle)
    }

    pub fn with_client_id(mut self, client_id: String) -> Self {
        self.config.client_id = Some(client_id);
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.config.request_timeout = request_timeout.to_millis();
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.config.connect_timeout = connect_timeout.to_millis();
        self
    }

    pub fn with_max_reconnect_attempts(mut self, max_reconnect_attempts: usize) -> Self {
        self.config.max_reconnect_attempts = max_reconnect_attempts;
        self
    }

    pub fn with_metadata_max_age(mut self, metadata_max_age: Duration) -> Self {
        self.config.metadata_max_age = metadata_max_age.to_millis();
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.config.retry_backoff = retry_backoff.to_millis();
        self
    }

    pub fn with_required_acks(mut self, required_acks: RequiredAcks) -> Self {
        self.config.required_acks = required_acks;
        self
    }

    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.config.ack_timeout = ack_timeout.to_millis();
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.config.compression = compression;
        self
    }

    pub fn with_api_version_request(mut self, api_version_request: bool) -> Self {
        self.config.api_version_request = api_version_request;
        self
    }

    pub fn with_broker_version_fallback(mut self, version: KafkaVersion) -> Self {
        self.config.broker_version_fallback = version;
        self
    }

    pub fn with_metrics(mut self, metrics: bool) -> Self {
        self.config.metrics = metrics;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build(self) -> KafkaClient<'a>
        where KafkaClient<'a>: 'static
    {
        KafkaClient::from_config(self.config, self.handle)
    }
}

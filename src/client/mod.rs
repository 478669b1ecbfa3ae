mod version;
mod config;
mod cluster;
mod metadata;
mod metrics;
mod service;
mod middleware;
mod partitioner;
mod client;
mod builder;

pub use self::version::{KafkaVersion, max_supported_version};
pub use self::config::{ClientConfig, DEFAULT_ACK_TIMEOUT_MILLIS, DEFAULT_CONNECT_TIMEOUT_MILLIS,
                       DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_MAX_RETRIES,
                       DEFAULT_METADATA_MAX_AGE_MILLS, DEFAULT_RECONNECT_BACKOFF_MILLIS,
                       DEFAULT_REQUEST_TIMEOUT_MILLS, DEFAULT_RETRY_BACKOFF_MILLIS,
                       ToMilliseconds};
pub use self::cluster::{Broker, BrokerRef, Cluster, PartitionInfo, UNKNOWN_BROKER};
pub use self::metadata::{Metadata, TopicPartitions};
pub use self::metrics::Metrics;
pub use self::service::{FutureResponse, KafkaService};
pub use self::middleware::{InFlightMiddleware, LogMiddleware, TimeoutMiddleware, WithAddr};
pub use self::partitioner::{DefaultPartitioner, Partitioner};
pub use self::client::{Client, CommitOffsets, ConsumerGroup, ConsumerGroupAssignment,
                       ConsumerGroupMember, ConsumerGroupProtocol, DescribeGroups,
                       FetchApiVersions, FetchCommittedOffsets, FetchMetadata, FetchOffsets,
                       FetchRecords, Generation, GetMetadata, GroupCoordinator, Heartbeat,
                       JoinGroup, KafkaClient, LeaveGroup, ListGroups, LoadApiVersions,
                       LoadMetadata, PartitionOffset, ProduceRecords, RouteByKey, RouteTo,
                       SaslHandshake, StaticBoxFuture, SyncGroup, ToStaticBoxFuture};
pub use self::builder::ClientBuilder;

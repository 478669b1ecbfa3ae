#![recursion_limit = "128"]

#![allow(dead_code)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate lazy_static;
extern crate bytes;
#[macro_use]
extern crate nom;
extern crate byteorder;
extern crate crc;
extern crate twox_hash;
extern crate time;
extern crate rand;
extern crate hexplay;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate prometheus;

extern crate futures;
extern crate tokio_core;
extern crate tokio_io;
extern crate tokio_service;
extern crate tokio_timer;
extern crate tokio_timer02;
extern crate tokio_retry;

#[cfg(feature = "gzip")]
extern crate flate2;

#[cfg(test)]
extern crate pretty_env_logger;

pub mod errors;
mod compression;
#[macro_use]
mod protocol;
mod network;
mod client;

pub mod consts {
    pub use client::{DEFAULT_ACK_TIMEOUT_MILLIS, DEFAULT_CONNECT_TIMEOUT_MILLIS,
                     DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_METADATA_MAX_AGE_MILLS,
                     DEFAULT_RECONNECT_BACKOFF_MILLIS, DEFAULT_REQUEST_TIMEOUT_MILLS,
                     DEFAULT_RETRY_BACKOFF_MILLIS};
}

pub use errors::{Error, ErrorKind, KafkaCode, Result};
pub use compression::Compression;
pub use protocol::{ApiKey, ApiKeys, ApiVersion, CorrelationId, ErrorCode, FetchOffset,
                   FetchPartitionData, GenerationId, GroupDescription, JoinGroupMember,
                   JoinGroupProtocol, ListedGroup, Message, MessageSet, MessageTimestamp,
                   NodeId, Offset, PartitionId, ProtocolCodec, ProtocolCodecRegistry,
                   ProtocolMetadata, RequiredAcks, SupportedApiVersion, SyncGroupAssignment,
                   Timestamp, UsableApiVersions};
pub use network::{ConnectionConfig, ConnectionObserver, Endpoint, KafkaConnection, KafkaRequest,
                  KafkaResponse, SendRequest, TopicPartition};
pub use client::{Broker, BrokerRef, Client, ClientBuilder, ClientConfig, Cluster,
                 CommitOffsets, ConsumerGroup, ConsumerGroupAssignment, ConsumerGroupMember,
                 ConsumerGroupProtocol, DefaultPartitioner, DescribeGroups,
                 FetchCommittedOffsets, FetchOffsets, FetchRecords, Generation, GetMetadata,
                 GroupCoordinator, Heartbeat, JoinGroup, KafkaClient, KafkaVersion, LeaveGroup,
                 ListGroups, LoadMetadata, Metadata, Metrics, PartitionInfo, PartitionOffset,
                 Partitioner, ProduceRecords, RouteByKey, RouteTo, SaslHandshake,
                 StaticBoxFuture, SyncGroup, ToMilliseconds, ToStaticBoxFuture,
                 TopicPartitions};

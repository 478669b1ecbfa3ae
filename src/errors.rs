use std::mem;

/// Various errors reported by a remote Kafka server.
///
/// We use numeric codes to indicate what problem occurred on the server.
/// These can be translated by the client into exceptions or
/// whatever the appropriate error handling mechanism in the client language.
///
/// See also [Kafka Errors](http://kafka.apache.org/protocol.html)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i16)]
pub enum KafkaCode {
    /// The server experienced an unexpected error when processing the request
    Unknown = -1,
    None = 0,
    /// The requested offset is outside the range of offsets
    /// maintained by the server for the given topic/partition
    OffsetOutOfRange = 1,
    /// This indicates that a message contents does not match its CRC
    CorruptMessage = 2,
    /// This request is for a topic or partition that does not exist
    /// on this broker.
    UnknownTopicOrPartition = 3,
    /// The message has a negative size
    InvalidMessageSize = 4,
    /// This error is thrown if we are in the middle of a leadership
    /// election and there is currently no leader for this partition
    /// and hence it is unavailable for writes.
    LeaderNotAvailable = 5,
    /// This error is thrown if the client attempts to send messages
    /// to a replica that is not the leader for some partition. It
    /// indicates that the clients metadata is out of date.
    NotLeaderForPartition = 6,
    /// This error is thrown if the request exceeds the user-specified
    /// time limit in the request.
    RequestTimedOut = 7,
    /// This is not a client facing error and is used mostly by tools
    /// when a broker is not alive.
    BrokerNotAvailable = 8,
    /// If replica is expected on a broker, but is not (this can be
    /// safely ignored).
    ReplicaNotAvailable = 9,
    /// The server has a configurable maximum message size to avoid
    /// unbounded memory allocation. This error is thrown if the
    /// client attempt to produce a message larger than this maximum.
    MessageSizeTooLarge = 10,
    /// Internal error code for broker-to-broker communication.
    StaleControllerEpoch = 11,
    /// If you specify a string larger than configured maximum for
    /// offset metadata
    OffsetMetadataTooLarge = 12,
    /// The server disconnected before a response was received.
    NetworkException = 13,
    /// The broker returns this error code for an offset fetch request
    /// if it is still loading offsets (after a leader change for that
    /// offsets topic partition), or in response to group membership
    /// requests (such as heartbeats) when group metadata is being
    /// loaded by the coordinator.
    GroupLoadInProgress = 14,
    /// The broker returns this error code for group coordinator
    /// requests, offset commits, and most group management requests
    /// if the offsets topic has not yet been created, or if the group
    /// coordinator is not active.
    GroupCoordinatorNotAvailable = 15,
    /// The broker returns this error code if it receives an offset
    /// fetch or commit request for a group that it is not a
    /// coordinator for.
    NotCoordinatorForGroup = 16,
    /// For a request which attempts to access an invalid topic
    /// (e.g. one which has an illegal name), or if an attempt is made
    /// to write to an internal topic (such as the consumer offsets
    /// topic).
    InvalidTopic = 17,
    /// If a message batch in a produce request exceeds the maximum
    /// configured segment size.
    RecordListTooLarge = 18,
    /// Returned from a produce request when the number of in-sync
    /// replicas is lower than the configured minimum and requiredAcks is
    /// -1.
    NotEnoughReplicas = 19,
    /// Returned from a produce request when the message was written
    /// to the log, but with fewer in-sync replicas than required.
    NotEnoughReplicasAfterAppend = 20,
    /// Returned from a produce request if the requested requiredAcks is
    /// invalid (anything other than -1, 1, or 0).
    InvalidRequiredAcks = 21,
    /// Returned from group membership requests (such as heartbeats) when
    /// the generation id provided in the request is not the current
    /// generation.
    IllegalGeneration = 22,
    /// Returned in join group when the member provides a protocol type or
    /// set of protocols which is not compatible with the current group.
    InconsistentGroupProtocol = 23,
    /// Returned in join group when the groupId is empty or null.
    InvalidGroupId = 24,
    /// Returned from group requests (offset commits/fetches, heartbeats,
    /// etc) when the memberId is not in the current generation.
    UnknownMemberId = 25,
    /// Return in join group when the requested session timeout is outside
    /// of the allowed range on the broker
    InvalidSessionTimeout = 26,
    /// Returned in heartbeat requests when the coordinator has begun
    /// rebalancing the group. This indicates to the client that it
    /// should rejoin the group.
    RebalanceInProgress = 27,
    /// This error indicates that an offset commit was rejected because of
    /// oversize metadata.
    InvalidCommitOffsetSize = 28,
    /// Returned by the broker when the client is not authorized to access
    /// the requested topic.
    TopicAuthorizationFailed = 29,
    /// Returned by the broker when the client is not authorized to access
    /// a particular groupId.
    GroupAuthorizationFailed = 30,
    /// Returned by the broker when the client is not authorized to use an
    /// inter-broker or administrative API.
    ClusterAuthorizationFailed = 31,
    /// The timestamp of the message is out of acceptable range.
    InvalidTimestamp = 32,
    /// The broker does not support the requested SASL mechanism.
    UnsupportedSaslMechanism = 33,
    /// Request is not valid given the current SASL state.
    IllegalSaslState = 34,
    /// The version of API is not supported.
    UnsupportedVersion = 35,
    /// Topic with this name already exists.
    TopicAlreadyExists = 36,
    /// Number of partitions is invalid.
    InvalidPartitions = 37,
    /// Replication-factor is invalid.
    InvalidReplicationFactor = 38,
    /// Replica assignment is invalid.
    InvalidReplicaAssignment = 39,
    /// Configuration is invalid.
    InvalidConfig = 40,
    /// This is not the correct controller for this cluster.
    NotController = 41,
    /// This most likely occurs because of a request being malformed by the client library
    /// or the message was sent to an incompatible broker. See the broker logs for more details.
    InvalidRequest = 42,
    /// The message format version on the broker does not support the request.
    UnsupportedForMessageFormat = 43,
    /// Request parameters do not satisfy the configured policy.
    PolicyViolation = 44,
}

const KAFKA_CODE_MIN: i16 = -1;
const KAFKA_CODE_MAX: i16 = 44;

impl From<i16> for KafkaCode {
    fn from(v: i16) -> Self {
        if v < KAFKA_CODE_MIN || v > KAFKA_CODE_MAX {
            KafkaCode::Unknown
        } else {
            unsafe { mem::transmute(v) }
        }
    }
}

impl KafkaCode {
    /// Whether a request that failed with this code may succeed if
    /// simply retried against the same or another broker.
    pub fn is_retriable(&self) -> bool {
        match *self {
            KafkaCode::UnknownTopicOrPartition |
            KafkaCode::LeaderNotAvailable |
            KafkaCode::NotLeaderForPartition |
            KafkaCode::RequestTimedOut |
            KafkaCode::BrokerNotAvailable |
            KafkaCode::ReplicaNotAvailable |
            KafkaCode::NetworkException |
            KafkaCode::GroupLoadInProgress |
            KafkaCode::GroupCoordinatorNotAvailable |
            KafkaCode::NotCoordinatorForGroup |
            KafkaCode::NotEnoughReplicas |
            KafkaCode::NotEnoughReplicasAfterAppend |
            KafkaCode::NotController => true,
            _ => false,
        }
    }

    /// Whether this code indicates that the cached cluster topology no
    /// longer matches the cluster, so a metadata refresh must precede
    /// the next attempt.
    pub fn is_from_stale_metadata(&self) -> bool {
        match *self {
            KafkaCode::UnknownTopicOrPartition |
            KafkaCode::LeaderNotAvailable |
            KafkaCode::NotLeaderForPartition |
            KafkaCode::NotCoordinatorForGroup |
            KafkaCode::GroupCoordinatorNotAvailable => true,
            _ => false,
        }
    }
}

error_chain!{
    foreign_links {
        IoError(::std::io::Error);
        TimerError(::tokio_timer::TimerError);
        TimerError02(::tokio_timer02::Error);
        PrometheusError(::prometheus::Error);
    }

    errors {
        /// An encode step produced data the protocol cannot represent.
        CodecError(reason: &'static str) {
            description("codec error")
            display("codec error, {}", reason)
        }
        /// A decode would read beyond the available bytes.
        BufferUnderRun(what: &'static str) {
            description("buffer under run")
            display("buffer under run while reading {}", what)
        }
        /// The stored message CRC does not match the computed one.
        CrcValidation(stored: u32, computed: u32) {
            description("CRC mismatch")
            display("message CRC mismatch, stored {:#010x}, computed {:#010x}", stored, computed)
        }
        /// The compression bits of a message attribute designate an
        /// unknown codec.
        NotSupportedCodec(attr: i8) {
            description("unsupported compression codec")
            display("unsupported compression codec, attribute {:#04x}", attr)
        }
        /// The underlying socket failed, or was lost after the
        /// configured reconnect attempts were exhausted.
        ConnectionError(reason: String) {
            description("connection error")
            display("connection error, {}", reason)
        }
        /// A request deadline elapsed before the response arrived.
        RequestTimeout(millis: u64) {
            description("request timed out")
            display("request timed out after {} ms", millis)
        }
        /// An operation was invoked on a disposed connection or client.
        ObjectDisposed(what: &'static str) {
            description("object disposed")
            display("{} already disposed", what)
        }
        /// Routing was requested for a topic or partition that is not in
        /// the metadata cache, or whose leader is still being elected.
        CachedMetadata(topic_name: String, partition: Option<::protocol::PartitionId>) {
            description("no cached metadata")
            display("no cached metadata for topic `{}`{}", topic_name,
                    partition.map_or(String::new(), |id| format!(", partition {}", id)))
        }
        /// A decoded response carried a non-zero error code.
        KafkaError(code: KafkaCode) {
            description("kafka error")
            display("kafka error, {:?}", code)
        }
        /// A metadata response was internally inconsistent.
        ValidationError(reason: String) {
            description("invalid metadata")
            display("invalid metadata, {}", reason)
        }
        /// The peer answered with a response of the wrong kind.
        UnexpectedResponse(api_key: ::protocol::ApiKey) {
            description("unexpected response")
            display("unexpected response, api key {}", api_key)
        }
        Canceled(task: &'static str) {
            description("task canceled")
            display("{} canceled", task)
        }
        BrokerNotFound(broker: i32) {
            description("broker not found")
            display("broker #{} not found", broker)
        }
        ParseError(kind: ::nom::ErrorKind<u32>) {
            description("fail to parse")
            display("fail to parse, {:?}", kind)
        }
    }
}

impl Error {
    /// Whether the router may retry the failed attempt within its
    /// retry budget.
    pub fn is_retriable(&self) -> bool {
        match *self.kind() {
            ErrorKind::KafkaError(code) => {
                code.is_retriable() || code == KafkaCode::OffsetOutOfRange
            }
            ErrorKind::ConnectionError(_) |
            ErrorKind::RequestTimeout(_) |
            ErrorKind::CachedMetadata(..) => true,
            _ => false,
        }
    }

    /// Whether the next attempt must refresh the metadata cache first.
    pub fn is_stale_metadata(&self) -> bool {
        match *self.kind() {
            ErrorKind::KafkaError(code) => code.is_from_stale_metadata(),
            ErrorKind::ConnectionError(_) |
            ErrorKind::RequestTimeout(_) |
            ErrorKind::CachedMetadata(..) => true,
            _ => false,
        }
    }
}

/// Unwrap the operation error out of a `tokio_retry` failure,
/// surfacing the last attempt's error verbatim.
impl From<::tokio_retry::Error<Error>> for Error {
    fn from(err: ::tokio_retry::Error<Error>) -> Self {
        match err {
            ::tokio_retry::Error::OperationError(err) => err,
            ::tokio_retry::Error::TimerError(err) => Error::from(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kafka_code_from_wire() {
        assert_eq!(KafkaCode::from(0), KafkaCode::None);
        assert_eq!(KafkaCode::from(6), KafkaCode::NotLeaderForPartition);
        assert_eq!(KafkaCode::from(-1), KafkaCode::Unknown);
        assert_eq!(KafkaCode::from(12345), KafkaCode::Unknown);
    }

    #[test]
    fn test_retriable_codes() {
        assert!(KafkaCode::NotLeaderForPartition.is_retriable());
        assert!(KafkaCode::LeaderNotAvailable.is_retriable());
        assert!(!KafkaCode::CorruptMessage.is_retriable());
        assert!(!KafkaCode::MessageSizeTooLarge.is_retriable());
    }

    #[test]
    fn test_stale_metadata_codes() {
        assert!(KafkaCode::NotLeaderForPartition.is_from_stale_metadata());
        assert!(KafkaCode::UnknownTopicOrPartition.is_from_stale_metadata());
        assert!(!KafkaCode::RequestTimedOut.is_from_stale_metadata());
    }

    #[test]
    fn test_error_classification() {
        let err: Error = ErrorKind::KafkaError(KafkaCode::NotLeaderForPartition).into();
        assert!(err.is_retriable());
        assert!(err.is_stale_metadata());

        let err: Error = ErrorKind::KafkaError(KafkaCode::OffsetOutOfRange).into();
        assert!(err.is_retriable());
        assert!(!err.is_stale_metadata());

        let err: Error = ErrorKind::KafkaError(KafkaCode::InvalidMessageSize).into();
        assert!(!err.is_retriable());

        let err: Error = ErrorKind::CachedMetadata("topic".to_owned(), None).into();
        assert!(err.is_retriable());
        assert!(err.is_stale_metadata());
    }
}

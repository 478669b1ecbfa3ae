use std::borrow::Cow;
use std::collections::HashMap;

use bytes::{ByteOrder, BytesMut};

use errors::Result;
use compression::Compression;
use network::TopicPartition;
use protocol::{ApiKeys, ApiVersion, ApiVersionsRequest, CommitTopic, CorrelationId,
               CONSUMER_REPLICA_ID, DescribeGroupsRequest, Encodable, FetchCommitTopic,
               FetchOffset, FetchRequest, FetchTopic, GenerationId, GroupCoordinatorRequest,
               HeartbeatRequest, JoinGroupProtocol, JoinGroupRequest, LeaveGroupRequest,
               ListGroupsRequest, ListOffsetRequest, ListPartition, ListTopic, MessageSet,
               MetadataRequest, OffsetCommitRequest, OffsetFetchRequest, PartitionId,
               ProducePartitionData, ProduceRequest, ProduceTopicData, RequestHeader,
               RequiredAcks, SaslHandshakeRequest, StopReplicaPartition, StopReplicaRequest,
               SyncGroupAssignment, SyncGroupRequest};

/// The closed set of requests this client can put on the wire.
#[derive(Clone, Debug, PartialEq)]
pub enum KafkaRequest<'a> {
    Produce(ProduceRequest<'a>),
    Fetch(FetchRequest<'a>),
    ListOffsets(ListOffsetRequest<'a>),
    Metadata(MetadataRequest<'a>),
    StopReplica(StopReplicaRequest<'a>),
    OffsetCommit(OffsetCommitRequest<'a>),
    OffsetFetch(OffsetFetchRequest<'a>),
    GroupCoordinator(GroupCoordinatorRequest<'a>),
    JoinGroup(JoinGroupRequest<'a>),
    Heartbeat(HeartbeatRequest<'a>),
    LeaveGroup(LeaveGroupRequest<'a>),
    SyncGroup(SyncGroupRequest<'a>),
    DescribeGroups(DescribeGroupsRequest<'a>),
    ListGroups(ListGroupsRequest<'a>),
    SaslHandshake(SaslHandshakeRequest<'a>),
    ApiVersions(ApiVersionsRequest<'a>),
}

impl<'a> KafkaRequest<'a> {
    pub fn header(&self) -> &RequestHeader<'a> {
        match *self {
            KafkaRequest::Produce(ref req) => &req.header,
            KafkaRequest::Fetch(ref req) => &req.header,
            KafkaRequest::ListOffsets(ref req) => &req.header,
            KafkaRequest::Metadata(ref req) => &req.header,
            KafkaRequest::StopReplica(ref req) => &req.header,
            KafkaRequest::OffsetCommit(ref req) => &req.header,
            KafkaRequest::OffsetFetch(ref req) => &req.header,
            KafkaRequest::GroupCoordinator(ref req) => &req.header,
            KafkaRequest::JoinGroup(ref req) => &req.header,
            KafkaRequest::Heartbeat(ref req) => &req.header,
            KafkaRequest::LeaveGroup(ref req) => &req.header,
            KafkaRequest::SyncGroup(ref req) => &req.header,
            KafkaRequest::DescribeGroups(ref req) => &req.header,
            KafkaRequest::ListGroups(ref req) => &req.header,
            KafkaRequest::SaslHandshake(ref req) => &req.header,
            KafkaRequest::ApiVersions(ref req) => &req.header,
        }
    }

    fn header_mut(&mut self) -> &mut RequestHeader<'a> {
        match *self {
            KafkaRequest::Produce(ref mut req) => &mut req.header,
            KafkaRequest::Fetch(ref mut req) => &mut req.header,
            KafkaRequest::ListOffsets(ref mut req) => &mut req.header,
            KafkaRequest::Metadata(ref mut req) => &mut req.header,
            KafkaRequest::StopReplica(ref mut req) => &mut req.header,
            KafkaRequest::OffsetCommit(ref mut req) => &mut req.header,
            KafkaRequest::OffsetFetch(ref mut req) => &mut req.header,
            KafkaRequest::GroupCoordinator(ref mut req) => &mut req.header,
            KafkaRequest::JoinGroup(ref mut req) => &mut req.header,
            KafkaRequest::Heartbeat(ref mut req) => &mut req.header,
            KafkaRequest::LeaveGroup(ref mut req) => &mut req.header,
            KafkaRequest::SyncGroup(ref mut req) => &mut req.header,
            KafkaRequest::DescribeGroups(ref mut req) => &mut req.header,
            KafkaRequest::ListGroups(ref mut req) => &mut req.header,
            KafkaRequest::SaslHandshake(ref mut req) => &mut req.header,
            KafkaRequest::ApiVersions(ref mut req) => &mut req.header,
        }
    }

    pub fn api_key(&self) -> ApiKeys {
        ApiKeys::from(self.header().api_key)
    }

    pub fn api_version(&self) -> ApiVersion {
        self.header().api_version
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.header().correlation_id
    }

    /// The connection owns correlation id assignment; it rewrites the
    /// header right before the request is framed.
    pub fn set_correlation_id(&mut self, correlation_id: CorrelationId) {
        self.header_mut().correlation_id = correlation_id;
    }

    /// Whether the peer will answer this request at all; a produce
    /// with `acks = 0` is fire and forget.
    pub fn expects_response(&self) -> bool {
        if let KafkaRequest::Produce(ref req) = *self {
            req.required_acks != RequiredAcks::None as i16
        } else {
            true
        }
    }

    pub fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        match *self {
            KafkaRequest::Produce(ref req) => req.encode::<T>(dst),
            KafkaRequest::Fetch(ref req) => req.encode::<T>(dst),
            KafkaRequest::ListOffsets(ref req) => req.encode::<T>(dst),
            KafkaRequest::Metadata(ref req) => req.encode::<T>(dst),
            KafkaRequest::StopReplica(ref req) => req.encode::<T>(dst),
            KafkaRequest::OffsetCommit(ref req) => req.encode::<T>(dst),
            KafkaRequest::OffsetFetch(ref req) => req.encode::<T>(dst),
            KafkaRequest::GroupCoordinator(ref req) => req.encode::<T>(dst),
            KafkaRequest::JoinGroup(ref req) => req.encode::<T>(dst),
            KafkaRequest::Heartbeat(ref req) => req.encode::<T>(dst),
            KafkaRequest::LeaveGroup(ref req) => req.encode::<T>(dst),
            KafkaRequest::SyncGroup(ref req) => req.encode::<T>(dst),
            KafkaRequest::DescribeGroups(ref req) => req.encode::<T>(dst),
            KafkaRequest::ListGroups(ref req) => req.encode::<T>(dst),
            KafkaRequest::SaslHandshake(ref req) => req.encode::<T>(dst),
            KafkaRequest::ApiVersions(ref req) => req.encode::<T>(dst),
        }
    }

    fn request_header(api_key: ApiKeys,
                      api_version: ApiVersion,
                      correlation_id: CorrelationId,
                      client_id: Option<Cow<'a, str>>)
                      -> RequestHeader<'a> {
        RequestHeader {
            api_key: api_key as i16,
            api_version: api_version,
            correlation_id: correlation_id,
            client_id: client_id,
        }
    }

    pub fn produce_records(api_version: ApiVersion,
                           correlation_id: CorrelationId,
                           client_id: Option<Cow<'a, str>>,
                           required_acks: RequiredAcks,
                           ack_timeout: i32,
                           compression: Compression,
                           tp: &TopicPartition<'a>,
                           records: Vec<Cow<'a, MessageSet>>)
                           -> KafkaRequest<'a> {
        let messages = records
            .into_iter()
            .flat_map(|record| record.into_owned().messages)
            .collect();

        KafkaRequest::Produce(ProduceRequest {
            header: Self::request_header(ApiKeys::Produce,
                                         api_version,
                                         correlation_id,
                                         client_id),
            required_acks: required_acks as i16,
            ack_timeout: ack_timeout,
            topics: vec![ProduceTopicData {
                             topic_name: tp.topic_name.clone(),
                             partitions: vec![ProducePartitionData {
                                                  partition: tp.partition,
                                                  message_set: MessageSet { messages: messages },
                                              }],
                         }],
            compression: compression,
        })
    }

    pub fn fetch_records(api_version: ApiVersion,
                         correlation_id: CorrelationId,
                         client_id: Option<Cow<'a, str>>,
                         max_wait_time: i32,
                         min_bytes: i32,
                         max_bytes: i32,
                         partitions: Vec<(TopicPartition<'a>, i64)>)
                         -> KafkaRequest<'a> {
        let mut topics = HashMap::new();

        for (tp, fetch_offset) in partitions {
            topics
                .entry(tp.topic_name)
                .or_insert_with(Vec::new)
                .push(::protocol::FetchPartition {
                          partition: tp.partition,
                          fetch_offset: fetch_offset,
                          max_bytes: max_bytes,
                      });
        }

        KafkaRequest::Fetch(FetchRequest {
            header: Self::request_header(ApiKeys::Fetch, api_version, correlation_id, client_id),
            replica_id: CONSUMER_REPLICA_ID,
            max_wait_time: max_wait_time,
            min_bytes: min_bytes,
            topics: topics
                .into_iter()
                .map(|(topic_name, partitions)| {
                         FetchTopic {
                             topic_name: topic_name,
                             partitions: partitions,
                         }
                     })
                .collect(),
        })
    }

    pub fn list_offsets(api_version: ApiVersion,
                        correlation_id: CorrelationId,
                        client_id: Option<Cow<'a, str>>,
                        topics: HashMap<Cow<'a, str>, Vec<PartitionId>>,
                        offset: FetchOffset)
                        -> KafkaRequest<'a> {
        KafkaRequest::ListOffsets(ListOffsetRequest {
            header: Self::request_header(ApiKeys::ListOffsets,
                                         api_version,
                                         correlation_id,
                                         client_id),
            replica_id: CONSUMER_REPLICA_ID,
            topics: topics
                .into_iter()
                .map(|(topic_name, partitions)| {
                    ListTopic {
                        topic_name: topic_name,
                        partitions: partitions
                            .into_iter()
                            .map(|partition| {
                                     ListPartition {
                                         partition: partition,
                                         timestamp: offset.timestamp(),
                                         max_number_of_offsets: 1,
                                     }
                                 })
                            .collect(),
                    }
                })
                .collect(),
        })
    }

    pub fn fetch_metadata<S: AsRef<str>>(api_version: ApiVersion,
                                         correlation_id: CorrelationId,
                                         client_id: Option<Cow<'a, str>>,
                                         topic_names: &[S])
                                         -> KafkaRequest<'a> {
        KafkaRequest::Metadata(MetadataRequest {
            header: Self::request_header(ApiKeys::Metadata,
                                         api_version,
                                         correlation_id,
                                         client_id),
            topic_names: topic_names
                .iter()
                .map(|topic_name| Cow::from(topic_name.as_ref().to_owned()))
                .collect(),
        })
    }

    pub fn offset_commit(api_version: ApiVersion,
                         correlation_id: CorrelationId,
                         client_id: Option<Cow<'a, str>>,
                         group_id: Cow<'a, str>,
                         group_generation_id: GenerationId,
                         member_id: Cow<'a, str>,
                         retention_time: i64,
                         topics: Vec<CommitTopic<'a>>)
                         -> KafkaRequest<'a> {
        KafkaRequest::OffsetCommit(OffsetCommitRequest {
            header: Self::request_header(ApiKeys::OffsetCommit,
                                         api_version,
                                         correlation_id,
                                         client_id),
            group_id: group_id,
            group_generation_id: group_generation_id,
            member_id: member_id,
            retention_time: retention_time,
            topics: topics,
        })
    }

    pub fn offset_fetch(correlation_id: CorrelationId,
                        client_id: Option<Cow<'a, str>>,
                        group_id: Cow<'a, str>,
                        topics: Vec<FetchCommitTopic<'a>>)
                        -> KafkaRequest<'a> {
        KafkaRequest::OffsetFetch(OffsetFetchRequest {
            header: Self::request_header(ApiKeys::OffsetFetch, 0, correlation_id, client_id),
            group_id: group_id,
            topics: topics,
        })
    }

    pub fn group_coordinator(correlation_id: CorrelationId,
                             client_id: Option<Cow<'a, str>>,
                             group_id: Cow<'a, str>)
                             -> KafkaRequest<'a> {
        KafkaRequest::GroupCoordinator(GroupCoordinatorRequest {
            header: Self::request_header(ApiKeys::GroupCoordinator, 0, correlation_id, client_id),
            group_id: group_id,
        })
    }

    pub fn join_group(api_version: ApiVersion,
                      correlation_id: CorrelationId,
                      client_id: Option<Cow<'a, str>>,
                      group_id: Cow<'a, str>,
                      session_timeout: i32,
                      rebalance_timeout: i32,
                      member_id: Cow<'a, str>,
                      protocol_type: Cow<'a, str>,
                      protocols: Vec<JoinGroupProtocol<'a>>)
                      -> KafkaRequest<'a> {
        KafkaRequest::JoinGroup(JoinGroupRequest {
            header: Self::request_header(ApiKeys::JoinGroup,
                                         api_version,
                                         correlation_id,
                                         client_id),
            group_id: group_id,
            session_timeout: session_timeout,
            rebalance_timeout: rebalance_timeout,
            member_id: member_id,
            protocol_type: protocol_type,
            protocols: protocols,
        })
    }

    pub fn heartbeat(correlation_id: CorrelationId,
                     client_id: Option<Cow<'a, str>>,
                     group_id: Cow<'a, str>,
                     group_generation_id: GenerationId,
                     member_id: Cow<'a, str>)
                     -> KafkaRequest<'a> {
        KafkaRequest::Heartbeat(HeartbeatRequest {
            header: Self::request_header(ApiKeys::Heartbeat, 0, correlation_id, client_id),
            group_id: group_id,
            group_generation_id: group_generation_id,
            member_id: member_id,
        })
    }

    pub fn leave_group(correlation_id: CorrelationId,
                       client_id: Option<Cow<'a, str>>,
                       group_id: Cow<'a, str>,
                       member_id: Cow<'a, str>)
                       -> KafkaRequest<'a> {
        KafkaRequest::LeaveGroup(LeaveGroupRequest {
            header: Self::request_header(ApiKeys::LeaveGroup, 0, correlation_id, client_id),
            group_id: group_id,
            member_id: member_id,
        })
    }

    pub fn sync_group(correlation_id: CorrelationId,
                      client_id: Option<Cow<'a, str>>,
                      group_id: Cow<'a, str>,
                      group_generation_id: GenerationId,
                      member_id: Cow<'a, str>,
                      group_assignment: Vec<SyncGroupAssignment<'a>>)
                      -> KafkaRequest<'a> {
        KafkaRequest::SyncGroup(SyncGroupRequest {
            header: Self::request_header(ApiKeys::SyncGroup, 0, correlation_id, client_id),
            group_id: group_id,
            group_generation_id: group_generation_id,
            member_id: member_id,
            group_assignment: group_assignment,
        })
    }

    pub fn describe_groups(correlation_id: CorrelationId,
                           client_id: Option<Cow<'a, str>>,
                           group_ids: Vec<Cow<'a, str>>)
                           -> KafkaRequest<'a> {
        KafkaRequest::DescribeGroups(DescribeGroupsRequest {
            header: Self::request_header(ApiKeys::DescribeGroups, 0, correlation_id, client_id),
            group_ids: group_ids,
        })
    }

    pub fn list_groups(correlation_id: CorrelationId,
                       client_id: Option<Cow<'a, str>>)
                       -> KafkaRequest<'a> {
        KafkaRequest::ListGroups(ListGroupsRequest {
            header: Self::request_header(ApiKeys::ListGroups, 0, correlation_id, client_id),
        })
    }

    pub fn sasl_handshake(correlation_id: CorrelationId,
                          client_id: Option<Cow<'a, str>>,
                          mechanism: Cow<'a, str>)
                          -> KafkaRequest<'a> {
        KafkaRequest::SaslHandshake(SaslHandshakeRequest {
            header: Self::request_header(ApiKeys::SaslHandshake, 0, correlation_id, client_id),
            mechanism: mechanism,
        })
    }

    pub fn api_versions(correlation_id: CorrelationId,
                        client_id: Option<Cow<'a, str>>)
                        -> KafkaRequest<'a> {
        KafkaRequest::ApiVersions(ApiVersionsRequest {
            header: Self::request_header(ApiKeys::ApiVersions, 0, correlation_id, client_id),
        })
    }

    pub fn stop_replica(correlation_id: CorrelationId,
                        client_id: Option<Cow<'a, str>>,
                        controller_id: i32,
                        controller_epoch: i32,
                        delete_partitions: bool,
                        partitions: Vec<StopReplicaPartition<'a>>)
                        -> KafkaRequest<'a> {
        KafkaRequest::StopReplica(StopReplicaRequest {
            header: Self::request_header(ApiKeys::StopReplica, 0, correlation_id, client_id),
            controller_id: controller_id,
            controller_epoch: controller_epoch,
            delete_partitions: delete_partitions,
            partitions: partitions,
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::BigEndian;

    use super::*;

    #[test]
    fn test_request_header_accessors() {
        let mut request = KafkaRequest::api_versions(0, Some("client".into()));

        assert_eq!(request.api_key(), ApiKeys::ApiVersions);
        assert_eq!(request.api_version(), 0);
        assert_eq!(request.correlation_id(), 0);

        request.set_correlation_id(42);

        assert_eq!(request.correlation_id(), 42);

        let mut buf = BytesMut::with_capacity(64);

        request.encode::<BigEndian>(&mut buf).unwrap();

        assert_eq!(&buf[..],
                   &[0, 18, 0, 0, 0, 0, 0, 42,
                     0, 6, b'c', b'l', b'i', b'e', b'n', b't'][..]);
    }

    #[test]
    fn test_produce_records_groups_by_partition() {
        let tp = TopicPartition::new("topic", 2);
        let message_set = MessageSet {
            messages: vec![::protocol::Message {
                               offset: 0,
                               timestamp: None,
                               compression: Compression::None,
                               key: None,
                               value: Some(::bytes::Bytes::from(&b"value"[..])),
                           }],
        };

        let request = KafkaRequest::produce_records(0,
                                                    1,
                                                    None,
                                                    RequiredAcks::One,
                                                    3000,
                                                    Compression::None,
                                                    &tp,
                                                    vec![Cow::Owned(message_set.clone())]);

        if let KafkaRequest::Produce(req) = request {
            assert_eq!(req.required_acks, 1);
            assert_eq!(req.topics.len(), 1);
            assert_eq!(req.topics[0].topic_name, "topic");
            assert_eq!(req.topics[0].partitions.len(), 1);
            assert_eq!(req.topics[0].partitions[0].partition, 2);
            assert_eq!(req.topics[0].partitions[0].message_set, message_set);
        } else {
            panic!("expected a produce request");
        }
    }
}

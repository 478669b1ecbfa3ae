use hexplay::HexViewBuilder;

use nom::IResult;

use errors::{ErrorKind, Result};
use protocol::{ApiKeys, ApiVersion, ApiVersionsResponse, CorrelationId, DescribeGroupsResponse,
               FetchResponse, GroupCoordinatorResponse, HeartbeatResponse, JoinGroupResponse,
               LeaveGroupResponse, ListGroupsResponse, ListOffsetResponse, MetadataResponse,
               OffsetCommitResponse, OffsetFetchResponse, ProduceResponse,
               SaslHandshakeResponse, StopReplicaResponse, SyncGroupResponse,
               decode_fetch_response, nom_error_kind, parse_api_versions_response,
               parse_describe_groups_response, parse_group_coordinator_response,
               parse_heartbeat_response, parse_join_group_response, parse_leave_group_response,
               parse_list_groups_response, parse_list_offset_response, parse_metadata_response,
               parse_offset_commit_response, parse_offset_fetch_response,
               parse_produce_response, parse_sasl_handshake_response,
               parse_stop_replica_response, parse_sync_group_response};

/// The closed set of responses this client understands, mirroring
/// `KafkaRequest` kind for kind.
#[derive(Clone, Debug, PartialEq)]
pub enum KafkaResponse {
    Produce(ProduceResponse),
    Fetch(FetchResponse),
    ListOffsets(ListOffsetResponse),
    Metadata(MetadataResponse),
    StopReplica(StopReplicaResponse),
    OffsetCommit(OffsetCommitResponse),
    OffsetFetch(OffsetFetchResponse),
    GroupCoordinator(GroupCoordinatorResponse),
    JoinGroup(JoinGroupResponse),
    Heartbeat(HeartbeatResponse),
    LeaveGroup(LeaveGroupResponse),
    SyncGroup(SyncGroupResponse),
    DescribeGroups(DescribeGroupsResponse),
    ListGroups(ListGroupsResponse),
    SaslHandshake(SaslHandshakeResponse),
    ApiVersions(ApiVersionsResponse),
}

impl KafkaResponse {
    pub fn api_key(&self) -> ApiKeys {
        match *self {
            KafkaResponse::Produce(_) => ApiKeys::Produce,
            KafkaResponse::Fetch(_) => ApiKeys::Fetch,
            KafkaResponse::ListOffsets(_) => ApiKeys::ListOffsets,
            KafkaResponse::Metadata(_) => ApiKeys::Metadata,
            KafkaResponse::StopReplica(_) => ApiKeys::StopReplica,
            KafkaResponse::OffsetCommit(_) => ApiKeys::OffsetCommit,
            KafkaResponse::OffsetFetch(_) => ApiKeys::OffsetFetch,
            KafkaResponse::GroupCoordinator(_) => ApiKeys::GroupCoordinator,
            KafkaResponse::JoinGroup(_) => ApiKeys::JoinGroup,
            KafkaResponse::Heartbeat(_) => ApiKeys::Heartbeat,
            KafkaResponse::LeaveGroup(_) => ApiKeys::LeaveGroup,
            KafkaResponse::SyncGroup(_) => ApiKeys::SyncGroup,
            KafkaResponse::DescribeGroups(_) => ApiKeys::DescribeGroups,
            KafkaResponse::ListGroups(_) => ApiKeys::ListGroups,
            KafkaResponse::SaslHandshake(_) => ApiKeys::SaslHandshake,
            KafkaResponse::ApiVersions(_) => ApiKeys::ApiVersions,
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        match *self {
            KafkaResponse::Produce(ref res) => res.header.correlation_id,
            KafkaResponse::Fetch(ref res) => res.header.correlation_id,
            KafkaResponse::ListOffsets(ref res) => res.header.correlation_id,
            KafkaResponse::Metadata(ref res) => res.header.correlation_id,
            KafkaResponse::StopReplica(ref res) => res.header.correlation_id,
            KafkaResponse::OffsetCommit(ref res) => res.header.correlation_id,
            KafkaResponse::OffsetFetch(ref res) => res.header.correlation_id,
            KafkaResponse::GroupCoordinator(ref res) => res.header.correlation_id,
            KafkaResponse::JoinGroup(ref res) => res.header.correlation_id,
            KafkaResponse::Heartbeat(ref res) => res.header.correlation_id,
            KafkaResponse::LeaveGroup(ref res) => res.header.correlation_id,
            KafkaResponse::SyncGroup(ref res) => res.header.correlation_id,
            KafkaResponse::DescribeGroups(ref res) => res.header.correlation_id,
            KafkaResponse::ListGroups(ref res) => res.header.correlation_id,
            KafkaResponse::SaslHandshake(ref res) => res.header.correlation_id,
            KafkaResponse::ApiVersions(ref res) => res.header.correlation_id,
        }
    }

    /// Decode a complete response body (correlation id included) as
    /// the given kind and version.
    pub fn decode(src: &[u8], api_key: ApiKeys, api_version: ApiVersion) -> Result<KafkaResponse> {
        let result = match api_key {
            ApiKeys::Produce => {
                from_nom(parse_produce_response(src, api_version)).map(KafkaResponse::Produce)
            }
            ApiKeys::Fetch => decode_fetch_response(src, api_version).map(KafkaResponse::Fetch),
            ApiKeys::ListOffsets => {
                from_nom(parse_list_offset_response(src, api_version))
                    .map(KafkaResponse::ListOffsets)
            }
            ApiKeys::Metadata => {
                from_nom(parse_metadata_response(src)).map(KafkaResponse::Metadata)
            }
            ApiKeys::StopReplica => {
                from_nom(parse_stop_replica_response(src)).map(KafkaResponse::StopReplica)
            }
            ApiKeys::OffsetCommit => {
                from_nom(parse_offset_commit_response(src)).map(KafkaResponse::OffsetCommit)
            }
            ApiKeys::OffsetFetch => {
                from_nom(parse_offset_fetch_response(src)).map(KafkaResponse::OffsetFetch)
            }
            ApiKeys::GroupCoordinator => {
                from_nom(parse_group_coordinator_response(src))
                    .map(KafkaResponse::GroupCoordinator)
            }
            ApiKeys::JoinGroup => {
                from_nom(parse_join_group_response(src)).map(KafkaResponse::JoinGroup)
            }
            ApiKeys::Heartbeat => {
                from_nom(parse_heartbeat_response(src)).map(KafkaResponse::Heartbeat)
            }
            ApiKeys::LeaveGroup => {
                from_nom(parse_leave_group_response(src)).map(KafkaResponse::LeaveGroup)
            }
            ApiKeys::SyncGroup => {
                from_nom(parse_sync_group_response(src)).map(KafkaResponse::SyncGroup)
            }
            ApiKeys::DescribeGroups => {
                from_nom(parse_describe_groups_response(src)).map(KafkaResponse::DescribeGroups)
            }
            ApiKeys::ListGroups => {
                from_nom(parse_list_groups_response(src)).map(KafkaResponse::ListGroups)
            }
            ApiKeys::SaslHandshake => {
                from_nom(parse_sasl_handshake_response(src)).map(KafkaResponse::SaslHandshake)
            }
            ApiKeys::ApiVersions => {
                from_nom(parse_api_versions_response(src)).map(KafkaResponse::ApiVersions)
            }
            _ => Err(ErrorKind::UnexpectedResponse(api_key as i16).into()),
        };

        if let Err(ref err) = result {
            trace!("fail to decode {:?} v{} response, {}\n{}",
                   api_key,
                   api_version,
                   err,
                   HexViewBuilder::new(src).row_width(16).finish());
        }

        result
    }
}

fn from_nom<T>(result: IResult<&[u8], T>) -> Result<T> {
    match result {
        IResult::Done(remaining, res) => {
            if !remaining.is_empty() {
                trace!("{} bytes left over after decoding a response", remaining.len());
            }

            Ok(res)
        }
        IResult::Incomplete(_) => Err(ErrorKind::BufferUnderRun("response body").into()),
        IResult::Error(err) => Err(ErrorKind::ParseError(nom_error_kind(err)).into()),
    }
}

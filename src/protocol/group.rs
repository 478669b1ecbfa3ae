use std::borrow::Cow;

use bytes::{BufMut, ByteOrder, Bytes, BytesMut};

use nom::{be_i16, be_i32};

use errors::Result;
use protocol::{Encodable, ErrorCode, GenerationId, NodeId, ParseTag, RequestHeader,
               ResponseHeader, WriteExt, parse_bytes, parse_response_header, parse_string};

/// GroupCoordinatorRequest => GroupId
///   GroupId => string
#[derive(Clone, Debug, PartialEq)]
pub struct GroupCoordinatorRequest<'a> {
    pub header: RequestHeader<'a>,
    pub group_id: Cow<'a, str>,
}

impl<'a> Encodable for GroupCoordinatorRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;
        dst.put_str::<T, _>(Some(self.group_id.as_ref()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupCoordinatorResponse {
    pub header: ResponseHeader,
    pub error_code: ErrorCode,
    pub coordinator_id: NodeId,
    pub coordinator_host: String,
    pub coordinator_port: i32,
}

named!(pub parse_group_coordinator_response<GroupCoordinatorResponse>,
    parse_tag!(ParseTag::GroupCoordinatorResponse,
        do_parse!(
            header: parse_response_header
         >> error_code: be_i16
         >> coordinator_id: be_i32
         >> coordinator_host: parse_string
         >> coordinator_port: be_i32
         >> (GroupCoordinatorResponse {
                header: header,
                error_code: error_code,
                coordinator_id: coordinator_id,
                coordinator_host: coordinator_host,
                coordinator_port: coordinator_port,
            })
        )
    )
);

/// JoinGroupRequest => GroupId SessionTimeout MemberId ProtocolType GroupProtocols
///
/// api version 1 adds a rebalance timeout after the session timeout.
///
/// The per-protocol metadata is an opaque slab whose encoding belongs
/// to the protocol type, not to the wire codec.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinGroupRequest<'a> {
    pub header: RequestHeader<'a>,
    pub group_id: Cow<'a, str>,
    pub session_timeout: i32,
    pub rebalance_timeout: i32,
    pub member_id: Cow<'a, str>,
    pub protocol_type: Cow<'a, str>,
    pub protocols: Vec<JoinGroupProtocol<'a>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct JoinGroupProtocol<'a> {
    pub protocol_name: Cow<'a, str>,
    pub protocol_metadata: Bytes,
}

impl<'a> Encodable for JoinGroupRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        let api_version = self.header.api_version;

        self.header.encode::<T>(dst)?;

        dst.put_str::<T, _>(Some(self.group_id.as_ref()))?;
        dst.put_i32::<T>(self.session_timeout);
        if api_version > 0 {
            dst.put_i32::<T>(self.rebalance_timeout);
        }
        dst.put_str::<T, _>(Some(self.member_id.as_ref()))?;
        dst.put_str::<T, _>(Some(self.protocol_type.as_ref()))?;
        dst.put_array::<T, _, _>(&self.protocols, |buf, protocol| {
            buf.put_str::<T, _>(Some(protocol.protocol_name.as_ref()))?;
            buf.put_bytes::<T, _>(Some(&protocol.protocol_metadata))
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct JoinGroupResponse {
    pub header: ResponseHeader,
    pub error_code: ErrorCode,
    pub generation_id: GenerationId,
    /// The group protocol selected by the coordinator.
    pub protocol: String,
    pub leader_id: String,
    pub member_id: String,
    pub members: Vec<JoinGroupMember>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct JoinGroupMember {
    pub member_id: String,
    pub member_metadata: Bytes,
}

named!(pub parse_join_group_response<JoinGroupResponse>,
    parse_tag!(ParseTag::JoinGroupResponse,
        do_parse!(
            header: parse_response_header
         >> error_code: be_i16
         >> generation_id: be_i32
         >> protocol: parse_string
         >> leader_id: parse_string
         >> member_id: parse_string
         >> members: length_count!(be_i32, parse_join_group_member)
         >> (JoinGroupResponse {
                header: header,
                error_code: error_code,
                generation_id: generation_id,
                protocol: protocol,
                leader_id: leader_id,
                member_id: member_id,
                members: members,
            })
        )
    )
);

named!(parse_join_group_member<JoinGroupMember>,
    do_parse!(
        member_id: parse_string
     >> member_metadata: parse_bytes
     >> (JoinGroupMember {
            member_id: member_id,
            member_metadata: member_metadata
                .map(|s| Bytes::from(&s[..]))
                .unwrap_or_else(Bytes::new),
        })
    )
);

/// HeartbeatRequest => GroupId GroupGenerationId MemberId
#[derive(Clone, Debug, PartialEq)]
pub struct HeartbeatRequest<'a> {
    pub header: RequestHeader<'a>,
    pub group_id: Cow<'a, str>,
    pub group_generation_id: GenerationId,
    pub member_id: Cow<'a, str>,
}

impl<'a> Encodable for HeartbeatRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;

        dst.put_str::<T, _>(Some(self.group_id.as_ref()))?;
        dst.put_i32::<T>(self.group_generation_id);
        dst.put_str::<T, _>(Some(self.member_id.as_ref()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeartbeatResponse {
    pub header: ResponseHeader,
    pub error_code: ErrorCode,
}

named!(pub parse_heartbeat_response<HeartbeatResponse>,
    parse_tag!(ParseTag::HeartbeatResponse,
        do_parse!(
            header: parse_response_header
         >> error_code: be_i16
         >> (HeartbeatResponse {
                header: header,
                error_code: error_code,
            })
        )
    )
);

/// LeaveGroupRequest => GroupId MemberId
#[derive(Clone, Debug, PartialEq)]
pub struct LeaveGroupRequest<'a> {
    pub header: RequestHeader<'a>,
    pub group_id: Cow<'a, str>,
    pub member_id: Cow<'a, str>,
}

impl<'a> Encodable for LeaveGroupRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;

        dst.put_str::<T, _>(Some(self.group_id.as_ref()))?;
        dst.put_str::<T, _>(Some(self.member_id.as_ref()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeaveGroupResponse {
    pub header: ResponseHeader,
    pub error_code: ErrorCode,
}

named!(pub parse_leave_group_response<LeaveGroupResponse>,
    parse_tag!(ParseTag::LeaveGroupResponse,
        do_parse!(
            header: parse_response_header
         >> error_code: be_i16
         >> (LeaveGroupResponse {
                header: header,
                error_code: error_code,
            })
        )
    )
);

/// SyncGroupRequest => GroupId GenerationId MemberId GroupAssignment
///
/// The per-member assignment is an opaque slab, like the join group
/// protocol metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncGroupRequest<'a> {
    pub header: RequestHeader<'a>,
    pub group_id: Cow<'a, str>,
    pub group_generation_id: GenerationId,
    pub member_id: Cow<'a, str>,
    pub group_assignment: Vec<SyncGroupAssignment<'a>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyncGroupAssignment<'a> {
    pub member_id: Cow<'a, str>,
    pub member_assignment: Bytes,
}

impl<'a> Encodable for SyncGroupRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;

        dst.put_str::<T, _>(Some(self.group_id.as_ref()))?;
        dst.put_i32::<T>(self.group_generation_id);
        dst.put_str::<T, _>(Some(self.member_id.as_ref()))?;
        dst.put_array::<T, _, _>(&self.group_assignment, |buf, assignment| {
            buf.put_str::<T, _>(Some(assignment.member_id.as_ref()))?;
            buf.put_bytes::<T, _>(Some(&assignment.member_assignment))
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyncGroupResponse {
    pub header: ResponseHeader,
    pub error_code: ErrorCode,
    pub member_assignment: Bytes,
}

named!(pub parse_sync_group_response<SyncGroupResponse>,
    parse_tag!(ParseTag::SyncGroupResponse,
        do_parse!(
            header: parse_response_header
         >> error_code: be_i16
         >> member_assignment: parse_bytes
         >> (SyncGroupResponse {
                header: header,
                error_code: error_code,
                member_assignment: member_assignment
                    .map(|s| Bytes::from(&s[..]))
                    .unwrap_or_else(Bytes::new),
            })
        )
    )
);

/// DescribeGroupsRequest => [GroupId]
#[derive(Clone, Debug, PartialEq)]
pub struct DescribeGroupsRequest<'a> {
    pub header: RequestHeader<'a>,
    pub group_ids: Vec<Cow<'a, str>>,
}

impl<'a> Encodable for DescribeGroupsRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;

        dst.put_array::<T, _, _>(&self.group_ids, |buf, group_id| {
            buf.put_str::<T, _>(Some(group_id.as_ref()))
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DescribeGroupsResponse {
    pub header: ResponseHeader,
    pub groups: Vec<GroupDescription>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupDescription {
    pub error_code: ErrorCode,
    pub group_id: String,
    pub state: String,
    pub protocol_type: String,
    pub protocol: String,
    pub members: Vec<GroupMemberDescription>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupMemberDescription {
    pub member_id: String,
    pub client_id: String,
    pub client_host: String,
    pub member_metadata: Bytes,
    pub member_assignment: Bytes,
}

named!(pub parse_describe_groups_response<DescribeGroupsResponse>,
    parse_tag!(ParseTag::DescribeGroupsResponse,
        do_parse!(
            header: parse_response_header
         >> groups: length_count!(be_i32, parse_group_description)
         >> (DescribeGroupsResponse {
                header: header,
                groups: groups,
            })
        )
    )
);

named!(parse_group_description<GroupDescription>,
    do_parse!(
        error_code: be_i16
     >> group_id: parse_string
     >> state: parse_string
     >> protocol_type: parse_string
     >> protocol: parse_string
     >> members: length_count!(be_i32, parse_group_member_description)
     >> (GroupDescription {
            error_code: error_code,
            group_id: group_id,
            state: state,
            protocol_type: protocol_type,
            protocol: protocol,
            members: members,
        })
    )
);

named!(parse_group_member_description<GroupMemberDescription>,
    do_parse!(
        member_id: parse_string
     >> client_id: parse_string
     >> client_host: parse_string
     >> member_metadata: parse_bytes
     >> member_assignment: parse_bytes
     >> (GroupMemberDescription {
            member_id: member_id,
            client_id: client_id,
            client_host: client_host,
            member_metadata: member_metadata
                .map(|s| Bytes::from(&s[..]))
                .unwrap_or_else(Bytes::new),
            member_assignment: member_assignment
                .map(|s| Bytes::from(&s[..]))
                .unwrap_or_else(Bytes::new),
        })
    )
);

/// ListGroupsRequest has an empty body.
#[derive(Clone, Debug, PartialEq)]
pub struct ListGroupsRequest<'a> {
    pub header: RequestHeader<'a>,
}

impl<'a> Encodable for ListGroupsRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListGroupsResponse {
    pub header: ResponseHeader,
    pub error_code: ErrorCode,
    pub groups: Vec<ListedGroup>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListedGroup {
    pub group_id: String,
    pub protocol_type: String,
}

named!(pub parse_list_groups_response<ListGroupsResponse>,
    parse_tag!(ParseTag::ListGroupsResponse,
        do_parse!(
            header: parse_response_header
         >> error_code: be_i16
         >> groups: length_count!(be_i32, parse_listed_group)
         >> (ListGroupsResponse {
                header: header,
                error_code: error_code,
                groups: groups,
            })
        )
    )
);

named!(parse_listed_group<ListedGroup>,
    do_parse!(
        group_id: parse_string
     >> protocol_type: parse_string
     >> (ListedGroup {
            group_id: group_id,
            protocol_type: protocol_type,
        })
    )
);

#[cfg(test)]
mod tests {
    use bytes::BigEndian;

    use nom::IResult;

    use protocol::*;
    use super::*;

    #[test]
    fn test_encode_group_coordinator_request() {
        let req = GroupCoordinatorRequest {
            header: RequestHeader {
                api_key: ApiKeys::GroupCoordinator as ApiKey,
                api_version: 0,
                correlation_id: 123,
                client_id: None,
            },
            group_id: "group".into(),
        };

        let mut buf = BytesMut::with_capacity(64);

        req.encode::<BigEndian>(&mut buf).unwrap();

        assert_eq!(&buf[..],
                   &[0, 10, 0, 0, 0, 0, 0, 123, 0xff, 0xff,
                     0, 5, b'g', b'r', b'o', b'u', b'p'][..]);
    }

    #[test]
    fn test_parse_group_coordinator_response() {
        let data = [0, 0, 0, 123,
                    0, 0,
                    0, 0, 0, 1,
                    0, 4, b'h', b'o', b's', b't',
                    0, 0, 0x23, 0x84];

        let res = GroupCoordinatorResponse {
            header: ResponseHeader { correlation_id: 123 },
            error_code: 0,
            coordinator_id: 1,
            coordinator_host: "host".to_owned(),
            coordinator_port: 9092,
        };

        assert_eq!(parse_group_coordinator_response(&data[..]),
                   IResult::Done(&b""[..], res));
    }

    #[test]
    fn test_encode_join_group_request() {
        let req = JoinGroupRequest {
            header: RequestHeader {
                api_key: ApiKeys::JoinGroup as ApiKey,
                api_version: 1,
                correlation_id: 123,
                client_id: None,
            },
            group_id: "group".into(),
            session_timeout: 1000,
            rebalance_timeout: 2000,
            member_id: "".into(),
            protocol_type: "consumer".into(),
            protocols: vec![JoinGroupProtocol {
                                protocol_name: "range".into(),
                                protocol_metadata: Bytes::from(&b"data"[..]),
                            }],
        };

        let mut buf = BytesMut::with_capacity(128);

        req.encode::<BigEndian>(&mut buf).unwrap();

        assert_eq!(&buf[..],
                   &[0, 11, 0, 1, 0, 0, 0, 123, 0xff, 0xff,
                     0, 5, b'g', b'r', b'o', b'u', b'p',
                     0, 0, 3, 0xe8,                             // session_timeout
                     0, 0, 7, 0xd0,                             // rebalance_timeout
                     0, 0,                                      // member_id
                     0, 8, b'c', b'o', b'n', b's', b'u', b'm', b'e', b'r',
                     0, 0, 0, 1,
                         0, 5, b'r', b'a', b'n', b'g', b'e',
                         0, 0, 0, 4, b'd', b'a', b't', b'a'][..]);
    }

    #[test]
    fn test_parse_join_group_response() {
        let data = [0, 0, 0, 123,
                    0, 0,                                       // error_code
                    0, 0, 0, 7,                                 // generation_id
                    0, 5, b'r', b'a', b'n', b'g', b'e',
                    0, 6, b'l', b'e', b'a', b'd', b'e', b'r',
                    0, 6, b'm', b'e', b'm', b'b', b'e', b'r',
                    0, 0, 0, 1,
                        0, 6, b'l', b'e', b'a', b'd', b'e', b'r',
                        0, 0, 0, 4, b'd', b'a', b't', b'a'];

        let res = JoinGroupResponse {
            header: ResponseHeader { correlation_id: 123 },
            error_code: 0,
            generation_id: 7,
            protocol: "range".to_owned(),
            leader_id: "leader".to_owned(),
            member_id: "member".to_owned(),
            members: vec![JoinGroupMember {
                              member_id: "leader".to_owned(),
                              member_metadata: Bytes::from(&b"data"[..]),
                          }],
        };

        assert_eq!(parse_join_group_response(&data[..]),
                   IResult::Done(&b""[..], res));
    }

    #[test]
    fn test_encode_sync_group_request() {
        let req = SyncGroupRequest {
            header: RequestHeader {
                api_key: ApiKeys::SyncGroup as ApiKey,
                api_version: 0,
                correlation_id: 123,
                client_id: None,
            },
            group_id: "group".into(),
            group_generation_id: 7,
            member_id: "member".into(),
            group_assignment: vec![SyncGroupAssignment {
                                       member_id: "member".into(),
                                       member_assignment: Bytes::from(&b"data"[..]),
                                   }],
        };

        let mut buf = BytesMut::with_capacity(128);

        req.encode::<BigEndian>(&mut buf).unwrap();

        assert_eq!(&buf[..],
                   &[0, 14, 0, 0, 0, 0, 0, 123, 0xff, 0xff,
                     0, 5, b'g', b'r', b'o', b'u', b'p',
                     0, 0, 0, 7,
                     0, 6, b'm', b'e', b'm', b'b', b'e', b'r',
                     0, 0, 0, 1,
                         0, 6, b'm', b'e', b'm', b'b', b'e', b'r',
                         0, 0, 0, 4, b'd', b'a', b't', b'a'][..]);
    }

    #[test]
    fn test_parse_sync_group_response() {
        let data = [0, 0, 0, 123, 0, 0, 0, 0, 0, 4, b'd', b'a', b't', b'a'];

        let res = SyncGroupResponse {
            header: ResponseHeader { correlation_id: 123 },
            error_code: 0,
            member_assignment: Bytes::from(&b"data"[..]),
        };

        assert_eq!(parse_sync_group_response(&data[..]),
                   IResult::Done(&b""[..], res));
    }

    #[test]
    fn test_heartbeat_and_leave_group() {
        let heartbeat = HeartbeatRequest {
            header: RequestHeader {
                api_key: ApiKeys::Heartbeat as ApiKey,
                api_version: 0,
                correlation_id: 123,
                client_id: None,
            },
            group_id: "g".into(),
            group_generation_id: 7,
            member_id: "m".into(),
        };

        let mut buf = BytesMut::with_capacity(64);

        heartbeat.encode::<BigEndian>(&mut buf).unwrap();

        assert_eq!(&buf[..],
                   &[0, 12, 0, 0, 0, 0, 0, 123, 0xff, 0xff,
                     0, 1, b'g', 0, 0, 0, 7, 0, 1, b'm'][..]);

        assert_eq!(parse_heartbeat_response(&[0, 0, 0, 123, 0, 27]),
                   IResult::Done(&b""[..],
                                 HeartbeatResponse {
                                     header: ResponseHeader { correlation_id: 123 },
                                     error_code: 27,
                                 }));

        assert_eq!(parse_leave_group_response(&[0, 0, 0, 123, 0, 0]),
                   IResult::Done(&b""[..],
                                 LeaveGroupResponse {
                                     header: ResponseHeader { correlation_id: 123 },
                                     error_code: 0,
                                 }));
    }

    #[test]
    fn test_parse_describe_groups_response() {
        let data = [0, 0, 0, 123,
                    0, 0, 0, 1,
                        0, 0,                                   // error_code
                        0, 1, b'g',
                        0, 6, b'S', b't', b'a', b'b', b'l', b'e',
                        0, 8, b'c', b'o', b'n', b's', b'u', b'm', b'e', b'r',
                        0, 5, b'r', b'a', b'n', b'g', b'e',
                        0, 0, 0, 1,
                            0, 1, b'm',
                            0, 1, b'c',
                            0, 4, b'h', b'o', b's', b't',
                            0, 0, 0, 2, 1, 2,                   // metadata
                            0, 0, 0, 2, 3, 4];                  // assignment

        let res = DescribeGroupsResponse {
            header: ResponseHeader { correlation_id: 123 },
            groups: vec![GroupDescription {
                             error_code: 0,
                             group_id: "g".to_owned(),
                             state: "Stable".to_owned(),
                             protocol_type: "consumer".to_owned(),
                             protocol: "range".to_owned(),
                             members: vec![GroupMemberDescription {
                                               member_id: "m".to_owned(),
                                               client_id: "c".to_owned(),
                                               client_host: "host".to_owned(),
                                               member_metadata: Bytes::from(&[1u8, 2][..]),
                                               member_assignment: Bytes::from(&[3u8, 4][..]),
                                           }],
                         }],
        };

        assert_eq!(parse_describe_groups_response(&data[..]),
                   IResult::Done(&b""[..], res));
    }

    #[test]
    fn test_parse_list_groups_response() {
        let data = [0, 0, 0, 123,
                    0, 0,
                    0, 0, 0, 1,
                        0, 1, b'g',
                        0, 8, b'c', b'o', b'n', b's', b'u', b'm', b'e', b'r'];

        let res = ListGroupsResponse {
            header: ResponseHeader { correlation_id: 123 },
            error_code: 0,
            groups: vec![ListedGroup {
                             group_id: "g".to_owned(),
                             protocol_type: "consumer".to_owned(),
                         }],
        };

        assert_eq!(parse_list_groups_response(&data[..]),
                   IResult::Done(&b""[..], res));
    }
}

use std::mem;
use std::str;
use std::borrow::{Cow, ToOwned};

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, BytesMut};
use crc::crc32;
use nom::{Err, ErrorKind as NomErrorKind, be_i16, be_i32};

use errors::{ErrorKind, Result};

/// Attribute a nom sub-parser failure to a position in the wire format,
/// so decode errors name the field that failed.
macro_rules! parse_tag {
    ($i:expr, $tag:expr, $submac:ident!( $($args:tt)* )) => (
        add_return_error!($i, ::nom::ErrorKind::Custom($tag as u32), $submac!($($args)*))
    );
    ($i:expr, $tag:expr, $f:expr) => (
        add_return_error!($i, ::nom::ErrorKind::Custom($tag as u32), call!($f))
    );
}

mod header;
mod message;
mod produce;
mod fetch;
mod list_offset;
mod metadata;
mod offset_commit;
mod offset_fetch;
mod group;
mod sasl;
mod api_versions;
mod stop_replica;
mod schema;

pub use self::header::{RequestHeader, ResponseHeader, parse_response_header};
pub use self::message::{COMPRESSION_CODEC_MASK, Message, MessageSet, MessageSetEncoder,
                        MessageTimestamp, TIMESTAMP_TYPE_MASK, decode_message_set};
pub use self::produce::{ProducePartitionData, ProducePartitionStatus, ProduceRequest,
                        ProduceResponse, ProduceTopicData, ProduceTopicStatus,
                        parse_produce_response};
pub use self::fetch::{CONSUMER_REPLICA_ID, FetchPartition, FetchPartitionData, FetchRequest,
                      FetchTopic, FetchTopicData, FetchResponse, decode_fetch_response};
pub use self::list_offset::{EARLIEST_TIMESTAMP, FetchOffset, LATEST_TIMESTAMP,
                            ListOffsetRequest, ListOffsetResponse, ListPartition,
                            ListPartitionOffset, ListTopic, ListTopicOffset,
                            parse_list_offset_response};
pub use self::metadata::{BrokerMetadata, MetadataRequest, MetadataResponse, PartitionMetadata,
                         TopicMetadata, parse_metadata_response};
pub use self::offset_commit::{CommitPartition, CommitPartitionStatus, CommitTopic,
                              CommitTopicStatus, DEFAULT_RETENTION_TIME, OffsetCommitRequest,
                              OffsetCommitResponse, parse_offset_commit_response};
pub use self::offset_fetch::{FetchCommitPartitionStatus, FetchCommitTopic,
                             FetchCommitTopicStatus, OffsetFetchRequest, OffsetFetchResponse,
                             parse_offset_fetch_response};
pub use self::group::{DescribeGroupsRequest, DescribeGroupsResponse, GroupCoordinatorRequest,
                      GroupCoordinatorResponse, GroupDescription, GroupMemberDescription,
                      HeartbeatRequest, HeartbeatResponse, JoinGroupMember, JoinGroupProtocol,
                      JoinGroupRequest, JoinGroupResponse, LeaveGroupRequest, LeaveGroupResponse,
                      ListGroupsRequest, ListGroupsResponse, ListedGroup, SyncGroupAssignment,
                      SyncGroupRequest, SyncGroupResponse, parse_describe_groups_response,
                      parse_group_coordinator_response, parse_heartbeat_response,
                      parse_join_group_response, parse_leave_group_response,
                      parse_list_groups_response, parse_sync_group_response};
pub use self::sasl::{SaslHandshakeRequest, SaslHandshakeResponse, parse_sasl_handshake_response};
pub use self::api_versions::{ApiVersionsRequest, ApiVersionsResponse, SupportedApiVersion,
                             UsableApiVersions, parse_api_versions_response};
pub use self::stop_replica::{StopReplicaPartition, StopReplicaPartitionStatus,
                             StopReplicaRequest, StopReplicaResponse,
                             parse_stop_replica_response};
pub use self::schema::{ProtocolCodec, ProtocolCodecRegistry, ProtocolMetadata};

pub type ApiKey = i16;
pub type ApiVersion = i16;
pub type CorrelationId = i32;
pub type PartitionId = i32;
pub type ErrorCode = i16;
pub type Offset = i64;
pub type Timestamp = i64;
pub type NodeId = i32;
pub type GenerationId = i32;

/// The following are the numeric codes that the ApiKey in the request can take for each of the below request types.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum ApiKeys {
    Produce = 0,
    Fetch = 1,
    ListOffsets = 2,
    Metadata = 3,
    LeaderAndIsr = 4,
    StopReplica = 5,
    UpdateMetadata = 6,
    ControlledShutdown = 7,
    OffsetCommit = 8,
    OffsetFetch = 9,
    GroupCoordinator = 10,
    JoinGroup = 11,
    Heartbeat = 12,
    LeaveGroup = 13,
    SyncGroup = 14,
    DescribeGroups = 15,
    ListGroups = 16,
    SaslHandshake = 17,
    ApiVersions = 18,
    CreateTopics = 19,
    DeleteTopics = 20,
}

impl ApiKeys {
    pub fn key(&self) -> ApiKey {
        *self as ApiKey
    }

    pub fn name(&self) -> &'static str {
        match *self {
            ApiKeys::Produce => "produce",
            ApiKeys::Fetch => "fetch",
            ApiKeys::ListOffsets => "list_offsets",
            ApiKeys::Metadata => "metadata",
            ApiKeys::LeaderAndIsr => "leader_and_isr",
            ApiKeys::StopReplica => "stop_replica",
            ApiKeys::UpdateMetadata => "update_metadata",
            ApiKeys::ControlledShutdown => "controlled_shutdown",
            ApiKeys::OffsetCommit => "offset_commit",
            ApiKeys::OffsetFetch => "offset_fetch",
            ApiKeys::GroupCoordinator => "group_coordinator",
            ApiKeys::JoinGroup => "join_group",
            ApiKeys::Heartbeat => "heartbeat",
            ApiKeys::LeaveGroup => "leave_group",
            ApiKeys::SyncGroup => "sync_group",
            ApiKeys::DescribeGroups => "describe_groups",
            ApiKeys::ListGroups => "list_groups",
            ApiKeys::SaslHandshake => "sasl_handshake",
            ApiKeys::ApiVersions => "api_versions",
            ApiKeys::CreateTopics => "create_topics",
            ApiKeys::DeleteTopics => "delete_topics",
        }
    }
}

impl From<i16> for ApiKeys {
    fn from(v: i16) -> Self {
        debug_assert!(v >= ApiKeys::Produce as i16 && v <= ApiKeys::DeleteTopics as i16);

        unsafe { mem::transmute(v) }
    }
}

/// Possible choices on acknowledgement requirements when
/// producing/sending messages to Kafka.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum RequiredAcks {
    /// Indicates to the receiving Kafka broker not to acknowlegde
    /// messages sent to it at all. Sending messages with this
    /// acknowledgement requirement translates into a fire-and-forget
    /// scenario which - of course - is very fast but not reliable.
    None = 0,
    /// Requires the receiving Kafka broker to wait until the sent
    /// messages are written to local disk.  Such messages can be
    /// regarded as acknowledged by one broker in the cluster.
    One = 1,
    /// Requires the sent messages to be acknowledged by all in-sync
    /// replicas of the targeted topic partitions.
    All = -1,
}

impl Default for RequiredAcks {
    fn default() -> Self {
        RequiredAcks::One
    }
}

/// Positions in the wire format the parsers may fail at.
#[derive(Debug, Copy, Clone, PartialEq)]
#[repr(u32)]
pub enum ParseTag {
    ResponseHeader = 0,
    String,
    ProduceResponse,
    ListOffsetsResponse,
    MetadataResponse,
    StopReplicaResponse,
    OffsetCommitResponse,
    OffsetFetchResponse,
    GroupCoordinatorResponse,
    JoinGroupResponse,
    HeartbeatResponse,
    LeaveGroupResponse,
    SyncGroupResponse,
    DescribeGroupsResponse,
    ListGroupsResponse,
    SaslHandshakeResponse,
    ApiVersionsResponse,
    ApiVersion,
    Broker,
    Topic,
    Partition,
}

/// A request or request fragment that knows its own wire encoding.
pub trait Encodable {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()>;
}

named!(pub parse_str<Option<Cow<str>>>,
    do_parse!(
        len: be_i16
     >> s: cond!(len > 0, map!(map_res!(take!(len), str::from_utf8), Cow::from))
     >> (s)
    )
);

named!(pub parse_string<String>,
    parse_tag!(ParseTag::String,
        do_parse!(
            len: be_i16
         >> s: cond_reduce!(len >= 0, map!(map_res!(take!(len), str::from_utf8), ToOwned::to_owned))
         >> (s)
        )
    )
);

named!(pub parse_bytes<Option<Cow<[u8]>>>,
    do_parse!(
        len: be_i32
     >> s: cond!(len > 0, map!(take!(len), Cow::from))
     >> (s)
    )
);

/// Strip a nom failure down to the error kind closest to the failure
/// site, dropping the borrowed positions.
pub fn nom_error_kind<P>(err: Err<P, u32>) -> NomErrorKind<u32> {
    match err {
        Err::Code(kind) |
        Err::Node(kind, _) |
        Err::Position(kind, _) |
        Err::NodePosition(kind, _, _) => kind,
    }
}

pub trait WriteExt: BufMut + Sized {
    fn put_bool(&mut self, v: bool) {
        self.put_i8(if v { 1 } else { 0 });
    }

    fn put_str<T, S>(&mut self, s: Option<S>) -> Result<()>
        where T: ByteOrder,
              S: AsRef<str>
    {
        match s.as_ref().map(|s| s.as_ref()) {
            Some(s) if s.len() > i16::max_value() as usize => {
                bail!(ErrorKind::CodecError("string exceeds the maximum size"))
            }
            Some(s) => {
                self.put_i16::<T>(s.len() as i16);
                self.put_slice(s.as_bytes());
                Ok(())
            }
            None => {
                self.put_i16::<T>(-1);
                Ok(())
            }
        }
    }

    fn put_bytes<T, D>(&mut self, d: Option<D>) -> Result<()>
        where T: ByteOrder,
              D: AsRef<[u8]>
    {
        match d.as_ref().map(|d| d.as_ref()) {
            Some(d) if d.len() > i32::max_value() as usize => {
                bail!(ErrorKind::CodecError("bytes exceed the maximum size"))
            }
            Some(d) => {
                self.put_i32::<T>(d.len() as i32);
                self.put_slice(d);
                Ok(())
            }
            None => {
                self.put_i32::<T>(-1);
                Ok(())
            }
        }
    }

    fn put_array<T, E, F>(&mut self, items: &[E], mut callback: F) -> Result<()>
        where T: ByteOrder,
              F: FnMut(&mut Self, &E) -> Result<()>
    {
        if items.len() > i32::max_value() as usize {
            bail!(ErrorKind::CodecError("array exceeds the maximum size"))
        }

        self.put_i32::<T>(items.len() as i32);

        for item in items {
            callback(self, item)?;
        }

        Ok(())
    }
}

impl<B: BufMut> WriteExt for B {}

/// Reserve four bytes, write the child content, then backfill the
/// prefix with the number of bytes the child wrote.
pub fn with_length_prefix<T, F>(buf: &mut BytesMut, inner: F) -> Result<()>
    where T: ByteOrder,
          F: FnOnce(&mut BytesMut) -> Result<()>
{
    let prefix_off = buf.len();
    buf.put_i32::<T>(0);
    inner(buf)?;

    let size = buf.len() - prefix_off - mem::size_of::<i32>();
    if size > i32::max_value() as usize {
        bail!(ErrorKind::CodecError("length prefixed region exceeds the maximum size"))
    }
    T::write_i32(&mut buf[prefix_off..], size as i32);

    Ok(())
}

/// Reserve four bytes, write the child content, then backfill the
/// prefix with the IEEE CRC-32 of the child bytes.
pub fn with_crc_prefix<T, F>(buf: &mut BytesMut, inner: F) -> Result<()>
    where T: ByteOrder,
          F: FnOnce(&mut BytesMut) -> Result<()>
{
    let prefix_off = buf.len();
    buf.put_i32::<T>(0);
    let data_off = buf.len();
    inner(buf)?;

    let crc = crc32::checksum_ieee(&buf[data_off..]);
    T::write_i32(&mut buf[prefix_off..], crc as i32);

    Ok(())
}

pub fn read_i8(buf: &mut &[u8], what: &'static str) -> Result<i8> {
    if buf.is_empty() {
        bail!(ErrorKind::BufferUnderRun(what))
    }
    let v = buf[0] as i8;
    *buf = &buf[1..];
    Ok(v)
}

pub fn read_i16(buf: &mut &[u8], what: &'static str) -> Result<i16> {
    if buf.len() < mem::size_of::<i16>() {
        bail!(ErrorKind::BufferUnderRun(what))
    }
    let v = BigEndian::read_i16(buf);
    *buf = &buf[mem::size_of::<i16>()..];
    Ok(v)
}

pub fn read_i32(buf: &mut &[u8], what: &'static str) -> Result<i32> {
    if buf.len() < mem::size_of::<i32>() {
        bail!(ErrorKind::BufferUnderRun(what))
    }
    let v = BigEndian::read_i32(buf);
    *buf = &buf[mem::size_of::<i32>()..];
    Ok(v)
}

pub fn read_i64(buf: &mut &[u8], what: &'static str) -> Result<i64> {
    if buf.len() < mem::size_of::<i64>() {
        bail!(ErrorKind::BufferUnderRun(what))
    }
    let v = BigEndian::read_i64(buf);
    *buf = &buf[mem::size_of::<i64>()..];
    Ok(v)
}

pub fn read_exact<'a>(buf: &mut &'a [u8], len: usize, what: &'static str) -> Result<&'a [u8]> {
    if buf.len() < len {
        bail!(ErrorKind::BufferUnderRun(what))
    }
    let (taken, rest) = buf.split_at(len);
    *buf = rest;
    Ok(taken)
}

/// Read an int32 length prefixed byte slab; a negative or zero length
/// reads as `None`.
pub fn read_nullable_bytes<'a>(buf: &mut &'a [u8],
                               what: &'static str)
                               -> Result<Option<&'a [u8]>> {
    let len = read_i32(buf, what)?;
    if len <= 0 {
        Ok(None)
    } else {
        read_exact(buf, len as usize, what).map(Some)
    }
}

pub fn read_str<'a>(buf: &mut &'a [u8], what: &'static str) -> Result<&'a str> {
    let len = read_i16(buf, what)?;
    if len < 0 {
        bail!(ErrorKind::ParseError(NomErrorKind::Custom(ParseTag::String as u32)))
    }
    let raw = read_exact(buf, len as usize, what)?;
    str::from_utf8(raw)
        .map_err(|_| ErrorKind::ParseError(NomErrorKind::Custom(ParseTag::String as u32)).into())
}

#[cfg(test)]
mod tests {
    use bytes::BigEndian;
    use nom::{IResult, Needed};

    use super::*;

    #[test]
    fn test_parse_str() {
        assert_eq!(parse_str(b"\0"), IResult::Incomplete(Needed::Size(2)));
        assert_eq!(parse_str(b"\xff\xff"), IResult::Done(&b""[..], None));
        assert_eq!(parse_str(b"\0\0"), IResult::Done(&b""[..], None));
        assert_eq!(parse_str(b"\0\x04test"),
                   IResult::Done(&b""[..], Some(Cow::from("test"))));
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(parse_string(b"\0"), IResult::Incomplete(Needed::Size(2)));
        assert_eq!(parse_string(b"\0\0"), IResult::Done(&b""[..], String::new()));
        assert_eq!(parse_string(b"\0\x04test"),
                   IResult::Done(&b""[..], "test".to_owned()));

        if let IResult::Error(_) = parse_string(b"\xff\xff") {
        } else {
            panic!("null string should not parse as a string");
        }
    }

    #[test]
    fn test_parse_bytes() {
        assert_eq!(parse_bytes(b"\0"), IResult::Incomplete(Needed::Size(4)));
        assert_eq!(parse_bytes(b"\xff\xff\xff\xff"),
                   IResult::Done(&b""[..], None));
        assert_eq!(parse_bytes(b"\0\0\0\0"), IResult::Done(&b""[..], None));
        assert_eq!(parse_bytes(b"\0\0\0\x04test"),
                   IResult::Done(&b""[..], Some(Cow::from(&b"test"[..]))));
    }

    #[test]
    fn test_write_ext() {
        let mut buf = Vec::new();

        buf.put_str::<BigEndian, _>(Some("test")).unwrap();
        buf.put_str::<BigEndian, _>(None::<&str>).unwrap();
        buf.put_bytes::<BigEndian, _>(Some(&b"data"[..])).unwrap();
        buf.put_bytes::<BigEndian, _>(None::<&[u8]>).unwrap();
        buf.put_bool(true);
        buf.put_array::<BigEndian, _, _>(&[1i32, 2, 3], |buf, v| {
                Ok(buf.put_i32::<BigEndian>(*v))
            })
            .unwrap();

        assert_eq!(&buf[..],
                   &[0, 4, b't', b'e', b's', b't',
                     0xff, 0xff,
                     0, 0, 0, 4, b'd', b'a', b't', b'a',
                     0xff, 0xff, 0xff, 0xff,
                     1,
                     0, 0, 0, 3, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3][..]);
    }

    #[test]
    fn test_with_length_prefix() {
        let mut buf = BytesMut::with_capacity(16);

        with_length_prefix::<BigEndian, _>(&mut buf, |buf| {
                buf.put_slice(b"data");
                Ok(())
            })
            .unwrap();

        assert_eq!(&buf[..], &[0, 0, 0, 4, b'd', b'a', b't', b'a'][..]);
    }

    #[test]
    fn test_with_crc_prefix() {
        let mut buf = BytesMut::with_capacity(16);

        with_crc_prefix::<BigEndian, _>(&mut buf, |buf| {
                buf.put_slice(b"data");
                Ok(())
            })
            .unwrap();

        // IEEE CRC-32 of "data"
        assert_eq!(&buf[..], &[0xad, 0xf3, 0xf3, 0x63, b'd', b'a', b't', b'a'][..]);
    }

    #[test]
    fn test_read_primitives() {
        let data = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03,
                    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04];
        let mut buf = &data[..];

        assert_eq!(read_i8(&mut buf, "i8").unwrap(), 1);
        assert_eq!(read_i16(&mut buf, "i16").unwrap(), 2);
        assert_eq!(read_i32(&mut buf, "i32").unwrap(), 3);
        assert_eq!(read_i64(&mut buf, "i64").unwrap(), 4);
        assert!(buf.is_empty());

        let err = read_i32(&mut buf, "trailing").unwrap_err();
        if let ::errors::ErrorKind::BufferUnderRun(what) = *err.kind() {
            assert_eq!(what, "trailing");
        } else {
            panic!("unexpected error: {}", err);
        }
    }
}

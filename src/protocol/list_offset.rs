use std::borrow::Cow;

use bytes::{BufMut, ByteOrder, BytesMut};

use nom::{be_i16, be_i32, be_i64};

use errors::Result;
use protocol::{ApiVersion, Encodable, ErrorCode, Offset, ParseTag, PartitionId, RequestHeader,
               ResponseHeader, Timestamp, WriteExt, parse_response_header, parse_string};

/// The earliest available offset of a partition.
pub const EARLIEST_TIMESTAMP: Timestamp = -2;
/// The offset right after the latest message of a partition.
pub const LATEST_TIMESTAMP: Timestamp = -1;

/// The special positions a `ListOffsets` request may search for.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FetchOffset {
    Earliest,
    Latest,
    ByTime(Timestamp),
}

impl FetchOffset {
    pub fn timestamp(&self) -> Timestamp {
        match *self {
            FetchOffset::Earliest => EARLIEST_TIMESTAMP,
            FetchOffset::Latest => LATEST_TIMESTAMP,
            FetchOffset::ByTime(ts) => ts,
        }
    }
}

/// OffsetRequest => ReplicaId [TopicName [Partition Time MaxNumberOfOffsets]]
///   ReplicaId => int32
///   TopicName => string
///   Partition => int32
///   Time => int64
///   MaxNumberOfOffsets => int32
///
/// api version 1 drops `MaxNumberOfOffsets` and returns a single
/// offset per partition.
#[derive(Clone, Debug, PartialEq)]
pub struct ListOffsetRequest<'a> {
    pub header: RequestHeader<'a>,
    pub replica_id: i32,
    pub topics: Vec<ListTopic<'a>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListTopic<'a> {
    pub topic_name: Cow<'a, str>,
    pub partitions: Vec<ListPartition>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListPartition {
    pub partition: PartitionId,
    pub timestamp: Timestamp,
    pub max_number_of_offsets: i32,
}

impl<'a> Encodable for ListOffsetRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        let api_version = self.header.api_version;

        self.header.encode::<T>(dst)?;

        dst.put_i32::<T>(self.replica_id);
        dst.put_array::<T, _, _>(&self.topics, |buf, topic| {
            buf.put_str::<T, _>(Some(topic.topic_name.as_ref()))?;
            buf.put_array::<T, _, _>(&topic.partitions, |buf, partition| {
                buf.put_i32::<T>(partition.partition);
                buf.put_i64::<T>(partition.timestamp);
                if api_version < 1 {
                    buf.put_i32::<T>(partition.max_number_of_offsets);
                }
                Ok(())
            })
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListOffsetResponse {
    pub header: ResponseHeader,
    pub topics: Vec<ListTopicOffset>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListTopicOffset {
    pub topic_name: String,
    pub partitions: Vec<ListPartitionOffset>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListPartitionOffset {
    pub partition: PartitionId,
    pub error_code: ErrorCode,
    /// The log append time of the returned offset, api version 1 and up.
    pub timestamp: Option<Timestamp>,
    pub offsets: Vec<Offset>,
}

named_args!(pub parse_list_offset_response(api_version: ApiVersion)<ListOffsetResponse>,
    parse_tag!(ParseTag::ListOffsetsResponse,
        do_parse!(
            header: parse_response_header
         >> topics: length_count!(be_i32, apply!(parse_list_topic_offset, api_version))
         >> (ListOffsetResponse {
                header: header,
                topics: topics,
            })
        )
    )
);

named_args!(parse_list_topic_offset(api_version: ApiVersion)<ListTopicOffset>,
    parse_tag!(ParseTag::Topic,
        do_parse!(
            topic_name: parse_string
         >> partitions: length_count!(be_i32, apply!(parse_list_partition_offset, api_version))
         >> (ListTopicOffset {
                topic_name: topic_name,
                partitions: partitions,
            })
        )
    )
);

named_args!(parse_list_partition_offset(api_version: ApiVersion)<ListPartitionOffset>,
    parse_tag!(ParseTag::Partition,
        do_parse!(
            partition: be_i32
         >> error_code: be_i16
         >> timestamp: cond!(api_version > 0, be_i64)
         >> offsets: cond!(api_version < 1, length_count!(be_i32, be_i64))
         >> offset: cond!(api_version > 0, be_i64) // v1 returns a single offset
         >> (ListPartitionOffset {
                partition: partition,
                error_code: error_code,
                timestamp: timestamp,
                offsets: offsets.unwrap_or_else(|| offset.into_iter().collect()),
            })
        )
    )
);

#[cfg(test)]
mod tests {
    use bytes::BigEndian;

    use nom::IResult;

    use protocol::*;
    use super::*;

    #[test]
    fn test_fetch_offset_timestamps() {
        assert_eq!(FetchOffset::Earliest.timestamp(), -2);
        assert_eq!(FetchOffset::Latest.timestamp(), -1);
        assert_eq!(FetchOffset::ByTime(150).timestamp(), 150);
    }

    #[test]
    fn test_encode_list_offset_request_v0() {
        let req = ListOffsetRequest {
            header: RequestHeader {
                api_key: ApiKeys::ListOffsets as ApiKey,
                api_version: 0,
                correlation_id: 123,
                client_id: Some("client".into()),
            },
            replica_id: -1,
            topics: vec![ListTopic {
                             topic_name: "topic".into(),
                             partitions: vec![ListPartition {
                                                  partition: 1,
                                                  timestamp: LATEST_TIMESTAMP,
                                                  max_number_of_offsets: 16,
                                              }],
                         }],
        };

        let mut buf = BytesMut::with_capacity(128);

        req.encode::<BigEndian>(&mut buf).unwrap();

        assert_eq!(&buf[..],
                   &[0, 2, 0, 0, 0, 0, 0, 123,
                     0, 6, b'c', b'l', b'i', b'e', b'n', b't',
                     0xff, 0xff, 0xff, 0xff,                    // replica_id
                     0, 0, 0, 1,
                         0, 5, b't', b'o', b'p', b'i', b'c',
                         0, 0, 0, 1,
                             0, 0, 0, 1,                        // partition
                             0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
                             0, 0, 0, 16][..]);                 // max_number_of_offsets
    }

    #[test]
    fn test_encode_list_offset_request_v1() {
        let req = ListOffsetRequest {
            header: RequestHeader {
                api_key: ApiKeys::ListOffsets as ApiKey,
                api_version: 1,
                correlation_id: 123,
                client_id: None,
            },
            replica_id: -1,
            topics: vec![ListTopic {
                             topic_name: "t".into(),
                             partitions: vec![ListPartition {
                                                  partition: 0,
                                                  timestamp: EARLIEST_TIMESTAMP,
                                                  max_number_of_offsets: 1,
                                              }],
                         }],
        };

        let mut buf = BytesMut::with_capacity(64);

        req.encode::<BigEndian>(&mut buf).unwrap();

        // v1 drops the per-partition offset count
        assert_eq!(&buf[..],
                   &[0, 2, 0, 1, 0, 0, 0, 123, 0xff, 0xff,
                     0xff, 0xff, 0xff, 0xff,
                     0, 0, 0, 1,
                         0, 1, b't',
                         0, 0, 0, 1,
                             0, 0, 0, 0,
                             0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe][..]);
    }

    #[test]
    fn test_parse_list_offset_response_v0() {
        let data = [0, 0, 0, 123,
                    0, 0, 0, 1,
                        0, 1, b't',
                        0, 0, 0, 1,
                            0, 0, 0, 0,         // partition
                            0, 0,               // error_code
                            0, 0, 0, 2,         // offsets
                                0, 0, 0, 0, 0, 0, 0, 100,
                                0, 0, 0, 0, 0, 0, 0, 0];

        let res = ListOffsetResponse {
            header: ResponseHeader { correlation_id: 123 },
            topics: vec![ListTopicOffset {
                             topic_name: "t".to_owned(),
                             partitions: vec![ListPartitionOffset {
                                                  partition: 0,
                                                  error_code: 0,
                                                  timestamp: None,
                                                  offsets: vec![100, 0],
                                              }],
                         }],
        };

        assert_eq!(parse_list_offset_response(&data[..], 0),
                   IResult::Done(&b""[..], res));
    }

    #[test]
    fn test_parse_list_offset_response_v1() {
        let data = [0, 0, 0, 123,
                    0, 0, 0, 1,
                        0, 1, b't',
                        0, 0, 0, 1,
                            0, 0, 0, 0,                     // partition
                            0, 0,                           // error_code
                            0, 0, 0, 0, 0, 0, 1, 0,         // timestamp
                            0, 0, 0, 0, 0, 0, 0, 100];      // offset

        let res = ListOffsetResponse {
            header: ResponseHeader { correlation_id: 123 },
            topics: vec![ListTopicOffset {
                             topic_name: "t".to_owned(),
                             partitions: vec![ListPartitionOffset {
                                                  partition: 0,
                                                  error_code: 0,
                                                  timestamp: Some(256),
                                                  offsets: vec![100],
                                              }],
                         }],
        };

        assert_eq!(parse_list_offset_response(&data[..], 1),
                   IResult::Done(&b""[..], res));
    }
}

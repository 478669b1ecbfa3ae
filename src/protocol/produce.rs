use std::borrow::Cow;

use bytes::{BufMut, ByteOrder, BytesMut};

use nom::{be_i16, be_i32, be_i64};

use errors::Result;
use compression::Compression;
use protocol::{ApiVersion, Encodable, ErrorCode, MessageSet, MessageSetEncoder, Offset,
               ParseTag, PartitionId, RequestHeader, ResponseHeader, Timestamp, WriteExt,
               parse_response_header, parse_string, with_length_prefix};

/// ProduceRequest => RequiredAcks Timeout [TopicName [Partition MessageSetSize MessageSet]]
///   RequiredAcks => int16
///   Timeout => int32
///   Partition => int32
///   MessageSetSize => int32
#[derive(Clone, Debug, PartialEq)]
pub struct ProduceRequest<'a> {
    pub header: RequestHeader<'a>,
    pub required_acks: i16,
    /// The server-side time to await the required acknowledgements, in milliseconds.
    pub ack_timeout: i32,
    pub topics: Vec<ProduceTopicData<'a>>,
    pub compression: Compression,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProduceTopicData<'a> {
    pub topic_name: Cow<'a, str>,
    pub partitions: Vec<ProducePartitionData>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProducePartitionData {
    pub partition: PartitionId,
    pub message_set: MessageSet,
}

impl<'a> ProduceRequest<'a> {
    /// The message format version this request's api version carries.
    fn message_version(&self) -> ApiVersion {
        if self.header.api_version > 1 { 1 } else { 0 }
    }
}

impl<'a> Encodable for ProduceRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        let encoder = MessageSetEncoder::new(self.message_version(), self.compression);

        self.header.encode::<T>(dst)?;

        dst.put_i16::<T>(self.required_acks);
        dst.put_i32::<T>(self.ack_timeout);
        dst.put_array::<T, _, _>(&self.topics, |buf, topic| {
            buf.put_str::<T, _>(Some(topic.topic_name.as_ref()))?;
            buf.put_array::<T, _, _>(&topic.partitions, |buf, partition| {
                buf.put_i32::<T>(partition.partition);
                with_length_prefix::<T, _>(buf, |buf| {
                    encoder.encode::<T>(&partition.message_set, buf)
                })
            })
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProduceResponse {
    pub header: ResponseHeader,
    pub topics: Vec<ProduceTopicStatus>,
    /// Duration in milliseconds for which the request was throttled due to quota violation.
    pub throttle_time: Option<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProduceTopicStatus {
    pub topic_name: String,
    pub partitions: Vec<ProducePartitionStatus>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProducePartitionStatus {
    pub partition: PartitionId,
    pub error_code: ErrorCode,
    pub offset: Offset,
    pub timestamp: Option<Timestamp>,
}

named_args!(pub parse_produce_response(api_version: ApiVersion)<ProduceResponse>,
    parse_tag!(ParseTag::ProduceResponse,
        do_parse!(
            header: parse_response_header
         >> topics: length_count!(be_i32, apply!(parse_produce_topic_status, api_version))
         >> throttle_time: cond!(api_version > 0, be_i32)
         >> (ProduceResponse {
                header: header,
                topics: topics,
                throttle_time: throttle_time,
            })
        )
    )
);

named_args!(parse_produce_topic_status(api_version: ApiVersion)<ProduceTopicStatus>,
    parse_tag!(ParseTag::Topic,
        do_parse!(
            topic_name: parse_string
         >> partitions: length_count!(be_i32, apply!(parse_produce_partition_status, api_version))
         >> (ProduceTopicStatus {
                topic_name: topic_name,
                partitions: partitions,
            })
        )
    )
);

named_args!(parse_produce_partition_status(api_version: ApiVersion)<ProducePartitionStatus>,
    parse_tag!(ParseTag::Partition,
        do_parse!(
            partition: be_i32
         >> error_code: be_i16
         >> offset: be_i64
         >> timestamp: cond!(api_version > 1, be_i64)
         >> (ProducePartitionStatus {
                partition: partition,
                error_code: error_code,
                offset: offset,
                timestamp: timestamp,
            })
        )
    )
);

#[cfg(test)]
mod tests {
    use bytes::{BigEndian, Bytes};

    use nom::IResult;

    use protocol::*;
    use super::*;

    lazy_static!{
        static ref TEST_REQUEST_DATA: Vec<u8> = vec![
            // RequestHeader
            0, 0,                               // api_key
            0, 0,                               // api_version
            0, 0, 0, 123,                       // correlation_id
            0, 6, b'c', b'l', b'i', b'e', b'n', b't',
            255, 255,                           // required_acks
            0, 0, 0, 123,                       // ack_timeout
            // topics: [ProduceTopicData]
            0, 0, 0, 1,
                0, 5, b't', b'o', b'p', b'i', b'c',
                // partitions: [ProducePartitionData]
                0, 0, 0, 1,
                    0, 0, 0, 1,                 // partition
                    0, 0, 0, 34,                // message_set_size
                    // MessageSet
                    0, 0, 0, 0, 0, 0, 0, 0,     // offset
                    0, 0, 0, 22,                // size
                    35, 86, 193, 55,            // crc
                    0,                          // magic
                    0,                          // attributes
                    0, 0, 0, 3, b'k', b'e', b'y',
                    0, 0, 0, 5, b'v', b'a', b'l', b'u', b'e',
        ];

        // scenario: topic "t", partition 0, offset 100, no error
        static ref TEST_V0_RESPONSE_DATA: Vec<u8> = vec![
            0, 0, 0, 123,               // correlation_id
            0, 0, 0, 1,
                0, 1, b't',
                0, 0, 0, 1,
                    0, 0, 0, 0,         // partition
                    0, 0,               // error_code
                    0, 0, 0, 0, 0, 0, 0, 100,
        ];

        static ref TEST_V2_RESPONSE_DATA: Vec<u8> = vec![
            0, 0, 0, 123,               // correlation_id
            0, 0, 0, 1,
                0, 5, b't', b'o', b'p', b'i', b'c',
                0, 0, 0, 1,
                    0, 0, 0, 1,             // partition
                    0, 2,                   // error_code
                    0, 0, 0, 0, 0, 0, 0, 3, // offset
                    0, 0, 0, 0, 0, 0, 0, 4, // timestamp
            0, 0, 0, 5,                 // throttle_time
        ];
    }

    #[test]
    fn test_encode_produce_request() {
        let req = ProduceRequest {
            header: RequestHeader {
                api_key: ApiKeys::Produce as ApiKey,
                api_version: 0,
                correlation_id: 123,
                client_id: Some("client".into()),
            },
            required_acks: RequiredAcks::All as i16,
            ack_timeout: 123,
            topics: vec![ProduceTopicData {
                             topic_name: "topic".into(),
                             partitions: vec![ProducePartitionData {
                                                  partition: 1,
                                                  message_set: MessageSet {
                                                      messages: vec![Message {
                                                                         offset: 0,
                                                                         timestamp: None,
                                                                         compression:
                                                                             Compression::None,
                                                                         key: Some(Bytes::from(&b"key"[..])),
                                                                         value: Some(Bytes::from(&b"value"[..])),
                                                                     }],
                                                  },
                                              }],
                         }],
            compression: Compression::None,
        };

        let mut buf = BytesMut::with_capacity(128);

        req.encode::<BigEndian>(&mut buf).unwrap();

        assert_eq!(&buf[..], &TEST_REQUEST_DATA[..]);
    }

    #[test]
    fn test_parse_produce_response_v0() {
        let res = ProduceResponse {
            header: ResponseHeader { correlation_id: 123 },
            topics: vec![ProduceTopicStatus {
                             topic_name: "t".to_owned(),
                             partitions: vec![ProducePartitionStatus {
                                                  partition: 0,
                                                  error_code: 0,
                                                  offset: 100,
                                                  timestamp: None,
                                              }],
                         }],
            throttle_time: None,
        };

        assert_eq!(parse_produce_response(TEST_V0_RESPONSE_DATA.as_slice(), 0),
                   IResult::Done(&b""[..], res));
    }

    #[test]
    fn test_parse_produce_response_v2() {
        let res = ProduceResponse {
            header: ResponseHeader { correlation_id: 123 },
            topics: vec![ProduceTopicStatus {
                             topic_name: "topic".to_owned(),
                             partitions: vec![ProducePartitionStatus {
                                                  partition: 1,
                                                  error_code: 2,
                                                  offset: 3,
                                                  timestamp: Some(4),
                                              }],
                         }],
            throttle_time: Some(5),
        };

        assert_eq!(parse_produce_response(TEST_V2_RESPONSE_DATA.as_slice(), 2),
                   IResult::Done(&b""[..], res));
    }
}

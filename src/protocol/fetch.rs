use std::borrow::Cow;

use bytes::{BufMut, ByteOrder, BytesMut};

use errors::Result;
use protocol::{ApiVersion, CorrelationId, Encodable, ErrorCode, MessageSet, Offset, PartitionId,
               RequestHeader, ResponseHeader, WriteExt, decode_message_set, read_i16, read_i32,
               read_i64, read_exact, read_str};

/// The replica id of a normal consumer.
pub const CONSUMER_REPLICA_ID: i32 = -1;

/// FetchRequest => ReplicaId MaxWaitTime MinBytes [TopicName [Partition FetchOffset MaxBytes]]
///   ReplicaId => int32
///   MaxWaitTime => int32
///   MinBytes => int32
///   TopicName => string
///   Partition => int32
///   FetchOffset => int64
///   MaxBytes => int32
#[derive(Clone, Debug, PartialEq)]
pub struct FetchRequest<'a> {
    pub header: RequestHeader<'a>,
    /// The replica id indicates the node id of the replica initiating this request.
    pub replica_id: i32,
    /// The maximum amount of time in milliseconds to block waiting if insufficient data is available at the time the request is issued.
    pub max_wait_time: i32,
    /// This is the minimum number of bytes of messages that must be available to give a response.
    pub min_bytes: i32,
    pub topics: Vec<FetchTopic<'a>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchTopic<'a> {
    /// The name of the topic.
    pub topic_name: Cow<'a, str>,
    pub partitions: Vec<FetchPartition>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchPartition {
    /// The id of the partition the fetch is for.
    pub partition: PartitionId,
    /// The offset to begin this fetch from.
    pub fetch_offset: Offset,
    /// The maximum bytes to include in the message set for this partition.
    pub max_bytes: i32,
}

impl<'a> Encodable for FetchRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;

        dst.put_i32::<T>(self.replica_id);
        dst.put_i32::<T>(self.max_wait_time);
        dst.put_i32::<T>(self.min_bytes);
        dst.put_array::<T, _, _>(&self.topics, |buf, topic| {
            buf.put_str::<T, _>(Some(topic.topic_name.as_ref()))?;
            buf.put_array::<T, _, _>(&topic.partitions, |buf, partition| {
                buf.put_i32::<T>(partition.partition);
                buf.put_i64::<T>(partition.fetch_offset);
                buf.put_i32::<T>(partition.max_bytes);
                Ok(())
            })
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchResponse {
    pub header: ResponseHeader,
    /// Duration in milliseconds for which the request was throttled due to quota violation.
    pub throttle_time: Option<i32>,
    pub topics: Vec<FetchTopicData>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchTopicData {
    /// The name of the topic this response entry is for.
    pub topic_name: String,
    pub partitions: Vec<FetchPartitionData>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchPartitionData {
    /// The id of the partition the fetch is for.
    pub partition: PartitionId,
    pub error_code: ErrorCode,
    /// The offset at the end of the log for this partition.
    pub highwater_mark_offset: Offset,
    pub message_set: MessageSet,
}

/// Decode a fetch response.
///
/// The message set bytes of every partition are decoded tolerantly:
/// the broker truncates sets at the fetch size boundary, so a partial
/// trailing message is discarded rather than failing the decode.
pub fn decode_fetch_response(buf: &[u8], api_version: ApiVersion) -> Result<FetchResponse> {
    let mut cur = buf;

    let correlation_id: CorrelationId = read_i32(&mut cur, "correlation id")?;
    let throttle_time = if api_version > 0 {
        Some(read_i32(&mut cur, "throttle time")?)
    } else {
        None
    };

    let topic_count = read_i32(&mut cur, "topic count")?;
    let mut topics = Vec::with_capacity(topic_count as usize);

    for _ in 0..topic_count {
        let topic_name = read_str(&mut cur, "topic name")?.to_owned();

        let partition_count = read_i32(&mut cur, "partition count")?;
        let mut partitions = Vec::with_capacity(partition_count as usize);

        for _ in 0..partition_count {
            let partition = read_i32(&mut cur, "partition id")?;
            let error_code = read_i16(&mut cur, "partition error code")?;
            let highwater_mark_offset = read_i64(&mut cur, "high water mark")?;

            let size = read_i32(&mut cur, "message set size")?;
            let message_set = if size <= 0 {
                MessageSet::default()
            } else {
                let raw = read_exact(&mut cur, size as usize, "message set")?;

                decode_message_set(raw, false)?
            };

            partitions.push(FetchPartitionData {
                                partition: partition,
                                error_code: error_code,
                                highwater_mark_offset: highwater_mark_offset,
                                message_set: message_set,
                            });
        }

        topics.push(FetchTopicData {
                        topic_name: topic_name,
                        partitions: partitions,
                    });
    }

    Ok(FetchResponse {
           header: ResponseHeader { correlation_id: correlation_id },
           throttle_time: throttle_time,
           topics: topics,
       })
}

#[cfg(test)]
mod tests {
    use bytes::{BigEndian, Bytes};

    use compression::Compression;
    use protocol::*;
    use super::*;

    lazy_static!{
        static ref TEST_REQUEST_DATA: Vec<u8> = vec![
            // RequestHeader
            0, 1,                               // api_key
            0, 0,                               // api_version
            0, 0, 0, 123,                       // correlation_id
            0, 6, b'c', b'l', b'i', b'e', b'n', b't',
            0xff, 0xff, 0xff, 0xff,             // replica_id
            0, 0, 0, 100,                       // max_wait_time
            0, 0, 0, 1,                         // min_bytes
            // topics: [FetchTopic]
            0, 0, 0, 1,
                0, 5, b't', b'o', b'p', b'i', b'c',
                0, 0, 0, 1,
                    0, 0, 0, 5,                 // partition
                    0, 0, 0, 0, 0, 0, 1, 0,     // fetch_offset
                    0, 1, 0, 0,                 // max_bytes
        ];

        static ref TEST_MESSAGE_SET_DATA: Vec<u8> = vec![
            0, 0, 0, 0, 0, 0, 0, 5,     // offset
            0, 0, 0, 16,                // size
            0xfd, 0x6e, 0xbd, 0xdb,     // crc
            0,                          // magic
            0,                          // attributes
            0xff, 0xff, 0xff, 0xff,     // key
            0, 0, 0, 2, b'h', b'i',     // value
        ];
    }

    fn response_data(message_set: &[u8], declared: i32) -> Vec<u8> {
        let mut data = vec![0, 0, 0, 123];          // correlation_id
        data.extend_from_slice(&[0, 0, 0, 1,        // topics
                                 0, 1, b't',
                                 0, 0, 0, 1,        // partitions
                                 0, 0, 0, 0,        // partition
                                 0, 0,              // error_code
                                 0, 0, 0, 0, 0, 0, 0, 42]);
        data.extend_from_slice(&[(declared >> 24) as u8,
                                 (declared >> 16) as u8,
                                 (declared >> 8) as u8,
                                 declared as u8]);
        data.extend_from_slice(message_set);
        data
    }

    #[test]
    fn test_encode_fetch_request() {
        let req = FetchRequest {
            header: RequestHeader {
                api_key: ApiKeys::Fetch as ApiKey,
                api_version: 0,
                correlation_id: 123,
                client_id: Some("client".into()),
            },
            replica_id: CONSUMER_REPLICA_ID,
            max_wait_time: 100,
            min_bytes: 1,
            topics: vec![FetchTopic {
                             topic_name: "topic".into(),
                             partitions: vec![FetchPartition {
                                                  partition: 5,
                                                  fetch_offset: 256,
                                                  max_bytes: 65536,
                                              }],
                         }],
        };

        let mut buf = BytesMut::with_capacity(128);

        req.encode::<BigEndian>(&mut buf).unwrap();

        assert_eq!(&buf[..], &TEST_REQUEST_DATA[..]);
    }

    #[test]
    fn test_decode_fetch_response() {
        let data = response_data(&TEST_MESSAGE_SET_DATA[..], TEST_MESSAGE_SET_DATA.len() as i32);

        let res = decode_fetch_response(&data, 0).unwrap();

        assert_eq!(res.header.correlation_id, 123);
        assert_eq!(res.throttle_time, None);
        assert_eq!(res.topics.len(), 1);

        let topic = &res.topics[0];
        assert_eq!(topic.topic_name, "t");

        let partition = &topic.partitions[0];
        assert_eq!(partition.partition, 0);
        assert_eq!(partition.error_code, 0);
        assert_eq!(partition.highwater_mark_offset, 42);
        assert_eq!(partition.message_set.messages,
                   vec![Message {
                            offset: 5,
                            timestamp: None,
                            compression: Compression::None,
                            key: None,
                            value: Some(Bytes::from(&b"hi"[..])),
                        }]);
    }

    #[test]
    fn test_decode_fetch_response_with_truncated_tail() {
        // the broker cut the set in the middle of the message
        let truncated = &TEST_MESSAGE_SET_DATA[..TEST_MESSAGE_SET_DATA.len() - 4];
        let data = response_data(truncated, truncated.len() as i32);

        let res = decode_fetch_response(&data, 0).unwrap();

        assert!(res.topics[0].partitions[0].message_set.messages.is_empty());
    }

    #[test]
    fn test_decode_fetch_response_throttle_time() {
        let mut data = vec![0, 0, 0, 123,   // correlation_id
                            0, 0, 0, 9];    // throttle_time
        data.extend_from_slice(&[0, 0, 0, 0]); // topics

        let res = decode_fetch_response(&data, 1).unwrap();

        assert_eq!(res.throttle_time, Some(9));
        assert!(res.topics.is_empty());
    }

    #[test]
    fn test_decode_fetch_response_under_run() {
        // declared message set size exceeds the frame
        let data = response_data(&TEST_MESSAGE_SET_DATA[..],
                                 TEST_MESSAGE_SET_DATA.len() as i32 + 8);

        let err = decode_fetch_response(&data, 0).unwrap_err();

        if let ::errors::ErrorKind::BufferUnderRun(_) = *err.kind() {
        } else {
            panic!("unexpected error: {}", err);
        }
    }
}

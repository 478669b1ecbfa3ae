use std::borrow::Cow;

use bytes::{BufMut, ByteOrder, BytesMut};

use nom::{be_i16, be_i32, be_i64};

use errors::Result;
use protocol::{Encodable, ErrorCode, Offset, ParseTag, PartitionId, RequestHeader,
               ResponseHeader, WriteExt, parse_response_header, parse_str, parse_string};

/// OffsetFetchRequest => ConsumerGroup [TopicName [Partition]]
///   ConsumerGroup => string
///   TopicName => string
///   Partition => int32
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetFetchRequest<'a> {
    pub header: RequestHeader<'a>,
    pub group_id: Cow<'a, str>,
    pub topics: Vec<FetchCommitTopic<'a>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchCommitTopic<'a> {
    pub topic_name: Cow<'a, str>,
    pub partitions: Vec<PartitionId>,
}

impl<'a> Encodable for OffsetFetchRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;

        dst.put_str::<T, _>(Some(self.group_id.as_ref()))?;
        dst.put_array::<T, _, _>(&self.topics, |buf, topic| {
            buf.put_str::<T, _>(Some(topic.topic_name.as_ref()))?;
            buf.put_array::<T, _, _>(&topic.partitions, |buf, partition| {
                buf.put_i32::<T>(*partition);
                Ok(())
            })
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetFetchResponse {
    pub header: ResponseHeader,
    pub topics: Vec<FetchCommitTopicStatus>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchCommitTopicStatus {
    pub topic_name: String,
    pub partitions: Vec<FetchCommitPartitionStatus>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchCommitPartitionStatus {
    pub partition: PartitionId,
    /// The committed offset, or -1 when the group holds none.
    pub offset: Offset,
    pub metadata: Option<String>,
    pub error_code: ErrorCode,
}

named!(pub parse_offset_fetch_response<OffsetFetchResponse>,
    parse_tag!(ParseTag::OffsetFetchResponse,
        do_parse!(
            header: parse_response_header
         >> topics: length_count!(be_i32, parse_fetch_commit_topic_status)
         >> (OffsetFetchResponse {
                header: header,
                topics: topics,
            })
        )
    )
);

named!(parse_fetch_commit_topic_status<FetchCommitTopicStatus>,
    parse_tag!(ParseTag::Topic,
        do_parse!(
            topic_name: parse_string
         >> partitions: length_count!(be_i32, parse_fetch_commit_partition_status)
         >> (FetchCommitTopicStatus {
                topic_name: topic_name,
                partitions: partitions,
            })
        )
    )
);

named!(parse_fetch_commit_partition_status<FetchCommitPartitionStatus>,
    parse_tag!(ParseTag::Partition,
        do_parse!(
            partition: be_i32
         >> offset: be_i64
         >> metadata: parse_str
         >> error_code: be_i16
         >> (FetchCommitPartitionStatus {
                partition: partition,
                offset: offset,
                metadata: metadata.map(|s| s.into_owned()),
                error_code: error_code,
            })
        )
    )
);

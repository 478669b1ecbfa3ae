use std::borrow::Cow;

use bytes::{BufMut, ByteOrder, BytesMut};

use nom::{be_i16, be_i32};

use errors::Result;
use protocol::{ApiVersion, Encodable, ErrorCode, GenerationId, Offset, ParseTag, PartitionId,
               RequestHeader, ResponseHeader, Timestamp, WriteExt, parse_response_header,
               parse_string};

/// The default retention of a committed offset, letting the broker
/// apply its own retention time.
pub const DEFAULT_RETENTION_TIME: i64 = -1;

/// OffsetCommitRequest => ConsumerGroupId [TopicName [Partition Offset Metadata]]
///
/// api version 1 adds the group generation id, the member id and a
/// per-partition commit timestamp; api version 2 replaces the
/// timestamp with a request-level retention time.
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetCommitRequest<'a> {
    pub header: RequestHeader<'a>,
    pub group_id: Cow<'a, str>,
    pub group_generation_id: GenerationId,
    pub member_id: Cow<'a, str>,
    pub retention_time: i64,
    pub topics: Vec<CommitTopic<'a>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommitTopic<'a> {
    pub topic_name: Cow<'a, str>,
    pub partitions: Vec<CommitPartition<'a>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommitPartition<'a> {
    pub partition: PartitionId,
    pub offset: Offset,
    /// The commit timestamp, only carried by api version 1.
    pub timestamp: Timestamp,
    pub metadata: Option<Cow<'a, str>>,
}

impl<'a> Encodable for OffsetCommitRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        let api_version = self.header.api_version;

        self.header.encode::<T>(dst)?;

        dst.put_str::<T, _>(Some(self.group_id.as_ref()))?;

        if api_version > 0 {
            dst.put_i32::<T>(self.group_generation_id);
            dst.put_str::<T, _>(Some(self.member_id.as_ref()))?;
        }

        if api_version > 1 {
            dst.put_i64::<T>(self.retention_time);
        }

        dst.put_array::<T, _, _>(&self.topics, |buf, topic| {
            buf.put_str::<T, _>(Some(topic.topic_name.as_ref()))?;
            buf.put_array::<T, _, _>(&topic.partitions, |buf, partition| {
                buf.put_i32::<T>(partition.partition);
                buf.put_i64::<T>(partition.offset);
                if api_version == 1 {
                    buf.put_i64::<T>(partition.timestamp);
                }
                buf.put_str::<T, _>(partition.metadata.as_ref())
            })
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetCommitResponse {
    pub header: ResponseHeader,
    pub topics: Vec<CommitTopicStatus>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommitTopicStatus {
    pub topic_name: String,
    pub partitions: Vec<CommitPartitionStatus>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommitPartitionStatus {
    pub partition: PartitionId,
    pub error_code: ErrorCode,
}

named!(pub parse_offset_commit_response<OffsetCommitResponse>,
    parse_tag!(ParseTag::OffsetCommitResponse,
        do_parse!(
            header: parse_response_header
         >> topics: length_count!(be_i32, parse_commit_topic_status)
         >> (OffsetCommitResponse {
                header: header,
                topics: topics,
            })
        )
    )
);

named!(parse_commit_topic_status<CommitTopicStatus>,
    parse_tag!(ParseTag::Topic,
        do_parse!(
            topic_name: parse_string
         >> partitions: length_count!(be_i32, parse_commit_partition_status)
         >> (CommitTopicStatus {
                topic_name: topic_name,
                partitions: partitions,
            })
        )
    )
);

named!(parse_commit_partition_status<CommitPartitionStatus>,
    parse_tag!(ParseTag::Partition,
        do_parse!(
            partition: be_i32
         >> error_code: be_i16
         >> (CommitPartitionStatus {
                partition: partition,
                error_code: error_code,
            })
        )
    )
);

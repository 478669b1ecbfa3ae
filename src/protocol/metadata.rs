use std::borrow::Cow;

use bytes::{ByteOrder, BytesMut};

use nom::{be_i16, be_i32};

use errors::Result;
use protocol::{Encodable, ErrorCode, NodeId, ParseTag, PartitionId, RequestHeader,
               ResponseHeader, WriteExt, parse_response_header, parse_string};

/// TopicMetadataRequest => [TopicName]
///   TopicName => string
///
/// An empty topic list asks for the metadata of all topics.
#[derive(Clone, Debug, PartialEq)]
pub struct MetadataRequest<'a> {
    pub header: RequestHeader<'a>,
    pub topic_names: Vec<Cow<'a, str>>,
}

impl<'a> Encodable for MetadataRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;

        dst.put_array::<T, _, _>(&self.topic_names, |buf, topic_name| {
            buf.put_str::<T, _>(Some(topic_name.as_ref()))
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetadataResponse {
    pub header: ResponseHeader,
    pub brokers: Vec<BrokerMetadata>,
    pub topics: Vec<TopicMetadata>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BrokerMetadata {
    pub node_id: NodeId,
    pub host: String,
    pub port: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TopicMetadata {
    pub error_code: ErrorCode,
    pub topic_name: String,
    pub partitions: Vec<PartitionMetadata>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PartitionMetadata {
    pub error_code: ErrorCode,
    pub partition: PartitionId,
    pub leader: NodeId,
    pub replicas: Vec<NodeId>,
    pub isr: Vec<NodeId>,
}

named!(pub parse_metadata_response<MetadataResponse>,
    parse_tag!(ParseTag::MetadataResponse,
        do_parse!(
            header: parse_response_header
         >> brokers: length_count!(be_i32, parse_broker_metadata)
         >> topics: length_count!(be_i32, parse_topic_metadata)
         >> (MetadataResponse {
                header: header,
                brokers: brokers,
                topics: topics,
            })
        )
    )
);

named!(parse_broker_metadata<BrokerMetadata>,
    parse_tag!(ParseTag::Broker,
        do_parse!(
            node_id: be_i32
         >> host: parse_string
         >> port: be_i32
         >> (BrokerMetadata {
                node_id: node_id,
                host: host,
                port: port,
            })
        )
    )
);

named!(parse_topic_metadata<TopicMetadata>,
    parse_tag!(ParseTag::Topic,
        do_parse!(
            error_code: be_i16
         >> topic_name: parse_string
         >> partitions: length_count!(be_i32, parse_partition_metadata)
         >> (TopicMetadata {
                error_code: error_code,
                topic_name: topic_name,
                partitions: partitions,
            })
        )
    )
);

named!(parse_partition_metadata<PartitionMetadata>,
    parse_tag!(ParseTag::Partition,
        do_parse!(
            error_code: be_i16
         >> partition: be_i32
         >> leader: be_i32
         >> replicas: length_count!(be_i32, be_i32)
         >> isr: length_count!(be_i32, be_i32)
         >> (PartitionMetadata {
                error_code: error_code,
                partition: partition,
                leader: leader,
                replicas: replicas,
                isr: isr,
            })
        )
    )
);

use std::borrow::Cow;

use bytes::{BufMut, ByteOrder, BytesMut};

use nom::{be_i16, be_i32};

use errors::Result;
use protocol::{Encodable, ErrorCode, NodeId, ParseTag, PartitionId, RequestHeader,
               ResponseHeader, WriteExt, parse_response_header, parse_string};

/// StopReplicaRequest => ControllerId ControllerEpoch DeletePartitions [Topic Partition]
///
/// A broker-to-broker API, supported for protocol completeness.
#[derive(Clone, Debug, PartialEq)]
pub struct StopReplicaRequest<'a> {
    pub header: RequestHeader<'a>,
    pub controller_id: NodeId,
    pub controller_epoch: i32,
    pub delete_partitions: bool,
    pub partitions: Vec<StopReplicaPartition<'a>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StopReplicaPartition<'a> {
    pub topic_name: Cow<'a, str>,
    pub partition: PartitionId,
}

impl<'a> Encodable for StopReplicaRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;

        dst.put_i32::<T>(self.controller_id);
        dst.put_i32::<T>(self.controller_epoch);
        dst.put_bool(self.delete_partitions);
        dst.put_array::<T, _, _>(&self.partitions, |buf, partition| {
            buf.put_str::<T, _>(Some(partition.topic_name.as_ref()))?;
            buf.put_i32::<T>(partition.partition);
            Ok(())
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StopReplicaResponse {
    pub header: ResponseHeader,
    pub error_code: ErrorCode,
    pub partitions: Vec<StopReplicaPartitionStatus>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StopReplicaPartitionStatus {
    pub topic_name: String,
    pub partition: PartitionId,
    pub error_code: ErrorCode,
}

named!(pub parse_stop_replica_response<StopReplicaResponse>,
    parse_tag!(ParseTag::StopReplicaResponse,
        do_parse!(
            header: parse_response_header
         >> error_code: be_i16
         >> partitions: length_count!(be_i32, parse_stop_replica_partition_status)
         >> (StopReplicaResponse {
                header: header,
                error_code: error_code,
                partitions: partitions,
            })
        )
    )
);

named!(parse_stop_replica_partition_status<StopReplicaPartitionStatus>,
    parse_tag!(ParseTag::Partition,
        do_parse!(
            topic_name: parse_string
         >> partition: be_i32
         >> error_code: be_i16
         >> (StopReplicaPartitionStatus {
                topic_name: topic_name,
                partition: partition,
                error_code: error_code,
            })
        )
    )
);

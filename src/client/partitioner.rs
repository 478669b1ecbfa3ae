use std::cell::Cell;
use std::hash::Hasher;

use twox_hash::XxHash;

use client::{Cluster, Metadata};
use protocol::PartitionId;

/// Picks the partition a keyed (or unkeyed) record should go to.
pub trait Partitioner {
    /// `None` when the topic is unknown or none of its partitions has
    /// a leader.
    fn partition(&self,
                 topic_name: &str,
                 key: Option<&[u8]>,
                 metadata: &Metadata)
                 -> Option<PartitionId>;
}

/// Hashes the key over the partitions that currently have a leader;
/// keyless records round robin over the same set.
pub struct DefaultPartitioner {
    hash_seed: u64,
    next: Cell<usize>,
}

impl Default for DefaultPartitioner {
    fn default() -> Self {
        DefaultPartitioner {
            hash_seed: 0,
            next: Cell::new(0),
        }
    }
}

impl DefaultPartitioner {
    pub fn with_hash_seed(hash_seed: u64) -> Self {
        DefaultPartitioner {
            hash_seed: hash_seed,
            next: Cell::new(0),
        }
    }
}

impl Partitioner for DefaultPartitioner {
    fn partition(&self,
                 topic_name: &str,
                 key: Option<&[u8]>,
                 metadata: &Metadata)
                 -> Option<PartitionId> {
        let partitions = match metadata.partitions_for(topic_name) {
            Some(partitions) => partitions,
            None => return None,
        };

        let available = partitions.available_partitions();

        if available.is_empty() {
            return None;
        }

        let index = match key {
            Some(key) => {
                let mut hasher = XxHash::with_seed(self.hash_seed);
                hasher.write(key);
                (hasher.finish() % available.len() as u64) as usize
            }
            None => {
                let next = self.next.get();
                self.next.set(next.wrapping_add(1));
                next % available.len()
            }
        };

        Some(available[index].partition)
    }
}

#[cfg(test)]
mod tests {
    use protocol::{BrokerMetadata, MetadataResponse, PartitionMetadata, ResponseHeader,
                   TopicMetadata};
    use super::*;

    fn metadata() -> Metadata {
        Metadata::from_response(&MetadataResponse {
                header: ResponseHeader { correlation_id: 0 },
                brokers: vec![BrokerMetadata {
                                  node_id: 1,
                                  host: "127.0.0.1".to_owned(),
                                  port: 9092,
                              }],
                topics: vec![TopicMetadata {
                                 error_code: 0,
                                 topic_name: "t".to_owned(),
                                 partitions: vec![partition(0, 1),
                                                  partition(1, 1),
                                                  partition(2, -1)],
                             }],
            })
            .unwrap()
    }

    fn partition(id: i32, leader: i32) -> PartitionMetadata {
        PartitionMetadata {
            error_code: 0,
            partition: id,
            leader: leader,
            replicas: vec![1],
            isr: vec![1],
        }
    }

    #[test]
    fn test_keyed_partitioning_is_deterministic() {
        let metadata = metadata();
        let partitioner = DefaultPartitioner::default();

        let first = partitioner.partition("t", Some(b"key"), &metadata).unwrap();
        let second = partitioner.partition("t", Some(b"key"), &metadata).unwrap();

        assert_eq!(first, second);

        // the electing partition is never picked
        assert!(first < 2);
    }

    #[test]
    fn test_keyless_partitioning_round_robins() {
        let metadata = metadata();
        let partitioner = DefaultPartitioner::default();

        let picks: Vec<_> = (0..4)
            .map(|_| partitioner.partition("t", None, &metadata).unwrap())
            .collect();

        assert_eq!(picks, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_unknown_topic_has_no_partition() {
        let metadata = metadata();
        let partitioner = DefaultPartitioner::default();

        assert_eq!(partitioner.partition("unknown", None, &metadata), None);
    }
}

use std::collections::HashMap;
use std::time::{Duration, Instant};

use errors::{ErrorKind, KafkaCode, Result};
use client::{Broker, BrokerRef, Cluster, PartitionInfo};
use network::{Endpoint, TopicPartition};
use protocol::{MetadataResponse, PartitionId, UsableApiVersions};

/// An immutable snapshot of the cluster topology.
///
/// Snapshots are replaced wholesale on refresh; readers keep whatever
/// snapshot they loaded and never observe a half-updated topology.
#[derive(Clone, Debug)]
pub struct Metadata {
    brokers: Vec<Broker>,
    topics: HashMap<String, TopicPartitions>,
    fetched_at: Instant,
}

/// The partitions of one topic, ordered by partition id.
#[derive(Clone, Debug, PartialEq)]
pub struct TopicPartitions {
    partitions: Vec<PartitionInfo>,
}

impl TopicPartitions {
    pub fn new(partitions: Vec<PartitionInfo>) -> Self {
        TopicPartitions { partitions: partitions }
    }

    pub fn partitions(&self) -> &[PartitionInfo] {
        &self.partitions
    }

    pub fn partition(&self, partition: PartitionId) -> Option<&PartitionInfo> {
        self.partitions
            .iter()
            .find(|info| info.partition == partition)
    }

    /// The partitions that currently have a leader.
    pub fn available_partitions(&self) -> Vec<&PartitionInfo> {
        self.partitions
            .iter()
            .filter(|info| info.leader.is_some())
            .collect()
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata {
            brokers: Vec::new(),
            topics: HashMap::new(),
            fetched_at: Instant::now(),
        }
    }
}

impl Metadata {
    /// Validate a metadata response and turn it into a snapshot.
    ///
    /// A broker that has not been assigned its id yet, or a topic the
    /// cluster is still loading, fails with a retriable error so the
    /// refresh loop tries again; an unresolvable broker address is a
    /// validation failure. A partition whose leader is still being
    /// elected is kept with no leader, and routing to it reports the
    /// cached metadata as incomplete.
    pub fn from_response(response: &MetadataResponse) -> Result<Metadata> {
        let mut brokers = Vec::with_capacity(response.brokers.len());

        for broker in &response.brokers {
            if broker.node_id < 0 {
                bail!(ErrorKind::KafkaError(KafkaCode::BrokerNotAvailable))
            }

            if broker.host.is_empty() || broker.port <= 0 || broker.port > i32::from(u16::max_value()) {
                bail!(ErrorKind::ValidationError(format!("broker #{} has an invalid address \
                                                          `{}:{}`",
                                                         broker.node_id,
                                                         broker.host,
                                                         broker.port)))
            }

            let endpoint = Endpoint::resolve(&broker.host, broker.port as u16)
                .map_err(|err| {
                             ErrorKind::ValidationError(format!("broker #{} address `{}:{}` \
                                                                 does not resolve, {}",
                                                                broker.node_id,
                                                                broker.host,
                                                                broker.port,
                                                                err))
                         })?;

            brokers.push(Broker::new(broker.node_id, endpoint));
        }

        let mut topics = HashMap::with_capacity(response.topics.len());

        for topic in &response.topics {
            // LeaderNotAvailable, GroupLoadInProgress and
            // GroupCoordinatorNotAvailable are retriable, the refresh
            // loop backs off and asks again; other codes surface
            let code = KafkaCode::from(topic.error_code);
            if code != KafkaCode::None {
                bail!(ErrorKind::KafkaError(code))
            }

            let mut partitions = Vec::with_capacity(topic.partitions.len());

            for partition in &topic.partitions {
                let electing = partition.leader < 0 ||
                               KafkaCode::from(partition.error_code) ==
                               KafkaCode::LeaderNotAvailable;

                if electing {
                    debug!("partition {}#{} has no leader yet",
                           topic.topic_name,
                           partition.partition);
                }

                partitions.push(PartitionInfo {
                                    partition: partition.partition,
                                    leader: if electing {
                                        None
                                    } else {
                                        Some(BrokerRef::new(partition.leader))
                                    },
                                    replicas: partition
                                        .replicas
                                        .iter()
                                        .map(|node| BrokerRef::new(*node))
                                        .collect(),
                                    in_sync_replicas: partition
                                        .isr
                                        .iter()
                                        .map(|node| BrokerRef::new(*node))
                                        .collect(),
                                });
            }

            partitions.sort_by_key(|info| info.partition);

            topics
                .insert(topic.topic_name.clone(),
                        TopicPartitions::new(partitions));
        }

        Ok(Metadata {
               brokers: brokers,
               topics: topics,
               fetched_at: Instant::now(),
           })
    }

    /// Fold a topic-scoped refresh into this snapshot, yielding a new
    /// snapshot; the broker list always comes from the newer response.
    pub fn merge(&self, newer: Metadata) -> Metadata {
        let mut topics = self.topics.clone();

        for (topic_name, partitions) in newer.topics {
            topics.insert(topic_name, partitions);
        }

        Metadata {
            brokers: newer.brokers,
            topics: topics,
            fetched_at: newer.fetched_at,
        }
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    pub fn contains_topic(&self, topic_name: &str) -> bool {
        self.topics.contains_key(topic_name)
    }

    pub fn topics(&self) -> &HashMap<String, TopicPartitions> {
        &self.topics
    }

    /// Replace the per-broker api versions with probed values.
    pub fn with_api_versions(&self, api_versions: &HashMap<BrokerRef, UsableApiVersions>)
                             -> Metadata {
        Metadata {
            brokers: self.brokers
                .iter()
                .map(|broker| {
                         broker.with_api_versions(api_versions.get(&broker.as_ref()).cloned())
                     })
                .collect(),
            topics: self.topics.clone(),
            fetched_at: self.fetched_at,
        }
    }

    /// Assume the same fallback versions for every broker.
    pub fn with_fallback_api_versions(&self, api_versions: &UsableApiVersions) -> Metadata {
        Metadata {
            brokers: self.brokers
                .iter()
                .map(|broker| broker.with_api_versions(Some(api_versions.clone())))
                .collect(),
            topics: self.topics.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

impl Cluster for Metadata {
    fn brokers(&self) -> &[Broker] {
        &self.brokers
    }

    fn topic_names(&self) -> Vec<&str> {
        self.topics.keys().map(String::as_str).collect()
    }

    fn find_broker(&self, broker: BrokerRef) -> Option<&Broker> {
        self.brokers.iter().find(|b| b.as_ref() == broker)
    }

    fn leader_for(&self, tp: &TopicPartition) -> Option<&Broker> {
        self.topics
            .get(tp.topic_name.as_ref())
            .and_then(|partitions| partitions.partition(tp.partition))
            .and_then(|info| info.leader)
            .and_then(|leader| self.find_broker(leader))
    }

    fn partitions_for(&self, topic_name: &str) -> Option<&TopicPartitions> {
        self.topics.get(topic_name)
    }
}

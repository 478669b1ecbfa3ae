use std::fmt;

use network::{Endpoint, TopicPartition};
use client::TopicPartitions;
use client::version::max_supported_version;
use protocol::{ApiKeys, ApiVersion, NodeId, PartitionId, UsableApiVersions};

/// A cluster member, carrying its resolved endpoint and, once known,
/// the api versions it accepts.
#[derive(Clone, Debug)]
pub struct Broker {
    id: NodeId,
    endpoint: Endpoint,
    api_versions: Option<UsableApiVersions>,
}

impl Broker {
    pub fn new(id: NodeId, endpoint: Endpoint) -> Self {
        Broker {
            id: id,
            endpoint: endpoint,
            api_versions: None,
        }
    }

    /// The id of this node, as assigned by the cluster controller.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn as_ref(&self) -> BrokerRef {
        BrokerRef::new(self.id)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn host(&self) -> &str {
        self.endpoint.host()
    }

    pub fn port(&self) -> u16 {
        self.endpoint.port()
    }

    /// The newest version of the given api both sides speak, or `None`
    /// when the broker's versions are unknown.
    pub fn api_version(&self, api_key: ApiKeys) -> Option<ApiVersion> {
        self.api_versions
            .as_ref()
            .and_then(|api_versions| api_versions.find(api_key))
            .map(|supported| {
                     let ours = max_supported_version(api_key);

                     if supported.max_version < ours {
                         supported.max_version
                     } else {
                         ours
                     }
                 })
    }

    pub fn with_api_versions(&self, api_versions: Option<UsableApiVersions>) -> Broker {
        Broker {
            id: self.id,
            endpoint: self.endpoint.clone(),
            api_versions: api_versions,
        }
    }
}

/// An index into the brokers of a metadata snapshot; `-1` names a
/// broker that is not (or no longer) known.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BrokerRef(NodeId);

pub const UNKNOWN_BROKER: BrokerRef = BrokerRef(-1);

impl BrokerRef {
    pub fn new(id: NodeId) -> Self {
        BrokerRef(id)
    }

    pub fn index(&self) -> NodeId {
        self.0
    }

    pub fn is_known(&self) -> bool {
        self.0 >= 0
    }
}

impl From<NodeId> for BrokerRef {
    fn from(id: NodeId) -> Self {
        BrokerRef::new(id)
    }
}

impl fmt::Display for BrokerRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One partition of a topic as the cluster reported it.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionInfo {
    pub partition: PartitionId,
    /// The current leader, `None` while the cluster is electing one.
    pub leader: Option<BrokerRef>,
    pub replicas: Vec<BrokerRef>,
    pub in_sync_replicas: Vec<BrokerRef>,
}

impl PartitionInfo {
    pub fn new(partition: PartitionId, leader: BrokerRef) -> Self {
        PartitionInfo {
            partition: partition,
            leader: Some(leader),
            replicas: Vec::new(),
            in_sync_replicas: Vec::new(),
        }
    }
}

/// Read access to a topology snapshot.
pub trait Cluster {
    fn brokers(&self) -> &[Broker];

    fn topic_names(&self) -> Vec<&str>;

    fn find_broker(&self, broker: BrokerRef) -> Option<&Broker>;

    fn leader_for(&self, tp: &TopicPartition) -> Option<&Broker>;

    fn partitions_for(&self, topic_name: &str) -> Option<&TopicPartitions>;
}

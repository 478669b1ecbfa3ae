use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::mem;
use std::net::SocketAddr;
use std::rc::Rc;
use std::cell::RefCell;
use std::time::Duration;

use bytes::Bytes;

use rand::{self, Rng};

use futures::future::{self, Future, IntoFuture};
use futures::unsync::oneshot;
use futures::Poll;
use tokio_core::reactor::Handle;
use tokio_retry::RetryIf;
use tokio_service::Service;
use tokio_timer::Timer;

use errors::{Error, ErrorKind, KafkaCode, Result};
use client::{Broker, BrokerRef, ClientBuilder, ClientConfig, Cluster, DefaultPartitioner,
             InFlightMiddleware, KafkaService, LogMiddleware, Metadata, Metrics, Partitioner,
             TimeoutMiddleware, ToMilliseconds};
use network::{ConnectionObserver, Endpoint, KafkaRequest, KafkaResponse, TopicPartition};
use protocol::{ApiKeys, CommitPartition, CommitTopic, ErrorCode, FetchCommitPartitionStatus,
               FetchCommitTopic, FetchOffset, FetchPartitionData, GenerationId,
               GroupDescription, JoinGroupMember, JoinGroupProtocol, ListedGroup, MessageSet,
               Offset, PartitionId, RequiredAcks, SyncGroupAssignment, UsableApiVersions,
               DEFAULT_RETENTION_TIME};

/// A trait for communicating with the Kafka cluster.
pub trait Client<'a>: 'static {
    /// Send the given records to the leader of a partition and return
    /// a future which will eventually contain the per-partition base
    /// offsets.
    fn produce_records(&self,
                       acks: RequiredAcks,
                       ack_timeout: Duration,
                       tp: TopicPartition<'a>,
                       records: Vec<Cow<'a, MessageSet>>)
                       -> ProduceRecords;

    /// Fetch messages from the leaders of the given partitions.
    fn fetch_records(&self,
                     max_wait_time: Duration,
                     min_bytes: i32,
                     max_bytes: i32,
                     partitions: Vec<(TopicPartition<'a>, Offset)>)
                     -> FetchRecords;

    /// Search the offsets by target times for the specified partitions.
    fn fetch_offsets(&self,
                     partitions: Vec<TopicPartition<'a>>,
                     offset: FetchOffset)
                     -> FetchOffsets;

    /// Commit the given offsets for a consumer group.
    fn commit_offsets(&self,
                      coordinator: BrokerRef,
                      generation: Option<Generation>,
                      offsets: Vec<(TopicPartition<'a>, Offset)>)
                      -> CommitOffsets;

    /// Fetch the committed offsets of a consumer group.
    fn fetch_committed_offsets(&self,
                               coordinator: BrokerRef,
                               group_id: Cow<'a, str>,
                               partitions: Vec<TopicPartition<'a>>)
                               -> FetchCommittedOffsets;

    /// Load metadata of the Kafka cluster and return a future which
    /// will eventually contain the metadata information.
    fn load_metadata(&self) -> LoadMetadata<'a>;

    /// Discover the current coordinator of the consumer group.
    fn group_coordinator(&self, group_id: Cow<'a, str>) -> GroupCoordinator;

    /// Join the consumer group
    fn join_group(&self,
                  coordinator: BrokerRef,
                  group_id: Cow<'a, str>,
                  session_timeout: i32,
                  rebalance_timeout: i32,
                  member_id: Cow<'a, str>,
                  protocol_type: Cow<'a, str>,
                  group_protocols: Vec<ConsumerGroupProtocol<'a>>)
                  -> JoinGroup;

    /// Send heartbeat to the consumer group
    fn heartbeat(&self, coordinator: BrokerRef, generation: Generation) -> Heartbeat;

    /// Leave the current consumer group
    fn leave_group(&self, coordinator: BrokerRef, generation: Generation) -> LeaveGroup;

    /// Sync the current consumer group
    fn sync_group(&self,
                  coordinator: BrokerRef,
                  generation: Generation,
                  group_assignment: Option<Vec<ConsumerGroupAssignment<'a>>>)
                  -> SyncGroup;

    /// Describe the given consumer groups.
    fn describe_groups(&self, coordinator: BrokerRef, group_ids: Vec<Cow<'a, str>>)
                       -> DescribeGroups;

    /// List the groups a broker knows about.
    fn list_groups(&self, broker: BrokerRef) -> ListGroups;

    /// Start the SASL handshake with a broker.
    fn sasl_handshake(&self, broker: BrokerRef, mechanism: Cow<'a, str>) -> SaslHandshake;
}

/// The future of records metadata information.
pub type ProduceRecords = StaticBoxFuture<HashMap<String, Vec<(PartitionId, ErrorCode, Offset)>>>;

/// The future of fetched records, per topic and partition.
pub type FetchRecords = StaticBoxFuture<HashMap<String, Vec<FetchPartitionData>>>;

/// The future of partition offsets information.
pub type FetchOffsets = StaticBoxFuture<HashMap<String, Vec<PartitionOffset>>>;

/// The future of the partitions whose offsets were committed.
pub type CommitOffsets = StaticBoxFuture<HashMap<String, Vec<PartitionId>>>;

/// The future of the committed offsets of a group.
pub type FetchCommittedOffsets = StaticBoxFuture<HashMap<String, Vec<FetchCommitPartitionStatus>>>;

/// The partition and offset
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionOffset {
    /// The partition id
    pub partition: PartitionId,
    /// The offset found in the partition
    pub offset: Offset,
}

/// The future of discover group coodinator
pub type GroupCoordinator = StaticBoxFuture<Broker>;

/// The future of join group.
pub type JoinGroup = StaticBoxFuture<ConsumerGroup>;

pub type ConsumerGroupProtocol<'a> = JoinGroupProtocol<'a>;

/// The future of heartbeat.
pub type Heartbeat = StaticBoxFuture;

/// The consumer group
#[derive(Clone, Debug)]
pub struct ConsumerGroup {
    /// The group id.
    pub group_id: String,

    /// The generation of the consumer group.
    pub generation_id: GenerationId,

    /// The group protocol selected by the coordinator
    pub protocol: String,

    /// The leader of the group
    pub leader_id: String,

    /// The consumer id assigned by the group coordinator.
    pub member_id: String,

    /// The members of the group
    pub members: Vec<ConsumerGroupMember>,
}

impl ConsumerGroup {
    pub fn is_leader(&self) -> bool {
        self.leader_id == self.member_id
    }

    pub fn generation(&self) -> Generation {
        Generation {
            group_id: self.group_id.clone(),
            generation_id: self.generation_id,
            member_id: self.member_id.clone(),
            protocol: self.protocol.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Generation {
    /// The group id.
    pub group_id: String,

    /// The generation of the consumer group.
    pub generation_id: GenerationId,

    /// The consumer id assigned by the group coordinator.
    pub member_id: String,

    /// The group protocol selected by the coordinator
    pub protocol: String,
}

/// The consumer group member
pub type ConsumerGroupMember = JoinGroupMember;

/// The future of leave consumer group.
pub type LeaveGroup = StaticBoxFuture<String>;

pub type ConsumerGroupAssignment<'a> = SyncGroupAssignment<'a>;

/// The future of sync consumer group.
pub type SyncGroup = StaticBoxFuture<Bytes>;

/// The future of the described groups.
pub type DescribeGroups = StaticBoxFuture<Vec<GroupDescription>>;

/// The future of the listed groups.
pub type ListGroups = StaticBoxFuture<Vec<ListedGroup>>;

/// The future of the mechanisms the broker enables.
pub type SaslHandshake = StaticBoxFuture<Vec<String>>;

pub type GetMetadata = StaticBoxFuture<Rc<Metadata>>;
pub type FetchMetadata = StaticBoxFuture<Rc<Metadata>>;
pub type FetchApiVersions = StaticBoxFuture<UsableApiVersions>;
pub type LoadApiVersions = StaticBoxFuture<HashMap<BrokerRef, UsableApiVersions>>;

/// The future of a routing decision.
pub type RouteTo = StaticBoxFuture<(SocketAddr, BrokerRef)>;
pub type RouteByKey = StaticBoxFuture<(PartitionId, SocketAddr, BrokerRef)>;

type ClientService<'a> = InFlightMiddleware<LogMiddleware<TimeoutMiddleware<KafkaService<'a>>>>;

/// A Kafka client that hides broker topology behind a routing layer.
#[derive(Clone)]
pub struct KafkaClient<'a> {
    inner: Rc<Inner<'a>>,
}

struct Inner<'a> {
    config: ClientConfig,
    handle: Handle,
    service: ClientService<'a>,
    pool: KafkaService<'a>,
    timer: Rc<Timer>,
    metrics: Option<Rc<Metrics>>,
    partitioner: Rc<Partitioner>,
    state: Rc<RefCell<State>>,
}

#[derive(Default)]
struct State {
    metadata_status: MetadataStatus,
    last_brokers: Vec<SocketAddr>,
}

enum MetadataStatus {
    Loading(RefCell<Vec<oneshot::Sender<Rc<Metadata>>>>),
    Loaded(Rc<Metadata>),
}

impl Default for MetadataStatus {
    fn default() -> Self {
        MetadataStatus::Loading(RefCell::new(Vec::new()))
    }
}

impl State {
    /// Park until a snapshot is published, or complete right away when
    /// one is loaded.
    fn metadata(&self) -> GetMetadata {
        let (sender, receiver) = oneshot::channel();

        match self.metadata_status {
            MetadataStatus::Loading(ref senders) => senders.borrow_mut().push(sender),
            MetadataStatus::Loaded(ref metadata) => drop(sender.send(metadata.clone())),
        }

        GetMetadata::new(receiver
                             .map_err(|_| ErrorKind::Canceled("load metadata canceled").into()))
    }

    fn loaded_metadata(&self) -> Option<Rc<Metadata>> {
        if let MetadataStatus::Loaded(ref metadata) = self.metadata_status {
            Some(metadata.clone())
        } else {
            None
        }
    }

    fn refresh_metadata(&mut self) {
        if let MetadataStatus::Loaded(_) = self.metadata_status {
            self.metadata_status = MetadataStatus::Loading(Default::default());
        }
    }

    fn update_metadata(&mut self, metadata: Rc<Metadata>) {
        let status = mem::replace(&mut self.metadata_status,
                                  MetadataStatus::Loaded(metadata.clone()));

        if let MetadataStatus::Loading(senders) = status {
            for sender in senders.into_inner() {
                drop(sender.send(metadata.clone()));
            }
        }
    }
}

impl<'a> KafkaClient<'a>
    where Self: 'static
{
    pub fn from_hosts<I>(hosts: I, handle: Handle) -> ClientBuilder<'a>
        where I: Iterator<Item = SocketAddr>
    {
        ClientBuilder::from_hosts(hosts, handle)
    }

    pub fn from_config(config: ClientConfig, handle: Handle) -> KafkaClient<'a> {
        trace!("create client from config: {:?}", config);

        let metrics = if config.metrics {
            Some(Rc::new(Metrics::new().expect("fail to register metrics")))
        } else {
            None
        };

        let observers: Rc<Vec<Rc<ConnectionObserver>>> =
            Rc::new(metrics
                        .iter()
                        .map(|metrics| metrics.clone() as Rc<ConnectionObserver>)
                        .collect());

        let pool = KafkaService::new(handle.clone(), config.connection_config(), observers);

        let service =
            InFlightMiddleware::new(
                LogMiddleware::new(
                    TimeoutMiddleware::new(pool.clone(),
                                           config.timer(),
                                           config.request_timeout())));

        let timer = Rc::new(config.timer());
        let inner = Rc::new(Inner {
                                config: config,
                                handle: handle,
                                service: service,
                                pool: pool,
                                timer: timer,
                                metrics: metrics,
                                partitioner: Rc::new(DefaultPartitioner::default()),
                                state: Rc::new(RefCell::new(State::default())),
                            });

        let client = KafkaClient { inner: inner };

        client.refresh_metadata();

        client
    }

    pub fn handle(&self) -> &Handle {
        &self.inner.handle
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn timer(&self) -> Rc<Timer> {
        self.inner.timer.clone()
    }

    pub fn metrics(&self) -> Option<Rc<Metrics>> {
        self.inner.metrics.clone()
    }

    /// The current topology snapshot, refreshed first when it expired.
    pub fn metadata(&self) -> GetMetadata {
        Inner::metadata(&self.inner)
    }

    /// The snapshot holding the given topic, loading it on demand.
    pub fn topic_metadata(&self, topic_name: &str) -> GetMetadata {
        let inner = self.inner.clone();
        let topic_name = topic_name.to_owned();

        GetMetadata::new(Inner::metadata(&self.inner).and_then(move |metadata| {
            if metadata.contains_topic(&topic_name) {
                GetMetadata::ok(metadata)
            } else {
                Inner::spawn_load(&inner, vec![topic_name.clone()]);

                let missing = topic_name.clone();

                GetMetadata::new((*inner.state)
                                     .borrow()
                                     .metadata()
                                     .and_then(move |metadata| if metadata
                                                      .contains_topic(&missing) {
                                                   Ok(metadata)
                                               } else {
                                                   Err(ErrorKind::CachedMetadata(missing
                                                                                     .clone(),
                                                                                 None)
                                                               .into())
                                               }))
            }
        }))
    }

    /// Kick off a metadata refresh in the background.
    pub fn refresh_metadata(&self) {
        Inner::spawn_load(&self.inner, Vec::new());
    }

    /// Resolve the broker currently leading a partition.
    pub fn route(&self, tp: TopicPartition<'a>) -> RouteTo {
        RouteTo::new(Inner::metadata(&self.inner)
                         .and_then(move |metadata| {
                                       Inner::route_to_leader(&metadata, &tp)
                                           .map(|broker| {
                                                    (broker.endpoint().addr(), broker.as_ref())
                                                })
                                   }))
    }

    /// Pick a partition for a key with the configured partitioner,
    /// then resolve its leader.
    pub fn route_by_key(&self, topic_name: Cow<'a, str>, key: Option<Vec<u8>>) -> RouteByKey {
        let inner = self.inner.clone();

        RouteByKey::new(Inner::metadata(&self.inner).and_then(move |metadata| {
            let partition = inner
                .partitioner
                .partition(&topic_name,
                           key.as_ref().map(|key| &key[..]),
                           &metadata)
                .ok_or_else(|| {
                                Error::from(ErrorKind::CachedMetadata(topic_name.to_string(),
                                                                      None))
                            })?;

            let tp = TopicPartition::new(topic_name.to_string(), partition);

            Inner::route_to_leader(&metadata, &tp)
                .map(|broker| (partition, broker.endpoint().addr(), broker.as_ref()))
        }))
    }

    /// Dispose every pooled connection; outstanding operations
    /// complete with a dispose error.
    pub fn dispose(&self) {
        self.inner.pool.dispose();
    }
}

impl<'a> Client<'a> for KafkaClient<'a>
    where Self: 'static
{
    fn produce_records(&self,
                       acks: RequiredAcks,
                       ack_timeout: Duration,
                       tp: TopicPartition<'a>,
                       records: Vec<Cow<'a, MessageSet>>)
                       -> ProduceRecords {
        let inner = self.inner.clone();
        let records = Rc::new(records);
        let ack_timeout = ack_timeout.to_millis() as i32;

        Inner::with_retry(&self.inner, move || {
            let inner = inner.clone();
            let tp = tp.clone();
            let records = records.clone();

            StaticBoxFuture::new(Inner::metadata(&inner.clone())
                .and_then(move |metadata| -> ProduceRecords {
                    let broker = match Inner::route_to_leader(&metadata, &tp) {
                        Ok(broker) => broker,
                        Err(err) => return Inner::stale(&inner, &tp.topic_name, err),
                    };

                    let api_version = broker.api_version(ApiKeys::Produce).unwrap_or(0);
                    let request =
                        KafkaRequest::produce_records(api_version,
                                                      0,
                                                      inner.client_id(),
                                                      acks,
                                                      ack_timeout,
                                                      inner.config.compression,
                                                      &tp,
                                                      records.as_ref().clone());

                    let stale_inner = inner.clone();
                    let topic_name = tp.topic_name.to_string();

                    StaticBoxFuture::new(inner
                        .call(broker.endpoint().addr(), request)
                        .and_then(|response| if let KafkaResponse::Produce(res) = response {
                                      check_produce_response(&res)
                                  } else {
                                      bail!(unexpected(&response))
                                  })
                        .or_else(move |err| {
                                     Inner::invalidate_on_stale(&stale_inner, &topic_name, &err);
                                     Err(err)
                                 }))
                }))
        })
    }

    fn fetch_records(&self,
                     max_wait_time: Duration,
                     min_bytes: i32,
                     max_bytes: i32,
                     partitions: Vec<(TopicPartition<'a>, Offset)>)
                     -> FetchRecords {
        let inner = self.inner.clone();
        let partitions = Rc::new(partitions);
        let max_wait_time = max_wait_time.to_millis() as i32;

        Inner::with_retry(&self.inner, move || {
            let inner = inner.clone();
            let partitions = partitions.clone();

            StaticBoxFuture::new(Inner::metadata(&inner.clone())
                .and_then(move |metadata| -> FetchRecords {
                    let mut by_broker = HashMap::new();

                    for &(ref tp, offset) in partitions.iter() {
                        let broker = match Inner::route_to_leader(&metadata, tp) {
                            Ok(broker) => broker,
                            Err(err) => return Inner::stale(&inner, &tp.topic_name, err),
                        };

                        by_broker
                            .entry((broker.endpoint().addr(),
                                    broker.api_version(ApiKeys::Fetch).unwrap_or(0)))
                            .or_insert_with(Vec::new)
                            .push((tp.clone(), offset));
                    }

                    let topic_names: Vec<String> = partitions
                        .iter()
                        .map(|&(ref tp, _)| tp.topic_name.to_string())
                        .collect();

                    let responses: Vec<_> = by_broker
                        .into_iter()
                        .map(|((addr, api_version), partitions)| {
                            let request = KafkaRequest::fetch_records(api_version,
                                                                      0,
                                                                      inner.client_id(),
                                                                      max_wait_time,
                                                                      min_bytes,
                                                                      max_bytes,
                                                                      partitions);

                            inner
                                .call(addr, request)
                                .and_then(|response| if let KafkaResponse::Fetch(res) =
                                    response {
                                              check_fetch_response(res)
                                          } else {
                                              bail!(unexpected(&response))
                                          })
                        })
                        .collect();

                    let stale_inner = inner.clone();

                    StaticBoxFuture::new(future::join_all(responses)
                        .map(|fetched| {
                            let mut records = HashMap::new();

                            for (topic_name, partitions) in
                                fetched.into_iter().flat_map(HashMap::into_iter) {
                                records
                                    .entry(topic_name)
                                    .or_insert_with(Vec::new)
                                    .extend(partitions);
                            }

                            records
                        })
                        .or_else(move |err| {
                            for topic_name in topic_names {
                                Inner::invalidate_on_stale(&stale_inner, &topic_name, &err);
                            }
                            Err(err)
                        }))
                }))
        })
    }

    fn fetch_offsets(&self,
                     partitions: Vec<TopicPartition<'a>>,
                     offset: FetchOffset)
                     -> FetchOffsets {
        let inner = self.inner.clone();
        let partitions = Rc::new(partitions);

        Inner::with_retry(&self.inner, move || {
            let inner = inner.clone();
            let partitions = partitions.clone();

            StaticBoxFuture::new(Inner::metadata(&inner.clone())
                .and_then(move |metadata| -> FetchOffsets {
                    let mut by_broker: HashMap<_, HashMap<Cow<str>, Vec<PartitionId>>> =
                        HashMap::new();

                    for tp in partitions.iter() {
                        let broker = match Inner::route_to_leader(&metadata, tp) {
                            Ok(broker) => broker,
                            Err(err) => return Inner::stale(&inner, &tp.topic_name, err),
                        };

                        by_broker
                            .entry((broker.endpoint().addr(),
                                    broker.api_version(ApiKeys::ListOffsets).unwrap_or(0)))
                            .or_insert_with(HashMap::new)
                            .entry(tp.topic_name.clone())
                            .or_insert_with(Vec::new)
                            .push(tp.partition);
                    }

                    let responses: Vec<_> = by_broker
                        .into_iter()
                        .map(|((addr, api_version), topics)| {
                            let request = KafkaRequest::list_offsets(api_version,
                                                                     0,
                                                                     inner.client_id(),
                                                                     topics,
                                                                     offset);

                            inner
                                .call(addr, request)
                                .and_then(|response| if let KafkaResponse::ListOffsets(res) =
                                    response {
                                              check_list_offsets_response(&res)
                                          } else {
                                              bail!(unexpected(&response))
                                          })
                        })
                        .collect();

                    StaticBoxFuture::new(future::join_all(responses).map(|responses| {
                        let mut offsets = HashMap::new();

                        for (topic_name, partitions) in
                            responses.into_iter().flat_map(HashMap::into_iter) {
                            offsets
                                .entry(topic_name)
                                .or_insert_with(Vec::new)
                                .extend(partitions);
                        }

                        offsets
                    }))
                }))
        })
    }

    fn commit_offsets(&self,
                      coordinator: BrokerRef,
                      generation: Option<Generation>,
                      offsets: Vec<(TopicPartition<'a>, Offset)>)
                      -> CommitOffsets {
        let inner = self.inner.clone();

        CommitOffsets::new(Inner::metadata(&self.inner)
            .and_then(move |metadata| -> CommitOffsets {
                let broker = match metadata.find_broker(coordinator) {
                    Some(broker) => broker,
                    None => {
                        return StaticBoxFuture::err(
                            ErrorKind::BrokerNotFound(coordinator.index()).into())
                    }
                };

                let api_version = broker.api_version(ApiKeys::OffsetCommit).unwrap_or(0);

                let mut topics: HashMap<Cow<str>, Vec<CommitPartition>> = HashMap::new();

                for (tp, offset) in offsets {
                    topics
                        .entry(tp.topic_name)
                        .or_insert_with(Vec::new)
                        .push(CommitPartition {
                                  partition: tp.partition,
                                  offset: offset,
                                  timestamp: -1,
                                  metadata: None,
                              });
                }

                let topics = topics
                    .into_iter()
                    .map(|(topic_name, partitions)| {
                             CommitTopic {
                                 topic_name: topic_name,
                                 partitions: partitions,
                             }
                         })
                    .collect();

                let (group_id, generation_id, member_id) = match generation {
                    Some(generation) => {
                        (Cow::from(generation.group_id),
                         generation.generation_id,
                         Cow::from(generation.member_id))
                    }
                    None => (Cow::from(String::new()), -1, Cow::from(String::new())),
                };

                let request = KafkaRequest::offset_commit(api_version,
                                                          0,
                                                          inner.client_id(),
                                                          group_id,
                                                          generation_id,
                                                          member_id,
                                                          DEFAULT_RETENTION_TIME,
                                                          topics);

                StaticBoxFuture::new(inner
                    .call(broker.endpoint().addr(), request)
                    .and_then(|response| if let KafkaResponse::OffsetCommit(res) = response {
                                  let mut committed = HashMap::new();

                                  for topic in res.topics {
                                      for partition in &topic.partitions {
                                          let code = KafkaCode::from(partition.error_code);

                                          if code != KafkaCode::None {
                                              bail!(ErrorKind::KafkaError(code))
                                          }
                                      }

                                      committed.insert(topic.topic_name,
                                                       topic
                                                           .partitions
                                                           .iter()
                                                           .map(|partition| {
                                                                    partition.partition
                                                                })
                                                           .collect());
                                  }

                                  Ok(committed)
                              } else {
                                  bail!(unexpected(&response))
                              }))
            }))
    }

    fn fetch_committed_offsets(&self,
                               coordinator: BrokerRef,
                               group_id: Cow<'a, str>,
                               partitions: Vec<TopicPartition<'a>>)
                               -> FetchCommittedOffsets {
        let inner = self.inner.clone();

        FetchCommittedOffsets::new(Inner::metadata(&self.inner)
            .and_then(move |metadata| -> FetchCommittedOffsets {
                let broker = match metadata.find_broker(coordinator) {
                    Some(broker) => broker,
                    None => {
                        return StaticBoxFuture::err(
                            ErrorKind::BrokerNotFound(coordinator.index()).into())
                    }
                };

                let mut topics: HashMap<Cow<str>, Vec<PartitionId>> = HashMap::new();

                for tp in partitions {
                    topics
                        .entry(tp.topic_name)
                        .or_insert_with(Vec::new)
                        .push(tp.partition);
                }

                let topics = topics
                    .into_iter()
                    .map(|(topic_name, partitions)| {
                             FetchCommitTopic {
                                 topic_name: topic_name,
                                 partitions: partitions,
                             }
                         })
                    .collect();

                let request =
                    KafkaRequest::offset_fetch(0, inner.client_id(), group_id, topics);

                StaticBoxFuture::new(inner
                    .call(broker.endpoint().addr(), request)
                    .and_then(|response| if let KafkaResponse::OffsetFetch(res) = response {
                                  let mut committed = HashMap::new();

                                  for topic in res.topics {
                                      for partition in &topic.partitions {
                                          let code = KafkaCode::from(partition.error_code);

                                          if code != KafkaCode::None {
                                              bail!(ErrorKind::KafkaError(code))
                                          }
                                      }

                                      committed.insert(topic.topic_name, topic.partitions);
                                  }

                                  Ok(committed)
                              } else {
                                  bail!(unexpected(&response))
                              }))
            }))
    }

    fn load_metadata(&self) -> LoadMetadata<'a> {
        Inner::load_metadata(self.inner.clone(), Vec::new())
    }

    fn group_coordinator(&self, group_id: Cow<'a, str>) -> GroupCoordinator {
        debug!("discover group coordinator of group `{}`", group_id);

        let inner = self.inner.clone();

        GroupCoordinator::new(Inner::metadata(&self.inner)
            .and_then(move |metadata| -> GroupCoordinator {
                let addr = match inner.least_loaded_broker(&metadata) {
                    Ok(addr) => addr,
                    Err(err) => return StaticBoxFuture::err(err),
                };

                let request = KafkaRequest::group_coordinator(0, inner.client_id(), group_id);

                StaticBoxFuture::new(inner
                    .call(addr, request)
                    .and_then(|response| {
                        if let KafkaResponse::GroupCoordinator(res) = response {
                            let code = KafkaCode::from(res.error_code);

                            if code != KafkaCode::None {
                                bail!(ErrorKind::KafkaError(code))
                            }

                            if res.coordinator_port <= 0 ||
                               res.coordinator_port > i32::from(u16::max_value()) {
                                bail!(ErrorKind::ValidationError(
                                    format!("coordinator #{} has an invalid port {}",
                                            res.coordinator_id,
                                            res.coordinator_port)))
                            }

                            let endpoint =
                                Endpoint::resolve(&res.coordinator_host,
                                                  res.coordinator_port as u16)?;

                            Ok(Broker::new(res.coordinator_id, endpoint))
                        } else {
                            bail!(unexpected(&response))
                        }
                    }))
            }))
    }

    fn join_group(&self,
                  coordinator: BrokerRef,
                  group_id: Cow<'a, str>,
                  session_timeout: i32,
                  rebalance_timeout: i32,
                  member_id: Cow<'a, str>,
                  protocol_type: Cow<'a, str>,
                  group_protocols: Vec<ConsumerGroupProtocol<'a>>)
                  -> JoinGroup {
        debug!("member `{}` joins group `{}`", member_id, group_id);

        let inner = self.inner.clone();
        let joined_group_id: String = (*group_id).to_owned();

        JoinGroup::new(Inner::metadata(&self.inner)
            .and_then(move |metadata| -> JoinGroup {
                let broker = match metadata.find_broker(coordinator) {
                    Some(broker) => broker,
                    None => {
                        return StaticBoxFuture::err(
                            ErrorKind::BrokerNotFound(coordinator.index()).into())
                    }
                };

                let api_version = broker.api_version(ApiKeys::JoinGroup).unwrap_or(0);

                let request = KafkaRequest::join_group(api_version,
                                                       0,
                                                       inner.client_id(),
                                                       group_id,
                                                       session_timeout,
                                                       rebalance_timeout,
                                                       member_id,
                                                       protocol_type,
                                                       group_protocols);

                StaticBoxFuture::new(inner
                    .call(broker.endpoint().addr(), request)
                    .and_then(move |response| if let KafkaResponse::JoinGroup(res) =
                        response {
                                  let code = KafkaCode::from(res.error_code);

                                  if code != KafkaCode::None {
                                      bail!(ErrorKind::KafkaError(code))
                                  }

                                  Ok(ConsumerGroup {
                                         group_id: joined_group_id,
                                         generation_id: res.generation_id,
                                         protocol: res.protocol,
                                         leader_id: res.leader_id,
                                         member_id: res.member_id,
                                         members: res.members,
                                     })
                              } else {
                                  bail!(unexpected(&response))
                              }))
            }))
    }

    fn heartbeat(&self, coordinator: BrokerRef, generation: Generation) -> Heartbeat {
        trace!("member `{}` sends heartbeat to group `{}`",
               generation.member_id,
               generation.group_id);

        let inner = self.inner.clone();

        Heartbeat::new(Inner::metadata(&self.inner)
            .and_then(move |metadata| -> Heartbeat {
                let broker = match metadata.find_broker(coordinator) {
                    Some(broker) => broker,
                    None => {
                        return StaticBoxFuture::err(
                            ErrorKind::BrokerNotFound(coordinator.index()).into())
                    }
                };

                let request = KafkaRequest::heartbeat(0,
                                                      inner.client_id(),
                                                      generation.group_id.into(),
                                                      generation.generation_id,
                                                      generation.member_id.into());

                StaticBoxFuture::new(inner
                    .call(broker.endpoint().addr(), request)
                    .and_then(|response| if let KafkaResponse::Heartbeat(res) = response {
                                  let code = KafkaCode::from(res.error_code);

                                  if code != KafkaCode::None {
                                      bail!(ErrorKind::KafkaError(code))
                                  }

                                  Ok(())
                              } else {
                                  bail!(unexpected(&response))
                              }))
            }))
    }

    fn leave_group(&self, coordinator: BrokerRef, generation: Generation) -> LeaveGroup {
        debug!("member `{}` leaves group `{}`",
               generation.member_id,
               generation.group_id);

        let inner = self.inner.clone();
        let leaved_group_id = generation.group_id.clone();

        LeaveGroup::new(Inner::metadata(&self.inner)
            .and_then(move |metadata| -> LeaveGroup {
                let broker = match metadata.find_broker(coordinator) {
                    Some(broker) => broker,
                    None => {
                        return StaticBoxFuture::err(
                            ErrorKind::BrokerNotFound(coordinator.index()).into())
                    }
                };

                let request = KafkaRequest::leave_group(0,
                                                        inner.client_id(),
                                                        generation.group_id.into(),
                                                        generation.member_id.into());

                StaticBoxFuture::new(inner
                    .call(broker.endpoint().addr(), request)
                    .and_then(move |response| if let KafkaResponse::LeaveGroup(res) =
                        response {
                                  let code = KafkaCode::from(res.error_code);

                                  if code != KafkaCode::None {
                                      bail!(ErrorKind::KafkaError(code))
                                  }

                                  Ok(leaved_group_id)
                              } else {
                                  bail!(unexpected(&response))
                              }))
            }))
    }

    fn sync_group(&self,
                  coordinator: BrokerRef,
                  generation: Generation,
                  group_assignment: Option<Vec<ConsumerGroupAssignment<'a>>>)
                  -> SyncGroup {
        debug!("sync group `{}` # {} with member `{}`",
               generation.group_id,
               generation.generation_id,
               generation.member_id);

        let inner = self.inner.clone();

        SyncGroup::new(Inner::metadata(&self.inner)
            .and_then(move |metadata| -> SyncGroup {
                let broker = match metadata.find_broker(coordinator) {
                    Some(broker) => broker,
                    None => {
                        return StaticBoxFuture::err(
                            ErrorKind::BrokerNotFound(coordinator.index()).into())
                    }
                };

                let request = KafkaRequest::sync_group(0,
                                                       inner.client_id(),
                                                       generation.group_id.into(),
                                                       generation.generation_id,
                                                       generation.member_id.into(),
                                                       group_assignment.unwrap_or_default());

                StaticBoxFuture::new(inner
                    .call(broker.endpoint().addr(), request)
                    .and_then(|response| if let KafkaResponse::SyncGroup(res) = response {
                                  let code = KafkaCode::from(res.error_code);

                                  if code != KafkaCode::None {
                                      bail!(ErrorKind::KafkaError(code))
                                  }

                                  Ok(res.member_assignment)
                              } else {
                                  bail!(unexpected(&response))
                              }))
            }))
    }

    fn describe_groups(&self,
                       coordinator: BrokerRef,
                       group_ids: Vec<Cow<'a, str>>)
                       -> DescribeGroups {
        let inner = self.inner.clone();

        DescribeGroups::new(Inner::metadata(&self.inner)
            .and_then(move |metadata| -> DescribeGroups {
                let broker = match metadata.find_broker(coordinator) {
                    Some(broker) => broker,
                    None => {
                        return StaticBoxFuture::err(
                            ErrorKind::BrokerNotFound(coordinator.index()).into())
                    }
                };

                let request = KafkaRequest::describe_groups(0, inner.client_id(), group_ids);

                StaticBoxFuture::new(inner
                    .call(broker.endpoint().addr(), request)
                    .and_then(|response| if let KafkaResponse::DescribeGroups(res) =
                        response {
                                  for group in &res.groups {
                                      let code = KafkaCode::from(group.error_code);

                                      if code != KafkaCode::None {
                                          bail!(ErrorKind::KafkaError(code))
                                      }
                                  }

                                  Ok(res.groups)
                              } else {
                                  bail!(unexpected(&response))
                              }))
            }))
    }

    fn list_groups(&self, broker: BrokerRef) -> ListGroups {
        let inner = self.inner.clone();

        ListGroups::new(Inner::metadata(&self.inner)
            .and_then(move |metadata| -> ListGroups {
                let broker = match metadata.find_broker(broker) {
                    Some(broker) => broker,
                    None => {
                        return StaticBoxFuture::err(ErrorKind::BrokerNotFound(broker.index())
                                                        .into())
                    }
                };

                let request = KafkaRequest::list_groups(0, inner.client_id());

                StaticBoxFuture::new(inner
                    .call(broker.endpoint().addr(), request)
                    .and_then(|response| if let KafkaResponse::ListGroups(res) = response {
                                  let code = KafkaCode::from(res.error_code);

                                  if code != KafkaCode::None {
                                      bail!(ErrorKind::KafkaError(code))
                                  }

                                  Ok(res.groups)
                              } else {
                                  bail!(unexpected(&response))
                              }))
            }))
    }

    fn sasl_handshake(&self, broker: BrokerRef, mechanism: Cow<'a, str>) -> SaslHandshake {
        let inner = self.inner.clone();

        SaslHandshake::new(Inner::metadata(&self.inner)
            .and_then(move |metadata| -> SaslHandshake {
                let broker = match metadata.find_broker(broker) {
                    Some(broker) => broker,
                    None => {
                        return StaticBoxFuture::err(ErrorKind::BrokerNotFound(broker.index())
                                                        .into())
                    }
                };

                let request = KafkaRequest::sasl_handshake(0, inner.client_id(), mechanism);

                StaticBoxFuture::new(inner
                    .call(broker.endpoint().addr(), request)
                    .and_then(|response| if let KafkaResponse::SaslHandshake(res) =
                        response {
                                  let code = KafkaCode::from(res.error_code);

                                  if code != KafkaCode::None {
                                      bail!(ErrorKind::KafkaError(code))
                                  }

                                  Ok(res.enabled_mechanisms)
                              } else {
                                  bail!(unexpected(&response))
                              }))
            }))
    }
}

fn unexpected(response: &KafkaResponse) -> ErrorKind {
    ErrorKind::UnexpectedResponse(response.api_key() as i16)
}

fn check_produce_response(res: &::protocol::ProduceResponse)
                          -> Result<HashMap<String, Vec<(PartitionId, ErrorCode, Offset)>>> {
    let mut produced = HashMap::new();

    for topic in &res.topics {
        for partition in &topic.partitions {
            let code = KafkaCode::from(partition.error_code);

            if code != KafkaCode::None {
                bail!(ErrorKind::KafkaError(code))
            }
        }

        produced.insert(topic.topic_name.clone(),
                        topic
                            .partitions
                            .iter()
                            .map(|partition| {
                                     (partition.partition, partition.error_code, partition.offset)
                                 })
                            .collect());
    }

    Ok(produced)
}

fn check_fetch_response(res: ::protocol::FetchResponse)
                        -> Result<HashMap<String, Vec<FetchPartitionData>>> {
    let mut fetched = HashMap::new();

    for topic in res.topics {
        for partition in &topic.partitions {
            let code = KafkaCode::from(partition.error_code);

            if code != KafkaCode::None {
                bail!(ErrorKind::KafkaError(code))
            }
        }

        fetched.insert(topic.topic_name, topic.partitions);
    }

    Ok(fetched)
}

fn check_list_offsets_response(res: &::protocol::ListOffsetResponse)
                               -> Result<HashMap<String, Vec<PartitionOffset>>> {
    let mut offsets = HashMap::new();

    for topic in &res.topics {
        let mut partitions = Vec::with_capacity(topic.partitions.len());

        for partition in &topic.partitions {
            let code = KafkaCode::from(partition.error_code);

            if code != KafkaCode::None {
                bail!(ErrorKind::KafkaError(code))
            }

            partitions.push(PartitionOffset {
                                partition: partition.partition,
                                offset: partition.offsets.first().cloned().unwrap_or(-1),
                            });
        }

        offsets.insert(topic.topic_name.clone(), partitions);
    }

    Ok(offsets)
}

impl<'a> Inner<'a>
    where Self: 'static
{
    fn client_id(&self) -> Option<Cow<'a, str>> {
        self.config.client_id.clone().map(Cow::from)
    }

    /// Send one request through the middleware stack.
    fn call(&self, addr: SocketAddr, request: KafkaRequest<'a>) -> StaticBoxFuture<KafkaResponse> {
        if let Some(ref metrics) = self.metrics {
            metrics.record_request(request.api_key());
        }

        self.service.call((addr, request))
    }

    /// Wrap one dispatch attempt into the bounded retry loop; only
    /// retriable failures are attempted again, the last error
    /// surfaces verbatim.
    fn with_retry<T, A>(inner: &Rc<Inner<'a>>, action: A) -> StaticBoxFuture<T>
        where A: FnMut() -> StaticBoxFuture<T> + 'static,
              T: 'static
    {
        let strategy = inner.config.retry_strategy();

        StaticBoxFuture::new(RetryIf::spawn(strategy,
                                            action,
                                            |err: &Error| err.is_retriable())
                                     .map_err(Error::from))
    }

    /// The current snapshot; when it expired, kick off a refresh and
    /// park until the new snapshot is published.
    fn metadata(inner: &Rc<Inner<'a>>) -> GetMetadata {
        let fresh = {
            let state = inner.state.borrow();

            match state.metadata_status {
                MetadataStatus::Loaded(ref metadata)
                    if metadata.age() <= inner.config.metadata_max_age() => {
                    Some(metadata.clone())
                }
                MetadataStatus::Loaded(_) => None,
                MetadataStatus::Loading(_) => {
                    return state.metadata();
                }
            }
        };

        match fresh {
            Some(metadata) => GetMetadata::ok(metadata),
            None => {
                trace!("metadata expired, refreshing");

                Inner::spawn_load(inner, Vec::new());

                (*inner.state).borrow().metadata()
            }
        }
    }

    fn route_to_leader(metadata: &Metadata, tp: &TopicPartition) -> Result<Broker> {
        match metadata.leader_for(tp) {
            Some(broker) => Ok(broker.clone()),
            None => {
                bail!(ErrorKind::CachedMetadata(tp.topic_name.to_string(),
                                                if metadata
                                                       .contains_topic(&tp.topic_name) {
                                                    Some(tp.partition)
                                                } else {
                                                    None
                                                }))
            }
        }
    }

    /// A routing miss: ask for fresh topology before the retry loop
    /// attempts again.
    fn stale<T>(inner: &Rc<Inner<'a>>, topic_name: &str, err: Error) -> StaticBoxFuture<T>
        where T: 'static
    {
        Inner::spawn_load(inner, vec![topic_name.to_owned()]);

        StaticBoxFuture::err(err)
    }

    /// A response revealed the cached topology no longer matches the
    /// cluster; the next attempt refreshes first.
    fn invalidate_on_stale(inner: &Rc<Inner<'a>>, topic_name: &str, err: &Error) {
        if err.is_stale_metadata() {
            debug!("stale metadata for topic `{}`, {}", topic_name, err);

            Inner::spawn_load(inner, vec![topic_name.to_owned()]);
        }
    }

    fn spawn_load(inner: &Rc<Inner<'a>>, topic_names: Vec<String>) {
        let handle = inner.handle.clone();
        let load = Inner::load_metadata(inner.clone(), topic_names);

        handle.spawn(load.map(|metadata| {
                                  trace!("loaded metadata, {} brokers, {} topics",
                                         metadata.brokers().len(),
                                         metadata.topics().len());
                              })
                         .map_err(|err| {
                                      warn!("fail to load metadata, {}", err);
                                  }));
    }

    /// Fetch, validate and publish a topology snapshot, keeping the
    /// connection pool in step under the same critical section.
    fn load_metadata(inner: Rc<Inner<'a>>, topic_names: Vec<String>) -> LoadMetadata<'a> {
        debug!("loading metadata for topics {:?}", topic_names);

        let previous = {
            let mut state = inner.state.borrow_mut();
            let previous = state.loaded_metadata();

            state.refresh_metadata();

            previous
        };

        let scoped = !topic_names.is_empty();
        let topic_names = Rc::new(topic_names);

        let fetch = {
            let inner = inner.clone();
            let strategy = inner.config.retry_strategy();
            let action_inner = inner.clone();

            RetryIf::spawn(strategy,
                           move || Inner::fetch_metadata(&action_inner, topic_names.clone()),
                           |err: &Error| match *err.kind() {
                               // an inconsistent response is retried once the
                               // cluster settles, then surfaces
                               ErrorKind::ValidationError(_) => true,
                               _ => err.is_retriable(),
                           })
                    .map_err(Error::from)
        };

        let probe_inner = inner.clone();
        let probed = fetch.and_then(move |metadata: Rc<Metadata>| -> StaticBoxFuture<Rc<Metadata>> {
            if probe_inner.config.api_version_request {
                let metadata = metadata.clone();

                StaticBoxFuture::new(Inner::load_api_versions(&probe_inner, &metadata)
                    .map(move |api_versions| {
                             Rc::new(metadata.with_api_versions(&api_versions))
                         }))
            } else {
                let fallback = probe_inner
                    .config
                    .broker_version_fallback
                    .api_versions();

                trace!("using fallback api versions of {}",
                       probe_inner.config.broker_version_fallback);

                StaticBoxFuture::new(future::ok(
                    Rc::new(metadata.with_fallback_api_versions(&fallback))))
            }
        });

        let update_inner = inner.clone();
        let updated = probed.map(move |metadata| {
            let metadata = if scoped {
                match previous {
                    Some(previous) => Rc::new(previous.merge((*metadata).clone())),
                    None => metadata,
                }
            } else {
                metadata
            };

            Inner::update_metadata(&update_inner, metadata.clone());

            metadata
        });

        LoadMetadata {
            inner: StaticBoxFuture::new(updated),
            phantom: PhantomData,
        }
    }

    fn fetch_metadata(inner: &Rc<Inner<'a>>, topic_names: Rc<Vec<String>>) -> FetchMetadata {
        let addrs = {
            let state = inner.state.borrow();

            if state.last_brokers.is_empty() {
                inner.config.hosts.clone()
            } else {
                state.last_brokers.clone()
            }
        };

        if addrs.is_empty() {
            return FetchMetadata::err(ErrorKind::KafkaError(KafkaCode::BrokerNotAvailable)
                                          .into());
        }

        debug!("fetching metadata for topics {:?} from {:?}", topic_names, addrs);

        let responses: Vec<_> = addrs
            .into_iter()
            .map(|addr| {
                let request =
                    KafkaRequest::fetch_metadata(0, 0, inner.client_id(), &topic_names[..]);

                inner
                    .call(addr, request)
                    .and_then(|response| if let KafkaResponse::Metadata(res) = response {
                                  Metadata::from_response(&res).map(Rc::new)
                              } else {
                                  bail!(unexpected(&response))
                              })
            })
            .collect();

        FetchMetadata::new(future::select_ok(responses).map(|(metadata, _)| metadata))
    }

    fn fetch_api_versions(inner: &Rc<Inner<'a>>, broker: &Broker) -> FetchApiVersions {
        debug!("fetching api versions of broker #{}", broker.id());

        let request = KafkaRequest::api_versions(0, inner.client_id());

        FetchApiVersions::new(inner
                                  .call(broker.endpoint().addr(), request)
                                  .and_then(|response| if let KafkaResponse::ApiVersions(res) =
                                      response {
                                                Ok(UsableApiVersions::new(res.api_versions))
                                            } else {
                                                bail!(unexpected(&response))
                                            }))
    }

    fn load_api_versions(inner: &Rc<Inner<'a>>, metadata: &Rc<Metadata>) -> LoadApiVersions {
        trace!("loading api versions of {} brokers", metadata.brokers().len());

        let responses: Vec<_> = metadata
            .brokers()
            .iter()
            .map(|broker| {
                     let broker_ref = broker.as_ref();

                     Inner::fetch_api_versions(inner, broker)
                         .map(move |api_versions| (broker_ref, api_versions))
                 })
            .collect();

        LoadApiVersions::new(future::join_all(responses).map(HashMap::from_iter))
    }

    /// Publish a snapshot and keep the connection pool in step: every
    /// leader named by the topic cache has a pooled connection before
    /// readers can observe it, and the connections of brokers that
    /// left the topology are disposed only after the new pointers are
    /// published.
    fn update_metadata(inner: &Rc<Inner<'a>>, metadata: Rc<Metadata>) {
        let keep: HashSet<SocketAddr> = metadata
            .brokers()
            .iter()
            .map(|broker| broker.endpoint().addr())
            .collect();

        inner.pool.ensure_connections(keep.iter().cloned());

        let removed = inner.pool.retain_connections(&keep);

        {
            let mut state = inner.state.borrow_mut();

            state.last_brokers = keep.iter().cloned().collect();
            state.update_metadata(metadata);
        }

        for connection in removed {
            debug!("disposing connection #{} of departed broker @ {}",
                   connection.id(),
                   connection.endpoint());

            connection.dispose();
        }
    }

    /// The broker with the fewest outstanding requests, for requests
    /// any broker can answer.
    fn least_loaded_broker(&self, metadata: &Metadata) -> Result<SocketAddr> {
        let mut addrs: Vec<SocketAddr> = metadata
            .brokers()
            .iter()
            .map(|broker| broker.endpoint().addr())
            .collect();

        if addrs.is_empty() {
            addrs = self.config.hosts.clone();
        }

        rand::thread_rng().shuffle(&mut addrs);

        let mut in_flight_requests = usize::max_value();
        let mut found = None;

        for addr in addrs {
            match self.service.in_flight_requests(&addr) {
                Some(0) | None => {
                    trace!("found least loaded broker @ {} without in flight requests",
                           addr);

                    return Ok(addr);
                }
                Some(n) if n < in_flight_requests => {
                    in_flight_requests = n;
                    found = Some(addr);
                }
                _ => {}
            }
        }

        found.ok_or_else(|| {
                             warn!("not found any usable broker");

                             ErrorKind::KafkaError(KafkaCode::BrokerNotAvailable).into()
                         })
    }
}

/// The future of a published topology snapshot.
pub struct LoadMetadata<'a> {
    inner: StaticBoxFuture<Rc<Metadata>>,
    phantom: PhantomData<&'a ()>,
}

impl<'a> Future for LoadMetadata<'a> {
    type Item = Rc<Metadata>;
    type Error = Error;

    fn poll(&mut self) -> Poll<Self::Item, Self::Error> {
        self.inner.poll()
    }
}

pub struct StaticBoxFuture<T = (), E = Error>(Box<Future<Item = T, Error = E> + 'static>)
    where T: 'static,
          E: 'static;

impl<T, E> StaticBoxFuture<T, E> {
    pub fn new<F>(inner: F) -> Self
        where F: IntoFuture<Item = T, Error = E> + 'static,
              F::Future: 'static,
              T: 'static,
              E: 'static
    {
        StaticBoxFuture(Box::new(inner.into_future()))
    }

    pub fn ok(item: T) -> Self {
        StaticBoxFuture(Box::new(future::ok(item)))
    }

    pub fn err(err: E) -> Self {
        StaticBoxFuture(Box::new(future::err(err)))
    }
}

impl<T, E> From<ErrorKind> for StaticBoxFuture<T, E>
    where E: From<ErrorKind>
{
    fn from(err: ErrorKind) -> Self {
        Self::err(err.into())
    }
}

impl<T, E> Future for StaticBoxFuture<T, E> {
    type Item = T;
    type Error = E;

    fn poll(&mut self) -> Poll<Self::Item, Self::Error> {
        self.0.poll()
    }
}

pub trait ToStaticBoxFuture<T, E> {
    fn static_boxed(self) -> StaticBoxFuture<T, E>;
}

impl<F, T, E> ToStaticBoxFuture<T, E> for F
    where F: IntoFuture<Item = T, Error = E> + 'static,
          F::Future: 'static,
          T: 'static,
          E: 'static
{
    fn static_boxed(self) -> StaticBoxFuture<T, E> {
        StaticBoxFuture::new(self)
    }
}

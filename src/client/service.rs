use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::net::SocketAddr;
use std::rc::Rc;

use tokio_core::reactor::Handle;
use tokio_service::Service;

use errors::Error;
use network::{ConnectionConfig, ConnectionObserver, Endpoint, KafkaConnection, KafkaRequest,
              KafkaResponse, SendRequest};

pub type FutureResponse = SendRequest;

/// Routes each request to the connection of its broker address,
/// creating connections on demand.
///
/// The pool is shared between clones, so the client can hold both the
/// bare pool (to keep it in step with the topology cache) and the
/// middleware-wrapped service built over it.
pub struct KafkaService<'a> {
    handle: Handle,
    config: ConnectionConfig,
    observers: Rc<Vec<Rc<ConnectionObserver>>>,
    connections: Rc<RefCell<HashMap<SocketAddr, KafkaConnection>>>,
    next_id: Rc<Cell<u32>>,
    phantom: PhantomData<&'a ()>,
}

impl<'a> Clone for KafkaService<'a> {
    fn clone(&self) -> Self {
        KafkaService {
            handle: self.handle.clone(),
            config: self.config.clone(),
            observers: self.observers.clone(),
            connections: self.connections.clone(),
            next_id: self.next_id.clone(),
            phantom: PhantomData,
        }
    }
}

impl<'a> KafkaService<'a> {
    pub fn new(handle: Handle,
               config: ConnectionConfig,
               observers: Rc<Vec<Rc<ConnectionObserver>>>)
               -> Self {
        KafkaService {
            handle: handle,
            config: config,
            observers: observers,
            connections: Rc::new(RefCell::new(HashMap::new())),
            next_id: Rc::new(Cell::new(0)),
            phantom: PhantomData,
        }
    }

    fn connection_to(&self, addr: SocketAddr) -> KafkaConnection {
        self.connections
            .borrow_mut()
            .entry(addr)
            .or_insert_with(|| {
                                let id = self.next_id.get();
                                self.next_id.set(id.wrapping_add(1));

                                KafkaConnection::new(id,
                                                     Endpoint::from(addr),
                                                     self.config.clone(),
                                                     self.handle.clone(),
                                                     self.observers.clone())
                            })
            .clone()
    }

    /// Make sure every address has a live connection.
    pub fn ensure_connections<I>(&self, addrs: I)
        where I: IntoIterator<Item = SocketAddr>
    {
        for addr in addrs {
            self.connection_to(addr);
        }
    }

    /// Drop the connections of brokers that left the topology and
    /// hand them back; the caller disposes them once the new topology
    /// is published.
    pub fn retain_connections(&self, keep: &HashSet<SocketAddr>) -> Vec<KafkaConnection> {
        let mut connections = self.connections.borrow_mut();

        let removed = connections
            .keys()
            .filter(|addr| !keep.contains(addr))
            .cloned()
            .collect::<Vec<_>>();

        removed
            .into_iter()
            .filter_map(|addr| connections.remove(&addr))
            .collect()
    }

    pub fn dispose(&self) {
        for (_, connection) in self.connections.borrow_mut().drain() {
            connection.dispose();
        }
    }
}

impl<'a> Service for KafkaService<'a> {
    type Request = (SocketAddr, KafkaRequest<'a>);
    type Response = KafkaResponse;
    type Error = Error;
    type Future = FutureResponse;

    fn call(&self, request: Self::Request) -> Self::Future {
        let (addr, request) = request;

        self.connection_to(addr).send(request)
    }
}

#[cfg(test)]
mod tests {
    use tokio_core::reactor::Core;

    use super::*;

    #[test]
    fn test_pool_reuses_and_retains_connections() {
        let core = Core::new().unwrap();
        let service: KafkaService =
            KafkaService::new(core.handle(), ConnectionConfig::default(), Rc::new(Vec::new()));

        let first: SocketAddr = "127.0.0.1:9092".parse().unwrap();
        let second: SocketAddr = "127.0.0.1:9093".parse().unwrap();

        service.ensure_connections(vec![first, second]);

        let id = service.connection_to(first).id();
        assert_eq!(service.connection_to(first).id(), id);

        let mut keep = HashSet::new();
        keep.insert(first);

        let removed = service.retain_connections(&keep);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].endpoint().addr(), second);
        assert_eq!(service.connections.borrow().len(), 1);
    }
}

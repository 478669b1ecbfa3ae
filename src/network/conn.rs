use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::mem;
use std::rc::Rc;
use std::time::Duration;

use bytes::{BigEndian, Bytes, BytesMut};

use futures::future::{self, Either, Future};
use futures::unsync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::unsync::oneshot;
use futures::{Poll, Stream};

use tokio_core::net::TcpStream;
use tokio_core::reactor::{Handle, Timeout};
use tokio_io::AsyncRead;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use errors::{Error, ErrorKind, Result};
use network::codec::{DecodeHints, KafkaCodec};
use network::request::KafkaRequest;
use network::response::KafkaResponse;
use network::Endpoint;
use protocol::{CorrelationId, ProduceResponse, ResponseHeader, with_length_prefix};

const DEFAULT_REQUEST_BUFFER_SIZE: usize = 4096;

/// Hooks into the connection lifecycle; registered at construction,
/// with no effect on protocol behavior.
pub trait ConnectionObserver {
    fn server_disconnected(&self) {}

    fn reconnection_attempt(&self, _attempt: usize) {}

    fn sending_to_socket(&self, _bytes: usize) {}

    fn sent_to_socket(&self, _bytes: usize) {}

    fn receiving_from_socket(&self, _bytes: usize) {}

    fn received_from_socket(&self, _bytes: usize) {}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionConfig {
    /// The upper bound on any single connect attempt.
    pub connect_timeout: Duration,
    /// How many connect attempts one acquire may take before the
    /// pending requests fail with a connection error.
    pub max_connect_attempts: usize,
    /// The base of the exponential backoff between connect attempts.
    pub reconnect_backoff_millis: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            connect_timeout: Duration::from_secs(5),
            max_connect_attempts: 4,
            reconnect_backoff_millis: 100,
        }
    }
}

/// The response side of a `KafkaConnection::send`.
pub struct SendRequest(Box<Future<Item = KafkaResponse, Error = Error>>);

impl SendRequest {
    pub fn new<F>(inner: F) -> Self
        where F: Future<Item = KafkaResponse, Error = Error> + 'static
    {
        SendRequest(Box::new(inner))
    }

    pub fn err(err: Error) -> Self {
        SendRequest(Box::new(future::err(err)))
    }
}

impl Future for SendRequest {
    type Item = KafkaResponse;
    type Error = Error;

    fn poll(&mut self) -> Poll<Self::Item, Self::Error> {
        self.0.poll()
    }
}

/// A full duplex connection to one broker.
///
/// A single supervisor task owns the socket: it acquires a connected
/// stream (reconnecting with exponential backoff), then runs a send
/// pump draining the request queue and a receive pump matching
/// response frames to their waiters by correlation id, until either
/// pump faults. On a fault every in-flight request is completed with
/// a connection error exactly once and the supervisor parks until the
/// next send.
#[derive(Clone)]
pub struct KafkaConnection {
    inner: Rc<ConnInner>,
}

struct ConnInner {
    id: u32,
    endpoint: Endpoint,
    config: ConnectionConfig,
    handle: Handle,
    observers: Rc<Vec<Rc<ConnectionObserver>>>,
    hints: DecodeHints,
    discarded: Rc<Cell<usize>>,
    state: RefCell<State>,
}

struct State {
    correlation_id: CorrelationId,
    in_flight: HashMap<CorrelationId, oneshot::Sender<Result<KafkaResponse>>>,
    sender: UnboundedSender<Bytes>,
    receiver: Option<UnboundedReceiver<Bytes>>,
    supervising: bool,
    disposed: bool,
}

impl State {
    fn next_correlation_id(&mut self) -> CorrelationId {
        let correlation_id = self.correlation_id;
        self.correlation_id = correlation_id.wrapping_add(1);
        correlation_id
    }
}

impl KafkaConnection {
    pub fn new(id: u32,
               endpoint: Endpoint,
               config: ConnectionConfig,
               handle: Handle,
               observers: Rc<Vec<Rc<ConnectionObserver>>>)
               -> Self {
        let (sender, receiver) = mpsc::unbounded();

        trace!("connection #{} created for broker @ {}", id, endpoint);

        KafkaConnection {
            inner: Rc::new(ConnInner {
                               id: id,
                               endpoint: endpoint,
                               config: config,
                               handle: handle,
                               observers: observers,
                               hints: Rc::new(RefCell::new(HashMap::new())),
                               discarded: Rc::new(Cell::new(0)),
                               state: RefCell::new(State {
                                                       correlation_id: 0,
                                                       in_flight: HashMap::new(),
                                                       sender: sender,
                                                       receiver: Some(receiver),
                                                       supervising: false,
                                                       disposed: false,
                                                   }),
                           }),
        }
    }

    pub fn id(&self) -> u32 {
        self.inner.id
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    /// Responses that arrived after their waiter had gone away.
    pub fn discarded_responses(&self) -> usize {
        self.inner.discarded.get()
    }

    pub fn in_flight_requests(&self) -> usize {
        self.inner.state.borrow().in_flight.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.borrow().disposed
    }

    /// Frame the request, register its waiter and enqueue the bytes.
    ///
    /// The waiter is registered strictly before the frame is enqueued,
    /// so a reply can never arrive before it exists.
    pub fn send(&self, mut request: KafkaRequest) -> SendRequest {
        let inner = &self.inner;

        if inner.state.borrow().disposed {
            return SendRequest::err(ErrorKind::ObjectDisposed("connection").into());
        }

        let correlation_id = inner.state.borrow_mut().next_correlation_id();

        request.set_correlation_id(correlation_id);

        let api_key = request.api_key();
        let api_version = request.api_version();

        let mut buf = BytesMut::with_capacity(DEFAULT_REQUEST_BUFFER_SIZE);

        if let Err(err) = with_length_prefix::<BigEndian, _>(&mut buf,
                                                             |buf| request.encode::<BigEndian>(buf)) {
            return SendRequest::err(err);
        }

        let frame = buf.freeze();

        for observer in inner.observers.iter() {
            observer.sending_to_socket(frame.len());
        }

        // fire and forget: the peer will send nothing back, so no
        // waiter is registered and an empty response is synthesized
        if !request.expects_response() {
            self.ensure_supervised();

            let enqueued = inner.state.borrow().sender.unbounded_send(frame);

            return match enqueued {
                       Ok(()) => {
                           SendRequest::new(future::ok(
                        KafkaResponse::Produce(ProduceResponse {
                                                   header: ResponseHeader {
                                                       correlation_id: correlation_id,
                                                   },
                                                   topics: Vec::new(),
                                                   throttle_time: None,
                                               })))
                       }
                       Err(_) => {
                           SendRequest::err(ErrorKind::ConnectionError(format!("send queue of \
                                                                                broker #{} \
                                                                                closed",
                                                                               inner.id))
                                                    .into())
                       }
                   };
        }

        let (sender, receiver) = oneshot::channel();

        inner
            .hints
            .borrow_mut()
            .insert(correlation_id, (api_key, api_version));
        inner
            .state
            .borrow_mut()
            .in_flight
            .insert(correlation_id, sender);

        self.ensure_supervised();

        trace!("sending {:?} v{} request to broker #{}, correlation id {}, {} bytes",
               api_key,
               api_version,
               inner.id,
               correlation_id,
               frame.len());

        let enqueued = inner.state.borrow().sender.unbounded_send(frame);

        if enqueued.is_err() {
            inner.hints.borrow_mut().remove(&correlation_id);
            inner.state.borrow_mut().in_flight.remove(&correlation_id);

            return SendRequest::err(ErrorKind::ConnectionError(format!("send queue of broker \
                                                                        #{} closed",
                                                                       inner.id))
                                            .into());
        }

        SendRequest::new(receiver.then(|result| match result {
                                           Ok(result) => result,
                                           Err(_) => {
                                               Err(ErrorKind::Canceled("in flight request")
                                                       .into())
                                           }
                                       }))
    }

    /// Complete every outstanding request with a dispose error and
    /// shut the supervisor down.
    pub fn dispose(&self) {
        let inner = &self.inner;

        let waiters = {
            let mut state = inner.state.borrow_mut();

            if state.disposed {
                return;
            }

            state.disposed = true;

            // dropping the live sender ends the send pump and with it
            // the supervisor
            let (sender, _) = mpsc::unbounded();
            state.sender = sender;
            state.receiver = None;

            mem::replace(&mut state.in_flight, HashMap::new())
        };

        inner.hints.borrow_mut().clear();

        debug!("connection #{} to {} disposed, {} requests in flight",
               inner.id,
               inner.endpoint,
               waiters.len());

        for (_, waiter) in waiters {
            let _ = waiter.send(Err(ErrorKind::ObjectDisposed("connection").into()));
        }
    }

    fn ensure_supervised(&self) {
        let spawn = {
            let mut state = self.inner.state.borrow_mut();

            if state.supervising || state.disposed {
                false
            } else {
                state.supervising = true;
                true
            }
        };

        if spawn {
            let inner = self.inner.clone();

            self.inner
                .handle
                .spawn(ConnInner::supervise(inner).map_err(|_| ()));
        }
    }
}

impl ConnInner {
    /// One acquire-pump-fault cycle; parks afterwards until a new send
    /// respawns it.
    fn supervise(inner: Rc<ConnInner>) -> Box<Future<Item = (), Error = ()>> {
        let receiver = {
            let mut state = inner.state.borrow_mut();

            match state.receiver.take() {
                Some(receiver) => receiver,
                None => {
                    let (sender, receiver) = mpsc::unbounded();
                    state.sender = sender;
                    receiver
                }
            }
        };

        let pumps = {
            let inner = inner.clone();

            ConnInner::connect_with_retry(inner.clone())
                .and_then(move |stream| ConnInner::run_pumps(inner, stream, receiver))
        };

        Box::new(pumps.then(move |result: Result<()>| {
            inner.fault(result.err());
            inner.state.borrow_mut().supervising = false;

            Ok(())
        }))
    }

    fn connect_with_retry(inner: Rc<ConnInner>) -> Box<Future<Item = TcpStream, Error = Error>> {
        let strategy = ExponentialBackoff::from_millis(inner.config.reconnect_backoff_millis)
            .map(jitter)
            .take(inner.config.max_connect_attempts.saturating_sub(1));

        let attempts = Cell::new(0usize);

        let retry = Retry::spawn(strategy, move || {
            let attempt = attempts.get() + 1;
            attempts.set(attempt);

            for observer in inner.observers.iter() {
                observer.reconnection_attempt(attempt);
            }

            ConnInner::connect_attempt(&inner, attempt)
        });

        Box::new(retry.map_err(Error::from))
    }

    fn connect_attempt(inner: &Rc<ConnInner>,
                       attempt: usize)
                       -> Box<Future<Item = TcpStream, Error = Error>> {
        let addr = inner.endpoint.addr();

        debug!("connecting to broker #{} @ {}, attempt {}",
               inner.id,
               addr,
               attempt);

        let timeout = match Timeout::new(inner.config.connect_timeout, &inner.handle) {
            Ok(timeout) => timeout,
            Err(err) => return Box::new(future::err(err.into())),
        };

        let connected = TcpStream::connect(&addr, &inner.handle)
            .select2(timeout)
            .then(move |result| match result {
                      Ok(Either::A((stream, _))) => Ok(stream),
                      Ok(Either::B(((), _))) => {
                          Err(ErrorKind::ConnectionError(format!("connect to {} timed out",
                                                                 addr))
                                  .into())
                      }
                      Err(Either::A((err, _))) |
                      Err(Either::B((err, _))) => Err(Error::from(err)),
                  });

        Box::new(connected)
    }

    /// Run the send and receive pumps over a connected stream until
    /// either faults; always resolves with the fault.
    fn run_pumps(inner: Rc<ConnInner>,
                 stream: TcpStream,
                 receiver: UnboundedReceiver<Bytes>)
                 -> Box<Future<Item = (), Error = Error>> {
        info!("connection #{} established to broker @ {}",
              inner.id,
              inner.endpoint);

        let codec = KafkaCodec::new(inner.hints.clone(),
                                    inner.discarded.clone(),
                                    inner.observers.clone());

        let (sink, stream) = stream.framed(codec).split();

        let send_pump = receiver
            .map_err(|()| Error::from(ErrorKind::Canceled("send queue")))
            .forward(sink)
            .map(|_| ());

        let recv_inner = inner.clone();
        let recv_pump = stream.for_each(move |(correlation_id, result)| {
                                            recv_inner.complete(correlation_id, result);

                                            Ok(())
                                        });

        Box::new(send_pump
                     .select2(recv_pump)
                     .then(|result| match result {
                               Ok(Either::A(((), _))) => {
                                   Err(ErrorKind::ConnectionError("send queue closed"
                                                                      .to_owned())
                                               .into())
                               }
                               Ok(Either::B(((), _))) => {
                                   Err(ErrorKind::ConnectionError("connection closed by peer"
                                                                      .to_owned())
                                               .into())
                               }
                               Err(Either::A((err, _))) |
                               Err(Either::B((err, _))) => Err(err),
                           }))
    }

    /// Hand a decoded response (or a per-frame decode error) to its
    /// waiter.
    fn complete(&self, correlation_id: CorrelationId, result: Result<KafkaResponse>) {
        let waiter = self.state.borrow_mut().in_flight.remove(&correlation_id);

        match waiter {
            Some(waiter) => {
                if waiter.send(result).is_err() {
                    self.discarded.set(self.discarded.get() + 1);

                    trace!("request with correlation id {} went away before its response",
                           correlation_id);
                }
            }
            None => {
                self.discarded.set(self.discarded.get() + 1);

                warn!("no waiter for correlation id {}", correlation_id);
            }
        }
    }

    /// Fail every in-flight request with a connection error wrapped
    /// over the root cause, and start a fresh queue generation.
    fn fault(&self, cause: Option<Error>) {
        for observer in self.observers.iter() {
            observer.server_disconnected();
        }

        let reason = cause
            .map(|err| err.to_string())
            .unwrap_or_else(|| "connection closed".to_owned());

        self.hints.borrow_mut().clear();

        let waiters = {
            let mut state = self.state.borrow_mut();

            if !state.disposed {
                // unsent frames die with the old socket's queue
                let (sender, receiver) = mpsc::unbounded();
                state.sender = sender;
                state.receiver = Some(receiver);
            }

            mem::replace(&mut state.in_flight, HashMap::new())
        };

        if !waiters.is_empty() {
            warn!("connection #{} to {} lost with {} requests in flight, {}",
                  self.id,
                  self.endpoint,
                  waiters.len(),
                  reason);
        }

        for (_, waiter) in waiters {
            let _ = waiter.send(Err(ErrorKind::ConnectionError(reason.clone()).into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use futures::future::Future;
    use tokio_core::reactor::Core;

    use super::*;

    fn read_frame(stream: &mut ::std::net::TcpStream) -> Vec<u8> {
        let mut prefix = [0u8; 4];
        stream.read_exact(&mut prefix).unwrap();

        let size = ((prefix[0] as usize) << 24) | ((prefix[1] as usize) << 16) |
                   ((prefix[2] as usize) << 8) | prefix[3] as usize;

        let mut frame = vec![0u8; size];
        stream.read_exact(&mut frame).unwrap();
        frame
    }

    fn api_versions_response(correlation_id: &[u8]) -> Vec<u8> {
        let mut frame = vec![0, 0, 0, 10];
        frame.extend_from_slice(correlation_id);
        frame.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
        frame
    }

    fn connection(core: &Core, addr: ::std::net::SocketAddr) -> KafkaConnection {
        KafkaConnection::new(0,
                             Endpoint::from(addr),
                             ConnectionConfig::default(),
                             core.handle(),
                             Rc::new(Vec::new()))
    }

    #[test]
    fn test_send_receives_matched_response() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let broker = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();

            // reply to two requests in reverse order
            let first = read_frame(&mut stream);
            let second = read_frame(&mut stream);

            stream
                .write_all(&api_versions_response(&second[4..8]))
                .unwrap();
            stream
                .write_all(&api_versions_response(&first[4..8]))
                .unwrap();
        });

        let mut core = Core::new().unwrap();
        let conn = connection(&core, addr);

        let first = conn.send(KafkaRequest::api_versions(0, None));
        let second = conn.send(KafkaRequest::api_versions(0, None));

        let (first, second) = core.run(first.join(second)).unwrap();

        assert_eq!(first.correlation_id(), 0);
        assert_eq!(second.correlation_id(), 1);

        broker.join().unwrap();
    }

    #[test]
    fn test_fault_completes_every_in_flight_request() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let broker = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();

            // swallow both requests, then drop the socket without replying
            let _ = read_frame(&mut stream);
            let _ = read_frame(&mut stream);
        });

        let mut core = Core::new().unwrap();
        let conn = connection(&core, addr);

        let first = conn.send(KafkaRequest::api_versions(0, None));
        let second = conn.send(KafkaRequest::api_versions(0, None));

        let result = core.run(first.join(second));

        assert!(result.is_err());
        assert_eq!(conn.in_flight_requests(), 0);

        broker.join().unwrap();
    }

    #[test]
    fn test_send_after_dispose_fails() {
        let mut core = Core::new().unwrap();
        let conn = connection(&core, "127.0.0.1:1".parse().unwrap());

        conn.dispose();

        let result = core.run(conn.send(KafkaRequest::api_versions(0, None)));

        match result {
            Err(ref err) => {
                if let ErrorKind::ObjectDisposed(_) = *err.kind() {
                } else {
                    panic!("unexpected error: {}", err)
                }
            }
            Ok(_) => panic!("send on a disposed connection must fail"),
        }
    }
}

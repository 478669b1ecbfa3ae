use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use futures::Future;
use futures::future::Either;
use tokio_service::Service;
use tokio_timer::Timer;

use errors::{Error, ErrorKind};
use client::{StaticBoxFuture, ToMilliseconds, ToStaticBoxFuture};

/// Counts the outstanding requests per broker address; the client uses
/// the counts to pick the least loaded broker for topology requests.
#[derive(Clone)]
pub struct InFlightMiddleware<S> {
    upstream: S,
    state: Rc<RefCell<State>>,
}

struct State {
    requests: HashMap<SocketAddr, usize>,
}

impl State {
    pub fn send_request(&mut self, addr: SocketAddr) {
        let requests = self.requests.entry(addr).or_insert(0);

        if let Some(new) = requests.checked_add(1) {
            *requests = new;
        }
    }

    pub fn received_response(&mut self, addr: SocketAddr) {
        let requests = self.requests.entry(addr).or_insert(0);

        if let Some(new) = requests.checked_sub(1) {
            *requests = new;
        }
    }
}

impl<S> InFlightMiddleware<S> {
    pub fn new(upstream: S) -> InFlightMiddleware<S> {
        InFlightMiddleware {
            upstream: upstream,
            state: Rc::new(RefCell::new(State { requests: HashMap::new() })),
        }
    }

    pub fn in_flight_requests(&self, addr: &SocketAddr) -> Option<usize> {
        self.state.borrow().requests.get(addr).cloned()
    }
}

impl<S> Service for InFlightMiddleware<S>
where
    Self: 'static,
    S: Service<Error = Error>,
    S::Request: WithAddr + 'static,
    S::Response: 'static,
    S::Future: 'static,
{
    type Request = S::Request;
    type Response = S::Response;
    type Error = S::Error;
    type Future = StaticBoxFuture<S::Response, S::Error>;

    fn call(&self, request: Self::Request) -> Self::Future {
        let addr = request.addr();
        let state = self.state.clone();

        state.borrow_mut().send_request(addr);

        self.upstream
            .call(request)
            .then(move |response| {
                state.borrow_mut().received_response(addr);

                response
            })
            .static_boxed()
    }
}

pub trait WithAddr {
    fn addr(&self) -> SocketAddr;
}

impl<T> WithAddr for (SocketAddr, T) {
    fn addr(&self) -> SocketAddr {
        self.0
    }
}

/// Traces every request and its outcome.
#[derive(Clone)]
pub struct LogMiddleware<S> {
    upstream: S,
}

impl<S> LogMiddleware<S> {
    pub fn new(upstream: S) -> LogMiddleware<S> {
        LogMiddleware { upstream: upstream }
    }
}

impl<S> Service for LogMiddleware<S>
where
    Self: 'static,
    S: Service<Error = Error>,
    S::Request: Debug + 'static,
    S::Response: Debug + 'static,
    S::Future: 'static,
{
    type Request = S::Request;
    type Response = S::Response;
    type Error = S::Error;
    type Future = StaticBoxFuture<S::Response, S::Error>;

    fn call(&self, request: Self::Request) -> Self::Future {
        trace!("sending request, {:?}", request);

        self.upstream
            .call(request)
            .then(|response| {
                match response {
                    Ok(ref response) => trace!("received response, {:?}", response),
                    Err(ref err) => trace!("request failed, {}", err),
                }

                response
            })
            .static_boxed()
    }
}

/// Bounds every request with the configured deadline; a late reply is
/// discarded by the connection and counted there.
#[derive(Clone)]
pub struct TimeoutMiddleware<S> {
    upstream: S,
    timer: Timer,
    timeout: Duration,
}

impl<S> TimeoutMiddleware<S> {
    pub fn new(upstream: S, timer: Timer, timeout: Duration) -> TimeoutMiddleware<S> {
        TimeoutMiddleware {
            upstream: upstream,
            timer: timer,
            timeout: timeout,
        }
    }
}

impl<S> Service for TimeoutMiddleware<S>
where
    Self: 'static,
    S: Service<Error = Error>,
    S::Request: 'static,
    S::Response: 'static,
    S::Future: 'static,
{
    type Request = S::Request;
    type Response = S::Response;
    type Error = S::Error;
    type Future = StaticBoxFuture<S::Response, S::Error>;

    fn call(&self, request: Self::Request) -> Self::Future {
        let millis = self.timeout.to_millis();
        let deadline = self.timer.sleep(self.timeout).map_err(Error::from);

        self.upstream
            .call(request)
            .select2(deadline)
            .then(move |result| match result {
                      Ok(Either::A((response, _))) => Ok(response),
                      Ok(Either::B(((), _))) => Err(ErrorKind::RequestTimeout(millis).into()),
                      Err(Either::A((err, _))) |
                      Err(Either::B((err, _))) => Err(err),
                  })
            .static_boxed()
    }
}

#[cfg(test)]
mod tests {
    use futures::future;
    use tokio_core::reactor::Core;

    use super::*;

    struct Immediate;

    impl Service for Immediate {
        type Request = (SocketAddr, u32);
        type Response = u32;
        type Error = Error;
        type Future = StaticBoxFuture<u32>;

        fn call(&self, request: Self::Request) -> Self::Future {
            future::ok(request.1).static_boxed()
        }
    }

    struct Never;

    impl Service for Never {
        type Request = (SocketAddr, u32);
        type Response = u32;
        type Error = Error;
        type Future = StaticBoxFuture<u32>;

        fn call(&self, _request: Self::Request) -> Self::Future {
            future::empty().static_boxed()
        }
    }

    #[test]
    fn test_in_flight_counting() {
        let service = InFlightMiddleware::new(Immediate);
        let addr: SocketAddr = "127.0.0.1:9092".parse().unwrap();

        assert_eq!(service.in_flight_requests(&addr), None);

        let mut core = Core::new().unwrap();
        let response = core.run(service.call((addr, 42))).unwrap();

        assert_eq!(response, 42);
        assert_eq!(service.in_flight_requests(&addr), Some(0));
    }

    #[test]
    fn test_timeout_middleware() {
        let timer = Timer::default();

        let service = TimeoutMiddleware::new(Never, timer.clone(), Duration::from_millis(50));
        let addr: SocketAddr = "127.0.0.1:9092".parse().unwrap();

        let mut core = Core::new().unwrap();
        let err = core.run(service.call((addr, 42))).unwrap_err();

        if let ErrorKind::RequestTimeout(millis) = *err.kind() {
            assert_eq!(millis, 50);
        } else {
            panic!("unexpected error: {}", err);
        }
    }
}

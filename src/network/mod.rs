use std::borrow::Cow;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};

use errors::{ErrorKind, Result};
use protocol::PartitionId;

mod codec;
mod conn;
mod request;
mod response;

pub use self::codec::{DecodeHints, KafkaCodec};
pub use self::conn::{ConnectionConfig, ConnectionObserver, KafkaConnection, SendRequest};
pub use self::request::KafkaRequest;
pub use self::response::KafkaResponse;

/// A topic and partition pair, the routing key of most requests.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TopicPartition<'a> {
    pub topic_name: Cow<'a, str>,
    pub partition: PartitionId,
}

impl<'a> TopicPartition<'a> {
    pub fn new<S: Into<Cow<'a, str>>>(topic_name: S, partition: PartitionId) -> Self {
        TopicPartition {
            topic_name: topic_name.into(),
            partition: partition,
        }
    }
}

impl<'a> fmt::Display for TopicPartition<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{}", self.topic_name, self.partition)
    }
}

/// A broker address, resolved once when constructed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
    addr: SocketAddr,
}

impl Endpoint {
    pub fn resolve(host: &str, port: u16) -> Result<Endpoint> {
        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                            ErrorKind::ConnectionError(format!("fail to resolve `{}:{}`",
                                                               host,
                                                               port))
                        })?;

        Ok(Endpoint {
               host: host.to_owned(),
               port: port,
               addr: addr,
           })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Endpoint {
            host: addr.ip().to_string(),
            port: addr.port(),
            addr: addr,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_partition_display() {
        assert_eq!(TopicPartition::new("topic", 2).to_string(), "topic#2");
    }

    #[test]
    fn test_endpoint_from_addr() {
        let endpoint = Endpoint::from("127.0.0.1:9092".parse::<SocketAddr>().unwrap());

        assert_eq!(endpoint.host(), "127.0.0.1");
        assert_eq!(endpoint.port(), 9092);
        assert_eq!(endpoint.to_string(), "127.0.0.1:9092");
    }

    #[test]
    fn test_endpoint_resolve() {
        let endpoint = Endpoint::resolve("127.0.0.1", 9092).unwrap();

        assert_eq!(endpoint.addr(), "127.0.0.1:9092".parse().unwrap());
    }
}

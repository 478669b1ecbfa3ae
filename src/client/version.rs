use std::fmt;
use std::mem;
use std::result::Result as StdResult;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};

use errors::{Error, ErrorKind, Result};
use protocol::{ApiKeys, ApiVersion, SupportedApiVersion, UsableApiVersions};

/// The latest api version of each request kind this codec can put on
/// the wire.
pub fn max_supported_version(api_key: ApiKeys) -> ApiVersion {
    match api_key {
        ApiKeys::Produce | ApiKeys::Fetch | ApiKeys::OffsetCommit => 2,
        ApiKeys::ListOffsets | ApiKeys::JoinGroup => 1,
        _ => 0,
    }
}

/// A broker release, used to pick request versions when the broker
/// predates the `ApiVersions` request.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(u16)]
pub enum KafkaVersion {
    KAFKA_0_8_0 = 800,
    KAFKA_0_8_1 = 801,
    KAFKA_0_8_2 = 802,
    KAFKA_0_9_0 = 900,
    KAFKA_0_10_0 = 1000,
}

impl KafkaVersion {
    pub fn version(&self) -> &'static str {
        match *self {
            KafkaVersion::KAFKA_0_8_0 => "0.8.0",
            KafkaVersion::KAFKA_0_8_1 => "0.8.1",
            KafkaVersion::KAFKA_0_8_2 => "0.8.2",
            KafkaVersion::KAFKA_0_9_0 => "0.9.0",
            KafkaVersion::KAFKA_0_10_0 => "0.10.0",
        }
    }

    pub fn value(&self) -> u16 {
        unsafe { mem::transmute(*self) }
    }

    /// The api versions a broker of this release is known to accept.
    pub fn api_versions(&self) -> UsableApiVersions {
        match *self {
            KafkaVersion::KAFKA_0_8_0 |
            KafkaVersion::KAFKA_0_8_1 => {
                UsableApiVersions::new(vec![supported(ApiKeys::Produce, 0, 0),
                                            supported(ApiKeys::Fetch, 0, 0),
                                            supported(ApiKeys::ListOffsets, 0, 0),
                                            supported(ApiKeys::Metadata, 0, 0)])
            }
            KafkaVersion::KAFKA_0_8_2 => {
                UsableApiVersions::new(vec![supported(ApiKeys::Produce, 0, 0),
                                            supported(ApiKeys::Fetch, 0, 0),
                                            supported(ApiKeys::ListOffsets, 0, 0),
                                            supported(ApiKeys::Metadata, 0, 0),
                                            supported(ApiKeys::OffsetCommit, 0, 1),
                                            supported(ApiKeys::OffsetFetch, 0, 0),
                                            supported(ApiKeys::GroupCoordinator, 0, 0)])
            }
            KafkaVersion::KAFKA_0_9_0 => {
                UsableApiVersions::new(vec![supported(ApiKeys::Produce, 0, 1),
                                            supported(ApiKeys::Fetch, 0, 1),
                                            supported(ApiKeys::ListOffsets, 0, 0),
                                            supported(ApiKeys::Metadata, 0, 0),
                                            supported(ApiKeys::OffsetCommit, 0, 2),
                                            supported(ApiKeys::OffsetFetch, 0, 0),
                                            supported(ApiKeys::GroupCoordinator, 0, 0),
                                            supported(ApiKeys::JoinGroup, 0, 0),
                                            supported(ApiKeys::Heartbeat, 0, 0),
                                            supported(ApiKeys::LeaveGroup, 0, 0),
                                            supported(ApiKeys::SyncGroup, 0, 0),
                                            supported(ApiKeys::DescribeGroups, 0, 0),
                                            supported(ApiKeys::ListGroups, 0, 0)])
            }
            KafkaVersion::KAFKA_0_10_0 => {
                UsableApiVersions::new(vec![supported(ApiKeys::Produce, 0, 2),
                                            supported(ApiKeys::Fetch, 0, 2),
                                            supported(ApiKeys::ListOffsets, 0, 1),
                                            supported(ApiKeys::Metadata, 0, 0),
                                            supported(ApiKeys::OffsetCommit, 0, 2),
                                            supported(ApiKeys::OffsetFetch, 0, 0),
                                            supported(ApiKeys::GroupCoordinator, 0, 0),
                                            supported(ApiKeys::JoinGroup, 0, 1),
                                            supported(ApiKeys::Heartbeat, 0, 0),
                                            supported(ApiKeys::LeaveGroup, 0, 0),
                                            supported(ApiKeys::SyncGroup, 0, 0),
                                            supported(ApiKeys::DescribeGroups, 0, 0),
                                            supported(ApiKeys::ListGroups, 0, 0),
                                            supported(ApiKeys::SaslHandshake, 0, 0),
                                            supported(ApiKeys::ApiVersions, 0, 0)])
            }
        }
    }
}

fn supported(api_key: ApiKeys, min_version: ApiVersion, max_version: ApiVersion)
             -> SupportedApiVersion {
    SupportedApiVersion {
        api_key: api_key as i16,
        min_version: min_version,
        max_version: max_version,
    }
}

impl Default for KafkaVersion {
    fn default() -> Self {
        KafkaVersion::KAFKA_0_9_0
    }
}

impl FromStr for KafkaVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "0.8.0" => Ok(KafkaVersion::KAFKA_0_8_0),
            "0.8.1" => Ok(KafkaVersion::KAFKA_0_8_1),
            "0.8.2" => Ok(KafkaVersion::KAFKA_0_8_2),
            "0.9.0" => Ok(KafkaVersion::KAFKA_0_9_0),
            "0.10.0" => Ok(KafkaVersion::KAFKA_0_10_0),
            _ => bail!(ErrorKind::ValidationError(format!("unknown kafka version: {}", s))),
        }
    }
}

impl fmt::Display for KafkaVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.version())
    }
}

impl Serialize for KafkaVersion {
    fn serialize<S>(&self, serializer: S) -> StdResult<S::Ok, S::Error>
        where S: Serializer
    {
        serializer.serialize_str(self.version())
    }
}

impl<'de> Deserialize<'de> for KafkaVersion {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
        where D: Deserializer<'de>
    {
        struct KafkaVersionVistor;

        impl<'de> Visitor<'de> for KafkaVersionVistor {
            type Value = KafkaVersion;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("Valid values are: 0.10.0, 0.9.0, 0.8.2, 0.8.1, 0.8.0.")
            }

            fn visit_str<E>(self, v: &str) -> StdResult<Self::Value, E>
                where E: de::Error
            {
                v.parse().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(KafkaVersionVistor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!("0.9.0".parse::<KafkaVersion>().unwrap(),
                   KafkaVersion::KAFKA_0_9_0);
        assert!("0.7.0".parse::<KafkaVersion>().is_err());
    }

    #[test]
    fn test_fallback_api_versions() {
        let versions = KafkaVersion::KAFKA_0_8_0.api_versions();

        assert_eq!(versions.find(ApiKeys::Produce).map(|v| v.max_version), Some(0));
        assert_eq!(versions.find(ApiKeys::JoinGroup), None);

        let versions = KafkaVersion::KAFKA_0_10_0.api_versions();

        assert_eq!(versions.find(ApiKeys::Produce).map(|v| v.max_version), Some(2));
        assert_eq!(versions.find(ApiKeys::Fetch).map(|v| v.max_version), Some(2));
    }

    #[test]
    fn test_max_supported_version() {
        assert_eq!(max_supported_version(ApiKeys::Produce), 2);
        assert_eq!(max_supported_version(ApiKeys::Metadata), 0);
    }
}

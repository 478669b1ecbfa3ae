use std::collections::HashMap;
use std::rc::Rc;

use bytes::Bytes;

use errors::Result;

/// Encodes and decodes the opaque member metadata and assignment
/// payloads carried by the group membership APIs.
///
/// The wire codec treats those payloads as byte slabs; their layout
/// belongs to the group protocol type (e.g. `consumer`), so encoding
/// them is delegated to whichever codec is registered for that type.
pub trait ProtocolCodec {
    /// The protocol type this codec understands.
    fn protocol_type(&self) -> &str;

    fn encode_metadata(&self, metadata: &ProtocolMetadata) -> Result<Bytes>;

    fn decode_metadata(&self, raw: &Bytes) -> Result<ProtocolMetadata>;
}

/// A group member's subscription, in protocol-type neutral form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProtocolMetadata {
    pub version: i16,
    pub topic_names: Vec<String>,
    pub user_data: Option<Bytes>,
}

/// Looks up the payload codec for a protocol-type string.
#[derive(Clone, Default)]
pub struct ProtocolCodecRegistry {
    codecs: HashMap<String, Rc<ProtocolCodec>>,
}

impl ProtocolCodecRegistry {
    pub fn new() -> Self {
        ProtocolCodecRegistry { codecs: HashMap::new() }
    }

    pub fn register(&mut self, codec: Rc<ProtocolCodec>) {
        self.codecs.insert(codec.protocol_type().to_owned(), codec);
    }

    pub fn find(&self, protocol_type: &str) -> Option<Rc<ProtocolCodec>> {
        self.codecs.get(protocol_type).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OpaqueCodec;

    impl ProtocolCodec for OpaqueCodec {
        fn protocol_type(&self) -> &str {
            "opaque"
        }

        fn encode_metadata(&self, _metadata: &ProtocolMetadata) -> Result<Bytes> {
            Ok(Bytes::new())
        }

        fn decode_metadata(&self, _raw: &Bytes) -> Result<ProtocolMetadata> {
            Ok(ProtocolMetadata::default())
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = ProtocolCodecRegistry::new();

        assert!(registry.find("opaque").is_none());

        registry.register(Rc::new(OpaqueCodec));

        assert!(registry.find("opaque").is_some());
        assert!(registry.find("consumer").is_none());
    }
}

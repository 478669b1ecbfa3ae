use bytes::{BufMut, ByteOrder, Bytes, BytesMut};

use crc::crc32;

use time;

use errors::{ErrorKind, Result};
use compression::Compression;
use protocol::{ApiVersion, Offset, Timestamp, WriteExt, read_i8, read_i32, read_i64,
               read_nullable_bytes, with_crc_prefix, with_length_prefix};

pub const TIMESTAMP_TYPE_MASK: i8 = 0x08;
pub const COMPRESSION_CODEC_MASK: i8 = 0x07;

/// Message sets
///
/// One structure common to both the produce and fetch requests is the message set format.
/// A message in kafka is a key-value pair with a small amount of associated metadata.
/// A message set is just a sequence of messages with offset and size information.
/// This format happens to be used both for the on-disk storage on the broker and the on-the-wire format.
///
/// MessageSet => [Offset MessageSize Message]
///   Offset => int64
///   MessageSize => int32
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageSet {
    pub messages: Vec<Message>,
}

/// Message format
///
/// v0
/// Message => Crc MagicByte Attributes Key Value
///   Crc => int32
///   MagicByte => int8
///   Attributes => int8
///   Key => bytes
///   Value => bytes
///
/// v1 (supported since 0.10.0)
/// Message => Crc MagicByte Attributes Timestamp Key Value
///   Crc => int32
///   MagicByte => int8
///   Attributes => int8
///   Timestamp => int64
///   Key => bytes
///   Value => bytes
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub offset: Offset,
    pub timestamp: Option<MessageTimestamp>,
    pub compression: Compression,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MessageTimestamp {
    CreateTime(Timestamp),
    LogAppendTime(Timestamp),
}

impl MessageTimestamp {
    pub fn value(&self) -> Timestamp {
        match *self {
            MessageTimestamp::CreateTime(v) |
            MessageTimestamp::LogAppendTime(v) => v,
        }
    }
}

impl Default for MessageTimestamp {
    fn default() -> Self {
        let ts = time::now_utc().to_timespec();

        MessageTimestamp::CreateTime(ts.sec * 1000 + Timestamp::from(ts.nsec) / 1_000_000)
    }
}

/// Writes message sets in the given message format version, wrapping
/// the whole set into a single compressed message when a codec is
/// configured.
pub struct MessageSetEncoder {
    api_version: ApiVersion,
    compression: Compression,
}

impl MessageSetEncoder {
    pub fn new(api_version: ApiVersion, compression: Compression) -> Self {
        MessageSetEncoder {
            api_version: api_version,
            compression: compression,
        }
    }

    pub fn encode<T: ByteOrder>(&self, message_set: &MessageSet, buf: &mut BytesMut) -> Result<()> {
        match self.compression {
            Compression::None => {
                for message in &message_set.messages {
                    self.encode_message::<T>(message, message.offset, buf)?;
                }

                Ok(())
            }
            #[cfg(feature = "gzip")]
            Compression::Gzip => {
                let inner = MessageSetEncoder::new(self.api_version, Compression::None);
                let mut inner_buf = BytesMut::with_capacity(64);
                inner.encode::<T>(message_set, &mut inner_buf)?;

                let compressed = ::compression::gzip::compress(&inner_buf)?;

                // the broker assigns the real offsets of the wrapped batch
                let wrapper = Message {
                    offset: 0,
                    timestamp: if self.api_version > 0 {
                        Some(MessageTimestamp::default())
                    } else {
                        None
                    },
                    compression: Compression::Gzip,
                    key: None,
                    value: Some(Bytes::from(compressed)),
                };

                self.encode_message::<T>(&wrapper, 0, buf)
            }
        }
    }

    fn encode_message<T: ByteOrder>(&self,
                                    message: &Message,
                                    offset: Offset,
                                    buf: &mut BytesMut)
                                    -> Result<()> {
        buf.put_i64::<T>(offset);

        with_length_prefix::<T, _>(buf, |buf| {
            with_crc_prefix::<T, _>(buf, |buf| {
                buf.put_i8(self.api_version as i8);
                buf.put_i8((message.compression as i8 & COMPRESSION_CODEC_MASK) |
                           if let Some(MessageTimestamp::LogAppendTime(_)) = message.timestamp {
                               TIMESTAMP_TYPE_MASK
                           } else {
                               0
                           });

                if self.api_version > 0 {
                    buf.put_i64::<T>(message
                                         .timestamp
                                         .as_ref()
                                         .cloned()
                                         .unwrap_or_default()
                                         .value());
                }

                buf.put_bytes::<T, _>(message.key.as_ref())?;
                buf.put_bytes::<T, _>(message.value.as_ref())
            })
        })
    }
}

const MESSAGE_SET_ENTRY_OVERHEAD: usize = 12;

/// Decode a message set out of `buf`.
///
/// A partial entry at the end of the buffer is silently discarded,
/// since the broker may truncate a fetched set at the fetch size
/// boundary; when `complete` is set, a declared message size past the
/// end of the buffer fails the decode instead.
pub fn decode_message_set(buf: &[u8], complete: bool) -> Result<MessageSet> {
    let mut remaining = buf;
    let mut messages = Vec::new();

    while !remaining.is_empty() {
        if remaining.len() < MESSAGE_SET_ENTRY_OVERHEAD {
            break;
        }

        let offset = read_i64(&mut remaining, "message offset")?;
        let size = read_i32(&mut remaining, "message size")?;

        if size < 0 {
            bail!(ErrorKind::CodecError("negative message size"))
        }

        if remaining.len() < size as usize {
            if complete {
                bail!(ErrorKind::BufferUnderRun("message body"))
            }

            trace!("discard truncated trailing message, offset {}, {} bytes declared, {} remaining",
                   offset,
                   size,
                   remaining.len());

            break;
        }

        let (body, rest) = remaining.split_at(size as usize);
        messages.extend(decode_message(offset, body)?);
        remaining = rest;
    }

    Ok(MessageSet { messages: messages })
}

fn decode_message(offset: Offset, raw: &[u8]) -> Result<Vec<Message>> {
    let mut buf = raw;

    let stored = read_i32(&mut buf, "message crc")? as u32;
    let computed = crc32::checksum_ieee(buf);
    if stored != computed {
        bail!(ErrorKind::CrcValidation(stored, computed))
    }

    let magic = read_i8(&mut buf, "message magic")?;
    let attrs = read_i8(&mut buf, "message attributes")?;
    let timestamp = if magic > 0 {
        Some(read_i64(&mut buf, "message timestamp")?)
    } else {
        None
    };
    let key = read_nullable_bytes(&mut buf, "message key")?;
    let value = read_nullable_bytes(&mut buf, "message value")?;

    let codec = Compression::from_attributes(attrs & COMPRESSION_CODEC_MASK)?;

    match codec {
        Compression::None => {
            Ok(vec![Message {
                        offset: offset,
                        timestamp: timestamp.map(|ts| if attrs & TIMESTAMP_TYPE_MASK == 0 {
                                                     MessageTimestamp::CreateTime(ts)
                                                 } else {
                                                     MessageTimestamp::LogAppendTime(ts)
                                                 }),
                        compression: codec,
                        key: key.map(Bytes::from),
                        value: value.map(Bytes::from),
                    }])
        }
        #[cfg(feature = "gzip")]
        Compression::Gzip => {
            let value = match value {
                Some(value) => value,
                None => bail!(ErrorKind::CodecError("compressed message without a value")),
            };

            let inner = ::compression::gzip::uncompress(value)?;

            // inner messages carry their own offsets
            decode_message_set(&inner, true).map(|set| set.messages)
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::BigEndian;

    use errors::ErrorKind;
    use super::*;

    fn message(offset: Offset,
               key: Option<&'static [u8]>,
               value: Option<&'static [u8]>)
               -> Message {
        Message {
            offset: offset,
            timestamp: None,
            compression: Compression::None,
            key: key.map(Bytes::from),
            value: value.map(Bytes::from),
        }
    }

    fn encode(message_set: &MessageSet,
              api_version: ApiVersion,
              compression: Compression)
              -> BytesMut {
        let mut buf = BytesMut::with_capacity(128);
        MessageSetEncoder::new(api_version, compression)
            .encode::<BigEndian>(message_set, &mut buf)
            .unwrap();
        buf
    }

    lazy_static!{
        // a single v0 message, offset 5, no key, value "hi"
        static ref TEST_MESSAGE_SET_DATA: Vec<u8> = vec![
            0, 0, 0, 0, 0, 0, 0, 5,     // offset
            0, 0, 0, 16,                // size
            0xfd, 0x6e, 0xbd, 0xdb,     // crc
            0,                          // magic
            0,                          // attributes
            0xff, 0xff, 0xff, 0xff,     // key
            0, 0, 0, 2, b'h', b'i',     // value
        ];
    }

    #[test]
    fn test_encode_message_set() {
        let message_set = MessageSet { messages: vec![message(5, None, Some(b"hi"))] };

        assert_eq!(&encode(&message_set, 0, Compression::None)[..],
                   &TEST_MESSAGE_SET_DATA[..]);
    }

    #[test]
    fn test_message_crc() {
        // crc input: magic, attributes, null key, value [0x61]
        let message_set = MessageSet { messages: vec![message(0, None, Some(b"a"))] };
        let buf = encode(&message_set, 0, Compression::None);

        assert_eq!(&buf[12..16], &[0x51, 0xdf, 0x3a, 0x32][..]);
    }

    #[test]
    fn test_decode_message_set() {
        let message_set = decode_message_set(&TEST_MESSAGE_SET_DATA[..], true).unwrap();

        assert_eq!(message_set,
                   MessageSet { messages: vec![message(5, None, Some(b"hi"))] });
    }

    #[test]
    fn test_round_trip_v0() {
        let message_set = MessageSet {
            messages: vec![message(0, Some(b"key"), Some(b"value")),
                           message(1, None, Some(b"hi"))],
        };

        let buf = encode(&message_set, 0, Compression::None);

        assert_eq!(decode_message_set(&buf[..], true).unwrap(), message_set);
    }

    #[test]
    fn test_round_trip_v1_timestamp() {
        let message_set = MessageSet {
            messages: vec![Message {
                               offset: 3,
                               timestamp: Some(MessageTimestamp::CreateTime(456)),
                               compression: Compression::None,
                               key: Some(Bytes::from(&b"key"[..])),
                               value: Some(Bytes::from(&b"value"[..])),
                           }],
        };

        let buf = encode(&message_set, 1, Compression::None);

        // reference vector for the v1 message body
        assert_eq!(&buf[12..16], &[226, 52, 65, 188][..]);

        assert_eq!(decode_message_set(&buf[..], true).unwrap(), message_set);
    }

    #[test]
    fn test_decode_partial_trailing_message() {
        let message_set = MessageSet {
            messages: vec![message(0, None, Some(b"first")),
                           message(1, None, Some(b"second"))],
        };

        let buf = encode(&message_set, 0, Compression::None);

        // the broker may cut the set anywhere inside the last message
        let truncated = &buf[..buf.len() - 3];

        let decoded = decode_message_set(truncated, false).unwrap();
        assert_eq!(decoded.messages, vec![message(0, None, Some(b"first"))]);

        // fewer than 12 bytes of a trailing entry header is a clean end too
        let decoded = decode_message_set(&buf[..buf.len() - 25], false).unwrap();
        assert_eq!(decoded.messages.len(), 1);
    }

    #[test]
    fn test_decode_truncated_message_when_complete() {
        let message_set = MessageSet { messages: vec![message(0, None, Some(b"payload"))] };

        let buf = encode(&message_set, 0, Compression::None);
        let err = decode_message_set(&buf[..buf.len() - 1], true).unwrap_err();

        if let ErrorKind::BufferUnderRun(_) = *err.kind() {
        } else {
            panic!("unexpected error: {}", err);
        }
    }

    #[test]
    fn test_decode_crc_mismatch() {
        let message_set = MessageSet { messages: vec![message(0, None, Some(b"hi"))] };

        let mut buf = encode(&message_set, 0, Compression::None);
        let last = buf.len() - 1;
        buf[last] ^= 0xff;

        let err = decode_message_set(&buf[..], true).unwrap_err();

        if let ErrorKind::CrcValidation(..) = *err.kind() {
        } else {
            panic!("unexpected error: {}", err);
        }
    }

    #[test]
    fn test_decode_unsupported_codec() {
        let message_set = MessageSet { messages: vec![message(0, None, Some(b"hi"))] };

        let mut buf = encode(&message_set, 0, Compression::None);
        buf[17] = 0x02; // unknown codec bits
        let crc = crc32::checksum_ieee(&buf[16..]);
        BigEndian::write_i32(&mut buf[12..], crc as i32);

        let err = decode_message_set(&buf[..], true).unwrap_err();

        if let ErrorKind::NotSupportedCodec(attr) = *err.kind() {
            assert_eq!(attr, 0x02);
        } else {
            panic!("unexpected error: {}", err);
        }
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn test_gzip_round_trip() {
        let message_set = MessageSet {
            messages: vec![message(0, Some(b"key"), Some(b"value")),
                           message(1, None, Some(b"hi"))],
        };

        let buf = encode(&message_set, 0, Compression::Gzip);

        // a single wrapper message carries the whole set
        assert_eq!(BigEndian::read_i64(&buf[..8]), 0);
        assert_eq!(buf[17] & COMPRESSION_CODEC_MASK as u8, 1);

        assert_eq!(decode_message_set(&buf[..], true).unwrap(), message_set);
    }
}

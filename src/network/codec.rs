use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use bytes::{BigEndian, Bytes, BytesMut, ByteOrder};

use hexplay::HexViewBuilder;

use tokio_io::codec::{Decoder, Encoder};

use errors::{Error, ErrorKind};
use network::ConnectionObserver;
use network::response::KafkaResponse;
use protocol::{ApiKeys, ApiVersion, CorrelationId};

const FRAME_PREFIX_SIZE: usize = 4;

/// Which decoder a pending correlation id needs, recorded at encode
/// time and consumed when the matching frame arrives.
pub type DecodeHints = Rc<RefCell<HashMap<CorrelationId, (ApiKeys, ApiVersion)>>>;

/// Frames the Kafka wire protocol over a socket.
///
/// Outbound items are fully framed requests (the connection owns the
/// header assignment and the length prefix); inbound frames are split
/// on the leading int32 size, matched to a decode hint by correlation
/// id and decoded into typed responses.
pub struct KafkaCodec {
    hints: DecodeHints,
    discarded: Rc<Cell<usize>>,
    observers: Rc<Vec<Rc<ConnectionObserver>>>,
    receiving: Option<usize>,
}

impl KafkaCodec {
    pub fn new(hints: DecodeHints,
               discarded: Rc<Cell<usize>>,
               observers: Rc<Vec<Rc<ConnectionObserver>>>)
               -> Self {
        KafkaCodec {
            hints: hints,
            discarded: discarded,
            observers: observers,
            receiving: None,
        }
    }
}

impl Encoder for KafkaCodec {
    type Item = Bytes;
    type Error = Error;

    fn encode(&mut self, frame: Bytes, dst: &mut BytesMut) -> Result<(), Error> {
        trace!("sending frame of {} bytes:\n{}",
               frame.len(),
               HexViewBuilder::new(&frame).row_width(16).finish());

        dst.extend_from_slice(&frame);

        for observer in self.observers.iter() {
            observer.sent_to_socket(frame.len());
        }

        Ok(())
    }
}

impl Decoder for KafkaCodec {
    type Item = (CorrelationId, Result<KafkaResponse, Error>);
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Error> {
        loop {
            if src.len() < FRAME_PREFIX_SIZE {
                return Ok(None);
            }

            let size = BigEndian::read_i32(&src[..]);

            if size < 0 {
                bail!(ErrorKind::CodecError("negative response frame size"))
            }

            let frame_size = FRAME_PREFIX_SIZE + size as usize;

            if src.len() < frame_size {
                if self.receiving != Some(frame_size) {
                    self.receiving = Some(frame_size);

                    for observer in self.observers.iter() {
                        observer.receiving_from_socket(frame_size);
                    }
                }

                return Ok(None);
            }

            self.receiving = None;

            let frame = src.split_to(frame_size);
            let body = &frame[FRAME_PREFIX_SIZE..];

            for observer in self.observers.iter() {
                observer.received_from_socket(frame.len());
            }

            if body.len() < 4 {
                bail!(ErrorKind::BufferUnderRun("response correlation id"))
            }

            let correlation_id = BigEndian::read_i32(body);

            let hint = self.hints.borrow_mut().remove(&correlation_id);

            match hint {
                Some((api_key, api_version)) => {
                    trace!("received {:?} v{} response frame of {} bytes, correlation id {}",
                           api_key,
                           api_version,
                           frame.len(),
                           correlation_id);

                    let result = KafkaResponse::decode(body, api_key, api_version);

                    return Ok(Some((correlation_id, result)));
                }
                None => {
                    self.discarded.set(self.discarded.get() + 1);

                    warn!("discard a response frame without a pending request, correlation id {}",
                          correlation_id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> (KafkaCodec, DecodeHints, Rc<Cell<usize>>) {
        let hints: DecodeHints = Rc::new(RefCell::new(HashMap::new()));
        let discarded = Rc::new(Cell::new(0));
        let codec = KafkaCodec::new(hints.clone(), discarded.clone(), Rc::new(Vec::new()));

        (codec, hints, discarded)
    }

    // a framed ApiVersions response with no supported versions
    fn api_versions_frame(correlation_id: i32) -> Vec<u8> {
        let mut frame = vec![0, 0, 0, 10];
        frame.extend_from_slice(&[(correlation_id >> 24) as u8,
                                  (correlation_id >> 16) as u8,
                                  (correlation_id >> 8) as u8,
                                  correlation_id as u8]);
        frame.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
        frame
    }

    #[test]
    fn test_decode_partial_then_complete_frame() {
        let (mut codec, hints, _) = codec();

        hints.borrow_mut().insert(42, (ApiKeys::ApiVersions, 0));

        let frame = api_versions_frame(42);
        let mut src = BytesMut::from(&frame[..7]);

        assert!(codec.decode(&mut src).unwrap().is_none());

        src.extend_from_slice(&frame[7..]);

        let (correlation_id, result) = codec.decode(&mut src).unwrap().unwrap();

        assert_eq!(correlation_id, 42);
        assert_eq!(result.unwrap().api_key(), ApiKeys::ApiVersions);
        assert!(src.is_empty());
        assert!(hints.borrow().is_empty());
    }

    #[test]
    fn test_decode_skips_unmatched_frame() {
        let (mut codec, hints, discarded) = codec();

        hints.borrow_mut().insert(2, (ApiKeys::ApiVersions, 0));

        let mut src = BytesMut::from(api_versions_frame(1));
        src.extend_from_slice(&api_versions_frame(2));

        let (correlation_id, result) = codec.decode(&mut src).unwrap().unwrap();

        assert_eq!(correlation_id, 2);
        assert!(result.is_ok());
        assert_eq!(discarded.get(), 1);
    }

    #[test]
    fn test_encode_passes_frame_through() {
        let (mut codec, _, _) = codec();

        let mut dst = BytesMut::with_capacity(64);

        codec
            .encode(Bytes::from(&[0u8, 0, 0, 0][..]), &mut dst)
            .unwrap();

        assert_eq!(&dst[..], &[0, 0, 0, 0][..]);
    }
}

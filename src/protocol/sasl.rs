use std::borrow::Cow;

use bytes::{ByteOrder, BytesMut};

use nom::{be_i16, be_i32};

use errors::Result;
use protocol::{Encodable, ErrorCode, ParseTag, RequestHeader, ResponseHeader, WriteExt,
               parse_response_header, parse_string};

/// SaslHandshakeRequest => Mechanism
///   Mechanism => string
#[derive(Clone, Debug, PartialEq)]
pub struct SaslHandshakeRequest<'a> {
    pub header: RequestHeader<'a>,
    pub mechanism: Cow<'a, str>,
}

impl<'a> Encodable for SaslHandshakeRequest<'a> {
    fn encode<T: ByteOrder>(&self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;
        dst.put_str::<T, _>(Some(self.mechanism.as_ref()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SaslHandshakeResponse {
    pub header: ResponseHeader,
    pub error_code: ErrorCode,
    /// The mechanisms enabled on the broker.
    pub enabled_mechanisms: Vec<String>,
}

named!(pub parse_sasl_handshake_response<SaslHandshakeResponse>,
    parse_tag!(ParseTag::SaslHandshakeResponse,
        do_parse!(
            header: parse_response_header
         >> error_code: be_i16
         >> enabled_mechanisms: length_count!(be_i32, parse_string)
         >> (SaslHandshakeResponse {
                header: header,
                error_code: error_code,
                enabled_mechanisms: enabled_mechanisms,
            })
        )
    )
);

#[cfg(test)]
mod tests {
    use bytes::BigEndian;

    use nom::IResult;

    use protocol::*;
    use super::*;

    #[test]
    fn test_encode_sasl_handshake_request() {
        let req = SaslHandshakeRequest {
            header: RequestHeader {
                api_key: ApiKeys::SaslHandshake as ApiKey,
                api_version: 0,
                correlation_id: 123,
                client_id: None,
            },
            mechanism: "PLAIN".into(),
        };

        let mut buf = BytesMut::with_capacity(64);

        req.encode::<BigEndian>(&mut buf).unwrap();

        assert_eq!(&buf[..],
                   &[0, 17, 0, 0, 0, 0, 0, 123, 0xff, 0xff,
                     0, 5, b'P', b'L', b'A', b'I', b'N'][..]);
    }

    #[test]
    fn test_parse_sasl_handshake_response() {
        let data = [0, 0, 0, 123,
                    0, 0,
                    0, 0, 0, 2,
                        0, 6, b'G', b'S', b'S', b'A', b'P', b'I',
                        0, 5, b'P', b'L', b'A', b'I', b'N'];

        let res = SaslHandshakeResponse {
            header: ResponseHeader { correlation_id: 123 },
            error_code: 0,
            enabled_mechanisms: vec!["GSSAPI".to_owned(), "PLAIN".to_owned()],
        };

        assert_eq!(parse_sasl_handshake_response(&data[..]),
                   IResult::Done(&b""[..], res));
    }
}

use std::fmt;
use std::str::FromStr;

use errors::{Error, ErrorKind, Result};

/// The compression codec carried in the low bits of a message's
/// attribute byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i8)]
pub enum Compression {
    None = 0,
    #[cfg(feature = "gzip")]
    Gzip = 1,
}

impl Default for Compression {
    fn default() -> Self {
        Compression::None
    }
}

impl Compression {
    /// Decode the codec bits of a message attribute byte; attribute
    /// values outside the supported set fail the decode.
    pub fn from_attributes(attr: i8) -> Result<Compression> {
        match attr {
            0 => Ok(Compression::None),
            #[cfg(feature = "gzip")]
            1 => Ok(Compression::Gzip),
            _ => bail!(ErrorKind::NotSupportedCodec(attr)),
        }
    }

    pub fn name(&self) -> &'static str {
        match *self {
            Compression::None => "none",
            #[cfg(feature = "gzip")]
            Compression::Gzip => "gzip",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Compression::None),
            #[cfg(feature = "gzip")]
            "gzip" => Ok(Compression::Gzip),
            _ => bail!(ErrorKind::CodecError("unknown compression codec name")),
        }
    }
}

#[cfg(feature = "gzip")]
pub mod gzip {
    use std::io::prelude::*;

    use flate2::Compression;
    use flate2::read::GzDecoder;
    use flate2::write::GzEncoder;

    use errors::Result;

    pub fn compress(src: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(src.len()), Compression::default());
        encoder.write_all(src)?;
        Ok(encoder.finish()?)
    }

    pub fn uncompress(src: &[u8]) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(src.len() * 2);
        GzDecoder::new(src).read_to_end(&mut buf)?;
        Ok(buf)
    }
}

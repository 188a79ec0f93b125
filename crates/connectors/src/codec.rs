//! Text encodings for files and byte conversion, looked up by codec name.

use crate::error::AdapterError;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;
use std::{fmt, io};

/// A named text encoding.
///
/// Names follow the WHATWG labels (`windows-1252`, `shift_jis`, `gbk`, ...)
/// plus the common spellings `latin-1`, `utf_8`, `utf-16-le` and
/// `utf-8-sig`. `utf-16` and `utf-8-sig` write a byte order mark.
#[derive(Clone, Copy)]
pub struct Codec {
    encoding: &'static Encoding,
    bom: bool,
    ascii_only: bool,
}

impl Codec {
    pub fn utf8() -> Self {
        Codec {
            encoding: UTF_8,
            bom: false,
            ascii_only: false,
        }
    }

    pub fn for_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
        let (alias, bom) = match normalized.as_str() {
            "latin-1" | "latin" => ("latin1", false),
            "utf-16-le" => ("utf-16le", false),
            "utf-16-be" => ("utf-16be", false),
            "utf-8-sig" | "utf8-sig" => ("utf-8", true),
            "utf-16" | "utf16" => ("utf-16le", true),
            "u8" | "utf" | "utf8" => ("utf-8", false),
            other => (other, false),
        };
        let encoding = Encoding::for_label(alias.as_bytes())
            .or_else(|| Encoding::for_label(label.trim().as_bytes()))?;
        Some(Codec {
            encoding,
            bom,
            ascii_only: matches!(alias, "ascii" | "us-ascii"),
        })
    }

    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    fn is_plain_utf8(&self) -> bool {
        self.encoding == UTF_8 && !self.bom
    }

    fn byte_order_mark(&self) -> &'static [u8] {
        if !self.bom {
            &[]
        } else if self.encoding == UTF_16LE {
            &[0xff, 0xfe]
        } else if self.encoding == UTF_16BE {
            &[0xfe, 0xff]
        } else {
            &[0xef, 0xbb, 0xbf]
        }
    }

    /// Encodes `text` without a byte order mark. Characters the encoding
    /// cannot represent are an error.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, AdapterError> {
        if self.encoding == UTF_16LE {
            return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
        }
        if self.encoding == UTF_16BE {
            return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
        }
        if self.ascii_only {
            if let Some(c) = text.chars().find(|c| !c.is_ascii()) {
                return Err(unmappable(c, self.name()));
            }
        }
        let (bytes, used, had_errors) = self.encoding.encode(text);
        if had_errors || used != self.encoding {
            let c = text
                .chars()
                .find(|c| self.encoding.encode(c.encode_utf8(&mut [0; 4])).2)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            return Err(unmappable(c, self.name()));
        }
        Ok(bytes.into_owned())
    }

    /// Decodes `input` into UTF-8. A leading byte order mark wins over the
    /// configured encoding and is dropped.
    pub fn reader(&self, input: Box<dyn io::Read + Send>) -> Box<dyn io::Read + Send> {
        if self.is_plain_utf8() {
            return input;
        }
        Box::new(
            DecodeReaderBytesBuilder::new()
                .encoding(Some(self.encoding))
                .build(input),
        )
    }

    /// Encodes the UTF-8 written to the result into this encoding.
    pub fn writer(&self, output: Box<dyn io::Write + Send>) -> Box<dyn io::Write + Send> {
        if self.is_plain_utf8() {
            return output;
        }
        Box::new(EncodeWriter {
            inner: output,
            codec: *self,
            pending: Vec::new(),
            started: false,
        })
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("encoding", &self.name())
            .field("bom", &self.bom)
            .finish()
    }
}

impl PartialEq for Codec {
    fn eq(&self, other: &Self) -> bool {
        self.encoding == other.encoding
            && self.bom == other.bom
            && self.ascii_only == other.ascii_only
    }
}

impl Eq for Codec {}

fn unmappable(c: char, name: &str) -> AdapterError {
    AdapterError::Conversion(format!("{c:?} cannot be encoded as {name}"))
}

/// Buffers UTF-8 until whole characters are available, then writes them
/// re-encoded to `inner`.
struct EncodeWriter {
    inner: Box<dyn io::Write + Send>,
    codec: Codec,
    pending: Vec<u8>,
    started: bool,
}

impl EncodeWriter {
    fn drain(&mut self) -> io::Result<()> {
        let complete = match std::str::from_utf8(&self.pending) {
            Ok(text) => text.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(err) => return Err(io::Error::new(io::ErrorKind::InvalidData, err)),
        };
        if complete == 0 {
            return Ok(());
        }
        let text = std::str::from_utf8(&self.pending[..complete])
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        let bytes = self
            .codec
            .encode(text)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
        if !self.started {
            self.started = true;
            self.inner.write_all(self.codec.byte_order_mark())?;
        }
        self.inner.write_all(&bytes)?;
        self.pending.drain(..complete);
        Ok(())
    }
}

impl io::Write for EncodeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.drain()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain()?;
        self.inner.flush()
    }
}

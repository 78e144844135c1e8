//! Newline-delimited line framing codec.
//!
//! Lines are framed as UTF-8 text terminated by `\n`; a terminating `\r\n`
//! is accepted on decode. There is no length prefix or other framing.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::config::DEFAULT_MAX_LINE_LEN;
use crate::error::{EndpointError, EndpointResult};

/// Codec for newline-delimited UTF-8 lines.
#[derive(Debug)]
pub struct LineCodec {
    /// Maximum accepted line length in bytes, excluding the terminator.
    max_line_len: usize,
    /// Where to resume the newline scan after a partial read.
    scan_offset: usize,
}

impl LineCodec {
    /// Create a new line codec with the given maximum line length.
    pub fn new(max_line_len: usize) -> Self {
        Self {
            max_line_len,
            scan_offset: 0,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LEN)
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = EndpointError;

    fn decode(&mut self, src: &mut BytesMut) -> EndpointResult<Option<Self::Item>> {
        let newline = src[self.scan_offset..].iter().position(|&b| b == b'\n');

        let Some(pos) = newline else {
            // No full line yet. Refuse to buffer without bound.
            if src.len() > self.max_line_len {
                return Err(EndpointError::LineTooLong {
                    len: src.len(),
                    max: self.max_line_len,
                });
            }
            self.scan_offset = src.len();
            return Ok(None);
        };

        let end = self.scan_offset + pos;
        self.scan_offset = 0;

        // Extract the line and drop the terminator.
        let mut frame = src.split_to(end + 1);
        frame.truncate(end);
        if frame.last() == Some(&b'\r') {
            frame.truncate(frame.len() - 1);
        }

        if frame.len() > self.max_line_len {
            return Err(EndpointError::LineTooLong {
                len: frame.len(),
                max: self.max_line_len,
            });
        }

        let line = std::str::from_utf8(&frame[..])?.to_owned();
        Ok(Some(line))
    }
}

impl Encoder<String> for LineCodec {
    type Error = EndpointError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> EndpointResult<()> {
        if line.len() > self.max_line_len {
            return Err(EndpointError::LineTooLong {
                len: line.len(),
                max: self.max_line_len,
            });
        }

        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(b'\n');

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MAX: usize = 1024;

    #[test]
    fn test_roundtrip_line() {
        let mut codec = LineCodec::new(TEST_MAX);

        let mut buf = BytesMut::new();
        codec.encode("HelloWorld".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"HelloWorld\n");

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, "HelloWorld");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_line() {
        let mut codec = LineCodec::new(TEST_MAX);
        let mut buf = BytesMut::new();
        buf.put_slice(b"Hello");

        let result = codec.decode(&mut buf).unwrap();
        assert!(result.is_none());

        // The rest of the line arrives later.
        buf.put_slice(b"World\n");
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, "HelloWorld");
    }

    #[test]
    fn test_crlf_terminator() {
        let mut codec = LineCodec::new(TEST_MAX);
        let mut buf = BytesMut::from(&b"HelloWorld\r\n"[..]);

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, "HelloWorld");
    }

    #[test]
    fn test_empty_line() {
        let mut codec = LineCodec::new(TEST_MAX);
        let mut buf = BytesMut::from(&b"\n"[..]);

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, "");
    }

    #[test]
    fn test_multiple_lines() {
        let mut codec = LineCodec::new(TEST_MAX);
        let mut buf = BytesMut::from(&b"one\ntwo\nthree\n"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "one");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "two");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "three");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_line_too_long_on_decode() {
        let mut codec = LineCodec::new(8);
        let mut buf = BytesMut::from(&b"way too long for the limit"[..]);

        // No newline yet, but the buffer already exceeds the bound.
        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(EndpointError::LineTooLong { .. })));
    }

    #[test]
    fn test_line_too_long_on_encode() {
        let mut codec = LineCodec::new(4);
        let mut buf = BytesMut::new();

        let result = codec.encode("longer".to_string(), &mut buf);
        assert!(matches!(result, Err(EndpointError::LineTooLong { .. })));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut codec = LineCodec::new(TEST_MAX);
        let mut buf = BytesMut::from(&[0xFF, 0xFE, b'\n'][..]);

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(EndpointError::InvalidUtf8(_))));
    }
}

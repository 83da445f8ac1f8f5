//! In-memory byte stream for engine save files and preferences
//!
//! The engine serializes by calling "write N bytes" many times, and
//! deserializes by calling "read up to N bytes" until it sees failure.
//! [`ByteStream`] backs both directions with one growable buffer and a
//! forward-only read cursor.

/// What a stream instance is being used for. One instance serves one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRole {
    SaveGame,
    Preferences,
}

/// Destination for the engine's write callbacks.
pub trait WriteSink {
    /// Append bytes. Always succeeds.
    fn write(&mut self, buf: &[u8]);
}

/// Source for the engine's read callbacks.
pub trait ReadSource {
    /// Fill as much of `buf` as is available.
    ///
    /// Returns the number of bytes copied; zero means end of stream.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Callback-shaped read: fill `buf` and report whether anything was read.
    fn read_exact_or_eof(&mut self, buf: &mut [u8]) -> bool {
        self.read(buf) > 0
    }
}

/// Append-only buffer with a read cursor.
#[derive(Debug, Clone)]
pub struct ByteStream {
    role: StreamRole,
    buffer: Vec<u8>,
    cursor: usize,
}

impl ByteStream {
    /// Empty stream for the engine to write into.
    pub fn new(role: StreamRole) -> Self {
        Self {
            role,
            buffer: Vec::new(),
            cursor: 0,
        }
    }

    /// Stream pre-filled with text for the engine to read back.
    pub fn from_text(role: StreamRole, text: &str) -> Self {
        Self {
            role,
            buffer: text.as_bytes().to_vec(),
            cursor: 0,
        }
    }

    pub fn role(&self) -> StreamRole {
        self.role
    }

    /// Read cursor as a byte offset.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether the cursor has consumed everything written so far.
    pub fn at_end(&self) -> bool {
        self.cursor >= self.buffer.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the stream, returning the written text.
    ///
    /// Engines write UTF-8 in practice; anything else is replaced lossily.
    pub fn into_text(self) -> String {
        match String::from_utf8(self.buffer) {
            Ok(text) => text,
            Err(err) => {
                log::warn!("{:?} stream was not valid UTF-8", self.role);
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        }
    }
}

impl WriteSink for ByteStream {
    fn write(&mut self, buf: &[u8]) {
        self.buffer.extend_from_slice(buf);
    }
}

impl ReadSource for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let available = self.buffer.len().saturating_sub(self.cursor);
        let n = available.min(buf.len());
        buf[..n].copy_from_slice(&self.buffer[self.cursor..self.cursor + n]);
        self.cursor += n;
        n
    }
}

/// Drain a source into a string using small fixed-size reads, the way an
/// engine consumes its save files.
pub fn read_all(source: &mut dyn ReadSource) -> String {
    let mut out = Vec::new();
    let mut chunk = [0u8; 64];
    loop {
        let n = source.read(&mut chunk);
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Read one `\n`-terminated line, byte by byte. Returns `None` at end of stream.
pub fn read_line(source: &mut dyn ReadSource) -> Option<String> {
    let mut out = Vec::new();
    let mut byte = [0u8; 1];
    while source.read_exact_or_eof(&mut byte) {
        if byte[0] == b'\n' {
            return Some(String::from_utf8_lossy(&out).into_owned());
        }
        out.push(byte[0]);
    }
    if out.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&out).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_write_then_partial_reads() {
        let mut stream = ByteStream::new(StreamRole::SaveGame);
        stream.write(b"abc");
        stream.write(b"def");

        let mut buf = [0u8; 4];
        assert!(stream.read_exact_or_eof(&mut buf));
        assert_eq!(&buf, b"abcd");
        assert_eq!(stream.position(), 4);

        let mut buf = [0u8; 10];
        let n = stream.read(&mut buf);
        assert_eq!(&buf[..n], b"ef");
        assert_eq!(stream.position(), 6);

        assert!(!stream.read_exact_or_eof(&mut buf));
        assert_eq!(stream.position(), 6);
    }

    #[test]
    fn test_read_empty_stream_is_eof() {
        let mut stream = ByteStream::new(StreamRole::Preferences);
        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf), 0);
        assert!(stream.at_end());
    }

    #[test]
    fn test_write_after_read_keeps_cursor() {
        let mut stream = ByteStream::from_text(StreamRole::SaveGame, "xy");
        let mut buf = [0u8; 2];
        stream.read(&mut buf);
        stream.write(b"z");
        let mut one = [0u8; 1];
        assert_eq!(stream.read(&mut one), 1);
        assert_eq!(one[0], b'z');
    }

    #[test]
    fn test_read_line() {
        let mut stream = ByteStream::from_text(StreamRole::SaveGame, "GAME:Lights\nSIZE:5");
        assert_eq!(read_line(&mut stream).as_deref(), Some("GAME:Lights"));
        assert_eq!(read_line(&mut stream).as_deref(), Some("SIZE:5"));
        assert_eq!(read_line(&mut stream), None);
    }

    proptest! {
        #[test]
        fn prop_chunked_reads_reassemble_writes(
            parts in proptest::collection::vec(".{0,20}", 0..8),
            chunk in 1usize..16,
        ) {
            let mut stream = ByteStream::new(StreamRole::SaveGame);
            for part in &parts {
                stream.write(part.as_bytes());
            }
            let mut out = Vec::new();
            let mut buf = vec![0u8; chunk];
            loop {
                let before = stream.position();
                let n = stream.read(&mut buf);
                prop_assert_eq!(stream.position(), before + n);
                if n == 0 {
                    break;
                }
                out.extend_from_slice(&buf[..n]);
            }
            prop_assert_eq!(out, parts.concat().into_bytes());
        }
    }
}

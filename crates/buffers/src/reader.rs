//! Buffered stream reader over a pooled buffer, with refill and growth.

use std::io::Read;
use std::str;

use crate::pool::PooledBuffer;
use crate::BufferError;

/// A binary reader that refills a pooled buffer from a byte source.
///
/// The reader maintains a cursor into the buffered region and a count of
/// the bytes consumed from the stream so far. Refills shift the
/// unconsumed tail to the front of the buffer before reading more, so a
/// partially buffered value survives the refill; UTF-8 payloads are
/// consumed only at complete code point boundaries, so a multi-byte
/// sequence is never split across two refills.
pub struct StreamReader<R: Read> {
    source: R,
    buf: PooledBuffer,
    /// Current cursor position within the buffered region.
    x: usize,
    /// End of the valid buffered region (exclusive).
    end: usize,
    /// Total bytes consumed from the stream.
    consumed: u64,
}

impl<R: Read> StreamReader<R> {
    /// Creates a reader that fills `buf` from `source`.
    pub fn new(buf: PooledBuffer, source: R) -> Self {
        Self {
            source,
            buf,
            x: 0,
            end: 0,
            consumed: 0,
        }
    }

    /// Total bytes consumed from the stream so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Number of buffered bytes not yet consumed.
    fn buffered(&self) -> usize {
        self.end - self.x
    }

    /// Ensures at least `n` unconsumed bytes are buffered, refilling from
    /// the source as needed.
    ///
    /// The unconsumed tail is shifted to the front first, and the buffer
    /// grows when `n` exceeds its capacity. End-of-stream before `n`
    /// bytes are available is [`BufferError::EndOfBuffer`].
    fn fill(&mut self, n: usize) -> Result<(), BufferError> {
        if self.buffered() >= n {
            return Ok(());
        }
        if self.x > 0 {
            self.buf.copy_within(self.x..self.end, 0);
            self.end -= self.x;
            self.x = 0;
        }
        if n > self.buf.capacity() {
            self.buf.grow(n)?;
        }
        while self.buffered() < n {
            match self.source.read(&mut self.buf[self.end..]) {
                Ok(0) => return Err(BufferError::EndOfBuffer),
                Ok(count) => self.end += count,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(BufferError::Io(err.kind())),
            }
        }
        Ok(())
    }

    /// Reads a single unsigned byte.
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        self.fill(1)?;
        let val = self.buf[self.x];
        self.x += 1;
        self.consumed += 1;
        Ok(val)
    }

    /// Reads a signed 32-bit integer (little-endian).
    pub fn i32_le(&mut self) -> Result<i32, BufferError> {
        self.fill(4)?;
        let x = self.x;
        let val = i32::from_le_bytes([self.buf[x], self.buf[x + 1], self.buf[x + 2], self.buf[x + 3]]);
        self.x += 4;
        self.consumed += 4;
        Ok(val)
    }

    /// Reads a signed 64-bit integer (little-endian).
    pub fn i64_le(&mut self) -> Result<i64, BufferError> {
        self.fill(8)?;
        let x = self.x;
        let val = i64::from_le_bytes([
            self.buf[x],
            self.buf[x + 1],
            self.buf[x + 2],
            self.buf[x + 3],
            self.buf[x + 4],
            self.buf[x + 5],
            self.buf[x + 6],
            self.buf[x + 7],
        ]);
        self.x += 8;
        self.consumed += 8;
        Ok(val)
    }

    /// Reads a 64-bit floating point number (little-endian).
    pub fn f64_le(&mut self) -> Result<f64, BufferError> {
        self.fill(8)?;
        let x = self.x;
        let val = f64::from_le_bytes([
            self.buf[x],
            self.buf[x + 1],
            self.buf[x + 2],
            self.buf[x + 3],
            self.buf[x + 4],
            self.buf[x + 5],
            self.buf[x + 6],
            self.buf[x + 7],
        ]);
        self.x += 8;
        self.consumed += 8;
        Ok(val)
    }

    /// Reads `n` raw bytes into a new vector, growing the buffer when the
    /// value is larger than the current capacity.
    pub fn bytes(&mut self, n: usize) -> Result<Vec<u8>, BufferError> {
        self.fill(n)?;
        let data = self.buf[self.x..self.x + n].to_vec();
        self.x += n;
        self.consumed += n as u64;
        Ok(data)
    }

    /// Reads a NUL-terminated string, consuming the terminator.
    pub fn cstring(&mut self) -> Result<String, BufferError> {
        let mut bytes: Vec<u8> = Vec::new();
        loop {
            if self.buffered() == 0 {
                self.fill(1)?;
            }
            let region = &self.buf[self.x..self.end];
            match region.iter().position(|&b| b == 0) {
                Some(i) => {
                    bytes.extend_from_slice(&region[..i]);
                    self.x += i + 1;
                    self.consumed += (i + 1) as u64;
                    break;
                }
                None => {
                    let len = region.len();
                    bytes.extend_from_slice(region);
                    self.x += len;
                    self.consumed += len as u64;
                }
            }
        }
        String::from_utf8(bytes).map_err(|_| BufferError::InvalidUtf8)
    }

    /// Reads `len` bytes of UTF-8 text.
    ///
    /// The payload is consumed chunk-wise, so strings larger than the
    /// buffer decode without growing it. Every chunk ends on a complete
    /// code point: a multi-byte sequence whose bytes straddle the end of
    /// the buffered region stays buffered until the next refill delivers
    /// its remaining bytes.
    pub fn utf8(&mut self, len: usize) -> Result<String, BufferError> {
        // Trust the declared length only up to one buffer's worth; the
        // string grows as real bytes arrive.
        let mut out = String::with_capacity(len.min(self.buf.capacity()));
        let mut remaining = len;
        while remaining > 0 {
            if self.buffered() == 0 {
                self.fill(1)?;
            }
            let mut take = self.buffered().min(remaining);
            if take < remaining {
                let safe = utf8_prefix_len(&self.buf[self.x..self.x + take]);
                if safe == 0 {
                    // The buffered region is a lone partial sequence;
                    // refill until the whole sequence is available.
                    let width = utf8_sequence_len(self.buf[self.x]).ok_or(BufferError::InvalidUtf8)?;
                    self.fill(width.min(remaining))?;
                    continue;
                }
                take = safe;
            }
            let chunk = &self.buf[self.x..self.x + take];
            let text = str::from_utf8(chunk).map_err(|_| BufferError::InvalidUtf8)?;
            out.push_str(text);
            self.x += take;
            self.consumed += take as u64;
            remaining -= take;
        }
        Ok(out)
    }
}

/// Length of the longest prefix of `bytes` that does not end inside a
/// multi-byte UTF-8 sequence.
///
/// Malformed leading bytes are not rejected here; validation happens when
/// the chunk is decoded.
fn utf8_prefix_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let mut p = len;
    // A sequence is at most 4 bytes, so at most 3 continuation bytes can
    // trail the last lead byte.
    for _ in 0..3 {
        if p == 0 || bytes[p - 1] & 0xC0 != 0x80 {
            break;
        }
        p -= 1;
    }
    if p == 0 {
        return len;
    }
    let start = p - 1;
    match utf8_sequence_len(bytes[start]) {
        Some(width) if start + width > len => start,
        _ => len,
    }
}

/// Byte length of a UTF-8 sequence given its lead byte.
fn utf8_sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::BufferPool;
    use std::io::Cursor;

    /// A source that hands out at most `chunk` bytes per read call.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Trickle {
        fn new(data: Vec<u8>, chunk: usize) -> Self {
            Self { data, pos: 0, chunk }
        }
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    fn reader_over(data: Vec<u8>, min_size: usize) -> StreamReader<Cursor<Vec<u8>>> {
        let pool = BufferPool::with_config(min_size, None);
        StreamReader::new(pool.acquire(), Cursor::new(data))
    }

    #[test]
    fn reads_primitives_little_endian() {
        let mut data = vec![0x2A];
        data.extend_from_slice(&0x01020304i32.to_le_bytes());
        data.extend_from_slice(&(-9_999_999_999i64).to_le_bytes());
        data.extend_from_slice(&3.25f64.to_le_bytes());
        let mut r = reader_over(data, 64);
        assert_eq!(r.u8().unwrap(), 0x2A);
        assert_eq!(r.i32_le().unwrap(), 0x01020304);
        assert_eq!(r.i64_le().unwrap(), -9_999_999_999);
        assert_eq!(r.f64_le().unwrap(), 3.25);
        assert_eq!(r.consumed(), 21);
    }

    #[test]
    fn refills_across_a_trickling_source() {
        let data: Vec<u8> = (0..=255).collect();
        let pool = BufferPool::with_config(16, None);
        let mut r = StreamReader::new(pool.acquire(), Trickle::new(data.clone(), 3));
        assert_eq!(r.bytes(256).unwrap(), data);
    }

    #[test]
    fn bytes_larger_than_capacity_grow_the_buffer() {
        let data: Vec<u8> = (0..64).map(|i| (i * 31 % 251) as u8).collect();
        let mut r = reader_over(data.clone(), 8);
        assert_eq!(r.bytes(64).unwrap(), data);
    }

    #[test]
    fn cstring_spans_refills() {
        let mut data = b"hello world, this is a fairly long name".to_vec();
        data.push(0);
        data.push(0xAB);
        let pool = BufferPool::with_config(8, None);
        let mut r = StreamReader::new(pool.acquire(), Trickle::new(data, 5));
        assert_eq!(r.cstring().unwrap(), "hello world, this is a fairly long name");
        assert_eq!(r.u8().unwrap(), 0xAB);
    }

    #[test]
    fn utf8_carries_partial_sequences_over_refills() {
        // 7 ASCII bytes then a 2-byte character: the sequence starts at
        // the last byte of the 8-byte buffer.
        let text = "aaaaaaa\u{00A3}bbb";
        let mut r = reader_over(text.as_bytes().to_vec(), 8);
        assert_eq!(r.utf8(text.len()).unwrap(), text);
    }

    #[test]
    fn utf8_carries_three_byte_sequences() {
        let text = "aaaaaaa\u{FFFD}\u{00A3}cc";
        for chunk in 1..6 {
            let pool = BufferPool::with_config(8, None);
            let mut r =
                StreamReader::new(pool.acquire(), Trickle::new(text.as_bytes().to_vec(), chunk));
            assert_eq!(r.utf8(text.len()).unwrap(), text, "chunk size {chunk}");
        }
    }

    #[test]
    fn utf8_rejects_malformed_bytes() {
        let mut r = reader_over(vec![0x61, 0xFF, 0x61, 0x61], 8);
        assert_eq!(r.utf8(4), Err(BufferError::InvalidUtf8));
    }

    #[test]
    fn utf8_rejects_sequence_cut_by_declared_length() {
        // A 2-byte sequence whose second byte falls outside the payload.
        let text = "ab\u{00A3}";
        let mut r = reader_over(text.as_bytes().to_vec(), 8);
        assert_eq!(r.utf8(3), Err(BufferError::InvalidUtf8));
    }

    #[test]
    fn eof_mid_value_is_reported() {
        let mut r = reader_over(vec![1, 2], 8);
        assert_eq!(r.i32_le(), Err(BufferError::EndOfBuffer));
    }

    #[test]
    fn eof_mid_cstring_is_reported() {
        let mut r = reader_over(b"no terminator".to_vec(), 8);
        assert_eq!(r.cstring(), Err(BufferError::EndOfBuffer));
    }

    #[test]
    fn utf8_prefix_len_cuts_incomplete_sequences() {
        assert_eq!(utf8_prefix_len(b"abc"), 3);
        assert_eq!(utf8_prefix_len("ab\u{00A3}".as_bytes()), 4);
        // Lead byte of a 2-byte sequence with no continuation yet.
        assert_eq!(utf8_prefix_len(&[0x61, 0xC2]), 1);
        // Lead byte of a 3-byte sequence with one of two continuations.
        assert_eq!(utf8_prefix_len(&[0x61, 0xE2, 0x82]), 1);
        // Complete 3-byte sequence.
        assert_eq!(utf8_prefix_len(&[0xE2, 0x82, 0xAC]), 3);
    }
}

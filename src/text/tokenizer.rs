//! Streaming UTF-8 tokenizer.
//!
//! Bytes arrive in arbitrary chunks. A multi-byte sequence cut by a chunk
//! boundary is held back until the next chunk (or [`Tokenizer::finish`]), so
//! the tokens produced never depend on how the input was split.
//!
//! Malformed input never fails: each bad byte decodes to U+FFFD, ends the
//! current token and is counted as a decode anomaly.

use super::CaseFolding;

/// Receives completed tokens.
pub trait TokenSink {
    /// Called once for every completed, non-empty token.
    fn add_token(&mut self, token: &str);
}

/// Receives raw byte chunks from a text source.
pub trait ChunkSink {
    fn add_chunk(&mut self, bytes: &[u8]);
}

/// Result of decoding one codepoint at the front of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoded {
    /// A codepoint and the number of bytes it occupied.
    Char(char, usize),
    /// Malformed input. Skip one byte.
    Invalid,
    /// A truncated sequence that more input may complete.
    Incomplete,
}

fn decode_utf8(bytes: &[u8], final_chunk: bool) -> Decoded {
    let c0 = bytes[0];
    if c0 < 0x80 {
        return Decoded::Char(char::from(c0), 1);
    }
    if c0 < 0xC2 {
        return Decoded::Invalid;
    }

    let (width, lead_bits) = match c0 {
        0xC2..=0xDF => (2, c0 & 0x1F),
        0xE0..=0xEF => (3, c0 & 0x0F),
        0xF0..=0xF4 => (4, c0 & 0x07),
        _ => return Decoded::Invalid,
    };

    if bytes.len() < width {
        return if final_chunk {
            Decoded::Invalid
        } else {
            Decoded::Incomplete
        };
    }

    let tail = &bytes[1..width];
    if tail.iter().any(|b| b & 0xC0 != 0x80) {
        return Decoded::Invalid;
    }

    // Overlong forms, UTF-16 surrogates and codepoints past U+10FFFF.
    let c1 = bytes[1];
    match c0 {
        0xE0 if c1 < 0xA0 => return Decoded::Invalid,
        0xED if c1 >= 0xA0 => return Decoded::Invalid,
        0xF0 if c1 < 0x90 => return Decoded::Invalid,
        0xF4 if c1 >= 0x90 => return Decoded::Invalid,
        _ => {}
    }

    let codepoint = tail
        .iter()
        .fold(u32::from(lead_bits), |acc, b| (acc << 6) | u32::from(b & 0x3F));
    char::from_u32(codepoint).map_or(Decoded::Invalid, |c| Decoded::Char(c, width))
}

/// Splits a byte stream into folded word tokens and hands them to a sink.
///
/// # Example
///
/// ```
/// use mostsimilar::text::{CaseFolding, ChunkSink, DocumentStatistics, Tokenizer};
///
/// let mut stats = DocumentStatistics::new();
/// let mut tokenizer = Tokenizer::new(&mut stats, CaseFolding::Unicode);
/// tokenizer.add_chunk("Caf\u{e9} ".as_bytes());
/// tokenizer.add_chunk(b"CAF\xC3");
/// tokenizer.add_chunk(b"\x89");
/// tokenizer.finish();
///
/// assert_eq!(stats.count("caf\u{e9}"), 2);
/// ```
pub struct Tokenizer<'a, S: TokenSink + ?Sized> {
    sink: &'a mut S,
    folding: CaseFolding,
    pending: Vec<u8>,
    token: String,
    anomalies: u64,
}

impl<'a, S: TokenSink + ?Sized> Tokenizer<'a, S> {
    #[must_use]
    pub fn new(sink: &'a mut S, folding: CaseFolding) -> Self {
        Self {
            sink,
            folding,
            pending: Vec::new(),
            token: String::new(),
            anomalies: 0,
        }
    }

    /// Number of malformed byte sequences seen so far.
    #[must_use]
    pub fn anomalies(&self) -> u64 {
        self.anomalies
    }

    /// Resolves any held-back bytes, emits the last token and returns the
    /// anomaly count.
    pub fn finish(mut self) -> u64 {
        self.process(true);
        self.pending.clear();
        self.flush_token();
        if self.anomalies > 0 {
            log::trace!("Replaced {} malformed byte sequence(s)", self.anomalies);
        }
        self.anomalies
    }

    fn process(&mut self, final_chunk: bool) {
        let mut index = 0;
        while index < self.pending.len() {
            match decode_utf8(&self.pending[index..], final_chunk) {
                Decoded::Char(c, width) => {
                    index += width;
                    self.accept(c);
                }
                Decoded::Invalid => {
                    index += 1;
                    self.anomalies += 1;
                    self.flush_token();
                }
                Decoded::Incomplete => break,
            }
        }
        self.pending.drain(..index);
    }

    fn accept(&mut self, c: char) {
        if c == char::REPLACEMENT_CHARACTER || self.folding.is_boundary(c) {
            self.flush_token();
        } else {
            self.folding.push_folded(c, &mut self.token);
        }
    }

    fn flush_token(&mut self) {
        if !self.token.is_empty() {
            self.sink.add_token(&self.token);
            self.token.clear();
        }
    }
}

impl<S: TokenSink + ?Sized> ChunkSink for Tokenizer<'_, S> {
    fn add_chunk(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.pending.extend_from_slice(bytes);
        self.process(false);
    }
}

//! Document text extraction.
//!
//! A [`TextSource`] streams one file's text into a [`ChunkSink`]. An
//! [`ExtractorChain`] tries its sources in order and falls through to the
//! next one when a source fails or yields no countable tokens. The
//! statistics are cleared between attempts, so a half-read failure never
//! leaks tokens into the result.
//!
//! The default chain tries the format-aware sources of [`super::formats`]
//! first. [`RawFileSource`] treats the file's bytes as text and is the last
//! link; it refuses binary containers, so a PDF or Office file that cannot
//! be decoded yields an error instead of tokens from its compressed bytes.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::formats::{
    is_binary_container, DocxSource, LegacyOfficeSource, PdfSource, RtfSource, ZipXmlSource,
};
use crate::text::{ChunkSink, DocumentStatistics};

/// Read buffer size for raw sources.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Errors that can occur during document text extraction.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A source understood the format but could not decode it.
    #[error("Failed to extract text from {path}: {message}")]
    Extraction {
        /// Path to the document
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// No source in the chain accepts this file.
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(PathBuf),
}

/// A way of turning a file into a stream of text bytes.
pub trait TextSource: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Whether this source should be tried for `path`.
    fn accepts(&self, _path: &Path) -> bool {
        true
    }

    /// Feeds the file's text to `sink`.
    fn stream(&self, path: &Path, sink: &mut dyn ChunkSink) -> Result<(), DocumentError>;
}

/// Reads the file's raw bytes in [`CHUNK_SIZE`] pieces.
///
/// Binary containers are not accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFileSource;

impl TextSource for RawFileSource {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn accepts(&self, path: &Path) -> bool {
        !is_binary_container(path)
    }

    fn stream(&self, path: &Path, sink: &mut dyn ChunkSink) -> Result<(), DocumentError> {
        let io_error = |source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(io_error)?;
        let mut buffer = vec![0u8; CHUNK_SIZE];
        loop {
            match file.read(&mut buffer) {
                Ok(0) => return Ok(()),
                Ok(n) => sink.add_chunk(&buffer[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(io_error(e)),
            }
        }
    }
}

/// An ordered list of text sources.
pub struct ExtractorChain {
    sources: Vec<Box<dyn TextSource>>,
}

impl ExtractorChain {
    /// An empty chain. Every file is unsupported until a source is pushed.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// A chain that reads raw bytes only.
    #[must_use]
    pub fn raw_only() -> Self {
        Self::empty().with_source(RawFileSource)
    }

    /// Appends a source, tried after the existing ones.
    #[must_use]
    pub fn with_source<S: TextSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Inserts a source ahead of the existing ones.
    #[must_use]
    pub fn with_preferred_source<S: TextSource + 'static>(mut self, source: S) -> Self {
        self.sources.insert(0, Box::new(source));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Streams `path` into `stats`, trying sources until one yields tokens.
    ///
    /// Returns `Ok` with empty statistics if some source succeeded but none
    /// produced tokens. Returns the last error if every accepting source
    /// failed.
    pub fn extract_into(
        &self,
        path: &Path,
        stats: &mut DocumentStatistics,
    ) -> Result<(), DocumentError> {
        stats.clear();
        let mut last_error = None;
        let mut any_succeeded = false;

        for source in self.sources.iter().filter(|s| s.accepts(path)) {
            let outcome = {
                let mut tokenizer = stats.tokenizer();
                source
                    .stream(path, &mut tokenizer)
                    .map(|()| tokenizer.finish())
            };
            match outcome {
                Ok(anomalies) => {
                    any_succeeded = true;
                    if !stats.is_empty() {
                        if anomalies > 0 {
                            log::trace!(
                                "{}: {} malformed byte sequence(s) via {} source",
                                path.display(),
                                anomalies,
                                source.name()
                            );
                        }
                        return Ok(());
                    }
                    log::debug!("{} source produced no tokens for {}", source.name(), path.display());
                }
                Err(e) => {
                    log::debug!("{} source failed for {}: {}", source.name(), path.display(), e);
                    last_error = Some(e);
                }
            }
            stats.clear();
        }

        if any_succeeded {
            return Ok(());
        }
        Err(last_error.unwrap_or_else(|| DocumentError::UnsupportedFormat(path.to_path_buf())))
    }
}

impl Default for ExtractorChain {
    /// PDF, Word, zipped XML packages, RTF and legacy Office, then raw bytes.
    fn default() -> Self {
        Self::empty()
            .with_source(PdfSource)
            .with_source(DocxSource)
            .with_source(ZipXmlSource)
            .with_source(RtfSource)
            .with_source(LegacyOfficeSource)
            .with_source(RawFileSource)
    }
}

impl std::fmt::Debug for ExtractorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("ExtractorChain").field("sources", &names).finish()
    }
}

//! Remainder-first chunk decomposition of an index range.
//!
//! A [`Partition`] splits `[0, n)` into one leading remainder chunk
//! `[0, remainder)` followed by `num_chunks` equal chunks of `chunk_len`
//! elements. The AXPY drivers and the summation drivers walk the same
//! partition, so both decompositions always agree.
//!
//! ```text
//! n = 10, chunk_size = 4
//! [ r r | c0 c0 c0 c0 | c1 c1 c1 c1 ]
//!   ^ remainder = 2
//! ```

use std::ops::Range;

use crate::error::KernelError;

/// A contiguous sub-range `[start, start + len)` of a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: usize,
    pub len: usize,
}

impl Chunk {
    /// One past the last index of the chunk.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// The chunk as an index range, for slicing.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Chunk boundaries for a vector of length `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    n: usize,
    chunk_len: usize,
    remainder: usize,
    num_chunks: usize,
}

impl Partition {
    /// Partition `[0, n)` into chunks of `chunk_size` elements.
    ///
    /// A `chunk_size` of 0 or 1 selects a single chunk covering all of `n`.
    /// An empty range yields a partition with no chunks.
    ///
    /// # Errors
    ///
    /// [`KernelError::ChunkTooLarge`] if `chunk_size > n` (and `n > 0`).
    pub fn new(n: usize, chunk_size: usize) -> Result<Self, KernelError> {
        if n == 0 {
            return Ok(Self::empty());
        }
        let chunk_len = if chunk_size <= 1 { n } else { chunk_size };
        if chunk_len > n {
            return Err(KernelError::ChunkTooLarge { chunk_size, n });
        }
        let partition = Self {
            n,
            chunk_len,
            remainder: n % chunk_len,
            num_chunks: n / chunk_len,
        };
        log::debug!("{partition:?}");
        Ok(partition)
    }

    /// Split `[0, n)` into exactly `parts` equal chunks plus a leading
    /// remainder of `n % parts` elements.
    ///
    /// When `n < parts` every full chunk is empty and the whole range falls
    /// into the remainder.
    ///
    /// # Errors
    ///
    /// [`KernelError::InvalidPartCount`] if `parts == 0`.
    pub fn across(n: usize, parts: usize) -> Result<Self, KernelError> {
        if parts == 0 {
            return Err(KernelError::InvalidPartCount(parts));
        }
        Ok(Self {
            n,
            chunk_len: n / parts,
            remainder: n % parts,
            num_chunks: parts,
        })
    }

    fn empty() -> Self {
        Self {
            n: 0,
            chunk_len: 0,
            remainder: 0,
            num_chunks: 0,
        }
    }

    /// Length of the partitioned range.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Length of every full chunk.
    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    /// Number of elements in the leading remainder chunk.
    pub fn remainder(&self) -> usize {
        self.remainder
    }

    /// Number of full chunks.
    pub fn num_chunks(&self) -> usize {
        self.num_chunks
    }

    /// Number of partial results a reduction over this partition produces:
    /// one per full chunk, plus one for a non-empty remainder.
    pub fn num_partials(&self) -> usize {
        self.num_chunks + usize::from(self.remainder > 0)
    }

    /// The leading remainder chunk `[0, remainder)`.
    pub fn remainder_chunk(&self) -> Chunk {
        Chunk {
            start: 0,
            len: self.remainder,
        }
    }

    /// The `index`-th full chunk.
    ///
    /// # Panics
    ///
    /// If `index >= num_chunks()`.
    pub fn chunk(&self, index: usize) -> Chunk {
        assert!(
            index < self.num_chunks,
            "chunk index {index} out of range ({} chunks)",
            self.num_chunks
        );
        Chunk {
            start: self.remainder + index * self.chunk_len,
            len: self.chunk_len,
        }
    }

    /// Full chunks in index order, excluding the remainder.
    pub fn chunks(&self) -> impl ExactSizeIterator<Item = Chunk> + '_ {
        (0..self.num_chunks).map(move |k| self.chunk(k))
    }

    /// The range covered by the full chunks, `[remainder, n)`.
    pub fn body(&self) -> Range<usize> {
        self.remainder..self.n
    }
}

//! Bounded random payload generation
//!
//! The generator yields random chunks lazily so a download never buffers the
//! whole payload, and dropping the consumer (client disconnect) stops any
//! further generation.

use crate::error::{AppError, Result};
use rand::{rngs::OsRng, RngCore};

/// A source of random bytes that may fail
pub trait RandomSource: Send + 'static {
    /// Fill `buf` entirely with random bytes
    fn try_fill(&mut self, buf: &mut [u8]) -> Result<()>;
}

/// Operating-system random source
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandomSource;

impl RandomSource for OsRandomSource {
    fn try_fill(&mut self, buf: &mut [u8]) -> Result<()> {
        OsRng.try_fill_bytes(buf).map_err(AppError::from)
    }
}

/// Finite, non-restartable sequence of random chunks totalling `total_bytes`.
///
/// Every chunk holds at most `chunk_size` bytes; only the last may be
/// shorter. If the random source fails the sequence ends early and the
/// failure is kept for the caller to inspect through [`take_failure`].
///
/// [`take_failure`]: RandomStreamGenerator::take_failure
#[derive(Debug)]
pub struct RandomStreamGenerator<S = OsRandomSource> {
    source: S,
    total_bytes: u64,
    remaining: u64,
    emitted: u64,
    chunk_size: usize,
    truncated: bool,
    failure: Option<AppError>,
}

impl RandomStreamGenerator<OsRandomSource> {
    /// Create a generator backed by the OS random source
    pub fn new(total_bytes: u64, chunk_size: usize) -> Self {
        Self::with_source(OsRandomSource, total_bytes, chunk_size)
    }
}

impl<S: RandomSource> RandomStreamGenerator<S> {
    /// Create a generator backed by a specific source
    pub fn with_source(source: S, total_bytes: u64, chunk_size: usize) -> Self {
        Self {
            source,
            total_bytes,
            remaining: total_bytes,
            emitted: 0,
            chunk_size: chunk_size.max(1),
            truncated: false,
            failure: None,
        }
    }

    /// Total bytes this generator was asked to produce
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Bytes produced so far
    pub fn emitted_bytes(&self) -> u64 {
        self.emitted
    }

    /// True once the full requested length has been produced
    pub fn is_complete(&self) -> bool {
        self.remaining == 0 && !self.truncated
    }

    /// The error that ended generation early, if any
    pub fn take_failure(&mut self) -> Option<AppError> {
        self.failure.take()
    }
}

impl<S: RandomSource> Iterator for RandomStreamGenerator<S> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let len = self.remaining.min(self.chunk_size as u64) as usize;
        let mut chunk = vec![0u8; len];

        // Fail-soft: stop instead of retrying
        if let Err(e) = self.source.try_fill(&mut chunk) {
            self.failure = Some(e);
            self.truncated = true;
            self.remaining = 0;
            return None;
        }

        self.remaining -= len as u64;
        self.emitted += len as u64;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let chunks = self.remaining.div_ceil(self.chunk_size as u64) as usize;
        (0, Some(chunks))
    }
}

/// Generate a single random packet, as used by the latency test
pub fn random_packet(size: usize) -> Result<Vec<u8>> {
    let mut packet = vec![0u8; size];
    OsRandomSource.try_fill(&mut packet)?;
    Ok(packet)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Source that succeeds for a fixed number of fills, then fails forever
    #[derive(Debug)]
    pub struct FailingSource {
        pub successful_fills: usize,
    }

    impl RandomSource for FailingSource {
        fn try_fill(&mut self, buf: &mut [u8]) -> Result<()> {
            if self.successful_fills == 0 {
                return Err(AppError::stream_generation("entropy source unavailable"));
            }
            self.successful_fills -= 1;
            buf.fill(0xAB);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FailingSource;
    use super::*;

    const CHUNK: usize = 64 * 1024;

    #[test]
    fn test_exact_length_and_chunking() {
        for total in [0u64, 1, 1000, CHUNK as u64, CHUNK as u64 + 1, 3 * CHUNK as u64 + 17] {
            let chunks: Vec<Vec<u8>> = RandomStreamGenerator::new(total, CHUNK).collect();
            let sum: u64 = chunks.iter().map(|c| c.len() as u64).sum();
            assert_eq!(sum, total, "total mismatch for {}", total);
            assert!(chunks.iter().all(|c| c.len() <= CHUNK && !c.is_empty()));

            // only the final chunk may be short
            if let Some((_, init)) = chunks.split_last() {
                assert!(init.iter().all(|c| c.len() == CHUNK));
            }
        }
    }

    #[test]
    fn test_zero_bytes_yields_nothing() {
        let mut generator = RandomStreamGenerator::new(0, CHUNK);
        assert!(generator.next().is_none());
        assert!(generator.is_complete());
    }

    #[test]
    fn test_chunks_are_not_repeated() {
        let chunks: Vec<Vec<u8>> = RandomStreamGenerator::new(4 * CHUNK as u64, CHUNK).collect();
        assert_ne!(chunks[0], chunks[1]);
        assert_ne!(chunks[2], chunks[3]);
    }

    #[test]
    fn test_failure_truncates_without_retry() {
        let mut generator =
            RandomStreamGenerator::with_source(FailingSource { successful_fills: 2 }, 10 * CHUNK as u64, CHUNK);

        let produced: u64 = generator.by_ref().map(|c| c.len() as u64).sum();
        assert_eq!(produced, 2 * CHUNK as u64);
        assert_eq!(generator.emitted_bytes(), 2 * CHUNK as u64);
        assert!(!generator.is_complete());

        let failure = generator.take_failure().expect("failure recorded");
        assert_eq!(failure.category(), "STREAM");

        // exhausted for good
        assert!(generator.next().is_none());
        assert!(!generator.is_complete());
    }

    #[test]
    fn test_size_hint_upper_bound() {
        let generator = RandomStreamGenerator::new(2 * CHUNK as u64 + 1, CHUNK);
        assert_eq!(generator.size_hint(), (0, Some(3)));
    }

    #[test]
    fn test_random_packet() {
        let packet = random_packet(1024).unwrap();
        assert_eq!(packet.len(), 1024);
    }
}

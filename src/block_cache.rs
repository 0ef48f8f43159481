//! Demand-paged LRU cache of decoded raster blocks.
//!
//! Blocks are read and decoded on first touch, then shared behind an `Arc`
//! until evicted. Decoding collapses the storage type into `(data, coverage)`
//! samples up front, so the sampling hot path never re-inspects raw bytes or
//! the fill sentinel.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::{debug, warn};

use crate::field::FieldAccessor;
use crate::sample::Sample;

/// Retention policy for decoded blocks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CachePolicy {
    /// Keep every block touched until [`BlockCache::flush`].
    Unbounded,
    /// Keep at most this many decoded blocks, evicting least recently used.
    Bounded(NonZeroUsize),
}

/// One block of decoded samples, `x_dim x y_dim`, stored x-major.
pub struct DecodedBlock {
    samples: Vec<Sample>,
    x_dim: usize,
    y_dim: usize,
}

impl DecodedBlock {
    /// Sample at pixel `(x, y)`. Out-of-range pixels read as empty.
    #[must_use]
    pub fn sample(&self, x: usize, y: usize) -> Sample {
        if x >= self.x_dim || y >= self.y_dim {
            return Sample::EMPTY;
        }
        self.samples[x * self.y_dim + y]
    }

    #[must_use]
    pub fn x_dim(&self) -> usize {
        self.x_dim
    }

    #[must_use]
    pub fn y_dim(&self) -> usize {
        self.y_dim
    }
}

/// Per-source cache mapping block index to decoded samples.
///
/// Each source node owns its own cache; blocks are never shared between
/// sources even when they read the same underlying field.
pub struct BlockCache {
    blocks: LruCache<i32, Arc<DecodedBlock>>,
    policy: CachePolicy,
}

impl BlockCache {
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        let blocks = match policy {
            CachePolicy::Unbounded => LruCache::unbounded(),
            CachePolicy::Bounded(capacity) => LruCache::new(capacity),
        };
        Self { blocks, policy }
    }

    #[must_use]
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Number of blocks currently resident.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Fetch a decoded block, reading and decoding it on first touch.
    ///
    /// A failed read logs a warning and degrades the block to all-empty
    /// samples. The degraded block is cached like any other, so the failure
    /// is not retried until the cache is flushed.
    pub fn block(
        &mut self,
        field: &dyn FieldAccessor,
        index: i32,
        dims: &[usize],
    ) -> Arc<DecodedBlock> {
        if let Some(block) = self.blocks.get(&index) {
            return Arc::clone(block);
        }
        let block = Arc::new(decode_block(field, index, dims));
        debug!(field = field.name(), block = index, "decoded block into cache");
        self.blocks.put(index, Arc::clone(&block));
        block
    }

    /// Drop every resident block. The next access re-reads from the field.
    pub fn flush(&mut self) {
        debug!(resident = self.blocks.len(), "flushing block cache");
        self.blocks.clear();
    }
}

fn decode_block(field: &dyn FieldAccessor, index: i32, dims: &[usize]) -> DecodedBlock {
    let x_dim = field.x_dim();
    let y_dim = field.y_dim();
    let element = field.data_size();
    let mut raw = vec![0u8; x_dim * y_dim * element];

    let mut samples = vec![Sample::EMPTY; x_dim * y_dim];
    match field.read_block(&mut raw, index, dims) {
        Ok(()) => {
            let fill = field.fill_value();
            let data_type = field.data_type();
            for (i, chunk) in raw.chunks_exact(element).enumerate() {
                if chunk == fill {
                    continue;
                }
                if let Some(value) = data_type.decode(chunk) {
                    samples[i] = Sample::full(value);
                }
            }
        }
        Err(error) => {
            warn!(
                field = field.name(),
                block = index,
                %error,
                "block read failed, treating block as missing data"
            );
        }
    }

    DecodedBlock {
        samples,
        x_dim,
        y_dim,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DataType, MemoryField};
    use crate::geometry::Rect;

    fn three_block_field() -> MemoryField {
        MemoryField::new(
            "cache_test",
            10,
            vec![
                Rect::new(0.0, 0.0, 2.0, 2.0),
                Rect::new(2.0, 0.0, 4.0, 2.0),
                Rect::new(4.0, 0.0, 6.0, 2.0),
            ],
            2,
            2,
            DataType::UInt8,
            vec![255],
            vec![
                vec![1, 2, 3, 255],
                vec![5, 6, 7, 8],
                vec![9, 10, 11, 12],
            ],
        )
    }

    #[test]
    fn test_decode_applies_fill_sentinel() {
        let field = three_block_field();
        let mut cache = BlockCache::new(CachePolicy::Unbounded);

        let block = cache.block(&field, 10, &[]);
        assert_eq!(block.sample(0, 0), Sample::full(1.0));
        assert_eq!(block.sample(0, 1), Sample::full(2.0));
        assert_eq!(block.sample(1, 0), Sample::full(3.0));
        assert_eq!(block.sample(1, 1), Sample::EMPTY, "fill pixel reads empty");
    }

    #[test]
    fn test_repeated_access_reads_once() {
        let field = three_block_field();
        let mut cache = BlockCache::new(CachePolicy::Unbounded);

        for _ in 0..5 {
            cache.block(&field, 11, &[]);
        }
        assert_eq!(field.read_count(), 1, "resident block must not be re-read");
    }

    #[test]
    fn test_bounded_evicts_least_recently_used() {
        let field = three_block_field();
        let capacity = NonZeroUsize::new(2).expect("nonzero");
        let mut cache = BlockCache::new(CachePolicy::Bounded(capacity));

        cache.block(&field, 10, &[]);
        cache.block(&field, 11, &[]);
        cache.block(&field, 12, &[]);
        assert_eq!(cache.len(), 2);
        assert_eq!(field.read_count(), 3);

        // Block 10 was evicted; touching it again costs a read.
        cache.block(&field, 10, &[]);
        assert_eq!(field.read_count(), 4);

        // Blocks 12 and 10 are resident now.
        cache.block(&field, 12, &[]);
        assert_eq!(field.read_count(), 4);
    }

    #[test]
    fn test_flush_forces_reread() {
        let field = three_block_field();
        let mut cache = BlockCache::new(CachePolicy::Unbounded);

        cache.block(&field, 10, &[]);
        cache.flush();
        assert!(cache.is_empty());
        cache.block(&field, 10, &[]);
        assert_eq!(field.read_count(), 2);
    }

    #[test]
    fn test_failed_read_degrades_to_empty_block() {
        let field = three_block_field().with_failing_block(11);
        let mut cache = BlockCache::new(CachePolicy::Unbounded);

        let block = cache.block(&field, 11, &[]);
        for x in 0..2 {
            for y in 0..2 {
                assert_eq!(block.sample(x, y), Sample::EMPTY);
            }
        }

        // The degraded block stays resident; the failure is not retried.
        cache.block(&field, 11, &[]);
        assert_eq!(field.read_count(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_out_of_range_pixel_is_empty() {
        let field = three_block_field();
        let mut cache = BlockCache::new(CachePolicy::Unbounded);
        let block = cache.block(&field, 10, &[]);
        assert_eq!(block.sample(2, 0), Sample::EMPTY);
        assert_eq!(block.sample(0, 2), Sample::EMPTY);
    }
}

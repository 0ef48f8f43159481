//! Storage abstraction for blocked swath fields.
//!
//! The sampling core never parses a file format itself. It consumes the
//! [`FieldAccessor`] trait: per-block reads of raw typed pixels, block
//! bounding rectangles in the field's native projection, a fill-value
//! sentinel, and a handful of calibration constants. Anything that can
//! produce rectangular blocks of raw data can feed a sampling tree.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::geometry::Rect;
use crate::projector::Projection;

/// Storage type of a single raster element.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl DataType {
    /// Size of one element in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Decode one little-endian element into the common scalar type.
    ///
    /// Returns `None` if `bytes` is shorter than [`Self::size`]. The decode
    /// switches on the variant explicitly; nothing here depends on the
    /// incidental memory layout of the buffer.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<f64> {
        if bytes.len() < self.size() {
            return None;
        }
        let value = match self {
            Self::Int8 => f64::from(bytes[0] as i8),
            Self::UInt8 => f64::from(bytes[0]),
            Self::Int16 => f64::from(i16::from_le_bytes([bytes[0], bytes[1]])),
            Self::UInt16 => f64::from(u16::from_le_bytes([bytes[0], bytes[1]])),
            Self::Int32 => f64::from(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            Self::UInt32 => f64::from(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            Self::Float32 => {
                f64::from(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            Self::Float64 => f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
        };
        Some(value)
    }
}

/// Read access to one field of blocked raster data.
///
/// Blocks are indexed by `i32` over the inclusive range
/// `start_block()..=end_block()`. Each block is an `x_dim() x y_dim()` grid
/// of raw elements, stored x-major: element `(x, y)` lives at offset
/// `(x * y_dim() + y) * data_type().size()`.
pub trait FieldAccessor {
    /// Field name, for diagnostics only.
    fn name(&self) -> &str;

    /// Open the backing handle. In-memory implementations have nothing to do.
    ///
    /// # Errors
    /// Returns a description of the failure when the backing store cannot be
    /// opened.
    fn open(&self) -> Result<(), String> {
        Ok(())
    }

    /// Release the backing handle.
    fn close(&self) {}

    /// Index of the first block where data exists.
    fn start_block(&self) -> i32;

    /// Index of the last block where data exists (inclusive).
    fn end_block(&self) -> i32;

    /// Total number of addressable blocks.
    fn num_blocks(&self) -> usize {
        usize::try_from(self.end_block() - self.start_block() + 1).unwrap_or(0)
    }

    /// Bounding rectangle of a block in the field's native projection.
    /// Only valid for indices in `start_block()..=end_block()`.
    fn block_rect(&self, block: i32) -> Rect;

    /// Pixels along the block's x axis.
    fn x_dim(&self) -> usize;

    /// Pixels along the block's y axis.
    fn y_dim(&self) -> usize;

    /// Element storage type.
    fn data_type(&self) -> DataType;

    /// Element size in bytes.
    fn data_size(&self) -> usize {
        self.data_type().size()
    }

    /// Sentinel byte pattern marking "no data", `data_size()` bytes long.
    /// Compared byte-for-byte against each raw element.
    fn fill_value(&self) -> &[u8];

    /// Fill `dest` with the raw elements of one block.
    ///
    /// `dest` must hold `x_dim() * y_dim() * data_size()` bytes. `dims`
    /// selects the visible slice for fields with extra dimensions beyond the
    /// two spatial axes; empty for plain 2D fields.
    ///
    /// # Errors
    /// Returns a description of the failure; the caller degrades the block
    /// to all-missing data.
    fn read_block(&self, dest: &mut [u8], block: i32, dims: &[usize]) -> Result<(), String>;

    /// Per-orbit projection constants relating this field's native space to
    /// the common geographic space, if known.
    fn projection(&self) -> Option<Projection> {
        None
    }

    /// Radiometric scaling factor. Neutral value 1.0 when absent.
    fn scale(&self) -> f64 {
        1.0
    }

    /// Band solar irradiance. Neutral value 0.0 when absent.
    fn solar_irradiance(&self) -> f64 {
        0.0
    }

    /// Sun distance in astronomical units. Neutral value 0.0 when absent.
    fn solar_distance(&self) -> f64 {
        0.0
    }
}

/// Resolves a field name and orbit to an accessor. This is how a tree
/// switches acquisition context: `set_orbit` asks the catalog for the same
/// field on the new orbit.
pub trait FieldCatalog {
    fn open_field(&self, name: &str, orbit: i32) -> Option<Arc<dyn FieldAccessor>>;
}

/// In-memory [`FieldAccessor`] used by tests and demos.
///
/// Supports read counting (cache idempotence checks) and per-block failure
/// injection (degradation checks).
pub struct MemoryField {
    name: String,
    start_block: i32,
    block_rects: Vec<Rect>,
    x_dim: usize,
    y_dim: usize,
    data_type: DataType,
    fill: Vec<u8>,
    blocks: Vec<Vec<u8>>,
    projection: Option<Projection>,
    scale: f64,
    solar_irradiance: f64,
    solar_distance: f64,
    failing: HashSet<i32>,
    reads: AtomicUsize,
}

impl MemoryField {
    /// Create a field with one rectangle and one raw data buffer per block.
    ///
    /// `blocks[i]` holds the raw elements of block `start_block + i` and
    /// must be `x_dim * y_dim * data_type.size()` bytes; `block_rects` must
    /// be the same length as `blocks`.
    #[must_use]
    pub fn new(
        name: &str,
        start_block: i32,
        block_rects: Vec<Rect>,
        x_dim: usize,
        y_dim: usize,
        data_type: DataType,
        fill: Vec<u8>,
        blocks: Vec<Vec<u8>>,
    ) -> Self {
        debug_assert_eq!(block_rects.len(), blocks.len(), "one rect per block");
        Self {
            name: name.to_string(),
            start_block,
            block_rects,
            x_dim,
            y_dim,
            data_type,
            fill,
            blocks,
            projection: None,
            scale: 1.0,
            solar_irradiance: 0.0,
            solar_distance: 0.0,
            failing: HashSet::new(),
            reads: AtomicUsize::new(0),
        }
    }

    /// Attach projection constants.
    #[must_use]
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Attach calibration constants.
    #[must_use]
    pub fn with_calibration(mut self, scale: f64, solar_irradiance: f64, solar_distance: f64) -> Self {
        self.scale = scale;
        self.solar_irradiance = solar_irradiance;
        self.solar_distance = solar_distance;
        self
    }

    /// Make reads of `block` fail.
    #[must_use]
    pub fn with_failing_block(mut self, block: i32) -> Self {
        self.failing.insert(block);
        self
    }

    /// Number of `read_block` calls that reached the backing buffers.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl FieldAccessor for MemoryField {
    fn name(&self) -> &str {
        &self.name
    }

    fn start_block(&self) -> i32 {
        self.start_block
    }

    fn end_block(&self) -> i32 {
        self.start_block + i32::try_from(self.blocks.len()).unwrap_or(0) - 1
    }

    fn block_rect(&self, block: i32) -> Rect {
        usize::try_from(block - self.start_block)
            .ok()
            .and_then(|i| self.block_rects.get(i))
            .copied()
            .unwrap_or_default()
    }

    fn x_dim(&self) -> usize {
        self.x_dim
    }

    fn y_dim(&self) -> usize {
        self.y_dim
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn fill_value(&self) -> &[u8] {
        &self.fill
    }

    fn read_block(&self, dest: &mut [u8], block: i32, dims: &[usize]) -> Result<(), String> {
        if !dims.is_empty() {
            return Err(format!("field '{}' has no extra dimensions", self.name));
        }
        if self.failing.contains(&block) {
            return Err(format!("injected read failure for block {block}"));
        }
        let index = usize::try_from(block - self.start_block)
            .ok()
            .filter(|i| *i < self.blocks.len())
            .ok_or_else(|| format!("block {block} out of range"))?;

        self.reads.fetch_add(1, Ordering::Relaxed);
        let data = &self.blocks[index];
        if dest.len() != data.len() {
            return Err(format!(
                "destination size {} does not match block size {}",
                dest.len(),
                data.len()
            ));
        }
        dest.copy_from_slice(data);
        Ok(())
    }

    fn projection(&self) -> Option<Projection> {
        self.projection
    }

    fn scale(&self) -> f64 {
        self.scale
    }

    fn solar_irradiance(&self) -> f64 {
        self.solar_irradiance
    }

    fn solar_distance(&self) -> f64 {
        self.solar_distance
    }
}

/// In-memory [`FieldCatalog`] keyed by field name and orbit.
#[derive(Default)]
pub struct MemoryCatalog {
    fields: HashMap<(String, i32), Arc<dyn FieldAccessor>>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, orbit: i32, field: Arc<dyn FieldAccessor>) {
        self.fields.insert((name.to_string(), orbit), field);
    }
}

impl FieldCatalog for MemoryCatalog {
    fn open_field(&self, name: &str, orbit: i32) -> Option<Arc<dyn FieldAccessor>> {
        self.fields.get(&(name.to_string(), orbit)).cloned()
    }
}

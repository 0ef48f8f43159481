#![doc = include_str!("../README.md")]
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`node`]: The sampling tree itself ([`DataNode`] and its variants)
//! - [`promote`]: The projector promotion tree rewrite
//! - [`field`]: Storage abstraction ([`FieldAccessor`], [`FieldCatalog`])
//! - [`block_cache`]: Per-source demand-paged LRU cache of decoded blocks
//! - [`ops`]: Pointwise unary and binary sample operators
//! - [`projector`]: Native/common coordinate-space bridges
//! - [`builder`]: Convenience builders for common tree shapes
//! - [`geometry`]: Coordinate types ([`Coord`], [`Rect`], [`Polygon`]) and projections
//! - [`sample`]: The `(data, coverage)` sample pair

// ============================================================================
// Public modules
// ============================================================================

pub mod block_cache;
pub mod builder;
pub mod casting;
pub mod field;
pub mod geometry;
pub mod node;
pub mod ops;
pub mod projector;
pub mod promote;
pub mod sample;

// ============================================================================
// Sampling Tree
// ============================================================================
// Primary API: build a DataNode tree, promote_projectors(), check(), value()

pub use node::{
    AverageNode,
    BinaryNode,
    DataNode,
    ProjectNode,
    SourceNode,
    StdDevNode,
    UnaryNode,
};

pub use promote::promote_projectors;

// ============================================================================
// Samples & Operators
// ============================================================================

pub use sample::Sample;

pub use ops::{
    BinaryFn,
    UnaryFn,
};

// ============================================================================
// Storage & Caching
// ============================================================================

pub use field::{
    DataType,
    FieldAccessor,
    FieldCatalog,
    MemoryCatalog,
    MemoryField,
};

pub use block_cache::{
    BlockCache,
    CachePolicy,
    DecodedBlock,
};

// ============================================================================
// Geometry & Projections
// ============================================================================

pub use geometry::{
    Coord,
    Mask,
    Polygon,
    Rect,
};
pub use geometry::projection::{
    project_point,
    get_proj_string,
    is_geographic_crs,
    COMMON_EPSG,
};

pub use projector::{
    Projection,
    Projector,
};

// ============================================================================
// Tree Builders
// ============================================================================

pub use builder::{
    averaged,
    reflectance,
    DEFAULT_AVERAGING_SPACING_METERS,
};

//! The sampling tree.
//!
//! A [`DataNode`] is one node of a pull-based evaluation tree. Asking the
//! root for a value at a coordinate recursively pulls from the leaves; every
//! query is total and answers with a [`Sample`], never an error. The variant
//! set is closed and dispatch is an exhaustive match, which is what lets the
//! projector promotion rewrite reason about tree shape safely.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::block_cache::{BlockCache, CachePolicy};
use crate::casting::{f64_to_block_offset, f64_to_pixel_index};
use crate::field::{FieldAccessor, FieldCatalog};
use crate::geometry::{Coord, Mask};
use crate::ops::{BinaryFn, UnaryFn};
use crate::projector::Projector;
use crate::sample::Sample;

/// One node of a sampling tree.
///
/// Arity is fixed per variant: sources have no inputs, binary operators have
/// two, everything else has one. An unset input holds [`DataNode::Null`],
/// which samples as empty and fails [`DataNode::check`], so inputs are never
/// absent.
pub enum DataNode {
    /// Neutral placeholder: empty samples, empty mask, failing check.
    Null,
    /// Leaf answering from a field through a block cache.
    Source(SourceNode),
    /// Pointwise transform of a single input.
    Unary(UnaryNode),
    /// Pointwise combination of two inputs.
    Binary(BinaryNode),
    /// Coordinate-space bridge: queries above are in common space, the
    /// subtree below is in the field's native space.
    Project(ProjectNode),
    /// Coverage-weighted mean over a square window.
    Average(AverageNode),
    /// Coverage-weighted standard deviation over the same window.
    StdDev(StdDevNode),
}

pub struct SourceNode {
    pub(crate) field: Option<Arc<dyn FieldAccessor>>,
    pub(crate) catalog: Option<Arc<dyn FieldCatalog>>,
    pub(crate) field_name: String,
    pub(crate) dims: Vec<usize>,
    pub(crate) cache: BlockCache,
}

pub struct UnaryNode {
    pub(crate) op: UnaryFn,
    pub(crate) input: Box<DataNode>,
}

pub struct BinaryNode {
    pub(crate) op: BinaryFn,
    pub(crate) left: Box<DataNode>,
    pub(crate) right: Box<DataNode>,
}

pub struct ProjectNode {
    pub(crate) projector: Option<Projector>,
    pub(crate) input: Box<DataNode>,
}

pub struct AverageNode {
    pub(crate) radius: usize,
    pub(crate) spacing: f64,
    pub(crate) input: Box<DataNode>,
}

pub struct StdDevNode {
    pub(crate) radius: usize,
    pub(crate) spacing: f64,
    pub(crate) input: Box<DataNode>,
}

impl Default for DataNode {
    fn default() -> Self {
        Self::Null
    }
}

impl DataNode {
    /// Bind a field as a leaf source with its own block cache.
    ///
    /// Opening the field eagerly surfaces a broken backing store at
    /// construction: on failure the source stays unbound, samples as empty
    /// and fails [`Self::check`].
    #[must_use]
    pub fn source(field: Arc<dyn FieldAccessor>, policy: CachePolicy) -> Self {
        Self::source_with_dims(field, Vec::new(), policy)
    }

    /// Like [`Self::source`] with a slice selector for fields carrying extra
    /// dimensions beyond the two spatial axes.
    #[must_use]
    pub fn source_with_dims(
        field: Arc<dyn FieldAccessor>,
        dims: Vec<usize>,
        policy: CachePolicy,
    ) -> Self {
        let field_name = field.name().to_string();
        let field = match field.open() {
            Ok(()) => Some(field),
            Err(error) => {
                warn!(field = %field_name, %error, "failed to open field, source stays unbound");
                None
            }
        };
        Self::Source(SourceNode {
            field,
            catalog: None,
            field_name,
            dims,
            cache: BlockCache::new(policy),
        })
    }

    /// Bind a source through a catalog so that [`Self::set_orbit`] can swap
    /// the backing field for another acquisition.
    #[must_use]
    pub fn from_catalog(
        catalog: Arc<dyn FieldCatalog>,
        field_name: &str,
        orbit: i32,
        policy: CachePolicy,
    ) -> Self {
        let mut node = Self::Source(SourceNode {
            field: None,
            catalog: Some(catalog),
            field_name: field_name.to_string(),
            dims: Vec::new(),
            cache: BlockCache::new(policy),
        });
        node.set_orbit(orbit);
        node
    }

    /// A source wrapped in a projector derived from the field's own
    /// projection constants, so queries arrive in common space.
    #[must_use]
    pub fn projected_source(field: Arc<dyn FieldAccessor>, policy: CachePolicy) -> Self {
        let projector = Projector::from_field(field.as_ref());
        Self::Project(ProjectNode {
            projector,
            input: Box::new(Self::source(field, policy)),
        })
    }

    #[must_use]
    pub fn unary(op: UnaryFn, input: DataNode) -> Self {
        Self::Unary(UnaryNode {
            op,
            input: Box::new(input),
        })
    }

    #[must_use]
    pub fn binary(op: BinaryFn, left: DataNode, right: DataNode) -> Self {
        Self::Binary(BinaryNode {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    #[must_use]
    pub fn project(projector: Projector, input: DataNode) -> Self {
        Self::Project(ProjectNode {
            projector: Some(projector),
            input: Box::new(input),
        })
    }

    #[must_use]
    pub fn average(radius: usize, spacing: f64, input: DataNode) -> Self {
        Self::Average(AverageNode {
            radius,
            spacing,
            input: Box::new(input),
        })
    }

    #[must_use]
    pub fn std_dev(radius: usize, spacing: f64, input: DataNode) -> Self {
        Self::StdDev(StdDevNode {
            radius,
            spacing,
            input: Box::new(input),
        })
    }

    /// Sample at a single coordinate. Total: any coordinate, including ones
    /// far outside the data or with a broken subtree, yields a sample.
    pub fn value(&mut self, location: Coord) -> Sample {
        match self {
            Self::Null => Sample::EMPTY,
            Self::Source(source) => source.value(location),
            Self::Unary(node) => node.op.apply(node.input.value(location)),
            Self::Binary(node) => {
                let left = node.left.value(location);
                let right = node.right.value(location);
                node.op.apply(left, right)
            }
            Self::Project(node) => {
                let Some(projector) = &node.projector else {
                    return Sample::EMPTY;
                };
                match projector.to_native(location) {
                    Ok(native) => node.input.value(native),
                    Err(_) => Sample::EMPTY,
                }
            }
            Self::Average(node) => {
                window_mean(&mut node.input, location, node.radius, node.spacing).mean
            }
            Self::StdDev(node) => {
                window_std_dev(&mut node.input, location, node.radius, node.spacing)
            }
        }
    }

    /// Batch sampling, same order and length as the input coordinates.
    ///
    /// Projector nodes transform the whole batch up front; a coordinate
    /// whose transform fails is poisoned and samples as empty downstream.
    pub fn values(&mut self, locations: &[Coord]) -> Vec<Sample> {
        match self {
            Self::Null => vec![Sample::EMPTY; locations.len()],
            Self::Source(source) => locations.iter().map(|c| source.value(*c)).collect(),
            Self::Unary(node) => {
                let inputs = node.input.values(locations);
                inputs.into_iter().map(|s| node.op.apply(s)).collect()
            }
            Self::Binary(node) => {
                let left = node.left.values(locations);
                let right = node.right.values(locations);
                left.into_iter()
                    .zip(right)
                    .map(|(l, r)| node.op.apply(l, r))
                    .collect()
            }
            Self::Project(node) => {
                let Some(projector) = &node.projector else {
                    return vec![Sample::EMPTY; locations.len()];
                };
                let native: Vec<Coord> = locations
                    .iter()
                    .map(|c| projector.to_native(*c).unwrap_or(Coord::INVALID))
                    .collect();
                node.input.values(&native)
            }
            Self::Average(_) | Self::StdDev(_) => {
                locations.iter().map(|c| self.value(*c)).collect()
            }
        }
    }

    /// True when every node in the tree is well-formed: sources have a field
    /// bound and projector nodes have a projector. A null placeholder is
    /// well-formed; it simply yields empty samples.
    #[must_use]
    pub fn check(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Source(source) => source.field.is_some(),
            Self::Unary(node) => node.input.check(),
            Self::Binary(node) => node.left.check() && node.right.check(),
            Self::Project(node) => node.projector.is_some() && node.input.check(),
            Self::Average(node) => node.input.check(),
            Self::StdDev(node) => node.input.check(),
        }
    }

    /// Conservative bound on where this tree can return coverage above zero.
    ///
    /// Sources answer with one polygon per block in native space; a
    /// projector node re-expresses its child's mask in common space; a
    /// projector without a projector instance bounds nothing.
    #[must_use]
    pub fn mask(&self) -> Mask {
        match self {
            Self::Null => Mask::new(),
            Self::Source(source) => source.mask(),
            Self::Unary(node) => node.input.mask(),
            Self::Binary(node) => {
                let mut mask = node.left.mask();
                mask.extend(node.right.mask());
                mask
            }
            Self::Project(node) => match &node.projector {
                Some(projector) => projector.mask_to_common(&node.input.mask()),
                None => Mask::new(),
            },
            Self::Average(node) => node.input.mask(),
            Self::StdDev(node) => node.input.mask(),
        }
    }

    /// Switch the whole tree to another acquisition.
    ///
    /// Catalog-backed sources flush their cache and re-resolve their field
    /// for the new orbit. Each projector node then re-derives its projector
    /// from the first source below it; a projector that finds no source
    /// becomes invalid and fails [`Self::check`].
    pub fn set_orbit(&mut self, orbit: i32) {
        match self {
            Self::Null => {}
            Self::Source(source) => source.set_orbit(orbit),
            Self::Unary(node) => node.input.set_orbit(orbit),
            Self::Binary(node) => {
                node.left.set_orbit(orbit);
                node.right.set_orbit(orbit);
            }
            Self::Project(node) => {
                node.input.set_orbit(orbit);
                node.projector = node
                    .input
                    .find_source()
                    .and_then(|source| source.field.as_ref())
                    .and_then(|field| Projector::from_field(field.as_ref()));
            }
            Self::Average(node) => node.input.set_orbit(orbit),
            Self::StdDev(node) => node.input.set_orbit(orbit),
        }
    }

    /// First source in depth-first order, left before right.
    #[must_use]
    pub fn find_source(&self) -> Option<&SourceNode> {
        match self {
            Self::Null => None,
            Self::Source(source) => Some(source),
            Self::Unary(node) => node.input.find_source(),
            Self::Binary(node) => node.left.find_source().or_else(|| node.right.find_source()),
            Self::Project(node) => node.input.find_source(),
            Self::Average(node) => node.input.find_source(),
            Self::StdDev(node) => node.input.find_source(),
        }
    }

    /// Drop every cached block in the tree. The next samples re-read from
    /// the backing fields.
    pub fn flush_caches(&mut self) {
        match self {
            Self::Null => {}
            Self::Source(source) => source.cache.flush(),
            Self::Unary(node) => node.input.flush_caches(),
            Self::Binary(node) => {
                node.left.flush_caches();
                node.right.flush_caches();
            }
            Self::Project(node) => node.input.flush_caches(),
            Self::Average(node) => node.input.flush_caches(),
            Self::StdDev(node) => node.input.flush_caches(),
        }
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = depth * 2;
        match self {
            Self::Null => writeln!(f, "{:pad$}null", ""),
            Self::Source(source) => writeln!(f, "{:pad$}source {}", "", source.field_name),
            Self::Unary(node) => {
                writeln!(f, "{:pad$}unary {}", "", node.op.name())?;
                node.input.fmt_tree(f, depth + 1)
            }
            Self::Binary(node) => {
                writeln!(f, "{:pad$}binary {}", "", node.op.name())?;
                node.left.fmt_tree(f, depth + 1)?;
                node.right.fmt_tree(f, depth + 1)
            }
            Self::Project(node) => {
                match &node.projector {
                    Some(projector) => {
                        writeln!(f, "{:pad$}project {:?}", "", projector.projection())?;
                    }
                    None => writeln!(f, "{:pad$}project <invalid>", "")?,
                }
                node.input.fmt_tree(f, depth + 1)
            }
            Self::Average(node) => {
                writeln!(f, "{:pad$}average r={} s={}", "", node.radius, node.spacing)?;
                node.input.fmt_tree(f, depth + 1)
            }
            Self::StdDev(node) => {
                writeln!(f, "{:pad$}stddev r={} s={}", "", node.radius, node.spacing)?;
                node.input.fmt_tree(f, depth + 1)
            }
        }
    }
}

/// Indented tree dump, one node per line. Diagnostics only.
impl fmt::Display for DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

impl SourceNode {
    /// The bound field, if any.
    #[must_use]
    pub fn field(&self) -> Option<&Arc<dyn FieldAccessor>> {
        self.field.as_ref()
    }

    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Sample in the field's native space.
    ///
    /// Blocks are laid out consecutively along the x axis: the block index
    /// comes from the x distance to the first block's rectangle divided by
    /// the signed block width, then the coordinate is localized into that
    /// block's unit square and floored to a pixel.
    fn value(&mut self, location: Coord) -> Sample {
        let Some(field) = &self.field else {
            return Sample::EMPTY;
        };
        let start = field.start_block();
        let start_rect = field.block_rect(start);
        let width = start_rect.width();
        if width == 0.0 {
            return Sample::EMPTY;
        }

        let Some(offset) = f64_to_block_offset((location.x - start_rect.left()) / width) else {
            return Sample::EMPTY;
        };
        let index = start + offset;
        if index > field.end_block() {
            return Sample::EMPTY;
        }

        let local = field.block_rect(index).convert_local(location);
        let x_dim = field.x_dim();
        let y_dim = field.y_dim();
        let (Some(px), Some(py)) = (
            f64_to_pixel_index(local.x * x_dim as f64, x_dim),
            f64_to_pixel_index(local.y * y_dim as f64, y_dim),
        ) else {
            return Sample::EMPTY;
        };

        self.cache
            .block(field.as_ref(), index, &self.dims)
            .sample(px, py)
    }

    fn mask(&self) -> Mask {
        let Some(field) = &self.field else {
            return Mask::new();
        };
        (field.start_block()..=field.end_block())
            .map(|index| field.block_rect(index).to_polygon())
            .collect()
    }

    fn set_orbit(&mut self, orbit: i32) {
        let Some(catalog) = &self.catalog else {
            // Without a catalog there is nothing to re-resolve against, so
            // the currently bound field stays.
            return;
        };
        if let Some(field) = self.field.take() {
            field.close();
        }
        self.cache.flush();
        self.field = match catalog.open_field(&self.field_name, orbit) {
            Some(field) => match field.open() {
                Ok(()) => Some(field),
                Err(error) => {
                    warn!(field = %self.field_name, orbit, %error, "failed to open field");
                    None
                }
            },
            None => {
                warn!(field = %self.field_name, orbit, "field not available for orbit");
                None
            }
        };
    }
}

struct WindowMean {
    mean: Sample,
    total_weight: f64,
}

/// Coverage-weighted mean over the `(2 * radius + 1)^2` grid of points
/// spaced `spacing` apart around `center`. All-empty windows yield an empty
/// sample.
fn window_mean(input: &mut DataNode, center: Coord, radius: usize, spacing: f64) -> WindowMean {
    let r = radius as i64;
    let side = 2 * r + 1;
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for dx in -r..=r {
        for dy in -r..=r {
            let offset = Coord::new(dx as f64 * spacing, dy as f64 * spacing);
            let sample = input.value(center + offset);
            weighted_sum += sample.data * sample.coverage;
            total_weight += sample.coverage;
        }
    }

    let mean = if total_weight > 0.0 {
        Sample::new(weighted_sum / total_weight, total_weight / (side * side) as f64)
    } else {
        Sample::EMPTY
    };
    WindowMean { mean, total_weight }
}

/// Coverage-weighted standard deviation around the window mean, with
/// Bessel's correction. Degenerate windows (effective sample count at or
/// below one) yield zero deviation at the mean's coverage.
fn window_std_dev(input: &mut DataNode, center: Coord, radius: usize, spacing: f64) -> Sample {
    let WindowMean { mean, total_weight } = window_mean(input, center, radius, spacing);
    if mean.is_empty() {
        return Sample::EMPTY;
    }
    if total_weight - 1.0 <= 0.0 {
        return Sample::new(0.0, mean.coverage);
    }

    let r = radius as i64;
    let mut weighted_squares = 0.0;
    for dx in -r..=r {
        for dy in -r..=r {
            let offset = Coord::new(dx as f64 * spacing, dy as f64 * spacing);
            let sample = input.value(center + offset);
            let deviation = sample.data - mean.data;
            weighted_squares += sample.coverage * deviation * deviation;
        }
    }

    let variance = weighted_squares / (total_weight - 1.0);
    Sample::new(variance.sqrt(), mean.coverage)
}

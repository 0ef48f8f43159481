//! Closed polygons and the conservative data-extent mask built from them.

use super::Coord;

/// An ordered list of vertices forming a closed polygon.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    vertices: Vec<Coord>,
}

impl Polygon {
    #[must_use]
    pub fn from_vertices(vertices: Vec<Coord>) -> Self {
        Self { vertices }
    }

    #[must_use]
    pub fn vertices(&self) -> &[Coord] {
        &self.vertices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Apply a transform to every vertex, producing a new polygon.
    #[must_use]
    pub fn map<F: FnMut(Coord) -> Coord>(&self, f: F) -> Self {
        Self {
            vertices: self.vertices.iter().copied().map(f).collect(),
        }
    }

    /// True if all edges wind counterclockwise. Only meaningful for convex
    /// polygons; a flipped edge shows up as a sign change in the cross
    /// product of consecutive edge vectors.
    #[must_use]
    pub fn is_ccw(&self) -> bool {
        for i in 2..self.vertices.len() {
            let e1 = self.vertices[i - 1] - self.vertices[i - 2];
            let e2 = self.vertices[i] - self.vertices[i - 1];
            if e1.x * e2.y - e1.y * e2.x < 0.0 {
                return false;
            }
        }
        true
    }
}

/// Conservative bound on where a node may return coverage > 0: the union of
/// the listed polygons contains every such point, but not every contained
/// point has data.
pub type Mask = Vec<Polygon>;

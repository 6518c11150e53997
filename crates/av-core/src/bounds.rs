//! Axis-aligned bounding boxes for part geometry.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in a part's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner of the bounding box.
    pub min: Vec3,
    /// Maximum corner of the bounding box.
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a new bounding box from min and max points.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates an empty (inverted) bounding box.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Creates a bounding box that contains all given points.
    ///
    /// Returns `None` when no points are given.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let bbox = points
            .into_iter()
            .fold(Self::empty(), |bbox, point| bbox.expand_to_include(point));
        bbox.is_valid().then_some(bbox)
    }

    /// Returns true if min is not above max on any axis.
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Returns the center of the bounding box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the size (full extents) of the bounding box.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Extent along Y.
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Y coordinate of the top face.
    pub fn top(&self) -> f32 {
        self.max.y
    }

    /// Y coordinate of the bottom face.
    pub fn bottom(&self) -> f32 {
        self.min.y
    }

    /// Multiplies both corners by a uniform factor.
    pub fn scaled(&self, factor: f32) -> BoundingBox {
        BoundingBox {
            min: self.min * factor,
            max: self.max * factor,
        }
    }

    /// Returns true if the bounding box contains the given point.
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Returns the union of two bounding boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns a new bounding box expanded to include the given point.
    pub fn expand_to_include(&self, point: Vec3) -> BoundingBox {
        BoundingBox {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }
}

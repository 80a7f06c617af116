#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::float_cmp)]

//! Tessellation of variable-width stroked polylines.
//!
//! ## Overview
//!
//! This crate turns a sequence of weighted, colored 2D points into the
//! geometry of a continuous stroked path: filled quads along each segment,
//! and circular arc sectors for the round end caps and round joins. The
//! output is either consumed directly as quads and arcs, or converted into
//! plain triangles for consumers that only accept triangle lists.
//!
//! The most interesting types and traits of this crate are:
//!
//! * [`StrokeTessellator`](struct.StrokeTessellator.html) - The tessellator
//!   itself. It pulls points from an iterator and pushes primitives into a
//!   builder as soon as enough of the polyline has been seen.
//! * [`PrimitiveBuilder`](geometry_builder/trait.PrimitiveBuilder.html) -
//!   The quad/arc output interface the tessellator writes to.
//! * [`Triangulator`](struct.Triangulator.html) - An adapter that splits
//!   each quad in two and fans out each arc sector, forwarding everything
//!   to a [`TriangleBuilder`](geometry_builder/trait.TriangleBuilder.html).
//!
//! See the [`geometry_builder` module documentation](geometry_builder/index.html)
//! for more details about how to consume the output, including assembling
//! vertex and index buffers with custom vertex types.
//!
//! ## Example
//!
//! ```
//! use polystroke::math::point;
//! use polystroke::geometry_builder::{simple_builder, VertexBuffers};
//! use polystroke::{Color, StrokeOptions, StrokePoint, StrokeTessellator};
//!
//! let red = Color::new(1.0, 0.0, 0.0, 1.0);
//! let points = vec![
//!     StrokePoint { position: point(0.0, 0.0), width: 4.0, color: red },
//!     StrokePoint { position: point(20.0, 0.0), width: 4.0, color: red },
//!     StrokePoint { position: point(20.0, 20.0), width: 2.0, color: red },
//! ];
//!
//! let mut buffers: VertexBuffers<_, u16> = VertexBuffers::new();
//! let mut tessellator = StrokeTessellator::new();
//! tessellator.tessellate_triangles(
//!     points,
//!     &StrokeOptions::default(),
//!     &mut simple_builder(&mut buffers),
//! );
//!
//! println!(
//!     " -- {} vertices, {} indices",
//!     buffers.vertices.len(),
//!     buffers.indices.len(),
//! );
//! ```

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

pub mod geometry_builder;
mod stroke;
mod triangulate;

#[doc(inline)]
pub use crate::geometry_builder::{
    simple_builder, BuffersBuilder, NoOutput, PrimitiveBuffers, PrimitiveBuilder, TriangleBuilder,
    TriangleVertex, TriangleVertexConstructor, VertexBuffers,
};

#[doc(inline)]
pub use crate::stroke::*;

#[doc(inline)]
pub use crate::triangulate::*;

use crate::math::{Angle, Point};

pub mod math {
    //! f32 euclid aliases used everywhere in this crate.

    pub use euclid;

    /// Alias for ```euclid::default::Point2D<f32>```.
    pub type Point = euclid::default::Point2D<f32>;

    /// Alias for ```euclid::default::Vector2D<f32>```.
    pub type Vector = euclid::default::Vector2D<f32>;

    /// An angle in radians (f32).
    pub type Angle = euclid::Angle<f32>;

    /// Shorthand for `Point::new(x, y)`.
    #[inline]
    pub fn point(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    /// Shorthand for `Vector::new(x, y)`.
    #[inline]
    pub fn vector(x: f32, y: f32) -> Vector {
        Vector::new(x, y)
    }

    /// The unit vector pointing at `angle` from the positive x axis.
    #[inline]
    pub fn dir(angle: Angle) -> Vector {
        vector(angle.radians.cos(), angle.radians.sin())
    }

    /// The angle of `v` from the positive x axis, computed with `atan2`.
    ///
    /// Not `Vector2D::angle_from_x_axis`, which approximates atan2 with a
    /// polynomial and returns NaN for the zero vector; `atan2(0, 0)` is 0,
    /// which keeps zero-length edges finite.
    #[inline]
    pub fn angle_of(v: Vector) -> Angle {
        Angle::radians(v.y.atan2(v.x))
    }
}

/// An unpremultiplied RGBA color with f32 components.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    /// The component-wise arithmetic mean of the two colors.
    ///
    /// This is a simple linear mean, not a gamma correct blend. It is what
    /// segment quads between two differently colored points are shaded with.
    #[inline]
    pub fn mix(self, other: Self) -> Self {
        Color {
            r: (self.r + other.r) / 2.0,
            g: (self.g + other.g) / 2.0,
            b: (self.b + other.b) / 2.0,
            a: (self.a + other.a) / 2.0,
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// An input point of a stroked polyline.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct StrokePoint {
    pub position: Point,
    /// Full stroke width at this point. All offset and cap math uses half
    /// of it as a radius.
    pub width: f32,
    pub color: Color,
}

impl StrokePoint {
    #[inline]
    pub fn radius(&self) -> f32 {
        self.width / 2.0
    }
}

/// A filled quad with winding-significant vertex order.
///
/// Triangulated as `(a, b, c)` and `(a, c, d)`. Quads standing in for
/// bevel facets may repeat a vertex and triangulate to one degenerate
/// triangle.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Quad {
    pub a: Point,
    pub b: Point,
    pub c: Point,
    pub d: Point,
}

impl Quad {
    /// The shoelace signed area of the quad's outline.
    pub fn signed_area(&self) -> f32 {
        let [a, b, c, d] = [self.a, self.b, self.c, self.d];
        ((a.x * b.y - b.x * a.y)
            + (b.x * c.y - c.x * b.y)
            + (c.x * d.y - d.x * c.y)
            + (d.x * a.y - a.x * d.y))
            / 2.0
    }
}

/// A filled triangle.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Triangle {
    pub a: Point,
    pub b: Point,
    pub c: Point,
}

impl Triangle {
    #[inline]
    pub fn signed_area(&self) -> f32 {
        (self.b - self.a).cross(self.c - self.a) / 2.0
    }
}

/// A filled circular sector (a pie slice, not an annulus).
///
/// `end_angle` is never below `start_angle`: sweep angles are unwrapped
/// upward by adding 2π until this holds, so a sector always describes a
/// single consistent sweep direction.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ArcSector {
    pub center: Point,
    pub start_angle: Angle,
    pub end_angle: Angle,
    pub radius: f32,
}

impl ArcSector {
    #[inline]
    pub fn sweep(&self) -> Angle {
        self.end_angle - self.start_angle
    }
}

/// A vertex offset in a `VertexBuffers` object.
///
/// Exists so that index buffers with narrow index types (`u16` and friends)
/// can be filled through a generic `From` bound.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexId(pub u32);

impl VertexId {
    #[inline]
    pub fn offset(self) -> u32 {
        self.0
    }
}

impl From<VertexId> for u16 {
    fn from(v: VertexId) -> Self {
        v.0 as u16
    }
}
impl From<VertexId> for u32 {
    fn from(v: VertexId) -> Self {
        v.0
    }
}
impl From<VertexId> for u64 {
    fn from(v: VertexId) -> Self {
        v.0 as u64
    }
}
impl From<VertexId> for usize {
    fn from(v: VertexId) -> Self {
        v.0 as usize
    }
}

/// Parameters for the stroke tessellator.
///
/// By default, joins sweeping
/// less than π/8 are plain miters, joins sweeping less than π/7 get a flat
/// bevel facet, and wider joins are rounded with an arc sector.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct StrokeOptions {
    /// Joins whose swept angle is below this threshold are rendered as a
    /// plain miter folded into the segment quad. In radians.
    ///
    /// Default value: `StrokeOptions::DEFAULT_BEVEL_ANGLE`.
    pub bevel_angle: f32,

    /// Joins whose swept angle is at least this threshold are rounded with
    /// an arc sector instead of a flat bevel facet. In radians.
    ///
    /// Default value: `StrokeOptions::DEFAULT_ROUND_JOIN_ANGLE`.
    pub round_join_angle: f32,

    /// Angular step used when subdividing arc sectors into triangle fans.
    ///
    /// The step is fixed and not adaptive to the arc radius, so large radii
    /// produce visibly faceted fans. In radians, must be greater than zero.
    ///
    /// Default value: `StrokeOptions::DEFAULT_ARC_STEP`.
    pub arc_step: f32,
}

impl StrokeOptions {
    pub const DEFAULT_BEVEL_ANGLE: f32 = core::f32::consts::PI / 8.0;
    pub const DEFAULT_ROUND_JOIN_ANGLE: f32 = core::f32::consts::PI / 7.0;
    pub const DEFAULT_ARC_STEP: f32 = 0.5;

    pub const DEFAULT: Self = StrokeOptions {
        bevel_angle: Self::DEFAULT_BEVEL_ANGLE,
        round_join_angle: Self::DEFAULT_ROUND_JOIN_ANGLE,
        arc_step: Self::DEFAULT_ARC_STEP,
    };

    #[inline]
    pub const fn with_bevel_angle(mut self, angle: f32) -> Self {
        self.bevel_angle = angle;
        self
    }

    #[inline]
    pub const fn with_round_join_angle(mut self, angle: f32) -> Self {
        self.round_join_angle = angle;
        self
    }

    #[inline]
    pub fn with_arc_step(mut self, step: f32) -> Self {
        assert!(step > 0.0);
        self.arc_step = step;
        self
    }
}

impl Default for StrokeOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[test]
fn test_default_options() {
    let options = StrokeOptions::default();

    assert_eq!(options.bevel_angle, core::f32::consts::PI / 8.0);
    assert_eq!(options.round_join_angle, core::f32::consts::PI / 7.0);
    assert_eq!(options.arc_step, 0.5);
}

#[test]
fn test_with_arc_step() {
    let options = StrokeOptions::default().with_arc_step(0.25);

    assert_eq!(options.arc_step, 0.25);
}

#[test]
#[should_panic]
fn test_with_invalid_arc_step() {
    let _ = StrokeOptions::default().with_arc_step(0.0);
}

#[test]
fn test_color_mix() {
    let a = Color::new(1.0, 0.0, 0.5, 1.0);
    let b = Color::new(0.0, 1.0, 0.5, 0.0);

    assert_eq!(a.mix(b), Color::new(0.5, 0.5, 0.5, 0.5));
    assert_eq!(a.mix(a), a);
}

//! Tools to consume the tessellator's output.
//!
//! ## Overview
//!
//! The tessellator does not retain any of the geometry it produces. Instead
//! it pushes every primitive into a builder object as soon as the primitive
//! is known, which lets applications write the output into whatever
//! representation they need without an intermediate copy.
//!
//! Two builder traits exist, one per output flavor:
//!
//! * [`PrimitiveBuilder`](trait.PrimitiveBuilder.html) - receives quads and
//!   arc sectors. This is what
//!   [`StrokeTessellator::tessellate`](../struct.StrokeTessellator.html)
//!   writes to.
//! * [`TriangleBuilder`](trait.TriangleBuilder.html) - receives plain
//!   triangles, for consumers that cannot accept quads or arcs directly.
//!   [`Triangulator`](../struct.Triangulator.html) adapts the former into
//!   the latter.
//!
//! Both traits report acceptance of each primitive with a `bool`. The flag
//! is a best-effort status only: the tessellator keeps pulling points and
//! emitting primitives regardless of what the builder returns, so a builder
//! that runs out of room simply ends up with a partial tessellation and a
//! `false` somewhere along the way.
//!
//! It is very common to accumulate the triangulated output in a pair of
//! vertex and index vectors, so this module also provides:
//!
//! * The struct [`VertexBuffers`](struct.VertexBuffers.html), a simple pair
//!   of vectors of vertices and indices (generic parameters).
//! * The struct [`BuffersBuilder`](struct.BuffersBuilder.html) which writes
//!   into a `VertexBuffers` and implements `TriangleBuilder`. It takes care
//!   of filling the buffers while producing vertices is delegated to a
//!   [`TriangleVertexConstructor`](trait.TriangleVertexConstructor.html),
//!   so any vertex layout can be generated. The
//!   [`Positions`](struct.Positions.html) constructor simply keeps the
//!   vertex position and drops the color.
//! * The struct [`PrimitiveBuffers`](struct.PrimitiveBuffers.html) which
//!   captures the quads and arc sectors themselves, for callers that want
//!   to post-process or batch them before triangulating.
//!
//! ## Generating custom vertices
//!
//! The example below implements `TriangleVertexConstructor` in order to
//! store a custom vertex type carrying both position and color:
//!
//! ```
//! use polystroke::geometry_builder::{
//!     BuffersBuilder, TriangleVertex, TriangleVertexConstructor, VertexBuffers,
//! };
//! use polystroke::math::point;
//! use polystroke::{Color, StrokeOptions, StrokePoint, StrokeTessellator};
//!
//! #[derive(Copy, Clone, Debug)]
//! struct GpuVertex {
//!     position: [f32; 2],
//!     color: [f32; 4],
//! }
//!
//! struct WithColor;
//!
//! impl TriangleVertexConstructor<GpuVertex> for WithColor {
//!     fn new_vertex(&mut self, vertex: TriangleVertex) -> GpuVertex {
//!         GpuVertex {
//!             position: vertex.position().to_array(),
//!             color: vertex.color().to_array(),
//!         }
//!     }
//! }
//!
//! let green = Color::new(0.0, 1.0, 0.0, 1.0);
//! let points = vec![
//!     StrokePoint { position: point(0.0, 0.0), width: 2.0, color: green },
//!     StrokePoint { position: point(10.0, 5.0), width: 2.0, color: green },
//! ];
//!
//! let mut buffers: VertexBuffers<GpuVertex, u32> = VertexBuffers::new();
//! StrokeTessellator::new().tessellate_triangles(
//!     points,
//!     &StrokeOptions::default(),
//!     &mut BuffersBuilder::new(&mut buffers, WithColor),
//! );
//!
//! assert!(!buffers.vertices.is_empty());
//! ```

use crate::math::Point;
use crate::{ArcSector, Color, Quad, Triangle, VertexId};

/// The output interface for quads and arc sectors.
///
/// This is what the stroke tessellator pushes its primitives into. The
/// return values are best-effort acceptance flags and never alter the
/// tessellator's control flow.
pub trait PrimitiveBuilder {
    /// Insert a filled quad. Returns whether the quad was accepted.
    fn add_quad(&mut self, quad: Quad, color: Color) -> bool;

    /// Insert a filled circular sector. Returns whether it was accepted.
    fn add_arc(&mut self, arc: ArcSector, color: Color) -> bool;
}

/// The output interface for plain triangles.
pub trait TriangleBuilder {
    /// Insert a filled triangle. Returns whether it was accepted.
    ///
    /// Triangles produced from degenerate bevel quads may repeat a vertex;
    /// implementations must tolerate zero-area triangles.
    fn add_triangle(&mut self, triangle: Triangle, color: Color) -> bool;
}

/// Captures quads and arc sectors in plain vectors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrimitiveBuffers {
    pub quads: Vec<(Quad, Color)>,
    pub arcs: Vec<(ArcSector, Color)>,
}

impl PrimitiveBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty the buffers without freeing memory, for reuse without
    /// reallocation.
    pub fn clear(&mut self) {
        self.quads.clear();
        self.arcs.clear();
    }
}

impl PrimitiveBuilder for PrimitiveBuffers {
    fn add_quad(&mut self, quad: Quad, color: Color) -> bool {
        self.quads.push((quad, color));
        true
    }

    fn add_arc(&mut self, arc: ArcSector, color: Color) -> bool {
        self.arcs.push((arc, color));
        true
    }
}

/// Structure that holds the vertex and index data.
///
/// Usually written into though temporary `BuffersBuilder` objects.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct VertexBuffers<OutputVertex, OutputIndex> {
    pub vertices: Vec<OutputVertex>,
    pub indices: Vec<OutputIndex>,
}

impl<OutputVertex, OutputIndex> VertexBuffers<OutputVertex, OutputIndex> {
    /// Constructor
    pub fn new() -> Self {
        VertexBuffers::with_capacity(512, 1024)
    }

    /// Constructor
    pub fn with_capacity(num_vertices: usize, num_indices: usize) -> Self {
        VertexBuffers {
            vertices: Vec::with_capacity(num_vertices),
            indices: Vec::with_capacity(num_indices),
        }
    }

    /// Empty the buffers without freeing memory, for reuse without reallocation.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }
}

/// A vertex handed to vertex constructors: the position of one triangle
/// corner and the color of the primitive the triangle came from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriangleVertex {
    pub(crate) position: Point,
    pub(crate) color: Color,
}

impl TriangleVertex {
    #[inline]
    pub fn position(&self) -> Point {
        self.position
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }
}

/// A trait specifying how to create vertex values.
pub trait TriangleVertexConstructor<OutputVertex> {
    fn new_vertex(&mut self, vertex: TriangleVertex) -> OutputVertex;
}

/// A simple vertex constructor that just takes the position.
pub struct Positions;

impl TriangleVertexConstructor<Point> for Positions {
    fn new_vertex(&mut self, vertex: TriangleVertex) -> Point {
        vertex.position()
    }
}

impl<F, OutputVertex> TriangleVertexConstructor<OutputVertex> for F
where
    F: Fn(TriangleVertex) -> OutputVertex,
{
    fn new_vertex(&mut self, vertex: TriangleVertex) -> OutputVertex {
        self(vertex)
    }
}

/// A `TriangleBuilder` that writes into a `VertexBuffers` object.
///
/// Each accepted triangle appends three vertices (built by the vertex
/// constructor) and their three indices. A triangle that would push the
/// vertex count past what the index type can address is rejected and the
/// buffers are left untouched, which surfaces through the builder's
/// best-effort `bool` result.
pub struct BuffersBuilder<'l, OutputVertex: 'l, OutputIndex: 'l, Ctor> {
    buffers: &'l mut VertexBuffers<OutputVertex, OutputIndex>,
    vertex_constructor: Ctor,
}

impl<'l, OutputVertex: 'l, OutputIndex: 'l, Ctor>
    BuffersBuilder<'l, OutputVertex, OutputIndex, Ctor>
{
    pub fn new(buffers: &'l mut VertexBuffers<OutputVertex, OutputIndex>, ctor: Ctor) -> Self {
        BuffersBuilder {
            buffers,
            vertex_constructor: ctor,
        }
    }

    pub fn buffers<'a, 'b: 'a>(&'b self) -> &'a VertexBuffers<OutputVertex, OutputIndex> {
        self.buffers
    }
}

impl<'l, OutputVertex, OutputIndex, Ctor> TriangleBuilder
    for BuffersBuilder<'l, OutputVertex, OutputIndex, Ctor>
where
    OutputVertex: 'l,
    OutputIndex: From<VertexId> + MaxIndex,
    Ctor: TriangleVertexConstructor<OutputVertex>,
{
    fn add_triangle(&mut self, triangle: Triangle, color: Color) -> bool {
        if self.buffers.vertices.len() + 3 > OutputIndex::MAX {
            return false;
        }
        for &position in &[triangle.a, triangle.b, triangle.c] {
            let index = VertexId(self.buffers.vertices.len() as u32);
            self.buffers
                .vertices
                .push(self.vertex_constructor.new_vertex(TriangleVertex {
                    position,
                    color,
                }));
            self.buffers.indices.push(index.into());
        }

        true
    }
}

/// A `BuffersBuilder` that takes the actual vertex type as input.
pub type SimpleBuffersBuilder<'l> = BuffersBuilder<'l, Point, u16, Positions>;

/// Creates a `SimpleBuffersBuilder`.
pub fn simple_builder(buffers: &mut VertexBuffers<Point, u16>) -> SimpleBuffersBuilder {
    BuffersBuilder::new(buffers, Positions)
}

/// A builder that does not retain any geometry.
///
/// Mostly useful for testing.
#[derive(Clone, Debug, Default)]
pub struct NoOutput;

impl NoOutput {
    pub fn new() -> Self {
        NoOutput
    }
}

impl PrimitiveBuilder for NoOutput {
    fn add_quad(&mut self, _quad: Quad, _color: Color) -> bool {
        true
    }

    fn add_arc(&mut self, _arc: ArcSector, _color: Color) -> bool {
        true
    }
}

impl TriangleBuilder for NoOutput {
    fn add_triangle(&mut self, _triangle: Triangle, _color: Color) -> bool {
        true
    }
}

/// Provides the maximum number of vertices an index type can address.
///
/// This should be the maximum value representable by the index type up
/// to u32::MAX because indices are generated internally as u32.
pub trait MaxIndex {
    const MAX: usize;
}

impl MaxIndex for u16 {
    const MAX: usize = u16::MAX as usize;
}
impl MaxIndex for u32 {
    const MAX: usize = u32::MAX as usize;
}
// Indices are generated as u32 so we can't have more than u32::MAX.
impl MaxIndex for u64 {
    const MAX: usize = u32::MAX as usize;
}
impl MaxIndex for usize {
    const MAX: usize = u32::MAX as usize;
}

#[cfg(test)]
use crate::math::point;

#[test]
fn simple_builder_indices() {
    let mut buffers: VertexBuffers<Point, u16> = VertexBuffers::new();
    let accepted = simple_builder(&mut buffers).add_triangle(
        Triangle {
            a: point(0.0, 0.0),
            b: point(1.0, 0.0),
            c: point(1.0, 1.0),
        },
        Color::new(1.0, 1.0, 1.0, 1.0),
    );

    assert!(accepted);
    assert_eq!(
        buffers.vertices,
        vec![point(0.0, 0.0), point(1.0, 0.0), point(1.0, 1.0)]
    );
    assert_eq!(buffers.indices, vec![0, 1, 2]);
}

#[test]
fn buffers_builder_index_overflow() {
    // A u16 index type can address 65535 vertices, which is room for
    // exactly 21845 triangles. The next one must be rejected without
    // corrupting the buffers.
    let mut buffers: VertexBuffers<Point, u16> = VertexBuffers::new();
    let mut builder = simple_builder(&mut buffers);
    let white = Color::new(1.0, 1.0, 1.0, 1.0);
    let triangle = Triangle {
        a: point(0.0, 0.0),
        b: point(1.0, 0.0),
        c: point(1.0, 1.0),
    };

    for _ in 0..21845 {
        assert!(builder.add_triangle(triangle, white));
    }
    assert!(!builder.add_triangle(triangle, white));

    assert_eq!(buffers.vertices.len(), 65535);
    assert_eq!(buffers.indices.len(), 65535);
}

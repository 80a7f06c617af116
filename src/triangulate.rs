use crate::geometry_builder::{PrimitiveBuilder, TriangleBuilder};
use crate::math::{dir, Angle};
use crate::{ArcSector, Color, Quad, Triangle};

/// Adapts a triangle-only builder into a [`PrimitiveBuilder`].
///
/// Each quad `{a, b, c, d}` becomes the two triangles `(a, b, c)` and
/// `(a, c, d)`, preserving the quad's winding. Each arc sector is fanned
/// out into `ceil(sweep / arc_step)` equal wedges around its center. The
/// angular step is fixed, not adaptive to the radius, so large arcs come
/// out visibly faceted; this mirrors how the primitives are expected to
/// be rasterized.
///
/// For each primitive the adapter reports the logical AND of the
/// underlying triangle results, in keeping with the best-effort
/// acceptance contract: a rejected triangle does not stop the remaining
/// triangles of the same primitive from being emitted.
///
/// [`PrimitiveBuilder`]: geometry_builder/trait.PrimitiveBuilder.html
///
/// # Examples
///
/// ```
/// use polystroke::geometry_builder::{PrimitiveBuilder, VertexBuffers, simple_builder};
/// use polystroke::math::point;
/// use polystroke::{Color, Quad, Triangulator};
///
/// let mut buffers: VertexBuffers<_, u16> = VertexBuffers::new();
/// let mut sink = simple_builder(&mut buffers);
/// let mut triangulator = Triangulator::new(&mut sink, 0.5);
///
/// triangulator.add_quad(
///     Quad {
///         a: point(0.0, 0.0),
///         b: point(1.0, 0.0),
///         c: point(1.0, 1.0),
///         d: point(0.0, 1.0),
///     },
///     Color::new(1.0, 1.0, 1.0, 1.0),
/// );
///
/// assert_eq!(buffers.indices.len(), 6);
/// ```
pub struct Triangulator<'l, B: ?Sized> {
    output: &'l mut B,
    arc_step: f32,
}

impl<'l, B: TriangleBuilder + ?Sized> Triangulator<'l, B> {
    /// Wraps a triangle builder. `arc_step` is the fan subdivision step
    /// in radians and must be greater than zero.
    pub fn new(output: &'l mut B, arc_step: f32) -> Self {
        assert!(arc_step > 0.0);
        Triangulator { output, arc_step }
    }
}

impl<'l, B: TriangleBuilder + ?Sized> PrimitiveBuilder for Triangulator<'l, B> {
    fn add_quad(&mut self, quad: Quad, color: Color) -> bool {
        let mut accepted = self.output.add_triangle(
            Triangle {
                a: quad.a,
                b: quad.b,
                c: quad.c,
            },
            color,
        );
        accepted &= self.output.add_triangle(
            Triangle {
                a: quad.a,
                b: quad.c,
                c: quad.d,
            },
            color,
        );

        accepted
    }

    fn add_arc(&mut self, arc: ArcSector, color: Color) -> bool {
        let sweep = arc.sweep().radians;
        let segments = (sweep / self.arc_step).ceil() as i32;
        let mut accepted = true;
        for i in 0..segments {
            let start = arc.start_angle + Angle::radians(sweep * (i as f32 / segments as f32));
            let stop = arc.start_angle + Angle::radians(sweep * ((i + 1) as f32 / segments as f32));
            accepted &= self.output.add_triangle(
                Triangle {
                    a: arc.center,
                    b: arc.center + dir(start) * arc.radius,
                    c: arc.center + dir(stop) * arc.radius,
                },
                color,
            );
        }

        accepted
    }
}

#[cfg(test)]
use crate::geometry_builder::NoOutput;
#[cfg(test)]
use crate::math::{point, Point};

#[cfg(test)]
const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

#[cfg(test)]
#[derive(Default)]
struct CollectTriangles {
    triangles: Vec<Triangle>,
}

#[cfg(test)]
impl TriangleBuilder for CollectTriangles {
    fn add_triangle(&mut self, triangle: Triangle, _color: Color) -> bool {
        self.triangles.push(triangle);
        true
    }
}

#[test]
fn test_quad_split() {
    let mut sink = CollectTriangles::default();
    let quad = Quad {
        a: point(0.0, 0.0),
        b: point(2.0, 0.0),
        c: point(2.0, 1.0),
        d: point(0.0, 1.0),
    };
    let accepted = Triangulator::new(&mut sink, 0.5).add_quad(quad, WHITE);

    assert!(accepted);
    assert_eq!(sink.triangles.len(), 2);
    assert_eq!(sink.triangles[0].a, quad.a);
    assert_eq!(sink.triangles[0].b, quad.b);
    assert_eq!(sink.triangles[0].c, quad.c);
    assert_eq!(sink.triangles[1].a, quad.a);
    assert_eq!(sink.triangles[1].b, quad.c);
    assert_eq!(sink.triangles[1].c, quad.d);

    let split_area: f32 = sink.triangles.iter().map(Triangle::signed_area).sum();
    assert_eq!(split_area, quad.signed_area());
}

#[test]
fn test_full_circle_wedge_count() {
    // ceil(2π / 0.5) = 13 wedges for a full circle.
    let mut sink = CollectTriangles::default();
    let arc = ArcSector {
        center: point(1.0, 1.0),
        start_angle: Angle::radians(0.0),
        end_angle: Angle::two_pi(),
        radius: 2.0,
    };
    let accepted = Triangulator::new(&mut sink, 0.5).add_arc(arc, WHITE);

    assert!(accepted);
    assert_eq!(sink.triangles.len(), 13);

    for triangle in &sink.triangles {
        assert_eq!(triangle.a, arc.center);
        assert!(((triangle.b - arc.center).length() - arc.radius).abs() < 0.00001);
        assert!(((triangle.c - arc.center).length() - arc.radius).abs() < 0.00001);
    }

    // Consecutive wedges share an edge.
    for pair in sink.triangles.windows(2) {
        assert_eq!(pair[0].c, pair[1].b);
    }
}

#[test]
fn test_zero_sweep_arc() {
    let mut sink = CollectTriangles::default();
    let arc = ArcSector {
        center: point(0.0, 0.0),
        start_angle: Angle::pi(),
        end_angle: Angle::pi(),
        radius: 1.0,
    };
    let accepted = Triangulator::new(&mut sink, 0.5).add_arc(arc, WHITE);

    assert!(accepted);
    assert!(sink.triangles.is_empty());
}

#[test]
fn test_rejection_is_accumulated_not_aborting() {
    // A sink that rejects every other triangle: the adapter must keep
    // going and report failure only through the returned flag.
    struct RejectOdd {
        count: u32,
    }
    impl TriangleBuilder for RejectOdd {
        fn add_triangle(&mut self, _: Triangle, _: Color) -> bool {
            self.count += 1;
            self.count % 2 == 1
        }
    }

    let mut sink = RejectOdd { count: 0 };
    let arc = ArcSector {
        center: point(0.0, 0.0),
        start_angle: Angle::radians(0.0),
        end_angle: Angle::pi(),
        radius: 1.0,
    };
    let accepted = Triangulator::new(&mut sink, 0.5).add_arc(arc, WHITE);

    assert!(!accepted);
    // ceil(π / 0.5) = 7: every wedge was still attempted.
    assert_eq!(sink.count, 7);
}

#[test]
#[should_panic]
fn test_invalid_arc_step() {
    let _ = Triangulator::new(&mut NoOutput::new(), 0.0);
}

#[test]
fn test_no_output_accepts_everything() {
    let mut out = NoOutput::new();
    let accepted = Triangulator::new(&mut out, 0.5).add_quad(
        Quad {
            a: Point::zero(),
            b: point(1.0, 0.0),
            c: point(1.0, 1.0),
            d: point(0.0, 1.0),
        },
        WHITE,
    );

    assert!(accepted);
}

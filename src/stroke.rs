use crate::geometry_builder::{PrimitiveBuilder, TriangleBuilder};
use crate::math::{angle_of, dir, Angle, Point};
use crate::triangulate::Triangulator;
use crate::{ArcSector, Color, Quad, StrokeOptions, StrokePoint};

/// A tessellator for variable-width, per-point colored stroked polylines.
///
/// ## Overview
///
/// The tessellator walks the input with a three point sliding window and
/// emits primitives as soon as the middle point's join is fully
/// determined: one quad per segment, stitched seamlessly to the previous
/// segment through a carried trailing edge, plus join geometry at each
/// interior point and a round cap at each open end. Joins are classified
/// by their swept angle: shallow turns are folded into the segment quad
/// as a plain miter, moderate turns get a flat bevel facet, and wide
/// turns are rounded with an arc sector.
///
/// Segment quads are shaded with the mean of the two endpoint colors;
/// join and cap primitives use their own point's color.
///
/// The tessellator holds no state between calls. Each call runs to
/// completion on the calling thread, pulling points and pushing
/// primitives strictly in sequence; the point iterator running out is
/// the only termination signal.
///
/// # Examples
///
/// ```
/// use polystroke::geometry_builder::PrimitiveBuffers;
/// use polystroke::math::point;
/// use polystroke::{Color, StrokeOptions, StrokePoint, StrokeTessellator};
///
/// let white = Color::new(1.0, 1.0, 1.0, 1.0);
/// let points = vec![
///     StrokePoint { position: point(0.0, 0.0), width: 2.0, color: white },
///     StrokePoint { position: point(10.0, 0.0), width: 2.0, color: white },
///     StrokePoint { position: point(10.0, 10.0), width: 2.0, color: white },
/// ];
///
/// let mut buffers = PrimitiveBuffers::new();
/// let mut tessellator = StrokeTessellator::new();
/// tessellator.tessellate(points, &StrokeOptions::default(), &mut buffers);
///
/// println!(
///     " -- {} quads, {} arc sectors",
///     buffers.quads.len(),
///     buffers.arcs.len(),
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct StrokeTessellator {}

/// The two outline vertices a join leaves behind for the next segment
/// quad to connect to.
#[derive(Copy, Clone, Debug)]
struct TrailingEdge {
    top: Point,
    bot: Point,
}

impl StrokeTessellator {
    pub fn new() -> Self {
        StrokeTessellator {}
    }

    /// Compute the tessellation from an iterator of stroke points.
    ///
    /// Consecutive coincident points are passed through unfiltered: the
    /// direction of a zero-length edge degenerates to `atan2(0, 0)`,
    /// which is 0, so the affected join collapses along the positive x
    /// axis rather than producing NaN geometry.
    pub fn tessellate(
        &mut self,
        input: impl IntoIterator<Item = StrokePoint>,
        options: &StrokeOptions,
        output: &mut dyn PrimitiveBuilder,
    ) {
        let mut points = input.into_iter();

        let mut p0 = match points.next() {
            Some(p) => p,
            None => {
                return;
            }
        };
        let mut p1 = match points.next() {
            Some(p) => p,
            None => {
                // A single point renders as a dot: one full circle.
                output.add_arc(
                    ArcSector {
                        center: p0.position,
                        start_angle: Angle::radians(0.0),
                        end_angle: Angle::two_pi(),
                        radius: p0.radius(),
                    },
                    p0.color,
                );
                return;
            }
        };
        let mut p2 = match points.next() {
            Some(p) => p,
            None => {
                self.tessellate_capsule(&p0, &p1, output);
                return;
            }
        };

        // Start cap on the far side of the first edge, and the initial
        // trailing edge for the first segment quad to connect to.
        let a01 = angle_of(p1.position - p0.position);
        output.add_arc(
            ArcSector {
                center: p0.position,
                start_angle: a01 + Angle::frac_pi_2(),
                end_angle: a01 + Angle::pi() + Angle::frac_pi_2(),
                radius: p0.radius(),
            },
            p0.color,
        );
        let perp = dir(a01 + Angle::frac_pi_2()) * p0.radius();
        let mut edge = TrailingEdge {
            top: p0.position - perp,
            bot: p0.position + perp,
        };

        loop {
            let v01 = p1.position - p0.position;
            let v12 = p2.position - p1.position;
            let v02 = p2.position - p0.position;
            let a01 = angle_of(v01);
            let a12 = angle_of(v12);

            // Positive when p1 lies to the left of the chord p0 -> p2.
            // The sign picks which tangent offset is the outer bevel side
            // and which way the trailing edge pairs up with it.
            let cross = v02.cross(v01);

            let mut bevel_start = a01
                + if cross > 0.0 {
                    -Angle::frac_pi_2()
                } else {
                    Angle::frac_pi_2()
                }
                + Angle::pi();
            let mut bevel_end = a12
                + if cross > 0.0 {
                    Angle::frac_pi_2()
                } else {
                    -Angle::frac_pi_2()
                };
            if cross > 0.0 {
                // Keep bevel_end >= bevel_start for the shortest
                // consistent sweep, and the trailing edge on the right
                // rendered side.
                core::mem::swap(&mut bevel_start, &mut bevel_end);
                core::mem::swap(&mut edge.top, &mut edge.bot);
            }
            while bevel_end < bevel_start {
                bevel_end += Angle::two_pi();
            }

            let radius = p1.radius();
            // The miter tip: outward along the renormalized average of
            // the two bevel tangent directions.
            let tip_angle =
                angle_of((dir(bevel_start) + dir(bevel_end)) / 2.0) + Angle::pi();
            let tip = p1.position + dir(tip_angle) * radius;
            let l = p1.position + dir(bevel_start) * radius;
            let r = p1.position + dir(bevel_end) * radius;

            let sweep = bevel_end - bevel_start;
            let segment_color = p0.color.mix(p1.color);
            if sweep.radians < options.bevel_angle {
                // The turn is shallow enough that the miter tip alone
                // covers it: fold the join into the segment quad.
                output.add_quad(
                    Quad {
                        a: edge.top,
                        b: edge.bot,
                        c: tip,
                        d: if cross > 0.0 { l } else { r },
                    },
                    segment_color,
                );
            } else if sweep.radians < options.round_join_angle {
                // Flat bevel facet, a triangle expressed as a quad.
                output.add_quad(
                    Quad {
                        a: l,
                        b: l,
                        c: tip,
                        d: r,
                    },
                    p1.color,
                );
                output.add_quad(
                    Quad {
                        a: edge.top,
                        b: edge.bot,
                        c: tip,
                        d: if cross > 0.0 { r } else { l },
                    },
                    segment_color,
                );
            } else {
                // Round join: an arc sector spanning the bevel plus a fan
                // quad filling the wedge between the tangent points.
                output.add_arc(
                    ArcSector {
                        center: p1.position,
                        start_angle: bevel_start,
                        end_angle: bevel_end,
                        radius,
                    },
                    p1.color,
                );
                output.add_quad(
                    Quad {
                        a: p1.position,
                        b: l,
                        c: tip,
                        d: r,
                    },
                    p1.color,
                );
                output.add_quad(
                    Quad {
                        a: edge.top,
                        b: edge.bot,
                        c: tip,
                        d: if cross > 0.0 { r } else { l },
                    },
                    segment_color,
                );
            }

            // Carry the join outline over as the next segment's trailing
            // edge, reswapped so edge polarity is preserved.
            edge.top = tip;
            edge.bot = if cross > 0.0 { l } else { r };
            if cross <= 0.0 {
                core::mem::swap(&mut edge.top, &mut edge.bot);
            }

            match points.next() {
                Some(next) => {
                    p0 = p1;
                    p1 = p2;
                    p2 = next;
                }
                None => {
                    // Close out: the last segment quad and the end cap.
                    let perp = dir(a12 + Angle::frac_pi_2()) * p2.radius();
                    output.add_quad(
                        Quad {
                            a: edge.top,
                            b: edge.bot,
                            c: p2.position + perp,
                            d: p2.position - perp,
                        },
                        p1.color.mix(p2.color),
                    );
                    output.add_arc(
                        ArcSector {
                            center: p2.position,
                            start_angle: a12 - Angle::frac_pi_2(),
                            end_angle: a12 + Angle::frac_pi_2(),
                            radius: p2.radius(),
                        },
                        p2.color,
                    );
                    return;
                }
            }
        }
    }

    /// Compute the tessellation and triangulate it on the fly.
    ///
    /// Equivalent to running [`tessellate`](#method.tessellate) through a
    /// [`Triangulator`](struct.Triangulator.html) built with the options'
    /// `arc_step`.
    pub fn tessellate_triangles(
        &mut self,
        input: impl IntoIterator<Item = StrokePoint>,
        options: &StrokeOptions,
        output: &mut dyn TriangleBuilder,
    ) {
        self.tessellate(input, options, &mut Triangulator::new(output, options.arc_step));
    }

    // Exactly two points: a capsule made of two half-circle caps and one
    // connecting quad between the perpendicular offsets.
    fn tessellate_capsule(
        &mut self,
        p0: &StrokePoint,
        p1: &StrokePoint,
        output: &mut dyn PrimitiveBuilder,
    ) {
        let angle = angle_of(p1.position - p0.position);
        output.add_arc(
            ArcSector {
                center: p0.position,
                start_angle: angle + Angle::frac_pi_2(),
                end_angle: angle + Angle::pi() + Angle::frac_pi_2(),
                radius: p0.radius(),
            },
            p0.color,
        );
        output.add_arc(
            ArcSector {
                center: p1.position,
                start_angle: angle - Angle::frac_pi_2(),
                end_angle: angle + Angle::frac_pi_2(),
                radius: p1.radius(),
            },
            p1.color,
        );

        let normal = dir(angle + Angle::frac_pi_2());
        let offset0 = normal * p0.radius();
        let offset1 = normal * p1.radius();
        output.add_quad(
            Quad {
                a: p1.position + offset1,
                b: p0.position + offset0,
                c: p0.position - offset0,
                d: p1.position - offset1,
            },
            p0.color.mix(p1.color),
        );
    }
}

#[cfg(test)]
use crate::geometry_builder::PrimitiveBuffers;
#[cfg(test)]
use crate::math::point;
#[cfg(test)]
use crate::Triangle;

#[cfg(test)]
fn stroke_point(x: f32, y: f32, width: f32, color: Color) -> StrokePoint {
    StrokePoint {
        position: point(x, y),
        width,
        color,
    }
}

#[cfg(test)]
fn tessellate_points(points: &[StrokePoint]) -> PrimitiveBuffers {
    let mut buffers = PrimitiveBuffers::new();
    StrokeTessellator::new().tessellate(
        points.iter().cloned(),
        &StrokeOptions::default(),
        &mut buffers,
    );

    buffers
}

#[cfg(test)]
fn eq(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 0.00001 && (a.y - b.y).abs() < 0.00001
}

#[cfg(test)]
const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);

#[test]
fn test_empty_input() {
    let buffers = tessellate_points(&[]);

    assert_eq!(buffers.quads.len(), 0);
    assert_eq!(buffers.arcs.len(), 0);
}

#[test]
fn test_single_point_dot() {
    let buffers = tessellate_points(&[stroke_point(0.0, 0.0, 2.0, RED)]);

    assert_eq!(buffers.quads.len(), 0);
    assert_eq!(buffers.arcs.len(), 1);

    let (arc, color) = buffers.arcs[0];
    assert_eq!(arc.center, point(0.0, 0.0));
    assert_eq!(arc.start_angle.radians, 0.0);
    assert_eq!(arc.sweep(), Angle::two_pi());
    assert_eq!(arc.radius, 1.0);
    assert_eq!(color, RED);
}

#[test]
fn test_two_point_capsule() {
    let buffers = tessellate_points(&[
        stroke_point(0.0, 0.0, 2.0, RED),
        stroke_point(10.0, 0.0, 2.0, RED),
    ]);

    assert_eq!(buffers.quads.len(), 1);
    assert_eq!(buffers.arcs.len(), 2);

    // Start cap faces away from the second point, end cap away from the
    // first, each spanning half a turn.
    let (start_cap, _) = buffers.arcs[0];
    assert_eq!(start_cap.center, point(0.0, 0.0));
    assert_eq!(start_cap.start_angle, Angle::frac_pi_2());
    assert!((start_cap.sweep().radians - core::f32::consts::PI).abs() < 0.00001);
    assert_eq!(start_cap.radius, 1.0);

    let (end_cap, _) = buffers.arcs[1];
    assert_eq!(end_cap.center, point(10.0, 0.0));
    assert_eq!(end_cap.start_angle, -Angle::frac_pi_2());
    assert!((end_cap.sweep().radians - core::f32::consts::PI).abs() < 0.00001);

    // The quad connects the perpendicular offsets of magnitude 1 at each
    // end. Averaging two identical colors yields the input color.
    let (quad, color) = buffers.quads[0];
    assert!(eq(quad.a, point(10.0, 1.0)));
    assert!(eq(quad.b, point(0.0, 1.0)));
    assert!(eq(quad.c, point(0.0, -1.0)));
    assert!(eq(quad.d, point(10.0, -1.0)));
    assert_eq!(color, RED);
}

#[test]
fn test_collinear_points_single_quad_join() {
    // A straight line has a zero swept bevel angle at the middle point,
    // so the join is folded into the segment quad: two quads, and arcs
    // only for the two caps.
    let buffers = tessellate_points(&[
        stroke_point(0.0, 0.0, 2.0, RED),
        stroke_point(10.0, 0.0, 2.0, RED),
        stroke_point(20.0, 0.0, 2.0, RED),
    ]);

    assert_eq!(buffers.quads.len(), 2);
    assert_eq!(buffers.arcs.len(), 2);
    assert_eq!(buffers.arcs[0].0.center, point(0.0, 0.0));
    assert_eq!(buffers.arcs[1].0.center, point(20.0, 0.0));

    let (join_quad, _) = buffers.quads[0];
    assert!(eq(join_quad.a, point(0.0, -1.0)));
    assert!(eq(join_quad.b, point(0.0, 1.0)));
    assert!(eq(join_quad.c, point(10.0, 1.0)));
    assert!(eq(join_quad.d, point(10.0, -1.0)));

    let (end_quad, _) = buffers.quads[1];
    assert!(eq(end_quad.c, point(20.0, 1.0)));
    assert!(eq(end_quad.d, point(20.0, -1.0)));
}

#[test]
fn test_right_angle_round_join() {
    // A quarter turn sweeps π/2, well past the round join threshold:
    // expect an arc sector at the middle point plus the fan quad, on top
    // of the two segment quads and the two caps.
    let buffers = tessellate_points(&[
        stroke_point(0.0, 0.0, 2.0, RED),
        stroke_point(10.0, 0.0, 2.0, RED),
        stroke_point(10.0, 10.0, 2.0, RED),
    ]);

    assert_eq!(buffers.quads.len(), 3);
    assert_eq!(buffers.arcs.len(), 3);

    let (join_arc, _) = buffers.arcs[1];
    assert_eq!(join_arc.center, point(10.0, 0.0));
    assert_eq!(join_arc.radius, 1.0);
    assert!((join_arc.sweep().radians - core::f32::consts::FRAC_PI_2).abs() < 0.00001);

    // The fan quad is centered on the join and its miter tip points
    // outward along the bisector, at (10, 0) + (cos 3π/4, sin 3π/4).
    let (fan_quad, _) = buffers.quads[0];
    assert_eq!(fan_quad.a, point(10.0, 0.0));
    assert!(eq(fan_quad.c, point(10.0 - 0.70710678, 0.70710678)));
}

#[test]
fn test_shallow_turn_has_no_arc_join() {
    // A turn sweeping less than π/8 stays in the plain miter regime.
    let buffers = tessellate_points(&[
        stroke_point(0.0, 0.0, 2.0, RED),
        stroke_point(10.0, 0.0, 2.0, RED),
        stroke_point(20.0, 1.0, 2.0, RED),
    ]);

    assert_eq!(buffers.quads.len(), 2);
    assert_eq!(buffers.arcs.len(), 2);
}

#[test]
fn test_segment_color_blend() {
    let green = Color::new(0.0, 1.0, 0.0, 1.0);
    let buffers = tessellate_points(&[
        stroke_point(0.0, 0.0, 2.0, RED),
        stroke_point(10.0, 0.0, 2.0, green),
    ]);

    let (_, color) = buffers.quads[0];
    assert_eq!(color, Color::new(0.5, 0.5, 0.0, 1.0));
    // Caps keep their own point's color.
    assert_eq!(buffers.arcs[0].1, RED);
    assert_eq!(buffers.arcs[1].1, green);
}

#[test]
fn test_quad_triangulation_covers_quad_area() {
    // The two triangles a quad splits into must together cover exactly
    // the quad's shoelace area: same winding, no gap, no overlap.
    let buffers = tessellate_points(&[
        stroke_point(0.0, 0.0, 2.0, RED),
        stroke_point(10.0, 0.0, 3.0, RED),
        stroke_point(15.0, 8.0, 2.0, RED),
        stroke_point(7.0, 12.0, 4.0, RED),
    ]);
    assert!(!buffers.quads.is_empty());

    for &(quad, _) in &buffers.quads {
        let t1 = Triangle {
            a: quad.a,
            b: quad.b,
            c: quad.c,
        };
        let t2 = Triangle {
            a: quad.a,
            b: quad.c,
            c: quad.d,
        };
        let split_area = t1.signed_area() + t2.signed_area();
        assert!((split_area - quad.signed_area()).abs() < 0.001);
    }
}

#[test]
fn test_deterministic_output() {
    let points = [
        stroke_point(0.0, 0.0, 2.0, RED),
        stroke_point(10.0, 0.0, 3.0, RED),
        stroke_point(10.0, 10.0, 2.0, RED),
        stroke_point(3.0, 4.0, 1.0, RED),
    ];

    let first = tessellate_points(&points);
    let second = tessellate_points(&points);

    assert_eq!(first, second);
}

#[test]
fn test_coincident_points() {
    // Duplicate points are not filtered; the degenerate edge direction
    // falls back to angle 0 and the output stays free of NaNs.
    let buffers = tessellate_points(&[
        stroke_point(0.0, 0.0, 2.0, RED),
        stroke_point(10.0, 0.0, 2.0, RED),
        stroke_point(10.0, 0.0, 2.0, RED),
    ]);

    for &(quad, _) in &buffers.quads {
        for p in &[quad.a, quad.b, quad.c, quad.d] {
            assert!(p.x.is_finite() && p.y.is_finite());
        }
    }
    for &(arc, _) in &buffers.arcs {
        assert!(arc.start_angle.radians.is_finite());
        assert!(arc.end_angle.radians.is_finite());
    }
}

#[test]
fn test_diagonal_cap_angle_is_exact() {
    // Edge directions come from true atan2, not an approximation: the
    // start cap of a diagonal edge begins exactly at atan2(5, 5) + π/2.
    let buffers = tessellate_points(&[
        stroke_point(0.0, 0.0, 2.0, RED),
        stroke_point(5.0, 5.0, 2.0, RED),
    ]);

    let (start_cap, _) = buffers.arcs[0];
    assert_eq!(
        start_cap.start_angle,
        Angle::radians(5.0_f32.atan2(5.0)) + Angle::frac_pi_2()
    );
}

#[test]
fn test_sink_rejection_does_not_abort() {
    // A builder that rejects everything still sees the whole pass: the
    // acceptance flag is best-effort and never stops the tessellator.
    struct RejectAll {
        quads: u32,
        arcs: u32,
    }
    impl PrimitiveBuilder for RejectAll {
        fn add_quad(&mut self, _: Quad, _: Color) -> bool {
            self.quads += 1;
            false
        }
        fn add_arc(&mut self, _: ArcSector, _: Color) -> bool {
            self.arcs += 1;
            false
        }
    }

    let mut builder = RejectAll { quads: 0, arcs: 0 };
    StrokeTessellator::new().tessellate(
        vec![
            stroke_point(0.0, 0.0, 2.0, RED),
            stroke_point(10.0, 0.0, 2.0, RED),
            stroke_point(10.0, 10.0, 2.0, RED),
        ],
        &StrokeOptions::default(),
        &mut builder,
    );

    assert_eq!(builder.quads, 3);
    assert_eq!(builder.arcs, 3);
}

//! 2D vertexing of committed trajectories.
//!
//! Two passes run after all trajectories of a plane are built:
//!
//! - end-to-end: the tangents at two free trajectory ends are intersected and
//!   the intersection becomes a vertex when it lies near both ends and on
//!   signal. Other trajectories passing close to the new vertex are attached,
//!   or split there when the vertex falls in their interior.
//! - hammer: a free end that lands inside another trajectory at a clear angle
//!   splits that trajectory and forms a three-way vertex.
//!
//! Vertices are never moved once created, and ends that already carry a
//! vertex are skipped, so running the stage again is a no-op.

mod hammer;
mod split;

pub use hammer::find_hammer_vertices;
pub use split::{attach_nearby, split_traj};

use crate::angle::distance;
use crate::driver::GroupContext;
use crate::error::ReconError;
use crate::traj::{Trajectory, Vertex2D, VertexId, VertexTopology};
use log::debug;
use nalgebra::{Matrix2, Vector2};

/// Tangent lines closer to parallel than this (|sin| of the angle) have no
/// intersection.
const PARALLEL_SIN: f32 = 1e-3;

/// Intersection of the lines `p1 + s * d1` and `p2 + u * d2`.
pub fn line_intersection(p1: &[f32; 2], d1: &[f32; 2], p2: &[f32; 2], d2: &[f32; 2]) -> Option<[f32; 2]> {
    let cross = d1[0] * d2[1] - d1[1] * d2[0];
    let n1 = (d1[0] * d1[0] + d1[1] * d1[1]).sqrt();
    let n2 = (d2[0] * d2[0] + d2[1] * d2[1]).sqrt();
    if n1 * n2 <= 0.0 || cross.abs() < PARALLEL_SIN * n1 * n2 {
        return None;
    }
    let a = Matrix2::new(d1[0], -d2[0], d1[1], -d2[1]);
    let rhs = Vector2::new(p2[0] - p1[0], p2[1] - p1[1]);
    let su = a.try_inverse()? * rhs;
    let x = [p1[0] + su[0] * d1[0], p1[1] + su[0] * d1[1]];
    (x[0].is_finite() && x[1].is_finite()).then_some(x)
}

/// Runs end-to-end vertexing followed by hammer detection.
pub fn resolve_vertices(ctx: &mut GroupContext<'_>) -> Result<(), ReconError> {
    if !ctx.params.vertex.enabled {
        return Ok(());
    }
    find_end_vertices(ctx)?;
    find_hammer_vertices(ctx)?;
    ctx.stats.vertices = ctx.vertices.len();
    Ok(())
}

/// `x` is closer to `end` than to the opposite end and within `tol` of it.
fn end_accepts(traj: &Trajectory, end: usize, x: &[f32; 2], tol: f32) -> bool {
    let d_this = distance(&traj.end_point(end).pos, x);
    let d_other = distance(&traj.end_point(1 - end).pos, x);
    d_this < d_other && d_this <= tol
}

/// Pairs up free trajectory ends whose tangents intersect near both ends.
pub fn find_end_vertices(ctx: &mut GroupContext<'_>) -> Result<(), ReconError> {
    let mut ia = 0;
    while ia < ctx.trajectories.len() {
        let mut ib = ia + 1;
        while ib < ctx.trajectories.len() {
            for end_a in 0..2 {
                for end_b in 0..2 {
                    if let Some(x) = end_candidate(ctx, ia, end_a, ib, end_b) {
                        let (pa, pb) = (&ctx.trajectories[ia], &ctx.trajectories[ib]);
                        let err = (pa.end_point(end_a).hit_pos_err2 + pb.end_point(end_b).hit_pos_err2).sqrt();
                        let vid = add_vertex(ctx, x, [err, err], VertexTopology::EndToEnd([end_a as u8, end_b as u8]));
                        attach(ctx, vid, ia, end_a);
                        attach(ctx, vid, ib, end_b);
                        debug!(
                            "{}: vertex {:?} at ({:.1}, {:.1}) joins {:?}/{} and {:?}/{}",
                            ctx.hits.plane(),
                            vid,
                            x[0],
                            x[1],
                            ctx.trajectories[ia].id,
                            end_a,
                            ctx.trajectories[ib].id,
                            end_b
                        );
                        attach_nearby(ctx, vid, &[ia, ib])?;
                    }
                }
            }
            ib += 1;
        }
        ia += 1;
    }
    Ok(())
}

fn end_candidate(ctx: &GroupContext<'_>, ia: usize, end_a: usize, ib: usize, end_b: usize) -> Option<[f32; 2]> {
    let ta = &ctx.trajectories[ia];
    let tb = &ctx.trajectories[ib];
    if ta.is_junk() || tb.is_junk() || ta.pts.is_empty() || tb.pts.is_empty() {
        return None;
    }
    if ta.vtx[end_a].is_some() || tb.vtx[end_b].is_some() {
        return None;
    }
    let ea = ta.end_point(end_a);
    let eb = tb.end_point(end_b);
    let x = line_intersection(&ea.pos, &ea.dir, &eb.pos, &eb.dir)?;
    let tol_a = ctx.params.pass(ta.pass).vtx_end_tol;
    let tol_b = ctx.params.pass(tb.pass).vtx_end_tol;
    if !end_accepts(ta, end_a, &x, tol_a) || !end_accepts(tb, end_b, &x, tol_b) {
        return None;
    }
    ctx.hits.signal_near(&x, ctx.params.vertex.signal_tol).then_some(x)
}

pub(crate) fn add_vertex(
    ctx: &mut GroupContext<'_>,
    pos: [f32; 2],
    pos_err: [f32; 2],
    topology: VertexTopology,
) -> VertexId {
    let id = VertexId(ctx.vertices.len() as u32);
    ctx.vertices.push(Vertex2D {
        id,
        pos,
        pos_err,
        n_traj: 0,
        topology,
        plane: ctx.hits.plane(),
    });
    id
}

/// Points end `end` of trajectory `it` at vertex `vid`.
pub(crate) fn attach(ctx: &mut GroupContext<'_>, vid: VertexId, it: usize, end: usize) {
    ctx.trajectories[it].vtx[end] = Some(vid);
    if let Some(v) = ctx.vertices.get_mut(vid.0 as usize) {
        v.n_traj += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perpendicular_lines_meet() {
        let x = line_intersection(&[0.0, 5.0], &[1.0, 0.0], &[3.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!((x[0] - 3.0).abs() < 1e-5);
        assert!((x[1] - 5.0).abs() < 1e-5);
    }

    #[test]
    fn parallel_lines_do_not_meet() {
        assert!(line_intersection(&[0.0, 0.0], &[1.0, 0.0], &[0.0, 3.0], &[-1.0, 0.0]).is_none());
        assert!(line_intersection(&[0.0, 0.0], &[1.0, 0.0], &[0.0, 3.0], &[0.0, 0.0]).is_none());
    }
}

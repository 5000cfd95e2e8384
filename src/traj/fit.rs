//! Weighted straight-line fit over trajectory points.

use super::point::TrajPoint;
use nalgebra::{Matrix2, SymmetricEigen};

const EPS: f32 = 1e-6;
const MIN_ERR2: f32 = 1e-4;

/// Result of a local line fit, expressed at the origin point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineFit {
    /// Origin projected onto the fitted line.
    pub pos: [f32; 2],
    /// Unit direction, oriented like the origin's direction.
    pub dir: [f32; 2],
    pub ang_err: f32,
    /// Chi-square per degree of freedom; zero when only two points were fit.
    pub chi_dof: f32,
    pub n_used: usize,
}

/// Fits `hit_pos` of the selected points with a line through the frame of
/// `origin`.
///
/// Points are weighted by their inverse squared position error, scaled down
/// when their charge departs from the running average. Returns `None` with
/// fewer than two points or when all points share the same longitudinal
/// coordinate.
pub fn fit_points(pts: &[TrajPoint], indices: &[usize], origin: &TrajPoint) -> Option<LineFit> {
    if indices.len() < 2 {
        return None;
    }
    let [c, s] = origin.dir;

    let mut samples = Vec::with_capacity(indices.len());
    for &i in indices {
        let p = pts.get(i)?;
        let dx = p.hit_pos[0] - origin.pos[0];
        let dy = p.hit_pos[1] - origin.pos[1];
        let x = c * dx + s * dy;
        let y = -s * dx + c * dy;
        let ratio = if p.chg_ratio > 0.0 { p.chg_ratio } else { 1.0 };
        let chg_fac = 1.0 + (ratio - 1.0).abs();
        let w = 1.0 / (p.hit_pos_err2.max(MIN_ERR2) * chg_fac * chg_fac);
        samples.push((x, y, w));
    }

    let (mut sw, mut sx, mut sy, mut sxx, mut sxy) = (0.0f32, 0.0, 0.0, 0.0, 0.0);
    for &(x, y, w) in &samples {
        sw += w;
        sx += w * x;
        sy += w * y;
        sxx += w * x * x;
        sxy += w * x * y;
    }
    let det = sw * sxx - sx * sx;
    if det.abs() <= EPS * sw.max(1.0) {
        return None;
    }
    let a = (sxx * sy - sx * sxy) / det;
    let b = (sw * sxy - sx * sy) / det;

    let chi: f32 = samples
        .iter()
        .map(|&(x, y, w)| {
            let r = y - a - b * x;
            w * r * r
        })
        .sum();
    let n = samples.len();
    let chi_dof = if n > 2 { chi / (n - 2) as f32 } else { 0.0 };

    let ang_err = (sw / det).max(0.0).sqrt() / (1.0 + b * b);
    let norm = (1.0 + b * b).sqrt();
    let (lx, ly) = (1.0 / norm, b / norm);

    Some(LineFit {
        pos: [origin.pos[0] - a * s, origin.pos[1] + a * c],
        dir: [c * lx - s * ly, s * lx + c * ly],
        ang_err,
        chi_dof,
        n_used: n,
    })
}

/// Weighted centroid and principal axis of a point cloud.
///
/// The axis is the eigenvector of the weighted covariance with the larger
/// eigenvalue, oriented towards increasing wire (or increasing time when the
/// axis is parallel to the wires). Returns `None` for fewer than two points or
/// a cloud without spread.
pub fn principal_axis(points: &[([f32; 2], f32)]) -> Option<([f32; 2], [f32; 2])> {
    if points.len() < 2 {
        return None;
    }
    let sum_w: f32 = points.iter().map(|(_, w)| w.max(0.0)).sum();
    if sum_w <= EPS {
        return None;
    }
    let mut c = [0.0f32, 0.0];
    for (p, w) in points {
        c[0] += w.max(0.0) * p[0];
        c[1] += w.max(0.0) * p[1];
    }
    c[0] /= sum_w;
    c[1] /= sum_w;

    let (mut cxx, mut cxy, mut cyy) = (0.0f32, 0.0f32, 0.0f32);
    for (p, w) in points {
        let w = w.max(0.0);
        let dx = p[0] - c[0];
        let dy = p[1] - c[1];
        cxx += w * dx * dx;
        cxy += w * dx * dy;
        cyy += w * dy * dy;
    }
    let cov = Matrix2::new(cxx / sum_w, cxy / sum_w, cxy / sum_w, cyy / sum_w);
    let eig = SymmetricEigen::new(cov);
    let (vmax, lambda_max) = if eig.eigenvalues[0] >= eig.eigenvalues[1] {
        (eig.eigenvectors.column(0), eig.eigenvalues[0])
    } else {
        (eig.eigenvectors.column(1), eig.eigenvalues[1])
    };
    if !lambda_max.is_finite() || lambda_max <= EPS {
        return None;
    }
    let norm = (vmax[0] * vmax[0] + vmax[1] * vmax[1]).sqrt();
    if !norm.is_finite() || norm < EPS {
        return None;
    }
    let mut axis = [vmax[0] / norm, vmax[1] / norm];
    if axis[0] < -EPS || (axis[0].abs() <= EPS && axis[1] < 0.0) {
        axis = [-axis[0], -axis[1]];
    }
    Some((c, axis))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f32, y: f32) -> TrajPoint {
        TrajPoint {
            pos: [x, y],
            hit_pos: [x, y],
            hit_pos_err2: 0.01,
            chg: 1.0,
            chg_ratio: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn recovers_line_through_collinear_points() {
        let pts: Vec<_> = (0..5).map(|i| pt(i as f32, 2.0 * i as f32 + 1.0)).collect();
        let mut origin = pts[4].clone();
        origin.set_dir([1.0, 0.0]);
        let fit = fit_points(&pts, &[0, 1, 2, 3, 4], &origin).unwrap();
        assert!(fit.chi_dof < 1e-3);
        let expected = [1.0 / 5f32.sqrt(), 2.0 / 5f32.sqrt()];
        assert!((fit.dir[0] - expected[0]).abs() < 1e-4);
        assert!((fit.dir[1] - expected[1]).abs() < 1e-4);
        assert!((fit.pos[0] - 4.0).abs() < 1e-3);
        assert!((fit.pos[1] - 9.0).abs() < 1e-3);
    }

    #[test]
    fn scattered_points_raise_chi() {
        let pts = vec![pt(0.0, 0.0), pt(1.0, 1.0), pt(2.0, -1.0), pt(3.0, 1.0)];
        let mut origin = pts[3].clone();
        origin.set_dir([1.0, 0.0]);
        let fit = fit_points(&pts, &[0, 1, 2, 3], &origin).unwrap();
        assert!(fit.chi_dof > 10.0);
    }

    #[test]
    fn principal_axis_follows_the_spread() {
        let cloud: Vec<_> = (0..6).map(|i| ([10.0 - i as f32, 5.0 + 0.5 * i as f32], 1.0)).collect();
        let (c, axis) = principal_axis(&cloud).unwrap();
        assert!((c[0] - 7.5).abs() < 1e-4);
        assert!(axis[0] > 0.0);
        assert!((axis[1] / axis[0] + 0.5).abs() < 1e-3);
        assert!(principal_axis(&cloud[..1]).is_none());
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        let pts = vec![pt(1.0, 0.0), pt(1.0, 3.0)];
        let mut origin = pts[1].clone();
        origin.set_dir([1.0, 0.0]);
        assert!(fit_points(&pts, &[0], &origin).is_none());
        assert!(fit_points(&pts, &[0, 1], &origin).is_none());
    }
}

//! Photo-to-reference homography estimation.
//!
//! Direct Linear Transform with Hartley normalization, wrapped in RANSAC
//! for robustness against ratio-test survivors that are still wrong.
//! The fitted matrix maps photo-frame points into the reference frame:
//! `reference ≈ project(H, photo)`.

use nalgebra::{DMatrix, Matrix3, Vector3};

use crate::features::Correspondence;

/// Minimum correspondences required for a homography fit.
pub const MIN_CORRESPONDENCES: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum HomographyError {
    TooFewPoints { needed: usize, got: usize },
    NumericalFailure(String),
    InsufficientInliers { needed: usize, found: usize },
}

impl std::fmt::Display for HomographyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewPoints { needed, got } => {
                write!(f, "too few correspondences: need {}, got {}", needed, got)
            }
            Self::NumericalFailure(msg) => write!(f, "numerical failure: {}", msg),
            Self::InsufficientInliers { needed, found } => {
                write!(f, "insufficient inliers: need {}, found {}", needed, found)
            }
        }
    }
}

impl std::error::Error for HomographyError {}

/// Project a 2D point through a 3×3 homography.
pub fn project(h: &Matrix3<f64>, x: f64, y: f64) -> [f64; 2] {
    let p = h * Vector3::new(x, y, 1.0);
    if p[2].abs() < 1e-15 {
        return [f64::NAN, f64::NAN];
    }
    [p[0] / p[2], p[1] / p[2]]
}

/// Reprojection error `||project(H, photo) - reference||` for one match.
pub fn reprojection_error(h: &Matrix3<f64>, c: &Correspondence) -> f64 {
    let p = project(h, c.photo[0], c.photo[1]);
    let dx = p[0] - c.reference[0];
    let dy = p[1] - c.reference[1];
    (dx * dx + dy * dy).sqrt()
}

/// Hartley conditioning: translate the centroid to the origin and scale so
/// the mean distance from it is sqrt(2).
fn conditioning_transform(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let conditioned = pts.iter().map(|p| [s * (p[0] - cx), s * (p[1] - cy)]).collect();
    (t, conditioned)
}

/// Estimate a homography from ≥4 correspondences via DLT.
pub fn estimate_dlt(correspondences: &[Correspondence]) -> Result<Matrix3<f64>, HomographyError> {
    let n = correspondences.len();
    if n < MIN_CORRESPONDENCES {
        return Err(HomographyError::TooFewPoints {
            needed: MIN_CORRESPONDENCES,
            got: n,
        });
    }

    let src: Vec<[f64; 2]> = correspondences.iter().map(|c| c.photo).collect();
    let dst: Vec<[f64; 2]> = correspondences.iter().map(|c| c.reference).collect();
    let (t_src, src_c) = conditioning_transform(&src);
    let (t_dst, dst_c) = conditioning_transform(&dst);

    let mut a = DMatrix::zeros(2 * n, 9);
    for (i, (s, d)) in src_c.iter().zip(dst_c.iter()).enumerate() {
        let (sx, sy) = (s[0], s[1]);
        let (dx, dy) = (d[0], d[1]);
        let row0 = [0.0, 0.0, 0.0, -sx, -sy, -1.0, dy * sx, dy * sy, dy];
        let row1 = [sx, sy, 1.0, 0.0, 0.0, 0.0, -dx * sx, -dx * sy, -dx];
        for j in 0..9 {
            a[(2 * i, j)] = row0[j];
            a[(2 * i + 1, j)] = row1[j];
        }
    }

    // The solution is the eigenvector of A^T A with the smallest
    // eigenvalue; this sidesteps thin-SVD dimension handling.
    let eig = nalgebra::SymmetricEigen::new(a.transpose() * &a);
    let mut min_idx = 0;
    for i in 1..9 {
        if eig.eigenvalues[i].abs() < eig.eigenvalues[min_idx].abs() {
            min_idx = i;
        }
    }
    let v = eig.eigenvectors.column(min_idx);
    let h_cond = Matrix3::new(v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7], v[8]);

    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or_else(|| HomographyError::NumericalFailure("conditioning not invertible".into()))?;
    let h = t_dst_inv * h_cond * t_src;

    let scale = h[(2, 2)];
    if scale.abs() < 1e-15 {
        Ok(h)
    } else {
        Ok(h / scale)
    }
}

/// RANSAC configuration for homography fitting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RansacHomographyConfig {
    /// Maximum RANSAC iterations.
    pub max_iters: usize,
    /// Inlier reprojection tolerance in pixels.
    pub inlier_threshold: f64,
    /// Minimum inlier count for a usable model.
    pub min_inliers: usize,
    /// RNG seed.
    pub seed: u64,
}

impl Default for RansacHomographyConfig {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            inlier_threshold: 5.0,
            min_inliers: MIN_CORRESPONDENCES,
            seed: 0,
        }
    }
}

/// Fitted model plus its consensus bookkeeping.
#[derive(Debug, Clone)]
pub struct RansacHomographyResult {
    /// The fitted photo-to-reference homography.
    pub h: Matrix3<f64>,
    /// True for correspondences consistent with `h`.
    pub inlier_mask: Vec<bool>,
    /// Number of inliers under the final model.
    pub n_inliers: usize,
    /// Per-correspondence reprojection errors under the final model.
    pub errors: Vec<f64>,
}

/// Summary statistics for the request report.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RansacStats {
    /// Correspondences fed to RANSAC.
    pub n_candidates: usize,
    /// Inliers after the final refit.
    pub n_inliers: usize,
    /// Inlier threshold in pixels.
    pub threshold_px: f64,
    /// Mean inlier reprojection error (pixels).
    pub mean_err_px: f64,
    /// 95th percentile inlier reprojection error (pixels).
    pub p95_err_px: f64,
}

impl RansacHomographyResult {
    /// Summarize inlier errors for reporting.
    pub fn stats(&self, threshold_px: f64) -> RansacStats {
        let mut inlier_errs: Vec<f64> = self
            .inlier_mask
            .iter()
            .zip(self.errors.iter())
            .filter(|(&m, _)| m)
            .map(|(_, &e)| e)
            .collect();
        inlier_errs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mean = if inlier_errs.is_empty() {
            0.0
        } else {
            inlier_errs.iter().sum::<f64>() / inlier_errs.len() as f64
        };
        let p95 = if inlier_errs.is_empty() {
            0.0
        } else {
            inlier_errs[((inlier_errs.len() - 1) as f64 * 0.95) as usize]
        };
        RansacStats {
            n_candidates: self.errors.len(),
            n_inliers: self.n_inliers,
            threshold_px,
            mean_err_px: mean,
            p95_err_px: p95,
        }
    }
}

fn sample_distinct(rng: &mut impl rand::Rng, n: usize, k: usize) -> Vec<usize> {
    debug_assert!(k <= n);
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.gen_range(i..n);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

/// Fit a photo-to-reference homography robustly.
///
/// Hypothesizes from minimal 4-correspondence samples, scores by inlier
/// count at `inlier_threshold`, keeps the best consensus, and refits on
/// all of its inliers. Returns `InsufficientInliers` when no hypothesis
/// gathers `min_inliers` support (the degenerate-geometry condition).
pub fn fit_homography_ransac(
    correspondences: &[Correspondence],
    config: &RansacHomographyConfig,
) -> Result<RansacHomographyResult, HomographyError> {
    use rand::prelude::*;

    let n = correspondences.len();
    if n < MIN_CORRESPONDENCES {
        return Err(HomographyError::TooFewPoints {
            needed: MIN_CORRESPONDENCES,
            got: n,
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best_inliers = 0usize;
    let mut best_mask = vec![false; n];
    let mut best_h = Matrix3::identity();

    for _ in 0..config.max_iters {
        let sample = sample_distinct(&mut rng, n, MIN_CORRESPONDENCES);
        let minimal: Vec<Correspondence> = sample.iter().map(|&i| correspondences[i]).collect();
        let h = match estimate_dlt(&minimal) {
            Ok(h) => h,
            Err(_) => continue,
        };

        let mut count = 0usize;
        let mut mask = vec![false; n];
        for (i, c) in correspondences.iter().enumerate() {
            if reprojection_error(&h, c) < config.inlier_threshold {
                mask[i] = true;
                count += 1;
            }
        }

        if count > best_inliers {
            best_inliers = count;
            best_mask = mask;
            best_h = h;
            // Early exit once consensus covers >90% of the matches.
            if count * 10 > n * 9 {
                break;
            }
        }
    }

    if best_inliers < config.min_inliers {
        return Err(HomographyError::InsufficientInliers {
            needed: config.min_inliers,
            found: best_inliers,
        });
    }

    // Refit on every inlier of the best hypothesis.
    let inliers: Vec<Correspondence> = correspondences
        .iter()
        .zip(best_mask.iter())
        .filter(|(_, &m)| m)
        .map(|(c, _)| *c)
        .collect();
    let h_final = estimate_dlt(&inliers).unwrap_or(best_h);

    let mut errors = vec![0.0f64; n];
    let mut final_mask = vec![false; n];
    let mut final_inliers = 0usize;
    for (i, c) in correspondences.iter().enumerate() {
        let err = reprojection_error(&h_final, c);
        errors[i] = err;
        if err < config.inlier_threshold {
            final_mask[i] = true;
            final_inliers += 1;
        }
    }

    Ok(RansacHomographyResult {
        h: h_final,
        inlier_mask: final_mask,
        n_inliers: final_inliers,
        errors,
    })
}

/// Row-major array form for serialization.
pub fn matrix3_to_array(h: &Matrix3<f64>) -> [[f64; 3]; 3] {
    [
        [h[(0, 0)], h[(0, 1)], h[(0, 2)]],
        [h[(1, 0)], h[(1, 1)], h[(1, 2)]],
        [h[(2, 0)], h[(2, 1)], h[(2, 2)]],
    ]
}

//! The orthogonal Procrustes problem.

use anyhow::{self, ensure, format_err};
use nalgebra::{Matrix3, Vector3};

#[cfg(test)]
#[path = "procrustes_tests.rs"]
mod procrustes_tests;

/// Finds the orthogonal matrix $`R`$ minimising $`\sum_i \lVert R\mathbf{a}_i -
/// \mathbf{b}_i \rVert^2`$.
///
/// With $`B^{\mathsf{T}}A = U\Sigma V^{\mathsf{T}}`$, the minimiser is $`R = UV^{\mathsf{T}}`$.
/// $`R`$ may be improper. When $`B^{\mathsf{T}}A`$ is rank-deficient, $`R`$ is not unique and
/// any one of the minimisers is returned.
///
/// # Arguments
///
/// * `a` - The vectors $`\mathbf{a}_i`$.
/// * `b` - The target vectors $`\mathbf{b}_i`$.
///
/// # Errors
///
/// Errors if `a` and `b` have different lengths or if the singular value decomposition fails.
pub fn solve_procrustes(
    a: &[Vector3<f64>],
    b: &[Vector3<f64>],
) -> Result<Matrix3<f64>, anyhow::Error> {
    ensure!(
        a.len() == b.len(),
        "Mismatched numbers of vectors: {} and {}.",
        a.len(),
        b.len()
    );
    let cov = a
        .iter()
        .zip(b.iter())
        .fold(Matrix3::<f64>::zeros(), |acc, (ai, bi)| acc + bi * ai.transpose());
    let svd = cov.svd(true, true);
    let u = svd
        .u
        .ok_or_else(|| format_err!("Unable to obtain U from the SVD of {cov}."))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| format_err!("Unable to obtain Vᵗ from the SVD of {cov}."))?;
    Ok(u * v_t)
}

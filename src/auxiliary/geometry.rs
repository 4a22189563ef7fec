//! Geometrical objects and manipulations.

use anyhow::{self, format_err};
use nalgebra::{ClosedMul, Matrix3, Scalar, UnitVector3, Vector3};
use num_traits::ToPrimitive;

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod geometry_tests;

/// Computes the outer product between two three-dimensional vectors.
///
/// # Arguments
///
/// * `vec1` - The first vector, $`\mathbf{v}_1`$.
/// * `vec2` - The second vector, $`\mathbf{v}_2`$.
///
/// # Returns
///
/// The outer product $`\mathbf{v}_1 \otimes \mathbf{v}_2`$.
pub fn outer<T: Scalar + ClosedMul + Copy>(vec1: &Vector3<T>, vec2: &Vector3<T>) -> Matrix3<T> {
    let outer_product_iter: Vec<T> = vec2
        .iter()
        .flat_map(|&item_x| vec1.iter().map(move |&item_y| item_x * item_y))
        .collect();
    Matrix3::from_iterator(outer_product_iter)
}

/// Returns the matrix of the reflection through the plane perpendicular to `normal`,
/// $`I - 2\hat{\mathbf{n}} \otimes \hat{\mathbf{n}}`$.
#[must_use]
pub fn reflection_matrix(normal: &UnitVector3<f64>) -> Matrix3<f64> {
    Matrix3::identity() - 2.0 * outer(normal, normal)
}

/// Returns the angle $`\theta \in [0, \pi]`$ and the unit axis of a proper rotation matrix.
///
/// For $`\theta = 0`$ the axis is arbitrary and $`\hat{\mathbf{z}}`$ is returned. For
/// $`\theta = \pi`$ the sign of the axis is arbitrary and is chosen such that its first
/// non-vanishing component is positive.
///
/// # Arguments
///
/// * `rotation` - A proper rotation matrix.
/// * `thresh` - Threshold for detecting the special angles $`0`$ and $`\pi`$.
#[must_use]
pub fn get_rotation_angle_and_axis(
    rotation: &Matrix3<f64>,
    thresh: f64,
) -> (f64, UnitVector3<f64>) {
    let cos_theta = ((rotation.trace() - 1.0) / 2.0).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();
    let skew = Vector3::new(
        rotation[(2, 1)] - rotation[(1, 2)],
        rotation[(0, 2)] - rotation[(2, 0)],
        rotation[(1, 0)] - rotation[(0, 1)],
    );
    if skew.norm() > 2.0 * thresh {
        (theta, UnitVector3::new_normalize(skew))
    } else if cos_theta > 0.0 {
        (0.0, Vector3::z_axis())
    } else {
        // (R + I) / 2 = n n^T for a two-fold rotation.
        let sym = (rotation + Matrix3::identity()) / 2.0;
        let j = (0..3)
            .max_by(|&a, &b| sym[(a, a)].total_cmp(&sym[(b, b)]))
            .unwrap_or(0);
        let mut axis = sym.column(j).into_owned();
        if let Some(first) = axis.iter().find(|x| x.abs() > thresh) {
            if *first < 0.0 {
                axis = -axis;
            }
        }
        (std::f64::consts::PI, UnitVector3::new_normalize(axis))
    }
}

/// Returns `true` if every element of `mat` lies within `thresh` of an integer.
pub fn is_integer_matrix<const R: usize, const C: usize>(
    mat: &nalgebra::SMatrix<f64, R, C>,
    thresh: f64,
) -> bool {
    mat.iter().all(|x| (x - x.round()).abs() < thresh)
}

/// Rounds a matrix that is expected to be integral.
///
/// # Errors
///
/// Errors naming `what` and the offending matrix if any element deviates from an integer by
/// `thresh` or more.
pub fn to_integer_matrix<const R: usize, const C: usize>(
    mat: &nalgebra::SMatrix<f64, R, C>,
    thresh: f64,
    what: &str,
) -> Result<nalgebra::SMatrix<i32, R, C>, anyhow::Error> {
    if !is_integer_matrix(mat, thresh) {
        return Err(format_err!("{what} is expected to be integral, but is {mat}"));
    }
    let elements = mat
        .iter()
        .map(|x| {
            x.round()
                .to_i32()
                .ok_or_else(|| format_err!("{what} has an element {x} out of the `i32` range."))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(nalgebra::SMatrix::<i32, R, C>::from_iterator(elements))
}

/// Returns the component-wise fractional part of `vec` in $`[0, 1)`$. Components within
/// `thresh` below $`1`$ are folded onto $`0`$.
#[must_use]
pub fn remainder_one(vec: &Vector3<f64>, thresh: f64) -> Vector3<f64> {
    vec.map(|x| {
        let frac = x - x.floor();
        if frac > 1.0 - thresh {
            0.0
        } else {
            frac
        }
    })
}

/// Returns `true` if `vec` is a lattice vector, *i.e.* integral within `thresh`.
pub fn is_lattice_vector(vec: &Vector3<f64>, thresh: f64) -> bool {
    is_integer_matrix(vec, thresh)
}

/// Converts an integer matrix into a floating-point one.
#[must_use]
pub fn to_float_matrix(mat: &Matrix3<i32>) -> Matrix3<f64> {
    mat.map(f64::from)
}

/// Inverts an integer matrix over the reals.
///
/// # Errors
///
/// Errors if the matrix is singular.
pub fn invert_integer_matrix(mat: &Matrix3<i32>) -> Result<Matrix3<f64>, anyhow::Error> {
    to_float_matrix(mat)
        .try_inverse()
        .ok_or_else(|| format_err!("The integer matrix {mat} is singular."))
}

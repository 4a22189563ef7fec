//! Spin-only groups of magnetic moment arrangements.

use std::fmt;

use itertools::Itertools;
use nalgebra::{Matrix3, UnitVector3, Vector3};
use serde::{Deserialize, Serialize};

use crate::auxiliary::geometry::{get_rotation_angle_and_axis, reflection_matrix};

#[cfg(test)]
#[path = "spin_only_tests.rs"]
mod spin_only_tests;

/// An enumerated type for the spin-only group of a magnetic structure, *i.e.* the group of
/// spin rotations leaving every magnetic moment invariant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SpinOnlyGroup {
    /// All moments vanish. The spin-only group is $`O(3)`$.
    Nonmagnetic,

    /// All moments are parallel to `axis`. The spin-only group is $`\infty m`$.
    Collinear { axis: UnitVector3<f64> },

    /// All moments are perpendicular to `axis`. The spin-only group is $`m`$.
    Coplanar { axis: UnitVector3<f64> },

    /// The spin-only group is trivial.
    Noncoplanar,
}

impl SpinOnlyGroup {
    /// Classifies an arrangement of magnetic moments.
    ///
    /// The axes are obtained from the eigenvectors of $`\sum_i \mathbf{m}_i \otimes
    /// \mathbf{m}_i`$ with the largest (collinear) and smallest (coplanar) eigenvalues. When
    /// eigenvalues are degenerate, the first eigenvector in ascending eigenvalue order is taken
    /// as the smallest and the last as the largest.
    ///
    /// # Arguments
    ///
    /// * `magmoms` - The magnetic moments in Cartesian coordinates.
    /// * `mag_symprec` - Tolerance on moment deviations.
    pub fn from_magmoms(magmoms: &[Vector3<f64>], mag_symprec: f64) -> Self {
        let max_norm = magmoms.iter().map(|m| m.norm()).fold(0.0, f64::max);
        if max_norm < mag_symprec {
            return Self::Nonmagnetic;
        }

        let moment = magmoms
            .iter()
            .fold(Matrix3::<f64>::zeros(), |acc, m| acc + m * m.transpose());
        let eigen = moment.symmetric_eigen();
        let order = (0..3)
            .sorted_by(|&i, &j| eigen.eigenvalues[i].total_cmp(&eigen.eigenvalues[j]))
            .collect_vec();

        let parallel_axis =
            UnitVector3::new_normalize(eigen.eigenvectors.column(order[2]).into_owned());
        let a = parallel_axis.into_inner();
        let residual_collinear = magmoms
            .iter()
            .map(|m| 2.0 * (m - a * m.dot(&a)).norm())
            .fold(0.0, f64::max);
        if residual_collinear < mag_symprec {
            return Self::Collinear {
                axis: parallel_axis,
            };
        }

        let vertical_axis =
            UnitVector3::new_normalize(eigen.eigenvectors.column(order[0]).into_owned());
        let n = vertical_axis.into_inner();
        let residual_coplanar = magmoms
            .iter()
            .map(|m| 2.0 * m.dot(&n).abs())
            .fold(0.0, f64::max);
        if residual_coplanar < mag_symprec {
            return Self::Coplanar {
                axis: vertical_axis,
            };
        }

        Self::Noncoplanar
    }

    /// The distinguished axis of a collinear or coplanar spin-only group.
    pub fn axis(&self) -> Option<&UnitVector3<f64>> {
        match self {
            Self::Collinear { axis } | Self::Coplanar { axis } => Some(axis),
            Self::Nonmagnetic | Self::Noncoplanar => None,
        }
    }

    /// Returns `true` if this spin-only group contains the orthogonal matrix `linear`.
    ///
    /// # Arguments
    ///
    /// * `linear` - An orthogonal $`3 \times 3`$ matrix.
    /// * `thresh` - Threshold for comparing matrices, angles, and axes.
    pub fn contain(&self, linear: &Matrix3<f64>, thresh: f64) -> bool {
        if *self == Self::Nonmagnetic {
            return true;
        }
        if (linear - Matrix3::identity()).amax() < thresh {
            return true;
        }

        let (proper, rotation) = if linear.determinant() > 0.0 {
            (true, *linear)
        } else {
            (false, -linear)
        };
        let (theta, rot_axis) = get_rotation_angle_and_axis(&rotation, thresh);
        let two_fold = (theta - std::f64::consts::PI).abs() < thresh;

        match self {
            Self::Coplanar { axis } => {
                // Mirror perpendicular to the axis
                !proper && two_fold && rot_axis.cross(&axis.into_inner()).amax() < thresh
            }
            Self::Collinear { axis } => {
                if proper {
                    // Rotation about the axis
                    rot_axis.cross(&axis.into_inner()).amax() < thresh
                } else {
                    // Mirror containing the axis
                    two_fold && rot_axis.dot(&axis.into_inner()).abs() < thresh
                }
            }
            Self::Nonmagnetic | Self::Noncoplanar => false,
        }
    }

    /// Returns a canonical representative of the coset `linear` $`\cdot`$ `self`.
    ///
    /// Orthogonal matrices reproducing a degenerate (collinear or coplanar) arrangement are
    /// determined only up to right multiplication by the spin-only group. The representative is
    /// the identity if `linear` lies in the group, $`I - 2\hat{\mathbf{a}} \otimes
    /// \hat{\mathbf{a}}`$ for a collinear group whose axis $`\hat{\mathbf{a}}`$ is reversed by
    /// `linear`, and a proper rotation for a coplanar group. Otherwise, `linear` is returned
    /// unchanged.
    ///
    /// # Arguments
    ///
    /// * `linear` - An orthogonal $`3 \times 3`$ matrix.
    /// * `thresh` - Threshold for comparing matrices, angles, and axes.
    pub fn canonicalize(&self, linear: &Matrix3<f64>, thresh: f64) -> Matrix3<f64> {
        if self.contain(linear, thresh) {
            return Matrix3::identity();
        }
        match self {
            Self::Collinear { axis }
                if (linear * axis.into_inner() + axis.into_inner()).amax() < thresh =>
            {
                reflection_matrix(axis)
            }
            Self::Coplanar { axis } if linear.determinant() < 0.0 => {
                linear * reflection_matrix(axis)
            }
            _ => *linear,
        }
    }
}

impl fmt::Display for SpinOnlyGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Nonmagnetic => write!(f, "NONMAGNETIC"),
            Self::Collinear { axis } => write!(
                f,
                "COLLINEAR(axis=[{:+.7}, {:+.7}, {:+.7}])",
                axis[0], axis[1], axis[2]
            ),
            Self::Coplanar { axis } => write!(
                f,
                "COPLANAR(axis=[{:+.7}, {:+.7}, {:+.7}])",
                axis[0], axis[1], axis[2]
            ),
            Self::Noncoplanar => write!(f, "NONCOPLANAR"),
        }
    }
}

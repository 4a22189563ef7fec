//! Nonmagnetic and spin symmetry of crystal structures.

pub mod moyo_search;
pub mod nonmagnetic;
pub mod procrustes;
pub mod spin_only;
pub mod spin_space_group;

#[cfg(test)]
pub(crate) mod fixtures;

/// Threshold for deciding whether a transformed rotation, translation, or transformation matrix
/// is integral. Genuinely non-integral values are multiples of $`1/n`$ for small $`n`$, so this
/// only needs to absorb floating-point noise.
pub const INTEGRALITY_THRESHOLD: f64 = 1e-4;

/// Threshold for comparing spin rotations, rotation angles, and rotation axes.
pub const SPIN_ROTATION_THRESHOLD: f64 = 1e-5;

/// Threshold for folding fractional coordinates lying just below $`1`$ onto $`0`$.
pub const FRACTIONAL_FOLD_THRESHOLD: f64 = 1e-10;

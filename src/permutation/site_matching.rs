//! Site permutations induced by space-group operations.

use log;
use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;

use crate::auxiliary::cell::Cell;
use crate::permutation::Permutation;

#[cfg(test)]
#[path = "site_matching_tests.rs"]
mod site_matching_tests;

/// Determines the site permutations induced by a sequence of space-group operations.
///
/// For an operation $`(R, \mathbf{t})`$, site $`i`$ is moved to
/// $`R\mathbf{p}_i + \mathbf{t}`$, which is matched greedily against the first not-yet-matched
/// site of the same species lying within `symprec` (Cartesian distance, modulo lattice
/// translations).
///
/// # Arguments
///
/// * `cell` - The crystal structure.
/// * `operations` - The rotations and translations, both with respect to the lattice of `cell`.
/// * `symprec` - Distance tolerance.
///
/// # Returns
///
/// A vector aligned with `operations`. Entry `k` is `None` if operation `k` does not map the
/// structure onto itself, and the induced permutation otherwise.
pub fn get_symmetry_permutations(
    cell: &Cell,
    operations: &[(Matrix3<i32>, Vector3<f64>)],
    symprec: f64,
) -> Vec<Option<Permutation>> {
    operations
        .par_iter()
        .map(|(rotation, translation)| {
            let perm_opt = match_sites(cell, rotation, translation, symprec);
            if perm_opt.is_none() {
                log::debug!(
                    "Operation with rotation {:?} and translation {:?} does not permute the sites.",
                    rotation.as_slice(),
                    translation.as_slice()
                );
            }
            perm_opt
        })
        .collect()
}

/// Matches the transformed sites of a single operation against the original ones.
fn match_sites(
    cell: &Cell,
    rotation: &Matrix3<i32>,
    translation: &Vector3<f64>,
    symprec: f64,
) -> Option<Permutation> {
    let positions = cell.positions();
    let numbers = cell.numbers();
    let rotation = rotation.map(f64::from);
    let mut found = vec![false; positions.len()];
    let image = positions
        .iter()
        .zip(numbers.iter())
        .map(|(position, number)| {
            let new_position = rotation * position + translation;
            let j = (0..positions.len()).find(|&j| {
                !found[j]
                    && numbers[j] == *number
                    && is_overlap_with_origin(
                        cell.lattice(),
                        &(new_position - positions[j]),
                        symprec,
                    )
            })?;
            found[j] = true;
            Some(j)
        })
        .collect::<Option<Vec<usize>>>()?;
    Permutation::from_image(&image).ok()
}

/// Returns `true` if `frac_coords` coincides with the origin up to lattice translations.
///
/// # Arguments
///
/// * `lattice` - The lattice whose rows are the basis vectors.
/// * `frac_coords` - Fractional coordinates with respect to `lattice`.
/// * `symprec` - Cartesian distance tolerance.
pub fn is_overlap_with_origin(
    lattice: &Matrix3<f64>,
    frac_coords: &Vector3<f64>,
    symprec: f64,
) -> bool {
    let reduced = frac_coords - frac_coords.map(f64::round);
    (lattice.transpose() * reduced).norm() < symprec
}

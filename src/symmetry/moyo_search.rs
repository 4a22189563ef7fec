//! Nonmagnetic space-group search backed by `moyo`.

use anyhow::{self, ensure, format_err};
use itertools::Itertools;
use log;
use moyo::base::{AngleTolerance, Cell as MoyoCell, Lattice, Position};
use moyo::data::Setting;
use moyo::MoyoDataset;
use nalgebra::{Matrix3, Vector3};

use crate::auxiliary::cell::Cell;
use crate::auxiliary::geometry::{remainder_one, to_float_matrix, to_integer_matrix};
use crate::auxiliary::hermite::column_style_hermite_normal_form;
use crate::symmetry::nonmagnetic::{RawSymmetry, SymmetrySearch};
use crate::symmetry::FRACTIONAL_FOLD_THRESHOLD;

#[cfg(test)]
#[path = "moyo_search_tests.rs"]
mod moyo_search_tests;

/// Threshold for rounding `k` times a centering onto the integer lattice, where `k` is the
/// number of centerings.
const CENTERING_ROUNDING_THRESHOLD: f64 = 1e-3;

/// A space-group finder delegating to [`moyo::MoyoDataset`] in the spglib setting.
///
/// The operations are those of the input cell, identity first, with translations reduced into
/// $`[0, 1)`$. The primitive lattice is spanned by the input lattice and the pure translations
/// found by `moyo`, so that it shares the Cartesian frame of the input cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct MoyoSymmetrySearch;

impl MoyoSymmetrySearch {
    /// Converts an angle tolerance in degrees, negative meaning unset, into `moyo`'s form.
    fn moyo_angle_tolerance(angle_tolerance: f64) -> AngleTolerance {
        if angle_tolerance > 0.0 {
            AngleTolerance::Radian(angle_tolerance.to_radians())
        } else {
            AngleTolerance::Default
        }
    }

    fn to_moyo_cell(cell: &Cell) -> MoyoCell {
        let lattice = cell.lattice();
        let basis = [0, 1, 2].map(|i| [lattice[(i, 0)], lattice[(i, 1)], lattice[(i, 2)]]);
        let positions = cell
            .positions()
            .iter()
            .map(|p| Position::new(p[0], p[1], p[2]))
            .collect_vec();
        MoyoCell::new(Lattice::from_basis(basis), positions, cell.numbers().to_vec())
    }
}

impl SymmetrySearch for MoyoSymmetrySearch {
    fn find_symmetry(
        &self,
        cell: &Cell,
        symprec: f64,
        angle_tolerance: f64,
    ) -> Result<RawSymmetry, anyhow::Error> {
        ensure!(cell.num_sites() > 0, "The cell contains no sites.");
        let dataset = MoyoDataset::new(
            &Self::to_moyo_cell(cell),
            symprec,
            Self::moyo_angle_tolerance(angle_tolerance),
            Setting::Spglib,
            false,
        )
        .map_err(|err| format_err!("moyo symmetry search failed: {err:?}"))?;
        log::debug!(
            "moyo: space group {} (Hall number {}) with {} operations in the input cell.",
            dataset.number,
            dataset.hall_number,
            dataset.operations.len()
        );

        // Pure translations first, the zero translation leading
        let (rotations, translations): (Vec<_>, Vec<_>) = dataset
            .operations
            .iter()
            .map(|op| {
                let rotation = Matrix3::<i32>::from_fn(|i, j| op.rotation[(i, j)]);
                let translation = remainder_one(
                    &Vector3::from_fn(|i, _| op.translation[i]),
                    FRACTIONAL_FOLD_THRESHOLD,
                );
                (rotation, translation)
            })
            .sorted_by_key(|(rotation, translation)| {
                (
                    *rotation != Matrix3::identity(),
                    translation.amax() > FRACTIONAL_FOLD_THRESHOLD,
                )
            })
            .unzip();

        let centerings = rotations
            .iter()
            .zip(translations.iter())
            .filter(|(rotation, _)| **rotation == Matrix3::identity())
            .map(|(_, translation)| *translation)
            .collect_vec();
        let primitive_lattice = primitive_lattice_from_centerings(cell.lattice(), &centerings)?;

        Ok(RawSymmetry {
            rotations,
            translations,
            primitive_lattice,
        })
    }
}

/// Returns a primitive lattice of the lattice generated by `lattice` and `centerings`.
///
/// With `k` centerings, every centering times `k` is integral. The column-style Hermite normal
/// form $`B`$ of $`[kI \mid k\mathbf{c}_1 \cdots k\mathbf{c}_k]`$ then spans the finer lattice
/// scaled by `k`, and the primitive lattice is $`(B/k)^{\mathsf{T}}`$ `lattice`.
///
/// # Arguments
///
/// * `lattice` - The lattice whose rows are the basis vectors.
/// * `centerings` - The pure translations in fractional coordinates of `lattice`, including the
/// zero translation.
///
/// # Errors
///
/// Errors if `centerings` is empty or if a scaled centering is not integral.
pub fn primitive_lattice_from_centerings(
    lattice: &Matrix3<f64>,
    centerings: &[Vector3<f64>],
) -> Result<Matrix3<f64>, anyhow::Error> {
    ensure!(
        !centerings.is_empty(),
        "The identity does not map the structure onto itself."
    );
    let k = i32::try_from(centerings.len())?;
    let generators = [
        Vector3::new(k, 0, 0),
        Vector3::new(0, k, 0),
        Vector3::new(0, 0, k),
    ]
    .into_iter()
    .map(Ok)
    .chain(centerings.iter().map(|centering| {
        to_integer_matrix(
            &(centering * f64::from(k)),
            CENTERING_ROUNDING_THRESHOLD,
            "Scaled centering",
        )
    }))
    .collect::<Result<Vec<_>, anyhow::Error>>()?;
    let prim_basis =
        to_float_matrix(&column_style_hermite_normal_form(&generators)?) / f64::from(k);
    Ok(prim_basis.transpose() * lattice)
}

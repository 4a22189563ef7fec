//! Nonmagnetic space-group symmetry expressed in a primitive basis.

use anyhow::{self, ensure, format_err};
use derive_builder::Builder;
use itertools::Itertools;
use log;
use nalgebra::{Matrix3, Vector3};

use crate::auxiliary::cell::Cell;
use crate::auxiliary::geometry::{to_float_matrix, to_integer_matrix};
use crate::permutation::site_matching::get_symmetry_permutations;
use crate::permutation::Permutation;
use crate::symmetry::INTEGRALITY_THRESHOLD;

#[cfg(test)]
#[path = "nonmagnetic_tests.rs"]
mod nonmagnetic_tests;

// =================
// Trait definitions
// =================

/// The space-group operations of a bare crystal structure as returned by a symmetry finder.
#[derive(Clone, Debug)]
pub struct RawSymmetry {
    /// Rotation parts with respect to the input lattice. Rotation parts may repeat.
    pub rotations: Vec<Matrix3<i32>>,

    /// Translation parts with respect to the input lattice, aligned with [`Self::rotations`].
    pub translations: Vec<Vector3<f64>>,

    /// A primitive lattice of the structure. Row `i` is the $`i`$-th basis vector in Cartesian
    /// coordinates, which must be a lattice vector of the input cell.
    pub primitive_lattice: Matrix3<f64>,
}

/// Trait for finders of the nonmagnetic space-group symmetry of a crystal structure.
pub trait SymmetrySearch {
    /// Finds all space-group operations of `cell`.
    ///
    /// # Arguments
    ///
    /// * `cell` - The crystal structure, with species labels but no magnetic moments.
    /// * `symprec` - Distance tolerance.
    /// * `angle_tolerance` - Angle tolerance in degrees. Negative values indicate that only
    /// `symprec` is to be used.
    ///
    /// # Errors
    ///
    /// Errors if the symmetry search fails.
    fn find_symmetry(
        &self,
        cell: &Cell,
        symprec: f64,
        angle_tolerance: f64,
    ) -> Result<RawSymmetry, anyhow::Error>;
}

// ==================
// Struct definitions
// ==================

/// A space-group operation with a distinct rotation part, in a primitive basis.
#[derive(Clone, Debug)]
pub struct PrimitiveOperation {
    rotation: Matrix3<i32>,
    translation: Vector3<f64>,
    permutation: Permutation,
}

impl PrimitiveOperation {
    pub fn rotation(&self) -> &Matrix3<i32> {
        &self.rotation
    }

    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// The permutation of the sites in the input cell induced by this operation.
    pub fn permutation(&self) -> &Permutation {
        &self.permutation
    }
}

/// A pure translation of the input cell, in a primitive basis.
#[derive(Clone, Debug)]
pub struct PrimitiveCentering {
    translation: Vector3<i32>,
    permutation: Permutation,
}

impl PrimitiveCentering {
    /// The translation as a lattice vector of the primitive cell. This is never reduced into the
    /// unit cube.
    pub fn translation(&self) -> &Vector3<i32> {
        &self.translation
    }

    pub fn permutation(&self) -> &Permutation {
        &self.permutation
    }
}

/// A structure containing the nonmagnetic space-group symmetry of a crystal structure with
/// respect to a primitive cell, together with the induced site permutations.
#[derive(Builder, Clone, Debug)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct NonmagneticSymmetry {
    /// The primitive lattice. Row `i` is the $`i`$-th primitive basis vector.
    prim_lattice: Matrix3<f64>,

    /// The operations with pairwise distinct rotation parts.
    operations: Vec<PrimitiveOperation>,

    /// The translations of the input cell that are lattice vectors of the primitive cell.
    centerings: Vec<PrimitiveCentering>,

    /// The transformation matrix $`T`$ from the primitive cell to the input cell, such that
    /// `input_latticeᵗ = prim_latticeᵗ · T`.
    transformation: Matrix3<i32>,
}

impl NonmagneticSymmetryBuilder {
    fn validate(&self) -> Result<(), String> {
        if let (Some(centerings), Some(transformation)) =
            (self.centerings.as_ref(), self.transformation.as_ref())
        {
            let det = to_float_matrix(transformation).determinant().abs();
            if (det - centerings.len() as f64).abs() > INTEGRALITY_THRESHOLD {
                return Err(format!(
                    "|det T| = {det} does not match the number of centerings ({}).",
                    centerings.len()
                ));
            }
        }
        if let Some(operations) = self.operations.as_ref() {
            if !operations.iter().map(|op| op.rotation).all_unique() {
                return Err("The rotation parts of the operations are not distinct.".to_string());
            }
        }
        Ok(())
    }
}

impl NonmagneticSymmetry {
    fn builder() -> NonmagneticSymmetryBuilder {
        NonmagneticSymmetryBuilder::default()
    }

    /// Finds the nonmagnetic symmetry of a crystal structure and expresses it in the primitive
    /// cell returned by the symmetry finder.
    ///
    /// # Arguments
    ///
    /// * `cell` - The crystal structure.
    /// * `search` - The symmetry finder.
    /// * `symprec` - Distance tolerance, used both for the search and for the site matching.
    /// * `angle_tolerance` - Angle tolerance in degrees, or a negative value.
    ///
    /// # Errors
    ///
    /// Errors if the symmetry finder fails, or if its output is inconsistent: the primitive
    /// cell volume does not match the number of centerings, a centering does not permute the
    /// sites, or a rotation or centering is not integral in the primitive basis.
    pub fn from_cell<S: SymmetrySearch + ?Sized>(
        cell: &Cell,
        search: &S,
        symprec: f64,
        angle_tolerance: f64,
    ) -> Result<Self, anyhow::Error> {
        let raw = search.find_symmetry(cell, symprec, angle_tolerance)?;
        ensure!(
            raw.rotations.len() == raw.translations.len(),
            "The symmetry finder returned {} rotations but {} translations.",
            raw.rotations.len(),
            raw.translations.len()
        );

        // Unique by rotation parts, with pure translations set aside as centerings
        let centerings = raw
            .rotations
            .iter()
            .zip(raw.translations.iter())
            .filter(|(rotation, _)| **rotation == Matrix3::identity())
            .map(|(rotation, translation)| (*rotation, *translation))
            .collect_vec();
        let uniq_operations = raw
            .rotations
            .iter()
            .zip(raw.translations.iter())
            .unique_by(|(rotation, _)| **rotation)
            .map(|(rotation, translation)| (*rotation, *translation))
            .collect_vec();
        log::debug!(
            "{} raw operations: {} distinct rotations, {} centerings.",
            raw.rotations.len(),
            uniq_operations.len(),
            centerings.len()
        );

        let tmat = raw
            .primitive_lattice
            .transpose()
            .try_inverse()
            .ok_or_else(|| {
                format_err!("The primitive lattice {} is singular.", raw.primitive_lattice)
            })?
            * cell.lattice().transpose();
        ensure!(
            (tmat.determinant().abs() - centerings.len() as f64).abs() < INTEGRALITY_THRESHOLD,
            "The primitive cell of volume ratio {} is inconsistent with {} centerings.",
            tmat.determinant().abs(),
            centerings.len()
        );
        let invtmat = tmat
            .try_inverse()
            .ok_or_else(|| format_err!("The transformation matrix {tmat} is singular."))?;

        let operations = uniq_operations
            .iter()
            .zip(get_symmetry_permutations(cell, &uniq_operations, symprec))
            .filter_map(|((rotation, translation), perm_opt)| {
                if perm_opt.is_none() {
                    log::warn!(
                        "Operation with rotation {:?} does not permute the sites and is dropped.",
                        rotation.as_slice()
                    );
                }
                perm_opt.map(|perm| (rotation, translation, perm))
            })
            .map(|(rotation, translation, permutation)| {
                let prim_rotation = to_integer_matrix(
                    &(tmat * to_float_matrix(rotation) * invtmat),
                    INTEGRALITY_THRESHOLD,
                    "Rotation in the primitive basis",
                )?;
                Ok(PrimitiveOperation {
                    rotation: prim_rotation,
                    translation: tmat * translation,
                    permutation,
                })
            })
            .collect::<Result<Vec<_>, anyhow::Error>>()?;

        let prim_centerings = centerings
            .iter()
            .zip(get_symmetry_permutations(cell, &centerings, symprec))
            .map(|((_, translation), perm_opt)| {
                let permutation = perm_opt.ok_or_else(|| {
                    format_err!(
                        "Centering {:?} does not permute the sites.",
                        translation.as_slice()
                    )
                })?;
                // Never reduced modulo 1
                let prim_translation = to_integer_matrix(
                    &(tmat * translation),
                    INTEGRALITY_THRESHOLD,
                    "Centering in the primitive basis",
                )?;
                Ok(PrimitiveCentering {
                    translation: prim_translation,
                    permutation,
                })
            })
            .collect::<Result<Vec<_>, anyhow::Error>>()?;

        Self::builder()
            .prim_lattice(raw.primitive_lattice)
            .operations(operations)
            .centerings(prim_centerings)
            .transformation(to_integer_matrix(
                &tmat,
                INTEGRALITY_THRESHOLD,
                "Transformation from the primitive cell",
            )?)
            .build()
            .map_err(|err| format_err!(err))
    }

    pub fn prim_lattice(&self) -> &Matrix3<f64> {
        &self.prim_lattice
    }

    pub fn operations(&self) -> &[PrimitiveOperation] {
        &self.operations
    }

    pub fn centerings(&self) -> &[PrimitiveCentering] {
        &self.centerings
    }

    pub fn transformation(&self) -> &Matrix3<i32> {
        &self.transformation
    }
}

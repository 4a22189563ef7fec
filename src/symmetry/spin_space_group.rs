//! Spin space groups and their coset decompositions.

use std::fmt;

use anyhow::{self, ensure, format_err};
use derive_builder::Builder;
use itertools::{iproduct, Itertools};
use log;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::auxiliary::geometry::{
    invert_integer_matrix, is_integer_matrix, is_lattice_vector, remainder_one, to_float_matrix,
    to_integer_matrix,
};
use crate::auxiliary::hermite::column_style_hermite_normal_form;
use crate::permutation::Permutation;
use crate::symmetry::nonmagnetic::{NonmagneticSymmetry, PrimitiveOperation};
use crate::symmetry::procrustes::solve_procrustes;
use crate::symmetry::spin_only::SpinOnlyGroup;
use crate::symmetry::{FRACTIONAL_FOLD_THRESHOLD, INTEGRALITY_THRESHOLD, SPIN_ROTATION_THRESHOLD};

#[cfg(test)]
#[path = "spin_space_group_tests.rs"]
mod spin_space_group_tests;

// ==================
// Struct definitions
// ==================

/// A spin space-group operation $`\{W \| R \| \mathbf{t}\}`$ acting on a site at fractional
/// position $`\mathbf{p}`$ carrying moment $`\mathbf{m}`$ as
/// $`(\mathbf{p}, \mathbf{m}) \mapsto (R\mathbf{p} + \mathbf{t}, W\mathbf{m})`$.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpinSymmetryOperation {
    /// The rotation part with respect to some lattice basis.
    pub rotation: Matrix3<i32>,

    /// The translation part in fractional coordinates with respect to the same basis.
    pub translation: Vector3<f64>,

    /// The orthogonal spin rotation in Cartesian coordinates.
    pub spin_rotation: Matrix3<f64>,
}

impl SpinSymmetryOperation {
    /// Composes two operations such that `self.compose(other)` acts as `other` followed by
    /// `self`. The translation is not reduced.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            rotation: self.rotation * other.rotation,
            translation: to_float_matrix(&self.rotation) * other.translation + self.translation,
            spin_rotation: self.spin_rotation * other.spin_rotation,
        }
    }

    /// Returns `true` if `self` and `other` agree, with translations compared modulo lattice
    /// translations.
    ///
    /// # Arguments
    ///
    /// * `other` - The operation to compare with.
    /// * `thresh` - Threshold on the translations and the spin rotation elements.
    pub fn is_equivalent(&self, other: &Self, thresh: f64) -> bool {
        self.rotation == other.rotation
            && is_lattice_vector(&(self.translation - other.translation), thresh)
            && (self.spin_rotation - other.spin_rotation).amax() < thresh
    }
}

impl fmt::Display for SpinSymmetryOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let r = &self.rotation;
        let w = &self.spin_rotation;
        write!(
            f,
            "{{[{:+.3} {:+.3} {:+.3}; {:+.3} {:+.3} {:+.3}; {:+.3} {:+.3} {:+.3}] || \
             [{} {} {}; {} {} {}; {} {} {}] | ({:.6}, {:.6}, {:.6})}}",
            w[(0, 0)], w[(0, 1)], w[(0, 2)],
            w[(1, 0)], w[(1, 1)], w[(1, 2)],
            w[(2, 0)], w[(2, 1)], w[(2, 2)],
            r[(0, 0)], r[(0, 1)], r[(0, 2)],
            r[(1, 0)], r[(1, 1)], r[(1, 2)],
            r[(2, 0)], r[(2, 1)], r[(2, 2)],
            self.translation[0], self.translation[1], self.translation[2],
        )
    }
}

/// A structure containing a spin space group in the primitive cell of its maximal space
/// subgroup, decomposed as
///
/// ```math
/// \bigcup_{(W_s, \mathbf{c}_s)} \bigcup_{\mathbf{c}} \bigcup_{(W, R, \mathbf{t})}
/// \{W_s W \| R \| \mathbf{t} + \mathbf{c}_s + \mathbf{c}\}
/// ```
///
/// over the spin-translation coset, the centerings, and the nontrivial coset, modulo the
/// spin-only group and the translations of the spin primitive lattice.
#[derive(Builder, Clone, Debug, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct SpinSpaceGroup {
    /// The primitive lattice of the maximal space subgroup, *i.e.* of the pure translations
    /// leaving the magnetic moments unchanged. Row `i` is the $`i`$-th basis vector.
    prim_lattice: Matrix3<f64>,

    /// The spin-only group.
    spin_only_group: SpinOnlyGroup,

    /// Operations with identity rotation parts and pairwise inequivalent translations, with
    /// respect to [`Self::prim_lattice`].
    spin_translation_coset: Vec<SpinSymmetryOperation>,

    /// The centerings of the nonmagnetic primitive cell that leave the moments unchanged, with
    /// respect to [`Self::prim_lattice`]. These are not reduced modulo $`1`$.
    prim_centerings: Vec<Vector3<f64>>,

    /// Operations with pairwise distinct rotation parts, with respect to
    /// [`Self::prim_lattice`].
    nontrivial_coset: Vec<SpinSymmetryOperation>,

    /// The transformation matrix $`T`$ from [`Self::prim_lattice`] to the input lattice, such
    /// that `input_latticeᵗ = prim_latticeᵗ · T`.
    transformation: Matrix3<i32>,
}

impl SpinSpaceGroupBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(coset) = self.nontrivial_coset.as_ref() {
            if !coset.iter().map(|op| op.rotation).all_unique() {
                return Err("The nontrivial coset contains repeated rotation parts.".to_string());
            }
        }
        if let Some(coset) = self.spin_translation_coset.as_ref() {
            if coset.iter().any(|op| op.rotation != Matrix3::identity()) {
                return Err(
                    "The spin-translation coset contains non-identity rotation parts.".to_string(),
                );
            }
        }
        Ok(())
    }
}

/// A flat list of spin space-group operations with respect to the input cell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpinSymmetryOperations {
    /// The spin-only group, whose elements are implied in every operation.
    pub spin_only_group: SpinOnlyGroup,

    /// The operations. Translations lie in $`[0, 1)^3`$.
    pub operations: Vec<SpinSymmetryOperation>,
}

impl SpinSymmetryOperations {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// The rotation parts of the operations.
    pub fn rotations(&self) -> Vec<Matrix3<i32>> {
        self.operations.iter().map(|op| op.rotation).collect()
    }

    /// The translation parts of the operations.
    pub fn translations(&self) -> Vec<Vector3<f64>> {
        self.operations.iter().map(|op| op.translation).collect()
    }

    /// The spin rotation parts of the operations.
    pub fn spin_rotations(&self) -> Vec<Matrix3<f64>> {
        self.operations.iter().map(|op| op.spin_rotation).collect()
    }
}

impl SpinSpaceGroup {
    fn builder() -> SpinSpaceGroupBuilder {
        SpinSpaceGroupBuilder::default()
    }

    /// Constructs the spin space group of a magnetic structure from the nonmagnetic symmetry of
    /// its underlying crystal structure.
    ///
    /// # Arguments
    ///
    /// * `nonmagnetic_symmetry` - The nonmagnetic symmetry of the structure.
    /// * `magmoms` - The magnetic moments of the sites in the input cell, in Cartesian
    /// coordinates.
    /// * `mag_symprec` - Tolerance on moment deviations.
    ///
    /// # Errors
    ///
    /// Errors if the number of moments does not match the number of sites, or if a coset
    /// decomposition is inconsistent with the order of the centering group.
    pub fn from_nonmagnetic_symmetry(
        nonmagnetic_symmetry: &NonmagneticSymmetry,
        magmoms: &[Vector3<f64>],
        mag_symprec: f64,
    ) -> Result<Self, anyhow::Error> {
        let centerings = nonmagnetic_symmetry.centerings();
        let n_centerings = centerings.len();

        // Centerings leaving every moment unchanged
        let stg_centerings = centerings
            .iter()
            .map(|centering| {
                let perm_magmoms = centering.permutation().gather(magmoms)?;
                Ok((centering, max_deviation(magmoms, &perm_magmoms) < mag_symprec))
            })
            .filter_ok(|(_, invariant)| *invariant)
            .map_ok(|(centering, _)| *centering.translation())
            .collect::<Result<Vec<_>, anyhow::Error>>()?;
        ensure!(
            !stg_centerings.is_empty() && n_centerings % stg_centerings.len() == 0,
            "{} magnetic centerings do not divide {n_centerings} centerings.",
            stg_centerings.len()
        );

        let generators = nonmagnetic_symmetry
            .transformation()
            .column_iter()
            .map(|col| col.into_owned())
            .chain(stg_centerings.iter().copied())
            .collect_vec();
        let tmat_stg = column_style_hermite_normal_form(&generators)?;
        let tmat_stg_f = to_float_matrix(&tmat_stg);
        let invtmat_stg = invert_integer_matrix(&tmat_stg)?;
        log::debug!(
            "Index of the maximal space subgroup lattice: {}",
            tmat_stg_f.determinant().abs().round()
        );

        let prim_centerings = stg_centerings
            .iter()
            .map(|centering| invtmat_stg * centering.map(f64::from))
            .collect_vec();
        let transformation = to_integer_matrix(
            &(invtmat_stg * to_float_matrix(nonmagnetic_symmetry.transformation())),
            INTEGRALITY_THRESHOLD,
            "Transformation from the spin primitive cell",
        )?;

        let spin_only_group = SpinOnlyGroup::from_magmoms(magmoms, mag_symprec);
        log::debug!("Spin-only group: {spin_only_group}");

        // Classes of centerings modulo the spin primitive lattice
        let (found_centerings, spin_translation_coset) = centerings.iter().try_fold(
            (Vec::<Vector3<f64>>::new(), Vec::<SpinSymmetryOperation>::new()),
            |(mut found, mut coset), centering| {
                let c = centering.translation().map(f64::from);
                let is_new = found.iter().all(|other| {
                    !is_lattice_vector(&(invtmat_stg * (c - other)), INTEGRALITY_THRESHOLD)
                });
                if is_new {
                    found.push(c);
                    if let Some(spin_rotation) = find_spin_rotation(
                        magmoms,
                        centering.permutation(),
                        &spin_only_group,
                        mag_symprec,
                    )? {
                        coset.push(SpinSymmetryOperation {
                            rotation: Matrix3::identity(),
                            translation: invtmat_stg * c,
                            spin_rotation,
                        });
                    }
                }
                Ok::<_, anyhow::Error>((found, coset))
            },
        )?;
        ensure!(
            n_centerings % found_centerings.len() == 0,
            "{} centering classes do not divide {n_centerings} centerings.",
            found_centerings.len()
        );

        let nontrivial_coset = nonmagnetic_symmetry
            .operations()
            .iter()
            .map(|op| {
                find_coset_representative(
                    op,
                    nonmagnetic_symmetry,
                    &tmat_stg_f,
                    &invtmat_stg,
                    magmoms,
                    &spin_only_group,
                    mag_symprec,
                )
            })
            .filter_map(Result::transpose)
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "Spin-translation coset of size {}, nontrivial coset of size {}.",
            spin_translation_coset.len(),
            nontrivial_coset.len()
        );

        Self::builder()
            .prim_lattice(tmat_stg_f.transpose() * nonmagnetic_symmetry.prim_lattice())
            .spin_only_group(spin_only_group)
            .spin_translation_coset(spin_translation_coset)
            .prim_centerings(prim_centerings)
            .nontrivial_coset(nontrivial_coset)
            .transformation(transformation)
            .build()
            .map_err(|err| format_err!(err))
    }

    pub fn prim_lattice(&self) -> &Matrix3<f64> {
        &self.prim_lattice
    }

    pub fn spin_only_group(&self) -> &SpinOnlyGroup {
        &self.spin_only_group
    }

    pub fn spin_translation_coset(&self) -> &[SpinSymmetryOperation] {
        &self.spin_translation_coset
    }

    pub fn prim_centerings(&self) -> &[Vector3<f64>] {
        &self.prim_centerings
    }

    pub fn nontrivial_coset(&self) -> &[SpinSymmetryOperation] {
        &self.nontrivial_coset
    }

    pub fn transformation(&self) -> &Matrix3<i32> {
        &self.transformation
    }

    /// Expands the coset decomposition into all operations with respect to the input cell.
    ///
    /// The operations are ordered with the nontrivial coset outermost, then the
    /// spin-translation coset, then the centerings.
    ///
    /// # Errors
    ///
    /// Errors if a rotation is not integral with respect to the input lattice.
    pub fn operations_in_input_cell(&self) -> Result<SpinSymmetryOperations, anyhow::Error> {
        let tmat = to_float_matrix(&self.transformation);
        let invtmat = invert_integer_matrix(&self.transformation)?;
        let rotations = self
            .nontrivial_coset
            .iter()
            .map(|op| {
                to_integer_matrix(
                    &(invtmat * to_float_matrix(&op.rotation) * tmat),
                    INTEGRALITY_THRESHOLD,
                    "Rotation in the input cell",
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let operations = iproduct!(
            self.nontrivial_coset.iter().zip(rotations.iter()),
            self.spin_translation_coset.iter(),
            self.prim_centerings.iter()
        )
        .map(|((op, rotation), op_st, centering)| SpinSymmetryOperation {
            rotation: *rotation,
            translation: remainder_one(
                &(invtmat * (op.translation + op_st.translation + centering)),
                FRACTIONAL_FOLD_THRESHOLD,
            ),
            spin_rotation: op_st.spin_rotation * op.spin_rotation,
        })
        .collect_vec();
        Ok(SpinSymmetryOperations {
            spin_only_group: self.spin_only_group.clone(),
            operations,
        })
    }
}

// =========
// Functions
// =========

/// Returns the largest deviation $`\max_i \lVert \mathbf{a}_i - \mathbf{b}_i \rVert`$.
fn max_deviation(a: &[Vector3<f64>], b: &[Vector3<f64>]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(ai, bi)| (ai - bi).norm())
        .fold(0.0, f64::max)
}

/// Finds a spin rotation $`W`$ with $`W\mathbf{m}_i = \mathbf{m}_{\sigma(i)}`$ for all sites
/// $`i`$, canonicalised modulo the spin-only group. Returns `None` if no such rotation exists
/// within `mag_symprec`.
fn find_spin_rotation(
    magmoms: &[Vector3<f64>],
    permutation: &Permutation,
    spin_only_group: &SpinOnlyGroup,
    mag_symprec: f64,
) -> Result<Option<Matrix3<f64>>, anyhow::Error> {
    let perm_magmoms = permutation.gather(magmoms)?;
    let w = spin_only_group.canonicalize(
        &solve_procrustes(magmoms, &perm_magmoms)?,
        SPIN_ROTATION_THRESHOLD,
    );
    let rotated_magmoms = magmoms.iter().map(|m| w * m).collect_vec();
    if max_deviation(&rotated_magmoms, &perm_magmoms) < mag_symprec {
        Ok(Some(w))
    } else {
        Ok(None)
    }
}

/// Finds the first centering whose composition with `op` admits a spin rotation, and returns
/// the resulting operation in the spin primitive cell. Returns `None` if `op` is incompatible
/// with the spin primitive lattice or with the moments.
fn find_coset_representative(
    op: &PrimitiveOperation,
    nonmagnetic_symmetry: &NonmagneticSymmetry,
    tmat_stg: &Matrix3<f64>,
    invtmat_stg: &Matrix3<f64>,
    magmoms: &[Vector3<f64>],
    spin_only_group: &SpinOnlyGroup,
    mag_symprec: f64,
) -> Result<Option<SpinSymmetryOperation>, anyhow::Error> {
    let rotation = invtmat_stg * to_float_matrix(op.rotation()) * tmat_stg;
    if !is_integer_matrix(&rotation, INTEGRALITY_THRESHOLD) {
        log::debug!(
            "Rotation {:?} does not preserve the spin primitive lattice.",
            op.rotation().as_slice()
        );
        return Ok(None);
    }
    let rotation = to_integer_matrix(&rotation, INTEGRALITY_THRESHOLD, "Spin primitive rotation")?;

    for centering in nonmagnetic_symmetry.centerings() {
        let permutation = centering.permutation() * op.permutation();
        if let Some(spin_rotation) =
            find_spin_rotation(magmoms, &permutation, spin_only_group, mag_symprec)?
        {
            return Ok(Some(SpinSymmetryOperation {
                rotation,
                translation: invtmat_stg
                    * (centering.translation().map(f64::from) + op.translation()),
                spin_rotation,
            }));
        }
    }
    Ok(None)
}

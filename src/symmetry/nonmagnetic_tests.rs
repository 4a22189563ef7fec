use anyhow::{self, format_err};
use approx;
use nalgebra::{Matrix3, Vector3};

use crate::auxiliary::cell::Cell;
use crate::auxiliary::geometry::to_float_matrix;
use crate::symmetry::fixtures::{fcc, rutile};
use crate::symmetry::moyo_search::MoyoSymmetrySearch;
use crate::symmetry::nonmagnetic::{NonmagneticSymmetry, RawSymmetry, SymmetrySearch};

#[test]
fn test_nonmagnetic_symmetry_fcc() {
    let (cell, _) = fcc();
    let ns = NonmagneticSymmetry::from_cell(&cell, &MoyoSymmetrySearch, 1e-5, -1.0).unwrap();
    assert_eq!(ns.operations().len(), 48);
    assert_eq!(ns.centerings().len(), 4);
    approx::assert_relative_eq!(
        to_float_matrix(ns.transformation()).determinant().abs(),
        4.0,
        epsilon = 1e-10
    );

    // input_latticeᵗ = prim_latticeᵗ · T
    approx::assert_relative_eq!(
        ns.prim_lattice().transpose() * to_float_matrix(ns.transformation()),
        cell.lattice().transpose(),
        epsilon = 1e-10
    );

    // The identity is kept both as an operation and as the zero centering.
    assert_eq!(ns.operations()[0].rotation(), &Matrix3::identity());
    assert!(ns.operations()[0].permutation().is_identity());
    assert!(ns
        .centerings()
        .iter()
        .any(|centering| centering.translation() == &Vector3::zeros()));
    for centering in ns.centerings().iter() {
        assert_eq!(centering.permutation().rank(), 4);
    }
}

#[test]
fn test_nonmagnetic_symmetry_rutile() {
    let (cell, _) = rutile();
    let ns = NonmagneticSymmetry::from_cell(&cell, &MoyoSymmetrySearch, 1e-5, -1.0).unwrap();
    assert_eq!(ns.operations().len(), 16);
    assert_eq!(ns.centerings().len(), 1);
    assert_eq!(ns.transformation(), &Matrix3::identity());
    let n_swapping = ns
        .operations()
        .iter()
        .filter(|op| op.permutation().apply(0) == 1)
        .count();
    assert_eq!(n_swapping, 8);
}

/// A symmetry finder returning a fixed, possibly inconsistent, result.
struct FixedSymmetry(RawSymmetry);

impl SymmetrySearch for FixedSymmetry {
    fn find_symmetry(
        &self,
        _cell: &Cell,
        _symprec: f64,
        _angle_tolerance: f64,
    ) -> Result<RawSymmetry, anyhow::Error> {
        Ok(self.0.clone())
    }
}

/// A symmetry finder that always fails.
struct FailingSymmetry;

impl SymmetrySearch for FailingSymmetry {
    fn find_symmetry(
        &self,
        _cell: &Cell,
        _symprec: f64,
        _angle_tolerance: f64,
    ) -> Result<RawSymmetry, anyhow::Error> {
        Err(format_err!("No symmetry for you."))
    }
}

#[test]
fn test_nonmagnetic_symmetry_inconsistent_search() {
    let (cell, _) = fcc();
    assert!(NonmagneticSymmetry::from_cell(&cell, &FailingSymmetry, 1e-5, -1.0).is_err());

    // Four centerings, but the input lattice claimed to be primitive
    let raw = MoyoSymmetrySearch.find_symmetry(&cell, 1e-5, -1.0).unwrap();
    let inconsistent = FixedSymmetry(RawSymmetry {
        primitive_lattice: *cell.lattice(),
        ..raw.clone()
    });
    assert!(NonmagneticSymmetry::from_cell(&cell, &inconsistent, 1e-5, -1.0).is_err());

    // Mismatched lengths
    let truncated = FixedSymmetry(RawSymmetry {
        translations: raw.translations[..10].to_vec(),
        ..raw
    });
    assert!(NonmagneticSymmetry::from_cell(&cell, &truncated, 1e-5, -1.0).is_err());
}

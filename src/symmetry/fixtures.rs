//! Magnetic structures shared by the unit tests.

use itertools::Itertools;
use nalgebra::Vector3;

use crate::auxiliary::cell::Cell;
use crate::permutation::site_matching::get_symmetry_permutations;
use crate::symmetry::spin_space_group::SpinSymmetryOperation;

/// A face-centred cubic cell with two sublattices of moments along `z` and `x`.
pub(crate) fn fcc() -> (Cell, Vec<Vector3<f64>>) {
    let cell = Cell::new(
        [[4.1, 0.0, 0.0], [0.0, 4.1, 0.0], [0.0, 0.0, 4.1]],
        &[
            [0.0, 0.0, 0.0],
            [0.0, 0.5, 0.5],
            [0.5, 0.0, 0.5],
            [0.5, 0.5, 0.0],
        ],
        &[0, 0, 0, 0],
    )
    .unwrap();
    let magmoms = vec![Vector3::z(), Vector3::z(), Vector3::x(), Vector3::x()];
    (cell, magmoms)
}

/// Antiferromagnetic MnF₂ in the rutile structure, P4₂/mnm.
pub(crate) fn rutile() -> (Cell, Vec<Vector3<f64>>) {
    let (a, c, x) = (4.87, 3.31, 0.695169);
    let cell = Cell::new(
        [[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, c]],
        &[
            [0.0, 0.0, 0.0],
            [0.5, 0.5, 0.5],
            [x, x, 0.0],
            [-x, -x, 0.0],
            [-x + 0.5, x + 0.5, 0.5],
            [x + 0.5, -x + 0.5, 0.5],
        ],
        &[0, 0, 1, 1, 1, 1],
    )
    .unwrap();
    let magmoms = vec![
        Vector3::new(0.0, 0.0, 2.5),
        Vector3::new(0.0, 0.0, -2.5),
        Vector3::zeros(),
        Vector3::zeros(),
        Vector3::zeros(),
        Vector3::zeros(),
    ];
    (cell, magmoms)
}

/// A single kagome layer of Mn with a 120° in-plane arrangement, with Ge at the hexagon
/// centres. The family space group is P6/mmm.
pub(crate) fn layer_triangular_kagome() -> (Cell, Vec<Vector3<f64>>) {
    let (a, c) = (5.2, 20.0);
    let s3 = 3.0f64.sqrt();
    let cell = Cell::new(
        [[-0.5 * a, -s3 / 2.0 * a, 0.0], [a, 0.0, 0.0], [0.0, 0.0, c]],
        &[
            [0.0, 0.0, 0.0],
            [0.5, 0.0, 0.0],
            [0.0, 0.5, 0.0],
            [0.5, 0.5, 0.0],
        ],
        &[0, 1, 1, 1],
    )
    .unwrap();
    let magmoms = vec![
        Vector3::zeros(),
        Vector3::new(-0.5, s3 / 2.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(-0.5, -s3 / 2.0, 0.0),
    ];
    (cell, magmoms)
}

/// Noncollinear antiferromagnetic Mn₃Ge. The family space group is P6₃/mmc.
pub(crate) fn triangular_kagome() -> (Cell, Vec<Vector3<f64>>) {
    let (a, c, x) = (5.2, 4.2, -1.0 / 6.0);
    let s3 = 3.0f64.sqrt();
    let cell = Cell::new(
        [[-0.5 * a, -s3 / 2.0 * a, 0.0], [a, 0.0, 0.0], [0.0, 0.0, c]],
        &[
            [1.0 / 3.0, 2.0 / 3.0, 0.25],
            [2.0 / 3.0, 1.0 / 3.0, 0.75],
            [x, 2.0 * x, 0.25],
            [-2.0 * x, -x, 0.25],
            [x, -x, 0.25],
            [-x, -2.0 * x, 0.75],
            [2.0 * x, x, 0.75],
            [-x, x, 0.75],
        ],
        &[0, 0, 1, 1, 1, 1, 1, 1],
    )
    .unwrap();
    let m_a = Vector3::new(-0.5, s3 / 2.0, 0.0);
    let m_b = Vector3::new(1.0, 0.0, 0.0);
    let m_c = Vector3::new(-0.5, -s3 / 2.0, 0.0);
    let magmoms = vec![
        Vector3::zeros(),
        Vector3::zeros(),
        m_a,
        m_b,
        m_c,
        m_a,
        m_b,
        m_c,
    ];
    (cell, magmoms)
}

/// Collinear antiferromagnetic Cr sublattice of Cr₂O₃ in the hexagonal setting of R-3c.
pub(crate) fn cr_in_cr2o3() -> (Cell, Vec<Vector3<f64>>) {
    let cell = Cell::new(
        [
            [4.957, 0.0, 0.0],
            [-2.4785, 4.29288793, 0.0],
            [0.0, 0.0, 13.5923],
        ],
        &[
            [0.0, 0.0, 0.34751],
            [0.33333333, 0.66666667, 0.01417667],
            [0.66666667, 0.33333333, 0.68084333],
            [0.33333333, 0.66666667, 0.51417667],
            [0.66666667, 0.33333333, 0.18084333],
            [0.0, 0.0, 0.84751],
            [0.33333333, 0.66666667, 0.81915667],
            [0.0, 0.0, 0.15249],
            [0.66666667, 0.33333333, 0.48582333],
            [0.0, 0.0, 0.65249],
            [0.66666667, 0.33333333, 0.98582333],
            [0.33333333, 0.66666667, 0.31915667],
        ],
        &[0; 12],
    )
    .unwrap();
    let magmoms = (0..12)
        .map(|i| if i < 6 { -Vector3::x() } else { Vector3::x() })
        .collect();
    (cell, magmoms)
}

/// Asserts that every operation maps the magnetic structure onto itself.
pub(crate) fn assert_spin_symmetry(
    cell: &Cell,
    magmoms: &[Vector3<f64>],
    operations: &[SpinSymmetryOperation],
    symprec: f64,
) {
    let spatial = operations
        .iter()
        .map(|op| (op.rotation, op.translation))
        .collect::<Vec<_>>();
    let perms = get_symmetry_permutations(cell, &spatial, symprec);
    for (op, perm_opt) in operations.iter().zip(perms) {
        let perm = perm_opt.unwrap_or_else(|| panic!("{op} does not permute the sites."));
        let perm_magmoms = perm.gather(magmoms).unwrap();
        for (m, pm) in magmoms.iter().zip(perm_magmoms.iter()) {
            assert!(
                (op.spin_rotation * m - pm).norm() < 1e-6,
                "{op} does not map the moments consistently."
            );
        }
    }
}

/// Asserts that a list of operations in the input cell is closed under composition.
pub(crate) fn assert_closed(operations: &[SpinSymmetryOperation]) {
    for (a, b) in operations.iter().cartesian_product(operations.iter()) {
        let ab = a.compose(b);
        assert!(
            operations.iter().any(|c| c.is_equivalent(&ab, 1e-6)),
            "The product of {a} and {b} is missing."
        );
    }
}

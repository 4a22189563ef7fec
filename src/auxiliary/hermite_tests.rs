use nalgebra::{Matrix3, Vector3};
use proptest::prelude::*;

use crate::auxiliary::geometry::{invert_integer_matrix, is_integer_matrix, to_float_matrix};
use crate::auxiliary::hermite::column_style_hermite_normal_form;

fn assert_hermite_normal_form(hnf: &Matrix3<i32>, generators: &[Vector3<i32>]) {
    for i in 0..3 {
        assert!(hnf[(i, i)] > 0, "Non-positive pivot in {hnf}");
        for j in (i + 1)..3 {
            assert_eq!(hnf[(i, j)], 0, "{hnf} is not lower triangular.");
        }
        for j in 0..i {
            assert!(
                (0..hnf[(i, i)]).contains(&hnf[(i, j)]),
                "Unreduced off-diagonal element in {hnf}"
            );
        }
    }
    let hnf_inv = invert_integer_matrix(hnf).unwrap();
    for generator in generators {
        assert!(is_integer_matrix(&(hnf_inv * generator.map(f64::from)), 1e-8));
    }
}

#[test]
fn test_hermite_trivial() {
    let generators = vec![
        Vector3::new(2, 0, 0),
        Vector3::new(0, 1, 0),
        Vector3::new(0, 0, 1),
        Vector3::new(1, 0, 0),
    ];
    let hnf = column_style_hermite_normal_form(&generators).unwrap();
    assert_eq!(hnf, Matrix3::identity());
}

#[test]
fn test_hermite_face_centred() {
    let generators = vec![
        Vector3::new(4, 0, 0),
        Vector3::new(0, 4, 0),
        Vector3::new(0, 0, 4),
        Vector3::new(0, 2, 2),
        Vector3::new(2, 0, 2),
        Vector3::new(2, 2, 0),
    ];
    let hnf = column_style_hermite_normal_form(&generators).unwrap();
    assert_hermite_normal_form(&hnf, &generators);
    approx::assert_relative_eq!(to_float_matrix(&hnf).determinant().abs(), 16.0, epsilon = 1e-8);
}

#[test]
fn test_hermite_body_centred_sublattice() {
    // Doubling along c, then adding the body centre back
    let generators = vec![
        Vector3::new(1, 0, 0),
        Vector3::new(0, 1, 0),
        Vector3::new(0, 0, 2),
        Vector3::new(1, 1, 1),
    ];
    let hnf = column_style_hermite_normal_form(&generators).unwrap();
    assert_hermite_normal_form(&hnf, &generators);
    assert_eq!(hnf, Matrix3::identity());
}

#[test]
fn test_hermite_rank_deficient() {
    let generators = vec![Vector3::new(1, 0, 0), Vector3::new(0, 1, 0), Vector3::new(1, 1, 0)];
    assert!(column_style_hermite_normal_form(&generators).is_err());
    assert!(column_style_hermite_normal_form(&generators[..2]).is_err());
}

proptest! {
    #[test]
    fn test_hermite_properties(
        elements in prop::collection::vec(-4i32..=4, 12)
    ) {
        let generators = elements
            .chunks(3)
            .map(|c| Vector3::new(c[0], c[1], c[2]))
            .collect::<Vec<_>>();
        let basis = Matrix3::from_columns(&[generators[0], generators[1], generators[2]]);
        prop_assume!(basis.map(f64::from).determinant().abs() > 0.5);
        let hnf = column_style_hermite_normal_form(&generators).unwrap();
        assert_hermite_normal_form(&hnf, &generators);
        // The lattice generated is a superlattice of the one spanned by the first three vectors.
        let ratio = basis.map(f64::from).determinant().abs()
            / to_float_matrix(&hnf).determinant().abs();
        prop_assert!((ratio - ratio.round()).abs() < 1e-8);
    }
}

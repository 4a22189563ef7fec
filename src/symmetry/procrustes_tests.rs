use approx;
use nalgebra::{Matrix3, Rotation3, Vector3};
use proptest::prelude::*;

use crate::symmetry::procrustes::solve_procrustes;

fn reference_vectors() -> Vec<Vector3<f64>> {
    vec![
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(1.0, 1.0, 0.0),
        Vector3::new(1.0, 1.0, 1.0),
        Vector3::new(0.0, 0.0, 1.0),
    ]
}

#[test]
fn test_procrustes_recovers_orthogonal_matrix() {
    let r = Matrix3::new(
        -0.03831202, 0.99710779, 0.06563723,
        0.28470653, -0.05207084, 0.95719947,
        0.95784883, 0.05535959, -0.28188816,
    );
    let a = reference_vectors();
    let b = a.iter().map(|ai| r * ai).collect::<Vec<_>>();
    let r_actual = solve_procrustes(&a, &b).unwrap();
    approx::assert_relative_eq!(r_actual, r, epsilon = 1e-6);
}

#[test]
fn test_procrustes_improper() {
    let inversion = -Matrix3::<f64>::identity();
    let a = reference_vectors();
    let b = a.iter().map(|ai| inversion * ai).collect::<Vec<_>>();
    let r_actual = solve_procrustes(&a, &b).unwrap();
    approx::assert_relative_eq!(r_actual, inversion, epsilon = 1e-10);
}

#[test]
fn test_procrustes_mismatched_lengths() {
    let a = reference_vectors();
    assert!(solve_procrustes(&a, &a[..2]).is_err());
}

#[test]
fn test_procrustes_degenerate_is_orthogonal() {
    // Collinear vectors leave the rotation about z undetermined.
    let a = vec![Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, -1.0)];
    let b = vec![Vector3::new(0.0, 0.0, -1.0), Vector3::new(0.0, 0.0, 1.0)];
    let r = solve_procrustes(&a, &b).unwrap();
    approx::assert_relative_eq!(r * r.transpose(), Matrix3::identity(), epsilon = 1e-10);
    approx::assert_relative_eq!(r * a[0], b[0], epsilon = 1e-10);
}

proptest! {
    #[test]
    fn test_procrustes_random_rotation(
        x in -1.0f64..1.0, y in -1.0f64..1.0, z in -1.0f64..1.0, angle in 0.1f64..3.0,
    ) {
        let axis = Vector3::new(x, y, z);
        prop_assume!(axis.norm() > 0.1);
        let r = Rotation3::from_axis_angle(&nalgebra::Unit::new_normalize(axis), angle)
            .into_inner();
        let a = reference_vectors();
        let b = a.iter().map(|ai| r * ai).collect::<Vec<_>>();
        let r_actual = solve_procrustes(&a, &b).unwrap();
        prop_assert!((r_actual - r).amax() < 1e-8);
    }
}

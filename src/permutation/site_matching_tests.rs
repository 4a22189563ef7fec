use nalgebra::{Matrix3, Vector3};

use crate::permutation::site_matching::{get_symmetry_permutations, is_overlap_with_origin};
use crate::symmetry::fixtures::{fcc, rutile};
use crate::symmetry::moyo_search::MoyoSymmetrySearch;
use crate::symmetry::nonmagnetic::SymmetrySearch;

#[test]
fn test_site_matching_fcc_permutations() {
    let (cell, _) = fcc();
    let raw = MoyoSymmetrySearch
        .find_symmetry(&cell, 1e-5, -1.0)
        .unwrap();
    let operations = raw
        .rotations
        .iter()
        .copied()
        .zip(raw.translations.iter().copied())
        .collect::<Vec<_>>();
    let perms = get_symmetry_permutations(&cell, &operations, 1e-5);
    assert_eq!(perms.len(), operations.len());
    for perm in perms {
        let perm = perm.unwrap();
        let mut image = perm.image().clone();
        image.sort_unstable();
        assert_eq!(image, (0..cell.num_sites()).collect::<Vec<_>>());
    }
}

#[test]
fn test_site_matching_alignment() {
    let (cell, _) = rutile();
    let c4z = Matrix3::new(0, -1, 0, 1, 0, 0, 0, 0, 1);
    let operations = vec![
        (Matrix3::identity(), Vector3::zeros()),
        (c4z, Vector3::zeros()),
        (c4z, Vector3::new(0.5, 0.5, 0.5)),
        (Matrix3::identity(), Vector3::new(0.5, 0.5, 0.5)),
    ];
    let perms = get_symmetry_permutations(&cell, &operations, 1e-5);
    assert_eq!(perms.len(), 4);
    assert!(perms[0].as_ref().unwrap().is_identity());
    assert!(perms[1].is_none());
    let swap = perms[2].as_ref().unwrap();
    assert_eq!(swap.apply(0), 1);
    assert_eq!(swap.apply(1), 0);
    assert!(perms[3].is_none());
}

#[test]
fn test_site_matching_overlap_with_origin() {
    let lattice = Matrix3::from_diagonal_element(4.0);
    assert!(is_overlap_with_origin(&lattice, &Vector3::new(1.0, -2.0, 0.0), 1e-5));
    assert!(is_overlap_with_origin(&lattice, &Vector3::new(0.999999, 0.0, 1e-7), 1e-5));
    assert!(!is_overlap_with_origin(&lattice, &Vector3::new(0.5, 0.0, 0.0), 1e-5));
    assert!(!is_overlap_with_origin(&lattice, &Vector3::new(1e-5, 0.0, 0.0), 1e-5));
}

//! Property tests for the artifact namer
//!
//! The namer must be deterministic and collision-free: identical inputs map
//! to identical paths, distinct ids within a project never share a path,
//! and per-point indices never collide with each other or with the
//! un-indexed artifact.

use geoseg_core::{ArtifactKind, ArtifactSet};
use proptest::prelude::*;

const KINDS: [ArtifactKind; 5] = [
    ArtifactKind::SourceImage,
    ArtifactKind::Mask,
    ArtifactKind::Vector,
    ArtifactKind::TabularGeometry,
    ArtifactKind::Metadata,
];

fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}"
}

proptest! {
    #[test]
    fn naming_is_deterministic(project in ident(), id in ident()) {
        let a = ArtifactSet::new(project.clone(), id.clone());
        let b = ArtifactSet::new(project, id);
        for kind in KINDS {
            prop_assert_eq!(a.path(kind), b.path(kind));
            prop_assert_eq!(
                a.url("http://localhost:8000", kind),
                b.url("http://localhost:8000", kind)
            );
        }
    }

    #[test]
    fn distinct_ids_do_not_collide(project in ident(), id_a in ident(), id_b in ident()) {
        prop_assume!(id_a != id_b);
        let a = ArtifactSet::new(project.clone(), id_a);
        let b = ArtifactSet::new(project, id_b);
        for kind in KINDS {
            prop_assert_ne!(a.path(kind), b.path(kind));
        }
    }

    #[test]
    fn point_indices_do_not_collide(
        project in ident(),
        id in ident(),
        i in 0usize..64,
        j in 0usize..64,
    ) {
        prop_assume!(i != j);
        let set = ArtifactSet::new(project, id);
        for kind in KINDS {
            prop_assert_ne!(set.indexed_path(kind, i), set.indexed_path(kind, j));
            prop_assert_ne!(set.indexed_path(kind, i), set.path(kind));
        }
    }
}

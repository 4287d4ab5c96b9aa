#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Once};

use core_vg::{load_taxonomy_from_env, Taxonomy};

static INIT: Once = Once::new();

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let taxonomy_path = fixtures_dir().join("taxonomy.json");

        debug_assert!(
            taxonomy_path.exists(),
            "missing test taxonomy at {}",
            taxonomy_path.display()
        );

        std::env::set_var("VG_TAXONOMY_PATH", &taxonomy_path);
    });
}

/// The fixture taxonomy, loaded the way a viewer loads its data.
pub fn test_taxonomy() -> Arc<Taxonomy> {
    ensure_test_config();
    let (taxonomy, metadata) = load_taxonomy_from_env();
    assert!(
        metadata.path().is_some(),
        "fixture taxonomy should load from file"
    );
    taxonomy
}

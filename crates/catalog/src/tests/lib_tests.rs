use super::*;
use rand::{rngs::StdRng, SeedableRng};
use shared::domain::Coords;

const ANCIENT_TOML: &str = r#"
[[categories]]
label = "Ancient"

[[categories.places]]
name = "Giza"
summary = "Pyramids"
coords = [29.9792, 31.1342]
url = "https://en.wikipedia.org/wiki/Great_Pyramid_of_Giza"

[[categories.places]]
name = "Stonehenge"
coords = [51.1789, -1.8262]
url = ""

[[categories]]
label = "Empty"
"#;

#[test]
fn builtin_catalog_has_the_four_demo_categories() {
    let catalog = Catalog::builtin();
    let labels: Vec<&str> = catalog.labels().collect();
    assert_eq!(
        labels,
        vec!["🌌 Ancient", "🧿 Esoteric", "🔮 Surreal", "💫 The Veil Thins.."]
    );
    assert_eq!(catalog.place_count(), 18);
    assert!(catalog.all_places().all(|place| place.coords.is_in_range()));
}

#[test]
fn builtin_catalog_survives_validation() {
    let revalidated =
        Catalog::from_categories(Catalog::builtin().categories().to_vec()).expect("valid");
    assert_eq!(revalidated.place_count(), Catalog::builtin().place_count());
}

#[test]
fn parses_toml_catalog_and_drops_blank_urls() {
    let catalog = Catalog::from_toml_str(ANCIENT_TOML).expect("catalog");
    let ancient = catalog.places("Ancient").expect("ancient");
    assert_eq!(ancient.len(), 2);
    assert_eq!(ancient[0].coords, Coords::new(29.9792, 31.1342));
    assert_eq!(ancient[1].summary, "");
    assert_eq!(ancient[1].url, None);
    assert_eq!(catalog.places("Empty").map(<[Place]>::len), Some(0));
    assert!(catalog.places("Missing").is_none());
}

#[test]
fn rejects_coords_with_wrong_arity() {
    let raw = r#"
[[categories]]
label = "Broken"

[[categories.places]]
name = "Nowhere"
coords = [1.0]
"#;
    assert!(matches!(
        Catalog::from_toml_str(raw),
        Err(CatalogError::Parse(_))
    ));
}

#[test]
fn rejects_out_of_range_coords() {
    let raw = r#"
[[categories]]
label = "Broken"

[[categories.places]]
name = "Beyond the pole"
coords = [95.0, 10.0]
"#;
    let err = Catalog::from_toml_str(raw).expect_err("should fail");
    assert!(matches!(err, CatalogError::CoordsOutOfRange { .. }));
}

#[test]
fn rejects_duplicate_and_empty_labels() {
    let duplicate = vec![
        Category {
            label: "A".into(),
            places: Vec::new(),
        },
        Category {
            label: "A".into(),
            places: Vec::new(),
        },
    ];
    assert!(matches!(
        Catalog::from_categories(duplicate),
        Err(CatalogError::DuplicateLabel(label)) if label == "A"
    ));

    let empty = vec![Category {
        label: "  ".into(),
        places: Vec::new(),
    }];
    assert!(matches!(
        Catalog::from_categories(empty),
        Err(CatalogError::EmptyLabel)
    ));
}

#[test]
fn random_in_stays_inside_the_category() {
    let catalog = Catalog::from_toml_str(ANCIENT_TOML).expect("catalog");
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..32 {
        let place = catalog.random_in("Ancient", &mut rng).expect("place");
        assert!(catalog
            .places("Ancient")
            .expect("ancient")
            .contains(place));
    }
    assert!(catalog.random_in("Empty", &mut rng).is_none());
    assert!(catalog.random_in("Missing", &mut rng).is_none());
}

#[test]
fn random_place_draws_from_every_category() {
    let catalog = Catalog::builtin();
    let mut rng = StdRng::seed_from_u64(42);
    let mut seen = HashSet::new();
    for _ in 0..500 {
        let place = catalog.random_place(&mut rng).expect("place");
        seen.insert(place.name.clone());
    }
    assert_eq!(seen.len(), catalog.place_count());

    let empty = Catalog::from_categories(Vec::new()).expect("empty catalog");
    assert!(empty.random_place(&mut rng).is_none());
}

#[test]
fn loads_catalog_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("catalog.toml");
    fs::write(&path, ANCIENT_TOML).expect("write");

    let catalog = Catalog::load(&path).expect("load");
    assert_eq!(catalog.categories().len(), 2);

    let missing = Catalog::load(dir.path().join("missing.toml")).expect_err("missing");
    assert!(matches!(missing, CatalogError::Io { .. }));
}

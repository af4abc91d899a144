use solar_econ::EconError;
use solar_econ::kits::{
    KitCatalog, KitFit, OptimalSizing, SelectionPolicy, SelectionStrategy, recommend_kit,
};

const SMALL_CATALOG: &str = r#"
[[kits]]
id = "s-5"
name = { fr = "Petit", en = "Small" }
pv_kw = 5.0
base_price = 12500.0
price_per_watt = 2.5
tier = "residential"
features = [{ fr = "Surveillance", en = "Monitoring" }]

[[kits]]
id = "s-15"
name = { fr = "Moyen", en = "Medium" }
pv_kw = 15.0
base_price = 33000.0
price_per_watt = 2.2
tier = "small_commercial"

[[kits]]
id = "s-15b"
name = { fr = "Moyen + batterie", en = "Medium + battery" }
pv_kw = 15.0
battery_kwh = 20.0
battery_kw = 10.0
base_price = 48000.0
price_per_watt = 3.2
tier = "small_commercial"
"#;

#[test]
fn default_policy_never_undersizes_below_largest_kit() {
    let catalog = KitCatalog::standard();
    let largest = catalog
        .iter()
        .filter(|k| !k.has_storage())
        .map(|k| k.pv_kw)
        .fold(0.0, f64::max);
    let policy = SelectionPolicy::default();
    let mut pv = 0.5;
    while pv < largest {
        let r = recommend_kit(&catalog, &OptimalSizing::new(pv, 0.0, 0.0), &policy)
            .expect("pv-only kits exist");
        assert!(r.kit.pv_kw >= pv, "{pv} kW -> {}", r.kit.id);
        assert_ne!(r.fit, KitFit::ExceedsCatalog);
        pv += 3.7;
    }
}

#[test]
fn substituted_catalog_is_used() {
    let catalog = KitCatalog::from_toml_str(SMALL_CATALOG).expect("catalog parses");
    let r = recommend_kit(
        &catalog,
        &OptimalSizing::new(12.0, 0.0, 0.0),
        &SelectionPolicy::default(),
    )
    .expect("kit found");
    assert_eq!(r.kit.id, "s-15");
    assert_eq!(r.alternative.map(|k| k.id), Some("s-5".to_string()));
    assert_eq!(r.fit, KitFit::Acceptable);
}

#[test]
fn storage_sizing_uses_battery_kits_only() {
    let catalog = KitCatalog::from_toml_str(SMALL_CATALOG).expect("catalog parses");
    let r = recommend_kit(
        &catalog,
        &OptimalSizing::new(3.0, 10.0, 5.0),
        &SelectionPolicy::default(),
    )
    .expect("kit found");
    assert_eq!(r.kit.id, "s-15b");
    assert!(r.alternative.is_none());
    assert_eq!(r.fit, KitFit::CustomRecommended);
}

#[test]
fn oversized_request_flags_catalog_limit() {
    let catalog = KitCatalog::from_toml_str(SMALL_CATALOG).expect("catalog parses");
    for strategy in [SelectionStrategy::PreferOversize, SelectionStrategy::Nearest] {
        let policy = SelectionPolicy {
            strategy,
            ..SelectionPolicy::default()
        };
        let r = recommend_kit(&catalog, &OptimalSizing::new(40.0, 0.0, 0.0), &policy)
            .expect("kit found");
        assert_eq!(r.kit.id, "s-15");
        assert_eq!(r.fit, KitFit::ExceedsCatalog);
        assert!(r.oversize_pct < 0.0);
        assert!(r.price_delta < 0.0);
    }
}

#[test]
fn malformed_catalog_is_rejected() {
    assert!(matches!(
        KitCatalog::from_toml_str("[[kits]]\nid = \"x\"\n"),
        Err(EconError::Catalog(_))
    ));
}

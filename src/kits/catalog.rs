//! Read-only registry of pre-engineered standard kits.

use serde::{Deserialize, Serialize};

use crate::error::EconError;

/// Text carried in both catalog languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bilingual {
    pub fr: String,
    pub en: String,
}

impl Bilingual {
    pub fn new(fr: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            fr: fr.into(),
            en: en.into(),
        }
    }
}

/// Target market segment of a kit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketTier {
    Residential,
    SmallCommercial,
    Commercial,
    Industrial,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandardKit {
    pub id: String,
    pub name: Bilingual,
    pub pv_kw: f64,
    #[serde(default)]
    pub battery_kwh: f64,
    #[serde(default)]
    pub battery_kw: f64,
    /// Fixed installed price ($).
    pub base_price: f64,
    /// Reference price per PV watt ($/W).
    pub price_per_watt: f64,
    pub tier: MarketTier,
    #[serde(default)]
    pub features: Vec<Bilingual>,
}

impl StandardKit {
    /// Returns `true` when the kit ships with a battery.
    pub fn has_storage(&self) -> bool {
        self.battery_kwh > 0.0 || self.battery_kw > 0.0
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    kits: Vec<StandardKit>,
}

/// Immutable kit list handed to the recommender by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct KitCatalog {
    kits: Vec<StandardKit>,
}

impl KitCatalog {
    pub fn new(kits: Vec<StandardKit>) -> Self {
        Self { kits }
    }

    /// Parses a catalog from TOML (`[[kits]]` tables).
    ///
    /// # Errors
    ///
    /// Returns [`EconError::Catalog`] for malformed TOML, a duplicated id or
    /// a non-positive PV size, and [`EconError::EmptyCatalog`] when no kit
    /// is listed.
    pub fn from_toml_str(s: &str) -> Result<Self, EconError> {
        let file: CatalogFile = toml::from_str(s).map_err(|e| EconError::Catalog(e.to_string()))?;
        if file.kits.is_empty() {
            return Err(EconError::EmptyCatalog);
        }
        for (i, kit) in file.kits.iter().enumerate() {
            if kit.pv_kw <= 0.0 {
                return Err(EconError::Catalog(format!(
                    "kit \"{}\" must have pv_kw > 0",
                    kit.id
                )));
            }
            if file.kits[..i].iter().any(|k| k.id == kit.id) {
                return Err(EconError::Catalog(format!("duplicate kit id \"{}\"", kit.id)));
            }
        }
        Ok(Self::new(file.kits))
    }

    /// Built-in catalog: five PV-only kits and four PV+storage kits.
    pub fn standard() -> Self {
        let monitoring = Bilingual::new("Surveillance en ligne", "Online monitoring");
        let warranty = Bilingual::new(
            "Garantie de 25 ans sur les modules",
            "25-year module warranty",
        );
        let backup = Bilingual::new("Alimentation de secours", "Backup power");
        let shaving = Bilingual::new("Écrêtage de la pointe", "Peak shaving");

        let pv = |id: &str, kw: f64, price: f64, tier: MarketTier| StandardKit {
            id: id.to_string(),
            name: Bilingual::new(
                format!("Solaire {kw:.0} kW"),
                format!("Solar {kw:.0} kW"),
            ),
            pv_kw: kw,
            battery_kwh: 0.0,
            battery_kw: 0.0,
            base_price: price,
            price_per_watt: price / (kw * 1000.0),
            tier,
            features: vec![monitoring.clone(), warranty.clone()],
        };
        let hybrid = |id: &str, kw: f64, kwh: f64, bkw: f64, price: f64, tier: MarketTier| {
            StandardKit {
                id: id.to_string(),
                name: Bilingual::new(
                    format!("Solaire {kw:.0} kW + stockage {kwh:.0} kWh"),
                    format!("Solar {kw:.0} kW + {kwh:.0} kWh storage"),
                ),
                pv_kw: kw,
                battery_kwh: kwh,
                battery_kw: bkw,
                base_price: price,
                price_per_watt: price / (kw * 1000.0),
                tier,
                features: vec![
                    monitoring.clone(),
                    warranty.clone(),
                    backup.clone(),
                    shaving.clone(),
                ],
            }
        };

        Self::new(vec![
            pv("pv-10", 10.0, 23_000.0, MarketTier::Residential),
            pv("pv-25", 25.0, 53_750.0, MarketTier::SmallCommercial),
            pv("pv-50", 50.0, 102_500.0, MarketTier::SmallCommercial),
            pv("pv-100", 100.0, 195_000.0, MarketTier::Commercial),
            pv("pv-200", 200.0, 370_000.0, MarketTier::Industrial),
            hybrid("pvs-10", 10.0, 13.5, 5.0, 32_000.0, MarketTier::Residential),
            hybrid("pvs-50", 50.0, 100.0, 50.0, 170_000.0, MarketTier::SmallCommercial),
            hybrid("pvs-100", 100.0, 200.0, 100.0, 330_000.0, MarketTier::Commercial),
            hybrid("pvs-200", 200.0, 400.0, 200.0, 640_000.0, MarketTier::Industrial),
        ])
    }

    pub fn get(&self, id: &str) -> Option<&StandardKit> {
        self.kits.iter().find(|k| k.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StandardKit> {
        self.kits.iter()
    }

    pub fn kits(&self) -> &[StandardKit] {
        &self.kits
    }

    pub fn is_empty(&self) -> bool {
        self.kits.is_empty()
    }
}

impl Default for KitCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_shape() {
        let catalog = KitCatalog::standard();
        assert_eq!(catalog.iter().filter(|k| !k.has_storage()).count(), 5);
        assert_eq!(catalog.iter().filter(|k| k.has_storage()).count(), 4);
        assert!(catalog.get("pv-50").is_some());
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn ids_are_unique() {
        let catalog = KitCatalog::standard();
        for (i, kit) in catalog.kits().iter().enumerate() {
            assert!(catalog.kits()[..i].iter().all(|k| k.id != kit.id));
        }
    }

    #[test]
    fn toml_catalog_parses() {
        let toml = r#"
[[kits]]
id = "mini"
name = { fr = "Mini", en = "Mini" }
pv_kw = 5.0
base_price = 12000.0
price_per_watt = 2.4
tier = "residential"
"#;
        let catalog = KitCatalog::from_toml_str(toml).expect("catalog parses");
        let kit = catalog.get("mini").expect("kit present");
        assert_eq!(kit.pv_kw, 5.0);
        assert!(!kit.has_storage());
        assert!(kit.features.is_empty());
    }

    #[test]
    fn empty_toml_catalog_rejected() {
        assert!(matches!(
            KitCatalog::from_toml_str("kits = []"),
            Err(EconError::EmptyCatalog)
        ));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let toml = r#"
[[kits]]
id = "a"
name = { fr = "A", en = "A" }
pv_kw = 5.0
base_price = 1.0
price_per_watt = 1.0
tier = "residential"

[[kits]]
id = "a"
name = { fr = "B", en = "B" }
pv_kw = 6.0
base_price = 1.0
price_per_watt = 1.0
tier = "residential"
"#;
        assert!(matches!(
            KitCatalog::from_toml_str(toml),
            Err(EconError::Catalog(_))
        ));
    }
}

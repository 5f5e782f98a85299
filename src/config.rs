use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::types::{DiscountScope, Location};

/// The versioned pricing configuration. Loaded once, passed by reference into
/// every calculation; an updated price sheet is a new value, never an edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub memberships: MembershipTiers,
    #[serde(default)]
    pub discount: DiscountConfig,
    #[serde(default)]
    pub guest: GuestDiscountConfig,
    #[serde(default)]
    pub welcome: WelcomeProgramConfig,
    #[serde(default)]
    pub parking: ParkingRates,
    #[serde(default)]
    pub constraints: Constraints,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdmissionConfig {
    #[serde(default = "default_science_prices")]
    pub science: SitePrices,
    #[serde(default = "default_dpkh_prices")]
    pub dpkh: SitePrices,
    #[serde(default)]
    pub dpkr: TieredSitePrices,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SitePrices {
    pub adult: f64,
    pub child: f64,
    /// Children younger than this enter free.
    pub child_free_age: u8,
}

/// Rockingham prices in two tiers, selected by county residency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TieredSitePrices {
    pub standard: PricePair,
    pub resident: PricePair,
    pub child_free_age: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricePair {
    pub adult: f64,
    pub child: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MembershipTiers {
    #[serde(default = "default_basic_science_price")]
    pub basic_science: f64,
    #[serde(default = "default_basic_dpkh_price")]
    pub basic_dpkh: f64,
    #[serde(default = "default_basic_dpkr_price")]
    pub basic_dpkr: f64,
    #[serde(default = "default_science_kids_price")]
    pub science_kids: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscountConfig {
    #[serde(default = "default_discount_rate")]
    pub current_rate: f64,
    #[serde(default = "default_minimum_members")]
    pub minimum_members: u32,
    #[serde(default = "default_eligible_scopes")]
    pub eligible_scopes: Vec<DiscountScope>,
    #[serde(default)]
    pub promo_banner: PromoBannerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromoBannerConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuestDiscountConfig {
    /// Guest rate at the family's primary location.
    #[serde(default = "default_guest_primary_rate")]
    pub primary_rate: f64,
    /// Guest rate everywhere else.
    #[serde(default = "default_guest_secondary_rate")]
    pub secondary_rate: f64,
    /// (home membership location -> visited location -> rate). An absent
    /// entry means no guest discount applies between that pair.
    #[serde(default = "default_guest_discount_map")]
    pub discount_map: BTreeMap<Location, BTreeMap<Location, f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WelcomeProgramConfig {
    #[serde(default = "default_welcome_membership_price")]
    pub membership_price: f64,
    #[serde(default = "default_welcome_max_people")]
    pub max_people: u32,
    #[serde(default = "default_welcome_max_adults")]
    pub max_adults: u32,
    #[serde(default = "default_welcome_max_children")]
    pub max_children: u32,
    #[serde(default = "default_welcome_single_visit_price")]
    pub single_visit_price: f64,
    #[serde(default = "default_welcome_max_single_visit_group")]
    pub max_single_visit_group: u32,
    #[serde(default = "default_welcome_purchase_links")]
    pub purchase_links: BTreeMap<Location, String>,
    #[serde(default = "default_welcome_info_links")]
    pub info_links: BTreeMap<Location, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParkingRates {
    #[serde(default = "default_standard_parking")]
    pub standard: f64,
    #[serde(default = "default_welcome_parking")]
    pub welcome: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Constraints {
    #[serde(default = "default_max_adults")]
    pub max_adults: u32,
    #[serde(default = "default_max_children")]
    pub max_children: u32,
    #[serde(default = "default_max_visits_per_location")]
    pub max_visits_per_location: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub discount_rate: Option<f64>,
    pub minimum_members: Option<u32>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("rate {value} for {field} is outside [0, 1)")]
    RateOutOfRange { field: String, value: f64 },
    #[error("negative price {value} for {field}")]
    NegativePrice { field: String, value: f64 },
    #[error("{field} must be at least 1")]
    ZeroThreshold { field: String },
    #[error("welcome {kind} links must include a science entry as the fallback")]
    MissingFallbackLink { kind: &'static str },
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/membership-advisor/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(rate) = overrides.discount_rate {
            self.discount.current_rate = rate;
        }
        if let Some(members) = overrides.minimum_members {
            self.discount.minimum_members = members;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    /// Startup validation. A bad rate or price is a config-authoring bug and
    /// must fail loudly before any quote is produced.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        check_rate("discount.current_rate", self.discount.current_rate)?;
        check_rate("guest.primary_rate", self.guest.primary_rate)?;
        check_rate("guest.secondary_rate", self.guest.secondary_rate)?;
        for (home, visited_rates) in &self.guest.discount_map {
            for (visited, rate) in visited_rates {
                check_rate(
                    &format!("guest.discount_map.{}.{}", home.as_slug(), visited.as_slug()),
                    *rate,
                )?;
            }
        }

        check_price("admission.science.adult", self.admission.science.adult)?;
        check_price("admission.science.child", self.admission.science.child)?;
        check_price("admission.dpkh.adult", self.admission.dpkh.adult)?;
        check_price("admission.dpkh.child", self.admission.dpkh.child)?;
        check_price("admission.dpkr.standard.adult", self.admission.dpkr.standard.adult)?;
        check_price("admission.dpkr.standard.child", self.admission.dpkr.standard.child)?;
        check_price("admission.dpkr.resident.adult", self.admission.dpkr.resident.adult)?;
        check_price("admission.dpkr.resident.child", self.admission.dpkr.resident.child)?;
        check_price("memberships.basic_science", self.memberships.basic_science)?;
        check_price("memberships.basic_dpkh", self.memberships.basic_dpkh)?;
        check_price("memberships.basic_dpkr", self.memberships.basic_dpkr)?;
        check_price("memberships.science_kids", self.memberships.science_kids)?;
        check_price("welcome.membership_price", self.welcome.membership_price)?;
        check_price("welcome.single_visit_price", self.welcome.single_visit_price)?;
        check_price("parking.standard", self.parking.standard)?;
        check_price("parking.welcome", self.parking.welcome)?;

        check_threshold("discount.minimum_members", self.discount.minimum_members)?;
        check_threshold("welcome.max_people", self.welcome.max_people)?;
        check_threshold(
            "welcome.max_single_visit_group",
            self.welcome.max_single_visit_group,
        )?;
        check_threshold("constraints.max_adults", self.constraints.max_adults)?;
        check_threshold(
            "constraints.max_visits_per_location",
            self.constraints.max_visits_per_location,
        )?;

        if !self.welcome.purchase_links.contains_key(&Location::Science) {
            return Err(ConfigError::MissingFallbackLink { kind: "purchase" });
        }
        if !self.welcome.info_links.contains_key(&Location::Science) {
            return Err(ConfigError::MissingFallbackLink { kind: "info" });
        }
        Ok(())
    }

    /// (adult, child) admission prices for one visit, with the Rockingham
    /// residency tier already selected.
    pub fn admission_prices(&self, location: Location, is_richmond_resident: bool) -> (f64, f64) {
        match location {
            Location::Science => (self.admission.science.adult, self.admission.science.child),
            Location::Dpkh => (self.admission.dpkh.adult, self.admission.dpkh.child),
            Location::Dpkr => {
                let tier = if is_richmond_resident {
                    &self.admission.dpkr.resident
                } else {
                    &self.admission.dpkr.standard
                };
                (tier.adult, tier.child)
            }
        }
    }

    pub fn child_free_age(&self, location: Location) -> u8 {
        match location {
            Location::Science => self.admission.science.child_free_age,
            Location::Dpkh => self.admission.dpkh.child_free_age,
            Location::Dpkr => self.admission.dpkr.child_free_age,
        }
    }

    /// Annual price of the membership tier anchored at the given scope.
    pub fn tier_price(&self, scope: DiscountScope) -> f64 {
        match scope {
            DiscountScope::Site(Location::Science) => self.memberships.basic_science,
            DiscountScope::Site(Location::Dpkh) => self.memberships.basic_dpkh,
            DiscountScope::Site(Location::Dpkr) => self.memberships.basic_dpkr,
            DiscountScope::ScienceKids => self.memberships.science_kids,
        }
    }

    /// Guest-admission discount rate between a member's home location and a
    /// visited location. Absent entries mean no discount.
    pub fn guest_discount_rate(&self, home: Location, visited: Location) -> f64 {
        self.guest
            .discount_map
            .get(&home)
            .and_then(|rates| rates.get(&visited))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn parking_rate(&self, welcome_context: bool) -> f64 {
        if welcome_context {
            self.parking.welcome
        } else {
            self.parking.standard
        }
    }

    pub fn welcome_purchase_link(&self, location: Location) -> &str {
        resolve_link(&self.welcome.purchase_links, location)
    }

    pub fn welcome_info_link(&self, location: Location) -> &str {
        resolve_link(&self.welcome.info_links, location)
    }

    /// Hash of the canonical serialized form, so a quote can be traced back
    /// to the exact price sheet that produced it.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn default_template() -> String {
        let template = r#"[admission.science]
adult = 24.0
child = 19.0
child_free_age = 2

[admission.dpkh]
adult = 15.0
child = 13.0
child_free_age = 1

[admission.dpkr]
child_free_age = 1

[admission.dpkr.standard]
adult = 10.0
child = 8.0

[admission.dpkr.resident]
adult = 8.0
child = 6.0

[memberships]
basic_science = 209.0
basic_dpkh = 139.0
basic_dpkr = 99.0
science_kids = 279.0

[discount]
current_rate = 0.2
minimum_members = 5
eligible_scopes = ["science", "dpkh", "science-kids"]

[discount.promo_banner]
title = "Family Membership Sale"
description = "20% off memberships for families of five or more."

[guest]
primary_rate = 0.5
secondary_rate = 0.25

[guest.discount_map.science]
dpkh = 0.5
dpkr = 0.5

[guest.discount_map.dpkh]
science = 0.25
dpkr = 0.5

[guest.discount_map.dpkr]
science = 0.25
dpkh = 0.5

[welcome]
membership_price = 75.0
max_people = 6
max_adults = 2
max_children = 4
single_visit_price = 3.0
max_single_visit_group = 6

[welcome.purchase_links]
science = "https://discoveryplace.org/visit/welcome-program/science"
dpkh = "https://discoveryplace.org/visit/welcome-program/kids-huntersville"
dpkr = "https://discoveryplace.org/visit/welcome-program/kids-rockingham"

[welcome.info_links]
science = "https://discoveryplace.org/welcome-program"
dpkh = "https://discoveryplace.org/welcome-program"
dpkr = "https://discoveryplace.org/welcome-program"

[parking]
standard = 10.0
welcome = 8.0

[constraints]
max_adults = 6
max_children = 8
max_visits_per_location = 20
"#;
        template.to_string()
    }
}

fn resolve_link(links: &BTreeMap<Location, String>, location: Location) -> &str {
    links
        .get(&location)
        .or_else(|| links.get(&Location::Science))
        .map(String::as_str)
        .unwrap_or("")
}

fn check_rate(field: &str, value: f64) -> std::result::Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..1.0).contains(&value) {
        return Err(ConfigError::RateOutOfRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_price(field: &str, value: f64) -> std::result::Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::NegativePrice {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_threshold(field: &str, value: u32) -> std::result::Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::ZeroThreshold {
            field: field.to_string(),
        });
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admission: AdmissionConfig::default(),
            memberships: MembershipTiers::default(),
            discount: DiscountConfig::default(),
            guest: GuestDiscountConfig::default(),
            welcome: WelcomeProgramConfig::default(),
            parking: ParkingRates::default(),
            constraints: Constraints::default(),
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            science: default_science_prices(),
            dpkh: default_dpkh_prices(),
            dpkr: TieredSitePrices::default(),
        }
    }
}

impl Default for TieredSitePrices {
    fn default() -> Self {
        Self {
            standard: PricePair {
                adult: 10.0,
                child: 8.0,
            },
            resident: PricePair {
                adult: 8.0,
                child: 6.0,
            },
            child_free_age: 1,
        }
    }
}

impl Default for MembershipTiers {
    fn default() -> Self {
        Self {
            basic_science: default_basic_science_price(),
            basic_dpkh: default_basic_dpkh_price(),
            basic_dpkr: default_basic_dpkr_price(),
            science_kids: default_science_kids_price(),
        }
    }
}

impl Default for DiscountConfig {
    fn default() -> Self {
        Self {
            current_rate: default_discount_rate(),
            minimum_members: default_minimum_members(),
            eligible_scopes: default_eligible_scopes(),
            promo_banner: PromoBannerConfig::default(),
        }
    }
}

impl Default for PromoBannerConfig {
    fn default() -> Self {
        Self {
            title: "Family Membership Sale".to_string(),
            description: "20% off memberships for families of five or more.".to_string(),
        }
    }
}

impl Default for GuestDiscountConfig {
    fn default() -> Self {
        Self {
            primary_rate: default_guest_primary_rate(),
            secondary_rate: default_guest_secondary_rate(),
            discount_map: default_guest_discount_map(),
        }
    }
}

impl Default for WelcomeProgramConfig {
    fn default() -> Self {
        Self {
            membership_price: default_welcome_membership_price(),
            max_people: default_welcome_max_people(),
            max_adults: default_welcome_max_adults(),
            max_children: default_welcome_max_children(),
            single_visit_price: default_welcome_single_visit_price(),
            max_single_visit_group: default_welcome_max_single_visit_group(),
            purchase_links: default_welcome_purchase_links(),
            info_links: default_welcome_info_links(),
        }
    }
}

impl Default for ParkingRates {
    fn default() -> Self {
        Self {
            standard: default_standard_parking(),
            welcome: default_welcome_parking(),
        }
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_adults: default_max_adults(),
            max_children: default_max_children(),
            max_visits_per_location: default_max_visits_per_location(),
        }
    }
}

fn default_science_prices() -> SitePrices {
    SitePrices {
        adult: 24.0,
        child: 19.0,
        child_free_age: 2,
    }
}

fn default_dpkh_prices() -> SitePrices {
    SitePrices {
        adult: 15.0,
        child: 13.0,
        child_free_age: 1,
    }
}

fn default_basic_science_price() -> f64 {
    209.0
}

fn default_basic_dpkh_price() -> f64 {
    139.0
}

fn default_basic_dpkr_price() -> f64 {
    99.0
}

fn default_science_kids_price() -> f64 {
    279.0
}

fn default_discount_rate() -> f64 {
    0.2
}

fn default_minimum_members() -> u32 {
    5
}

fn default_eligible_scopes() -> Vec<DiscountScope> {
    vec![
        DiscountScope::Site(Location::Science),
        DiscountScope::Site(Location::Dpkh),
        DiscountScope::ScienceKids,
    ]
}

fn default_guest_primary_rate() -> f64 {
    0.5
}

fn default_guest_secondary_rate() -> f64 {
    0.25
}

fn default_guest_discount_map() -> BTreeMap<Location, BTreeMap<Location, f64>> {
    let mut map = BTreeMap::new();
    map.insert(
        Location::Science,
        BTreeMap::from([(Location::Dpkh, 0.5), (Location::Dpkr, 0.5)]),
    );
    map.insert(
        Location::Dpkh,
        BTreeMap::from([(Location::Science, 0.25), (Location::Dpkr, 0.5)]),
    );
    map.insert(
        Location::Dpkr,
        BTreeMap::from([(Location::Science, 0.25), (Location::Dpkh, 0.5)]),
    );
    map
}

fn default_welcome_membership_price() -> f64 {
    75.0
}

fn default_welcome_max_people() -> u32 {
    6
}

fn default_welcome_max_adults() -> u32 {
    2
}

fn default_welcome_max_children() -> u32 {
    4
}

fn default_welcome_single_visit_price() -> f64 {
    3.0
}

fn default_welcome_max_single_visit_group() -> u32 {
    6
}

fn default_welcome_purchase_links() -> BTreeMap<Location, String> {
    BTreeMap::from([
        (
            Location::Science,
            "https://discoveryplace.org/visit/welcome-program/science".to_string(),
        ),
        (
            Location::Dpkh,
            "https://discoveryplace.org/visit/welcome-program/kids-huntersville".to_string(),
        ),
        (
            Location::Dpkr,
            "https://discoveryplace.org/visit/welcome-program/kids-rockingham".to_string(),
        ),
    ])
}

fn default_welcome_info_links() -> BTreeMap<Location, String> {
    BTreeMap::from([
        (
            Location::Science,
            "https://discoveryplace.org/welcome-program".to_string(),
        ),
        (
            Location::Dpkh,
            "https://discoveryplace.org/welcome-program".to_string(),
        ),
        (
            Location::Dpkr,
            "https://discoveryplace.org/welcome-program".to_string(),
        ),
    ])
}

fn default_standard_parking() -> f64 {
    10.0
}

fn default_welcome_parking() -> f64 {
    8.0
}

fn default_max_adults() -> u32 {
    6
}

fn default_max_children() -> u32 {
    8
}

fn default_max_visits_per_location() -> u32 {
    20
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError};
    use crate::types::Location;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn template_round_trips_to_default() {
        let parsed: Config = toml::from_str(&Config::default_template()).expect("template parses");
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn rejects_rate_outside_unit_interval() {
        let mut config = Config::default();
        config.discount.current_rate = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RateOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_negative_price() {
        let mut config = Config::default();
        config.memberships.basic_dpkr = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativePrice { .. })
        ));
    }

    #[test]
    fn absent_guest_discount_entry_means_zero() {
        let mut config = Config::default();
        config.guest.discount_map.clear();
        assert_eq!(
            config.guest_discount_rate(Location::Science, Location::Dpkh),
            0.0
        );
    }

    #[test]
    fn fingerprint_is_stable_for_equal_configs() {
        assert_eq!(Config::default().fingerprint(), Config::default().fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_prices() {
        let mut config = Config::default();
        config.memberships.basic_science += 10.0;
        assert_ne!(config.fingerprint(), Config::default().fingerprint());
    }
}

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::Config;

/// A physical Discovery Place site.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Science,
    Dpkh,
    Dpkr,
}

impl Location {
    pub const ALL: [Location; 3] = [Location::Science, Location::Dpkh, Location::Dpkr];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Science => "science",
            Self::Dpkh => "dpkh",
            Self::Dpkr => "dpkr",
        }
    }

    /// Full public-facing site name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Science => "Discovery Place Science",
            Self::Dpkh => "Discovery Place Kids-Huntersville",
            Self::Dpkr => "Discovery Place Kids-Rockingham",
        }
    }

    pub fn short_label(&self) -> &'static str {
        match self {
            Self::Science => "Science",
            Self::Dpkh => "Kids-Huntersville",
            Self::Dpkr => "Kids-Rockingham",
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Science => "Science",
            Self::Dpkh => "DPKH",
            Self::Dpkr => "DPKR",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown location: {0}")]
pub struct LocationParseError(pub String);

impl FromStr for Location {
    type Err = LocationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "science" => Ok(Self::Science),
            "dpkh" | "kids-huntersville" | "huntersville" => Ok(Self::Dpkh),
            "dpkr" | "kids-rockingham" | "rockingham" => Ok(Self::Dpkr),
            _ => Err(LocationParseError(s.to_string())),
        }
    }
}

/// Key space of the promotional-discount eligibility set: a single site, or
/// the all-locations combo as its own aggregate scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiscountScope {
    Site(Location),
    ScienceKids,
}

impl DiscountScope {
    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Site(location) => location.as_slug(),
            Self::ScienceKids => "science-kids",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Site(location) => location.label(),
            Self::ScienceKids => "All Discovery Place Locations",
        }
    }
}

impl Display for DiscountScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Site(location) => write!(f, "{location}"),
            Self::ScienceKids => write!(f, "ScienceKids"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown discount scope: {0}")]
pub struct DiscountScopeParseError(pub String);

impl FromStr for DiscountScope {
    type Err = DiscountScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "science-kids" | "sciencekids" | "combo" => Ok(Self::ScienceKids),
            _ => Location::from_str(&normalized)
                .map(Self::Site)
                .map_err(|_| DiscountScopeParseError(s.to_string())),
        }
    }
}

// Serialized as the bare slug so config lists read as plain strings.
impl Serialize for DiscountScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_slug())
    }
}

impl<'de> Deserialize<'de> for DiscountScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DiscountScope::from_str(&raw).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WelcomeMode {
    Membership,
    SingleVisit,
}

/// The closed set of candidate plans the recommender prices.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MembershipOption {
    BasicSingleSite(Location),
    ScienceKidsCombo,
    Welcome(WelcomeMode),
    PayAsYouGo,
}

impl MembershipOption {
    /// Scope used for promotional-discount eligibility. Welcome and
    /// pay-as-you-go sit outside the discount program entirely.
    pub fn discount_scope(&self) -> Option<DiscountScope> {
        match self {
            Self::BasicSingleSite(location) => Some(DiscountScope::Site(*location)),
            Self::ScienceKidsCombo => Some(DiscountScope::ScienceKids),
            Self::Welcome(_) | Self::PayAsYouGo => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::BasicSingleSite(location) => format!("{} Basic Membership", location.label()),
            Self::ScienceKidsCombo => "Science + Kids Membership (all locations)".to_string(),
            Self::Welcome(WelcomeMode::Membership) => {
                "Discovery Place Welcome Program Membership".to_string()
            }
            Self::Welcome(WelcomeMode::SingleVisit) => {
                "Discovery Place Welcome Program Single Visit".to_string()
            }
            Self::PayAsYouGo => "Regular Admission (no membership)".to_string(),
        }
    }
}

impl Display for MembershipOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BasicSingleSite(location) => write!(f, "Basic-{location}"),
            Self::ScienceKidsCombo => write!(f, "ScienceKids"),
            Self::Welcome(WelcomeMode::Membership) => write!(f, "Welcome"),
            Self::Welcome(WelcomeMode::SingleVisit) => write!(f, "WelcomeAdmission"),
            Self::PayAsYouGo => write!(f, "PayAsYouGo"),
        }
    }
}

/// One line of a cost breakdown. Negative cost denotes a saving.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostLineItem {
    pub label: String,
    pub cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_items: Vec<CostSubItem>,
}

impl CostLineItem {
    pub fn new(label: impl Into<String>, cost: f64) -> Self {
        Self {
            label: label.into(),
            cost,
            details: None,
            sub_items: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_sub_items(mut self, sub_items: Vec<CostSubItem>) -> Self {
        self.sub_items = sub_items;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostSubItem {
    pub label: String,
    pub saving: f64,
}

/// The single boundary input record: family composition, visit plan, and
/// eligibility flags, exactly as the surrounding form collects them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteRequest {
    pub adult_count: u32,
    pub children_count: u32,
    #[serde(default)]
    pub child_ages: Vec<u8>,
    #[serde(default)]
    pub science_visits: u32,
    #[serde(default)]
    pub dpkh_visits: u32,
    #[serde(default)]
    pub dpkr_visits: u32,
    #[serde(default)]
    pub is_richmond_resident: bool,
    #[serde(default)]
    pub needs_flexibility: bool,
    #[serde(default)]
    pub is_welcome_eligible: bool,
    #[serde(default)]
    pub include_parking: bool,
}

impl QuoteRequest {
    pub fn total_family_members(&self) -> u32 {
        self.adult_count + self.children_count
    }

    pub fn visits(&self, location: Location) -> u32 {
        match location {
            Location::Science => self.science_visits,
            Location::Dpkh => self.dpkh_visits,
            Location::Dpkr => self.dpkr_visits,
        }
    }

    /// Boundary validation. The engine assumes these invariants hold; the CLI
    /// and the API reject violations before calling in.
    pub fn validate(&self, config: &Config) -> Result<(), InvalidInput> {
        if self.adult_count == 0 {
            return Err(InvalidInput::NoAdults);
        }
        if self.child_ages.len() != self.children_count as usize {
            return Err(InvalidInput::ChildAgesMismatch {
                expected: self.children_count,
                actual: self.child_ages.len(),
            });
        }
        for &age in &self.child_ages {
            if age > 17 {
                return Err(InvalidInput::ChildAgeOutOfRange(age));
            }
        }
        if self.adult_count > config.constraints.max_adults {
            return Err(InvalidInput::TooManyAdults {
                max: config.constraints.max_adults,
            });
        }
        if self.children_count > config.constraints.max_children {
            return Err(InvalidInput::TooManyChildren {
                max: config.constraints.max_children,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("at least one adult is required")]
    NoAdults,
    #[error("child ages count ({actual}) does not match children count ({expected})")]
    ChildAgesMismatch { expected: u32, actual: usize },
    #[error("child age {0} is outside the supported range 0-17")]
    ChildAgeOutOfRange(u8),
    #[error("adult count exceeds the supported maximum of {max}")]
    TooManyAdults { max: u32 },
    #[error("children count exceeds the supported maximum of {max}")]
    TooManyChildren { max: u32 },
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{DiscountScope, InvalidInput, Location, QuoteRequest};
    use crate::config::Config;

    fn base_request() -> QuoteRequest {
        QuoteRequest {
            adult_count: 2,
            children_count: 2,
            child_ages: vec![5, 7],
            science_visits: 4,
            dpkh_visits: 2,
            dpkr_visits: 0,
            is_richmond_resident: false,
            needs_flexibility: false,
            is_welcome_eligible: false,
            include_parking: true,
        }
    }

    #[test]
    fn parses_location_aliases() {
        assert_eq!(Location::from_str("science").unwrap(), Location::Science);
        assert_eq!(
            Location::from_str("Kids-Huntersville").unwrap(),
            Location::Dpkh
        );
        assert_eq!(Location::from_str("DPKR").unwrap(), Location::Dpkr);
        assert!(Location::from_str("uptown").is_err());
    }

    #[test]
    fn parses_discount_scopes() {
        assert_eq!(
            DiscountScope::from_str("science-kids").unwrap(),
            DiscountScope::ScienceKids
        );
        assert_eq!(
            DiscountScope::from_str("dpkh").unwrap(),
            DiscountScope::Site(Location::Dpkh)
        );
    }

    #[test]
    fn rejects_mismatched_child_ages() {
        let config = Config::default();
        let mut request = base_request();
        request.child_ages = vec![5];
        assert_eq!(
            request.validate(&config),
            Err(InvalidInput::ChildAgesMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn rejects_out_of_range_age() {
        let config = Config::default();
        let mut request = base_request();
        request.child_ages = vec![5, 19];
        assert!(request.validate(&config).is_err());
    }

    #[test]
    fn accepts_well_formed_request() {
        let config = Config::default();
        assert!(base_request().validate(&config).is_ok());
    }
}

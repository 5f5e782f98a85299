pub mod admission;
pub mod calculator;
pub mod discount;

use serde::{Deserialize, Serialize};

use crate::types::{CostLineItem, Location, MembershipOption};

/// Guest-admission savings a membership would unlock across the network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuestSavings {
    pub total: f64,
    pub breakdown: Vec<CostLineItem>,
    pub primary_location: Location,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromoBanner {
    pub title: String,
    pub description: String,
    pub discount_rate: f64,
    pub active: bool,
}

/// Welcome Program quote, either annual membership or single-visit pricing.
/// The comparison fields are only populated in membership mode; a single
/// visit is not an annual total and has nothing to compare against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WelcomeQuote {
    pub membership_type: MembershipOption,
    pub label: String,
    pub location: Location,
    pub location_label: String,
    pub people_included: u32,
    pub max_people: u32,
    pub base_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_person: Option<f64>,
    pub parking_cost: f64,
    pub cross_location_cost: f64,
    pub total_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_admission_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings_percentage: Option<u32>,
    pub purchase_link: String,
    pub info_link: String,
    pub explanation: String,
    pub cost_breakdown: Vec<CostLineItem>,
}

/// The engine's output record: one fully priced recommendation plus the
/// comparative context the caller renders. A fresh value on every call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub best_membership_type: MembershipOption,
    pub best_membership_label: String,
    pub primary_location: Location,
    pub base_membership_price: f64,
    /// Price after the promotional discount; equals the base price when the
    /// family is not eligible.
    pub base_membership_discount: f64,
    pub discount_eligible: bool,
    pub total_family_members: u32,
    pub additional_costs: Vec<CostLineItem>,
    pub general_admission_costs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_admission_note: Option<String>,
    pub total_price: f64,
    /// What the same visit plan would cost with no membership at all.
    pub regular_admission_cost: f64,
    pub best_membership_savings: f64,
    pub savings_percentage: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_program_option: Option<WelcomeQuote>,
    pub cost_breakdown: Vec<CostLineItem>,
}

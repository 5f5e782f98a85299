use crate::config::Config;
use crate::pricing::{admission, discount, Recommendation};
use crate::types::{
    CostLineItem, DiscountScope, Location, MembershipOption, QuoteRequest, WelcomeMode,
};

/// One candidate plan, fully priced: discounted base, mandatory add-ons, and
/// guest admission for the sites the plan does not cover.
#[derive(Debug, Clone)]
struct PricedCandidate {
    option: MembershipOption,
    label: String,
    base_price: f64,
    discounted_price: f64,
    discount_eligible: bool,
    additional_costs: Vec<CostLineItem>,
    general_admission_costs: f64,
    general_admission_note: Option<String>,
    total: f64,
}

/// The single entry point: turns one input record into one recommendation.
/// A pure function of (config, request); identical inputs yield structurally
/// identical output.
pub fn calculate_membership_costs(config: &Config, request: &QuoteRequest) -> Recommendation {
    let request = clamp_family(config, request);
    let primary_location = admission::determine_primary_location(
        request.science_visits,
        request.dpkh_visits,
        request.dpkr_visits,
    );

    // Fixed preference order; a later candidate must be strictly cheaper to
    // displace an earlier one, so the first-listed plan wins exact ties.
    let mut candidates = vec![
        MembershipOption::BasicSingleSite(Location::Science),
        MembershipOption::BasicSingleSite(Location::Dpkh),
        MembershipOption::BasicSingleSite(Location::Dpkr),
        MembershipOption::ScienceKidsCombo,
    ];
    if request.is_welcome_eligible {
        candidates.push(MembershipOption::Welcome(WelcomeMode::Membership));
    }
    candidates.push(MembershipOption::PayAsYouGo);

    let priced: Vec<PricedCandidate> = candidates
        .into_iter()
        .map(|option| price_candidate(config, &request, primary_location, option))
        .collect();

    let mut best = &priced[0];
    for candidate in &priced[1..] {
        if candidate.total < best.total {
            best = candidate;
        }
    }

    let regular_admission_cost = pay_as_you_go_total(config, &request);
    let best_membership_savings = (regular_admission_cost - best.total).max(0.0);
    let savings_percentage = if regular_admission_cost > 0.0 {
        ((best_membership_savings / regular_admission_cost) * 100.0)
            .round()
            .min(90.0) as u32
    } else {
        0
    };

    let welcome_program_option = if request.is_welcome_eligible
        && !matches!(best.option, MembershipOption::Welcome(_))
    {
        let mode = if request.needs_flexibility {
            WelcomeMode::SingleVisit
        } else {
            WelcomeMode::Membership
        };
        Some(discount::welcome_program_pricing(
            config,
            &request,
            mode,
            primary_location,
        ))
    } else {
        None
    };

    let mut cost_breakdown = Vec::new();
    let mut membership_line = CostLineItem::new(best.label.clone(), best.discounted_price);
    if best.discount_eligible {
        membership_line = membership_line.with_details(format!(
            "{:.0}% discount applied (was ${:.2})",
            config.discount.current_rate * 100.0,
            best.base_price
        ));
    }
    cost_breakdown.push(membership_line);
    cost_breakdown.extend(best.additional_costs.iter().cloned());
    if best.general_admission_costs > 0.0 {
        let mut line =
            CostLineItem::new("General admission (other locations)", best.general_admission_costs);
        if let Some(note) = &best.general_admission_note {
            line = line.with_details(note.clone());
        }
        cost_breakdown.push(line);
    }

    Recommendation {
        best_membership_type: best.option,
        best_membership_label: best.label.clone(),
        primary_location,
        base_membership_price: best.base_price,
        base_membership_discount: best.discounted_price,
        discount_eligible: best.discount_eligible,
        total_family_members: request.total_family_members(),
        additional_costs: best.additional_costs.clone(),
        general_admission_costs: best.general_admission_costs,
        general_admission_note: best.general_admission_note.clone(),
        total_price: best.total,
        regular_admission_cost,
        best_membership_savings,
        savings_percentage,
        welcome_program_option,
        cost_breakdown,
    }
}

fn price_candidate(
    config: &Config,
    request: &QuoteRequest,
    primary_location: Location,
    option: MembershipOption,
) -> PricedCandidate {
    match option {
        MembershipOption::BasicSingleSite(site) => price_membership_tier(
            config,
            request,
            primary_location,
            option,
            DiscountScope::Site(site),
        ),
        MembershipOption::ScienceKidsCombo => price_membership_tier(
            config,
            request,
            primary_location,
            option,
            DiscountScope::ScienceKids,
        ),
        MembershipOption::Welcome(mode) => {
            let quote = discount::welcome_program_pricing(config, request, mode, primary_location);
            let additional_costs = if quote.parking_cost > 0.0 {
                vec![CostLineItem::new("Parking at Science", quote.parking_cost)
                    .with_details(format!(
                        "{} visits x ${:.0} per visit",
                        request.science_visits, config.parking.welcome
                    ))]
            } else {
                Vec::new()
            };
            let general_admission_note = if quote.cross_location_cost > 0.0 {
                Some(format!(
                    "Cross-location visits at ${:.0} per person",
                    config.welcome.single_visit_price
                ))
            } else {
                None
            };
            PricedCandidate {
                option,
                label: quote.label.clone(),
                base_price: quote.base_price,
                discounted_price: quote.base_price,
                discount_eligible: false,
                additional_costs,
                general_admission_costs: quote.cross_location_cost,
                general_admission_note,
                total: quote.total_price,
            }
        }
        MembershipOption::PayAsYouGo => {
            let admission_total = admission::regular_admission_cost(config, request);
            let additional_costs = standard_parking_line(config, request);
            let add_on_total: f64 = additional_costs.iter().map(|item| item.cost).sum();
            PricedCandidate {
                option,
                label: option.label(),
                base_price: admission_total,
                discounted_price: admission_total,
                discount_eligible: false,
                additional_costs,
                general_admission_costs: 0.0,
                general_admission_note: None,
                total: admission_total + add_on_total,
            }
        }
    }
}

fn price_membership_tier(
    config: &Config,
    request: &QuoteRequest,
    primary_location: Location,
    option: MembershipOption,
    scope: DiscountScope,
) -> PricedCandidate {
    let base_price = config.tier_price(scope);
    let members = request.total_family_members();
    let discount_eligible = discount::is_eligible_for_discount(config, members, scope);
    let discounted_price = discount::apply_discount(config, base_price, members, scope);

    let additional_costs = standard_parking_line(config, request);
    let (general_admission_costs, general_admission_note) =
        discount::guest_admission_cost(config, request, primary_location, option);

    let add_on_total: f64 = additional_costs.iter().map(|item| item.cost).sum();
    PricedCandidate {
        option,
        label: option.label(),
        base_price,
        discounted_price,
        discount_eligible,
        additional_costs,
        general_admission_costs,
        general_admission_note,
        total: discounted_price + add_on_total + general_admission_costs,
    }
}

fn standard_parking_line(config: &Config, request: &QuoteRequest) -> Vec<CostLineItem> {
    if !request.include_parking || request.science_visits == 0 {
        return Vec::new();
    }
    let cost = admission::parking_cost(config, request.science_visits, false);
    vec![CostLineItem::new("Parking at Science", cost).with_details(format!(
        "{} visits x ${:.0} per visit",
        request.science_visits, config.parking.standard
    ))]
}

/// What the whole visit plan costs with no membership: admission plus
/// standard-rate parking for Science visits.
fn pay_as_you_go_total(config: &Config, request: &QuoteRequest) -> f64 {
    let mut total = admission::regular_admission_cost(config, request);
    if request.include_parking {
        total += admission::parking_cost(config, request.science_visits, false);
    }
    total
}

/// Family sizes outside the configured maxima are clamped, not rejected;
/// range validation happens at the CLI/API boundary.
fn clamp_family(config: &Config, request: &QuoteRequest) -> QuoteRequest {
    let mut clamped = request.clone();
    clamped.adult_count = clamped.adult_count.clamp(1, config.constraints.max_adults);
    clamped.children_count = clamped.children_count.min(config.constraints.max_children);
    clamped
        .child_ages
        .truncate(clamped.children_count as usize);
    clamped
}

#[cfg(test)]
mod tests {
    use super::calculate_membership_costs;
    use crate::config::Config;
    use crate::types::{Location, MembershipOption, QuoteRequest, WelcomeMode};

    fn request() -> QuoteRequest {
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
    fn family_of_four_gets_combo_without_discount() {
        let config = Config::default();
        let rec = calculate_membership_costs(&config, &request());

        assert_eq!(rec.primary_location, Location::Science);
        assert!(!rec.discount_eligible);
        assert_eq!(rec.total_family_members, 4);
        // Combo 279 + parking 40 beats Basic-Science 209 + 40 + 84 guest.
        assert_eq!(rec.best_membership_type, MembershipOption::ScienceKidsCombo);
        assert_eq!(rec.base_membership_price, 279.0);
        assert_eq!(rec.base_membership_discount, 279.0);
        assert_eq!(rec.total_price, 319.0);
        assert_eq!(rec.regular_admission_cost, 496.0);
        assert_eq!(rec.best_membership_savings, 177.0);
        assert_eq!(rec.savings_percentage, 36);
        assert!(rec.welcome_program_option.is_none());
    }

    #[test]
    fn fifth_member_flips_discount_eligibility() {
        let config = Config::default();
        let mut r = request();
        r.adult_count = 3;
        let rec = calculate_membership_costs(&config, &r);

        assert!(rec.discount_eligible);
        assert!(rec.base_membership_discount < rec.base_membership_price);
        // round(279 * 0.8), applied exactly once.
        assert_eq!(rec.base_membership_discount, 223.0);
        assert_eq!(rec.cost_breakdown[0].cost, 223.0);
    }

    #[test]
    fn welcome_family_with_no_visits_keeps_welcome_option_attached() {
        let config = Config::default();
        let mut r = request();
        r.science_visits = 0;
        r.dpkh_visits = 0;
        r.dpkr_visits = 0;
        r.is_welcome_eligible = true;
        let rec = calculate_membership_costs(&config, &r);

        // Nothing planned costs nothing: pay-as-you-go wins at zero.
        assert_eq!(rec.best_membership_type, MembershipOption::PayAsYouGo);
        assert_eq!(rec.total_price, 0.0);
        assert_eq!(rec.savings_percentage, 0);

        let welcome = rec.welcome_program_option.expect("welcome option attached");
        assert_eq!(welcome.base_price, 75.0);
        assert_eq!(welcome.parking_cost, 0.0);
        assert_eq!(welcome.cross_location_cost, 0.0);
        assert_eq!(welcome.total_price, 75.0);
    }

    #[test]
    fn flexibility_switches_welcome_option_to_single_visit() {
        let config = Config::default();
        let mut r = request();
        r.is_welcome_eligible = true;
        r.needs_flexibility = true;
        let rec = calculate_membership_costs(&config, &r);
        let welcome = rec.welcome_program_option.expect("welcome option attached");
        assert_eq!(
            welcome.membership_type,
            MembershipOption::Welcome(WelcomeMode::SingleVisit)
        );
        assert_eq!(welcome.price_per_person, Some(3.0));
    }

    #[test]
    fn resident_pricing_flows_into_the_baseline() {
        let config = Config::default();
        let mut r = request();
        r.science_visits = 0;
        r.dpkh_visits = 0;
        r.dpkr_visits = 2;
        r.is_richmond_resident = true;
        let rec = calculate_membership_costs(&config, &r);

        // Two resident-tier DPKR visits: 2 * (2*8 + 2*6) = 56, no parking.
        assert_eq!(rec.regular_admission_cost, 56.0);
        assert_eq!(rec.best_membership_type, MembershipOption::PayAsYouGo);
    }

    #[test]
    fn ties_prefer_the_first_listed_plan() {
        let mut config = Config::default();
        config.memberships.basic_science = 100.0;
        config.memberships.science_kids = 100.0;
        let r = QuoteRequest {
            adult_count: 6,
            children_count: 0,
            child_ages: vec![],
            science_visits: 1,
            dpkh_visits: 0,
            dpkr_visits: 0,
            is_richmond_resident: false,
            needs_flexibility: false,
            is_welcome_eligible: false,
            include_parking: false,
        };
        let rec = calculate_membership_costs(&config, &r);
        // Basic-Science and the combo both total 80 after discount; the
        // single-site plan is listed first and keeps the tie.
        assert_eq!(
            rec.best_membership_type,
            MembershipOption::BasicSingleSite(Location::Science)
        );
        assert_eq!(rec.total_price, 80.0);
    }

    #[test]
    fn results_are_referentially_transparent() {
        let config = Config::default();
        let mut r = request();
        r.is_welcome_eligible = true;
        let a = calculate_membership_costs(&config, &r);
        let b = calculate_membership_costs(&config, &r);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn all_monetary_outputs_are_non_negative() {
        let config = Config::default();
        let requests = [
            request(),
            QuoteRequest {
                adult_count: 1,
                children_count: 0,
                child_ages: vec![],
                science_visits: 0,
                dpkh_visits: 0,
                dpkr_visits: 0,
                is_richmond_resident: false,
                needs_flexibility: false,
                is_welcome_eligible: true,
                include_parking: false,
            },
            QuoteRequest {
                adult_count: 6,
                children_count: 8,
                child_ages: vec![0, 1, 2, 3, 9, 11, 15, 17],
                science_visits: 70,
                dpkh_visits: 70,
                dpkr_visits: 70,
                is_richmond_resident: true,
                needs_flexibility: true,
                is_welcome_eligible: true,
                include_parking: true,
            },
        ];
        for r in requests {
            let rec = calculate_membership_costs(&config, &r);
            assert!(rec.base_membership_price >= 0.0);
            assert!(rec.base_membership_discount >= 0.0);
            assert!(rec.general_admission_costs >= 0.0);
            assert!(rec.total_price >= 0.0);
            assert!(rec.regular_admission_cost >= 0.0);
            assert!(rec.best_membership_savings >= 0.0);
            assert!(rec.savings_percentage <= 90);
            for item in &rec.additional_costs {
                assert!(item.cost >= 0.0);
            }
        }
    }

    #[test]
    fn oversized_families_are_clamped_not_rejected() {
        let config = Config::default();
        let mut r = request();
        r.adult_count = 40;
        r.children_count = 40;
        r.child_ages = vec![5; 40];
        let rec = calculate_membership_costs(&config, &r);
        assert_eq!(
            rec.total_family_members,
            config.constraints.max_adults + config.constraints.max_children
        );
    }

    #[test]
    fn breakdown_mirrors_the_selected_plan() {
        let config = Config::default();
        let rec = calculate_membership_costs(&config, &request());
        // Membership line, then parking; the combo has no guest admission.
        assert_eq!(rec.cost_breakdown.len(), 2);
        assert_eq!(rec.cost_breakdown[0].cost, rec.base_membership_discount);
        assert_eq!(rec.cost_breakdown[1].label, "Parking at Science");
        assert_eq!(rec.cost_breakdown[1].cost, 40.0);
        let total_from_lines: f64 = rec.cost_breakdown.iter().map(|i| i.cost).sum();
        assert_eq!(total_from_lines, rec.total_price);
    }

    #[test]
    fn basic_membership_reports_guest_admission_for_other_sites() {
        let config = Config::default();
        let mut r = request();
        // Make Basic-Science the winner by pricing the combo out.
        let mut expensive_combo = config.clone();
        expensive_combo.memberships.science_kids = 500.0;
        r.dpkh_visits = 1;
        let rec = calculate_membership_costs(&expensive_combo, &r);
        assert_eq!(
            rec.best_membership_type,
            MembershipOption::BasicSingleSite(Location::Science)
        );
        // One DPKH visit at the secondary guest rate: 56 * 0.75 = 42.
        assert_eq!(rec.general_admission_costs, 42.0);
        assert!(rec
            .general_admission_note
            .as_deref()
            .unwrap()
            .contains("Kids-Huntersville"));
    }
}

use crate::config::Config;
use crate::types::{Location, QuoteRequest};

/// The site with the strictly greatest visit count. Ties resolve in fixed
/// priority order Science > DPKH > DPKR; a plan with zero visits everywhere
/// still resolves to Science.
pub fn determine_primary_location(
    science_visits: u32,
    dpkh_visits: u32,
    dpkr_visits: u32,
) -> Location {
    let mut best = Location::Science;
    let mut best_count = science_visits;
    for (location, count) in [(Location::Dpkh, dpkh_visits), (Location::Dpkr, dpkr_visits)] {
        if count > best_count {
            best = location;
            best_count = count;
        }
    }
    best
}

/// Children old enough to pay admission at the given site.
pub fn eligible_children(config: &Config, location: Location, child_ages: &[u8]) -> u32 {
    let threshold = config.child_free_age(location);
    child_ages.iter().filter(|&&age| age >= threshold).count() as u32
}

/// Uncapped pay-as-you-go admission total across all three sites. This is
/// the "what if no membership" baseline used for savings comparisons; the
/// per-location visit cap only applies to guest-discount math, not here.
pub fn regular_admission_cost(config: &Config, request: &QuoteRequest) -> f64 {
    let mut total = 0.0;
    for location in Location::ALL {
        let visits = request.visits(location);
        if visits == 0 {
            continue;
        }
        let (adult_price, child_price) =
            config.admission_prices(location, request.is_richmond_resident);
        let children = eligible_children(config, location, &request.child_ages);
        total += visits as f64
            * (request.adult_count as f64 * adult_price + children as f64 * child_price);
    }
    total
}

pub fn parking_cost(config: &Config, visits: u32, welcome_context: bool) -> f64 {
    visits as f64 * config.parking_rate(welcome_context)
}

#[cfg(test)]
mod tests {
    use super::{determine_primary_location, eligible_children, parking_cost, regular_admission_cost};
    use crate::config::Config;
    use crate::types::{Location, QuoteRequest};

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
    fn strict_maximum_wins() {
        assert_eq!(determine_primary_location(1, 5, 2), Location::Dpkh);
        assert_eq!(determine_primary_location(0, 1, 6), Location::Dpkr);
    }

    #[test]
    fn ties_resolve_in_priority_order() {
        assert_eq!(determine_primary_location(3, 3, 3), Location::Science);
        assert_eq!(determine_primary_location(0, 5, 5), Location::Dpkh);
        assert_eq!(determine_primary_location(2, 1, 2), Location::Science);
    }

    #[test]
    fn zero_visits_default_to_science() {
        assert_eq!(determine_primary_location(0, 0, 0), Location::Science);
    }

    #[test]
    fn infants_enter_free() {
        let config = Config::default();
        // Science admits children under 2 free.
        assert_eq!(eligible_children(&config, Location::Science, &[0, 1, 5]), 1);
        assert_eq!(eligible_children(&config, Location::Dpkh, &[0, 1, 5]), 2);
    }

    #[test]
    fn baseline_covers_all_sites_uncapped() {
        let config = Config::default();
        // 4 * (2*24 + 2*19) + 2 * (2*15 + 2*13) = 344 + 112
        assert_eq!(regular_admission_cost(&config, &request()), 456.0);

        let mut many = request();
        many.science_visits = config.constraints.max_visits_per_location + 50;
        // No cap on the baseline: more planned visits keep costing more.
        assert!(regular_admission_cost(&config, &many) > regular_admission_cost(&config, &request()));
    }

    #[test]
    fn resident_tier_lowers_rockingham_baseline() {
        let config = Config::default();
        let mut r = request();
        r.science_visits = 0;
        r.dpkh_visits = 0;
        r.dpkr_visits = 2;
        let standard = regular_admission_cost(&config, &r);
        r.is_richmond_resident = true;
        let resident = regular_admission_cost(&config, &r);
        assert_eq!(standard, 72.0);
        assert_eq!(resident, 56.0);
    }

    #[test]
    fn parking_uses_context_rate() {
        let config = Config::default();
        assert_eq!(parking_cost(&config, 4, false), 40.0);
        assert_eq!(parking_cost(&config, 4, true), 32.0);
        assert_eq!(parking_cost(&config, 0, false), 0.0);
    }
}

use crate::config::Config;
use crate::pricing::{admission, GuestSavings, PromoBanner, WelcomeQuote};
use crate::types::{
    CostLineItem, CostSubItem, DiscountScope, Location, MembershipOption, QuoteRequest,
    WelcomeMode,
};

/// Promotional-discount eligibility for a membership scope.
pub fn is_eligible_for_discount(config: &Config, member_count: u32, scope: DiscountScope) -> bool {
    // Rockingham-anchored memberships never qualify, independent of size.
    if scope == DiscountScope::Site(Location::Dpkr) {
        return false;
    }
    member_count >= config.discount.minimum_members
        && config.discount.eligible_scopes.contains(&scope)
}

/// Applies the promotional discount when eligible, otherwise returns the
/// price unchanged. Rounds to the nearest dollar, once, here only.
pub fn apply_discount(config: &Config, price: f64, member_count: u32, scope: DiscountScope) -> f64 {
    if is_eligible_for_discount(config, member_count, scope) {
        return (price * (1.0 - config.discount.current_rate)).round();
    }
    price
}

/// Discounted guest admission between a member's home location and a visited
/// location, per the configured discount map. Absent pair: full price.
pub fn guest_admission_price(
    config: &Config,
    regular_price: f64,
    home: Location,
    visited: Location,
) -> f64 {
    let rate = config.guest_discount_rate(home, visited);
    if rate == 0.0 {
        return regular_price;
    }
    (regular_price * (1.0 - rate)).round()
}

/// Total guest-admission savings a membership would unlock across the visit
/// plan. Each site contributes independently: visits capped at the
/// configured maximum, children counted against that site's free-age
/// threshold, and the rate set by whether the site is the family's primary
/// location. Sites with no saving contribute no breakdown line.
pub fn guest_admission_savings(
    config: &Config,
    request: &QuoteRequest,
    primary_location: Location,
) -> GuestSavings {
    let max_visits = config.constraints.max_visits_per_location;
    let mut breakdown = Vec::new();
    let mut total = 0.0;

    for location in Location::ALL {
        let capped_visits = request.visits(location).min(max_visits);
        if capped_visits == 0 {
            continue;
        }

        let rate = if location == primary_location {
            config.guest.primary_rate
        } else {
            config.guest.secondary_rate
        };
        let (adult_price, child_price) =
            config.admission_prices(location, request.is_richmond_resident);
        let children = admission::eligible_children(config, location, &request.child_ages);

        let adult_saving = capped_visits as f64
            * request.adult_count as f64
            * (adult_price - adult_price * (1.0 - rate));
        let child_saving =
            capped_visits as f64 * children as f64 * (child_price - child_price * (1.0 - rate));
        let saving = adult_saving + child_saving;
        if saving <= 0.0 {
            continue;
        }

        let percent = (rate * 100.0).round() as u32;
        breakdown.push(
            CostLineItem::new(
                format!("{} guest discounts ({percent}% off)", location.short_label()),
                -saving,
            )
            .with_details(format!(
                "{capped_visits} visits x {} people",
                request.adult_count + children
            ))
            .with_sub_items(vec![
                CostSubItem {
                    label: format!(
                        "Adult admission ({} x {capped_visits} visits)",
                        request.adult_count
                    ),
                    saving: adult_saving,
                },
                CostSubItem {
                    label: format!("Child admission ({children} x {capped_visits} visits)"),
                    saving: child_saving,
                },
            ]),
        );
        total += saving;
    }

    GuestSavings {
        total,
        breakdown,
        primary_location,
    }
}

/// Discounted cost of visiting the locations a membership does not cover.
/// This is the capped regular cost of those visits minus the guest savings
/// they earn; the combo covers every site and costs nothing extra.
pub fn guest_admission_cost(
    config: &Config,
    request: &QuoteRequest,
    primary_location: Location,
    option: MembershipOption,
) -> (f64, Option<String>) {
    let home_site = match option {
        MembershipOption::BasicSingleSite(site) => site,
        _ => return (0.0, None),
    };

    let mut cost = 0.0;
    let mut visited = Vec::new();
    for location in Location::ALL {
        if location == home_site {
            continue;
        }
        let capped_visits = request
            .visits(location)
            .min(config.constraints.max_visits_per_location);
        if capped_visits == 0 {
            continue;
        }
        let rate = if location == primary_location {
            config.guest.primary_rate
        } else {
            config.guest.secondary_rate
        };
        let (adult_price, child_price) =
            config.admission_prices(location, request.is_richmond_resident);
        let children = admission::eligible_children(config, location, &request.child_ages);
        let regular = capped_visits as f64
            * (request.adult_count as f64 * adult_price + children as f64 * child_price);
        cost += regular * (1.0 - rate);
        visited.push(location.short_label());
    }

    let note = if visited.is_empty() {
        None
    } else {
        Some(format!(
            "Discounted guest admission at {}",
            visited.join(" and ")
        ))
    };
    (cost, note)
}

/// Welcome Program pricing, anchored at one location.
pub fn welcome_program_pricing(
    config: &Config,
    request: &QuoteRequest,
    mode: WelcomeMode,
    location: Location,
) -> WelcomeQuote {
    let welcome = &config.welcome;
    let people = request.total_family_members();
    let purchase_link = config.welcome_purchase_link(location).to_string();
    let info_link = config.welcome_info_link(location).to_string();

    match mode {
        WelcomeMode::Membership => {
            let people_included = people.min(welcome.max_people);
            let parking_cost = if request.include_parking {
                admission::parking_cost(config, request.science_visits, true)
            } else {
                0.0
            };

            let cross_location_visits: u32 = Location::ALL
                .iter()
                .filter(|&&site| site != location)
                .map(|&site| request.visits(site))
                .sum();
            let cross_location_cost =
                cross_location_visits as f64 * people_included as f64 * welcome.single_visit_price;

            let base_price = welcome.membership_price;
            let total_price = base_price + parking_cost + cross_location_cost;

            let regular_admission_cost = admission::regular_admission_cost(config, request)
                + if request.include_parking {
                    admission::parking_cost(config, request.science_visits, false)
                } else {
                    0.0
                };
            let savings = (regular_admission_cost - total_price).max(0.0);
            let savings_percentage = if regular_admission_cost > 0.0 {
                ((savings / regular_admission_cost) * 100.0).round().min(90.0) as u32
            } else {
                0
            };

            let cost_breakdown = vec![
                CostLineItem::new(
                    format!("Welcome Program Membership ({})", location.label()),
                    base_price,
                )
                .with_details(format!(
                    "Annual membership for up to {} people",
                    welcome.max_people
                )),
                {
                    let mut item = CostLineItem::new("Parking at Science", parking_cost);
                    if request.science_visits > 0 && parking_cost > 0.0 {
                        item = item.with_details(format!(
                            "{} visits x ${:.0} per visit",
                            request.science_visits, config.parking.welcome
                        ));
                    }
                    item
                },
                {
                    let mut item = CostLineItem::new("Cross-location visits", cross_location_cost);
                    if cross_location_visits > 0 {
                        item = item.with_details(format!(
                            "{cross_location_visits} visits x {people_included} people x ${:.0} per person",
                            welcome.single_visit_price
                        ));
                    }
                    item
                },
            ];

            WelcomeQuote {
                membership_type: MembershipOption::Welcome(WelcomeMode::Membership),
                label: format!(
                    "Discovery Place Welcome Program Membership ({})",
                    location.label()
                ),
                location,
                location_label: location.label().to_string(),
                people_included,
                max_people: welcome.max_people,
                base_price,
                price_per_person: None,
                parking_cost,
                cross_location_cost,
                total_price,
                regular_admission_cost: Some(regular_admission_cost),
                savings: Some(savings),
                savings_percentage: Some(savings_percentage),
                purchase_link,
                info_link,
                explanation: format!(
                    "Includes {people_included} people (up to {} adults and {} children) with access to {}. ${:.0} admission per person at other locations.",
                    welcome.max_adults,
                    welcome.max_children,
                    location.label(),
                    welcome.single_visit_price
                ),
                cost_breakdown,
            }
        }
        WelcomeMode::SingleVisit => {
            let people_included = people.min(welcome.max_single_visit_group);
            let admission_cost = people_included as f64 * welcome.single_visit_price;
            let parking_cost = if request.include_parking && location == Location::Science {
                config.parking.welcome
            } else {
                0.0
            };
            let total_price = admission_cost + parking_cost;

            let cost_breakdown = vec![
                CostLineItem::new(
                    format!("Welcome Program Admission ({})", location.label()),
                    admission_cost,
                )
                .with_details(format!(
                    "{people_included} people x ${:.0} per person",
                    welcome.single_visit_price
                )),
                {
                    let mut item = CostLineItem::new("Parking at Science", parking_cost);
                    if parking_cost > 0.0 {
                        item = item
                            .with_details(format!("${:.0} flat rate", config.parking.welcome));
                    }
                    item
                },
            ];

            WelcomeQuote {
                membership_type: MembershipOption::Welcome(WelcomeMode::SingleVisit),
                label: format!(
                    "Discovery Place Welcome Program Single Visit ({})",
                    location.label()
                ),
                location,
                location_label: location.label().to_string(),
                people_included,
                max_people: welcome.max_single_visit_group,
                base_price: admission_cost,
                price_per_person: Some(welcome.single_visit_price),
                parking_cost,
                cross_location_cost: 0.0,
                total_price,
                regular_admission_cost: None,
                savings: None,
                savings_percentage: None,
                purchase_link,
                info_link,
                explanation: format!(
                    "${:.0} per person for {people_included} people. Includes same-day admission to {}.",
                    welcome.single_visit_price,
                    location.label()
                ),
                cost_breakdown,
            }
        }
    }
}

/// Human-readable eligibility status for one membership scope.
pub fn eligibility_message(config: &Config, member_count: u32, scope: DiscountScope) -> String {
    let discount_percent = (config.discount.current_rate * 100.0).round() as u32;

    if !is_eligible_for_discount(config, member_count, scope) {
        if member_count < config.discount.minimum_members {
            return format!(
                "Not eligible for discount: requires {} or more people.",
                config.discount.minimum_members
            );
        }
        if scope == DiscountScope::Site(Location::Dpkr) {
            return "Not eligible for discount: Rockingham memberships do not qualify for the promotional discount.".to_string();
        }
        return "Not eligible for current discount.".to_string();
    }

    let benefits = match scope {
        DiscountScope::Site(home) => config
            .guest
            .discount_map
            .get(&home)
            .map(|rates| {
                rates
                    .iter()
                    .map(|(visited, rate)| format!("{:.0}% off at {visited}", rate * 100.0))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default(),
        DiscountScope::ScienceKids => String::new(),
    };

    if benefits.is_empty() {
        format!("Eligible for {discount_percent}% membership discount!")
    } else {
        format!(
            "Eligible for {discount_percent}% membership discount! Guest admission benefits: {benefits}."
        )
    }
}

pub fn promotion_banner(config: &Config) -> PromoBanner {
    let banner = &config.discount.promo_banner;
    PromoBanner {
        title: banner.title.clone(),
        description: banner.description.clone(),
        discount_rate: config.discount.current_rate,
        active: config.discount.current_rate > 0.0
            && (!banner.title.is_empty() || !banner.description.is_empty()),
    }
}

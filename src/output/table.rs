use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::pricing::{GuestSavings, PromoBanner, Recommendation, WelcomeQuote};
use crate::types::MembershipOption;

/// Rendered dollar figures floor at zero and cap at a sane maximum; the
/// engine already guarantees non-negative values, this only guards display.
const MAX_DISPLAY_AMOUNT: f64 = 100_000.0;

pub fn format_currency(amount: f64) -> String {
    let amount = if amount.is_nan() { 0.0 } else { amount };
    format!("${:.2}", amount.clamp(0.0, MAX_DISPLAY_AMOUNT))
}

/// Signed variant for breakdown lines where a negative cost is a saving.
pub fn format_signed_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("-{}", format_currency(-amount))
    } else {
        format_currency(amount)
    }
}

pub fn render_quote_table(recommendation: &Recommendation) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Item", "Details", "Cost"]);

    for item in &recommendation.cost_breakdown {
        table.add_row(vec![
            item.label.clone(),
            item.details.clone().unwrap_or_else(|| "-".to_string()),
            format_signed_currency(item.cost),
        ]);
    }

    let eligibility = if recommendation.discount_eligible {
        Cell::new("YES").fg(Color::Green)
    } else {
        Cell::new("NO").fg(Color::Red)
    };
    table.add_row(Row::from(vec![
        Cell::new("Discount eligible"),
        Cell::new(format!(
            "{} family members",
            recommendation.total_family_members
        )),
        eligibility,
    ]));

    let mut out = String::new();
    out.push_str(&table.to_string());
    out.push_str(&format!(
        "\nRecommended: {} ({})\nTotal price: {}{}\nRegular admission for the same plan: {}\nSavings: {} ({}%)",
        recommendation.best_membership_label,
        recommendation.best_membership_type,
        format_currency(recommendation.total_price),
        if recommendation.best_membership_type == MembershipOption::PayAsYouGo {
            " for all visits"
        } else {
            " per year"
        },
        format_currency(recommendation.regular_admission_cost),
        format_currency(recommendation.best_membership_savings),
        recommendation.savings_percentage,
    ));

    if let Some(welcome) = &recommendation.welcome_program_option {
        out.push_str(&format!(
            "\n\nWelcome Program alternative: {} at {}\n{}",
            welcome.label,
            format_currency(welcome.total_price),
            welcome.explanation
        ));
    }
    out
}

pub fn render_savings_table(savings: &GuestSavings) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Location", "Details", "Saving"]);

    for item in &savings.breakdown {
        table.add_row(vec![
            item.label.clone(),
            item.details.clone().unwrap_or_else(|| "-".to_string()),
            format_currency(-item.cost),
        ]);
        for sub in &item.sub_items {
            table.add_row(vec![
                format!("  {}", sub.label),
                String::new(),
                format_currency(sub.saving),
            ]);
        }
    }

    let mut out = String::new();
    out.push_str(&table.to_string());
    out.push_str(&format!(
        "\nPrimary location: {}\nTotal guest savings: {}",
        savings.primary_location.label(),
        format_currency(savings.total)
    ));
    out
}

pub fn render_welcome_table(quote: &WelcomeQuote) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Item", "Details", "Cost"]);

    for item in &quote.cost_breakdown {
        table.add_row(vec![
            item.label.clone(),
            item.details.clone().unwrap_or_else(|| "-".to_string()),
            format_currency(item.cost),
        ]);
    }

    let mut out = String::new();
    out.push_str(&table.to_string());
    out.push_str(&format!(
        "\n{}\nTotal price: {}",
        quote.explanation,
        format_currency(quote.total_price)
    ));
    if let (Some(regular), Some(savings), Some(percentage)) = (
        quote.regular_admission_cost,
        quote.savings,
        quote.savings_percentage,
    ) {
        out.push_str(&format!(
            "\nRegular admission: {} | Savings: {} ({percentage}%)",
            format_currency(regular),
            format_currency(savings)
        ));
    }
    out.push_str(&format!(
        "\nPurchase: {}\nDetails: {}",
        quote.purchase_link, quote.info_link
    ));
    out
}

pub fn render_promo_banner(banner: &PromoBanner) -> String {
    if !banner.active {
        return "No active promotion.".to_string();
    }
    format!(
        "{}\n{} Prices shown include eligible discounts.",
        banner.title, banner.description
    )
}

#[cfg(test)]
mod tests {
    use super::{format_currency, format_signed_currency};

    #[test]
    fn clamps_display_amounts() {
        assert_eq!(format_currency(-5.0), "$0.00");
        assert_eq!(format_currency(250_000.0), "$100000.00");
        assert_eq!(format_currency(f64::NAN), "$0.00");
        assert_eq!(format_currency(42.5), "$42.50");
    }

    #[test]
    fn signed_variant_keeps_savings_visible() {
        assert_eq!(format_signed_currency(-28.0), "-$28.00");
        assert_eq!(format_signed_currency(28.0), "$28.00");
    }
}

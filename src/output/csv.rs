use anyhow::Result;

use crate::pricing::{GuestSavings, Recommendation};

pub fn breakdown_to_csv(recommendation: &Recommendation) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["item", "details", "cost"])?;
    for item in &recommendation.cost_breakdown {
        writer.write_record([
            item.label.clone(),
            item.details.clone().unwrap_or_default(),
            format!("{:.2}", item.cost),
        ])?;
    }
    writer.write_record([
        "total".to_string(),
        recommendation.best_membership_label.clone(),
        format!("{:.2}", recommendation.total_price),
    ])?;
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn savings_to_csv(savings: &GuestSavings) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["location", "details", "saving"])?;
    for item in &savings.breakdown {
        writer.write_record([
            item.label.clone(),
            item.details.clone().unwrap_or_default(),
            format!("{:.2}", -item.cost),
        ])?;
    }
    writer.write_record([
        "total".to_string(),
        savings.primary_location.to_string(),
        format!("{:.2}", savings.total),
    ])?;
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

use super::ui;
use crate::core::analyzer::{Analyzer, Subject};
use anyhow::Result;

pub async fn run(analyzer: &Analyzer, subject: &Subject) -> Result<()> {
    let usage = analyzer.quota_usage(subject).await?;
    println!(
        "{} {} ({})",
        ui::style_text("Subject:", ui::StyleType::Label),
        subject.id,
        subject.tier
    );
    println!(
        "{} {}",
        ui::style_text("Day:", ui::StyleType::Label),
        usage.day_key
    );
    println!(
        "{} {} of {} calls used, {} remaining",
        ui::style_text("Quota:", ui::StyleType::Label),
        usage.calls_made,
        usage.limit,
        ui::style_text(&usage.remaining().to_string(), ui::StyleType::Value)
    );
    Ok(())
}

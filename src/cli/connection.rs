use super::ui;
use crate::core::config::{AppConfig, ConnectionInfo};
use crate::core::error::ConfigError;
use crate::core::provider::{ConnectionStatus, UsageInfo};
use crate::providers::build_provider;
use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use std::path::Path;
use tracing::info;

fn api_key(config: &AppConfig) -> Result<&str> {
    let key = config.sync.api_key.trim();
    if key.is_empty() {
        return Err(ConfigError::MissingApiKey.into());
    }
    Ok(key)
}

pub fn connection_table(status: &ConnectionStatus) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);
    table.add_row(vec![
        Cell::new("Connection"),
        ui::status_cell(
            if status.success { "Successful" } else { "Failed" },
            status.success,
        ),
    ]);
    table.add_row(vec![Cell::new("Plan"), Cell::new(&status.plan)]);
    table.add_row(vec![Cell::new("Quota"), Cell::new(&status.quota)]);
    table.add_row(vec![Cell::new("API status"), Cell::new(&status.api_status)]);
    table.add_row(vec![
        Cell::new("Base currencies"),
        Cell::new(status.base_option()),
    ]);
    table
}

/// Probes the provider account and records the result in the configuration
/// file. This is the only command that writes the `connection` section.
pub async fn test_connection(mut config: AppConfig, config_path: &Path) -> Result<()> {
    let provider = build_provider(&config.provider, api_key(&config)?)?;
    let status = provider
        .check_connection()
        .await
        .with_context(|| format!("Connection test against {} failed", provider.name()))?;

    println!("{}", connection_table(&status));

    config.connection = Some(ConnectionInfo {
        success: status.success,
        plan: status.plan.clone(),
        quota: status.quota.clone(),
        api_status: status.api_status.clone(),
        base_option: status.base_option().to_string(),
    });
    config.save_to_path(config_path)?;
    info!(success = status.success, "Recorded connection test result");

    if !status.success {
        anyhow::bail!("{}", status.message);
    }
    println!(
        "{}",
        ui::style_text(
            &format!("{} Configuration has been updated.", status.message),
            ui::StyleType::Success
        )
    );
    Ok(())
}

pub fn usage_table(usage: &UsageInfo) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Counter"), ui::header_cell("Value")]);
    let rows: [(&str, String); 6] = [
        ("Requests", usage.requests.to_string()),
        ("Requests quota", usage.requests_quota.to_string()),
        ("Requests remaining", usage.requests_remaining.to_string()),
        ("Days elapsed", usage.days_elapsed.to_string()),
        ("Days remaining", usage.days_remaining.to_string()),
        ("Daily average", usage.daily_average.to_string()),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    table
}

pub async fn show_usage(config: &AppConfig) -> Result<()> {
    let provider = build_provider(&config.provider, api_key(config)?)?;
    let usage = provider.usage().await?;

    println!(
        "{}",
        ui::style_text("API Usage Information", ui::StyleType::Title)
    );
    println!("{}", usage_table(&usage));
    Ok(())
}

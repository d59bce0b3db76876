use super::ui;
use crate::core::config::{AppConfig, CurrencyList};
use anyhow::Result;
use std::path::Path;

fn list_name(list: CurrencyList) -> &'static str {
    match list {
        CurrencyList::Base => "base",
        CurrencyList::Target => "target",
    }
}

pub fn add_currency(
    mut config: AppConfig,
    config_path: &Path,
    list: CurrencyList,
    code: &str,
) -> Result<()> {
    let code = code.trim().to_uppercase();
    if !config.add_currency(list, &code)? {
        println!(
            "{}",
            ui::style_text(
                &format!("{code} is already a {} currency.", list_name(list)),
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    config.save_to_path(config_path)?;
    println!(
        "{}",
        ui::style_text(
            &format!("Added {code} to the {} currencies.", list_name(list)),
            ui::StyleType::Success
        )
    );
    Ok(())
}

pub fn remove_currency(
    mut config: AppConfig,
    config_path: &Path,
    list: CurrencyList,
    code: &str,
) -> Result<()> {
    let code = code.trim().to_uppercase();
    if !config.remove_currency(list, &code) {
        anyhow::bail!("{code} is not a configured {} currency", list_name(list));
    }

    config.save_to_path(config_path)?;
    println!(
        "{}",
        ui::style_text(
            &format!("Removed {code} from the {} currencies.", list_name(list)),
            ui::StyleType::Success
        )
    );
    Ok(())
}

//! Configuration validation.
//!
//! Validates every field before the ledger is touched, then assembles the
//! typed [`Settings`] the cycle runs with.

use crate::domain::error::DipledgerError;
use crate::domain::settings::{AnalysisSettings, Settings, TradingSettings};
use crate::domain::universe::parse_markets;
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const DEFAULT_LEDGER_PATH: &str = "balance.json";

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), DipledgerError> {
    validate_data_dir(config)?;
    validate_time_modifier(config)?;
    validate_avg_length(config)?;
    validate_markets(config)?;
    validate_trusted_instrument(config)?;
    validate_portfolio_cap(config)?;
    validate_trading_limits(config)?;
    Ok(())
}

/// Validate, then read the configuration into [`Settings`].
pub fn load_settings(config: &dyn ConfigPort) -> Result<Settings, DipledgerError> {
    validate_config(config)?;
    let defaults = TradingSettings::default();

    let analysis = AnalysisSettings {
        time_modifier: required_double(config, "analysis", "time_modifier")?,
        avg_length: required_int(config, "analysis", "avg_length")? as usize,
        markets: markets(config)?,
        trusted_market: required_string(config, "analysis", "trusted_market")?,
        trusted_ticker: required_string(config, "analysis", "trusted_ticker")?.to_lowercase(),
    };
    let trading = TradingSettings {
        max_portfolio_percent_per_stock: required_double(
            config,
            "trading",
            "max_portfolio_percent_per_stock",
        )?,
        min_price: config.get_double("trading", "min_price", defaults.min_price),
        min_cash: config.get_int("trading", "min_cash", defaults.min_cash),
        budget_overshoot: config.get_double("trading", "budget_overshoot", defaults.budget_overshoot),
    };

    Ok(Settings {
        data_dir: data_dir(config)?,
        ledger_path: config
            .get_path("ledger", "path")
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH)),
        analysis,
        trading,
    })
}

fn invalid(section: &str, key: &str, reason: &str) -> DipledgerError {
    DipledgerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn required_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, DipledgerError> {
    config
        .get_string(section, key)
        .ok_or_else(|| DipledgerError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })
}

fn required_double(config: &dyn ConfigPort, section: &str, key: &str) -> Result<f64, DipledgerError> {
    required_string(config, section, key)?
        .parse()
        .map_err(|_| invalid(section, key, &format!("{} must be a number", key)))
}

fn required_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<i64, DipledgerError> {
    required_string(config, section, key)?
        .parse()
        .map_err(|_| invalid(section, key, &format!("{} must be a whole number", key)))
}

fn data_dir(config: &dyn ConfigPort) -> Result<PathBuf, DipledgerError> {
    config
        .get_path("data", "dir")
        .ok_or_else(|| DipledgerError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        })
}

fn markets(config: &dyn ConfigPort) -> Result<Vec<String>, DipledgerError> {
    let list = required_string(config, "analysis", "markets")?;
    parse_markets(&list).map_err(|e| invalid("analysis", "markets", &e.to_string()))
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), DipledgerError> {
    let dir = data_dir(config)?;
    if !dir.is_dir() {
        return Err(invalid(
            "data",
            "dir",
            &format!("{} is not a directory", dir.display()),
        ));
    }
    Ok(())
}

fn validate_time_modifier(config: &dyn ConfigPort) -> Result<(), DipledgerError> {
    let value = required_double(config, "analysis", "time_modifier")?;
    if value <= 0.0 || value >= 1.0 {
        return Err(invalid(
            "analysis",
            "time_modifier",
            "time_modifier must be strictly between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_avg_length(config: &dyn ConfigPort) -> Result<(), DipledgerError> {
    let value = required_int(config, "analysis", "avg_length")?;
    if value < 2 {
        return Err(invalid(
            "analysis",
            "avg_length",
            "avg_length must be at least 2",
        ));
    }
    Ok(())
}

fn validate_markets(config: &dyn ConfigPort) -> Result<(), DipledgerError> {
    markets(config).map(|_| ())
}

fn validate_trusted_instrument(config: &dyn ConfigPort) -> Result<(), DipledgerError> {
    required_string(config, "analysis", "trusted_market")?;
    required_string(config, "analysis", "trusted_ticker")?;
    Ok(())
}

fn validate_portfolio_cap(config: &dyn ConfigPort) -> Result<(), DipledgerError> {
    let value = required_double(config, "trading", "max_portfolio_percent_per_stock")?;
    if value <= 0.0 || value > 1.0 {
        return Err(invalid(
            "trading",
            "max_portfolio_percent_per_stock",
            "max_portfolio_percent_per_stock must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_trading_limits(config: &dyn ConfigPort) -> Result<(), DipledgerError> {
    let defaults = TradingSettings::default();
    if config.get_double("trading", "min_price", defaults.min_price) < 0.0 {
        return Err(invalid(
            "trading",
            "min_price",
            "min_price must be non-negative",
        ));
    }
    if config.get_int("trading", "min_cash", defaults.min_cash) < 0 {
        return Err(invalid(
            "trading",
            "min_cash",
            "min_cash must be non-negative",
        ));
    }
    if config.get_double("trading", "budget_overshoot", defaults.budget_overshoot) < 1.0 {
        return Err(invalid(
            "trading",
            "budget_overshoot",
            "budget_overshoot must be at least 1",
        ));
    }
    Ok(())
}

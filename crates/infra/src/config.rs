//! Process configuration from environment variables.

use std::net::SocketAddr;

use anyhow::{Context, bail};

use toolrent_loans::LoanSettings;

pub const BIND_ADDR: &str = "TOOLRENT_BIND_ADDR";
pub const DAILY_RENT_RATE: &str = "TOOLRENT_DAILY_RENT_RATE";
pub const CHECK_BORROWER_ACTIVE: &str = "TOOLRENT_CHECK_BORROWER_ACTIVE";
pub const MAX_OPEN_LOANS: &str = "TOOLRENT_MAX_OPEN_LOANS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub loans: LoanSettings,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys take defaults; malformed values
    /// are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let raw = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = raw(BIND_ADDR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .with_context(|| format!("{BIND_ADDR} is not a socket address"))?;

        let mut loans = LoanSettings::default();
        if let Some(v) = raw(DAILY_RENT_RATE) {
            loans.daily_rent_rate = v
                .parse()
                .with_context(|| format!("{DAILY_RENT_RATE}={v} is not an integer"))?;
        }
        if let Some(v) = raw(CHECK_BORROWER_ACTIVE) {
            loans.check_borrower_active = parse_flag(&v)
                .with_context(|| format!("{CHECK_BORROWER_ACTIVE}={v} is not a boolean"))?;
        }
        if let Some(v) = raw(MAX_OPEN_LOANS) {
            loans.max_open_loans = v
                .parse()
                .with_context(|| format!("{MAX_OPEN_LOANS}={v} is not a count"))?;
        }
        let loans = loans.validate().context("invalid loan settings")?;

        Ok(Self { bind_addr, loans })
    }
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("unrecognized flag value '{other}'"),
    }
}

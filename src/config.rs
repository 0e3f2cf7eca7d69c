use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use std::env;

use crate::services::eligibility::EligibilityRules;

const DEFAULT_JWT_SECRET: &str = "your-super-secret-jwt-key-change-this-in-production-12345";

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without one the service runs on the
    /// in-memory stores.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub previous_month_cutoff_day: u32,
    pub completeness_threshold_percent: u32,
    pub holidays: Vec<NaiveDate>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    /// This is useful for testing where you want to control the environment directly
    pub fn from_env_only() -> Result<Self> {
        let previous_month_cutoff_day: u32 = env::var("PREVIOUS_MONTH_CUTOFF_DAY")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let completeness_threshold_percent: u32 = env::var("COMPLETENESS_THRESHOLD_PERCENT")
            .unwrap_or_else(|_| "80".to_string())
            .parse()
            .unwrap_or(80);

        Ok(Config {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            previous_month_cutoff_day: previous_month_cutoff_day.clamp(1, 31),
            completeness_threshold_percent: completeness_threshold_percent.min(100),
            holidays: parse_holidays(&env::var("HOLIDAYS").unwrap_or_default())?,
        })
    }

    pub fn test_config() -> Self {
        Config {
            database_url: None,
            jwt_secret: "test-secret".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            previous_month_cutoff_day: 10,
            completeness_threshold_percent: 80,
            holidays: Vec::new(),
        }
    }

    pub fn eligibility_rules(&self) -> EligibilityRules {
        EligibilityRules {
            previous_month_cutoff_day: self.previous_month_cutoff_day,
            completeness_threshold_percent: self.completeness_threshold_percent,
            holidays: self.holidays.iter().copied().collect(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Production deployments need their own signing secret and a database;
    /// the in-memory stores lose every timesheet on restart.
    pub fn validate(&self) -> Result<()> {
        if !self.is_production() {
            return Ok(());
        }
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            bail!("JWT_SECRET must be set in production");
        }
        if self.database_url.is_none() {
            bail!("DATABASE_URL must be set in production");
        }
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_holidays(raw: &str) -> Result<Vec<NaiveDate>> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .with_context(|| format!("Invalid date in HOLIDAYS: {}", value))
        })
        .collect()
}

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::env;

use timesheets::Config;

const VARS: [&str; 8] = [
    "DATABASE_URL",
    "JWT_SECRET",
    "ENVIRONMENT",
    "PREVIOUS_MONTH_CUTOFF_DAY",
    "COMPLETENESS_THRESHOLD_PERCENT",
    "HOLIDAYS",
    "HOST",
    "PORT",
];

fn clear_env() {
    for var in VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

#[test]
#[serial]
fn test_config_defaults() {
    clear_env();

    let config = Config::from_env_only().unwrap();

    assert_eq!(config.database_url, None);
    assert_eq!(config.previous_month_cutoff_day, 10);
    assert_eq!(config.completeness_threshold_percent, 80);
    assert!(config.holidays.is_empty());
    assert_eq!(config.server_address(), "127.0.0.1:8080");
}

#[test]
#[serial]
fn test_config_reads_eligibility_settings() {
    clear_env();
    unsafe {
        env::set_var("PREVIOUS_MONTH_CUTOFF_DAY", "5");
        env::set_var("COMPLETENESS_THRESHOLD_PERCENT", "90");
        env::set_var("HOLIDAYS", "2026-08-10,2026-12-25");
        env::set_var("DATABASE_URL", "postgres://localhost/timesheets");
    }

    let config = Config::from_env_only().unwrap();
    let rules = config.eligibility_rules();

    assert_eq!(
        config.database_url.as_deref(),
        Some("postgres://localhost/timesheets")
    );
    assert_eq!(rules.previous_month_cutoff_day, 5);
    assert_eq!(rules.completeness_threshold_percent, 90);
    assert!(rules.holidays.contains(&NaiveDate::from_ymd_opt(2026, 8, 10).unwrap()));
    assert!(rules.holidays.contains(&NaiveDate::from_ymd_opt(2026, 12, 25).unwrap()));

    clear_env();
}

#[test]
#[serial]
fn test_config_clamps_out_of_range_values() {
    clear_env();
    unsafe {
        env::set_var("PREVIOUS_MONTH_CUTOFF_DAY", "45");
        env::set_var("COMPLETENESS_THRESHOLD_PERCENT", "150");
        env::set_var("DATABASE_URL", "");
    }

    let config = Config::from_env_only().unwrap();

    assert_eq!(config.previous_month_cutoff_day, 31);
    assert_eq!(config.completeness_threshold_percent, 100);
    assert_eq!(config.database_url, None);

    clear_env();
}

#[test]
#[serial]
fn test_config_rejects_malformed_holidays() {
    clear_env();
    unsafe {
        env::set_var("HOLIDAYS", "2026-08-10,25/12/2026");
    }

    let result = Config::from_env_only();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("25/12/2026"));

    clear_env();
}

#[test]
#[serial]
fn test_production_requires_secret_and_database() {
    clear_env();
    unsafe {
        env::set_var("ENVIRONMENT", "production");
    }

    let config = Config::from_env_only().unwrap();
    assert!(config.is_production());
    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("JWT_SECRET"));

    unsafe {
        env::set_var("JWT_SECRET", "a-real-deployment-secret");
    }
    let error = Config::from_env_only().unwrap().validate().unwrap_err();
    assert!(error.to_string().contains("DATABASE_URL"));

    unsafe {
        env::set_var("DATABASE_URL", "postgres://db/timesheets");
    }
    assert!(Config::from_env_only().unwrap().validate().is_ok());

    clear_env();
}

#[test]
#[serial]
fn test_development_runs_with_defaults() {
    clear_env();

    let config = Config::from_env_only().unwrap();
    assert!(!config.is_production());
    assert!(config.validate().is_ok());
}

#![allow(dead_code)]
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use validator::Validate;

/// Top-level application configuration, loaded once at startup and passed
/// down as a single typed value.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_app_config"))]
pub struct AppConfig {
    #[validate(nested)]
    pub simulation: SimulationConfig,

    #[validate(nested)]
    pub server: ServerConfig,

    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

/// Process-wide constants governing the scheduling horizon and the tick
/// loop's pace.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SimulationConfig {
    #[validate(range(min = 1))]
    pub resolution_s: u32,

    #[validate(range(min = 1))]
    pub slot_count: usize,

    #[validate(range(min = 1))]
    pub charger_count: usize,

    #[serde(default = "default_time_factor")]
    #[validate(range(min = 0.000_001))]
    pub simulation_time_factor: f64,

    #[serde(default = "default_max_power_w")]
    #[validate(range(min = 0.1))]
    pub default_max_power_w: f64,

    /// Nominal per-tick planning budget, in milliseconds, used whenever a
    /// caller does not supply an explicit budget (e.g. request handlers).
    #[serde(default = "default_planner_time_budget_ms")]
    #[validate(range(min = 1))]
    pub planner_time_budget_ms: u64,
}

impl SimulationConfig {
    pub fn planner_time_budget(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.planner_time_budget_ms)
    }

    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.resolution_s as f64 / self.simulation_time_factor)
    }
}

fn validate_app_config(cfg: &AppConfig) -> Result<(), validator::ValidationError> {
    let horizon_s = cfg.simulation.resolution_s as u64 * cfg.simulation.slot_count as u64;
    if horizon_s < 24 * 3600 {
        return Err(validator::ValidationError::new(
            "slot_count must cover at least 24 hours at the configured resolution_s",
        ));
    }
    Ok(())
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("failed to parse socket address")
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,
}

fn default_time_factor() -> f64 {
    1.0
}
fn default_max_power_w() -> f64 {
    2000.0
}
fn default_planner_time_budget_ms() -> u64 {
    200
}
fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Loads configuration from `config/default.toml`, optionally layered
    /// with `config/<RUN_ENV>.toml`, then overridden by `CSC__`-prefixed
    /// environment variables (e.g. `CSC__SERVER__PORT`).
    pub fn load() -> Result<Self> {
        let mut figment = Figment::new().merge(Toml::file("config/default.toml"));

        if let Ok(env) = std::env::var("RUN_ENV") {
            figment = figment.merge(Toml::file(format!("config/{env}.toml")));
        }

        figment = figment.merge(Env::prefixed("CSC__").split("__"));

        let config: AppConfig = figment.extract().context("failed to parse configuration")?;
        config.validate().context("configuration validation failed")?;
        Ok(config)
    }
}

// Retained for call sites that predate the AppConfig rename.
pub type Config = AppConfig;

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AppConfig {
        AppConfig {
            simulation: SimulationConfig {
                resolution_s: 60,
                slot_count: 1440,
                charger_count: 1,
                simulation_time_factor: 60.0,
                default_max_power_w: 2000.0,
                planner_time_budget_ms: 200,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
                log_json: false,
            },
        }
    }

    #[test]
    fn socket_addr_parses() {
        assert_eq!(base().server.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn rejects_horizon_under_24h() {
        let mut cfg = base();
        cfg.simulation.slot_count = 10;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn accepts_exact_24h_horizon() {
        let cfg = base();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_zero_charger_count() {
        let mut cfg = base();
        cfg.simulation.charger_count = 0;
        assert!(cfg.validate().is_err());
    }
}

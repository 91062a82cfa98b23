//! Engine configuration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockledger_auth::{Role, RolePolicy};
use stockledger_inventory::{AggregationMode, DefaultThenAny, FirstHoldingStock, WarehouseSelector};

pub const DEFAULT_RECONCILE_EVERY: u32 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Warehouse allocation used when sourcing BOM materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseStrategy {
    #[default]
    FirstHolding,
    DefaultThenAny,
}

impl WarehouseStrategy {
    pub fn selector(&self) -> Arc<dyn WarehouseSelector> {
        match self {
            WarehouseStrategy::FirstHolding => Arc::new(FirstHoldingStock),
            WarehouseStrategy::DefaultThenAny => Arc::new(DefaultThenAny),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub aggregation: AggregationMode,
    pub privileged_roles: Vec<String>,
    pub warehouse_strategy: WarehouseStrategy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            aggregation: AggregationMode::FullRescan,
            privileged_roles: vec![Role::ADMIN.to_string(), Role::SUPER_ADMIN.to_string()],
            warehouse_strategy: WarehouseStrategy::FirstHolding,
        }
    }
}

impl LedgerConfig {
    /// Load from the process environment. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let reconcile_every = match lookup("LEDGER_RECONCILE_EVERY") {
            None => DEFAULT_RECONCILE_EVERY,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(invalid("LEDGER_RECONCILE_EVERY", raw, "expected a positive integer")),
            },
        };

        if let Some(raw) = lookup("LEDGER_AGGREGATION") {
            config.aggregation = match raw.trim() {
                "full_rescan" => AggregationMode::FullRescan,
                "incremental" => AggregationMode::IncrementalDelta { reconcile_every },
                _ => return Err(invalid("LEDGER_AGGREGATION", raw, "expected full_rescan or incremental")),
            };
        }

        if let Some(raw) = lookup("LEDGER_PRIVILEGED_ROLES") {
            let roles: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();
            if roles.is_empty() {
                return Err(invalid("LEDGER_PRIVILEGED_ROLES", raw, "expected at least one role"));
            }
            config.privileged_roles = roles;
        }

        if let Some(raw) = lookup("LEDGER_WAREHOUSE_STRATEGY") {
            config.warehouse_strategy = match raw.trim() {
                "first_holding" => WarehouseStrategy::FirstHolding,
                "default_then_any" => WarehouseStrategy::DefaultThenAny,
                _ => {
                    return Err(invalid(
                        "LEDGER_WAREHOUSE_STRATEGY",
                        raw,
                        "expected first_holding or default_then_any",
                    ));
                }
            };
        }

        Ok(config)
    }

    pub fn with_aggregation(mut self, aggregation: AggregationMode) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// The standard role grants with this configuration's privileged roles.
    pub fn role_policy(&self) -> RolePolicy {
        RolePolicy::standard().with_privileged_roles(self.privileged_roles.iter().cloned().map(Role::new))
    }
}

fn invalid(key: &'static str, value: String, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { key, value, reason }
}

// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Health Surface
//!
//! Aggregated health over the registered reliability services. A service
//! is healthy while its breaker admits calls (Closed or HalfOpen). The
//! rollup policy:
//!
//! - any failed critical check: **Unhealthy**
//! - otherwise any failed check: **Degraded**
//! - otherwise: **Healthy**

use std::sync::Arc;

use parking_lot::RwLock;

use super::circuit_breaker::CircuitState;
use super::service::ReliabilityService;

/// Overall status classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// One service's contribution to the report.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    pub name: String,
    pub healthy: bool,
    pub critical: bool,
    pub state: CircuitState,
}

/// Point-in-time health rollup.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: Vec<HealthCheck>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

struct Registration {
    service: Arc<ReliabilityService>,
    critical: bool,
}

/// Registry of reliability services to roll up.
#[derive(Default)]
pub struct HealthRegistry {
    registrations: RwLock<Vec<Registration>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service; `critical` services force Unhealthy when they
    /// fail.
    pub fn register(&self, service: Arc<ReliabilityService>, critical: bool) {
        self.registrations
            .write()
            .push(Registration { service, critical });
    }

    /// Builds the current rollup.
    pub fn report(&self) -> HealthReport {
        let registrations = self.registrations.read();
        let checks: Vec<HealthCheck> = registrations
            .iter()
            .map(|r| HealthCheck {
                name: r.service.name().to_string(),
                healthy: r.service.is_healthy(),
                critical: r.critical,
                state: r.service.state(),
            })
            .collect();

        let any_critical_failed = checks.iter().any(|c| c.critical && !c.healthy);
        let any_failed = checks.iter().any(|c| !c.healthy);
        let status = if any_critical_failed {
            HealthStatus::Unhealthy
        } else if any_failed {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        HealthReport {
            status,
            checks,
            generated_at: chrono::Utc::now(),
        }
    }
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and address formats
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure: GatewayConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// One failed semantic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check(errors: &mut Vec<ValidationError>, ok: bool, field: &'static str, message: String) {
    if !ok {
        errors.push(ValidationError { field, message });
    }
}

/// Run every semantic check and collect the failures.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check(
        &mut errors,
        config.listener.bind_address.parse::<SocketAddr>().is_ok(),
        "listener.bind_address",
        format!("not a socket address: {:?}", config.listener.bind_address),
    );

    check(
        &mut errors,
        !config.api.base_path.is_empty() && !config.api.base_path.contains('/'),
        "api.base_path",
        format!("must be a single path segment: {:?}", config.api.base_path),
    );
    check(
        &mut errors,
        !config.api.version.is_empty() && !config.api.version.contains('/'),
        "api.version",
        format!("must be a single path segment: {:?}", config.api.version),
    );

    check(
        &mut errors,
        config.database.kind == "couchdb",
        "database.kind",
        format!("unsupported database kind: {:?}", config.database.kind),
    );
    check(
        &mut errors,
        !config.database.name.is_empty(),
        "database.name",
        "must not be empty".to_string(),
    );
    check(
        &mut errors,
        config.database.request_timeout_secs > 0,
        "database.request_timeout_secs",
        "must be greater than zero".to_string(),
    );

    check(
        &mut errors,
        config.timeouts.request_secs > 0,
        "timeouts.request_secs",
        "must be greater than zero".to_string(),
    );

    // Consul settings only matter when membership is not pinned.
    if config.discovery.static_instances.is_empty() {
        check(
            &mut errors,
            Url::parse(&config.discovery.consul_address).is_ok(),
            "discovery.consul_address",
            format!("not a URL: {:?}", config.discovery.consul_address),
        );
        check(
            &mut errors,
            !config.discovery.service_name.is_empty(),
            "discovery.service_name",
            "must not be empty".to_string(),
        );
        check(
            &mut errors,
            config.discovery.wait_secs > 0,
            "discovery.wait_secs",
            "must be greater than zero".to_string(),
        );
    }

    if config.observability.metrics_enabled {
        check(
            &mut errors,
            config
                .observability
                .metrics_address
                .parse::<SocketAddr>()
                .is_ok(),
            "observability.metrics_address",
            format!(
                "not a socket address: {:?}",
                config.observability.metrics_address
            ),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn all_failures_are_collected() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.database.kind = "postgres".to_string();
        config.database.name = String::new();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"listener.bind_address"));
        assert!(fields.contains(&"database.kind"));
        assert!(fields.contains(&"database.name"));
    }

    #[test]
    fn static_instances_relax_consul_checks() {
        let mut config = GatewayConfig::default();
        config.discovery.consul_address = String::new();
        config.discovery.service_name = String::new();
        config.discovery.static_instances = vec!["db1:5984".to_string()];

        assert!(validate_config(&config).is_ok());
    }
}

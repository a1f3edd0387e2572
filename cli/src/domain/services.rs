//! Service-definition generation from the supervisor config.

use warden_common::{Config, ServiceCheck, ServiceDefinition};

use crate::domain::error::WardenError;

const DEFAULT_CHECK_NAME: &str = "dns_health_check";
const DEFAULT_CHECK_INTERVAL: &str = "3s";

/// Reject service keys that are not a plain file-name component.
///
/// The key becomes part of `service-{key}.json`, so it may only contain
/// ASCII letters, digits, `-`, `_` and `.`, and must not start with `.`.
///
/// # Errors
///
/// Returns `WardenError::Configuration` naming the offending key.
pub fn check_service_key(key: &str) -> Result<(), WardenError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if key.is_empty() || key.starts_with('.') || !key.chars().all(allowed) {
        return Err(WardenError::Configuration(format!(
            "invalid service name \"{key}\": use letters, digits, '-', '_' or '.'"
        )));
    }
    Ok(())
}

/// Build one definition per configured service, filling in defaults.
///
/// - `name` defaults to the service key with `_` replaced by `-`
/// - a DNS health-check script is attached when no check is configured
/// - tags default to the node's `name-index`
#[must_use]
pub fn generate_definitions(config: &Config) -> Vec<ServiceDefinition> {
    config
        .cluster
        .agent
        .services
        .iter()
        .map(|(key, configured)| {
            let mut definition = configured.clone();
            definition.service_name.clone_from(key);

            if definition.name.is_none() {
                definition.name = Some(key.replace('_', "-"));
            }

            if definition.check.is_none() && definition.checks.is_empty() {
                definition.check = Some(ServiceCheck {
                    name: Some(DEFAULT_CHECK_NAME.to_string()),
                    script: Some(format!("/var/vcap/jobs/{key}/bin/{DEFAULT_CHECK_NAME}")),
                    interval: Some(DEFAULT_CHECK_INTERVAL.to_string()),
                    ..ServiceCheck::default()
                });
            }

            if definition.tags.is_empty() {
                definition.tags = vec![format!(
                    "{}-{}",
                    config.node.name.replace('_', "-"),
                    config.node.index
                )];
            }

            definition
        })
        .collect()
}

//! Infrastructure implementation of the `ServiceDefiner` port.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;
use warden_common::{Config, ServiceDefinition};

use crate::application::ports::ServiceDefiner;
use crate::domain::services::{self, check_service_key};
use crate::infra::fs::write_atomic;

/// Writes one `service-{key}.json` file per configured service.
pub struct JsonServiceDefiner;

#[derive(Serialize)]
struct ServiceFile<'a> {
    service: &'a ServiceDefinition,
}

impl ServiceDefiner for JsonServiceDefiner {
    fn generate_definitions(&self, config: &Config) -> Vec<ServiceDefinition> {
        services::generate_definitions(config)
    }

    fn write_definitions(&self, dir: &Path, definitions: &[ServiceDefinition]) -> Result<()> {
        for definition in definitions {
            check_service_key(&definition.service_name)?;
            let path = dir.join(format!("service-{}.json", definition.service_name));
            let content = serde_json::to_vec(&ServiceFile {
                service: definition,
            })
            .with_context(|| format!("serializing service {}", definition.service_name))?;

            info!(path = %path.display(), "service-definer.write");
            write_atomic(&path, &content)?;
        }
        Ok(())
    }
}

//! Service catalog: descriptors resolved once at startup into an indexed table.
//!
//! Built-in descriptors are embedded at compile time via `include_str!`.
//! Config-supplied `[[services]]` tables override built-ins with the same key.

use stratus_core::errors::ConfigError;
use stratus_core::{FxHashMap, StratusConfig};

use super::loader::{self, ServiceDescriptor};

#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    services: Vec<ServiceDescriptor>,
    by_key: FxHashMap<String, usize>,
    by_arn_service: FxHashMap<String, usize>,
}

impl ServiceCatalog {
    /// Build from compiled descriptors. Duplicate keys are rejected.
    pub fn new(services: Vec<ServiceDescriptor>) -> Result<Self, ConfigError> {
        let mut catalog = Self::default();
        for service in services {
            if catalog.by_key.contains_key(&service.key) {
                return Err(ConfigError::DuplicateService(service.key));
            }
            catalog.insert(service);
        }
        Ok(catalog)
    }

    /// Catalog of the embedded AWS descriptors.
    pub fn with_builtins() -> Result<Self, ConfigError> {
        let mut services = Vec::new();
        for (name, toml_str) in builtin_packs() {
            let pack = loader::load_from_str(toml_str).map_err(|e| ConfigError::InvalidService {
                service: name.to_string(),
                reason: e.to_string(),
            })?;
            services.extend(pack);
        }
        Self::new(services)
    }

    /// Compile the config's `[[services]]` tables. Duplicates within the
    /// config are an error.
    pub fn from_config(config: &StratusConfig) -> Result<Self, ConfigError> {
        let services = config
            .services
            .iter()
            .map(loader::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(services)
    }

    /// Built-ins, overridden key-by-key by the config's descriptors.
    pub fn with_builtins_and_config(config: &StratusConfig) -> Result<Self, ConfigError> {
        let overrides = Self::from_config(config)?;
        let builtins = Self::with_builtins()?;
        let mut merged: Vec<ServiceDescriptor> = builtins
            .services
            .into_iter()
            .filter(|s| !overrides.by_key.contains_key(&s.key))
            .collect();
        if !overrides.is_empty() {
            tracing::debug!(count = overrides.len(), "applying configured service descriptors");
        }
        merged.extend(overrides.services);
        Self::new(merged)
    }

    fn insert(&mut self, service: ServiceDescriptor) {
        let index = self.services.len();
        self.by_key.insert(service.key.clone(), index);
        // First descriptor claiming an ARN segment owns it.
        self.by_arn_service
            .entry(service.arn_service.clone())
            .or_insert(index);
        self.services.push(service);
    }

    pub fn get(&self, key: &str) -> Option<&ServiceDescriptor> {
        self.by_key.get(key).map(|&i| &self.services[i])
    }

    /// Descriptor owning an ARN service segment (`arn:aws:<segment>:...`).
    pub fn by_arn_service(&self, segment: &str) -> Option<&ServiceDescriptor> {
        self.by_arn_service.get(segment).map(|&i| &self.services[i])
    }

    /// Descriptors in load order.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn builtin_packs() -> Vec<(&'static str, &'static str)> {
    vec![
        ("identity", include_str!("builtin/identity.toml")),
        ("compute", include_str!("builtin/compute.toml")),
        ("storage", include_str!("builtin/storage.toml")),
        ("messaging", include_str!("builtin/messaging.toml")),
        ("network", include_str!("builtin/network.toml")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_compile() {
        let catalog = ServiceCatalog::with_builtins().unwrap();
        assert!(catalog.get("s3").is_some_and(|s| s.bare_name_ids && s.global));
        assert_eq!(
            catalog.by_arn_service("elasticloadbalancing").map(|s| s.key.as_str()),
            Some("elbv2")
        );
        let ecs = catalog.get("ecs").unwrap();
        let describe = ecs
            .operations
            .iter()
            .find(|o| o.operation == "DescribeClusters")
            .unwrap();
        assert_eq!(describe.dependencies().collect::<Vec<_>>(), vec![("ECS", "ListClusters")]);
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let config = StratusConfig::from_toml_str(
            "[[services]]\nkey = \"a\"\n[[services]]\nkey = \"a\"\n",
        )
        .unwrap();
        let err = ServiceCatalog::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateService(k) if k == "a"));
    }

    #[test]
    fn test_config_overrides_builtin() {
        let config = StratusConfig::from_toml_str(
            "[[services]]\nkey = \"s3\"\nservice = \"S3\"\nlabel = \"Bucket\"\nglobal = true\n",
        )
        .unwrap();
        let catalog = ServiceCatalog::with_builtins_and_config(&config).unwrap();
        let s3 = catalog.get("s3").unwrap();
        assert_eq!(s3.label, "Bucket");
        assert!(!s3.bare_name_ids);
        assert_eq!(
            catalog.iter().filter(|s| s.key == "s3").count(),
            1
        );
    }
}

//! Table-driven location code lookup.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use super::traits::BaseLocationResolver;

/// One configured `source/location=code` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationCode {
    pub source: String,
    pub location: String,
    pub code: String,
}

impl LocationCode {
    pub fn new(
        source: impl Into<String>,
        location: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            location: location.into(),
            code: code.into(),
        }
    }
}

/// Resolves location codes from a fixed table. Locations match
/// case-insensitively with surrounding whitespace ignored.
#[derive(Debug, Default)]
pub struct StaticLocationResolver {
    codes: HashMap<(String, String), String>,
}

impl StaticLocationResolver {
    pub fn new(entries: impl IntoIterator<Item = LocationCode>) -> Self {
        let codes = entries
            .into_iter()
            .map(|entry| ((entry.source, normalize(&entry.location)), entry.code))
            .collect();
        Self { codes }
    }
}

fn normalize(location: &str) -> String {
    location.trim().to_lowercase()
}

#[async_trait]
impl BaseLocationResolver for StaticLocationResolver {
    async fn resolve(&self, source_name: &str, location: &str) -> Result<Option<String>> {
        Ok(self
            .codes
            .get(&(source_name.to_string(), normalize(location)))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> StaticLocationResolver {
        StaticLocationResolver::new([
            LocationCode::new("agoda_spider", "Bangkok", "9395"),
            LocationCode::new("agoda_spider", "New York", "318"),
        ])
    }

    #[tokio::test]
    async fn test_resolves_case_insensitively() {
        let code = resolver().resolve("agoda_spider", "  new york ").await.unwrap();
        assert_eq!(code.as_deref(), Some("318"));
    }

    #[tokio::test]
    async fn test_unknown_location_or_source() {
        let resolver = resolver();
        assert!(resolver.resolve("agoda_spider", "Lima").await.unwrap().is_none());
        assert!(resolver.resolve("booking_spider", "Bangkok").await.unwrap().is_none());
    }
}

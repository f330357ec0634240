use serde::{Deserialize, Serialize};

/// A crawl source the dispatcher fans out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Crawl argument carrying a source-local location code
    /// (e.g. `agoda_city_id`). `None` when the source searches by name only.
    pub location_code_arg: Option<String>,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location_code_arg: None,
        }
    }

    pub fn with_location_code(name: impl Into<String>, arg: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location_code_arg: Some(arg.into()),
        }
    }

    pub fn needs_location_code(&self) -> bool {
        self.location_code_arg.is_some()
    }
}

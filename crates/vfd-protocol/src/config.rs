//! Spindle configuration.
//!
//! ```yaml
//! model: SKI780
//! speed_map: "0=0% 1000=0% 24000=100%"
//! ```

use crate::error::{VfdError, VfdResult};
use crate::speed_map::SpeedMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VfdConfig {
    /// Registry name of the drive, case-insensitive.
    pub model: String,
    /// Optional RPM to percentage table. When absent, shelf speeds are
    /// derived from the limits read during initialization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_map: Option<String>,
}

impl VfdConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            speed_map: None,
        }
    }

    pub fn with_speed_map(mut self, speed_map: impl Into<String>) -> Self {
        self.speed_map = Some(speed_map.into());
        self
    }

    /// Parse and validate a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`VfdError::Config`] for malformed YAML or an empty model name
    /// and [`VfdError::InvalidSpeedMap`] for a bad speed map.
    pub fn from_yaml_str(yaml: &str) -> VfdResult<Self> {
        let config: VfdConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`VfdError::Config`] if serialization fails.
    pub fn to_yaml_string(&self) -> VfdResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check everything that can be checked without a registry.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> VfdResult<()> {
        if self.model.trim().is_empty() {
            return Err(VfdError::Config("model name is empty".into()));
        }
        self.speed_map()?;
        Ok(())
    }

    /// The configured speed map, parsed.
    ///
    /// # Errors
    ///
    /// Returns [`VfdError::InvalidSpeedMap`] if the text does not parse.
    pub fn speed_map(&self) -> VfdResult<Option<SpeedMap>> {
        self.speed_map
            .as_deref()
            .map(str::parse::<SpeedMap>)
            .transpose()
    }
}

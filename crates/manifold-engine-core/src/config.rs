//! Aggregated engine configuration.
//!
//! Each subsystem defines its own parameter struct next to its algorithm;
//! this module composes them into one serde-friendly [`EngineConfig`] so a
//! deployment can ship a single config document.

use serde::{Deserialize, Serialize};

use manifold_engine_attribution::WeigherConfig;

use crate::clustering::ChrParams;
use crate::curvature::CurvatureParams;
use crate::encoder::EncoderConfig;
use crate::error::{EngineError, EngineResult};
use crate::spectral::SpectralParams;

/// Full configuration for one structuring pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Clustering parameters
    #[serde(default)]
    pub chr: ChrParams,
    /// Curvature estimation parameters
    #[serde(default)]
    pub curvature: CurvatureParams,
    /// Spectral filter parameters
    #[serde(default)]
    pub spectral: SpectralParams,
    /// Packet encoder configuration
    #[serde(default)]
    pub encoder: EncoderConfig,
    /// Attribution weigher configuration
    #[serde(default)]
    pub weigher: WeigherConfig,
}

impl EngineConfig {
    /// Validate every subsystem's configuration.
    pub fn validate(&self) -> EngineResult<()> {
        self.chr.validate()?;
        self.curvature.validate()?;
        self.spectral.validate()?;
        self.encoder.validate()?;
        self.weigher.validate().map_err(EngineError::Attribution)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn invalid_subsystem_config_is_caught() {
        let mut config = EngineConfig::default();
        config.chr.k = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.weigher.decay_half_life = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_roundtrip_preserves_config() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"chr": {"k": 5, "iters": 10, "bins": 5, "beta": 0.3, "seed": 1, "granularity": "sentences", "restarts": 2}}"#).unwrap();
        assert_eq!(config.chr.k, 5);
        assert_eq!(config.encoder, EncoderConfig::default());
    }
}

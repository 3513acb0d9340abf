//! Render configuration: the knobs a scene-independent driver needs (AA
//! sampling, filter, adaptive threshold, photon-map budgets, thread count).
//! Building a `Scene` from a file format stays out of scope, but the values
//! that drive the sampling/integration loop still need somewhere to live
//! other than scattered call-site literals — this is that struct, loadable
//! from TOML or built programmatically.

use serde::Deserialize;

use crate::splitter::TilesOrder;

use crate::Float;

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Box,
    Gaussian,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub samples_per_pixel: usize,
    pub passes: u32,
    pub adaptive_threshold: Float,
    pub filter_kind: FilterKindConfig,
    pub filter_width: Float,
}

/// `serde`-friendly mirror of [`FilterKind`] with a width, since the filter
/// itself is constructed once the kind and width are both known.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKindConfig {
    Box,
    Gaussian { alpha: Float },
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 16,
            passes: 1,
            adaptive_threshold: 0.01,
            filter_kind: FilterKindConfig::Box,
            filter_width: 0.5,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PhotonMapConfig {
    pub caustic_photons: usize,
    pub diffuse_photons: usize,
    pub search_count: usize,
    pub search_radius: Float,
    pub final_gather_samples: usize,
    pub hash_grid_threshold: usize,
}

impl Default for PhotonMapConfig {
    fn default() -> Self {
        Self {
            caustic_photons: 200_000,
            diffuse_photons: 500_000,
            search_count: 50,
            search_radius: 0.5,
            final_gather_samples: 16,
            hash_grid_threshold: 10_000,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub sampling: SamplingConfig,
    pub photon_map: PhotonMapConfig,
    pub tile_size: i32,
    pub tile_order: TilesOrderConfig,
    pub thread_count: Option<usize>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TilesOrderConfig {
    Linear,
    Random,
    CentreRandom,
}

impl From<TilesOrderConfig> for TilesOrder {
    fn from(cfg: TilesOrderConfig) -> Self {
        match cfg {
            TilesOrderConfig::Linear => TilesOrder::Linear,
            TilesOrderConfig::Random => TilesOrder::Random,
            TilesOrderConfig::CentreRandom => TilesOrder::CentreRandom,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            photon_map: PhotonMapConfig::default(),
            tile_size: 32,
            tile_order: TilesOrderConfig::CentreRandom,
            thread_count: None,
        }
    }
}

impl RenderConfig {
    pub fn from_toml_str(s: &str) -> crate::RenderResult<Self> {
        toml::from_str(s).map_err(|e| crate::RenderError::InvalidParameter(e.to_string()))
    }

    pub fn effective_thread_count(&self) -> usize {
        self.thread_count.unwrap_or_else(rayon::current_num_threads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = RenderConfig::default();
        assert_eq!(config.sampling.samples_per_pixel, 16);
        assert!(config.effective_thread_count() >= 1);
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config = RenderConfig::from_toml_str(
            r#"
            [sampling]
            samples_per_pixel = 64
            "#,
        )
        .unwrap();
        assert_eq!(config.sampling.samples_per_pixel, 64);
        assert_eq!(config.tile_size, 32);
    }
}

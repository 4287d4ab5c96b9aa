use std::{
    collections::HashMap,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use vg_runtime::DEFAULT_VIEW;
use vg_schema::{Granularity, MapStyle, ViewState, FALLBACK_COLOR};

pub const BUILTIN_VIEWER_CONFIG: &str = include_str!("data/viewer_config.json");

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    opacity: OpacityConfig,
    zoom: ZoomConfig,
    tap: TapConfig,
    fallback_color: String,
    fallback_view: ViewState,
    style_urls: HashMap<MapStyle, String>,
    description_base_url: String,
}

impl ViewerConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            ViewerConfig::from_json_str(BUILTIN_VIEWER_CONFIG)
                .expect("builtin viewer config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, ViewerConfigError> {
        let config: ViewerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ViewerConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ViewerConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ViewerConfig::from_json_str(&contents)
    }

    fn validate(&self) -> Result<(), ViewerConfigError> {
        let opacity = &self.opacity;
        let levels = Granularity::ALL
            .iter()
            .flat_map(|g| [opacity.default.get(*g), opacity.selected.get(*g)]);
        if levels
            .chain([opacity.dimmed])
            .any(|value| !(0.0..=1.0).contains(&value))
        {
            return Err(ViewerConfigError::Invalid(
                "opacity values must lie in [0, 1]".to_string(),
            ));
        }
        if self.zoom.medium_min_zoom > self.zoom.fine_min_zoom {
            return Err(ViewerConfigError::Invalid(format!(
                "medium_min_zoom {} exceeds fine_min_zoom {}",
                self.zoom.medium_min_zoom, self.zoom.fine_min_zoom
            )));
        }
        if self.tap.reset_margin_ms >= self.tap.double_tap_ms {
            return Err(ViewerConfigError::Invalid(
                "tap reset margin must be shorter than the double tap window".to_string(),
            ));
        }
        Ok(())
    }

    pub fn opacity(&self) -> &OpacityConfig {
        &self.opacity
    }

    pub fn zoom(&self) -> &ZoomConfig {
        &self.zoom
    }

    pub fn tap(&self) -> &TapConfig {
        &self.tap
    }

    pub fn fallback_color(&self) -> &str {
        &self.fallback_color
    }

    pub fn fallback_view(&self) -> ViewState {
        self.fallback_view
    }

    /// Style URL to load for `style`; unknown styles fall back to standard.
    pub fn style_url(&self, style: MapStyle) -> Option<&str> {
        self.style_urls
            .get(&style)
            .or_else(|| self.style_urls.get(&MapStyle::Standard))
            .map(String::as_str)
    }

    pub fn description_base_url(&self) -> &str {
        &self.description_base_url
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            opacity: OpacityConfig::default(),
            zoom: ZoomConfig::default(),
            tap: TapConfig::default(),
            fallback_color: FALLBACK_COLOR.to_string(),
            fallback_view: DEFAULT_VIEW,
            style_urls: HashMap::new(),
            description_base_url: String::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ViewerConfigError {
    #[error("failed to parse viewer config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read viewer config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid viewer config: {0}")]
    Invalid(String),
}

/// One value per granularity layer.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct LevelValues {
    pub coarse: f32,
    pub medium: f32,
    pub fine: f32,
}

impl LevelValues {
    pub fn get(&self, granularity: Granularity) -> f32 {
        match granularity {
            Granularity::Coarse => self.coarse,
            Granularity::Medium => self.medium,
            Granularity::Fine => self.fine,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpacityConfig {
    default: LevelValues,
    selected: LevelValues,
    dimmed: f32,
}

impl OpacityConfig {
    /// Opacity of a layer with nothing selected.
    pub fn default_for(&self, granularity: Granularity) -> f32 {
        self.default.get(granularity)
    }

    /// Opacity of the features that belong to the selection.
    pub fn selected_for(&self, granularity: Granularity) -> f32 {
        self.selected.get(granularity)
    }

    pub fn dimmed(&self) -> f32 {
        self.dimmed
    }
}

impl Default for OpacityConfig {
    fn default() -> Self {
        Self {
            default: LevelValues {
                coarse: 0.5,
                medium: 0.5,
                fine: 0.55,
            },
            selected: LevelValues {
                coarse: 0.9,
                medium: 0.85,
                fine: 0.8,
            },
            dimmed: 0.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    medium_min_zoom: f64,
    fine_min_zoom: f64,
}

impl ZoomConfig {
    pub fn new(medium_min_zoom: f64, fine_min_zoom: f64) -> Self {
        Self {
            medium_min_zoom,
            fine_min_zoom,
        }
    }

    pub fn medium_min_zoom(&self) -> f64 {
        self.medium_min_zoom
    }

    pub fn fine_min_zoom(&self) -> f64 {
        self.fine_min_zoom
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self::new(8.0, 10.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    double_tap_ms: u64,
    reset_margin_ms: u64,
}

impl TapConfig {
    pub fn new(double_tap_ms: u64, reset_margin_ms: u64) -> Self {
        Self {
            double_tap_ms,
            reset_margin_ms,
        }
    }

    /// Delay before a single tap is acted upon.
    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_ms)
    }

    /// Lifetime of the "first tap seen" flag. Slightly shorter than the
    /// window so the flag is cleared before the deferred action runs.
    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.double_tap_ms.saturating_sub(self.reset_margin_ms))
    }
}

impl Default for TapConfig {
    fn default() -> Self {
        Self::new(250, 5)
    }
}

#[derive(Debug, Clone)]
pub struct ViewerConfigMetadata {
    path: Option<PathBuf>,
}

impl ViewerConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

pub fn load_viewer_config_from_env() -> (Arc<ViewerConfig>, ViewerConfigMetadata) {
    let override_path = env::var("VG_VIEWER_CONFIG_PATH").ok().map(PathBuf::from);
    let default_path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/viewer_config.json");
    let path = override_path.unwrap_or(default_path);

    match ViewerConfig::from_file(&path) {
        Ok(config) => {
            tracing::info!(
                target: "vegmap::config",
                path = %path.display(),
                "viewer_config.loaded=file"
            );
            return (Arc::new(config), ViewerConfigMetadata::new(Some(path)));
        }
        Err(err) => {
            tracing::warn!(
                target: "vegmap::config",
                path = %path.display(),
                error = %err,
                "viewer_config.load_failed"
            );
        }
    }

    let config = ViewerConfig::builtin();
    tracing::info!(target: "vegmap::config", "viewer_config.loaded=builtin");
    (config, ViewerConfigMetadata::new(None))
}

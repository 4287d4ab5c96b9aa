//! Classification engine for the vegetation map.
//!
//! Resolves vegetation codes to legend chains, compiles code lists and
//! ecological categories into per-layer renderer filters, and keeps the
//! opacity and color state of the three granularity layers consistent through
//! a [`MapSession`].

pub mod catalog;
pub mod colors;
pub mod descriptions;
pub mod filters;
pub mod legend;
pub mod opacity;
pub mod session;
pub mod settings;
pub mod tap_gate;
pub mod taxonomy;
pub mod viewer_config;
pub mod zoom;

pub use catalog::{selected_codes, toggle_code, CatalogEntry, CatalogPage, CodeCatalog};
pub use colors::{ColorOverrides, ColorTable};
pub use descriptions::{
    resolve_asset_url, DescriptionBody, DescriptionError, DescriptionLoader, DescriptionService,
    DescriptionView, DirectoryDescriptionService, LegendDescriptions, MemoryDescriptionService,
};
pub use filters::{
    compile_advanced_layer_filters, compile_category_layer_filters, compile_codes_layer_filters,
    selector_matches,
};
pub use legend::{describe_code, resolve_legend_chain, LegendView};
pub use opacity::{compute_fill_opacity, target_codes};
pub use session::{
    Effects, LegendChange, LegendPanel, MapSession, PopupChange, Selection, SessionState,
    TapAction,
};
pub use settings::{
    JsonFileSettingsStore, MemorySettingsStore, Settings, SettingsChange, SettingsError,
    SettingsStore, SETTINGS_LAYER_OPACITY_KEY, SETTINGS_MAP_STYLE_KEY,
};
pub use tap_gate::{ClientKind, TapGate};
pub use taxonomy::{
    load_taxonomy_from_env, CategoryPartition, Ecology, Taxonomy, TaxonomyData, TaxonomyError,
    TaxonomyMetadata,
};
pub use viewer_config::{
    load_viewer_config_from_env, OpacityConfig, TapConfig, ViewerConfig, ViewerConfigError,
    ViewerConfigMetadata, ZoomConfig,
};
pub use zoom::{granularity_for_zoom, legend_granularity_after_zoom, rescale_code, RescaleError};

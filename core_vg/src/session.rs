//! The map session: selection, filters, opacity and color state for one map
//! view, and the renderer updates every change produces.
//!
//! All methods run synchronously on the caller's thread and return an
//! [`Effects`] value describing what the renderer and the surrounding UI
//! should do. Nothing is broadcast implicitly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use vg_runtime::{merge_view_query, parse_view_query, FilterParseError};
use vg_schema::{
    CategoryFilter, Granularity, LayerFilter, LayerFilters, LayerId, LayerUpdate, MapStyle,
    OpacityValue, PaintProperty, PaintValue, RawCode, ViewState,
};

use crate::{
    colors::ColorOverrides,
    descriptions::{DescriptionLoader, LegendDescriptions},
    filters::{compile_advanced_layer_filters, compile_category_layer_filters},
    legend::{resolve_legend_chain, LegendView},
    opacity::compute_fill_opacity,
    settings::{SettingsChange, DEFAULT_LAYER_OPACITY},
    tap_gate::{ClientKind, TapGate},
    taxonomy::Taxonomy,
    viewer_config::ViewerConfig,
    zoom::{granularity_for_zoom, legend_granularity_after_zoom, rescale_code},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub raw_code: RawCode,
    pub code_granularity: Granularity,
    /// Level the legend panel currently shows; follows the zoom.
    pub legend_granularity: Granularity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub selection: Option<Selection>,
    pub advanced_filter_text: String,
    pub category_filter: CategoryFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendPanel {
    pub raw_code: RawCode,
    pub color: String,
    #[serde(flatten)]
    pub view: LegendView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "legend", rename_all = "snake_case")]
pub enum LegendChange {
    Shown(LegendPanel),
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "popup", rename_all = "snake_case")]
pub enum PopupChange {
    Open { name: String },
    Close,
}

/// Deferred map interaction, released by the tap gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapAction {
    Select {
        raw_code: RawCode,
        granularity: Granularity,
    },
    Deselect,
}

/// Everything one session call asks of the outside world.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Effects {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub updates: Vec<LayerUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<LegendChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popup: Option<PopupChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_request: Option<u64>,
}

impl Effects {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
            && self.legend.is_none()
            && self.popup.is_none()
            && self.view_query.is_none()
            && self.description_request.is_none()
    }

    /// Folds `later` into `self`; the later legend and popup changes win.
    pub fn merge(&mut self, later: Effects) {
        self.updates.extend(later.updates);
        if later.legend.is_some() {
            self.legend = later.legend;
        }
        if later.popup.is_some() {
            self.popup = later.popup;
        }
        if later.view_query.is_some() {
            self.view_query = later.view_query;
        }
        if later.description_request.is_some() {
            self.description_request = later.description_request;
        }
    }
}

pub struct MapSession {
    taxonomy: Arc<Taxonomy>,
    config: Arc<ViewerConfig>,
    colors: ColorOverrides,
    state: SessionState,
    filters: LayerFilters,
    opacity: [OpacityValue; 3],
    opacity_multiplier: f32,
    style: MapStyle,
    view: ViewState,
    /// Page query string, rewritten on every view change.
    query: String,
    map_granularity: Granularity,
    taps: TapGate<TapAction>,
    descriptions: Option<DescriptionLoader>,
}

impl MapSession {
    pub fn new(taxonomy: Arc<Taxonomy>, config: Arc<ViewerConfig>, client: ClientKind) -> Self {
        let colors = ColorOverrides::from_taxonomy(&taxonomy, config.fallback_color());
        let opacity = Granularity::ALL.map(|g| OpacityValue::Constant(config.opacity().default_for(g)));
        let view = config.fallback_view();
        let map_granularity = granularity_for_zoom(config.zoom(), view.zoom);
        let taps = TapGate::new(client, config.tap().clone());
        Self {
            taxonomy,
            config,
            colors,
            state: SessionState::default(),
            filters: LayerFilters::unrestricted(),
            opacity,
            opacity_multiplier: DEFAULT_LAYER_OPACITY,
            style: MapStyle::default(),
            view,
            query: String::new(),
            map_granularity,
            taps,
            descriptions: None,
        }
    }

    /// Starts from persisted settings instead of the defaults.
    pub fn with_settings(mut self, style: MapStyle, opacity_multiplier: f32) -> Self {
        self.style = style;
        self.opacity_multiplier = opacity_multiplier.clamp(0.0, 1.0);
        self
    }

    /// Starts at the view stored in the page query string. Missing or
    /// unreadable values fall back to the configured view.
    pub fn with_query(mut self, query: &str) -> Self {
        self.view = parse_view_query(query, self.config.fallback_view());
        self.map_granularity = granularity_for_zoom(self.config.zoom(), self.view.zoom);
        self.query = query.to_string();
        self
    }

    pub fn with_descriptions(mut self, loader: DescriptionLoader) -> Self {
        self.descriptions = Some(loader);
        self
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn filters(&self) -> &LayerFilters {
        &self.filters
    }

    pub fn colors(&self) -> &ColorOverrides {
        &self.colors
    }

    pub fn style(&self) -> MapStyle {
        self.style
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn map_granularity(&self) -> Granularity {
        self.map_granularity
    }

    /// Unscaled opacity currently applied to a layer.
    pub fn fill_opacity(&self, granularity: Granularity) -> &OpacityValue {
        &self.opacity[granularity as usize]
    }

    pub fn opacity_multiplier(&self) -> f32 {
        self.opacity_multiplier
    }

    /// Full renderer state, as needed when the style (re)loads.
    pub fn initial_layer_state(&self) -> Vec<LayerUpdate> {
        let mut updates = Vec::new();
        if let Some(url) = self.config.style_url(self.style) {
            updates.push(LayerUpdate::SetStyle {
                style: self.style,
                url: url.to_string(),
            });
        }
        updates.extend(self.layer_state());
        updates
    }

    fn layer_state(&self) -> Vec<LayerUpdate> {
        let mut updates = self.filter_updates();
        for granularity in Granularity::ALL {
            updates.push(self.color_update(granularity));
        }
        updates.extend(self.opacity_updates());
        updates.extend(self.emissive_updates());
        updates
    }

    fn filter_updates(&self) -> Vec<LayerUpdate> {
        let filter_for = |layer: LayerId| -> Option<LayerFilter> {
            self.filters.get(layer.granularity()).cloned()
        };
        LayerId::ALL
            .iter()
            .map(|layer| LayerUpdate::SetFilter {
                layer: *layer,
                filter: filter_for(*layer),
            })
            .collect()
    }

    fn color_update(&self, granularity: Granularity) -> LayerUpdate {
        LayerUpdate::SetPaint {
            layer: granularity.layer(),
            property: PaintProperty::FillColor,
            value: PaintValue::Color(self.colors.build_fill_color_match_expression(granularity)),
        }
    }

    fn opacity_updates(&self) -> Vec<LayerUpdate> {
        let scaled =
            |granularity: Granularity| self.opacity[granularity as usize].scaled(self.opacity_multiplier);
        let mut updates: Vec<LayerUpdate> = Granularity::ALL
            .iter()
            .map(|granularity| LayerUpdate::SetPaint {
                layer: granularity.layer(),
                property: PaintProperty::FillOpacity,
                value: PaintValue::Opacity(scaled(*granularity)),
            })
            .collect();
        updates.push(LayerUpdate::SetPaint {
            layer: LayerId::FineLabels,
            property: PaintProperty::TextOpacity,
            value: PaintValue::Opacity(scaled(Granularity::Fine)),
        });
        updates
    }

    fn emissive_updates(&self) -> Vec<LayerUpdate> {
        Granularity::ALL
            .iter()
            .map(|granularity| LayerUpdate::SetPaint {
                layer: granularity.layer(),
                property: PaintProperty::FillEmissiveStrength,
                value: PaintValue::Number(self.style.fill_emissive_strength()),
            })
            .collect()
    }

    fn recompute_opacity(&mut self) {
        let (selected, selection_granularity) = match self.state.selection {
            Some(selection) => (Some(selection.raw_code), selection.code_granularity),
            None => (None, Granularity::Fine),
        };
        for target in Granularity::ALL {
            self.opacity[target as usize] = compute_fill_opacity(
                &self.taxonomy,
                self.config.opacity(),
                selected,
                selection_granularity,
                target,
            );
        }
    }

    fn legend_panel(&mut self, raw_code: RawCode, granularity: Granularity, effects: &mut Effects) {
        let change = match LegendView::build(&self.taxonomy, raw_code, granularity) {
            Some(view) => {
                if let Some(loader) = self.descriptions.as_mut() {
                    effects.description_request = Some(loader.request(&view.chain));
                }
                LegendChange::Shown(LegendPanel {
                    raw_code,
                    color: self.colors.code_color(raw_code, granularity).to_string(),
                    view,
                })
            }
            None => {
                tracing::debug!(
                    target: "vegmap::session",
                    code = raw_code,
                    granularity = %granularity,
                    "legend.lookup=miss"
                );
                if let Some(loader) = self.descriptions.as_mut() {
                    loader.cancel();
                }
                LegendChange::Hidden
            }
        };
        effects.legend = Some(change);
    }

    fn run(&mut self, actions: Vec<TapAction>) -> Effects {
        let mut effects = Effects::default();
        for action in actions {
            let next = match action {
                TapAction::Select {
                    raw_code,
                    granularity,
                } => self.select(raw_code, granularity),
                TapAction::Deselect => self.deselect(),
            };
            effects.merge(next);
        }
        effects
    }

    /// A feature with `raw_code` on the `granularity` layer was clicked.
    pub fn click(&mut self, raw_code: RawCode, granularity: Granularity, now: Instant) -> Effects {
        let released = self.taps.single_click(
            now,
            TapAction::Select {
                raw_code,
                granularity,
            },
        );
        self.run(released)
    }

    /// A click that hit none of the vegetation layers.
    pub fn click_empty(&mut self, now: Instant) -> Effects {
        let released = self.taps.single_click(now, TapAction::Deselect);
        self.run(released)
    }

    pub fn touch_start(&mut self, now: Instant) -> Effects {
        let released = self.taps.touch_start(now);
        self.run(released)
    }

    /// Lets deferred taps due at `now` take effect.
    pub fn advance(&mut self, now: Instant) -> Effects {
        let released = self.taps.advance(now);
        self.run(released)
    }

    pub fn select(&mut self, raw_code: RawCode, granularity: Granularity) -> Effects {
        let mut effects = Effects::default();
        let unchanged = self.state.selection.is_some_and(|selection| {
            selection.raw_code == raw_code && selection.code_granularity == granularity
        });

        if !unchanged {
            self.state.selection = Some(Selection {
                raw_code,
                code_granularity: granularity,
                legend_granularity: granularity,
            });
            self.recompute_opacity();
            effects.updates.extend(self.opacity_updates());
            self.legend_panel(raw_code, granularity, &mut effects);
            tracing::info!(
                target: "vegmap::session",
                code = raw_code,
                granularity = %granularity,
                "selection.changed"
            );
        }

        if self.taps.kind() == ClientKind::Desktop {
            let chain = resolve_legend_chain(&self.taxonomy, raw_code, granularity);
            if let Some(head) = chain.head() {
                effects.popup = Some(PopupChange::Open {
                    name: head.name.clone(),
                });
            }
        }
        effects
    }

    pub fn deselect(&mut self) -> Effects {
        let mut effects = Effects::default();
        if self.state.selection.take().is_some() {
            tracing::info!(target: "vegmap::session", "selection.cleared");
        }
        self.recompute_opacity();
        effects.updates.extend(self.opacity_updates());
        effects.legend = Some(LegendChange::Hidden);
        effects.popup = Some(PopupChange::Close);
        if let Some(loader) = self.descriptions.as_mut() {
            loader.cancel();
        }
        effects
    }

    /// The map finished zooming. Moves the legend to the level the map shows
    /// when the selection allows it.
    pub fn zoom_end(&mut self, view: ViewState) -> Effects {
        let mut effects = Effects {
            view_query: Some(self.sync_view(view)),
            ..Effects::default()
        };
        self.map_granularity = granularity_for_zoom(self.config.zoom(), view.zoom);

        let Some(selection) = self.state.selection else {
            return effects;
        };
        let desired = legend_granularity_after_zoom(selection.code_granularity, self.map_granularity);
        if desired == selection.legend_granularity {
            return effects;
        }

        match rescale_code(selection.raw_code, selection.code_granularity, desired) {
            Ok(raw_code) => {
                self.state.selection = Some(Selection {
                    legend_granularity: desired,
                    ..selection
                });
                self.legend_panel(raw_code, desired, &mut effects);
            }
            Err(err) => {
                tracing::error!(
                    target: "vegmap::session",
                    error = %err,
                    "legend.rescale_failed"
                );
            }
        }
        effects
    }

    pub fn move_end(&mut self, view: ViewState) -> Effects {
        Effects {
            view_query: Some(self.sync_view(view)),
            ..Effects::default()
        }
    }

    fn sync_view(&mut self, view: ViewState) -> String {
        self.view = view;
        self.query = merge_view_query(&self.query, &view);
        self.query.clone()
    }

    fn apply_filters(&mut self, filters: LayerFilters) -> Effects {
        self.filters = filters;
        Effects {
            updates: self.filter_updates(),
            ..Effects::default()
        }
    }

    /// Applies the advanced filter text. Invalid text leaves the session
    /// untouched.
    pub fn set_advanced_filter(&mut self, text: &str) -> Result<Effects, FilterParseError> {
        let filters = compile_advanced_layer_filters(&self.taxonomy, text).map_err(|err| {
            tracing::warn!(
                target: "vegmap::session",
                text,
                error = %err,
                "filter.advanced=rejected"
            );
            err
        })?;
        self.state.advanced_filter_text = text.to_string();
        Ok(self.apply_filters(filters))
    }

    /// Applies an ecological category. `Disabled` records the choice and
    /// leaves the current filters in place.
    pub fn set_category_filter(&mut self, category: CategoryFilter) -> Effects {
        self.state.category_filter = category;
        if category == CategoryFilter::Disabled {
            return Effects::default();
        }
        let filters = compile_category_layer_filters(&self.taxonomy, category);
        self.apply_filters(filters)
    }

    pub fn set_code_color(&mut self, raw_code: RawCode, granularity: Granularity, color: &str) -> Effects {
        self.colors.set_code_color(raw_code, granularity, color);
        Effects {
            updates: vec![self.color_update(granularity)],
            ..Effects::default()
        }
    }

    pub fn apply_settings_change(&mut self, change: SettingsChange) -> Effects {
        match change {
            SettingsChange::MapStyle { style } => {
                self.style = style;
                tracing::info!(target: "vegmap::session", style = style.as_str(), "style.changed");
                Effects {
                    updates: self.initial_layer_state(),
                    ..Effects::default()
                }
            }
            SettingsChange::LayerOpacity { value } => {
                self.opacity_multiplier = value.clamp(0.0, 1.0);
                Effects {
                    updates: self.opacity_updates(),
                    ..Effects::default()
                }
            }
        }
    }

    pub fn poll_descriptions(&mut self) -> Option<LegendDescriptions> {
        self.descriptions.as_mut()?.poll()
    }

    pub fn wait_descriptions(&mut self, timeout: Duration) -> Option<LegendDescriptions> {
        self.descriptions.as_mut()?.wait_latest(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn session(client: ClientKind) -> MapSession {
        MapSession::new(Taxonomy::builtin(), ViewerConfig::builtin(), client)
    }

    fn opacity_of(effects: &Effects, layer: LayerId) -> Option<&OpacityValue> {
        effects.updates.iter().find_map(|update| match update {
            LayerUpdate::SetPaint {
                layer: l,
                property: PaintProperty::FillOpacity,
                value: PaintValue::Opacity(value),
            } if *l == layer => Some(value),
            _ => None,
        })
    }

    #[test]
    fn desktop_click_selects_immediately() {
        let mut session = session(ClientKind::Desktop);
        let effects = session.click(570_101, Granularity::Fine, Instant::now());
        assert_eq!(
            session.state().selection.map(|s| s.raw_code),
            Some(570_101)
        );
        assert!(matches!(effects.legend, Some(LegendChange::Shown(_))));
        assert_eq!(
            effects.popup,
            Some(PopupChange::Open {
                name: "水田雑草群落（水田）".to_string()
            })
        );
        assert_eq!(
            opacity_of(&effects, LayerId::Coarse),
            Some(&OpacityValue::Constant(0.5))
        );
        assert_eq!(
            opacity_of(&effects, LayerId::Fine).map(|value| value.evaluate(570_101)),
            Some(0.8)
        );
    }

    #[test]
    fn reselecting_only_reopens_the_popup() {
        let mut session = session(ClientKind::Desktop);
        session.select(5_701, Granularity::Medium);
        let effects = session.select(5_701, Granularity::Medium);
        assert!(effects.updates.is_empty());
        assert!(effects.legend.is_none());
        assert!(effects.popup.is_some());
    }

    #[test]
    fn touch_clients_get_no_popup() {
        let mut session = session(ClientKind::Touch);
        let effects = session.select(5_701, Granularity::Medium);
        assert!(effects.popup.is_none());
        assert!(effects.legend.is_some());
    }

    #[test]
    fn touch_click_waits_for_the_double_tap_window() {
        let mut session = session(ClientKind::Touch);
        let origin = Instant::now();
        session.touch_start(origin);
        assert!(session.click(57, Granularity::Coarse, origin).is_empty());
        assert!(session.state().selection.is_none());
        let effects = session.advance(origin + Duration::from_millis(250));
        assert!(effects.legend.is_some());
        assert_eq!(session.state().selection.map(|s| s.raw_code), Some(57));
    }

    #[test]
    fn deselect_restores_resting_opacity() {
        let mut session = session(ClientKind::Desktop);
        session.select(57, Granularity::Coarse);
        let effects = session.deselect();
        assert_eq!(effects.legend, Some(LegendChange::Hidden));
        assert_eq!(effects.popup, Some(PopupChange::Close));
        assert_eq!(
            opacity_of(&effects, LayerId::Fine),
            Some(&OpacityValue::Constant(0.55))
        );
        assert!(session.state().selection.is_none());
    }

    #[test]
    fn zooming_out_moves_the_legend_up() {
        let mut session = session(ClientKind::Desktop);
        session.select(570_101, Granularity::Fine);
        let effects = session.zoom_end(ViewState {
            lng: 139.0,
            lat: 35.0,
            zoom: 9.0,
        });
        assert_eq!(effects.view_query.as_deref(), Some("?x=35.00000&y=139.00000&z=9.00000"));
        let Some(LegendChange::Shown(panel)) = effects.legend else {
            panic!("legend should move to the medium level");
        };
        assert_eq!(panel.raw_code, 5_701);
        assert_eq!(panel.view.granularity, Granularity::Medium);
        let selection = session.state().selection.unwrap();
        assert_eq!(selection.raw_code, 570_101);
        assert_eq!(selection.legend_granularity, Granularity::Medium);

        // Zooming back in restores the fine legend.
        let effects = session.zoom_end(ViewState {
            lng: 139.0,
            lat: 35.0,
            zoom: 11.0,
        });
        assert!(matches!(
            effects.legend,
            Some(LegendChange::Shown(ref panel)) if panel.raw_code == 570_101
        ));
    }

    #[test]
    fn start_query_sets_the_view_and_level() {
        let started = session(ClientKind::Desktop).with_query("?lang=ja&x=34.7&y=135.5&z=8.5");
        assert_eq!(
            started.view(),
            ViewState {
                lng: 135.5,
                lat: 34.7,
                zoom: 8.5,
            }
        );
        assert_eq!(started.map_granularity(), Granularity::Medium);

        let fallback = session(ClientKind::Desktop).with_query("?lang=ja");
        assert_eq!(fallback.view(), ViewerConfig::builtin().fallback_view());
        assert_eq!(fallback.map_granularity(), Granularity::Fine);
    }

    #[test]
    fn panning_rewrites_only_the_view_parameters() {
        let mut session = session(ClientKind::Desktop).with_query("?lang=ja&z=9");
        let effects = session.move_end(ViewState {
            lng: 135.5,
            lat: 34.7,
            zoom: 9.0,
        });
        assert_eq!(
            effects.view_query.as_deref(),
            Some("?lang=ja&x=34.70000&y=135.50000&z=9.00000")
        );
        assert_eq!(session.query(), "?lang=ja&x=34.70000&y=135.50000&z=9.00000");
        assert!(effects.updates.is_empty());
    }

    #[test]
    fn coarse_selection_ignores_zoom() {
        let mut session = session(ClientKind::Desktop);
        session.select(57, Granularity::Coarse);
        let effects = session.zoom_end(ViewState {
            lng: 139.0,
            lat: 35.0,
            zoom: 12.0,
        });
        assert!(effects.legend.is_none());
    }

    #[test]
    fn invalid_filter_keeps_previous_state() {
        let mut session = session(ClientKind::Desktop);
        session.set_advanced_filter("57").unwrap();
        let before = session.filters().clone();
        assert!(session.set_advanced_filter("57,abc").is_err());
        assert_eq!(session.filters(), &before);
        assert_eq!(session.state().advanced_filter_text, "57");
    }

    #[test]
    fn filters_cover_the_label_layer() {
        let mut session = session(ClientKind::Desktop);
        let effects = session.set_advanced_filter("570101").unwrap();
        assert_eq!(effects.updates.len(), LayerId::ALL.len());
        assert_snapshot!(
            serde_json::to_string(&effects.updates[3]).unwrap(),
            @r#"{"op":"set_filter","layer":"vg67-sai-labels","filter":["in",["get","H"],["literal",[570101]]]}"#
        );
    }

    #[test]
    fn disabled_category_keeps_filters() {
        let mut session = session(ClientKind::Desktop);
        session.set_category_filter(CategoryFilter::Natural);
        let natural = session.filters().clone();
        let effects = session.set_category_filter(CategoryFilter::Disabled);
        assert!(effects.is_empty());
        assert_eq!(session.filters(), &natural);
        session.set_category_filter(CategoryFilter::All);
        assert!(session.filters().is_unrestricted());
    }

    #[test]
    fn recolor_emits_one_paint_update() {
        let mut session = session(ClientKind::Desktop);
        session.set_code_color(57, Granularity::Coarse, "#123456");
        let effects = session.set_code_color(57, Granularity::Coarse, "#654321");
        assert_eq!(effects.updates.len(), 1);
        let LayerUpdate::SetPaint {
            value: PaintValue::Color(expr),
            ..
        } = &effects.updates[0]
        else {
            panic!("expected a fill color update");
        };
        assert_eq!(expr.rules_containing(57), 1);
        assert_eq!(expr.color_for(57), "#654321");
    }

    #[test]
    fn opacity_multiplier_scales_every_layer() {
        let mut session = session(ClientKind::Desktop);
        let effects = session.apply_settings_change(SettingsChange::LayerOpacity { value: 0.5 });
        assert_eq!(
            opacity_of(&effects, LayerId::Fine),
            Some(&OpacityValue::Constant(0.275))
        );
        assert_eq!(effects.updates.len(), 4);
    }

    #[test]
    fn night_style_makes_fills_emissive() {
        let mut session = session(ClientKind::Desktop);
        let effects = session.apply_settings_change(SettingsChange::MapStyle {
            style: MapStyle::Night,
        });
        assert!(matches!(
            effects.updates.first(),
            Some(LayerUpdate::SetStyle {
                style: MapStyle::Night,
                ..
            })
        ));
        assert!(effects.updates.iter().any(|update| matches!(
            update,
            LayerUpdate::SetPaint {
                property: PaintProperty::FillEmissiveStrength,
                value: PaintValue::Number(strength),
                ..
            } if *strength == 1.0
        )));
    }
}

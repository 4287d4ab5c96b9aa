//! Data contracts shared by the vegetation map crates.
//!
//! Everything in here is plain data: classification granularities, the layers
//! they are drawn on, legend entries, and the declarative expressions handed
//! to the map renderer. Behaviour that needs the code taxonomy lives in
//! `core_vg`.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Classification code exactly as stored on a map feature.
pub type RawCode = u32;

/// Largest code accepted anywhere (six digits).
pub const MAX_RAW_CODE: RawCode = 999_999;

/// Color used when no rule matches a feature.
pub const FALLBACK_COLOR: &str = "#000000";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Granularity {
    Coarse = 0,
    Medium = 1,
    Fine = 2,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::Coarse, Granularity::Medium, Granularity::Fine];

    pub fn depth(self) -> u32 {
        self as u32
    }

    /// Feature property carrying the code for this granularity.
    pub fn property_key(self) -> &'static str {
        match self {
            Granularity::Coarse => "D",
            Granularity::Medium => "C",
            Granularity::Fine => "H",
        }
    }

    pub fn layer(self) -> LayerId {
        match self {
            Granularity::Coarse => LayerId::Coarse,
            Granularity::Medium => LayerId::Medium,
            Granularity::Fine => LayerId::Fine,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Granularity::Coarse => "大区分",
            Granularity::Medium => "中区分",
            Granularity::Fine => "細区分",
        }
    }

    pub fn coarser(self) -> Option<Granularity> {
        match self {
            Granularity::Coarse => None,
            Granularity::Medium => Some(Granularity::Coarse),
            Granularity::Fine => Some(Granularity::Medium),
        }
    }

    /// Ancestor of `code` at `target`, or `None` when `target` is finer than
    /// `self` and the digits needed are gone.
    pub fn ancestor_code(self, code: RawCode, target: Granularity) -> Option<RawCode> {
        let steps = self.depth().checked_sub(target.depth())?;
        Some(code / 100u32.pow(steps))
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::Coarse => "coarse",
            Granularity::Medium => "medium",
            Granularity::Fine => "fine",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for Granularity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coarse" | "dai" | "d" => Ok(Granularity::Coarse),
            "medium" | "chu" | "c" => Ok(Granularity::Medium),
            "fine" | "sai" | "h" => Ok(Granularity::Fine),
            other => Err(UnknownVariant {
                kind: "granularity",
                value: other.to_string(),
            }),
        }
    }
}

/// Renderer layers. Fine codes are drawn twice: as fills and as labels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LayerId {
    #[serde(rename = "vg67-dai")]
    Coarse,
    #[serde(rename = "vg67-chu")]
    Medium,
    #[serde(rename = "vg67-sai")]
    Fine,
    #[serde(rename = "vg67-sai-labels")]
    FineLabels,
}

impl LayerId {
    pub const ALL: [LayerId; 4] = [
        LayerId::Coarse,
        LayerId::Medium,
        LayerId::Fine,
        LayerId::FineLabels,
    ];

    pub fn granularity(self) -> Granularity {
        match self {
            LayerId::Coarse => Granularity::Coarse,
            LayerId::Medium => Granularity::Medium,
            LayerId::Fine | LayerId::FineLabels => Granularity::Fine,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LayerId::Coarse => "vg67-dai",
            LayerId::Medium => "vg67-chu",
            LayerId::Fine => "vg67-sai",
            LayerId::FineLabels => "vg67-sai-labels",
        }
    }
}

/// Two composite coarse classes have no legend slot of their own; their
/// legend lives under another coarse code.
pub const SPECIAL_TRANSFORM: [(RawCode, RawCode); 2] = [
    (91, 58), // urban and water area
    (99, 57), // paddy field
];

pub fn special_transform(raw: RawCode) -> Option<RawCode> {
    SPECIAL_TRANSFORM
        .iter()
        .find(|(from, _)| *from == raw)
        .map(|(_, to)| *to)
}

/// Coarse code shown to users for a raw coarse code.
pub fn display_coarse_code(raw: RawCode) -> RawCode {
    special_transform(raw).unwrap_or(raw)
}

/// Raw coarse codes that display as `code`, excluding `code` itself.
pub fn special_aliases(code: RawCode) -> impl Iterator<Item = RawCode> {
    SPECIAL_TRANSFORM
        .into_iter()
        .filter(move |(_, to)| *to == code)
        .map(|(from, _)| from)
}

pub fn is_special_source(raw: RawCode) -> bool {
    special_transform(raw).is_some()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<RawCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_code: Option<RawCode>,
}

impl LegendEntry {
    pub fn coded(name: impl Into<String>, code: RawCode, link_code: RawCode) -> Self {
        Self {
            name: name.into(),
            code: Some(code),
            link_code: Some(link_code),
        }
    }

    /// Ecological category label terminating every chain.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: None,
            link_code: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.code.is_none() && self.link_code.is_none()
    }
}

/// Legend entries for one code, most specific first, root category last.
/// An empty chain means "no legend available".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct LegendChain(Vec<LegendEntry>);

impl LegendChain {
    pub fn new(entries: Vec<LegendEntry>) -> Self {
        Self(entries)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn prepend(mut self, entry: LegendEntry) -> Self {
        self.0.insert(0, entry);
        self
    }

    pub fn entries(&self) -> &[LegendEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn head(&self) -> Option<&LegendEntry> {
        self.0.first()
    }

    pub fn root(&self) -> Option<&LegendEntry> {
        self.0.last()
    }

    /// Entries that have a description asset (everything but the root).
    pub fn described(&self) -> &[LegendEntry] {
        match self.0.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }

    /// Ancestors of the head, root first: `"root > ... > parent >"`.
    pub fn parents_text(&self) -> String {
        let names: Vec<&str> = self
            .0
            .iter()
            .skip(1)
            .rev()
            .map(|entry| entry.name.as_str())
            .collect();
        format!("{} >", names.join(" > "))
    }
}

struct GetProperty(&'static str);

impl Serialize for GetProperty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element("get")?;
        seq.serialize_element(self.0)?;
        seq.end()
    }
}

struct Literal<'a>(&'a [RawCode]);

impl Serialize for Literal<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element("literal")?;
        seq.serialize_element(self.0)?;
        seq.end()
    }
}

/// Set-membership predicate over one layer's code property.
/// Serializes as `["in", ["get", key], ["literal", [codes]]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerFilter {
    pub granularity: Granularity,
    pub codes: Vec<RawCode>,
}

impl LayerFilter {
    pub fn new(granularity: Granularity, codes: Vec<RawCode>) -> Self {
        Self { granularity, codes }
    }
}

impl Serialize for LayerFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element("in")?;
        seq.serialize_element(&GetProperty(self.granularity.property_key()))?;
        seq.serialize_element(&Literal(&self.codes))?;
        seq.end()
    }
}

/// One filter per granularity layer; `None` means "show everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerFilters {
    pub coarse: Option<LayerFilter>,
    pub medium: Option<LayerFilter>,
    pub fine: Option<LayerFilter>,
}

impl LayerFilters {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn get(&self, granularity: Granularity) -> Option<&LayerFilter> {
        match granularity {
            Granularity::Coarse => self.coarse.as_ref(),
            Granularity::Medium => self.medium.as_ref(),
            Granularity::Fine => self.fine.as_ref(),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.coarse.is_none() && self.medium.is_none() && self.fine.is_none()
    }
}

/// Fill opacity for a layer: a constant, or a two-branch match that lifts the
/// selected codes and dims the rest.
#[derive(Debug, Clone, PartialEq)]
pub enum OpacityValue {
    Constant(f32),
    Match {
        granularity: Granularity,
        codes: Vec<RawCode>,
        selected: f32,
        otherwise: f32,
    },
}

impl OpacityValue {
    pub fn evaluate(&self, code: RawCode) -> f32 {
        match self {
            OpacityValue::Constant(value) => *value,
            OpacityValue::Match {
                codes,
                selected,
                otherwise,
                ..
            } => {
                if codes.contains(&code) {
                    *selected
                } else {
                    *otherwise
                }
            }
        }
    }

    pub fn scaled(&self, factor: f32) -> Self {
        match self {
            OpacityValue::Constant(value) => OpacityValue::Constant(value * factor),
            OpacityValue::Match {
                granularity,
                codes,
                selected,
                otherwise,
            } => OpacityValue::Match {
                granularity: *granularity,
                codes: codes.clone(),
                selected: selected * factor,
                otherwise: otherwise * factor,
            },
        }
    }
}

impl Serialize for OpacityValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OpacityValue::Constant(value) => serializer.serialize_f32(*value),
            // A match needs at least one label; with nothing selected every
            // feature takes the dimmed value.
            OpacityValue::Match {
                codes, otherwise, ..
            } if codes.is_empty() => serializer.serialize_f32(*otherwise),
            OpacityValue::Match {
                granularity,
                codes,
                selected,
                otherwise,
            } => {
                let mut seq = serializer.serialize_seq(Some(5))?;
                seq.serialize_element("match")?;
                seq.serialize_element(&GetProperty(granularity.property_key()))?;
                seq.serialize_element(codes)?;
                seq.serialize_element(selected)?;
                seq.serialize_element(otherwise)?;
                seq.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorRule {
    pub codes: Vec<RawCode>,
    pub color: String,
}

/// Fill color expression for a layer. The fallback is always emitted last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMatch {
    granularity: Granularity,
    rules: Vec<ColorRule>,
    fallback: String,
}

impl ColorMatch {
    pub fn new(granularity: Granularity, rules: Vec<ColorRule>, fallback: impl Into<String>) -> Self {
        Self {
            granularity,
            rules,
            fallback: fallback.into(),
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn rules(&self) -> &[ColorRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Color the renderer would pick for `code`: first matching rule wins.
    pub fn color_for(&self, code: RawCode) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.codes.contains(&code))
            .map(|rule| rule.color.as_str())
            .unwrap_or(&self.fallback)
    }

    pub fn rules_containing(&self, code: RawCode) -> usize {
        self.rules
            .iter()
            .filter(|rule| rule.codes.contains(&code))
            .count()
    }
}

impl Serialize for ColorMatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.rules.is_empty() {
            return serializer.serialize_str(&self.fallback);
        }
        let mut seq = serializer.serialize_seq(Some(3 + self.rules.len() * 2))?;
        seq.serialize_element("match")?;
        seq.serialize_element(&GetProperty(self.granularity.property_key()))?;
        for rule in &self.rules {
            seq.serialize_element(&rule.codes)?;
            seq.serialize_element(&rule.color)?;
        }
        seq.serialize_element(&self.fallback)?;
        seq.end()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaintProperty {
    #[serde(rename = "fill-color")]
    FillColor,
    #[serde(rename = "fill-opacity")]
    FillOpacity,
    #[serde(rename = "fill-emissive-strength")]
    FillEmissiveStrength,
    #[serde(rename = "text-opacity")]
    TextOpacity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PaintValue {
    Color(ColorMatch),
    Opacity(OpacityValue),
    Number(f32),
}

/// Instruction for the external map renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LayerUpdate {
    SetFilter {
        layer: LayerId,
        filter: Option<LayerFilter>,
    },
    SetPaint {
        layer: LayerId,
        property: PaintProperty,
        value: PaintValue,
    },
    SetStyle {
        style: MapStyle,
        url: String,
    },
}

impl LayerUpdate {
    pub fn layer(&self) -> Option<LayerId> {
        match self {
            LayerUpdate::SetFilter { layer, .. } | LayerUpdate::SetPaint { layer, .. } => {
                Some(*layer)
            }
            LayerUpdate::SetStyle { .. } => None,
        }
    }
}

/// Ecological category selection for the category filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    All,
    Natural,
    Secondary,
    Disabled,
}

impl Default for CategoryFilter {
    fn default() -> Self {
        CategoryFilter::All
    }
}

impl FromStr for CategoryFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(CategoryFilter::All),
            "natural" => Ok(CategoryFilter::Natural),
            "secondary" => Ok(CategoryFilter::Secondary),
            "disabled" => Ok(CategoryFilter::Disabled),
            other => Err(UnknownVariant {
                kind: "category filter",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MapStyle {
    Standard,
    Light,
    Night,
    Satellite,
}

impl MapStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            MapStyle::Standard => "standard",
            MapStyle::Light => "light",
            MapStyle::Night => "night",
            MapStyle::Satellite => "satellite",
        }
    }

    /// Features glow on styles without ambient light.
    pub fn fill_emissive_strength(self) -> f32 {
        match self {
            MapStyle::Night => 1.0,
            _ => 0.0,
        }
    }
}

impl Default for MapStyle {
    fn default() -> Self {
        MapStyle::Standard
    }
}

impl FromStr for MapStyle {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(MapStyle::Standard),
            "light" => Ok(MapStyle::Light),
            "night" => Ok(MapStyle::Night),
            "satellite" => Ok(MapStyle::Satellite),
            other => Err(UnknownVariant {
                kind: "map style",
                value: other.to_string(),
            }),
        }
    }
}

/// Long-form description asset for a legend entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Description {
    #[serde(default)]
    pub image: Option<String>,
    pub text: String,
}

impl Description {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Map center and zoom as synced to the page URL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ViewState {
    pub lng: f64,
    pub lat: f64,
    pub zoom: f64,
}

//! Per-granularity fill colors: base colors from the taxonomy plus session
//! overrides. The override table is the only mutable state; the renderer
//! expression is regenerated from it on every change.

use std::collections::BTreeMap;

use ahash::AHashMap;
use vg_schema::{ColorMatch, ColorRule, Granularity, RawCode};

use crate::taxonomy::Taxonomy;

#[derive(Debug, Clone)]
pub struct ColorTable {
    granularity: Granularity,
    base: BTreeMap<RawCode, String>,
    /// Most recent first, one entry per code.
    overrides: Vec<(RawCode, String)>,
    fallback: String,
}

impl ColorTable {
    pub fn new(
        granularity: Granularity,
        base: BTreeMap<RawCode, String>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            granularity,
            base,
            overrides: Vec::new(),
            fallback: fallback.into(),
        }
    }

    pub fn set_code_color(&mut self, raw: RawCode, color: impl Into<String>) {
        self.overrides.retain(|(code, _)| *code != raw);
        self.overrides.insert(0, (raw, color.into()));
    }

    pub fn overrides(&self) -> &[(RawCode, String)] {
        &self.overrides
    }

    /// Color a feature with `raw` is drawn with.
    pub fn code_color(&self, raw: RawCode) -> &str {
        self.overrides
            .iter()
            .find(|(code, _)| *code == raw)
            .map(|(_, color)| color.as_str())
            .or_else(|| self.base.get(&raw).map(String::as_str))
            .unwrap_or(&self.fallback)
    }

    pub fn build_fill_color_match_expression(&self) -> ColorMatch {
        let overridden: AHashMap<RawCode, &str> = self
            .overrides
            .iter()
            .map(|(code, color)| (*code, color.as_str()))
            .collect();

        let mut rules: Vec<ColorRule> = self
            .overrides
            .iter()
            .map(|(code, color)| ColorRule {
                codes: vec![*code],
                color: color.clone(),
            })
            .collect();

        // Base colors grouped by value, groups in order of their lowest code.
        let mut group_index: AHashMap<&str, usize> = AHashMap::new();
        let mut groups: Vec<ColorRule> = Vec::new();
        for (code, color) in &self.base {
            if overridden.contains_key(code) {
                continue;
            }
            let index = *group_index.entry(color.as_str()).or_insert_with(|| {
                groups.push(ColorRule {
                    codes: Vec::new(),
                    color: color.clone(),
                });
                groups.len() - 1
            });
            groups[index].codes.push(*code);
        }
        rules.extend(groups);

        ColorMatch::new(self.granularity, rules, self.fallback.clone())
    }
}

/// One color table per granularity layer.
#[derive(Debug, Clone)]
pub struct ColorOverrides {
    tables: [ColorTable; 3],
}

impl ColorOverrides {
    pub fn from_taxonomy(taxonomy: &Taxonomy, fallback: &str) -> Self {
        let table = |granularity: Granularity| {
            ColorTable::new(granularity, taxonomy.base_colors(granularity).clone(), fallback)
        };
        Self {
            tables: [
                table(Granularity::Coarse),
                table(Granularity::Medium),
                table(Granularity::Fine),
            ],
        }
    }

    pub fn table(&self, granularity: Granularity) -> &ColorTable {
        &self.tables[granularity as usize]
    }

    pub fn set_code_color(&mut self, raw: RawCode, granularity: Granularity, color: &str) {
        tracing::debug!(
            target: "vegmap::colors",
            code = raw,
            granularity = %granularity,
            color,
            "color.override=set"
        );
        self.tables[granularity as usize].set_code_color(raw, color);
    }

    pub fn code_color(&self, raw: RawCode, granularity: Granularity) -> &str {
        self.table(granularity).code_color(raw)
    }

    pub fn build_fill_color_match_expression(&self, granularity: Granularity) -> ColorMatch {
        self.table(granularity).build_fill_color_match_expression()
    }
}

//! Legend chains: a raw code and its ancestors as display entries, ending in
//! the ecological category.

use serde::Serialize;
use vg_runtime::{describe_with_name, format_code};
use vg_schema::{display_coarse_code, Granularity, LegendChain, LegendEntry, RawCode};

use crate::taxonomy::Taxonomy;

/// Resolves the legend chain of `raw` at `granularity`. Unknown codes, or an
/// unknown ancestor anywhere up the hierarchy, give an empty chain.
pub fn resolve_legend_chain(
    taxonomy: &Taxonomy,
    raw: RawCode,
    granularity: Granularity,
) -> LegendChain {
    let Some(parent) = granularity.coarser() else {
        return resolve_coarse(taxonomy, raw);
    };

    let parent_chain = resolve_legend_chain(taxonomy, raw / 100, parent);
    if raw % 100 == 0 || parent_chain.is_empty() {
        return parent_chain;
    }
    let Some(name) = taxonomy.legend_name(raw, granularity) else {
        return LegendChain::empty();
    };
    let link_code = match granularity {
        Granularity::Medium => raw * 100,
        _ => raw,
    };
    parent_chain.prepend(LegendEntry::coded(name, raw, link_code))
}

fn resolve_coarse(taxonomy: &Taxonomy, raw: RawCode) -> LegendChain {
    let Some(class) = taxonomy.coarse_class(raw) else {
        return LegendChain::empty();
    };
    let Some(category) = taxonomy.category_name(class.category) else {
        return LegendChain::empty();
    };
    let display = display_coarse_code(raw);
    LegendChain::new(vec![
        LegendEntry::coded(class.name.clone(), display, display * 10_000),
        LegendEntry::root(category),
    ])
}

/// `"中区分/<name>"` for any code of the granularity, `X00` codes included.
pub fn describe_code(taxonomy: &Taxonomy, code: RawCode, granularity: Granularity) -> Option<String> {
    taxonomy
        .name(code, granularity)
        .map(|name| describe_with_name(granularity, name))
}

/// What the legend panel shows for one selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendView {
    pub granularity: Granularity,
    pub code_text: String,
    pub title: String,
    pub parents_text: String,
    pub chain: LegendChain,
}

impl LegendView {
    /// `None` when the chain is empty or its head carries no code.
    ///
    /// The code text shows the selected code itself, so an `X00` code keeps
    /// its own digits even though its title comes from the parent level.
    pub fn build(taxonomy: &Taxonomy, raw: RawCode, granularity: Granularity) -> Option<Self> {
        let chain = resolve_legend_chain(taxonomy, raw, granularity);
        let head = chain.head()?;
        head.code?;
        let shown = match granularity {
            Granularity::Coarse => display_coarse_code(raw),
            _ => raw,
        };
        Some(Self {
            granularity,
            code_text: format_code(shown),
            title: head.name.clone(),
            parents_text: chain.parents_text(),
            chain,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn chain_json(raw: RawCode, granularity: Granularity) -> String {
        let taxonomy = Taxonomy::builtin();
        serde_json::to_string(&resolve_legend_chain(&taxonomy, raw, granularity)).unwrap()
    }

    #[test]
    fn fine_chain_links_every_level() {
        assert_snapshot!(
            chain_json(570_101, Granularity::Fine),
            @r#"[{"name":"水田雑草群落（水田）","code":570101,"linkCode":570101},{"name":"水田雑草群落","code":5701,"linkCode":570100},{"name":"耕作地","code":57,"linkCode":570000},{"name":"植林地・耕作地植生"}]"#
        );
    }

    #[test]
    fn special_coarse_codes_display_their_target() {
        assert_snapshot!(
            chain_json(91, Granularity::Coarse),
            @r#"[{"name":"市街地等（58）","code":58,"linkCode":580000},{"name":"市街地等"}]"#
        );
    }

    #[test]
    fn trailing_zero_codes_fall_through() {
        let taxonomy = Taxonomy::builtin();
        assert_eq!(
            resolve_legend_chain(&taxonomy, 5_700, Granularity::Medium),
            resolve_legend_chain(&taxonomy, 57, Granularity::Coarse)
        );
        assert_eq!(
            resolve_legend_chain(&taxonomy, 570_100, Granularity::Fine),
            resolve_legend_chain(&taxonomy, 5_701, Granularity::Medium)
        );
    }

    #[test]
    fn unknown_codes_give_empty_chains() {
        let taxonomy = Taxonomy::builtin();
        assert!(resolve_legend_chain(&taxonomy, 570_199, Granularity::Fine).is_empty());
        assert!(resolve_legend_chain(&taxonomy, 42, Granularity::Coarse).is_empty());
        // Unknown medium parent poisons an otherwise unknown fine code too.
        assert!(resolve_legend_chain(&taxonomy, 429_901, Granularity::Fine).is_empty());
    }

    #[test]
    fn describe_uses_propagated_names() {
        let taxonomy = Taxonomy::builtin();
        assert_eq!(
            describe_code(&taxonomy, 5_700, Granularity::Medium).as_deref(),
            Some("中区分/耕作地")
        );
        assert_eq!(describe_code(&taxonomy, 4_242, Granularity::Medium), None);
    }

    #[test]
    fn legend_view_formats_the_head() {
        let taxonomy = Taxonomy::builtin();
        let view = LegendView::build(&taxonomy, 5_701, Granularity::Medium).unwrap();
        assert_eq!(view.code_text, "5701**");
        assert_eq!(view.title, "水田雑草群落");
        assert_eq!(view.parents_text, "植林地・耕作地植生 > 耕作地 >");
        assert!(LegendView::build(&taxonomy, 42, Granularity::Coarse).is_none());
    }

    #[test]
    fn legend_view_keeps_the_digits_of_trailing_zero_codes() {
        let taxonomy = Taxonomy::builtin();
        let medium = LegendView::build(&taxonomy, 5_700, Granularity::Medium).unwrap();
        assert_eq!(medium.code_text, "5700**");
        assert_eq!(medium.title, "耕作地");
        let fine = LegendView::build(&taxonomy, 570_100, Granularity::Fine).unwrap();
        assert_eq!(fine.code_text, "570100");
        assert_eq!(fine.title, "水田雑草群落");
        let special = LegendView::build(&taxonomy, 91, Granularity::Coarse).unwrap();
        assert_eq!(special.code_text, "58****");
    }
}

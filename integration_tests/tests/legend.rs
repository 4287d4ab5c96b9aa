mod common;

use core_vg::{describe_code, resolve_legend_chain, LegendView};
use vg_runtime::Granularity;

#[test]
fn fine_chains_start_with_the_code_and_end_in_a_root() {
    let taxonomy = common::test_taxonomy();
    let fine_codes: Vec<u32> = taxonomy
        .codes(Granularity::Fine)
        .filter(|code| code % 100 != 0)
        .collect();
    assert!(!fine_codes.is_empty());

    for code in fine_codes {
        let chain = resolve_legend_chain(&taxonomy, code, Granularity::Fine);
        assert_eq!(chain.head().and_then(|entry| entry.code), Some(code));
        let root = chain.root().expect("non-empty chain");
        assert!(root.is_root(), "chain for {code} should end in a root");
        assert_eq!(chain.len(), 4, "fine chain for {code}");
    }
}

#[test]
fn trailing_zero_medium_codes_resolve_as_their_coarse_parent() {
    let taxonomy = common::test_taxonomy();
    for code in taxonomy
        .codes(Granularity::Medium)
        .filter(|code| code % 100 == 0)
    {
        assert_eq!(
            resolve_legend_chain(&taxonomy, code, Granularity::Medium),
            resolve_legend_chain(&taxonomy, code / 100, Granularity::Coarse),
            "medium code {code}"
        );
    }
}

#[test]
fn link_codes_widen_to_six_digits() {
    let taxonomy = common::test_taxonomy();
    let chain = resolve_legend_chain(&taxonomy, 570_102, Granularity::Fine);
    let links: Vec<Option<u32>> = chain.entries().iter().map(|e| e.link_code).collect();
    assert_eq!(
        links,
        vec![Some(570_102), Some(570_100), Some(570_000), None]
    );
}

#[test]
fn special_codes_show_their_legend_code() {
    let taxonomy = common::test_taxonomy();
    let chain = resolve_legend_chain(&taxonomy, 99, Granularity::Coarse);
    assert_eq!(chain.head().and_then(|entry| entry.code), Some(57));
    assert_eq!(chain.root().map(|entry| entry.name.as_str()), Some("植林地・耕作地植生"));

    let view = LegendView::build(&taxonomy, 99, Granularity::Coarse).unwrap();
    assert_eq!(view.code_text, "57****");
}

#[test]
fn unknown_codes_have_nothing_to_show() {
    let taxonomy = common::test_taxonomy();
    assert!(resolve_legend_chain(&taxonomy, 7, Granularity::Coarse).is_empty());
    assert!(resolve_legend_chain(&taxonomy, 5_799, Granularity::Medium).is_empty());
    assert!(resolve_legend_chain(&taxonomy, 570_150, Granularity::Fine).is_empty());
    assert!(LegendView::build(&taxonomy, 7, Granularity::Coarse).is_none());
    assert_eq!(describe_code(&taxonomy, 7, Granularity::Coarse), None);
}

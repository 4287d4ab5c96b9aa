mod common;

use std::sync::Arc;
use std::time::Duration;

use core_vg::{
    resolve_legend_chain, ClientKind, DescriptionBody, DescriptionError, DescriptionLoader,
    DescriptionService, DirectoryDescriptionService, LegendDescriptions, MapSession, ViewerConfig,
};
use vg_runtime::Granularity;

const BASE_URL: &str = "https://example.invalid/hanrei/";

fn assets() -> DirectoryDescriptionService {
    DirectoryDescriptionService::new(common::fixtures_dir().join("assets"))
}

#[test]
fn directory_service_reads_asset_files() -> anyhow::Result<()> {
    let service = assets();
    let description = service.fetch(570_101)?;
    assert_eq!(description.image.as_deref(), Some("570101.jpg"));
    assert_eq!(service.fetch(570_000)?.image, None);
    assert!(matches!(
        service.fetch(123_456),
        Err(DescriptionError::NotFound(123_456))
    ));
    Ok(())
}

#[test]
fn every_level_of_a_chain_is_described() {
    let taxonomy = common::test_taxonomy();
    let chain = resolve_legend_chain(&taxonomy, 570_101, Granularity::Fine);
    let loaded = LegendDescriptions::fetch(&assets(), BASE_URL, &chain, 1);

    let current = loaded.current.as_ref().unwrap();
    assert_eq!(current.code_text, "570101");
    assert_eq!(
        current.body,
        DescriptionBody::Loaded {
            image_url: Some("https://example.invalid/hanrei/images/570101.jpg".to_string()),
            text: "水田に生育する一年生草本群落。".to_string(),
        }
    );
    let ancestors: Vec<_> = loaded.ancestors.iter().map(|view| view.link_code).collect();
    assert_eq!(ancestors, vec![570_100, 570_000]);
    assert_eq!(loaded.failures(), 0);
}

#[test]
fn a_missing_asset_fails_only_its_own_entry() {
    let taxonomy = common::test_taxonomy();
    let chain = resolve_legend_chain(&taxonomy, 570_102, Granularity::Fine);
    let loaded = LegendDescriptions::fetch(&assets(), BASE_URL, &chain, 1);

    assert_eq!(loaded.failures(), 1);
    let current = loaded.current.unwrap();
    assert_eq!(current.name, "放棄水田雑草群落");
    assert_eq!(
        current.body,
        DescriptionBody::Failed {
            error: "no description for link code 570102".to_string()
        }
    );
    assert!(loaded
        .ancestors
        .iter()
        .all(|view| matches!(view.body, DescriptionBody::Loaded { .. })));
}

#[test]
fn session_selection_requests_descriptions() {
    let loader = DescriptionLoader::new(Arc::new(assets()), BASE_URL);
    let mut session = MapSession::new(
        common::test_taxonomy(),
        ViewerConfig::builtin(),
        ClientKind::Desktop,
    )
    .with_descriptions(loader);

    let first = session.select(570_102, Granularity::Fine);
    let second = session.select(570_101, Granularity::Fine);
    assert!(second.description_request > first.description_request);

    let loaded = session
        .wait_descriptions(Duration::from_secs(5))
        .expect("descriptions for the latest selection");
    assert_eq!(Some(loaded.generation), second.description_request);
    assert_eq!(loaded.current.unwrap().link_code, 570_101);
    assert!(session.poll_descriptions().is_none());
}

#[test]
fn deselecting_discards_pending_descriptions() {
    let loader = DescriptionLoader::new(Arc::new(assets()), BASE_URL);
    let mut session = MapSession::new(
        common::test_taxonomy(),
        ViewerConfig::builtin(),
        ClientKind::Desktop,
    )
    .with_descriptions(loader);

    session.select(570_101, Granularity::Fine);
    session.deselect();
    assert!(session
        .wait_descriptions(Duration::from_millis(200))
        .is_none());
}

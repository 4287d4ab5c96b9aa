use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use core_vg::{
    load_taxonomy_from_env, load_viewer_config_from_env, ClientKind, DescriptionLoader,
    DirectoryDescriptionService, Effects, MapSession, MemorySettingsStore, Settings, Taxonomy,
    ViewerConfig,
};
use serde_json::{json, Value as JsonValue};
use tracing::info;
use vg_runtime::{parse_command_line, MapCommand, ViewState};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replays map interaction scripts against a vegetation map session", long_about = None)]
struct Args {
    /// Script with one command per line (reads stdin when omitted)
    script: Option<PathBuf>,

    /// Taxonomy JSON (defaults to VG_TAXONOMY_PATH, then the bundled data)
    #[arg(long)]
    taxonomy: Option<PathBuf>,

    /// Viewer config JSON (defaults to VG_VIEWER_CONFIG_PATH, then the bundled config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Asset directory holding descriptions/<linkCode>.json
    #[arg(long)]
    descriptions: Option<PathBuf>,

    /// Page query string the map starts from, e.g. "?x=35.68&y=139.77&z=9"
    #[arg(long, default_value = "")]
    query: String,

    /// Behave like a touch client (deferred single taps, no popup)
    #[arg(long)]
    touch: bool,

    /// How long to wait for outstanding descriptions at the end (milliseconds)
    #[arg(long, default_value_t = 2_000)]
    description_timeout_ms: u64,

    /// Pretty-print every output record
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .compact()
        .init();

    let args = Args::parse();

    let taxonomy = match &args.taxonomy {
        Some(path) => Arc::new(
            Taxonomy::from_file(path)
                .with_context(|| format!("Failed to load taxonomy at {}", path.display()))?,
        ),
        None => load_taxonomy_from_env().0,
    };
    let config = match &args.config {
        Some(path) => Arc::new(
            ViewerConfig::from_file(path)
                .with_context(|| format!("Failed to load viewer config at {}", path.display()))?,
        ),
        None => load_viewer_config_from_env().0,
    };

    let script = match &args.script {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read script at {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .with_context(|| "Failed to read script from stdin")?;
            buffer
        }
    };

    let client = if args.touch {
        ClientKind::Touch
    } else {
        ClientKind::Desktop
    };
    let mut settings = Settings::new(MemorySettingsStore::new());
    let mut session = MapSession::new(taxonomy, Arc::clone(&config), client)
        .with_settings(settings.map_style(), settings.layer_opacity())
        .with_query(&args.query);
    if let Some(root) = &args.descriptions {
        let service = DirectoryDescriptionService::new(root);
        let loader = DescriptionLoader::new(Arc::new(service), config.description_base_url());
        session = session.with_descriptions(loader);
    }

    let mut out = Output {
        pretty: args.pretty,
    };
    out.emit(json!({
        "line": 0,
        "updates": session.initial_layer_state(),
    }))?;

    let origin = Instant::now();
    let at = |ms: u64| origin + Duration::from_millis(ms);
    for (index, raw) in script.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let command = parse_command_line(text)
            .with_context(|| format!("Line {line}: failed to parse '{text}'"))?;

        let effects = match &command {
            MapCommand::Click {
                code,
                granularity,
                at_ms,
            } => session.click(*code, *granularity, at(*at_ms)),
            MapCommand::ClickEmpty { at_ms } => session.click_empty(at(*at_ms)),
            MapCommand::Deselect => session.deselect(),
            MapCommand::Touch { at_ms } => session.touch_start(at(*at_ms)),
            MapCommand::Advance { at_ms } => session.advance(at(*at_ms)),
            MapCommand::Zoom { level } => {
                let view = ViewState {
                    zoom: *level,
                    ..session.view()
                };
                session.zoom_end(view)
            }
            MapCommand::Move { lng, lat } => {
                let view = ViewState {
                    lng: *lng,
                    lat: *lat,
                    ..session.view()
                };
                session.move_end(view)
            }
            MapCommand::Filter { text } => match session.set_advanced_filter(text) {
                Ok(effects) => effects,
                Err(err) => {
                    out.emit(json!({
                        "line": line,
                        "command": command,
                        "error": err.to_string(),
                    }))?;
                    continue;
                }
            },
            MapCommand::Category { filter } => session.set_category_filter(*filter),
            MapCommand::Color {
                code,
                granularity,
                color,
            } => session.set_code_color(*code, *granularity, color),
            MapCommand::Style { style } => {
                let change = settings
                    .set_map_style(*style)
                    .with_context(|| format!("Line {line}: failed to store map style"))?;
                session.apply_settings_change(change)
            }
            MapCommand::Opacity { value } => {
                let change = settings
                    .set_layer_opacity(*value)
                    .with_context(|| format!("Line {line}: failed to store layer opacity"))?;
                session.apply_settings_change(change)
            }
        };

        out.effects(line, &command, &effects)?;
        if let Some(loaded) = session.poll_descriptions() {
            out.emit(json!({ "line": line, "descriptions": loaded }))?;
        }
    }

    if let Some(loaded) =
        session.wait_descriptions(Duration::from_millis(args.description_timeout_ms))
    {
        out.emit(json!({ "descriptions": loaded }))?;
    }

    info!(
        target: "vegmap::harness",
        granularity = %session.map_granularity(),
        "harness.finished"
    );
    out.emit(json!({ "session": session.state() }))?;
    Ok(())
}

struct Output {
    pretty: bool,
}

impl Output {
    fn emit(&mut self, record: JsonValue) -> Result<()> {
        let text = if self.pretty {
            serde_json::to_string_pretty(&record)?
        } else {
            serde_json::to_string(&record)?
        };
        println!("{text}");
        Ok(())
    }

    fn effects(&mut self, line: usize, command: &MapCommand, effects: &Effects) -> Result<()> {
        let mut record = json!({ "line": line, "command": command });
        if let (Some(target), JsonValue::Object(fields)) =
            (record.as_object_mut(), serde_json::to_value(effects)?)
        {
            target.extend(fields);
        }
        self.emit(record)
    }
}

//! Static three-level vegetation code hierarchy.
//!
//! Loaded from `taxonomy.json` (builtin copy embedded, `VG_TAXONOMY_PATH`
//! overrides). A code ending in `00` at a level means "no finer information":
//! every coarse code `c` also exists as medium `c * 100`, and every medium code
//! `m` as fine `m * 100`, carrying the parent's name and color.

use std::{
    collections::{BTreeMap, BTreeSet},
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;
use vg_schema::{Granularity, RawCode, MAX_RAW_CODE};

pub const BUILTIN_TAXONOMY: &str = include_str!("data/taxonomy.json");

/// Category ids of the undisturbed ecological categories.
pub const NATURAL_CATEGORY_IDS: [u32; 5] = [1, 2, 4, 6, 8];
/// Category ids of the human-modified (substitute) categories.
pub const SECONDARY_CATEGORY_IDS: [u32; 4] = [3, 5, 7, 9];
/// Natural bare ground sits under the urban coarse class but is natural.
pub const EXTRA_NATURAL_MEDIUM_CODES: [RawCode; 1] = [5807];

/// "No information" entries one level down from the coarse and medium
/// `99` codes. They are the only codes allowed below their level's range.
pub const NO_INFORMATION_CODES: [(Granularity, RawCode); 2] =
    [(Granularity::Medium, 99), (Granularity::Fine, 9_999)];

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyData {
    pub categories: BTreeMap<u32, String>,
    pub coarse: BTreeMap<RawCode, CoarseClass>,
    #[serde(default)]
    pub medium: BTreeMap<RawCode, ClassEntry>,
    #[serde(default)]
    pub fine: BTreeMap<RawCode, ClassEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoarseClass {
    pub category: u32,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassEntry {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("failed to parse taxonomy: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read taxonomy from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{granularity} code {code} has no parent {parent}")]
    MissingParent {
        code: RawCode,
        granularity: Granularity,
        parent: RawCode,
    },
    #[error("{granularity} code {code} is outside the {granularity} range")]
    CodeOutOfRange {
        code: RawCode,
        granularity: Granularity,
    },
    #[error("coarse code {code} refers to unknown category {category}")]
    UnknownCategory { code: RawCode, category: u32 },
    #[error("{granularity} code {code} has invalid color '{color}'")]
    InvalidColor {
        code: RawCode,
        granularity: Granularity,
        color: String,
    },
}

/// Ecological grouping used by the category filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecology {
    Natural,
    Secondary,
}

/// Per-level code sets of the natural and secondary categories, computed once
/// when the taxonomy is built.
#[derive(Debug, Clone, Default)]
pub struct CategoryPartition {
    natural: [Vec<RawCode>; 3],
    secondary: [Vec<RawCode>; 3],
}

impl CategoryPartition {
    pub fn codes(&self, ecology: Ecology, granularity: Granularity) -> &[RawCode] {
        let sets = match ecology {
            Ecology::Natural => &self.natural,
            Ecology::Secondary => &self.secondary,
        };
        &sets[granularity as usize]
    }

    fn build(levels: &[Level; 3], coarse: &BTreeMap<RawCode, CoarseClass>) -> Self {
        let mut partition = CategoryPartition::default();
        for (ecology, ids) in [
            (Ecology::Natural, &NATURAL_CATEGORY_IDS[..]),
            (Ecology::Secondary, &SECONDARY_CATEGORY_IDS[..]),
        ] {
            let coarse_codes: BTreeSet<RawCode> = coarse
                .iter()
                .filter(|(_, class)| ids.contains(&class.category))
                .map(|(code, _)| *code)
                .collect();

            let mut medium_codes: BTreeSet<RawCode> = levels[Granularity::Medium as usize]
                .codes()
                .filter(|code| coarse_codes.contains(&(code / 100)))
                .collect();
            if ecology == Ecology::Natural {
                medium_codes.extend(
                    EXTRA_NATURAL_MEDIUM_CODES
                        .iter()
                        .copied()
                        .filter(|code| levels[Granularity::Medium as usize].contains(*code)),
                );
            }

            let fine_codes: Vec<RawCode> = levels[Granularity::Fine as usize]
                .codes()
                .filter(|code| medium_codes.contains(&(code / 100)))
                .collect();

            let sets = match ecology {
                Ecology::Natural => &mut partition.natural,
                Ecology::Secondary => &mut partition.secondary,
            };
            sets[Granularity::Coarse as usize] = coarse_codes.into_iter().collect();
            sets[Granularity::Medium as usize] = medium_codes.into_iter().collect();
            sets[Granularity::Fine as usize] = fine_codes;
        }
        partition
    }
}

/// Every code of one granularity, including the `X00` codes inherited from
/// the parent level.
#[derive(Debug, Clone, Default)]
struct Level {
    names: BTreeMap<RawCode, String>,
    colors: BTreeMap<RawCode, String>,
}

impl Level {
    fn codes(&self) -> impl Iterator<Item = RawCode> + '_ {
        self.names.keys().copied()
    }

    fn contains(&self, code: RawCode) -> bool {
        self.names.contains_key(&code)
    }

    fn inherit_from(parent: &Level) -> Level {
        Level {
            names: parent
                .names
                .iter()
                .map(|(code, name)| (code * 100, name.clone()))
                .collect(),
            colors: parent
                .colors
                .iter()
                .map(|(code, color)| (code * 100, color.clone()))
                .collect(),
        }
    }

    fn insert(&mut self, code: RawCode, entry: &ClassEntry, parent: &Level) {
        self.names.insert(code, entry.name.clone());
        let color = entry
            .color
            .clone()
            .or_else(|| parent.colors.get(&(code / 100)).cloned());
        if let Some(color) = color {
            self.colors.insert(code, color);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: BTreeMap<u32, String>,
    coarse: BTreeMap<RawCode, CoarseClass>,
    medium: BTreeMap<RawCode, ClassEntry>,
    fine: BTreeMap<RawCode, ClassEntry>,
    levels: [Level; 3],
    partition: CategoryPartition,
}

impl Taxonomy {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            Taxonomy::from_json_str(BUILTIN_TAXONOMY).expect("builtin taxonomy should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, TaxonomyError> {
        let data: TaxonomyData = serde_json::from_str(json)?;
        Taxonomy::from_data(data)
    }

    pub fn from_file(path: &Path) -> Result<Self, TaxonomyError> {
        let contents = fs::read_to_string(path).map_err(|source| TaxonomyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Taxonomy::from_json_str(&contents)
    }

    pub fn from_data(data: TaxonomyData) -> Result<Self, TaxonomyError> {
        let TaxonomyData {
            categories,
            coarse,
            medium,
            fine,
        } = data;

        check_ranges(Granularity::Coarse, coarse.keys())?;
        check_ranges(Granularity::Medium, medium.keys())?;
        check_ranges(Granularity::Fine, fine.keys())?;

        let mut coarse_level = Level::default();
        for (code, class) in &coarse {
            if !categories.contains_key(&class.category) {
                return Err(TaxonomyError::UnknownCategory {
                    code: *code,
                    category: class.category,
                });
            }
            check_color(*code, Granularity::Coarse, class.color.as_deref())?;
            coarse_level.names.insert(*code, class.name.clone());
            if let Some(color) = &class.color {
                coarse_level.colors.insert(*code, color.clone());
            }
        }

        let medium_level = build_level(&coarse_level, &medium, Granularity::Medium)?;
        let fine_level = build_level(&medium_level, &fine, Granularity::Fine)?;
        let levels = [coarse_level, medium_level, fine_level];
        let partition = CategoryPartition::build(&levels, &coarse);

        tracing::debug!(
            target: "vegmap::taxonomy",
            coarse = levels[0].names.len(),
            medium = levels[1].names.len(),
            fine = levels[2].names.len(),
            "taxonomy.built"
        );

        Ok(Self {
            categories,
            coarse,
            medium,
            fine,
            levels,
            partition,
        })
    }

    fn level(&self, granularity: Granularity) -> &Level {
        &self.levels[granularity as usize]
    }

    /// All raw codes of a granularity in ascending order.
    pub fn codes(&self, granularity: Granularity) -> impl Iterator<Item = RawCode> + '_ {
        self.level(granularity).codes()
    }

    pub fn contains(&self, code: RawCode, granularity: Granularity) -> bool {
        self.level(granularity).contains(code)
    }

    /// Name of any code of the granularity, inherited `X00` codes included.
    pub fn name(&self, code: RawCode, granularity: Granularity) -> Option<&str> {
        self.level(granularity).names.get(&code).map(String::as_str)
    }

    /// Name from the level's own legend table; inherited codes have none.
    pub fn legend_name(&self, code: RawCode, granularity: Granularity) -> Option<&str> {
        match granularity {
            Granularity::Coarse => self.coarse.get(&code).map(|class| class.name.as_str()),
            Granularity::Medium => self.medium.get(&code).map(|entry| entry.name.as_str()),
            Granularity::Fine => self.fine.get(&code).map(|entry| entry.name.as_str()),
        }
    }

    pub fn coarse_class(&self, code: RawCode) -> Option<&CoarseClass> {
        self.coarse.get(&code)
    }

    pub fn category_name(&self, category: u32) -> Option<&str> {
        self.categories.get(&category).map(String::as_str)
    }

    pub fn base_color(&self, code: RawCode, granularity: Granularity) -> Option<&str> {
        self.level(granularity).colors.get(&code).map(String::as_str)
    }

    pub fn base_colors(&self, granularity: Granularity) -> &BTreeMap<RawCode, String> {
        &self.level(granularity).colors
    }

    pub fn partition(&self) -> &CategoryPartition {
        &self.partition
    }

    /// Codes at `target` whose ancestor at `from` is `code`.
    pub fn descendants(&self, code: RawCode, from: Granularity, target: Granularity) -> Vec<RawCode> {
        self.codes(target)
            .filter(|candidate| target.ancestor_code(*candidate, from) == Some(code))
            .collect()
    }
}

fn build_level(
    parent: &Level,
    entries: &BTreeMap<RawCode, ClassEntry>,
    granularity: Granularity,
) -> Result<Level, TaxonomyError> {
    let mut level = Level::inherit_from(parent);
    for (code, entry) in entries {
        let parent_code = code / 100;
        if !parent.contains(parent_code) {
            return Err(TaxonomyError::MissingParent {
                code: *code,
                granularity,
                parent: parent_code,
            });
        }
        check_color(*code, granularity, entry.color.as_deref())?;
        level.insert(*code, entry, parent);
    }
    Ok(level)
}

fn check_ranges<'a>(
    granularity: Granularity,
    codes: impl Iterator<Item = &'a RawCode>,
) -> Result<(), TaxonomyError> {
    let range = match granularity {
        Granularity::Coarse => 0..=99,
        Granularity::Medium => 100..=9_999,
        Granularity::Fine => 10_000..=MAX_RAW_CODE,
    };
    for code in codes {
        if !range.contains(code) && !NO_INFORMATION_CODES.contains(&(granularity, *code)) {
            return Err(TaxonomyError::CodeOutOfRange {
                code: *code,
                granularity,
            });
        }
    }
    Ok(())
}

fn check_color(
    code: RawCode,
    granularity: Granularity,
    color: Option<&str>,
) -> Result<(), TaxonomyError> {
    let Some(color) = color else {
        return Ok(());
    };
    let valid = color
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(())
    } else {
        Err(TaxonomyError::InvalidColor {
            code,
            granularity,
            color: color.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TaxonomyMetadata {
    path: Option<PathBuf>,
}

impl TaxonomyMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

pub fn load_taxonomy_from_env() -> (Arc<Taxonomy>, TaxonomyMetadata) {
    let override_path = env::var("VG_TAXONOMY_PATH").ok().map(PathBuf::from);
    let default_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/taxonomy.json");
    let path = override_path.unwrap_or(default_path);

    match Taxonomy::from_file(&path) {
        Ok(taxonomy) => {
            tracing::info!(
                target: "vegmap::config",
                path = %path.display(),
                "taxonomy.loaded=file"
            );
            return (Arc::new(taxonomy), TaxonomyMetadata::new(Some(path)));
        }
        Err(err) => {
            tracing::warn!(
                target: "vegmap::config",
                path = %path.display(),
                error = %err,
                "taxonomy.load_failed"
            );
        }
    }

    let taxonomy = Taxonomy::builtin();
    tracing::info!(target: "vegmap::config", "taxonomy.loaded=builtin");
    (taxonomy, TaxonomyMetadata::new(None))
}

mod category;

pub use category::Category;

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DATE_TOKEN_LEN: usize = 8;
const CSV_EXTENSION: &str = ".csv";

/// One dated export for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub category: Category,
    pub date: NaiveDate,
    pub path: PathBuf,
}

impl Snapshot {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("unable to enumerate data directory {}: {source}", dir.display())]
    Unreadable {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Current snapshot per category; categories without a dated file are missing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SnapshotSet {
    current: BTreeMap<Category, Snapshot>,
    missing: Vec<Category>,
}

impl SnapshotSet {
    pub fn get(&self, category: Category) -> Option<&Snapshot> {
        self.current.get(&category)
    }

    pub fn missing(&self) -> &[Category] {
        &self.missing
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.current.values()
    }

    pub fn file_names(&self) -> BTreeMap<Category, Option<String>> {
        Category::ordered()
            .into_iter()
            .map(|category| (category, self.get(category).map(Snapshot::file_name)))
            .collect()
    }
}

/// Picks the newest `<prefix>...-<YYYYMMDD>.csv` file per category.
///
/// Files sharing the newest date are ordered by file name and the
/// lexicographically greatest one wins, so a given listing always resolves
/// to the same snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotResolver {
    prefixes: BTreeMap<Category, String>,
}

impl SnapshotResolver {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = (Category, S)>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|(category, prefix)| (category, prefix.into()))
                .collect(),
        }
    }

    pub fn standard() -> Self {
        Self::new(
            Category::ordered()
                .into_iter()
                .map(|category| (category, category.default_prefix())),
        )
    }

    pub fn resolve(&self, dir: &Path) -> Result<SnapshotSet, ResolveError> {
        let unreadable = |source| ResolveError::Unreadable {
            dir: dir.to_path_buf(),
            source,
        };

        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(unreadable)? {
            let entry = entry.map_err(unreadable)?;
            if !entry.path().is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => debug!(?raw, "skipping non UTF-8 file name"),
            }
        }

        Ok(self.resolve_names(dir, names))
    }

    /// Resolves against an explicit listing of file names located in `dir`.
    pub fn resolve_names<I, S>(&self, dir: &Path, names: I) -> SnapshotSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect();
        let mut set = SnapshotSet::default();

        for (&category, prefix) in &self.prefixes {
            let newest = names
                .iter()
                .filter_map(|name| snapshot_date(name, prefix).map(|date| (date, name)))
                .max();

            match newest {
                Some((date, name)) => {
                    info!(%category, file = %name, %date, "selected current snapshot");
                    set.current.insert(
                        category,
                        Snapshot {
                            category,
                            date,
                            path: dir.join(name),
                        },
                    );
                }
                None => {
                    warn!(%category, prefix = %prefix, "no dated snapshot found");
                    set.missing.push(category);
                }
            }
        }

        set
    }
}

/// Embedded date of `name` when it matches `<prefix>...-<YYYYMMDD>.csv`.
fn snapshot_date(name: &str, prefix: &str) -> Option<NaiveDate> {
    if !name.starts_with(prefix) {
        return None;
    }

    let stem = name.strip_suffix(CSV_EXTENSION)?;
    let (head, token) = stem.rsplit_once('-')?;
    if head.len() < prefix.len()
        || token.len() != DATE_TOKEN_LEN
        || !token.bytes().all(|byte| byte.is_ascii_digit())
    {
        debug!(file = %name, "skipping file without a date token");
        return None;
    }

    NaiveDate::parse_from_str(token, "%Y%m%d").ok()
}

// Source data loading.
//
// Reads Lahman-style CSV files: a biographical table (playerID, birthYear,
// birthMonth, birthDay) and one performance table per discipline keyed by
// player identifier and season year. Every other performance column is
// treated as a numeric statistic.

use crate::records::{PerformanceRecord, PlayerIndex, PlayerRecord, StatTable};
use agecurve_core::{Discipline, SourcePaths};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} has no `{column}` column")]
    MissingColumn { path: String, column: String },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// Biographical CSV row. Unparseable optional cells become `None`; extra
/// columns are ignored.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawPerson {
    #[serde(alias = "player_id")]
    playerID: String,
    #[serde(default, alias = "birth_year", deserialize_with = "csv::invalid_option")]
    birthYear: Option<i32>,
    #[serde(default, alias = "birth_month", deserialize_with = "csv::invalid_option")]
    birthMonth: Option<u32>,
    #[serde(default, alias = "birth_day", deserialize_with = "csv::invalid_option")]
    birthDay: Option<u32>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn csv_reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr)
}

/// Find the index of the first header matching any of `names`.
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| names.contains(&h))
}

fn require_column(
    headers: &csv::StringRecord,
    names: &[&str],
    origin: &str,
) -> Result<usize, LoadError> {
    find_column(headers, names).ok_or_else(|| LoadError::MissingColumn {
        path: origin.to_string(),
        column: names[0].to_string(),
    })
}

/// Parse a numeric cell. Empty, non-numeric, and non-finite cells are absent.
fn parse_stat(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn csv_error(origin: &str, source: csv::Error) -> LoadError {
    LoadError::Csv {
        path: origin.to_string(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Reader-based loaders (enable testing without temp files)
// ---------------------------------------------------------------------------

/// Load biographical records. `origin` names the source in errors.
pub fn load_people_from_reader<R: Read>(
    rdr: R,
    origin: &str,
) -> Result<Vec<PlayerRecord>, LoadError> {
    let mut reader = csv_reader(rdr);
    let headers = reader.headers().map_err(|e| csv_error(origin, e))?.clone();
    require_column(&headers, &["playerID", "player_id"], origin)?;
    require_column(&headers, &["birthYear", "birth_year"], origin)?;

    let mut people = Vec::new();
    for result in reader.deserialize::<RawPerson>() {
        match result {
            Ok(raw) => {
                if raw.playerID.is_empty() {
                    warn!("skipping person row with empty playerID in {}", origin);
                    continue;
                }
                people.push(PlayerRecord {
                    player_id: raw.playerID,
                    birth_year: raw.birthYear,
                    birth_month: raw.birthMonth,
                    birth_day: raw.birthDay,
                });
            }
            Err(e) => {
                warn!("skipping malformed person row in {}: {}", origin, e);
            }
        }
    }
    Ok(people)
}

/// Load a performance table. The identifier and year columns must be
/// present in the header; all other columns become statistic columns.
pub fn load_stat_table_from_reader<R: Read>(
    rdr: R,
    discipline: Discipline,
    id_column: &str,
    year_column: &str,
    origin: &str,
) -> Result<StatTable, LoadError> {
    let mut reader = csv_reader(rdr);
    let headers = reader.headers().map_err(|e| csv_error(origin, e))?.clone();
    let id_idx = require_column(&headers, &[id_column], origin)?;
    let year_idx = require_column(&headers, &[year_column], origin)?;

    let stat_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, name)| *idx != id_idx && *idx != year_idx && !name.is_empty())
        .map(|(idx, name)| (idx, name.to_string()))
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("skipping malformed {} row in {}: {}", discipline, origin, e);
                continue;
            }
        };

        let player_id = row.get(id_idx).unwrap_or_default();
        if player_id.is_empty() {
            warn!("skipping {} row with empty {} in {}", discipline, id_column, origin);
            continue;
        }
        let season = row.get(year_idx).and_then(|cell| cell.parse::<i32>().ok());

        let stats: BTreeMap<String, f64> = stat_columns
            .iter()
            .filter_map(|(idx, name)| {
                row.get(*idx)
                    .and_then(parse_stat)
                    .map(|value| (name.clone(), value))
            })
            .collect();

        records.push(PerformanceRecord {
            player_id: player_id.to_string(),
            season,
            stats,
        });
    }

    Ok(StatTable::new(
        discipline,
        stat_columns.into_iter().map(|(_, name)| name),
        records,
    ))
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, LoadError> {
    std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load biographical records from a CSV file.
pub fn load_people(path: &Path) -> Result<Vec<PlayerRecord>, LoadError> {
    load_people_from_reader(open(path)?, &path.display().to_string())
}

/// Load one discipline's performance table from a CSV file.
pub fn load_stat_table(
    path: &Path,
    discipline: Discipline,
    id_column: &str,
    year_column: &str,
) -> Result<StatTable, LoadError> {
    load_stat_table_from_reader(
        open(path)?,
        discipline,
        id_column,
        year_column,
        &path.display().to_string(),
    )
}

/// Everything a run needs from disk.
#[derive(Debug, Clone)]
pub struct LoadedSources {
    pub players: PlayerIndex,
    pub tables: Vec<StatTable>,
}

impl LoadedSources {
    pub fn table(&self, discipline: Discipline) -> Option<&StatTable> {
        self.tables.iter().find(|t| t.discipline == discipline)
    }
}

/// Load the biographical source plus the performance source of every
/// requested discipline. Relative paths resolve against `base_dir`.
pub fn load_all(
    sources: &SourcePaths,
    base_dir: &Path,
    disciplines: &[Discipline],
) -> Result<LoadedSources, LoadError> {
    let resolve = |p: &str| -> PathBuf { base_dir.join(p) };

    let people = load_people(&resolve(&sources.people))?;
    if people.is_empty() {
        return Err(LoadError::Validation(
            "biographical CSV produced zero valid rows".into(),
        ));
    }
    let players = PlayerIndex::from_records(people);
    info!("Loaded {} players", players.len());

    let mut tables = Vec::with_capacity(disciplines.len());
    for &discipline in disciplines {
        let table = load_stat_table(
            &resolve(sources.for_discipline(discipline)),
            discipline,
            &sources.id_column,
            &sources.year_column,
        )?;
        info!(
            "Loaded {} {} records ({} stat columns)",
            table.records.len(),
            discipline,
            table.columns.len()
        );
        tables.push(table);
    }

    Ok(LoadedSources { players, tables })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

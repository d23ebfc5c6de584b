//! Precomputed CSV export adapter.
//!
//! Each export row carries a code, display name, trade date, close price and
//! an already computed moving average. Columns are located by header name,
//! so extra columns and any column order are accepted. One file may hold
//! several instruments.

use crate::domain::error::SmacrossError;
use crate::domain::price_series::{AlignedHistory, AlignedObservation, Instrument};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvColumns {
    pub code: String,
    pub name: String,
    pub date: String,
    pub close: String,
    pub moving_average: String,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            code: "secID".into(),
            name: "secShortName".into(),
            date: "tradeDate".into(),
            close: "closePrice".into(),
            moving_average: "ma20".into(),
        }
    }
}

impl CsvColumns {
    /// Column names from the `[csv]` section, falling back to the defaults.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let defaults = Self::default();
        let get = |key: &str, fallback: String| {
            config
                .get_string("csv", key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(fallback)
        };
        Self {
            code: get("code_column", defaults.code),
            name: get("name_column", defaults.name),
            date: get("date_column", defaults.date),
            close: get("close_column", defaults.close),
            moving_average: get("ma_column", defaults.moving_average),
        }
    }
}

struct ColumnIndex {
    code: usize,
    name: usize,
    date: usize,
    close: usize,
    moving_average: usize,
}

impl ColumnIndex {
    fn locate(headers: &csv::StringRecord, columns: &CsvColumns, file: &str) -> Result<Self, SmacrossError> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim() == wanted)
                .ok_or_else(|| SmacrossError::DataFormat {
                    reason: format!("{}: missing column {:?}", file, wanted),
                })
        };
        Ok(Self {
            code: find(&columns.code)?,
            name: find(&columns.name)?,
            date: find(&columns.date)?,
            close: find(&columns.close)?,
            moving_average: find(&columns.moving_average)?,
        })
    }
}

struct GroupEntry {
    name: String,
    first_seen: Option<NaiveDate>,
    observations: Vec<AlignedObservation>,
}

impl GroupEntry {
    fn new(name: String) -> Self {
        Self {
            name,
            first_seen: None,
            observations: Vec::new(),
        }
    }

    fn saw(&mut self, date: NaiveDate) {
        self.first_seen = Some(self.first_seen.map_or(date, |d| d.min(date)));
    }

    fn merge(&mut self, other: GroupEntry) {
        if let Some(date) = other.first_seen {
            self.saw(date);
        }
        self.observations.extend(other.observations);
    }
}

#[derive(Default)]
struct Grouped {
    instruments: BTreeMap<String, GroupEntry>,
}

impl Grouped {
    fn entry(&mut self, code: &str, name: &str) -> &mut GroupEntry {
        self.instruments
            .entry(code.to_string())
            .or_insert_with(|| GroupEntry::new(name.to_string()))
    }

    fn into_histories(self) -> Vec<AlignedHistory> {
        self.instruments
            .into_iter()
            .map(|(id, entry)| {
                let mut observations = entry.observations;
                observations.sort_by_key(|o| o.date);
                let mut deduped: Vec<AlignedObservation> = Vec::with_capacity(observations.len());
                for obs in observations {
                    match deduped.last_mut() {
                        Some(last) if last.date == obs.date => *last = obs,
                        _ => deduped.push(obs),
                    }
                }
                AlignedHistory {
                    instrument: Instrument {
                        id,
                        name: entry.name,
                    },
                    observations: deduped,
                    first_seen: entry.first_seen,
                }
            })
            .collect()
    }
}

pub struct CsvHistoryAdapter {
    columns: CsvColumns,
}

impl CsvHistoryAdapter {
    pub fn new(columns: CsvColumns) -> Self {
        Self { columns }
    }

    /// Parse CSV text; `source` labels error messages.
    pub fn parse_str(&self, content: &str, source: &str) -> Result<Vec<AlignedHistory>, SmacrossError> {
        let mut grouped = Grouped::default();
        self.parse_into(content, source, &mut grouped)?;
        Ok(grouped.into_histories())
    }

    pub fn load_file(&self, path: &Path) -> Result<Vec<AlignedHistory>, SmacrossError> {
        let content = fs::read_to_string(path)?;
        self.parse_str(&content, &path.display().to_string())
    }

    /// Load a single file, or every `*.csv` file in a directory (sorted by name).
    /// Unreadable or malformed files in a directory are logged and skipped.
    pub fn load_path(&self, path: &Path) -> Result<Vec<AlignedHistory>, SmacrossError> {
        if !path.is_dir() {
            return self.load_file(path);
        }

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry_path = entry?.path();
            let is_csv = entry_path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if is_csv && entry_path.is_file() {
                files.push(entry_path);
            }
        }
        files.sort();

        let mut grouped = Grouped::default();
        for file in &files {
            let content = match fs::read_to_string(file) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!(file = %file.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            // parse into a scratch group so a bad file contributes nothing
            let mut scratch = Grouped::default();
            match self.parse_into(&content, &file.display().to_string(), &mut scratch) {
                Ok(()) => {
                    for (id, entry) in scratch.instruments {
                        match grouped.instruments.get_mut(&id) {
                            Some(existing) => existing.merge(entry),
                            None => {
                                grouped.instruments.insert(id, entry);
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(file = %file.display(), error = %e, "skipping malformed file");
                }
            }
        }

        tracing::info!(files = files.len(), instruments = grouped.instruments.len(), "loaded csv exports");
        Ok(grouped.into_histories())
    }

    fn parse_into(&self, content: &str, source: &str, grouped: &mut Grouped) -> Result<(), SmacrossError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| SmacrossError::DataFormat {
                reason: format!("{}: {}", source, e),
            })?
            .clone();
        let idx = ColumnIndex::locate(&headers, &self.columns, source)?;

        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| SmacrossError::DataFormat {
                reason: format!("{}: CSV parse error: {}", source, e),
            })?;
            // header is line 1
            let row = line + 2;
            let field = |i: usize| record.get(i).unwrap_or("");

            let code = field(idx.code);
            if code.is_empty() {
                return Err(SmacrossError::DataFormat {
                    reason: format!("{}:{}: empty {}", source, row, self.columns.code),
                });
            }

            let date = NaiveDate::parse_from_str(field(idx.date), "%Y-%m-%d").map_err(|e| {
                SmacrossError::DataFormat {
                    reason: format!("{}:{}: invalid date: {}", source, row, e),
                }
            })?;
            let entry = grouped.entry(code, field(idx.name));
            entry.saw(date);

            // warm-up rows carry no average yet, written either empty or as NaN
            let ma_str = field(idx.moving_average);
            if ma_str.is_empty() {
                continue;
            }
            let moving_average: f64 = ma_str.parse().map_err(|e| SmacrossError::DataFormat {
                reason: format!("{}:{}: invalid moving average: {}", source, row, e),
            })?;
            if moving_average.is_nan() {
                continue;
            }
            if moving_average.is_infinite() {
                return Err(SmacrossError::DataFormat {
                    reason: format!("{}:{}: moving average is not finite", source, row),
                });
            }

            let close: f64 = field(idx.close).parse().map_err(|e| SmacrossError::DataFormat {
                reason: format!("{}:{}: invalid close value: {}", source, row, e),
            })?;
            if !close.is_finite() {
                return Err(SmacrossError::DataFormat {
                    reason: format!("{}:{}: close value is not finite", source, row),
                });
            }

            entry.observations.push(AlignedObservation {
                date,
                close,
                moving_average,
            });
        }

        Ok(())
    }
}

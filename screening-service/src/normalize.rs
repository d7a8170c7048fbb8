//! Watchlist table normalization
//!
//! Maps arbitrarily-headed SDN exports onto [`WatchlistEntity`]. The name
//! column is chosen by priority: `sdn_name`, then the longest value among
//! columns whose header contains `name`, then the most alphabetic cell of the
//! row. The last rule is a lossy best effort for spreadsheets without headers.

use crate::types::{EntityType, RawTable, WatchlistEntity};
use lazy_static::lazy_static;
use regex::Regex;

const LONG_NAME_CHARS: usize = 120;
const MIN_SEGMENT_CHARS: usize = 3;

lazy_static! {
    static ref BOILERPLATE_PREFIX: Regex =
        Regex::new(r"(?i)^secondary sanctions risk:.*?;\s*").unwrap();
    static ref LINKED_TO: Regex = Regex::new(r"(?i)linked to:\s*([^.;]+)").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Extract a clean, upper-cased entity name from a remark-heavy cell
pub fn clean_name(raw: &str) -> String {
    let mut name = raw.trim().to_string();
    if name.is_empty() {
        return name;
    }

    name = BOILERPLATE_PREFIX.replace(&name, "").into_owned();

    if let Some(linked) = LINKED_TO.captures(&name).and_then(|c| c.get(1)) {
        name = linked.as_str().trim().to_string();
    }

    if name.chars().count() > LONG_NAME_CHARS {
        if let Some((first, _)) = name.split_once(';') {
            let first = first.trim();
            if first.chars().count() >= MIN_SEGMENT_CHARS {
                name = first.to_string();
            }
        }
    }

    WHITESPACE.replace_all(&name, " ").trim().to_uppercase()
}

/// `" SDN Name "` -> `"sdn_name"`
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace([' ', '-'], "_")
}

enum NameSource {
    Column(usize),
    Longest(Vec<usize>),
    Lettery,
}

struct ColumnMap {
    headers: Vec<String>,
}

impl ColumnMap {
    fn new(table: &RawTable) -> Self {
        Self {
            headers: table.headers.iter().map(|h| normalize_header(h)).collect(),
        }
    }

    fn find(&self, candidates: &[&str]) -> Option<usize> {
        candidates
            .iter()
            .find_map(|c| self.headers.iter().position(|h| h == c))
    }

    fn name_source(&self) -> NameSource {
        if let Some(idx) = self.find(&["sdn_name"]) {
            return NameSource::Column(idx);
        }
        let name_like: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.contains("name"))
            .map(|(i, _)| i)
            .collect();
        if name_like.is_empty() {
            NameSource::Lettery
        } else {
            NameSource::Longest(name_like)
        }
    }
}

fn cell(row: &[String], idx: Option<usize>) -> String {
    idx.and_then(|i| row.get(i))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

fn letter_score(value: &str) -> usize {
    value
        .chars()
        .filter(|c| c.is_alphabetic() || *c == ',' || *c == '\'')
        .count()
}

fn raw_name(row: &[String], source: &NameSource) -> String {
    match source {
        NameSource::Column(idx) => cell(row, Some(*idx)),
        NameSource::Longest(columns) => columns
            .iter()
            .map(|i| cell(row, Some(*i)))
            .fold(String::new(), |best, v| if v.len() > best.len() { v } else { best }),
        NameSource::Lettery => {
            let mut best: Option<&String> = None;
            for value in row {
                if best.map_or(true, |b| letter_score(value) > letter_score(b)) {
                    best = Some(value);
                }
            }
            best.map(|v| v.trim().to_string()).unwrap_or_default()
        }
    }
}

/// Map every row of `table` onto an entity. Rows whose name cleans to an
/// empty string are kept here and dropped by the store.
pub fn normalize_table(table: &RawTable) -> Vec<WatchlistEntity> {
    let columns = ColumnMap::new(table);
    let name_source = columns.name_source();

    let program = columns.find(&["program", "program_list"]);
    let sdn_type = columns.find(&["sdn_type", "type"]);
    let dob = columns.find(&["dob", "date_of_birth", "date_of_birth_list"]);
    let country = columns.find(&["country", "primary_country", "nationality", "citizenship_country"]);
    let citizenship = columns.find(&["citizenship"]);
    let nationality = columns.find(&["nationality"]);
    let remarks = columns.find(&["remarks", "comment"]);

    table
        .rows
        .iter()
        .map(|row| WatchlistEntity {
            name: clean_name(&raw_name(row, &name_source)),
            program: cell(row, program),
            entity_type: EntityType::from_label(&cell(row, sdn_type)),
            dob: cell(row, dob),
            country: cell(row, country),
            citizenship: cell(row, citizenship),
            nationality: cell(row, nationality),
            remarks: cell(row, remarks),
        })
        .collect()
}

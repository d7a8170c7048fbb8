//! Watchlist feed interface and implementations

use crate::{types::RawTable, Result, ScreeningError};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Rows scanned for a header when the first row is not one
const HEADER_SCAN_ROWS: usize = 15;

const USER_AGENT: &str = concat!("watchlist-screening/", env!("CARGO_PKG_VERSION"));

/// Offline demo rows
pub const SAMPLE_SDN_CSV: &str = "\
sdn_name,program,sdn_type,dob,country,citizenship,nationality,remarks
\"PUTIN, VLADIMIR VLADIMIROVICH\",RUSSIA-EO14024,Individual,1952-10-07,RUSSIA,RUSSIA,RUSSIAN,Demo row for matching
\"KIM, JONG UN\",NPWMD,Individual,1984-01-08,\"KOREA, NORTH\",\"KOREA, NORTH\",KOREAN,Demo row for matching
\"LUKASHENKO, ALEKSANDR GRIGORYEVICH\",BELARUS,Individual,1954-08-30,BELARUS,BELARUS,BELARUSIAN,Demo row for matching
ISLAMIC REVOLUTIONARY GUARD CORPS (IRGC),IRAN,Entity,,IRAN,IRAN,IRANIAN,Demo row for matching
ROSNEFT OIL COMPANY,RUSSIA-EO14024,Entity,,RUSSIA,RUSSIA,RUSSIAN,Demo row for matching
";

lazy_static! {
    static ref HEADER_HINT: Regex =
        Regex::new(r"(?i)(sdn|name|program|type|dob|date|country|national|citizen|remark)").unwrap();
}

/// Source of raw watchlist tables
#[async_trait]
pub trait EntityFeed: Send + Sync {
    /// Feed name for logs
    fn name(&self) -> &str;

    /// Fetch the full table
    async fn fetch(&self) -> Result<RawTable>;
}

/// Parse CSV text, promoting a detected header row when the first row does
/// not look like one.
pub fn parse_csv(text: &str) -> Result<RawTable> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ScreeningError::Feed(format!("malformed CSV: {}", e)))?;
        records.push(record.iter().map(str::to_string).collect());
    }

    if records.is_empty() {
        return Ok(RawTable::default());
    }

    if records[0].len() > 2 {
        let headers = records.remove(0);
        let rows = records
            .into_iter()
            .map(|row| fit_row(row, headers.len()))
            .collect();
        return Ok(RawTable { headers, rows });
    }

    let header_idx = records
        .iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| row.iter().any(|v| HEADER_HINT.is_match(v)))
        .unwrap_or(0);
    debug!(header_idx, "Promoting detected header row");

    let mut body = records.split_off(header_idx + 1);
    let headers: Vec<String> = records
        .pop()
        .unwrap_or_default()
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let width = headers.len();
    body = body.into_iter().map(|row| fit_row(row, width)).collect();

    let keep: Vec<usize> = (0..width)
        .filter(|&col| body.iter().any(|row| !row[col].is_empty()))
        .collect();

    Ok(RawTable {
        headers: keep.iter().map(|&i| headers[i].clone()).collect(),
        rows: body
            .into_iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect(),
    })
}

fn fit_row(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.resize(width, String::new());
    row
}

/// The bundled five-row sample
#[derive(Debug, Default, Clone)]
pub struct BuiltinSampleFeed;

#[async_trait]
impl EntityFeed for BuiltinSampleFeed {
    fn name(&self) -> &str {
        "builtin-sample"
    }

    async fn fetch(&self) -> Result<RawTable> {
        parse_csv(SAMPLE_SDN_CSV)
    }
}

/// SDN CSV on local disk
#[derive(Debug, Clone)]
pub struct CsvFileFeed {
    path: PathBuf,
}

impl CsvFileFeed {
    /// Feed reading `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EntityFeed for CsvFileFeed {
    fn name(&self) -> &str {
        "local-csv"
    }

    async fn fetch(&self) -> Result<RawTable> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            ScreeningError::Feed(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        parse_csv(&String::from_utf8_lossy(&bytes))
    }
}

/// SDN CSV over HTTP, trying each endpoint in order
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: Client,
    urls: Vec<String>,
    min_columns: usize,
}

impl HttpFeed {
    /// Build the HTTP client
    pub fn new(urls: Vec<String>, timeout: Duration, min_columns: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ScreeningError::Feed(e.to_string()))?;

        Ok(Self {
            client,
            urls,
            min_columns,
        })
    }

    async fn fetch_one(&self, url: &str) -> Result<RawTable> {
        let response = self
            .client
            .get(url)
            .header("Accept", "text/csv,*/*;q=0.8")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ScreeningError::Feed(e.to_string()))?;

        let text = response
            .text()
            .await
            .map_err(|e| ScreeningError::Feed(e.to_string()))?;

        parse_csv(&text)
    }
}

#[async_trait]
impl EntityFeed for HttpFeed {
    fn name(&self) -> &str {
        "ofac-http"
    }

    async fn fetch(&self) -> Result<RawTable> {
        for url in &self.urls {
            match self.fetch_one(url).await {
                Ok(table) if table.column_count() >= self.min_columns => {
                    info!(url = %url, rows = table.rows.len(), "Fetched watchlist");
                    return Ok(table);
                }
                Ok(table) => {
                    warn!(
                        url = %url,
                        columns = table.column_count(),
                        "Watchlist response has too few columns"
                    );
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Watchlist endpoint failed");
                }
            }
        }

        Err(ScreeningError::Feed(format!(
            "no usable response from {} endpoint(s)",
            self.urls.len()
        )))
    }
}

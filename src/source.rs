use crate::models::{CompanyRecord, Config, DataSourceMode};
use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

static CATALOG: OnceCell<CompanyCatalog> = OnceCell::const_new();

/// Company tables keyed by batch year.
#[derive(Debug, Default)]
pub struct CompanyCatalog {
    years: BTreeMap<String, Vec<CompanyRecord>>,
}

impl CompanyCatalog {
    pub fn year(&self, year: &str) -> Result<&[CompanyRecord]> {
        self.years.get(year).map(Vec::as_slice).ok_or_else(|| {
            let known: Vec<&str> = self.years.keys().map(String::as_str).collect();
            anyhow!("No company table loaded for year {} (available: {})", year, known.join(", "))
        })
    }
}

/// Loads the catalog on first use; later calls return the same tables.
pub async fn load_catalog(config: &Config) -> Result<&'static CompanyCatalog> {
    CATALOG
        .get_or_try_init(|| async move {
            CompanySource::new(config.skip_rows).load_catalog(config).await
        })
        .await
}

pub struct CompanySource {
    client: reqwest::Client,
    skip_rows: usize,
}

impl CompanySource {
    pub fn new(skip_rows: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            skip_rows,
        }
    }

    pub async fn load_catalog(&self, config: &Config) -> Result<CompanyCatalog> {
        let mut catalog = CompanyCatalog::default();

        for year in &config.years {
            let records = self.load_year(config, year).await?;
            info!("Loaded {} companies for {}", records.len(), year);
            catalog.years.insert(year.clone(), records);
        }

        Ok(catalog)
    }

    async fn load_year(&self, config: &Config, year: &str) -> Result<Vec<CompanyRecord>> {
        match config.data_source_mode {
            DataSourceMode::Local => self.load_local(config, year),
            DataSourceMode::Internet => self.load_remote(config, year).await,
            DataSourceMode::Both => {
                let mut records = Vec::new();
                let mut loaded_any = false;

                let local = self.load_local(config, year);
                let remote = self.load_remote(config, year).await;

                for result in [local, remote] {
                    match result {
                        Ok(mut rows) => {
                            loaded_any = true;
                            records.append(&mut rows);
                        }
                        Err(e) => warn!("Skipping a source for {}: {:#}", year, e),
                    }
                }

                if !loaded_any {
                    bail!("No data source could be loaded for year {}", year);
                }
                Ok(records)
            }
        }
    }

    fn load_local(&self, config: &Config, year: &str) -> Result<Vec<CompanyRecord>> {
        let dir = config.data_directory.as_deref().unwrap_or("data-source");
        self.load_file(&year_file(dir, year))
    }

    async fn load_remote(&self, config: &Config, year: &str) -> Result<Vec<CompanyRecord>> {
        let url = config
            .internet_urls
            .as_ref()
            .and_then(|urls| urls.get(year))
            .ok_or_else(|| anyhow!("No URL configured for year {}", year))?;

        self.fetch_url(url).await
    }

    pub fn load_file(&self, file_path: &Path) -> Result<Vec<CompanyRecord>> {
        debug!("Reading {}", file_path.display());
        let content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read file: {}", file_path.display()))?;

        self.parse_csv_content(&content)
            .with_context(|| format!("Failed to parse {}", file_path.display()))
    }

    pub async fn fetch_url(&self, url: &str) -> Result<Vec<CompanyRecord>> {
        info!("Fetching company table from: {}", url);

        let response = self
            .client
            .get(url)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {}", url))?;

        if !response.status().is_success() {
            bail!("HTTP request failed with status: {}", response.status());
        }

        let content = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from: {}", url))?;

        self.parse_csv_content(&content)
            .with_context(|| format!("Failed to parse table from {}", url))
    }

    /// Parses one table. Columns are taken by position after the title rows and
    /// the header row; rows without a company name are dropped.
    pub fn parse_csv_content(&self, content: &str) -> Result<Vec<CompanyRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut records = Vec::new();
        let mut dropped = 0;

        for row in reader.records().skip(self.skip_rows + 1) {
            let row = row?;
            let record = CompanyRecord::from_cells(row.iter());

            if record.has_company() {
                records.push(record);
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            debug!("Dropped {} rows without a company", dropped);
        }

        Ok(records)
    }
}

pub fn year_file(data_dir: &str, year: &str) -> PathBuf {
    Path::new(data_dir).join(format!("{}.csv", year))
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub years: Vec<String>,
    #[serde(default)]
    pub percent_strategy: PercentStrategy,
    // Data source configuration
    pub data_source_mode: DataSourceMode,
    pub data_directory: Option<String>,
    /// Title rows preceding the header row in each table.
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
    pub output_directory: Option<String>,
    pub internet_urls: Option<BTreeMap<String, String>>,
    /// Fallback profile for flags not given on the command line.
    pub student: Option<StudentProfile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSourceMode {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "internet")]
    Internet,
    #[serde(rename = "both")]
    Both,
}

/// How 10th/12th percentage thresholds are read from criteria text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PercentStrategy {
    /// `60% (10th & 12th)` style annotations.
    #[default]
    #[serde(rename = "annotated")]
    Annotated,
    /// `10th: 60, 12th: 65` style labels.
    #[serde(rename = "labelled")]
    Labelled,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            years: vec!["2022".to_string(), "2023".to_string(), "2024".to_string()],
            percent_strategy: PercentStrategy::Annotated,
            data_source_mode: DataSourceMode::Local,
            data_directory: Some("data-source".to_string()),
            skip_rows: default_skip_rows(),
            output_directory: Some("output".to_string()),
            internet_urls: Some(BTreeMap::from([(
                "2024".to_string(),
                "https://example.com/company_criteria_2024.csv".to_string(),
            )])),
            student: None,
        }
    }
}

fn default_skip_rows() -> usize {
    1
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub cgpa: f64,
    pub backlogs: u32,
    pub perc10: f64,
    pub perc12: f64,
    pub branch: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("CGPA must be between 0 and 10, got {0}")]
    Cgpa(f64),
    #[error("{label} percentage must be between 0 and 100, got {value}")]
    Percentage { label: &'static str, value: f64 },
}

impl StudentProfile {
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !(0.0..=10.0).contains(&self.cgpa) {
            return Err(ProfileError::Cgpa(self.cgpa));
        }
        for (label, value) in [("10th", self.perc10), ("12th", self.perc12)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ProfileError::Percentage { label, value });
            }
        }
        Ok(())
    }
}

/// One row of a year's recruitment table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub sl_no: String,
    pub offer: String,
    pub offer_type: String,
    pub company: String,
    pub criteria: String,
    pub branches: String,
    pub profile: String,
}

impl CompanyRecord {
    /// Builds a record from positional cells: Sl.No, Offer, Type, Company,
    /// Criteria, Branches, Profile. Missing trailing cells become empty.
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a str>) -> Self {
        let mut cells = cells.into_iter().map(|cell| cell.trim().to_string());
        let mut next = || cells.next().unwrap_or_default();

        Self {
            sl_no: next(),
            offer: next(),
            offer_type: next(),
            company: next(),
            criteria: next(),
            branches: next(),
            profile: next(),
        }
    }

    pub fn has_company(&self) -> bool {
        !self.company.is_empty()
    }
}

/// Offer category selector applied after eligibility filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OfferFilter {
    #[default]
    All,
    Placement,
    Internship,
    PlacementAndInternship,
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown offer type '{0}', expected one of All, P, I, P+I")]
pub struct OfferFilterError(pub String);

impl FromStr for OfferFilter {
    type Err = OfferFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Ok(Self::All),
            "P" => Ok(Self::Placement),
            "I" => Ok(Self::Internship),
            "P+I" => Ok(Self::PlacementAndInternship),
            _ => Err(OfferFilterError(s.to_string())),
        }
    }
}

impl fmt::Display for OfferFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::All => "All",
            Self::Placement => "P",
            Self::Internship => "I",
            Self::PlacementAndInternship => "P+I",
        };
        f.write_str(label)
    }
}

impl OfferFilter {
    pub fn matches(&self, offer: &str) -> bool {
        match self {
            Self::All => true,
            selected => offer.trim().to_uppercase() == selected.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.percent_strategy = PercentStrategy::Labelled;
        config.student = Some(StudentProfile {
            cgpa: 8.1,
            backlogs: 1,
            perc10: 88.0,
            perc12: 79.5,
            branch: "IT".to_string(),
        });
        config.save_to_file(path).unwrap();

        let loaded = Config::load_from_file(path).unwrap();
        assert_eq!(loaded.years, config.years);
        assert_eq!(loaded.percent_strategy, PercentStrategy::Labelled);
        assert_eq!(loaded.data_source_mode, DataSourceMode::Local);
        assert_eq!(loaded.skip_rows, 1);
        assert_eq!(loaded.student, config.student);
    }

    #[test]
    fn omitted_skip_rows_keeps_the_title_row_out() {
        let config: Config = toml::from_str(
            r#"
            years = ["2024"]
            data_source_mode = "local"
            data_directory = "tables"
            "#,
        )
        .unwrap();

        assert_eq!(config.skip_rows, 1);
        assert_eq!(config.percent_strategy, PercentStrategy::Annotated);
        assert!(config.student.is_none());
    }

    #[test]
    fn profile_validation_enforces_ranges() {
        let mut profile = StudentProfile {
            cgpa: 10.0,
            backlogs: 0,
            perc10: 100.0,
            perc12: 0.0,
            branch: String::new(),
        };
        assert!(profile.validate().is_ok());

        profile.cgpa = 10.5;
        assert_eq!(profile.validate(), Err(ProfileError::Cgpa(10.5)));

        profile.cgpa = 7.0;
        profile.perc12 = -1.0;
        assert!(matches!(
            profile.validate(),
            Err(ProfileError::Percentage { label: "12th", .. })
        ));

        profile.perc12 = f64::NAN;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn offer_filter_parses_case_insensitively() {
        assert_eq!(" p+i ".parse::<OfferFilter>(), Ok(OfferFilter::PlacementAndInternship));
        assert_eq!("all".parse::<OfferFilter>(), Ok(OfferFilter::All));
        assert_eq!("i".parse::<OfferFilter>(), Ok(OfferFilter::Internship));
        assert!("PPO".parse::<OfferFilter>().is_err());
    }

    #[test]
    fn offer_filter_matches_trimmed_uppercase_offer() {
        assert!(OfferFilter::Placement.matches(" p "));
        assert!(!OfferFilter::Placement.matches("P+I"));
        assert!(OfferFilter::PlacementAndInternship.matches("p+i"));
        assert!(OfferFilter::All.matches(""));
    }

    #[test]
    fn record_from_short_row_pads_missing_cells() {
        let record = CompanyRecord::from_cells(["1", "P", "Dream", " Acme "]);
        assert_eq!(record.company, "Acme");
        assert_eq!(record.criteria, "");
        assert!(record.has_company());
    }
}

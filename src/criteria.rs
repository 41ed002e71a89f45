use regex::Regex;
use std::num::IntErrorKind;
use std::sync::LazyLock;

use crate::models::{PercentStrategy, StudentProfile};

/// Backlog allowance used when the criteria text says nothing about backlogs.
pub const UNBOUNDED_BACKLOGS: u32 = 99;

// Numbers are ASCII-only: `str::parse` rejects other decimal digits, so a
// Unicode `\d` match would silently lose its value.

static CGPA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(\.[0-9]+)?)\s*cgpa").expect("invalid regex"));
static BACKLOG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*bl").expect("invalid regex"));
static ANNOTATED_PERCENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(\.[0-9]+)?)%\s*\((.*?)\)").expect("invalid regex"));
static LABELLED_10TH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"10th[^0-9]*([0-9]+)").expect("invalid regex"));
static LABELLED_12TH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"12th[^0-9]*([0-9]+)").expect("invalid regex"));

/// Structured thresholds derived from one company's criteria and branches text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequirement {
    pub min_cgpa: f64,
    pub max_backlogs: u32,
    pub min_10th_percent: f64,
    pub min_12th_percent: f64,
    /// Lowercased branches text; students match by substring.
    pub branches: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PercentThresholds {
    pub min_10th: f64,
    pub min_12th: f64,
}

/// Pulls 10th/12th percentage thresholds out of lowercased criteria text.
pub trait PercentageExtractor: Send + Sync {
    fn extract(&self, criteria: &str) -> PercentThresholds;
}

/// Reads `<number>% (<categories>)` annotations, e.g. "60% (10th & 12th)".
///
/// Every annotation is considered and the highest value per category wins.
/// A category mentioning "diploma" counts toward the 12th threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotatedPercentages;

impl PercentageExtractor for AnnotatedPercentages {
    fn extract(&self, criteria: &str) -> PercentThresholds {
        let mut thresholds = PercentThresholds::default();

        for caps in ANNOTATED_PERCENT_REGEX.captures_iter(criteria) {
            let Some(value) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) else {
                continue;
            };
            let categories = caps.get(3).map_or("", |m| m.as_str());

            if categories.contains("10") {
                thresholds.min_10th = thresholds.min_10th.max(value);
            }
            if categories.contains("12") || categories.contains("diploma") {
                thresholds.min_12th = thresholds.min_12th.max(value);
            }
        }

        thresholds
    }
}

/// Reads the first integer following a "10th" or "12th" label, e.g. "10th: 60".
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelledNumbers;

impl PercentageExtractor for LabelledNumbers {
    fn extract(&self, criteria: &str) -> PercentThresholds {
        PercentThresholds {
            min_10th: first_number(&LABELLED_10TH_REGEX, criteria).unwrap_or(0.0),
            min_12th: first_number(&LABELLED_12TH_REGEX, criteria).unwrap_or(0.0),
        }
    }
}

fn first_number(regex: &Regex, text: &str) -> Option<f64> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Minimum CGPA stated as `<number> cgpa`.
pub fn extract_min_cgpa(criteria: &str) -> Option<f64> {
    first_number(&CGPA_REGEX, criteria)
}

/// Backlog allowance: an explicit `<n> bl` count, or zero for "no bl".
pub fn extract_max_backlogs(criteria: &str) -> Option<u32> {
    if let Some(digits) = BACKLOG_REGEX.captures(criteria).and_then(|caps| caps.get(1)) {
        return match digits.as_str().parse::<u32>() {
            Ok(count) => Some(count),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(u32::MAX),
            Err(_) => None,
        };
    }

    criteria.contains("no bl").then_some(0)
}

pub struct CriteriaMatcher {
    strategy: PercentStrategy,
    extractor: Box<dyn PercentageExtractor>,
}

impl CriteriaMatcher {
    pub fn new(strategy: PercentStrategy) -> Self {
        let extractor: Box<dyn PercentageExtractor> = match strategy {
            PercentStrategy::Annotated => Box::new(AnnotatedPercentages),
            PercentStrategy::Labelled => Box::new(LabelledNumbers),
        };

        Self { strategy, extractor }
    }

    pub fn strategy(&self) -> PercentStrategy {
        self.strategy
    }

    /// Never fails: anything the text does not state falls back to a permissive default.
    pub fn parse_requirement(&self, criteria: &str, branches: &str) -> ParsedRequirement {
        let criteria = criteria.to_lowercase();
        let percentages = self.extractor.extract(&criteria);

        ParsedRequirement {
            min_cgpa: extract_min_cgpa(&criteria).unwrap_or(0.0),
            max_backlogs: extract_max_backlogs(&criteria).unwrap_or(UNBOUNDED_BACKLOGS),
            min_10th_percent: percentages.min_10th,
            min_12th_percent: percentages.min_12th,
            branches: branches.to_lowercase(),
        }
    }
}

impl Default for CriteriaMatcher {
    fn default() -> Self {
        Self::new(PercentStrategy::default())
    }
}

/// Branch matching is plain substring containment, so "cs" also matches "cse"
/// and an empty branch matches every company.
pub fn is_eligible(requirement: &ParsedRequirement, student: &StudentProfile) -> bool {
    student.cgpa >= requirement.min_cgpa
        && student.backlogs <= requirement.max_backlogs
        && student.perc10 >= requirement.min_10th_percent
        && student.perc12 >= requirement.min_12th_percent
        && requirement.branches.contains(&student.branch.to_lowercase())
}

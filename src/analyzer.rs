use crate::criteria::{is_eligible, CriteriaMatcher, ParsedRequirement};
use crate::models::{CompanyRecord, OfferFilter, StudentProfile};
use log::debug;
use serde::Serialize;

/// A company the student qualifies for, reduced to the columns shown to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibleCompany {
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Offer")]
    pub offer: String,
    #[serde(rename = "Criteria")]
    pub criteria: String,
    #[serde(rename = "Branches")]
    pub branches: String,
    #[serde(rename = "Profile")]
    pub profile: String,
}

impl From<&CompanyRecord> for EligibleCompany {
    fn from(record: &CompanyRecord) -> Self {
        Self {
            company: record.company.clone(),
            offer: record.offer.clone(),
            criteria: record.criteria.clone(),
            branches: record.branches.clone(),
            profile: record.profile.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EligibilityAnalysis {
    pub year: String,
    pub offer_filter: OfferFilter,
    pub total_considered: usize,
    /// Eligible count before the offer filter was applied.
    pub total_eligible: usize,
    pub companies: Vec<EligibleCompany>,
}

impl EligibilityAnalysis {
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

pub struct EligibilityAnalyzer<'a> {
    pub student: &'a StudentProfile,
    matcher: CriteriaMatcher,
}

impl<'a> EligibilityAnalyzer<'a> {
    pub fn new(student: &'a StudentProfile, matcher: CriteriaMatcher) -> Self {
        Self { student, matcher }
    }

    pub fn requirement_for(&self, record: &CompanyRecord) -> ParsedRequirement {
        self.matcher.parse_requirement(&record.criteria, &record.branches)
    }

    /// Each record is judged on its own; output keeps the table's order.
    pub fn analyze(
        &self,
        year: &str,
        records: &[CompanyRecord],
        offer_filter: OfferFilter,
    ) -> EligibilityAnalysis {
        debug!(
            "Evaluating {} companies for {} with {:?} percentage extraction",
            records.len(),
            year,
            self.matcher.strategy()
        );

        let eligible: Vec<&CompanyRecord> = records
            .iter()
            .filter(|record| {
                let requirement = self.requirement_for(record);
                let verdict = is_eligible(&requirement, self.student);
                debug!("{}: {:?} -> {}", record.company, requirement, verdict);
                verdict
            })
            .collect();

        let total_eligible = eligible.len();
        let companies = eligible
            .into_iter()
            .filter(|record| offer_filter.matches(&record.offer))
            .map(EligibleCompany::from)
            .collect();

        EligibilityAnalysis {
            year: year.to_string(),
            offer_filter,
            total_considered: records.len(),
            total_eligible,
            companies,
        }
    }
}

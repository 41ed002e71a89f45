use crate::analyzer::EligibilityAnalysis;
use crate::criteria::{ParsedRequirement, UNBOUNDED_BACKLOGS};
use crate::models::StudentProfile;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub const CSV_FILE_NAME: &str = "eligible_companies.csv";
pub const SUMMARY_FILE_NAME: &str = "eligibility_summary.txt";

/// Writes the CSV and text reports under `<output_dir>/<year>/`.
pub fn write_reports(
    analysis: &EligibilityAnalysis,
    student: &StudentProfile,
    output_dir: &str,
) -> Result<PathBuf> {
    let year_dir = Path::new(output_dir).join(&analysis.year);
    fs::create_dir_all(&year_dir)?;

    generate_eligible_csv(analysis, &year_dir)?;
    fs::write(year_dir.join(SUMMARY_FILE_NAME), summary_text(analysis, student))?;

    Ok(year_dir)
}

fn generate_eligible_csv(analysis: &EligibilityAnalysis, output_dir: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_dir.join(CSV_FILE_NAME))?;

    if analysis.companies.is_empty() {
        writer.write_record(["Company", "Offer", "Criteria", "Branches", "Profile"])?;
    }
    for company in &analysis.companies {
        writer.serialize(company)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn summary_text(analysis: &EligibilityAnalysis, student: &StudentProfile) -> String {
    let mut content = String::new();
    content.push_str(&format!("Company Eligibility for Batch {}\n", analysis.year));
    content.push_str("==============================\n\n");
    content.push_str(&format!(
        "CGPA: {:.2}\nActive backlogs: {}\n10th: {:.1}%\n12th: {:.1}%\n\
         Branch: {}\nOffer type: {}\n\n",
        student.cgpa,
        student.backlogs,
        student.perc10,
        student.perc12,
        if student.branch.is_empty() { "(any)" } else { student.branch.as_str() },
        analysis.offer_filter,
    ));
    content.push_str(&format!(
        "Companies considered: {}\nEligible: {}\nAfter offer filter: {}\n\n",
        analysis.total_considered,
        analysis.total_eligible,
        analysis.companies.len(),
    ));

    for line in headline(analysis) {
        content.push_str(&line);
        content.push('\n');
    }
    for company in &analysis.companies {
        content.push_str(&format!(
            "   - {} [{}] {}\n",
            company.company, company.offer, company.profile
        ));
    }

    content
}

/// Status lines shown above the result table. Eligible companies removed by
/// the offer filter are still counted.
pub fn headline(analysis: &EligibilityAnalysis) -> Vec<String> {
    if analysis.total_eligible == 0 {
        return vec!["No matching companies found.".to_string()];
    }

    let mut lines = vec![format!("Found {} eligible companies.", analysis.total_eligible)];
    if analysis.is_empty() {
        lines.push(format!("None of them offer type {}.", analysis.offer_filter));
    } else if analysis.companies.len() != analysis.total_eligible {
        lines.push(format!(
            "Showing {} with offer type {}.",
            analysis.companies.len(),
            analysis.offer_filter
        ));
    }
    lines
}

pub fn print_summary(analysis: &EligibilityAnalysis) {
    let mut lines = headline(analysis).into_iter();
    if let Some(first) = lines.next() {
        let marker = if analysis.total_eligible == 0 { "⚠️ " } else { "✅" };
        println!("{} {}", marker, first);
    }
    for line in lines {
        println!("   {}", line);
    }
    if analysis.is_empty() {
        return;
    }
    println!();

    let company_width =
        column_width(analysis.companies.iter().map(|c| c.company.as_str()), "Company");
    let offer_width = column_width(analysis.companies.iter().map(|c| c.offer.as_str()), "Offer");

    println!(
        "{:>3}  {:<cw$}  {:<ow$}  {}",
        "#",
        "Company",
        "Offer",
        "Profile",
        cw = company_width,
        ow = offer_width
    );
    for (i, company) in analysis.companies.iter().enumerate() {
        println!(
            "{:>3}  {:<cw$}  {:<ow$}  {}",
            i + 1,
            company.company,
            company.offer,
            company.profile,
            cw = company_width,
            ow = offer_width
        );
        println!("     criteria: {}", company.criteria);
        println!("     branches: {}", company.branches);
    }
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
}

pub fn describe_requirement(requirement: &ParsedRequirement) -> String {
    let backlogs = if requirement.max_backlogs >= UNBOUNDED_BACKLOGS {
        "no limit".to_string()
    } else {
        requirement.max_backlogs.to_string()
    };
    let branches = if requirement.branches.is_empty() {
        "(none listed)"
    } else {
        requirement.branches.as_str()
    };

    format!(
        "Minimum CGPA: {}\nMaximum backlogs: {}\nMinimum 10th: {}%\nMinimum 12th: {}%\n\
         Branches: {}\n",
        requirement.min_cgpa,
        backlogs,
        requirement.min_10th_percent,
        requirement.min_12th_percent,
        branches
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::EligibleCompany;
    use crate::models::OfferFilter;

    fn analysis(companies: Vec<EligibleCompany>) -> EligibilityAnalysis {
        EligibilityAnalysis {
            year: "2024".to_string(),
            offer_filter: OfferFilter::All,
            total_considered: 3,
            total_eligible: companies.len(),
            companies,
        }
    }

    fn acme() -> EligibleCompany {
        EligibleCompany {
            company: "Acme".to_string(),
            offer: "P".to_string(),
            criteria: "7 CGPA, No BL".to_string(),
            branches: "CSE, IT".to_string(),
            profile: "SDE".to_string(),
        }
    }

    #[test]
    fn writes_csv_with_display_columns() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().to_str().unwrap();

        let year_dir =
            write_reports(&analysis(vec![acme()]), &StudentProfile::default(), output).unwrap();
        let csv = fs::read_to_string(year_dir.join(CSV_FILE_NAME)).unwrap();

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Company,Offer,Criteria,Branches,Profile"));
        assert_eq!(lines.next(), Some("Acme,P,\"7 CGPA, No BL\",\"CSE, IT\",SDE"));
        assert_eq!(lines.next(), None);
        assert!(year_dir.join(SUMMARY_FILE_NAME).exists());
    }

    #[test]
    fn empty_result_still_writes_header_and_notice() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().to_str().unwrap();
        let empty = analysis(Vec::new());

        let year_dir = write_reports(&empty, &StudentProfile::default(), output).unwrap();
        let csv = fs::read_to_string(year_dir.join(CSV_FILE_NAME)).unwrap();
        assert_eq!(csv.trim(), "Company,Offer,Criteria,Branches,Profile");

        let summary = summary_text(&empty, &StudentProfile::default());
        assert!(summary.contains("No matching companies found."));
        assert!(summary.contains("Branch: (any)"));
    }

    #[test]
    fn headline_keeps_eligible_count_when_offer_filter_empties_the_list() {
        let filtered_out = EligibilityAnalysis {
            offer_filter: OfferFilter::Internship,
            total_eligible: 2,
            ..analysis(Vec::new())
        };

        assert_eq!(
            headline(&filtered_out),
            vec!["Found 2 eligible companies.", "None of them offer type I."]
        );

        let summary = summary_text(&filtered_out, &StudentProfile::default());
        assert!(summary.contains("Found 2 eligible companies."));
        assert!(!summary.contains("No matching companies found."));
    }

    #[test]
    fn headline_reports_partial_offer_filter() {
        let partial = EligibilityAnalysis {
            offer_filter: OfferFilter::Placement,
            total_eligible: 3,
            ..analysis(vec![acme()])
        };

        assert_eq!(
            headline(&partial),
            vec!["Found 3 eligible companies.", "Showing 1 with offer type P."]
        );
        assert_eq!(headline(&analysis(vec![acme()])), vec!["Found 1 eligible companies."]);
    }

    #[test]
    fn unbounded_backlogs_are_described_as_no_limit() {
        let requirement = ParsedRequirement {
            min_cgpa: 6.5,
            max_backlogs: UNBOUNDED_BACKLOGS,
            min_10th_percent: 0.0,
            min_12th_percent: 60.0,
            branches: String::new(),
        };

        let text = describe_requirement(&requirement);
        assert!(text.contains("Minimum CGPA: 6.5"));
        assert!(text.contains("Maximum backlogs: no limit"));
        assert!(text.contains("Minimum 12th: 60%"));
        assert!(text.contains("(none listed)"));
    }
}

mod analyzer;
mod criteria;
mod models;
mod report;
mod source;

use analyzer::EligibilityAnalyzer;
use anyhow::{ensure, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use criteria::CriteriaMatcher;
use log::{debug, info};
use models::{Config, OfferFilter, PercentStrategy, StudentProfile};
use std::path::Path;

fn cli() -> Command {
    Command::new("eligibility-filter")
        .version("1.0")
        .about("Finds the recruiting companies a student is eligible for")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Show how each company's criteria were parsed")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log warnings and errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .global(true),
        )
        .args(search_args())
        .subcommand(
            Command::new("search")
                .about("List eligible companies for a batch year (default)")
                .args(search_args()),
        )
        .subcommand(
            Command::new("explain")
                .about("Show the thresholds parsed from a criteria string")
                .arg(Arg::new("criteria").value_name("CRITERIA").required(true))
                .arg(
                    Arg::new("branches")
                        .long("branches")
                        .value_name("TEXT")
                        .help("Branches text accompanying the criteria")
                        .default_value(""),
                )
                .arg(
                    Arg::new("strategy")
                        .long("strategy")
                        .value_name("STRATEGY")
                        .help("Percentage extraction strategy, overrides the configuration")
                        .value_parser(["annotated", "labelled"]),
                ),
        )
}

fn search_args() -> Vec<Arg> {
    vec![
        Arg::new("year")
            .short('y')
            .long("year")
            .value_name("YEAR")
            .help("Batch year to search (defaults to the first configured year)"),
        Arg::new("cgpa")
            .long("cgpa")
            .value_name("CGPA")
            .help("CGPA on a 0-10 scale")
            .value_parser(value_parser!(f64)),
        Arg::new("backlogs")
            .long("backlogs")
            .value_name("COUNT")
            .help("Number of active backlogs")
            .value_parser(value_parser!(u32)),
        Arg::new("perc10")
            .long("perc10")
            .value_name("PERCENT")
            .help("10th percentage")
            .value_parser(value_parser!(f64)),
        Arg::new("perc12")
            .long("perc12")
            .value_name("PERCENT")
            .help("12th percentage")
            .value_parser(value_parser!(f64)),
        Arg::new("branch")
            .short('b')
            .long("branch")
            .value_name("BRANCH")
            .help("Your branch (e.g. CS, IT, EC)"),
        Arg::new("offer")
            .short('o')
            .long("offer")
            .value_name("TYPE")
            .help("Offer type: All, P, I or P+I")
            .default_value("All")
            .value_parser(|s: &str| s.parse::<OfferFilter>()),
        Arg::new("no-reports")
            .long("no-reports")
            .help("Do not write report files")
            .action(ArgAction::SetTrue),
    ]
}

fn init_logging(matches: &ArgMatches) {
    let level = if matches.get_flag("verbose") {
        "debug"
    } else if matches.get_flag("quiet") {
        "warn"
    } else {
        "info"
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    // Global flags are propagated into whichever subcommand ran.
    let active = matches.subcommand().map_or(&matches, |(_, sub)| sub);
    init_logging(active);

    let config_file = active
        .get_one::<String>("config")
        .map_or("config.toml", String::as_str);

    match matches.subcommand() {
        Some(("explain", sub)) => explain(sub, config_file),
        _ => search(active, config_file).await,
    }
}

fn explain(matches: &ArgMatches, config_file: &str) -> Result<()> {
    print!("{}", explain_text(matches, config_file)?);
    Ok(())
}

fn explain_text(matches: &ArgMatches, config_file: &str) -> Result<String> {
    let strategy = match matches.get_one::<String>("strategy").map(String::as_str) {
        Some("labelled") => PercentStrategy::Labelled,
        Some(_) => PercentStrategy::Annotated,
        None if Path::new(config_file).exists() => Config::load_from_file(config_file)
            .with_context(|| format!("Failed to load configuration from {}", config_file))?
            .percent_strategy,
        None => PercentStrategy::default(),
    };

    let criteria = matches.get_one::<String>("criteria").map_or("", String::as_str);
    let branches = matches.get_one::<String>("branches").map_or("", String::as_str);

    let requirement = CriteriaMatcher::new(strategy).parse_requirement(criteria, branches);
    debug!("Parsed with {:?} strategy: {:?}", strategy, requirement);

    Ok(report::describe_requirement(&requirement))
}

async fn search(matches: &ArgMatches, config_file: &str) -> Result<()> {
    // Load or create configuration
    let config = if Path::new(config_file).exists() {
        info!("Loading configuration from: {}", config_file);
        Config::load_from_file(config_file)
            .with_context(|| format!("Failed to load configuration from {}", config_file))?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        Config::default().save_to_file(config_file)?;
        println!(
            "⚠️  Please edit {} to point at your company tables, then run the program again.",
            config_file
        );
        return Ok(());
    };

    ensure!(!config.years.is_empty(), "No batch years configured in {}", config_file);

    let year = match matches.get_one::<String>("year") {
        Some(year) => year.clone(),
        None => config.years[0].clone(),
    };
    ensure!(
        config.years.contains(&year),
        "Unknown batch year {} (configured: {})",
        year,
        config.years.join(", ")
    );

    let student = resolve_student(matches, &config)?;
    let offer_filter = matches.get_one::<OfferFilter>("offer").copied().unwrap_or_default();

    println!("🔍 Searching {} companies for batch {}", offer_filter, year);

    let catalog = source::load_catalog(&config).await?;
    let records = catalog.year(&year)?;

    let matcher = CriteriaMatcher::new(config.percent_strategy);
    let analyzer = EligibilityAnalyzer::new(&student, matcher);
    let analysis = analyzer.analyze(&year, records, offer_filter);

    report::print_summary(&analysis);

    if !matches.get_flag("no-reports") {
        if let Some(output_dir) = config.output_directory.as_deref() {
            let year_dir = report::write_reports(&analysis, &student, output_dir)?;
            println!("\n📂 Reports written to: {}", year_dir.display());
        }
    }

    Ok(())
}

/// Command-line values take precedence over the `[student]` table in the config.
fn resolve_student(matches: &ArgMatches, config: &Config) -> Result<StudentProfile> {
    let mut student = config.student.clone().unwrap_or_default();

    if let Some(cgpa) = matches.get_one::<f64>("cgpa") {
        student.cgpa = *cgpa;
    }
    if let Some(backlogs) = matches.get_one::<u32>("backlogs") {
        student.backlogs = *backlogs;
    }
    if let Some(perc10) = matches.get_one::<f64>("perc10") {
        student.perc10 = *perc10;
    }
    if let Some(perc12) = matches.get_one::<f64>("perc12") {
        student.perc12 = *perc12;
    }
    if let Some(branch) = matches.get_one::<String>("branch") {
        student.branch = branch.trim().to_string();
    }

    student.validate()?;
    Ok(student)
}

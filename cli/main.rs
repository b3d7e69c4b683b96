#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]

// ========================================================================================
//
//                      THE STRATEGIC ORCHESTRATOR: BREASTRISK
//
// ========================================================================================
//
// Parses arguments, sets up logging, loads the classifier exactly once and hands a
// reference to it to whichever front end was requested. Every failure surfaces
// here as a single "Error: ..." line and a non-zero exit status.

use breastrisk::inputs::{ActivityLevel, EducationLevel, RiskInputs, SmokingStatus, YesNo};
use breastrisk::model;
use breastrisk::pipeline;
use breastrisk::report::{self, ReportStyle};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

mod form;

// ========================================================================================
//                           APPLICATION-LEVEL CONSTANTS
// ========================================================================================

const DEFAULT_MODEL_PATH: &str = "models/breast_cancer_rf_model.toml";
const DEFAULT_LOGO_PATH: &str = "assets/logo.txt";
const DEFAULT_CHART_WIDTH: usize = 40;

// ========================================================================================
//                         COMMAND-LINE INTERFACE DEFINITION
// ========================================================================================

#[derive(Parser)]
#[command(
    name = "breastrisk",
    version,
    about = "Breast cancer risk screening from lifestyle and reproductive factors",
    long_about = "Collects lifestyle and reproductive health inputs, encodes them for a \
                 pre-trained classifier and shows the predicted risk with a per-factor \
                 profile. For educational and research purposes only."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive form
    #[command(about = "Open the interactive risk form")]
    Form(AssetArgs),

    /// Fill the form from flags and print the result once
    #[command(about = "Predict risk from command-line inputs")]
    Predict(PredictArgs),

    /// Display version information
    #[command(about = "Display version information")]
    Version,
}

#[derive(Args)]
struct AssetArgs {
    /// Path to the trained classifier (.toml)
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Path to the text banner shown above the title (skipped if missing)
    #[arg(long, default_value = DEFAULT_LOGO_PATH)]
    logo: PathBuf,
}

#[derive(Args)]
struct PredictArgs {
    #[command(flatten)]
    assets: AssetArgs,

    /// Age in years
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(18..=90))]
    age: u32,

    /// Weight in kg (30-200)
    #[arg(long, default_value_t = 60.0)]
    weight: f64,

    /// Height in cm (100-250)
    #[arg(long, default_value_t = 165.0)]
    height: f64,

    /// Age at first menstruation
    #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(8..=18))]
    menarche_age: u32,

    /// Age at first pregnancy
    #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u32).range(12..=50))]
    first_pregnancy_age: u32,

    /// Number of births
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(0..=10))]
    parity: u32,

    /// Family history of breast cancer (Yes/No)
    #[arg(long, default_value_t = YesNo::No)]
    family_history: YesNo,

    /// Used oral contraceptives (Yes/No)
    #[arg(long, default_value_t = YesNo::No)]
    oral_contraceptives: YesNo,

    /// Used hormone therapy (Yes/No)
    #[arg(long, default_value_t = YesNo::No)]
    hormone_therapy: YesNo,

    /// Lives in an urban area (Yes/No)
    #[arg(long, default_value_t = YesNo::No)]
    urban: YesNo,

    /// Exposed to pollution (Yes/No)
    #[arg(long, default_value_t = YesNo::No)]
    pollution: YesNo,

    /// Breastfed children (Yes/No)
    #[arg(long, default_value_t = YesNo::No)]
    breastfeeding: YesNo,

    /// Smoking status (Never/Former/Current)
    #[arg(long, default_value_t = SmokingStatus::Never)]
    smoking: SmokingStatus,

    /// Alcohol intake in units per week (0-10)
    #[arg(long, default_value_t = 1.0)]
    alcohol: f64,

    /// Physical activity level (Low/Moderate/High)
    #[arg(long, default_value_t = ActivityLevel::Low)]
    activity: ActivityLevel,

    /// Education level (None/Primary/Secondary/Tertiary)
    #[arg(long, default_value_t = EducationLevel::None)]
    education: EducationLevel,

    /// Width of the longest chart bar, in characters
    #[arg(long, default_value_t = DEFAULT_CHART_WIDTH)]
    chart_width: usize,

    /// Disable colored chart bars even when writing to a terminal
    #[arg(long)]
    no_color: bool,
}

impl PredictArgs {
    fn inputs(&self) -> RiskInputs {
        RiskInputs {
            age: self.age,
            weight_kg: self.weight,
            height_cm: self.height,
            menarche_age: self.menarche_age,
            first_pregnancy_age: self.first_pregnancy_age,
            parity: self.parity,
            family_history: self.family_history,
            oral_contraceptive_use: self.oral_contraceptives,
            hormone_therapy_use: self.hormone_therapy,
            urban_residence: self.urban,
            exposure_to_pollution: self.pollution,
            breastfeeding_history: self.breastfeeding,
            smoking_status: self.smoking,
            alcohol_intake: self.alcohol,
            physical_activity_level: self.activity,
            education_level: self.education,
        }
    }
}

// ========================================================================================
//                           THE MAIN ORCHESTRATION LOGIC
// ========================================================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Some(Commands::Form(args)) => run_form(args),
        Some(Commands::Predict(args)) => run_predict(args),
        Some(Commands::Version) => {
            print_version_info();
            Ok(())
        }
        None => {
            Cli::command().print_help().expect("print help");
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_form(args: AssetArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Load before touching the terminal so a bad model is reported on a normal screen.
    let classifier = model::load_shared(&args.model)?;
    let logo = report::load_logo(&args.logo);
    form::run(classifier, logo.as_deref())?;
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<(), Box<dyn std::error::Error>> {
    let inputs = args.inputs();
    // Range problems are reported before the model is even loaded.
    inputs.validate()?;

    let classifier = model::load_shared(&args.assets.model)?;
    let logo = report::load_logo(&args.assets.logo);
    let assessment = pipeline::assess(classifier, &inputs)?;

    let style = ReportStyle {
        chart_width: args.chart_width,
        colored: !args.no_color && std::io::stdout().is_terminal(),
    };
    print!(
        "{}",
        report::render_report(&assessment, logo.as_deref(), style)
    );
    Ok(())
}

fn print_version_info() {
    let version = env!("CARGO_PKG_VERSION");
    println!("breastrisk {version}");
    println!("Model artifact format: v{}", model::ARTIFACT_FORMAT_VERSION);
}

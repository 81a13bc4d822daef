use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use page_vision::check::{run_check, CheckConfig, ChromeDriver, MockPage, PageDriver};
use page_vision::config::{self, ArtifactSettings, parse_sections, parse_viewport};
use page_vision::report::{generate_visual_report, ReportOutcome};

/// page-vision - Headless homepage checking with visual load reports
#[derive(Parser, Debug)]
#[command(
    name = "page-vision",
    about = "Headless homepage checking with step-timed screenshots and visual load reports",
    after_help = "ENVIRONMENT VARIABLES:\n\
        PAGE_VISION_ARTIFACT_DIR       Root directory for run artifacts\n\
        PAGE_VISION_URL                Homepage URL under check\n\
        PAGE_VISION_LANDMARK_TIMEOUT   Landmark checkpoint timeout (seconds)\n\
        PAGE_VISION_SECTION_TIMEOUT    Section checkpoint timeout (seconds)\n\
        PAGE_VISION_VIEWPORT           Viewport preset or WxH\n\
        PAGE_VISION_SECTIONS           Comma-separated section texts"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the homepage check, capturing screenshots and an error log
    Check {
        /// Homepage URL to load (default: PAGE_VISION_URL or the built-in target)
        #[arg(short, long)]
        url: Option<String>,

        /// Root directory for run artifacts (default: PAGE_VISION_ARTIFACT_DIR)
        #[arg(short, long)]
        artifacts: Option<PathBuf>,

        /// Comma-separated section texts to verify (empty string skips sections)
        #[arg(long)]
        sections: Option<String>,

        /// Landmark checkpoint timeout in seconds
        #[arg(long)]
        landmark_timeout: Option<u64>,

        /// Section checkpoint timeout in seconds
        #[arg(long)]
        section_timeout: Option<u64>,

        /// Viewport: desktop (1280x800), laptop (1440x900), mobile (390x844), or WxH
        #[arg(long, short = 'v')]
        viewport: Option<String>,

        /// Use the scripted mock driver instead of a real browser
        #[arg(long)]
        mock: bool,

        /// Output the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the visual report for the most recent run
    Report {
        /// Root directory for run artifacts (default: PAGE_VISION_ARTIFACT_DIR)
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let defaults = config::get();

    match args.command {
        Some(Commands::Check {
            url,
            artifacts,
            sections,
            landmark_timeout,
            section_timeout,
            viewport,
            mock,
            json,
        }) => {
            let (width, height) = match viewport {
                Some(viewport) => parse_viewport(&viewport).ok_or_else(|| {
                    format!("Invalid viewport '{}'. Use: desktop, laptop, mobile, or WxH", viewport)
                })?,
                None => (defaults.check.viewport_width, defaults.check.viewport_height),
            };

            let check_config = CheckConfig {
                url: url.unwrap_or_else(|| defaults.check.url.clone()),
                landmark_timeout: Duration::from_secs(
                    landmark_timeout.unwrap_or(defaults.check.landmark_timeout),
                ),
                section_timeout: Duration::from_secs(
                    section_timeout.unwrap_or(defaults.check.section_timeout),
                ),
                sections: sections
                    .as_deref()
                    .map(parse_sections)
                    .unwrap_or_else(|| defaults.check.sections.clone()),
            };
            let artifact_settings = artifacts
                .map(ArtifactSettings::in_root)
                .unwrap_or_else(|| defaults.artifacts.clone());

            let mut mock_driver;
            let mut chrome_driver;
            let driver: &mut dyn PageDriver = if mock {
                mock_driver = MockPage::new()
                    .with_selectors(["header", "nav", "main", "footer"])
                    .with_selectors(["#didomi-notice", "#didomi-notice-agree-button"])
                    .with_frame_size(width.min(640), height.min(400));
                for section in &check_config.sections {
                    mock_driver = mock_driver.with_text(section.clone());
                }
                &mut mock_driver
            } else {
                chrome_driver = ChromeDriver::launch(width, height)?;
                &mut chrome_driver
            };

            let summary = run_check(driver, &check_config, &artifact_settings)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!();
                println!(
                    "Check completed: {} step(s), {} screenshot(s), {} error(s)",
                    summary.steps,
                    summary.screenshots.len(),
                    summary.errors.len()
                );
                println!("  Run folder: {}", summary.run_dir.display());
                println!("  Load report: {}", summary.log_path.display());
                println!("  Error log: {}", summary.errors_path.display());
            }
        }

        Some(Commands::Report { artifacts }) => {
            let artifact_settings = artifacts
                .map(ArtifactSettings::in_root)
                .unwrap_or_else(|| defaults.artifacts.clone());
            match generate_visual_report(&artifact_settings)? {
                ReportOutcome::Written(path) => {
                    println!("Visual report generated: {}", path.display());
                }
                ReportOutcome::NothingToReport(reason) => {
                    println!("Nothing to report: {}", reason);
                }
            }
        }

        None => {
            println!("page-vision - Headless homepage checking with visual load reports");
            println!();
            println!("Commands:");
            println!("  check   Run the homepage check, capturing screenshots and an error log");
            println!("  report  Render the visual report for the most recent run");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

use std::process::ExitCode;
use log::info;

use remote_jobs_scraper_lib::{logger, Config, Pipeline, RunOutcome};

fn main() -> ExitCode {
    logger::init();
    info!("Starting Remote Jobs Scraper...");

    let config = Config::load();
    let outcome = Pipeline::from_config(&config).run();

    if let RunOutcome::Persisted { jobs, csv_saved, sheet_saved } = &outcome {
        info!(
            "Scraping completed. {} jobs (csv: {}, sheet: {}).",
            jobs.len(),
            if *csv_saved { "saved" } else { "failed" },
            if *sheet_saved { "saved" } else { "skipped/failed" }
        );
    }

    ExitCode::from(outcome.exit_code())
}

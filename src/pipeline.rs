use std::path::PathBuf;
use log::{error, info, warn};

use crate::config::Config;
use crate::csv_sink;
use crate::extractor::{self, Extractor};
use crate::models::JobPosting;
use crate::renderer::{ChromeRenderer, PageRenderer};
use crate::sheets::{GoogleSheetSink, SheetSink};

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The page could not be rendered; nothing was parsed or written.
    RenderFailed,
    /// The page rendered but yielded no postings; no sink was touched.
    NoJobs,
    /// Both sinks were attempted.
    Persisted {
        jobs: Vec<JobPosting>,
        csv_saved: bool,
        sheet_saved: bool,
    },
}

impl RunOutcome {
    /// Non-zero when nothing was scraped or the local file could not be written.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::RenderFailed => 1,
            RunOutcome::NoJobs => 0,
            RunOutcome::Persisted { csv_saved, .. } => {
                if *csv_saved { 0 } else { 1 }
            }
        }
    }
}

/// Render, extract, then persist to the CSV file and the spreadsheet.
pub struct Pipeline {
    target_url: String,
    debug_artifact: PathBuf,
    csv_path: PathBuf,
    keyword: Option<String>,
    extractor: Extractor,
    renderer: Box<dyn PageRenderer>,
    sheet: Option<Box<dyn SheetSink>>,
}

impl Pipeline {
    pub fn new(config: &Config, renderer: Box<dyn PageRenderer>, sheet: Option<Box<dyn SheetSink>>) -> Self {
        Pipeline {
            target_url: config.target_url.clone(),
            debug_artifact: config.debug_artifact.clone(),
            csv_path: config.csv_path.clone(),
            keyword: config.keyword.clone(),
            extractor: Extractor::new(&config.site_origin),
            renderer,
            sheet,
        }
    }

    /// Chrome renderer and Google Sheets sink, as configured.
    pub fn from_config(config: &Config) -> Self {
        let renderer = ChromeRenderer::new(config.browser.clone(), config.debug_artifact.clone());
        let sheet: Option<Box<dyn SheetSink>> = if config.sheets.enabled {
            Some(Box::new(GoogleSheetSink::new(
                config.sheets.credentials_path.clone(),
                config.sheets.sheet_name.clone(),
            )))
        } else {
            None
        };
        Self::new(config, Box::new(renderer), sheet)
    }

    pub fn run(&self) -> RunOutcome {
        info!("Starting scrape of {}", self.target_url);

        let html = match self.renderer.render(&self.target_url) {
            Ok(html) => html,
            Err(_) => {
                error!("Failed to fetch page content");
                return RunOutcome::RenderFailed;
            }
        };

        let mut jobs = self.extractor.extract(&html);
        if let Some(keyword) = &self.keyword {
            jobs = extractor::filter_by_keyword(jobs, keyword);
            info!("{} jobs match keyword '{}'", jobs.len(), keyword);
        }

        if jobs.is_empty() {
            warn!("No jobs found - check {:?} to see what was fetched", self.debug_artifact);
            return RunOutcome::NoJobs;
        }

        let csv_saved = match csv_sink::save_to_csv(&jobs, &self.csv_path) {
            Ok(_) => true,
            Err(e) => {
                error!("CSV error: {}", e);
                false
            }
        };

        let sheet_saved = match &self.sheet {
            Some(sink) => match sink.write(&jobs) {
                Ok(()) => true,
                Err(e) => {
                    error!("Google Sheets error: {}", e);
                    false
                }
            },
            None => {
                info!("Google Sheets export disabled");
                false
            }
        };

        RunOutcome::Persisted { jobs, csv_saved, sheet_saved }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(RunOutcome::RenderFailed.exit_code(), 1);
        assert_eq!(RunOutcome::NoJobs.exit_code(), 0);
        let ok = RunOutcome::Persisted { jobs: vec![], csv_saved: true, sheet_saved: false };
        assert_eq!(ok.exit_code(), 0);
        let bad = RunOutcome::Persisted { jobs: vec![], csv_saved: false, sheet_saved: true };
        assert_eq!(bad.exit_code(), 1);
    }
}

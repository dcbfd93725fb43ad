use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use log::{debug, info};

use crate::error::ParseNodeError;
use crate::models::JobPosting;

/// Matches both the table-row and the card layout of a listing.
pub const LISTING_SELECTOR: &str = "tr.job, div.job";
const TITLE_SELECTOR: &str = "h2";
const COMPANY_SELECTOR: &str = "h3";
const LINK_SELECTOR: &str = "a.preventLink";

pub struct Extractor {
    origin: String,
    listing: Selector,
    title: Selector,
    company: Selector,
    link: Selector,
}

impl Extractor {
    pub fn new(origin: &str) -> Self {
        Extractor {
            origin: origin.to_string(),
            listing: Selector::parse(LISTING_SELECTOR).expect("listing selector is valid CSS"),
            title: Selector::parse(TITLE_SELECTOR).expect("title selector is valid CSS"),
            company: Selector::parse(COMPANY_SELECTOR).expect("company selector is valid CSS"),
            link: Selector::parse(LINK_SELECTOR).expect("link selector is valid CSS"),
        }
    }

    /// Extracts every complete listing, stamping each with the current time.
    pub fn extract(&self, markup: &str) -> Vec<JobPosting> {
        self.extract_with_clock(markup, Utc::now)
    }

    /// Same as [`Extractor::extract`], but `clock` is called once per record.
    pub fn extract_with_clock<F>(&self, markup: &str, mut clock: F) -> Vec<JobPosting>
    where
        F: FnMut() -> DateTime<Utc>,
    {
        if markup.trim().is_empty() {
            return Vec::new();
        }

        let document = Html::parse_document(markup);
        let mut jobs = Vec::new();

        for (idx, node) in document.select(&self.listing).enumerate() {
            match self.parse_node(node, &mut clock) {
                Ok(job) => jobs.push(job),
                Err(e) => debug!("Skipping listing #{}: {}", idx, e),
            }
        }

        info!("Found {} jobs", jobs.len());
        jobs
    }

    fn parse_node<F>(&self, node: ElementRef<'_>, clock: &mut F) -> Result<JobPosting, ParseNodeError>
    where
        F: FnMut() -> DateTime<Utc>,
    {
        let title = node
            .select(&self.title)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
            .ok_or(ParseNodeError::MissingTitle)?;

        let company = node
            .select(&self.company)
            .next()
            .map(element_text)
            .filter(|c| !c.is_empty())
            .ok_or(ParseNodeError::MissingCompany)?;

        let href = node
            .select(&self.link)
            .next()
            .ok_or(ParseNodeError::MissingLink)?
            .value()
            .attr("href")
            .ok_or(ParseNodeError::MissingHref)?;

        let link = format!("{}{}", self.origin, href);

        // title and company are already non-empty, so `new` cannot refuse them
        JobPosting::new(&title, &company, link, clock()).ok_or(ParseNodeError::MissingTitle)
    }
}

/// Text content with each fragment trimmed and blanks dropped.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keeps postings whose title contains `keyword`, ignoring case.
pub fn filter_by_keyword(jobs: Vec<JobPosting>, keyword: &str) -> Vec<JobPosting> {
    let needle = keyword.to_lowercase();
    jobs.into_iter()
        .filter(|j| j.title.to_lowercase().contains(&needle))
        .collect()
}

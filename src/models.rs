use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One job listing scraped from the board. Column names match the CSV and
/// spreadsheet header row.
///
/// Fields are public for reading and for deserializing rows back from CSV.
/// [`JobPosting::new`] is the only constructor that checks title and company
/// are non-empty; the extractor always goes through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Link")]
    pub link: String,
    #[serde(rename = "Scraped At")]
    pub scraped_at: String,
}

pub const HEADER: [&str; 4] = ["Title", "Company", "Link", "Scraped At"];

impl JobPosting {
    /// Builds a posting, or `None` if the title or company is blank.
    pub fn new(title: &str, company: &str, link: String, scraped_at: DateTime<Utc>) -> Option<Self> {
        let title = title.trim();
        let company = company.trim();
        if title.is_empty() || company.is_empty() {
            return None;
        }
        Some(JobPosting {
            title: title.to_string(),
            company: company.to_string(),
            link,
            scraped_at: format_timestamp(scraped_at),
        })
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.company.clone(),
            self.link.clone(),
            self.scraped_at.clone(),
        ]
    }
}

/// ISO-8601 with microseconds and an explicit `+00:00` offset.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::{debug, info};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::SheetError;
use crate::models::{JobPosting, HEADER};

pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// A worksheet resolved by name: the spreadsheet id plus the tab title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetRef {
    pub spreadsheet_id: String,
    pub title: String,
}

/// The three spreadsheet operations the sink needs.
pub trait SheetClient {
    fn open_first_worksheet(&self, spreadsheet_name: &str) -> Result<WorksheetRef, SheetError>;
    fn clear(&self, sheet: &WorksheetRef) -> Result<(), SheetError>;
    fn append_rows(&self, sheet: &WorksheetRef, rows: &[Vec<String>]) -> Result<(), SheetError>;
}

/// Where the pipeline sends postings after the CSV file.
pub trait SheetSink {
    fn write(&self, jobs: &[JobPosting]) -> Result<(), SheetError>;
}

/// Replaces the first worksheet of `spreadsheet_name` with a header row and
/// one row per posting, in order.
pub fn replace_worksheet<C>(client: &C, spreadsheet_name: &str, jobs: &[JobPosting]) -> Result<(), SheetError>
where
    C: SheetClient + ?Sized,
{
    let sheet = client.open_first_worksheet(spreadsheet_name)?;
    client.clear(&sheet)?;

    let header: Vec<String> = HEADER.iter().map(|h| h.to_string()).collect();
    client.append_rows(&sheet, &[header])?;

    let rows: Vec<Vec<String>> = jobs.iter().map(JobPosting::to_row).collect();
    client.append_rows(&sheet, &rows)?;

    info!("Saved {} jobs to Google Sheets", jobs.len());
    Ok(())
}

/// Sink backed by the Google Sheets API and a service-account key file.
pub struct GoogleSheetSink {
    credentials_path: PathBuf,
    sheet_name: String,
}

impl GoogleSheetSink {
    pub fn new(credentials_path: PathBuf, sheet_name: String) -> Self {
        GoogleSheetSink { credentials_path, sheet_name }
    }
}

impl SheetSink for GoogleSheetSink {
    fn write(&self, jobs: &[JobPosting]) -> Result<(), SheetError> {
        if jobs.is_empty() {
            info!("No jobs to save");
            return Ok(());
        }
        let client = GoogleSheetsClient::authorize(&self.credentials_path, &SCOPES)?;
        replace_worksheet(&client, &self.sheet_name, jobs)
    }
}

#[derive(Debug, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, SheetError> {
        let content = fs::read_to_string(path).map_err(|e| SheetError::Credentials {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| SheetError::Credentials {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Signs the RS256 assertion exchanged for an access token.
pub fn build_assertion(key: &ServiceAccountKey, scopes: &[&str]) -> Result<String, SheetError> {
    let iat = Utc::now().timestamp();
    let claims = Claims {
        iss: &key.client_email,
        scope: scopes.join(" "),
        aud: &key.token_uri,
        iat,
        exp: iat + 3600,
    };
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| SheetError::Auth(format!("invalid private key: {}", e)))?;
    encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
        .map_err(|e| SheetError::Auth(format!("could not sign assertion: {}", e)))
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
    // zero is omitted from API responses
    #[serde(default)]
    index: i64,
}

pub struct GoogleSheetsClient {
    client: Client,
    token: String,
}

impl GoogleSheetsClient {
    pub fn authorize(credentials_path: &Path, scopes: &[&str]) -> Result<Self, SheetError> {
        let key = ServiceAccountKey::from_file(credentials_path)?;
        let assertion = build_assertion(&key, scopes)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let resp = client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()?;
        let token: TokenResponse = check(resp)
            .map_err(|e| SheetError::Auth(e.to_string()))?
            .json()?;

        debug!("Authorized as {}", key.client_email);
        Ok(GoogleSheetsClient { client, token: token.access_token })
    }
}

impl SheetClient for GoogleSheetsClient {
    fn open_first_worksheet(&self, spreadsheet_name: &str) -> Result<WorksheetRef, SheetError> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_drive_literal(spreadsheet_name),
            SPREADSHEET_MIME
        );
        let resp = self
            .client
            .get(DRIVE_FILES_URL)
            .bearer_auth(&self.token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()?;
        let list: DriveFileList = check(resp)?.json()?;
        let spreadsheet_id = list
            .files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| SheetError::SpreadsheetNotFound(spreadsheet_name.to_string()))?;

        let resp = self
            .client
            .get(format!("{}/{}", SHEETS_URL, spreadsheet_id))
            .bearer_auth(&self.token)
            .query(&[("fields", "sheets.properties(title,index)")])
            .send()?;
        let meta: SpreadsheetMeta = check(resp)?.json()?;
        let title = meta
            .sheets
            .into_iter()
            .min_by_key(|s| s.properties.index)
            .map(|s| s.properties.title)
            .ok_or_else(|| SheetError::NoWorksheet(spreadsheet_name.to_string()))?;

        Ok(WorksheetRef { spreadsheet_id, title })
    }

    fn clear(&self, sheet: &WorksheetRef) -> Result<(), SheetError> {
        let url = format!(
            "{}/{}/values/{}:clear",
            SHEETS_URL,
            sheet.spreadsheet_id,
            urlencoding::encode(&quote_sheet_title(&sheet.title))
        );
        let resp = self.client.post(url).bearer_auth(&self.token).json(&json!({})).send()?;
        check(resp)?;
        Ok(())
    }

    fn append_rows(&self, sheet: &WorksheetRef, rows: &[Vec<String>]) -> Result<(), SheetError> {
        if rows.is_empty() {
            return Ok(());
        }
        let range = format!("{}!A1", quote_sheet_title(&sheet.title));
        let url = format!(
            "{}/{}/values/{}:append",
            SHEETS_URL,
            sheet.spreadsheet_id,
            urlencoding::encode(&range)
        );
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": rows }))
            .send()?;
        check(resp)?;
        Ok(())
    }
}

fn check(resp: Response) -> Result<Response, SheetError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(SheetError::Api { status: status.as_u16(), body })
}

/// A1-notation sheet name: wrapped in single quotes, inner quotes doubled.
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Escapes a string literal for a Drive `files.list` query.
pub fn escape_drive_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, PartialEq)]
    enum Call {
        Open(String),
        Clear,
        Append(Vec<Vec<String>>),
    }

    #[derive(Default)]
    struct RecordingClient {
        calls: RefCell<Vec<Call>>,
        missing: bool,
    }

    impl SheetClient for RecordingClient {
        fn open_first_worksheet(&self, name: &str) -> Result<WorksheetRef, SheetError> {
            self.calls.borrow_mut().push(Call::Open(name.to_string()));
            if self.missing {
                return Err(SheetError::SpreadsheetNotFound(name.to_string()));
            }
            Ok(WorksheetRef { spreadsheet_id: "abc".into(), title: "Sheet1".into() })
        }

        fn clear(&self, _sheet: &WorksheetRef) -> Result<(), SheetError> {
            self.calls.borrow_mut().push(Call::Clear);
            Ok(())
        }

        fn append_rows(&self, _sheet: &WorksheetRef, rows: &[Vec<String>]) -> Result<(), SheetError> {
            self.calls.borrow_mut().push(Call::Append(rows.to_vec()));
            Ok(())
        }
    }

    fn job(title: &str) -> JobPosting {
        JobPosting::new(title, "Acme", format!("https://remoteok.com/{}", title), Utc::now()).unwrap()
    }

    #[test]
    fn clears_then_writes_header_then_rows_in_order() {
        let client = RecordingClient::default();
        let jobs = vec![job("first"), job("second")];

        replace_worksheet(&client, "job_postings", &jobs).unwrap();

        let calls = client.calls.into_inner();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], Call::Open("job_postings".into()));
        assert_eq!(calls[1], Call::Clear);
        assert_eq!(
            calls[2],
            Call::Append(vec![vec!["Title".into(), "Company".into(), "Link".into(), "Scraped At".into()]])
        );
        assert_eq!(calls[3], Call::Append(vec![jobs[0].to_row(), jobs[1].to_row()]));
    }

    #[test]
    fn missing_spreadsheet_never_clears() {
        let client = RecordingClient { missing: true, ..Default::default() };
        let err = replace_worksheet(&client, "nope", &[job("a")]).unwrap_err();
        assert!(matches!(err, SheetError::SpreadsheetNotFound(_)));
        assert_eq!(client.calls.into_inner(), vec![Call::Open("nope".into())]);
    }

    #[test]
    fn empty_jobs_skip_authorization() {
        let sink = GoogleSheetSink::new(PathBuf::from("/nonexistent/credentials.json"), "job_postings".into());
        assert!(sink.write(&[]).is_ok());
    }

    #[test]
    fn missing_credentials_is_an_error() {
        let sink = GoogleSheetSink::new(PathBuf::from("/nonexistent/credentials.json"), "job_postings".into());
        assert!(matches!(sink.write(&[job("a")]), Err(SheetError::Credentials { .. })));
    }

    #[test]
    fn bad_private_key_fails_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(
            &path,
            r#"{"type":"service_account","client_email":"bot@proj.iam.gserviceaccount.com","private_key":"not a pem"}"#,
        )
        .unwrap();

        let key = ServiceAccountKey::from_file(&path).unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert!(matches!(build_assertion(&key, &SCOPES), Err(SheetError::Auth(_))));
    }

    #[test]
    fn sheet_titles_and_drive_names_are_escaped() {
        assert_eq!(quote_sheet_title("Sheet1"), "'Sheet1'");
        assert_eq!(quote_sheet_title("Bob's jobs"), "'Bob''s jobs'");
        assert_eq!(escape_drive_literal(r"it's a\b"), r"it\'s a\\b");
    }
}

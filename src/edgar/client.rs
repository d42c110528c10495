// src/edgar/client.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use reqwest::header;
use scraper::{Html, Selector};

use crate::edgar::models::{CompanySubmission, FilingInfo};
use crate::utils::error::EdgarError;

pub const DEFAULT_USER_AGENT: &str = "filing-sections research contact@example.com";
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";
const SP100_URL: &str = "https://en.wikipedia.org/wiki/S%26P_100";

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("Failed to compile TABLE_SELECTOR"));
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to compile ROW_SELECTOR"));
static HEADER_CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th").expect("Failed to compile HEADER_CELL_SELECTOR"));
static DATA_CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Failed to compile DATA_CELL_SELECTOR"));

/// Reqwest client configured for EDGAR: mandatory User-Agent and a fixed
/// pause before every request.
pub struct EdgarClient {
    http: reqwest::Client,
    request_delay: Duration,
}

impl EdgarClient {
    pub fn new(user_agent: &str, request_delay: Duration) -> Result<Self, EdgarError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent) // SEC rejects requests without a contact User-Agent
            .timeout(Duration::from_secs(60))
            .build()?;
        tracing::debug!("Using User-Agent: {}", user_agent);
        Ok(Self { http, request_delay })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, EdgarError> {
        // SEC asks for at most 10 requests/second
        tokio::time::sleep(self.request_delay).await;

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json,text/html,text/plain,*/*")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!("Received {} - check User-Agent and rate limits.", status);
                return Err(EdgarError::RateLimited);
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(EdgarError::FilingDocNotFound(url.to_string()));
            }
            return Err(EdgarError::Http(status));
        }
        Ok(response)
    }

    /// Downloads a document body as text.
    pub async fn download_text(&self, url: &str) -> Result<String, EdgarError> {
        tracing::debug!("Downloading document from: {}", url);
        let body = self.get(url).await?.text().await?;
        tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);
        Ok(body)
    }

    /// Downloads the SEC ticker -> CIK map (`company_tickers.json`).
    pub async fn company_tickers(&self) -> Result<serde_json::Value, EdgarError> {
        Ok(self.get(COMPANY_TICKERS_URL).await?.json().await?)
    }

    pub async fn get_company_submissions(&self, cik: &str) -> Result<CompanySubmission, EdgarError> {
        let url = format!("https://data.sec.gov/submissions/CIK{}.json", cik);
        Ok(self.get(&url).await?.json().await?)
    }

    /// Filings of the given form types filed on or after `after`.
    /// `ticker_map` is the document returned by [`Self::company_tickers`].
    pub async fn find_filings(
        &self,
        ticker_map: &serde_json::Value,
        ticker: &str,
        forms: &[String],
        after: NaiveDate,
    ) -> Result<Vec<FilingInfo>, EdgarError> {
        let cik = cik_from_ticker_map(ticker_map, ticker)?;
        let submissions = self.get_company_submissions(&cik).await?;
        select_filings(&submissions, ticker, &cik, forms, after)
    }

    /// Scrapes the S&P 100 constituents from Wikipedia.
    pub async fn sp100_tickers(&self) -> Result<Vec<String>, EdgarError> {
        let html = self.download_text(SP100_URL).await?;
        let tickers = parse_symbol_table(&html);
        if tickers.is_empty() {
            return Err(EdgarError::Parse("No Symbol table found on the S&P 100 page".to_string()));
        }
        Ok(tickers)
    }

    /// Downloads every matching filing for every ticker into `out_dir`.
    /// A failing ticker or document is logged and skipped. Returns the number
    /// of files written.
    pub async fn fetch_forms(
        &self,
        tickers: &[String],
        forms: &[String],
        after: NaiveDate,
        out_dir: &Path,
    ) -> Result<usize, EdgarError> {
        tokio::fs::create_dir_all(out_dir).await?;
        let ticker_map = self.company_tickers().await?;
        let mut written = 0;

        for ticker in tickers {
            let filings = match self.find_filings(&ticker_map, ticker, forms, after).await {
                Ok(filings) => filings,
                Err(e) => {
                    tracing::error!("Failed to list filings for {}: {}", ticker, e);
                    continue;
                }
            };
            tracing::info!("Found {} filings for {}", filings.len(), ticker);

            for filing in filings {
                let url = filing.primary_doc_url();
                let content = match self.download_text(&url).await {
                    Ok(content) => content,
                    Err(e) => {
                        tracing::error!("Failed to download {}: {}", url, e);
                        continue;
                    }
                };
                if save_filing(out_dir, &filing, &content).await.is_some() {
                    written += 1;
                }
            }
        }

        Ok(written)
    }
}

/// Writes one downloaded filing into `out_dir`. A failed write is logged and
/// yields `None` so the caller can move on to the next document.
pub async fn save_filing(out_dir: &Path, filing: &FilingInfo, content: &str) -> Option<PathBuf> {
    let dest = out_dir.join(filing.local_file_name());
    match tokio::fs::write(&dest, content).await {
        Ok(()) => {
            tracing::info!("Saved {} {} ({}) to {}", filing.ticker, filing.form_type, filing.filing_date, dest.display());
            Some(dest)
        }
        Err(e) => {
            tracing::error!("Failed to write {}: {}", dest.display(), e);
            None
        }
    }
}

/// Looks a ticker up in the `company_tickers.json` map. Class suffixes are
/// accepted with either a dot or a dash (`BRK.B` / `BRK-B`).
pub fn cik_from_ticker_map(json: &serde_json::Value, ticker: &str) -> Result<String, EdgarError> {
    let wanted = ticker.to_uppercase().replace('.', "-");
    let companies = json
        .as_object()
        .ok_or_else(|| EdgarError::Parse("Invalid JSON structure".to_string()))?;

    for company in companies.values() {
        let matches = company
            .get("ticker")
            .and_then(|t| t.as_str())
            .map(|t| t.to_uppercase().replace('.', "-") == wanted)
            .unwrap_or(false);
        if !matches {
            continue;
        }
        let cik = company
            .get("cik_str")
            .and_then(|c| c.as_u64())
            .ok_or_else(|| EdgarError::Parse("Invalid CIK format".to_string()))?;
        return Ok(format!("{:010}", cik));
    }

    Err(EdgarError::TickerNotFound(ticker.to_string()))
}

/// Picks filings of the wanted form types filed on or after `after`, newest first.
pub fn select_filings(
    submissions: &CompanySubmission,
    ticker: &str,
    cik: &str,
    forms: &[String],
    after: NaiveDate,
) -> Result<Vec<FilingInfo>, EdgarError> {
    let recent = &submissions.filings.recent;
    let mut filings = Vec::new();

    for (i, form) in recent.form.iter().enumerate() {
        if !forms.iter().any(|wanted| wanted.eq_ignore_ascii_case(form)) {
            continue;
        }

        let raw_date = recent
            .filing_date
            .get(i)
            .ok_or_else(|| EdgarError::Parse("Missing filing date".to_string()))?;
        let filing_date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|e| EdgarError::Parse(format!("Invalid filing date '{}': {}", raw_date, e)))?;
        if filing_date < after {
            continue;
        }

        let accession_number = recent
            .accession_number
            .get(i)
            .ok_or_else(|| EdgarError::Parse("Missing accession number".to_string()))?;
        let primary_doc = recent
            .primary_document
            .get(i)
            .ok_or_else(|| EdgarError::Parse("Missing primary document".to_string()))?;

        filings.push(FilingInfo {
            accession_number: accession_number.clone(),
            filing_date,
            form_type: form.clone(),
            ticker: ticker.to_uppercase(),
            company_name: submissions.name.clone(),
            cik: cik.to_string(),
            primary_doc: primary_doc.clone(),
        });
    }

    filings.sort_by(|a, b| b.filing_date.cmp(&a.filing_date));
    Ok(filings)
}

/// Collects the `Symbol` column of the first table that has one.
pub fn parse_symbol_table(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    for table in document.select(&TABLE_SELECTOR) {
        let Some(column) = table
            .select(&HEADER_CELL_SELECTOR)
            .position(|th| th.text().collect::<String>().trim() == "Symbol")
        else {
            continue;
        };

        return table
            .select(&ROW_SELECTOR)
            .filter_map(|row| row.select(&DATA_CELL_SELECTOR).nth(column))
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .filter(|symbol| !symbol.is_empty())
            .collect();
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cik_lookup() {
        let json = serde_json::json!({
            "0": { "cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc." },
            "1": { "cik_str": 1067983, "ticker": "BRK-B", "title": "Berkshire Hathaway" }
        });
        assert_eq!(cik_from_ticker_map(&json, "aapl").unwrap(), "0000320193");
        assert_eq!(cik_from_ticker_map(&json, "BRK.B").unwrap(), "0001067983");
        assert!(matches!(
            cik_from_ticker_map(&json, "ZZZZ"),
            Err(EdgarError::TickerNotFound(_))
        ));
    }

    #[test]
    fn test_select_filings_by_form_and_date() {
        let submissions: CompanySubmission = serde_json::from_value(serde_json::json!({
            "name": "Apple Inc.",
            "cik": "320193",
            "filings": { "recent": {
                "accessionNumber": ["a-1", "a-2", "a-3", "a-4"],
                "filingDate": ["2024-11-01", "2024-08-02", "2023-11-03", "2024-05-03"],
                "form": ["10-K", "10-Q", "10-K", "8-K"],
                "primaryDocument": ["k24.htm", "q24.htm", "k23.htm", "e.htm"]
            }}
        }))
        .unwrap();

        let forms = vec!["10-K".to_string(), "10-Q".to_string()];
        let after = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let filings = select_filings(&submissions, "aapl", "0000320193", &forms, after).unwrap();

        let accessions: Vec<_> = filings.iter().map(|f| f.accession_number.as_str()).collect();
        assert_eq!(accessions, ["a-1", "a-2"]);
        assert_eq!(filings[0].ticker, "AAPL");
        assert_eq!(filings[0].company_name, "Apple Inc.");
    }

    #[test]
    fn test_parse_symbol_table() {
        let html = r#"
            <table><tr><th>Other</th></tr><tr><td>ignored</td></tr></table>
            <table class="wikitable">
              <tr><th>Symbol</th><th>Name</th><th>Sector</th></tr>
              <tr><td>AAPL</td><td>Apple</td><td>IT</td></tr>
              <tr><td>BRK.B</td><td>Berkshire</td><td>Financials</td></tr>
            </table>
        "#;
        assert_eq!(parse_symbol_table(html), ["AAPL", "BRK.B"]);
        assert!(parse_symbol_table("<p>no tables</p>").is_empty());
    }

    fn filing() -> FilingInfo {
        FilingInfo {
            accession_number: "0000320193-24-000123".to_string(),
            filing_date: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            form_type: "10-K".to_string(),
            ticker: "AAPL".to_string(),
            company_name: "Apple Inc.".to_string(),
            cik: "0000320193".to_string(),
            primary_doc: "aapl-20240928.htm".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_filing_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_filing(dir.path(), &filing(), "<p>Item 7.</p>").await.unwrap();
        assert!(path.ends_with("AAPL_10-K_0000320193-24-000123.htm"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<p>Item 7.</p>");
    }

    #[tokio::test]
    async fn test_save_filing_failure_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the output directory should be makes every write fail
        let not_a_dir = dir.path().join("raw");
        std::fs::write(&not_a_dir, "occupied").unwrap();

        assert!(save_filing(&not_a_dir, &filing(), "body").await.is_none());
        // The next document still lands once the directory is usable
        assert!(save_filing(dir.path(), &filing(), "body").await.is_some());
    }
}

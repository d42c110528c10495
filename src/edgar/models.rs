// src/edgar/models.rs
use chrono::NaiveDate;
use serde::Deserialize;

/// The parts of the EDGAR company submission index we need.
/// Example: https://data.sec.gov/submissions/CIK0000320193.json
#[derive(Debug, Deserialize)]
pub struct CompanySubmission {
    pub name: String,
    pub filings: Filings,
}

#[derive(Debug, Deserialize)]
pub struct Filings {
    pub recent: FilingsList,
}

/// Column-oriented list of recent filings; index `i` across every vector
/// describes one filing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingsList {
    pub accession_number: Vec<String>,
    pub filing_date: Vec<String>,
    pub form: Vec<String>,
    pub primary_document: Vec<String>,
}

/// One filing selected for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingInfo {
    pub accession_number: String,
    pub filing_date: NaiveDate,
    pub form_type: String,
    pub ticker: String,
    pub company_name: String,
    pub cik: String,
    pub primary_doc: String,
}

impl FilingInfo {
    /// Constructs the URL to access the primary document of this filing
    pub fn primary_doc_url(&self) -> String {
        let acc_no_dashes = self.accession_number.replace('-', "");
        let cik = self.cik.trim_start_matches('0');
        format!(
            "https://www.sec.gov/Archives/edgar/data/{}/{}/{}",
            cik, acc_no_dashes, self.primary_doc
        )
    }

    /// `<TICKER>_<FORM>_<ACCESSION>.<ext>`; the stem doubles as the doc id
    /// when the corpus is extracted later.
    pub fn local_file_name(&self) -> String {
        let ext = self
            .primary_doc
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| matches!(ext.as_str(), "htm" | "html" | "txt"))
            .unwrap_or_else(|| "html".to_string());
        format!(
            "{}_{}_{}.{}",
            self.ticker.to_uppercase(),
            self.form_type.replace('/', "-"),
            self.accession_number,
            ext
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filing(primary_doc: &str) -> FilingInfo {
        FilingInfo {
            accession_number: "0000320193-24-000123".to_string(),
            filing_date: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            form_type: "10-K".to_string(),
            ticker: "aapl".to_string(),
            company_name: "Apple Inc.".to_string(),
            cik: "0000320193".to_string(),
            primary_doc: primary_doc.to_string(),
        }
    }

    #[test]
    fn test_primary_doc_url() {
        assert_eq!(
            filing("aapl-20240928.htm").primary_doc_url(),
            "https://www.sec.gov/Archives/edgar/data/320193/000032019324000123/aapl-20240928.htm"
        );
    }

    #[test]
    fn test_local_file_name() {
        assert_eq!(
            filing("aapl-20240928.htm").local_file_name(),
            "AAPL_10-K_0000320193-24-000123.htm"
        );
        assert_eq!(
            filing("primary_doc.xml").local_file_name(),
            "AAPL_10-K_0000320193-24-000123.html"
        );
    }
}

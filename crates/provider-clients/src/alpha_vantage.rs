use async_trait::async_trait;
use maven_core::{FinancialStatements, FundamentalsProvider, ProviderError, StatementLine, StatementTable};
use reqwest::Client;
use serde_json::{Map, Value};

use crate::http::{error_for_status, read_json, send_with_retry, HttpSettings};

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Report fields that label a column rather than hold a line item
const HEADER_FIELDS: &[&str] = &["fiscalDateEnding", "reportedCurrency"];

/// Alpha Vantage fundamental data (annual balance sheet, income statement, cash flow)
#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    client: Client,
    base_url: String,
    settings: HttpSettings,
}

impl AlphaVantageClient {
    pub fn new(api_key: String, settings: HttpSettings) -> Self {
        Self::with_base_url(api_key, BASE_URL, settings)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>, settings: HttpSettings) -> Self {
        Self {
            api_key,
            client: settings.build_client(),
            base_url: base_url.into(),
            settings,
        }
    }

    /// Fetch one statement function (e.g. `BALANCE_SHEET`) and lay it out by period.
    async fn get_statement(&self, function: &str, symbol: &str) -> Result<StatementTable, ProviderError> {
        let response = send_with_retry(
            &self.client,
            self.client.get(&self.base_url).query(&[
                ("function", function),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ]),
            &self.settings,
            "Alpha Vantage",
        )
        .await?;

        if !response.status().is_success() {
            return Err(error_for_status(response, symbol).await);
        }

        let json: Value = read_json(response, &self.settings).await?;

        // Alpha Vantage reports errors with HTTP 200 and a message field
        if let Some(error) = json.get("Error Message") {
            return Err(ProviderError::Api(format!("Alpha Vantage error: {}", error)));
        }
        if let Some(note) = json.get("Note").or_else(|| json.get("Information")) {
            return Err(ProviderError::RateLimited(format!("Alpha Vantage: {}", note)));
        }

        let reports = json
            .get("annualReports")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ProviderError::NotFound(format!("{} {}", function, symbol)))?;

        let reports: Vec<&Map<String, Value>> = reports.iter().filter_map(|r| r.as_object()).collect();
        Ok(transpose_reports(&reports))
    }
}

/// Pivot a list of per-period reports into a line-item table.
///
/// Columns follow report order (most recent first). Line items keep the
/// field order of the first report; items only present in later reports are
/// appended. Alpha Vantage's `"None"` placeholder becomes an empty cell.
fn transpose_reports(reports: &[&Map<String, Value>]) -> StatementTable {
    let periods: Vec<String> = reports
        .iter()
        .map(|r| {
            r.get("fiscalDateEnding")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string()
        })
        .collect();

    let mut items: Vec<&str> = Vec::new();
    for report in reports {
        for key in report.keys() {
            if !HEADER_FIELDS.contains(&key.as_str()) && !items.contains(&key.as_str()) {
                items.push(key.as_str());
            }
        }
    }

    let lines = items
        .into_iter()
        .map(|item| StatementLine {
            item: item.to_string(),
            values: reports
                .iter()
                .map(|r| match r.get(item) {
                    Some(Value::String(s)) if s != "None" => Some(s.clone()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
        })
        .collect();

    StatementTable { periods, lines }
}

#[async_trait]
impl FundamentalsProvider for AlphaVantageClient {
    async fn get_annual_statements(&self, symbol: &str) -> Result<FinancialStatements, ProviderError> {
        let (balance_sheet, income_statement, cash_flow) = tokio::try_join!(
            self.get_statement("BALANCE_SHEET", symbol),
            self.get_statement("INCOME_STATEMENT", symbol),
            self.get_statement("CASH_FLOW", symbol),
        )?;

        Ok(FinancialStatements {
            symbol: symbol.to_string(),
            balance_sheet,
            income_statement,
            cash_flow,
        })
    }
}

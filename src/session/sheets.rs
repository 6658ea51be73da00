// ABOUTME: Google Sheets sink — appends each turn record as one row via the values:append API.
// ABOUTME: Authenticates as a service account; access tokens are fetched and refreshed on demand.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

use crate::error::SheetError;
use crate::session::log::{TurnRecord, TurnSink};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Extract the spreadsheet id from a `https://docs.google.com/spreadsheets/d/<id>/...` URL.
pub fn spreadsheet_id_from_url(url: &str) -> Result<String, SheetError> {
    let invalid = || SheetError::InvalidLocator(url.to_string());

    let (_, rest) = url.split_once("/spreadsheets/d/").ok_or_else(invalid)?;
    let id: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if id.is_empty() { Err(invalid()) } else { Ok(id) }
}

/// Parse a service-account key given either inline as JSON or as a path to the key file.
pub fn load_service_account_key(credential: &str) -> Result<ServiceAccountKey, SheetError> {
    let credential = credential.trim();
    let json = if credential.starts_with('{') {
        credential.to_string()
    } else {
        std::fs::read_to_string(credential)
            .map_err(|e| SheetError::Credential(format!("cannot read key file: {}", e)))?
    };

    // The parser's message can quote the input, so only its category is kept.
    yup_oauth2::parse_service_account_key(json).map_err(|e| {
        SheetError::Credential(format!("not a service account key ({:?})", e.kind()))
    })
}

/// Access tokens for one service account. The authenticator caches tokens and
/// refreshes them before they expire.
struct ServiceAccountTokens {
    key: ServiceAccountKey,
    authenticator: OnceCell<DefaultAuthenticator>,
}

impl ServiceAccountTokens {
    fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            authenticator: OnceCell::new(),
        }
    }

    async fn access_token(&self) -> Result<String, SheetError> {
        let authenticator = self
            .authenticator
            .get_or_try_init(|| ServiceAccountAuthenticator::builder(self.key.clone()).build())
            .await
            .map_err(|e| SheetError::Auth(e.to_string()))?;

        let token = authenticator
            .token(&[SPREADSHEETS_SCOPE])
            .await
            .map_err(|e| SheetError::Auth(e.to_string()))?;

        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| SheetError::Auth("token response carried no access token".to_string()))
    }
}

#[derive(Serialize)]
struct AppendRequest {
    values: Vec<Vec<Value>>,
}

/// Appends rows to one worksheet of one spreadsheet.
pub struct SheetsSink {
    client: Client,
    spreadsheet_id: String,
    worksheet: String,
    tokens: ServiceAccountTokens,
    api_base: String,
}

impl SheetsSink {
    /// `credential` is the service-account key JSON or a path to it.
    pub fn new(
        sheet_url: &str,
        worksheet: impl Into<String>,
        credential: &str,
    ) -> Result<Self, SheetError> {
        Ok(Self {
            client: Client::new(),
            spreadsheet_id: spreadsheet_id_from_url(sheet_url)?,
            worksheet: worksheet.into(),
            tokens: ServiceAccountTokens::new(load_service_account_key(credential)?),
            api_base: SHEETS_API_BASE.to_string(),
        })
    }

    /// Point the sink at a different API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Email of the service account rows are written as.
    pub fn service_account(&self) -> &str {
        &self.tokens.key.client_email
    }

    /// Full `values:append` URL for the configured worksheet.
    pub fn append_url(&self) -> String {
        let range = format!("'{}'!A1", self.worksheet.replace('\'', "''"));
        format!(
            "{}/{}/values/{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.api_base.trim_end_matches('/'),
            self.spreadsheet_id,
            urlencoding::encode(&range)
        )
    }

    async fn append_row(&self, row: Vec<Value>) -> Result<(), SheetError> {
        let token = self.tokens.access_token().await?;
        let body = AppendRequest { values: vec![row] };
        let response = self
            .client
            .post(self.append_url())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(SheetError::Status { status, body });
        }

        Ok(())
    }
}

#[async_trait]
impl TurnSink for SheetsSink {
    fn name(&self) -> &str {
        "sheets"
    }

    async fn append(&self, record: &TurnRecord) -> anyhow::Result<()> {
        self.append_row(record.to_row()).await?;
        Ok(())
    }
}

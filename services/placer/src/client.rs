//! HTTP client for the pixel write endpoint.

use pixfleet_canvas::{CanvasPoint, ColorIndex};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use tracing::{debug, warn};

use crate::account::Account;
use crate::config::Config;
use crate::error::PlacerError;
use crate::protocol::{PlacementOutcome, SetPixelRequest};

/// Client for issuing pixel writes on behalf of pool accounts.
#[derive(Debug, Clone)]
pub struct PlacementClient {
    client: reqwest::Client,
    write_url: String,
}

impl PlacementClient {
    /// Create a new placement client from config.
    pub fn new(config: &Config) -> Result<Self, PlacerError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en,en-US;q=0.9,he;q=0.8"));
        headers.insert("apollographql-client-name", HeaderValue::from_static("mona-lisa"));
        headers.insert("apollographql-client-version", HeaderValue::from_static("0.0.1"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| PlacerError::Config("user agent is not a valid header".into()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            write_url: config.write_url.clone(),
        })
    }

    /// Write `color` at the absolute canvas `point` using the account's token.
    ///
    /// A non-2xx status is returned as [`PlacerError::Http`]. A 2xx body is
    /// decoded into a [`PlacementOutcome`], which may still be a failure
    /// (for example a cooldown rejection).
    pub async fn place(
        &self,
        account: &Account,
        point: CanvasPoint,
        color: ColorIndex,
    ) -> Result<PlacementOutcome, PlacerError> {
        let tile = point.to_tile()?;
        let request = SetPixelRequest::new(tile, color);

        debug!(
            username = %account.username(),
            canvas_index = tile.canvas_index,
            x = tile.x,
            y = tile.y,
            color = %color,
            "Sending pixel write"
        );

        let response = self
            .client
            .post(&self.write_url)
            .bearer_auth(account.session().token())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(
                username = %account.username(),
                token = %account.session().fingerprint(),
                status = %status,
                "Write endpoint returned an error status"
            );
            return Err(PlacerError::Http {
                status: status.as_u16(),
                body,
            });
        }

        PlacementOutcome::decode(&body)
    }
}

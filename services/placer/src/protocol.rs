//! Wire shapes for the pixel write mutation.
//!
//! The write endpoint answers 2xx in two shapes:
//!
//! ```text
//! rejected: {"errors": [{"message": "...", "extensions": {"nextAvailablePixelTs": 1649000000000}}], ...}
//! accepted: {"data": {"act": {"data": [{"data": {"nextAvailablePixelTimestamp": 1649000000000.5, ...}}, ...]}}}
//! ```
//!
//! Both are decoded with serde into [`PlacementOutcome`]; anything else is a
//! [`PlacerError::Decode`].

use chrono::{DateTime, TimeZone, Utc};
use pixfleet_canvas::{ColorIndex, TilePoint};
use serde::{Deserialize, Serialize};

use crate::error::PlacerError;

const OPERATION_NAME: &str = "setPixel";
const ACTION_NAME: &str = "r/replace:set_pixel";
const SET_PIXEL_MUTATION: &str = "mutation setPixel($input: ActInput!) {\n  act(input: $input) {\n    data {\n      ... on BasicMessage {\n        id\n        data {\n          ... on GetUserCooldownResponseMessageData {\n            nextAvailablePixelTimestamp\n            __typename\n          }\n          ... on SetPixelResponseMessageData {\n            timestamp\n            __typename\n          }\n          __typename\n        }\n        __typename\n      }\n      __typename\n    }\n    __typename\n  }\n}\n";

/// Result of one write attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementOutcome {
    /// The pixel was written.
    Success { next_eligible_at: DateTime<Utc> },

    /// The server refused the write, usually because of a cooldown.
    Failure {
        reason: String,
        next_eligible_at: Option<DateTime<Utc>>,
    },
}

impl PlacementOutcome {
    /// Decode a 2xx response body.
    pub fn decode(body: &str) -> Result<Self, PlacerError> {
        let response: WriteResponse = serde_json::from_str(body)
            .map_err(|e| PlacerError::Decode(format!("{}: {}", e, truncate(body, 200))))?;
        response.into_outcome()
    }

    /// When the account may write again, if the server said.
    pub fn next_eligible_at(&self) -> Option<DateTime<Utc>> {
        match self {
            PlacementOutcome::Success { next_eligible_at } => Some(*next_eligible_at),
            PlacementOutcome::Failure {
                next_eligible_at, ..
            } => *next_eligible_at,
        }
    }

    /// Returns true if the pixel was written.
    pub fn is_success(&self) -> bool {
        matches!(self, PlacementOutcome::Success { .. })
    }
}

// ============================================================================
// Request
// ============================================================================

/// GraphQL body for the `setPixel` mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPixelRequest {
    operation_name: &'static str,
    variables: Variables,
    query: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct Variables {
    input: ActInput,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActInput {
    action_name: &'static str,
    #[serde(rename = "PixelMessageData")]
    pixel_message_data: PixelMessageData,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PixelMessageData {
    coordinate: Coordinate,
    color_index: ColorIndex,
    canvas_index: u32,
}

#[derive(Debug, Clone, Serialize)]
struct Coordinate {
    x: u32,
    y: u32,
}

impl SetPixelRequest {
    /// Build the mutation for a tile-local point.
    pub fn new(tile: TilePoint, color: ColorIndex) -> Self {
        Self {
            operation_name: OPERATION_NAME,
            variables: Variables {
                input: ActInput {
                    action_name: ACTION_NAME,
                    pixel_message_data: PixelMessageData {
                        coordinate: Coordinate {
                            x: tile.x,
                            y: tile.y,
                        },
                        color_index: color,
                        canvas_index: tile.canvas_index,
                    },
                },
            },
            query: SET_PIXEL_MUTATION,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// The two known 2xx shapes. Order matters: a body carrying `errors` is a
/// rejection even if it also has a `data` key.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WriteResponse {
    Rejected { errors: Vec<GraphqlError> },
    Accepted { data: ActData },
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    extensions: Option<ErrorExtensions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorExtensions {
    #[serde(default)]
    next_available_pixel_ts: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ActData {
    act: Act,
}

#[derive(Debug, Deserialize)]
struct Act {
    #[serde(default)]
    data: Vec<ActMessage>,
}

#[derive(Debug, Deserialize)]
struct ActMessage {
    #[serde(default)]
    data: Option<MessageData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageData {
    #[serde(default)]
    next_available_pixel_timestamp: Option<f64>,
}

impl WriteResponse {
    fn into_outcome(self) -> Result<PlacementOutcome, PlacerError> {
        match self {
            WriteResponse::Rejected { errors } => {
                let first = errors.into_iter().next();
                let next_eligible_at = first
                    .as_ref()
                    .and_then(|e| e.extensions.as_ref())
                    .and_then(|ext| ext.next_available_pixel_ts)
                    .map(millis_to_datetime)
                    .transpose()?;
                let reason = first
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "unspecified error".to_string());

                Ok(PlacementOutcome::Failure {
                    reason,
                    next_eligible_at,
                })
            }
            WriteResponse::Accepted { data } => {
                let millis = data
                    .act
                    .data
                    .iter()
                    .filter_map(|message| message.data.as_ref())
                    .find_map(|d| d.next_available_pixel_timestamp)
                    .ok_or_else(|| {
                        PlacerError::Decode(
                            "accepted response has no nextAvailablePixelTimestamp".to_string(),
                        )
                    })?;

                Ok(PlacementOutcome::Success {
                    next_eligible_at: millis_to_datetime(millis)?,
                })
            }
        }
    }
}

/// Convert epoch milliseconds, truncating any fractional part.
fn millis_to_datetime(millis: f64) -> Result<DateTime<Utc>, PlacerError> {
    if !millis.is_finite() {
        return Err(PlacerError::Decode(format!("invalid timestamp: {}", millis)));
    }

    Utc.timestamp_millis_opt(millis.trunc() as i64)
        .single()
        .ok_or_else(|| PlacerError::Decode(format!("timestamp out of range: {}", millis)))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

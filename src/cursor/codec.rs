//! Cursor value type and token codec

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use url::form_urlencoded;

use crate::error::{Error, Result};
use crate::types::MAX_OFFSET;

/// URL-safe base64 that writes no padding and accepts tokens with or
/// without it
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const OFFSET_KEY: &str = "o";
const REVERSE_KEY: &str = "r";
const POSITION_KEY: &str = "p";

/// Resume state of a paginated listing
///
/// `position` and `offset` together name a unique resume point: skip every
/// record up to and including `position`, then skip `offset` more records
/// that share that key. A cursor without a position starts at the
/// beginning of the sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Cursor {
    offset: u32,
    reverse: bool,
    position: Option<String>,
}

impl Cursor {
    /// Create a cursor, rejecting offsets above [`MAX_OFFSET`]
    pub fn new(offset: u32, reverse: bool, position: Option<String>) -> Result<Self> {
        if offset > MAX_OFFSET {
            return Err(Error::InvalidCursor);
        }
        Ok(Self {
            offset,
            reverse,
            position,
        })
    }

    /// The cursor for the first page
    pub fn start() -> Self {
        Self::default()
    }

    /// Same-keyed records to skip past the position
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Whether this cursor pages backwards
    pub fn reverse(&self) -> bool {
        self.reverse
    }

    /// Leading-key value of the pivot record
    pub fn position(&self) -> Option<&str> {
        self.position.as_deref()
    }

    /// Check if every field holds its default
    pub fn is_start(&self) -> bool {
        self.offset == 0 && !self.reverse && self.position.is_none()
    }

    /// Encode as an opaque token. The all-default cursor encodes to `""`.
    pub fn encode(&self) -> String {
        if self.is_start() {
            return String::new();
        }

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if self.offset != 0 {
            serializer.append_pair(OFFSET_KEY, &self.offset.to_string());
        }
        if self.reverse {
            serializer.append_pair(REVERSE_KEY, "1");
        }
        if let Some(position) = &self.position {
            serializer.append_pair(POSITION_KEY, position);
        }

        TOKEN_ENGINE.encode(serializer.finish())
    }

    /// Decode a token produced by [`Cursor::encode`]
    ///
    /// Every failure maps to [`Error::InvalidCursor`]; the reason is only
    /// logged, never returned.
    pub fn decode(token: &str) -> Result<Self> {
        if token.is_empty() {
            return Ok(Self::start());
        }

        decode_token(token).map_err(|rejection| {
            tracing::debug!(%rejection, "Rejected cursor token");
            Error::InvalidCursor
        })
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl FromStr for Cursor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

impl From<Cursor> for String {
    fn from(cursor: Cursor) -> Self {
        cursor.encode()
    }
}

impl TryFrom<String> for Cursor {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::decode(&value)
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Why a token was rejected. Internal only.
#[derive(Debug, thiserror::Error)]
enum Rejection {
    #[error("not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("no fields")]
    Empty,

    #[error("malformed field {0:?}")]
    MalformedField(String),

    #[error("bad offset {0:?}")]
    Offset(String),

    #[error("bad reverse flag {0:?}")]
    Reverse(String),
}

fn decode_token(token: &str) -> std::result::Result<Cursor, Rejection> {
    let bytes = TOKEN_ENGINE.decode(token)?;
    let pairs = String::from_utf8(bytes)?;

    if pairs.is_empty() {
        return Err(Rejection::Empty);
    }

    // Strict parsing: every segment must be a `key=value` pair
    if let Some(segment) = pairs.split('&').find(|segment| !segment.contains('=')) {
        return Err(Rejection::MalformedField(segment.to_string()));
    }

    // A repeated key keeps its last value; unknown keys are ignored
    let mut fields: HashMap<String, String> = HashMap::new();
    for (key, value) in form_urlencoded::parse(pairs.as_bytes()) {
        fields.insert(key.into_owned(), value.into_owned());
    }

    // The short key wins over its long name
    let mut field =
        |short: &str, long: &str| fields.remove(short).or_else(|| fields.remove(long));

    let offset = field(OFFSET_KEY, "offset")
        .map(|value| parse_offset(&value))
        .transpose()?;
    let reverse = field(REVERSE_KEY, "reverse")
        .map(|value| parse_flag(&value))
        .transpose()?;
    let position = field(POSITION_KEY, "position");

    Ok(Cursor {
        offset: offset.unwrap_or(0),
        reverse: reverse.unwrap_or(false),
        position,
    })
}

fn parse_offset(value: &str) -> std::result::Result<u32, Rejection> {
    value
        .parse::<i64>()
        .ok()
        .and_then(|offset| u32::try_from(offset).ok())
        .filter(|offset| *offset <= MAX_OFFSET)
        .ok_or_else(|| Rejection::Offset(value.to_string()))
}

fn parse_flag(value: &str) -> std::result::Result<bool, Rejection> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        _ => Err(Rejection::Reverse(value.to_string())),
    }
}

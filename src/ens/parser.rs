//! Typed decode of the ENS wire format.
//!
//! The payload is an XML `<events merchant="...">` container holding one
//! or more `<event>` elements; both the single-event and sequence shapes
//! deserialize into the same `Vec`, so downstream code always sees a
//! normalized batch.

use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// One inbound notification. Ephemeral; lives for one request.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    pub name: String,
    #[serde(default)]
    pub order_increment_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventBatch {
    #[serde(rename = "@merchant")]
    pub merchant: String,
    #[serde(rename = "event", default)]
    pub events: Vec<EventRecord>,
}

/// Root element name required on every batch.
const ROOT_ELEMENT: &[u8] = b"events";

/// Decode a request body into an [`EventBatch`], failing fast on shape
/// mismatches: empty body, malformed XML, wrong top-level container,
/// missing merchant attribute, or zero events.
pub fn parse_batch(body: &[u8]) -> Result<EventBatch> {
    if body.is_empty() {
        return Err(AppError::BadRequest("empty request body".into()));
    }

    let text = std::str::from_utf8(body)
        .map_err(|_| AppError::BadRequest("request body is not valid UTF-8".into()))?;

    expect_root_element(text)?;

    let batch: EventBatch = quick_xml::de::from_str(text)
        .map_err(|e| AppError::BadRequest(format!("malformed event payload: {e}")))?;

    if batch.merchant.is_empty() {
        return Err(AppError::BadRequest("missing merchant attribute".into()));
    }
    if batch.events.is_empty() {
        return Err(AppError::BadRequest("payload contains no events".into()));
    }

    Ok(batch)
}

/// The serde deserializer accepts any root element name; the wire
/// contract does not.
fn expect_root_element(text: &str) -> Result<()> {
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(start)) | Ok(XmlEvent::Empty(start)) => {
                if start.name().as_ref() != ROOT_ELEMENT {
                    return Err(AppError::BadRequest(format!(
                        "unexpected top-level element <{}>",
                        String::from_utf8_lossy(start.name().as_ref())
                    )));
                }
                return Ok(());
            }
            Ok(XmlEvent::Decl(_)) | Ok(XmlEvent::Comment(_)) | Ok(XmlEvent::Text(_)) => continue,
            Ok(XmlEvent::Eof) => {
                return Err(AppError::BadRequest("payload has no top-level element".into()))
            }
            Ok(_) => continue,
            Err(e) => return Err(AppError::BadRequest(format!("malformed XML: {e}"))),
        }
    }
}

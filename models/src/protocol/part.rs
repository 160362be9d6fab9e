//! Content parts carried by messages, status updates and artifacts.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

const TEXT_KIND: &str = "text";
const FILE_KIND: &str = "file";
const DATA_KIND: &str = "data";

/// A file reference inside a part.
///
/// Agents either point at a URI or inline base64 `bytes`; the console only
/// ever links to the URI.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,
}

/// One piece of content.
///
/// On the wire a part may come `kind`-tagged (`{"kind":"text","text":..}`)
/// or bare (`{"text":..}`); both decode to the same variant. Anything that
/// carries none of the three payloads, or carries one with the wrong type,
/// is kept as [`Part::Unsupported`]. Decoding a part never fails, so one bad
/// part cannot take its siblings down with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "WirePart")]
pub enum Part {
    Text { text: String },
    File { file: FileRef },
    Data { data: Value },
    Unsupported { raw: Map<String, Value> },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn file(uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Part::File {
            file: FileRef {
                uri: Some(uri.into()),
                mime_type: Some(mime_type.into()),
                ..FileRef::default()
            },
        }
    }

    pub fn data(data: Value) -> Self {
        Part::Data { data }
    }

    /// Decode one part from raw JSON, falling back to [`Part::Unsupported`].
    pub fn from_value(value: Value) -> Self {
        match WirePart::deserialize(&value) {
            Ok(wire) => wire.into(),
            Err(_) => {
                let raw = match value {
                    Value::Object(raw) => raw,
                    other => Map::from_iter([("value".to_string(), other)]),
                };
                Part::Unsupported { raw }
            }
        }
    }

    /// The text of a text part, if it is non-empty.
    pub fn non_empty_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Part {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Part::from_value)
    }
}

#[derive(Serialize, Deserialize)]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<FileRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl From<WirePart> for Part {
    fn from(wire: WirePart) -> Self {
        if let Some(text) = wire.text {
            return Part::Text { text };
        }
        if let Some(file) = wire.file {
            return Part::File { file };
        }
        match wire.data {
            Some(data) if !data.is_null() => Part::Data { data },
            _ => {
                let mut raw = wire.rest;
                if let Some(kind) = wire.kind {
                    raw.insert("kind".to_string(), Value::String(kind));
                }
                Part::Unsupported { raw }
            }
        }
    }
}

impl From<Part> for WirePart {
    fn from(part: Part) -> Self {
        let empty = WirePart {
            kind: None,
            text: None,
            file: None,
            data: None,
            rest: Map::new(),
        };

        match part {
            Part::Text { text } => WirePart {
                kind: Some(TEXT_KIND.to_string()),
                text: Some(text),
                ..empty
            },
            Part::File { file } => WirePart {
                kind: Some(FILE_KIND.to_string()),
                file: Some(file),
                ..empty
            },
            Part::Data { data } => WirePart {
                kind: Some(DATA_KIND.to_string()),
                data: Some(data),
                ..empty
            },
            Part::Unsupported { raw } => WirePart { rest: raw, ..empty },
        }
    }
}

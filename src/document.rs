use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One category as stored in the document. Unknown keys written by the
/// upstream UI ride along in `extra` and survive read/modify/write cycles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One note as stored in the document. `content` is opaque, already-sanitized
/// text; `createdAt`/`updatedAt` are fixed-width UTC stamps whose lexical
/// ordering is the recency ordering. A stamp absent on disk stays absent on
/// write-back. `task_content` is untyped and travels through `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub categories: Vec<i64>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Canonical in-memory form of the on-disk document. Top-level keys other
/// than `categories`/`notes` are preserved verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub categories: Vec<Category>,
    pub notes: Vec<Note>,
    pub extra: Map<String, Value>,
}

/// How a collection field was represented when the document was loaded.
/// Recorded once at decode time and replayed verbatim at encode time; the
/// encoding is never re-inferred from the in-memory data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEncoding {
    /// The field held a native JSON array.
    Native,
    /// The field held a JSON-encoded string (the legacy representation).
    /// Missing and null fields also land here, matching the original
    /// store's `?? '[]'` default.
    StringEncoded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldEncodings {
    pub categories: FieldEncoding,
    pub notes: FieldEncoding,
}

impl Default for FieldEncodings {
    fn default() -> Self {
        Self {
            categories: FieldEncoding::StringEncoded,
            notes: FieldEncoding::StringEncoded,
        }
    }
}

/// Lenient decode for ordinary read paths: an outer document that is not a
/// JSON object degrades to an empty document, and corrupt or mistyped
/// collection fields degrade to empty collections.
pub fn decode(raw: &[u8]) -> (Document, FieldEncodings) {
    match serde_json::from_slice::<Value>(raw) {
        Ok(value) => decode_value(value),
        Err(_) => (Document::default(), FieldEncodings::default()),
    }
}

/// Strict decode for maintenance paths (restore validation): bytes that are
/// not valid JSON at all surface the parse error instead of being swallowed.
/// Nested field normalization is the same as [`decode`].
pub fn decode_strict(raw: &[u8]) -> Result<(Document, FieldEncodings), serde_json::Error> {
    let value = serde_json::from_slice::<Value>(raw)?;
    Ok(decode_value(value))
}

fn decode_value(value: Value) -> (Document, FieldEncodings) {
    let Value::Object(mut map) = value else {
        return (Document::default(), FieldEncodings::default());
    };

    let (categories, categories_encoding) = take_collection::<Category>(&mut map, "categories");
    let (notes, notes_encoding) = take_collection::<Note>(&mut map, "notes");

    (
        Document {
            categories,
            notes,
            extra: map,
        },
        FieldEncodings {
            categories: categories_encoding,
            notes: notes_encoding,
        },
    )
}

fn take_collection<T: DeserializeOwned>(
    map: &mut Map<String, Value>,
    key: &str,
) -> (Vec<T>, FieldEncoding) {
    match map.shift_remove(key) {
        None | Some(Value::Null) => (Vec::new(), FieldEncoding::StringEncoded),
        Some(Value::String(inner)) => (
            serde_json::from_str(&inner).unwrap_or_default(),
            FieldEncoding::StringEncoded,
        ),
        Some(value @ Value::Array(_)) => (
            serde_json::from_value(value).unwrap_or_default(),
            FieldEncoding::Native,
        ),
        Some(_) => (Vec::new(), FieldEncoding::Native),
    }
}

/// Serializes the document back to bytes, replaying the per-field encoding
/// recorded at decode time. serde_json leaves non-ASCII text unescaped, so
/// Unicode content round-trips as written.
pub fn encode(doc: &Document, encodings: FieldEncodings) -> Result<Vec<u8>, serde_json::Error> {
    let mut map = Map::new();
    map.insert(
        "categories".to_string(),
        encode_collection(&doc.categories, encodings.categories)?,
    );
    map.insert(
        "notes".to_string(),
        encode_collection(&doc.notes, encodings.notes)?,
    );
    for (key, value) in &doc.extra {
        map.insert(key.clone(), value.clone());
    }
    serde_json::to_vec(&Value::Object(map))
}

fn encode_collection<T: Serialize>(
    items: &[T],
    encoding: FieldEncoding,
) -> Result<Value, serde_json::Error> {
    match encoding {
        FieldEncoding::Native => serde_json::to_value(items),
        FieldEncoding::StringEncoded => Ok(Value::String(serde_json::to_string(items)?)),
    }
}

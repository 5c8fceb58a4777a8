use serde_json::{Map, Value};

use crate::document::{Document, Note};

/// Input for a new note. `content` must already be sanitized (HTML-escaped,
/// newlines converted to `<br>`); the repository stores it as opaque text and
/// never re-escapes, to avoid double-escaping.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub id_ms: i64,
    pub title: String,
    pub content: String,
    pub color: String,
    pub category_id: i64,
    /// Fixed-width UTC stamp; becomes both `createdAt` and `updatedAt`.
    pub timestamp: String,
}

/// Appends a note to the document and returns a clone of it. Persistence is
/// the caller's job via the document store.
pub fn insert(doc: &mut Document, new: NewNote) -> Note {
    let mut extra = Map::new();
    extra.insert("task_content".to_string(), Value::Null);

    let note = Note {
        id: new.id_ms.to_string(),
        title: new.title,
        color: new.color,
        content: new.content,
        categories: vec![new.category_id],
        created_at: Some(new.timestamp.clone()),
        updated_at: Some(new.timestamp),
        extra,
    };
    doc.notes.push(note.clone());
    note
}

pub fn count_in_category(doc: &Document, category_id: i64) -> usize {
    doc.notes
        .iter()
        .filter(|note| note.categories.contains(&category_id))
        .count()
}

/// Notes belonging to `category_id`, or all notes when `None`, in document
/// order. Callers that resolved a category name and got nothing must
/// short-circuit before calling this, not pass `None`.
pub fn filter_by_category(doc: &Document, category_id: Option<i64>) -> Vec<Note> {
    doc.notes
        .iter()
        .filter(|note| match category_id {
            Some(id) => note.categories.contains(&id),
            None => true,
        })
        .cloned()
        .collect()
}

fn recency_key(note: &Note) -> &str {
    note.updated_at
        .as_deref()
        .or(note.created_at.as_deref())
        .unwrap_or("")
}

/// Stable descending sort by `updatedAt`, falling back to `createdAt`.
/// Lexical comparison relies on the fixed-width stamp format; ties keep
/// their prior relative order so pagination stays deterministic.
pub fn sort_by_recency(notes: &mut [Note]) {
    notes.sort_by(|a, b| recency_key(b).cmp(recency_key(a)));
}

/// Single-pass most-recent note: equivalent to sorting by recency and taking
/// the first, without the sort. Notes with no timestamp at all are never
/// candidates; `exclude_id` drops members of that category outright.
pub fn latest<'a>(
    doc: &'a Document,
    category_id: Option<i64>,
    exclude_id: Option<i64>,
) -> Option<&'a Note> {
    let mut best: Option<&Note> = None;
    for note in &doc.notes {
        if let Some(excluded) = exclude_id {
            if note.categories.contains(&excluded) {
                continue;
            }
        }
        if let Some(id) = category_id {
            if !note.categories.contains(&id) {
                continue;
            }
        }
        let key = recency_key(note);
        if key.is_empty() {
            continue;
        }
        // Strictly-greater keeps the earliest tie, matching the stable sort.
        if best.is_none_or(|current| key > recency_key(current)) {
            best = Some(note);
        }
    }
    best
}

/// First note in document order with an exact title match inside the
/// category. Duplicate titles are a known ambiguity: first wins.
pub fn find_by_title_in_category<'a>(
    doc: &'a Document,
    category_id: i64,
    title: &str,
) -> Option<&'a Note> {
    doc.notes
        .iter()
        .find(|note| note.title == title && note.categories.contains(&category_id))
}

/// Drops every note belonging to the category and returns how many were
/// removed. The one destructive primitive in the store; the bulk-cleanup
/// path snapshots the primary before calling this.
pub fn delete_by_category(doc: &mut Document, category_id: i64) -> usize {
    let before = doc.notes.len();
    doc.notes.retain(|note| !note.categories.contains(&category_id));
    before - doc.notes.len()
}

use serde_json::Map;

use crate::document::{Category, Document};

/// Outcome of a lookup-or-create: the id to attach notes to and the spelling
/// callers should echo back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCategory {
    pub id: i64,
    /// The on-file spelling. The first-created spelling of a name wins for
    /// all future references, whatever casing the caller supplied.
    pub name: String,
    pub created: bool,
}

/// Case-insensitive lookup of a category by name; never creates anything.
/// Query paths use this so a read can never grow the document.
pub fn lookup_id(doc: &Document, name: &str) -> Option<i64> {
    doc.categories
        .iter()
        .find(|category| !category.name.is_empty() && category.name.eq_ignore_ascii_case(name))
        .map(|category| category.id)
}

/// Case-insensitive lookup that appends a new category on miss. The new id is
/// the caller-supplied millisecond timestamp; duplicate ids are not
/// de-duplicated, lookups are first-match-wins.
pub fn resolve_or_create(
    doc: &mut Document,
    name: &str,
    default_color: &str,
    id_ms: i64,
) -> ResolvedCategory {
    if let Some(existing) = doc
        .categories
        .iter()
        .find(|category| !category.name.is_empty() && category.name.eq_ignore_ascii_case(name))
    {
        return ResolvedCategory {
            id: existing.id,
            name: existing.name.clone(),
            created: false,
        };
    }

    doc.categories.push(Category {
        id: id_ms,
        name: name.to_string(),
        color: default_color.to_string(),
        extra: Map::new(),
    });
    ResolvedCategory {
        id: id_ms,
        name: name.to_string(),
        created: true,
    }
}

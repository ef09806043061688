//! Compilation of [`PostQuery`] into MongoDB filter, sort, and
//! projection documents. Every listing predicate is produced here and
//! nowhere else.

use bson::{Document, doc};

use verso_core::query::{PostQuery, SortField, SortOrder, Visibility};

/// Filter document for a resolved listing query. Clauses are joined
/// with `$and` so the visibility `$or` and the search `$or` never
/// collide.
pub(crate) fn filter_document(query: &PostQuery) -> Document {
    let mut clauses: Vec<Document> = Vec::new();

    match &query.visibility {
        Visibility::Published => clauses.push(doc! { "status": "published" }),
        Visibility::Status(status) => clauses.push(doc! { "status": status.as_str() }),
        Visibility::Any => {}
        Visibility::PublishedOrAuthor(author_id) => clauses.push(doc! {
            "$or": [
                { "status": "published" },
                { "authorId": author_id },
            ]
        }),
    }

    if let Some(category) = query.category {
        clauses.push(doc! { "category": category.as_str() });
    }
    if !query.tags.is_empty() {
        clauses.push(doc! { "tags": { "$in": query.tags.clone() } });
    }
    if let Some(author_id) = query.author_id {
        clauses.push(doc! { "authorId": author_id });
    }
    if let Some(search) = &query.search {
        let pattern = escape_regex(search);
        clauses.push(doc! {
            "$or": [
                { "title": { "$regex": pattern.as_str(), "$options": "i" } },
                { "excerpt": { "$regex": pattern.as_str(), "$options": "i" } },
                { "content": { "$regex": pattern.as_str(), "$options": "i" } },
                { "tags": { "$regex": pattern.as_str(), "$options": "i" } },
            ]
        });
    }

    if clauses.is_empty() {
        Document::new()
    } else {
        doc! { "$and": clauses }
    }
}

/// Sort document for the whitelisted sort keys.
pub(crate) fn sort_document(query: &PostQuery) -> Document {
    let direction = match query.sort_order {
        SortOrder::Asc => 1,
        SortOrder::Desc => -1,
    };
    let mut sort = Document::new();
    sort.insert(sort_key(query.sort_by), direction);
    sort
}

fn sort_key(field: SortField) -> &'static str {
    match field {
        SortField::CreatedAt => "createdAt",
        SortField::UpdatedAt => "updatedAt",
        SortField::PublishedAt => "publishedAt",
        SortField::Title => "title",
        SortField::Views => "views",
        SortField::ReadingTime => "readingTime",
    }
}

/// Listing projection: drop the heavy body and log fields.
pub(crate) fn preview_projection() -> Document {
    doc! { "content": 0, "markdown": 0, "media": 0, "viewHistory": 0 }
}

/// Escape a user-supplied search string so it matches literally.
pub(crate) fn escape_regex(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(
            c,
            '.' | '*' | '+' | '?' | '^' | '$' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

//! Field extractors.
//!
//! Each extractor reads one field from a [`ParsedDocument`] and fails on its
//! own when its anchor is missing or yields no text. They share nothing and
//! can run in any order.

use crate::document::{AttrPattern, ParsedDocument};
use crate::error::{ExtractionError, Field};

/// Title heading anchor.
pub const NAME_ANCHOR: AttrPattern<'static> = AttrPattern::class_contains("app-informations__Title");

/// Row holding the version and release date.
pub const VERSION_ROW_ANCHOR: AttrPattern<'static> = AttrPattern::class_contains("VersionsRatingRow");

/// Span holding the download bucket.
pub const DOWNLOADS_ANCHOR: AttrPattern<'static> = AttrPattern::class_contains("DetailsMainSpan");

/// Block holding the long description.
pub const DESCRIPTION_ANCHOR: AttrPattern<'static> =
    AttrPattern::attr_contains("itemprop", "description");

type FieldResult = Result<String, ExtractionError>;

fn non_empty(field: Field, text: String) -> FieldResult {
    if text.trim().is_empty() {
        Err(ExtractionError::new(field, "anchor element has no text"))
    } else {
        Ok(text)
    }
}

/// The app name: full text of the title heading.
pub fn extract_name(doc: &ParsedDocument) -> FieldResult {
    let heading = doc
        .find("h1", &NAME_ANCHOR)
        .ok_or_else(|| ExtractionError::missing(Field::Name, "title heading"))?;
    non_empty(Field::Name, heading.text())
}

/// The version: text of the first span inside the version row.
pub fn extract_version(doc: &ParsedDocument) -> FieldResult {
    let row = doc
        .find("div", &VERSION_ROW_ANCHOR)
        .ok_or_else(|| ExtractionError::missing(Field::Version, "version row"))?;
    let span = row
        .find("span")
        .ok_or_else(|| ExtractionError::missing(Field::Version, "span inside the version row"))?;
    non_empty(Field::Version, span.text())
}

/// The download bucket, e.g. `500M+`.
pub fn extract_downloads(doc: &ParsedDocument) -> FieldResult {
    let span = doc
        .find("span", &DOWNLOADS_ANCHOR)
        .ok_or_else(|| ExtractionError::missing(Field::Downloads, "downloads span"))?;
    non_empty(Field::Downloads, span.text())
}

/// The release date, with its surrounding decoration removed.
///
/// Starting at the version row, two "next span" hops in document order land
/// on the date, rendered as `(DD-MM-YYYY)`. The first and last characters
/// are dropped.
pub fn extract_release_date(doc: &ParsedDocument) -> FieldResult {
    let row = doc
        .find("div", &VERSION_ROW_ANCHOR)
        .ok_or_else(|| ExtractionError::missing(Field::ReleaseDate, "version row"))?;
    let date = row
        .find_next("span")
        .and_then(|first| first.find_next("span"))
        .ok_or_else(|| ExtractionError::missing(Field::ReleaseDate, "date span"))?;

    let text = date.text();
    let mut chars = text.chars();
    if chars.next().is_none() || chars.next_back().is_none() {
        return Err(ExtractionError::new(
            Field::ReleaseDate,
            format!("date text '{text}' is too short to strip"),
        ));
    }
    non_empty(Field::ReleaseDate, chars.as_str().to_string())
}

/// The description: text of every element in the description block, one
/// per line, in document order.
///
/// Nested elements contribute their text again on their own line.
pub fn extract_description(doc: &ParsedDocument) -> FieldResult {
    let block = doc
        .find("div", &DESCRIPTION_ANCHOR)
        .ok_or_else(|| ExtractionError::missing(Field::Description, "description block"))?;
    let lines: Vec<String> = block.descendants().map(|node| node.text()).collect();
    non_empty(Field::Description, lines.join("\n"))
}

/// Run the extractor for one field.
pub fn extract_field(doc: &ParsedDocument, field: Field) -> FieldResult {
    match field {
        Field::Name => extract_name(doc),
        Field::Version => extract_version(doc),
        Field::Downloads => extract_downloads(doc),
        Field::ReleaseDate => extract_release_date(doc),
        Field::Description => extract_description(doc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> ParsedDocument {
        ParsedDocument::parse(body)
    }

    #[test]
    fn test_name() {
        let d = doc(r#"<h1 class="app-informations__Title-sc-1">WhatsApp</h1>"#);
        assert_eq!(extract_name(&d).unwrap(), "WhatsApp");

        let err = extract_name(&doc("<h1>WhatsApp</h1>")).unwrap_err();
        assert_eq!(err.field(), Field::Name);
    }

    #[test]
    fn test_name_empty_heading_fails() {
        let d = doc(r#"<h1 class="app-informations__Title">  </h1>"#);
        let err = extract_name(&d).unwrap_err();
        assert_eq!(err.field(), Field::Name);
        assert!(err.reason().contains("no text"));
    }

    #[test]
    fn test_version_uses_first_descendant_span() {
        let d = doc(
            r#"<div class="x-VersionsRatingRow-y"><p><span>2.24.1.6</span></p><span>(01-01-2024)</span></div>"#,
        );
        assert_eq!(extract_version(&d).unwrap(), "2.24.1.6");
    }

    #[test]
    fn test_version_row_without_span() {
        let d = doc(r#"<div class="VersionsRatingRow"><p>1.0</p></div>"#);
        let err = extract_version(&d).unwrap_err();
        assert_eq!(err.field(), Field::Version);
        assert!(err.reason().contains("span"));
    }

    #[test]
    fn test_downloads() {
        let d = doc(r#"<span class="details__DetailsMainSpan-abc">1B+</span>"#);
        assert_eq!(extract_downloads(&d).unwrap(), "1B+");
        assert!(extract_downloads(&doc(r#"<div class="DetailsMainSpan">1B+</div>"#)).is_err());
    }

    #[test]
    fn test_release_date_strips_decoration() {
        let d = doc(
            r#"<div class="VersionsRatingRow"><span>1.0</span><span>(28-02-2025)</span></div>"#,
        );
        assert_eq!(extract_release_date(&d).unwrap(), "28-02-2025");
    }

    #[test]
    fn test_release_date_follows_document_order() {
        // The second span sits after the row, not inside it.
        let d = doc(
            r#"<div class="VersionsRatingRow"><span>1.0</span></div><section><span>[05-06-2024]</span></section>"#,
        );
        assert_eq!(extract_release_date(&d).unwrap(), "05-06-2024");
    }

    #[test]
    fn test_release_date_strips_characters_not_bytes() {
        let d = doc(
            r#"<div class="VersionsRatingRow"><span>1.0</span><span>«12-03-2024»</span></div>"#,
        );
        assert_eq!(extract_release_date(&d).unwrap(), "12-03-2024");
    }

    #[test]
    fn test_release_date_missing_second_span() {
        let d = doc(r#"<div class="VersionsRatingRow"><span>1.0</span></div>"#);
        let err = extract_release_date(&d).unwrap_err();
        assert_eq!(err.field(), Field::ReleaseDate);

        let d = doc(r#"<div class="VersionsRatingRow"><span>1.0</span><span>()</span></div>"#);
        assert!(extract_release_date(&d).is_err());

        let d = doc(r#"<div class="VersionsRatingRow"><span>1.0</span><span>x</span></div>"#);
        assert!(extract_release_date(&d).is_err());
    }

    #[test]
    fn test_description_joins_descendants() {
        let d = doc(
            r#"<div itemprop="description"><h2>About</h2><p>First <b>bold</b></p></div>"#,
        );
        assert_eq!(
            extract_description(&d).unwrap(),
            "About\nFirst bold\nbold"
        );
    }

    #[test]
    fn test_description_without_children_fails() {
        let d = doc(r#"<div itemprop="description">just text</div>"#);
        let err = extract_description(&d).unwrap_err();
        assert_eq!(err.field(), Field::Description);
    }

    #[test]
    fn test_extract_field_dispatch() {
        let d = doc(r#"<span class="DetailsMainSpan">10K+</span>"#);
        assert_eq!(extract_field(&d, Field::Downloads).unwrap(), "10K+");
        assert!(extract_field(&d, Field::Name).is_err());
    }
}

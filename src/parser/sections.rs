use scraper::{ElementRef, Html};

use super::record::{Section, SectionFields};
use super::{element_text, find_by_id, zip_pairs, DD, DT};
use crate::error::ExtractError;

/// Locate the section's anchor, take the first `<dl>` after it and pair its
/// `<dt>`/`<dd>` texts. Later duplicate labels overwrite earlier ones.
pub fn extract_section(document: &Html, section: Section) -> Result<SectionFields, ExtractError> {
    let anchor = section.anchor();
    let header = find_by_id(document, anchor).ok_or_else(|| ExtractError::MissingAnchor {
        anchor,
        what: format!("{} section", section.name()),
    })?;
    let list = next_definition_list(document, header).ok_or(ExtractError::MissingElement {
        anchor,
        element: "dl",
    })?;

    let labels: Vec<String> = list.select(&DT).map(element_text).collect();
    let values: Vec<String> = list.select(&DD).map(element_text).collect();

    Ok(zip_pairs(labels, values, section.name()).into_iter().collect())
}

/// First `<dl>` after `header` in document order, its own subtree included.
fn next_definition_list<'a>(document: &'a Html, header: ElementRef<'a>) -> Option<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .skip_while(|node| node.id() != header.id())
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "dl")
}

// ── Tests ──

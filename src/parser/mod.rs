pub mod bonds;
pub mod record;
pub mod sections;

use std::sync::LazyLock;

use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::error::ExtractError;
use record::{BondKind, DrugRecord, Section, METADATA_ANCHOR};

pub(crate) static DT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dt").unwrap());
pub(crate) static DD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dd").unwrap());

/// Parse a raw drug page and extract it.
pub fn process_page(html: &str) -> Result<DrugRecord, ExtractError> {
    let document = Html::parse_document(html);
    extract(&document)
}

/// Ten required sections, four optional bond lists, then the metadata blob.
/// Any missing required anchor fails the whole page.
pub fn extract(document: &Html) -> Result<DrugRecord, ExtractError> {
    let mut by_section = IndexMap::with_capacity(Section::ALL.len());
    for section in Section::ALL {
        by_section.insert(section, sections::extract_section(document, section)?);
    }

    let mut by_kind = IndexMap::with_capacity(BondKind::ALL.len());
    for kind in BondKind::ALL {
        by_kind.insert(kind, bonds::extract_bonds(document, kind)?);
    }

    let metadata = find_by_id(document, METADATA_ANCHOR)
        .map(element_text)
        .ok_or_else(|| ExtractError::MissingAnchor {
            anchor: METADATA_ANCHOR,
            what: "metadata".to_string(),
        })?;

    Ok(DrugRecord {
        sections: by_section,
        bonds: by_kind,
        metadata,
    })
}

/// First element whose `id` attribute equals `anchor`.
pub(crate) fn find_by_id<'a>(document: &'a Html, anchor: &str) -> Option<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().id() == Some(anchor))
}

/// Concatenated text of an element and its descendants, trimmed.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Pair labels with values by position. Extra entries on either side are
/// dropped; the mismatch is logged, never raised.
pub(crate) fn zip_pairs<L, V>(labels: Vec<L>, values: Vec<V>, context: &str) -> Vec<(L, V)> {
    if labels.len() != values.len() {
        warn!(
            context,
            labels = labels.len(),
            values = values.len(),
            "label/value count mismatch, pairing truncated"
        );
    }
    labels.into_iter().zip(values).collect()
}

// ── Tests ──

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::record::{BondKind, BondRecord, FieldValue, BOND_NAME_KEY};
use super::{element_text, find_by_id, zip_pairs, DD, DT};
use crate::error::ExtractError;

static BOND_CARD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.bond.card").unwrap());
static CARD_HEADER: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".card-header").unwrap());
static STRONG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("strong").unwrap());
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").unwrap());

// Leading token is the card's ordinal/icon ("1.", "⚛"); the rest is the name.
static HEADER_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*\S+\s+(.*\S)").unwrap());

/// All bond cards under the kind's container, in document order.
/// A missing container is not an error: the drug simply has none.
pub fn extract_bonds(document: &Html, kind: BondKind) -> Result<Vec<BondRecord>, ExtractError> {
    let Some(container) = find_by_id(document, kind.anchor()) else {
        debug!(container = kind.anchor(), "no bond container, empty {} list", kind.name());
        return Ok(Vec::new());
    };

    container
        .select(&BOND_CARD)
        .enumerate()
        .map(|(index, card)| parse_card(kind, index, card))
        .collect()
}

fn parse_card(kind: BondKind, index: usize, card: ElementRef<'_>) -> Result<BondRecord, ExtractError> {
    let malformed = |reason| ExtractError::MalformedBondHeader {
        container: kind.anchor(),
        index,
        reason,
    };

    let header = card
        .select(&CARD_HEADER)
        .next()
        .ok_or_else(|| malformed("no card header"))?;
    let strong = header
        .select(&STRONG)
        .next()
        .ok_or_else(|| malformed("no <strong> in card header"))?;
    let mut name = molecule_name(&strong.text().collect::<String>())
        .ok_or_else(|| malformed("nothing after the leading token"))?;

    let labels: Vec<String> = card.select(&DT).map(element_text).collect();
    let values: Vec<ElementRef> = card.select(&DD).collect();
    let context = format!("{} card {}", kind.name(), index);

    let mut fields = IndexMap::new();
    for (label, value) in zip_pairs(labels, values, &context) {
        // A field labelled like the name key replaces the header name.
        if label == BOND_NAME_KEY {
            name = element_text(value);
        } else {
            fields.insert(label, field_value(value));
        }
    }

    Ok(BondRecord { name, fields })
}

/// Header text minus its first whitespace-delimited token.
fn molecule_name(header: &str) -> Option<String> {
    HEADER_NAME_RE
        .captures(header)
        .map(|caps| caps[1].to_string())
}

/// A value region holding nested `<div>`s is a list; otherwise plain text.
fn field_value(value: ElementRef<'_>) -> FieldValue {
    let items: Vec<String> = value.select(&LIST_ITEM).map(element_text).collect();
    if items.is_empty() {
        FieldValue::Scalar(element_text(value))
    } else {
        FieldValue::List(items)
    }
}

// ── Tests ──

use thiserror::Error;

/// Structural faults in a drug page. Any of these aborts extraction for the page.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("missing required anchor #{anchor} ({what})")]
    MissingAnchor { anchor: &'static str, what: String },

    #[error("no <{element}> found after #{anchor}")]
    MissingElement {
        anchor: &'static str,
        element: &'static str,
    },

    #[error("bond card #{index} in #{container} has a malformed header: {reason}")]
    MalformedBondHeader {
        container: &'static str,
        index: usize,
        reason: &'static str,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("record has no '{field}' field in section {section}")]
    MissingField {
        section: &'static str,
        field: &'static str,
    },
}

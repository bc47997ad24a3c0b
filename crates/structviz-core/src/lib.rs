#![forbid(unsafe_code)]

//! Input side of structviz (headless).
//!
//! Turns JSON documents into typed specs:
//! - diagram documents: cell arrays, text labels and connectors between them
//! - tree documents: sparse, index-addressed complete binary trees
//!
//! Layout and geometry live in `structviz-render`.

pub mod config;
pub mod detect;
pub mod diagram;
pub mod direction;
pub mod error;
pub mod geom;
mod json;
pub mod tree;

pub use config::StructvizConfig;
pub use detect::{DetectKindError, DocumentKind, detect_kind};
pub use diagram::{
    CellArraySpec, CellSpec, ConnectionSpec, DiagramSpec, ElementKind, ElementRef, ElementSpec,
    Endpoint, TextPlacement, TextSpec,
};
pub use direction::Direction;
pub use error::{Error, Result};
pub use tree::{NodeData, TreeOverrides, TreeSpec};

/// A parsed input document of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Diagram(DiagramSpec),
    Tree(TreeSpec),
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Diagram(_) => DocumentKind::Diagram,
            Document::Tree(_) => DocumentKind::Tree,
        }
    }
}

/// Parses a JSON document, detecting whether it describes a diagram or a tree.
pub fn parse_document(text: &str) -> Result<Document> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    parse_document_value(&value)
}

pub fn parse_document_value(value: &serde_json::Value) -> Result<Document> {
    let kind = detect_kind(value)?;
    let doc = match kind {
        DocumentKind::Diagram => Document::Diagram(DiagramSpec::from_value(value)?),
        DocumentKind::Tree => Document::Tree(TreeSpec::from_value(value)?),
    };
    tracing::debug!(kind = kind.as_str(), "parsed document");
    Ok(doc)
}

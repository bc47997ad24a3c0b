#![forbid(unsafe_code)]

//! Headless layout for structviz documents.
//!
//! A rebuild runs in one synchronous pass: build elements → position them → route connectors →
//! assemble a [`model::Scene`] that a [`backend::DrawingBackend`] replays.

pub mod backend;
pub mod connection;
pub mod element;
pub mod geom;
pub mod model;
pub mod scene;
pub mod svg;
pub mod text;
pub mod tree;

use crate::model::Scene;
use crate::scene::DiagramLayout;
use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use crate::tree::TreeLayout;
use serde::Serialize;
use std::sync::Arc;
use structviz_core::{Document, StructvizConfig};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] structviz_core::Error),
    #[error("unresolved reference {reference}: {reason}")]
    UnresolvedReference { reference: String, reason: String },
    #[error("empty tree: there are no nodes to lay out")]
    EmptyTree,
    #[error("degenerate geometry: {message}")]
    DegenerateGeometry { message: String },
}

impl Error {
    pub(crate) fn unresolved(reference: impl ToString, reason: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct LayoutOptions {
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
    pub config: StructvizConfig,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
            config: StructvizConfig::defaults(),
        }
    }
}

impl LayoutOptions {
    /// Deep-merges `overrides` over the current configuration.
    pub fn with_config_overrides(mut self, overrides: &serde_json::Value) -> Self {
        self.config.deep_merge(overrides);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Layout {
    Diagram(DiagramLayout),
    Tree(TreeLayout),
}

impl Layout {
    pub fn scene(&self) -> Scene {
        match self {
            Layout::Diagram(layout) => scene::diagram_scene(layout),
            Layout::Tree(layout) => scene::tree_scene(layout),
        }
    }
}

pub fn layout_document(document: &Document, options: &LayoutOptions) -> Result<Layout> {
    match document {
        Document::Diagram(spec) => Ok(Layout::Diagram(scene::layout_diagram(
            spec,
            &options.config,
            options.text_measurer.as_ref(),
        )?)),
        Document::Tree(spec) => {
            let mut config = options.config.clone();
            config.deep_merge(&spec.overrides.to_config_patch());
            let params = tree::TreeParams::from_config(&config);
            Ok(Layout::Tree(tree::layout_tree(spec, &params)?))
        }
    }
}

/// Parses, lays out and assembles a scene from JSON text in one call.
pub fn build_scene(text: &str, options: &LayoutOptions) -> Result<Scene> {
    let document = structviz_core::parse_document(text)?;
    Ok(layout_document(&document, options)?.scene())
}

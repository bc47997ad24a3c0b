#![forbid(unsafe_code)]

//! `structviz` turns declarative JSON documents into 2D geometry.
//!
//! Two document kinds are understood:
//! - diagrams: rows of labeled cells and text, linked by routed, optionally arrowed connectors
//! - trees: sparse complete binary trees addressed by index (`1` is the root, `2k`/`2k+1` the
//!   children of `k`), as used to draw red-black trees
//!
//! # Features
//!
//! - `render` (default): layout, scenes and SVG output (`structviz::render`)

pub use structviz_core::*;

#[cfg(feature = "render")]
pub mod render {
    pub use structviz_render::backend::DrawingBackend;
    pub use structviz_render::model::{Primitive, Scene};
    pub use structviz_render::svg::{SvgBackend, SvgRenderOptions, render_scene_svg};
    pub use structviz_render::text::{DeterministicTextMeasurer, TextMeasurer};
    pub use structviz_render::{Error as RenderError, Layout, LayoutOptions, layout_document};

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Parse(#[from] structviz_core::Error),
        #[error(transparent)]
        Render(#[from] structviz_render::Error),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Parses and lays out a document.
    pub fn layout_text(text: &str, options: &LayoutOptions) -> Result<Layout> {
        let document = structviz_core::parse_document(text)?;
        Ok(layout_document(&document, options)?)
    }

    pub fn build_scene(text: &str, options: &LayoutOptions) -> Result<Scene> {
        Ok(layout_text(text, options)?.scene())
    }

    pub fn render_svg(
        text: &str,
        options: &LayoutOptions,
        svg: &SvgRenderOptions,
    ) -> Result<String> {
        let scene = build_scene(text, options)?;
        Ok(render_scene_svg(&scene, svg))
    }

    /// Holds the last successfully built scene.
    ///
    /// Every [`Stage::rebuild`] is a full recomputation. The stored scene is replaced only once
    /// the new one is complete, so a failing document leaves what is on screen untouched.
    #[derive(Clone, Default)]
    pub struct Stage {
        pub options: LayoutOptions,
        scene: Option<Scene>,
    }

    impl Stage {
        pub fn new(options: LayoutOptions) -> Self {
            Self {
                options,
                scene: None,
            }
        }

        pub fn scene(&self) -> Option<&Scene> {
            self.scene.as_ref()
        }

        pub fn rebuild(&mut self, text: &str) -> Result<&Scene> {
            match build_scene(text, &self.options) {
                Ok(scene) => Ok(&*self.scene.insert(scene)),
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        kept_previous = self.scene.is_some(),
                        "rebuild failed"
                    );
                    Err(err)
                }
            }
        }

        /// Replays the current scene, if any, into `backend`.
        pub fn emit(&self, backend: &mut dyn DrawingBackend) -> bool {
            match &self.scene {
                Some(scene) => {
                    scene.emit(backend);
                    true
                }
                None => false,
            }
        }

        pub fn render_svg(&self, svg: &SvgRenderOptions) -> Option<String> {
            self.scene.as_ref().map(|scene| render_scene_svg(scene, svg))
        }
    }
}

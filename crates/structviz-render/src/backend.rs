use crate::model::{
    CirclePrimitive, PathPrimitive, Primitive, RectPrimitive, Scene, TextPrimitive,
};

/// Sink for resolved primitives. Calls arrive as `begin`, primitives in paint order, `finish`.
pub trait DrawingBackend {
    fn begin(&mut self, width: f64, height: f64);
    fn rect(&mut self, rect: &RectPrimitive);
    fn circle(&mut self, circle: &CirclePrimitive);
    fn text(&mut self, text: &TextPrimitive);
    fn path(&mut self, path: &PathPrimitive);
    fn finish(&mut self);
}

impl Scene {
    /// Replays the scene into `backend`.
    pub fn emit(&self, backend: &mut dyn DrawingBackend) {
        backend.begin(self.width, self.height);
        for primitive in &self.primitives {
            match primitive {
                Primitive::Rect(r) => backend.rect(r),
                Primitive::Circle(c) => backend.circle(c),
                Primitive::Text(t) => backend.text(t),
                Primitive::Path(p) => backend.path(p),
            }
        }
        backend.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{BezPath, point, rect};
    use crate::model::TextAnchor;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl DrawingBackend for Recorder {
        fn begin(&mut self, width: f64, height: f64) {
            self.0.push(format!("begin {width}x{height}"));
        }
        fn rect(&mut self, _: &RectPrimitive) {
            self.0.push("rect".into());
        }
        fn circle(&mut self, _: &CirclePrimitive) {
            self.0.push("circle".into());
        }
        fn text(&mut self, text: &TextPrimitive) {
            self.0.push(format!("text {}", text.content));
        }
        fn path(&mut self, _: &PathPrimitive) {
            self.0.push("path".into());
        }
        fn finish(&mut self) {
            self.0.push("finish".into());
        }
    }

    #[test]
    fn emit_replays_primitives_in_order() {
        let mut scene = Scene::new(40.0, 30.0);
        scene.push(Primitive::Path(PathPrimitive {
            path: BezPath::line(point(0.0, 0.0), point(1.0, 1.0)),
            closed: false,
            fill: None,
            stroke: Some("#000".into()),
            stroke_width: 1.0,
        }));
        scene.push(Primitive::Rect(RectPrimitive {
            bounds: rect(0.0, 0.0, 5.0, 5.0),
            fill: None,
            stroke: None,
            stroke_width: 1.0,
        }));
        scene.push(Primitive::Text(TextPrimitive {
            position: point(1.0, 1.0),
            content: "hi".into(),
            fill: "#000".into(),
            font_family: "Courier New".into(),
            font_size: 10.0,
            font_weight: None,
            anchor: TextAnchor::Start,
        }));

        let mut recorder = Recorder::default();
        scene.emit(&mut recorder);
        assert_eq!(
            recorder.0,
            vec!["begin 40x30", "path", "rect", "text hi", "finish"]
        );
    }
}

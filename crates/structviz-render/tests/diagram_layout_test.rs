use structviz_render::connection::RouteKind;
use structviz_render::element::Element;
use structviz_render::model::Primitive;
use structviz_render::{Layout, LayoutOptions, build_scene, layout_document};
use std::path::PathBuf;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn layout_fixture(name: &str) -> structviz_render::scene::DiagramLayout {
    let path = workspace_root().join("fixtures").join("diagram").join(name);
    let text = std::fs::read_to_string(&path).expect("fixture");
    let doc = structviz_core::parse_document(&text).expect("parse ok");
    let Layout::Diagram(layout) = layout_document(&doc, &LayoutOptions::default()).expect("layout ok")
    else {
        panic!("expected a diagram layout");
    };
    layout
}

#[test]
fn two_cells_connector_is_trimmed_and_arrowed() {
    let layout = layout_fixture("two_cells.json");
    assert_eq!((layout.width, layout.height), (120.0, 200.0));

    let conn = layout.connection_at(2).expect("connection");
    assert_eq!(conn.kind, RouteKind::Direct);
    let full = conn.route.full.total_length();
    assert!((full - 80.0).abs() < 1e-9);

    let arrow = conn.route.arrow.as_ref().expect("arrow");
    assert!((arrow.tip().y - 130.0).abs() < 1e-6);
    assert!((arrow.base.y - 110.0).abs() < 1e-6);
    let half_width = (arrow.corners[1] - arrow.corners[2]).length() / 2.0;
    assert!((half_width - 5.0).abs() < 1e-9);

    let path = &conn.route.path;
    assert!((path.start().y - 70.0).abs() < 1e-6);
    assert!((path.end().y - 110.0).abs() < 1e-6);
    assert!(path.is_straight());
}

#[test]
fn linked_list_resolves_ids_positions_and_after_text() {
    let layout = layout_fixture("linked_list.json");
    assert_eq!(layout.elements.len(), 6);
    assert_eq!(layout.connections.len(), 2);

    let Element::Text(title) = &layout.elements[0] else {
        panic!("expected title text");
    };
    let Element::Text(suffix) = &layout.elements[1] else {
        panic!("expected suffix text");
    };
    assert_eq!(suffix.origin.y, title.origin.y);
    assert_eq!(suffix.origin.x, title.bounds.max_x());
    assert_eq!(suffix.font_size, 16.0);

    let looped = layout.connection_at(4).expect("first connection");
    assert_eq!(looped.kind, RouteKind::Smoothed);
    assert_eq!(looped.color, "#00f");
    assert_eq!(looped.route.full.vertices()[1].y, 140.0);

    let side = layout.connection_at(5).expect("second connection");
    assert_eq!(side.kind, RouteKind::Direct);
    assert!(side.route.arrow.is_none());
    assert!((side.route.margin - 6.0).abs() < 1e-12);
}

#[test]
fn unresolved_reference_names_the_missing_element() {
    let text = r#"{ "elements": [
        { "type": "Container", "x": 0, "y": 0, "width": 10, "height": 10, "cells": [{}] },
        { "type": "Connection", "from": 0, "to": 7 }
    ] }"#;
    let doc = structviz_core::parse_document(text).expect("parse ok");
    let err = layout_document(&doc, &LayoutOptions::default()).unwrap_err();
    let structviz_render::Error::UnresolvedReference { reference, .. } = &err else {
        panic!("expected an unresolved reference, got {err:?}");
    };
    assert_eq!(reference, "#7");
}

#[test]
fn strict_geometry_rejects_oversized_margins() {
    let text = r#"{ "elements": [
        { "type": "Container", "x": 0, "y": 0, "width": 10, "height": 10, "cells": [{}] },
        { "type": "Container", "x": 0, "y": 20, "width": 10, "height": 10, "cells": [{}] },
        { "type": "Connection", "from": 0, "to": 1, "margin": 8 }
    ] }"#;
    let doc = structviz_core::parse_document(text).expect("parse ok");

    let lenient = layout_document(&doc, &LayoutOptions::default()).expect("clamped");
    let Layout::Diagram(lenient) = lenient else {
        panic!("expected a diagram layout");
    };
    assert!((lenient.connections[0].route.margin - 5.0).abs() < 1e-9);

    let strict = LayoutOptions::default()
        .with_config_overrides(&serde_json::json!({ "geometry": { "strict": true } }));
    let err = layout_document(&doc, &strict).unwrap_err();
    assert!(matches!(
        err,
        structviz_render::Error::DegenerateGeometry { .. }
    ));
}

#[test]
fn closely_spaced_cells_keep_their_connector_without_an_arrowhead() {
    let text = r#"{ "elements": [
        { "type": "Container", "x": 0, "y": 0, "width": 10, "height": 10, "cells": [{}] },
        { "type": "Container", "x": 0, "y": 20, "width": 10, "height": 10, "cells": [{}] },
        { "type": "Connection", "from": 0, "to": 1, "arrow": true }
    ] }"#;
    let scene = build_scene(text, &LayoutOptions::default()).expect("lenient rebuild succeeds");
    let paths = scene
        .primitives
        .iter()
        .filter(|p| matches!(p, Primitive::Path(_)))
        .count();
    assert_eq!(paths, 1);

    let strict = LayoutOptions::default()
        .with_config_overrides(&serde_json::json!({ "geometry": { "strict": true } }));
    assert!(matches!(
        build_scene(text, &strict),
        Err(structviz_render::Error::DegenerateGeometry { .. })
    ));
}

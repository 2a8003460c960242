//! End-to-end engine flows against the in-memory surface host.

use restyle_core::style::STYLE_ELEMENT_ID;
use restyle_core::surface::{MemorySurface, Snapshot, SnapshotNode, SnapshotRule};
use restyle_core::{Engine, EngineConfig, SyncPhase};
use restyle_protocol::{DeviceProfile, Point, Rgb, SurfaceHandle, SurfaceRole};
use std::collections::BTreeMap;

const URL: &str = "https://example.com/landing";

fn page_snapshot() -> Snapshot {
    let heading = SnapshotNode::new("h1")
        .with_computed("color", "rgb(17, 17, 17)")
        .with_computed("font-size", "40px")
        .with_computed("font-family", "Inter, sans-serif");
    let body_text = SnapshotNode::new("p")
        .with_computed("color", "rgb(17, 17, 17)")
        .with_computed("font-size", "16px")
        .with_computed("font-family", "Inter, sans-serif");
    let accent = SnapshotNode::new("button")
        .with_computed("color", "rgb(255, 255, 255)")
        .with_computed("background-color", "rgb(255, 0, 0)")
        .with_computed("font-size", "14px");
    Snapshot {
        url: Some(URL.into()),
        root: SnapshotNode::new("html").with_child(
            SnapshotNode::new("body")
                .with_computed("color", "rgb(17, 17, 17)")
                .with_computed("background-color", "rgb(255, 255, 255)")
                .with_child(heading)
                .with_child(body_text)
                .with_child(accent)
                .with_child(SnapshotNode::new("img").with_attribute("src", "img/hero.png")),
        ),
        rules: vec![SnapshotRule {
            selector: "button".into(),
            properties: BTreeMap::from([("background-color".to_owned(), "#ff0000".to_owned())]),
        }],
    }
}

fn engine_with_pair() -> Engine<MemorySurface> {
    let mut engine = Engine::new(EngineConfig {
        proxy_base: "https://proxy.test".into(),
        ..EngineConfig::default()
    });
    engine.add_surface(
        MemorySurface::new(page_snapshot()),
        SurfaceRole::Modified,
        DeviceProfile::desktop(),
    );
    engine.add_surface(
        MemorySurface::new(page_snapshot()),
        SurfaceRole::Original,
        DeviceProfile::desktop(),
    );
    engine.load_page("<html>...</html>", URL);
    engine
}

#[test]
fn device_switch_reinjects_without_a_second_content_write() {
    let mut engine = engine_with_pair();
    engine.set_custom_css("body { margin: 0; }");
    assert_eq!(engine.surface(0).map(|s| s.content_writes), Some(1));

    engine.select_device(0, DeviceProfile::mobile()).expect("switch");
    engine.select_device(0, DeviceProfile::tablet()).expect("switch");

    let surface = engine.surface(0).expect("surface");
    assert_eq!(surface.content_writes, 1);
    assert_eq!(surface.style_element_count(STYLE_ELEMENT_ID), 1);
}

#[test]
fn original_surface_loads_its_reference_copy_unstyled() {
    let mut engine = engine_with_pair();
    engine.set_custom_css("body { margin: 0; }");

    let original = engine.surface(1).expect("surface");
    assert_eq!(original.content_writes, 0);
    assert_eq!(original.navigated_to.as_deref(), Some(URL));
    assert_eq!(original.style_element_count(STYLE_ELEMENT_ID), 0);
}

#[test]
fn injection_stays_single_across_many_source_changes() {
    let mut engine = engine_with_pair();
    for i in 0..4 {
        engine.set_custom_css(format!(".v{i} {{ color: red; }}"));
        engine.set_active_effects(vec!["grayscale".into()]);
    }
    let surface = engine.surface(0).expect("surface");
    assert_eq!(surface.style_element_count(STYLE_ELEMENT_ID), 1);
    let css = surface.style_element(STYLE_ELEMENT_ID).expect("css");
    assert!(css.contains(".v3"));
    assert!(!css.contains(".v2"));
}

#[test]
fn extract_remap_reset_restores_the_extracted_palette() {
    let mut engine = engine_with_pair();
    let before = engine.extract_now(0).expect("extract");
    let palette = before.palette();
    assert!(palette.contains(&Rgb::new(17, 17, 17)));

    let targets = [Rgb::new(0x10, 0x20, 0x30), Rgb::new(0xf0, 0xe0, 0xd0)];
    engine.apply_mapping(&palette, &targets);
    let after_remap = engine.extract_now(0).expect("extract");
    assert_ne!(after_remap.palette(), palette);

    engine.reset_mapping();
    let after_reset = engine.extract_now(0).expect("extract");
    assert_eq!(after_reset.palette(), palette);
    assert!(engine.mapping().is_empty());
}

#[test]
fn reapplying_the_same_mapping_is_visually_stable() {
    let mut engine = engine_with_pair();
    let palette = engine.extract_now(0).expect("extract").palette();
    let targets = [Rgb::new(0x11, 0x22, 0x33), Rgb::new(0xaa, 0xbb, 0xcc)];

    engine.apply_mapping(&palette, &targets);
    let first = engine.extract_now(0).expect("extract");
    engine.apply_mapping(&palette, &targets);
    let second = engine.extract_now(0).expect("extract");

    assert_eq!(first, second);
}

#[test]
fn remap_layer_survives_unrelated_reinjection() {
    let mut engine = engine_with_pair();
    engine.apply_mapping(&[Rgb::new(255, 0, 0)], &[Rgb::new(0, 0, 255)]);
    let css_before = engine
        .surface(0)
        .and_then(|s| s.style_element(STYLE_ELEMENT_ID))
        .map(str::to_owned);
    assert!(css_before.as_deref().is_some_and(|c| c.contains("#0000ff")));

    engine.set_custom_css(".x { top: 0; }");
    let surface = engine.surface(0).expect("surface");
    let css = surface.style_element(STYLE_ELEMENT_ID).expect("css");
    assert!(css.contains("#0000ff"));
    assert!(css.contains(".x"));
}

#[test]
fn comparison_scroll_converges_in_one_frame_without_round_trip() {
    let mut engine = engine_with_pair();
    engine.toggle_comparison(true);
    assert_eq!(engine.sync_phase(0), Some(SyncPhase::Attached));

    engine
        .surface_mut(0)
        .expect("surface")
        .set_scroll_offset(Point::new(0.0, 640.0));
    engine.notify_scroll(0);
    engine.tick_frame();

    let mirrored = engine.surface(1).expect("surface").scroll_offset();
    assert_eq!(mirrored, Point::new(0.0, 640.0));

    // The echo of the mirrored write must not start a reverse round trip.
    engine.notify_scroll(1);
    engine.tick_frame();
    assert_eq!(
        engine.surface(0).expect("surface").scroll_offset(),
        Point::new(0.0, 640.0)
    );
    assert_eq!(
        engine.surface(1).expect("surface").scroll_offset(),
        Point::new(0.0, 640.0)
    );
}

#[test]
fn sync_disabled_leaves_the_counterpart_alone() {
    let mut engine = engine_with_pair();
    engine.toggle_comparison(true);
    engine.set_sync_enabled(false);

    engine
        .surface_mut(0)
        .expect("surface")
        .set_scroll_offset(Point::new(0.0, 200.0));
    engine.notify_scroll(0);
    engine.tick_frame();
    assert_eq!(
        engine.surface(1).expect("surface").scroll_offset(),
        Point::default()
    );
}

#[test]
fn url_change_tears_down_and_reloads_every_surface() {
    let mut engine = engine_with_pair();
    engine.toggle_comparison(true);
    assert_eq!(engine.surface(0).map(|s| s.content_writes), Some(1));

    engine.load_page("<html>next</html>", "https://other.example/");
    let surface = engine.surface(0).expect("surface");
    assert_eq!(surface.content_writes, 2);
    // Comparison re-attached against the reloaded pair.
    assert_eq!(engine.sync_phase(0), Some(SyncPhase::Attached));
}

#[test]
fn split_ratio_saturates() {
    let mut engine = engine_with_pair();
    engine.toggle_comparison(true);
    engine.set_split(240.0);
    assert_eq!(engine.session().split_ratio(), 100.0);
    engine.set_split(-3.0);
    assert_eq!(engine.session().split_ratio(), 0.0);
}

#[test]
fn deferred_extraction_runs_on_the_timer() {
    let mut engine = engine_with_pair();
    engine.request_extract(0).expect("request");
    assert!(engine.report().is_none());

    engine.advance(EngineConfig::default().extract_delay_ms);
    let report = engine.report().expect("report");
    assert!(report.colors.iter().any(|c| c.color == Rgb::new(255, 0, 0)));
}

#[test]
fn staggered_repairs_fix_relative_references() {
    let mut engine = engine_with_pair();
    engine.advance(2_000);

    let surface = engine.surface(0).expect("surface");
    let img = surface.query_all("img")[0];
    assert_eq!(
        surface.attribute(img, "src").as_deref(),
        Some("https://proxy.test/api/proxy-path/https://example.com/img/hero.png")
    );
}

#[test]
fn fallback_palette_keeps_the_remap_flow_alive() {
    let mut engine = engine_with_pair();
    let applied = engine.apply_mapping(&[Rgb::new(255, 0, 0)], &[]);
    assert_eq!(applied, 1);
    assert_eq!(engine.mapping().len(), 1);
}

use std::sync::Arc;
use std::time::Duration;

use guidepost_config::HighlightConfig;
use guidepost_protocols::testing::{RecordingSurface, SurfaceCall};
use guidepost_protocols::{BoundingBox, Layer, OverlayError, Point, Scene, Shape, Size};

use super::*;
use crate::clock::TickerClock;

fn setup(config: HighlightConfig) -> (HighlightRenderer, Arc<RecordingSurface>) {
    let surface = Arc::new(RecordingSurface::new(
        Layer::Highlight,
        Size::new(1024.0, 768.0),
    ));
    let highlight =
        HighlightRenderer::new(surface.clone(), Arc::new(TickerClock::sixty_hz()), config);
    (highlight, surface)
}

fn outline(scene: &Scene) -> (Vec<Point>, bool, f64) {
    match scene.shapes.first() {
        Some(Shape::Polyline {
            points,
            closed,
            stroke,
            ..
        }) => (points.clone(), *closed, stroke.a),
        other => panic!("expected outline, got {:?}", other),
    }
}

fn label(scene: &Scene) -> Option<(BoundingBox, String)> {
    scene.iter().find_map(|s| match s {
        Shape::Label { rect, text, .. } => Some((*rect, text.clone())),
        _ => None,
    })
}

#[test]
fn test_trace_perimeter_progress() {
    let b = BoundingBox::new(0.0, 0.0, 100.0, 50.0);
    assert_eq!(trace_perimeter(&b, 0.0), vec![Point::new(0.0, 0.0)]);

    // A quarter of 300 is 75: three quarters along the top edge.
    assert_eq!(
        trace_perimeter(&b, 0.25),
        vec![Point::new(0.0, 0.0), Point::new(75.0, 0.0)]
    );

    // Half is 150: top edge plus the full right edge.
    assert_eq!(
        trace_perimeter(&b, 0.5),
        vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 50.0)
        ]
    );

    assert_eq!(trace_perimeter(&b, 1.0).len(), 4);
}

#[test]
fn test_label_centered_below_box() {
    let config = HighlightConfig::default();
    let b = BoundingBox::new(400.0, 100.0, 200.0, 40.0);
    let rect = label_rect(&b, "Next", &config, Size::new(1024.0, 768.0));

    assert!((rect.center().x - 500.0).abs() < 1e-9);
    assert_eq!(rect.y, 148.0);
    // 4 glyphs * 12 * 0.6 + 16 padding.
    assert!((rect.width - 44.8).abs() < 1e-9);
}

#[test]
fn test_label_clamped_to_canvas() {
    let config = HighlightConfig::default();
    let canvas = Size::new(1024.0, 768.0);

    let left = label_rect(&BoundingBox::new(0.0, 10.0, 4.0, 4.0), "Click here", &config, canvas);
    assert_eq!(left.x, 0.0);

    let right = label_rect(&BoundingBox::new(1020.0, 10.0, 4.0, 4.0), "Click here", &config, canvas);
    assert!((right.right() - 1024.0).abs() < 1e-9);

    let bottom = label_rect(&BoundingBox::new(100.0, 750.0, 50.0, 18.0), "Go", &config, canvas);
    assert!((bottom.bottom() - 768.0).abs() < 1e-9);
}

#[test]
fn test_long_label_fitted_to_narrow_canvas() {
    let config = HighlightConfig::default();
    let canvas = Size::new(320.0, 480.0);
    let text = "Select the shipping option that matches the delivery window you chose earlier on";
    assert_eq!(text.chars().count(), 80);

    let fitted = fit_label(text, &config, canvas.width);
    assert!(fitted.ends_with('\u{2026}'));
    assert!(fitted.chars().count() < 80);

    for b in [
        BoundingBox::new(10.0, 10.0, 20.0, 20.0),
        BoundingBox::new(150.0, 10.0, 20.0, 20.0),
        BoundingBox::new(300.0, 10.0, 20.0, 20.0),
    ] {
        let rect = label_rect(&b, &fitted, &config, canvas);
        assert!(rect.x >= 0.0, "label left edge {} before canvas", rect.x);
        assert!(rect.right() <= canvas.width, "label right edge {} past canvas", rect.right());
    }

    // Even unfitted text never yields a rectangle wider than the canvas.
    let rect = label_rect(&BoundingBox::new(10.0, 10.0, 20.0, 20.0), text, &config, canvas);
    assert_eq!(rect.x, 0.0);
    assert_eq!(rect.width, canvas.width);
}

#[test]
fn test_label_height_capped_to_canvas() {
    let config = HighlightConfig::default();
    let canvas = Size::new(200.0, 20.0);
    let rect = label_rect(&BoundingBox::new(10.0, 5.0, 20.0, 10.0), "Go", &config, canvas);
    assert_eq!(rect.y, 0.0);
    assert!(rect.bottom() <= canvas.height);
}

#[test]
fn test_short_label_kept_verbatim() {
    let config = HighlightConfig::default();
    assert_eq!(fit_label("Next", &config, 1024.0), "Next");
    assert_eq!(fit_label("Next", &config, 10.0), "");
}

#[tokio::test(start_paused = true)]
async fn test_drawn_label_stays_on_narrow_surface() {
    let surface = Arc::new(RecordingSurface::new(Layer::Highlight, Size::new(320.0, 480.0)));
    let highlight = HighlightRenderer::new(
        surface.clone(),
        Arc::new(TickerClock::sixty_hz()),
        HighlightConfig::default(),
    );
    let text = "x".repeat(80);
    highlight.show(BoundingBox::new(40.0, 20.0, 30.0, 10.0), &text).unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let (rect, drawn) = label(&surface.last_scene().unwrap()).unwrap();
    assert!(drawn.ends_with('\u{2026}'));
    assert!(rect.x >= 0.0 && rect.right() <= 320.0);
}

#[test]
fn test_pulse_opacity_range() {
    let config = HighlightConfig::default();
    assert_eq!(pulse_opacity(Duration::ZERO, &config), 1.0);
    let half = config.pulse_period() / 2;
    assert!((pulse_opacity(half, &config) - 0.6).abs() < 1e-9);
    for ms in (0..3000).step_by(37) {
        let o = pulse_opacity(Duration::from_millis(ms), &config);
        assert!((0.6..=1.0).contains(&o));
    }
}

#[tokio::test(start_paused = true)]
async fn test_show_traces_then_pulses() {
    let (highlight, surface) = setup(HighlightConfig::default());
    let b = BoundingBox::new(100.0, 200.0, 50.0, 20.0);
    highlight.show(b, "Press here").unwrap();
    assert_eq!(
        highlight.state(),
        HighlightState {
            bounding_box: Some(b),
            visible: true
        }
    );

    tokio::time::sleep(Duration::from_millis(500)).await;
    let (points, closed, _) = outline(&surface.last_scene().unwrap());
    assert!(!closed);
    assert!(points.len() < 5);
    assert!(label(&surface.last_scene().unwrap()).is_none());

    tokio::time::sleep(Duration::from_millis(1200)).await;
    let scene = surface.last_scene().unwrap();
    let (_, closed, alpha) = outline(&scene);
    assert!(closed);
    assert!(alpha < 1.0 && alpha >= 0.6);
    assert_eq!(label(&scene).unwrap().1, "Press here");
}

#[tokio::test(start_paused = true)]
async fn test_invalid_box_draws_nothing() {
    let (highlight, surface) = setup(HighlightConfig::default());
    highlight
        .show(BoundingBox::new(-5.0, 10.0, 50.0, 20.0), "")
        .unwrap();
    highlight.show(BoundingBox::new(5.0, 10.0, 0.0, 20.0), "").unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(surface.calls().is_empty());
    assert!(!highlight.state().visible);
    assert!(!highlight.is_animating());
}

#[tokio::test(start_paused = true)]
async fn test_empty_label_not_drawn() {
    let (highlight, surface) = setup(HighlightConfig::default());
    highlight.show(BoundingBox::new(1.0, 1.0, 10.0, 10.0), "").unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert!(label(&surface.last_scene().unwrap()).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_hide_stops_pulse_and_clears() {
    let (highlight, surface) = setup(HighlightConfig::default());
    highlight.show(BoundingBox::new(1.0, 1.0, 10.0, 10.0), "x").unwrap();
    tokio::time::sleep(Duration::from_millis(1200)).await;

    highlight.hide().unwrap();
    assert_eq!(surface.calls().last(), Some(&SurfaceCall::Clear));
    assert!(!highlight.state().visible);
    assert!(!highlight.is_animating());

    let count = surface.calls().len();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(surface.calls().len(), count);
}

#[tokio::test(start_paused = true)]
async fn test_static_outline_when_pulse_disabled() {
    let config = HighlightConfig {
        pulse: false,
        ..HighlightConfig::default()
    };
    let (highlight, surface) = setup(config);
    highlight.show(BoundingBox::new(1.0, 1.0, 10.0, 10.0), "").unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let count = surface.draw_count();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(surface.draw_count(), count);
    let (_, closed, alpha) = outline(&surface.last_scene().unwrap());
    assert!(closed);
    assert_eq!(alpha, 1.0);
    assert!(!highlight.is_animating());
    assert!(highlight.state().visible);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_idempotent() {
    let (highlight, surface) = setup(HighlightConfig::default());
    highlight.show(BoundingBox::new(1.0, 1.0, 10.0, 10.0), "").unwrap();
    highlight.destroy();
    highlight.destroy();
    assert_eq!(surface.release_count(), 1);
    assert_eq!(
        highlight.show(BoundingBox::new(1.0, 1.0, 10.0, 10.0), ""),
        Err(OverlayError::Destroyed)
    );
    assert_eq!(highlight.hide(), Err(OverlayError::Destroyed));
    drop(highlight);
    assert_eq!(surface.release_count(), 1);
}

//! Tests for the floating positioning helper.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use lattice_aria::dom::{MemoryDocument, NodeId};
use lattice_aria::floating::{Cleanup, Floating, FloatingOptions, UpdateFn};
use lattice_aria::geometry::Rect;
use lattice_aria::position::{
    ComputedPosition, Middleware, Placement, PositionCallback, PositionConfig, Positioner, Strategy,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Reference 100x40 at (100, 100), floating 100x80.
fn layout() -> (Arc<MemoryDocument>, NodeId, NodeId) {
    init_tracing();
    let doc = Arc::new(MemoryDocument::new());
    let reference = doc.create_element("button");
    let floating = doc.create_element("div");
    doc.set_rect(reference, Rect::new(100.0, 100.0, 100.0, 40.0));
    doc.set_rect(floating, Rect::new(0.0, 0.0, 100.0, 80.0));
    (doc, reference, floating)
}

fn position_with(options: FloatingOptions) -> (f32, f32, Placement) {
    let (doc, reference, floating) = layout();
    doc.set_viewport(Rect::new(0.0, 0.0, 400.0, 300.0));
    let helper = Floating::new(doc, options);
    let _reference = helper.reference(reference);
    let _floating = helper.floating(floating);
    let data = helper.data().get();
    assert!(data.is_positioned);
    (data.x, data.y, data.placement)
}

#[derive(Default)]
struct DeferredPositioner {
    pending: Mutex<Vec<PositionCallback>>,
}

impl DeferredPositioner {
    fn settle(&self, x: f32, y: f32) {
        let pending = std::mem::take(&mut *self.pending.lock());
        for done in pending {
            done(ComputedPosition {
                x,
                y,
                placement: Placement::Bottom,
                strategy: Strategy::Absolute,
            });
        }
    }
}

impl Positioner for DeferredPositioner {
    fn compute_position(
        &self,
        _reference: NodeId,
        _floating: NodeId,
        _config: &PositionConfig,
        done: PositionCallback,
    ) {
        self.pending.lock().push(done);
    }
}

#[test]
fn test_placements() {
    assert_eq!(
        position_with(FloatingOptions::default()),
        (100.0, 140.0, Placement::Bottom)
    );
    assert_eq!(
        position_with(FloatingOptions::default().with_placement(Placement::BottomEnd)),
        (100.0, 140.0, Placement::BottomEnd)
    );
    assert_eq!(
        position_with(FloatingOptions::default().with_placement(Placement::RightStart)),
        (200.0, 100.0, Placement::RightStart)
    );
    assert_eq!(
        position_with(
            FloatingOptions::default()
                .with_placement(Placement::TopStart)
                .with_middleware(Middleware::Offset(10.0))
        ),
        (100.0, 10.0, Placement::TopStart)
    );
}

#[test]
fn test_flip_and_shift() {
    let (x, y, placement) = position_with(
        FloatingOptions::default()
            .with_placement(Placement::Top)
            .with_middleware(Middleware::Offset(30.0))
            .with_middleware(Middleware::Flip),
    );
    assert_eq!((x, y, placement), (100.0, 170.0, Placement::Bottom));

    let (x, _, _) = position_with(
        FloatingOptions::default()
            .with_placement(Placement::RightStart)
            .with_middleware(Middleware::Shift { padding: 0.0 }),
    );
    assert_eq!(x, 200.0);

    let (doc, reference, floating) = layout();
    doc.set_viewport(Rect::new(0.0, 0.0, 180.0, 300.0));
    let helper = Floating::new(
        doc,
        FloatingOptions::default()
            .with_placement(Placement::BottomStart)
            .with_middleware(Middleware::Shift { padding: 4.0 }),
    );
    let _reference = helper.reference(reference);
    let _floating = helper.floating(floating);
    assert_eq!(helper.data().get().x, 76.0);
}

#[test]
fn test_styles_with_transform() {
    let (doc, reference, floating) = layout();
    doc.set_rect(reference, Rect::new(10.3, 20.0, 100.0, 40.0));
    let helper = Floating::new(doc.clone(), FloatingOptions::default().with_placement(Placement::BottomStart));
    assert_eq!(helper.styles().get(), "position:absolute;left:0;top:0;");

    let _reference = helper.reference(reference);
    let _floating = helper.floating(floating);
    assert_eq!(
        helper.styles().get(),
        "position:absolute;left:0;top:0;transform:translate(10px, 60px);"
    );
}

#[test]
fn test_styles_round_by_device_pixels() {
    let (doc, reference, floating) = layout();
    doc.set_rect(reference, Rect::new(10.3, 20.0, 100.0, 40.0));
    doc.set_device_pixel_ratio(2.0);
    let helper = Floating::new(doc.clone(), FloatingOptions::default().with_placement(Placement::BottomStart));
    let _reference = helper.reference(reference);
    let _floating = helper.floating(floating);
    assert_eq!(
        helper.styles().get(),
        "position:absolute;left:0;top:0;transform:translate(10.5px, 60px);will-change:transform;"
    );
}

#[test]
fn test_styles_without_transform() {
    let (doc, reference, floating) = layout();
    let helper = Floating::new(
        doc,
        FloatingOptions::default()
            .with_transform(false)
            .with_strategy(Strategy::Fixed)
            .with_placement(Placement::BottomStart),
    );
    let _reference = helper.reference(reference);
    let _floating = helper.floating(floating);
    assert_eq!(helper.styles().get(), "position:fixed;left:100px;top:140px;");
}

#[test]
fn test_result_after_floating_detached_is_dropped() {
    let (doc, reference, floating) = layout();
    let positioner = Arc::new(DeferredPositioner::default());
    let helper = Floating::new(doc, FloatingOptions::default().with_positioner(positioner.clone()));
    let _reference = helper.reference(reference);
    let floating_attachment = helper.floating(floating);

    floating_attachment.detach();
    positioner.settle(1.0, 2.0);
    assert!(!helper.data().get().is_positioned);

    let _floating = helper.floating(floating);
    positioner.settle(3.0, 4.0);
    let data = helper.data().get();
    assert!(data.is_positioned);
    assert_eq!((data.x, data.y), (3.0, 4.0));
}

#[test]
fn test_while_elements_mounted_and_cleanup() {
    let (doc, reference, floating) = layout();
    let mounted = Arc::new(AtomicUsize::new(0));
    let cleaned = Arc::new(AtomicUsize::new(0));
    let update_handle: Arc<Mutex<Option<UpdateFn>>> = Arc::new(Mutex::new(None));

    let (mounted_clone, cleaned_clone, handle_clone) =
        (mounted.clone(), cleaned.clone(), update_handle.clone());
    let options = FloatingOptions::default().with_while_elements_mounted(
        move |_reference, _floating, update: UpdateFn| -> Cleanup {
            mounted_clone.fetch_add(1, Ordering::SeqCst);
            update();
            *handle_clone.lock() = Some(update);
            let cleaned = cleaned_clone.clone();
            Box::new(move || {
                cleaned.fetch_add(1, Ordering::SeqCst);
            })
        },
    );
    let helper = Floating::new(doc.clone(), options);
    let _reference = helper.reference(reference);
    let floating_attachment = helper.floating(floating);
    assert_eq!(mounted.load(Ordering::SeqCst), 1);
    assert_eq!(helper.data().get().y, 140.0);

    // The hook's update follows layout changes.
    doc.set_rect(reference, Rect::new(100.0, 200.0, 100.0, 40.0));
    let update = update_handle.lock().clone().unwrap();
    update();
    assert_eq!(helper.data().get().y, 240.0);

    floating_attachment.detach();
    assert_eq!(cleaned.load(Ordering::SeqCst), 1);
    update();
    assert_eq!(helper.data().get().y, 240.0);
}

#[test]
fn test_node_overrides() {
    let (doc, reference, floating) = layout();
    let elsewhere = doc.create_element("span");
    let helper = Floating::new(
        doc,
        FloatingOptions::default()
            .with_reference(reference)
            .with_placement(Placement::BottomStart),
    );
    let _reference = helper.reference(elsewhere);
    let _floating = helper.floating(floating);
    assert_eq!(helper.data().get().x, 100.0);
}

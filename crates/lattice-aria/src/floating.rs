//! Floating element positioning.
//!
//! [`Floating`] keeps a floating node (tooltip, popover, menu) next to a
//! reference node. Attach [`Floating::reference`] and [`Floating::floating`];
//! once both are present the position is computed through the configured
//! [`Positioner`] and published as [`FloatingData`] and as a ready-to-use
//! inline style string.
//!
//! Hosts that need to follow scrolling or resizing pass an auto-update hook
//! in [`FloatingOptions::while_elements_mounted`]: it receives both nodes
//! and an `update` function, and returns a cleanup that runs when the
//! floating node detaches.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use lattice_aria_core::Store;
use lattice_aria_core::logging::targets;

use crate::attachment::Attachment;
use crate::dom::{Document, NodeId};
use crate::position::{
    ComputedPosition, LayoutPositioner, Middleware, Placement, PositionConfig, Positioner, Strategy,
};

/// Recomputes the position.
pub type UpdateFn = Arc<dyn Fn() + Send + Sync>;

/// Undoes an auto-update hook.
pub type Cleanup = Box<dyn FnOnce() + Send>;

/// Hook run while both nodes are mounted: `(reference, floating, update)`.
pub type AutoUpdate = Arc<dyn Fn(NodeId, NodeId, UpdateFn) -> Cleanup + Send + Sync>;

/// Threshold above which styles hint the compositor with `will-change`.
const HIGH_DPR: f32 = 1.5;

/// Options for a [`Floating`] helper.
#[derive(Clone)]
pub struct FloatingOptions {
    pub placement: Placement,
    pub strategy: Strategy,
    pub middleware: Vec<Middleware>,
    /// Position with `transform: translate(..)` instead of `left`/`top`.
    pub transform: bool,
    /// Defaults to a [`LayoutPositioner`] over the helper's document.
    pub positioner: Option<Arc<dyn Positioner>>,
    pub while_elements_mounted: Option<AutoUpdate>,
    /// Use this node as the reference, whatever node the behavior is
    /// attached to.
    pub reference: Option<NodeId>,
    /// Use this node as the floating element, whatever node the behavior
    /// is attached to.
    pub floating: Option<NodeId>,
}

impl Default for FloatingOptions {
    fn default() -> Self {
        Self {
            placement: Placement::Bottom,
            strategy: Strategy::Absolute,
            middleware: Vec::new(),
            transform: true,
            positioner: None,
            while_elements_mounted: None,
            reference: None,
            floating: None,
        }
    }
}

impl FloatingOptions {
    /// Set the placement using builder pattern.
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Set the strategy using builder pattern.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Append a middleware using builder pattern.
    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Set `transform` using builder pattern.
    pub fn with_transform(mut self, transform: bool) -> Self {
        self.transform = transform;
        self
    }

    /// Set the positioner using builder pattern.
    pub fn with_positioner(mut self, positioner: Arc<dyn Positioner>) -> Self {
        self.positioner = Some(positioner);
        self
    }

    /// Set the auto-update hook using builder pattern.
    pub fn with_while_elements_mounted<F>(mut self, hook: F) -> Self
    where
        F: Fn(NodeId, NodeId, UpdateFn) -> Cleanup + Send + Sync + 'static,
    {
        self.while_elements_mounted = Some(Arc::new(hook));
        self
    }

    /// Override the reference node using builder pattern.
    pub fn with_reference(mut self, node: NodeId) -> Self {
        self.reference = Some(node);
        self
    }

    /// Override the floating node using builder pattern.
    pub fn with_floating(mut self, node: NodeId) -> Self {
        self.floating = Some(node);
        self
    }

    fn position_config(&self) -> PositionConfig {
        PositionConfig {
            placement: self.placement,
            strategy: self.strategy,
            middleware: self.middleware.clone(),
        }
    }
}

impl fmt::Debug for FloatingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloatingOptions")
            .field("placement", &self.placement)
            .field("strategy", &self.strategy)
            .field("middleware", &self.middleware)
            .field("transform", &self.transform)
            .field("positioner", &self.positioner.is_some())
            .field("while_elements_mounted", &self.while_elements_mounted.is_some())
            .field("reference", &self.reference)
            .field("floating", &self.floating)
            .finish()
    }
}

/// The last settled position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatingData {
    pub x: f32,
    pub y: f32,
    pub placement: Placement,
    pub strategy: Strategy,
    /// Whether a computation has settled since creation.
    pub is_positioned: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct FloatingNodes {
    reference: Option<NodeId>,
    floating: Option<NodeId>,
}

struct FloatingInner {
    document: Arc<dyn Document>,
    positioner: Arc<dyn Positioner>,
    options: FloatingOptions,
    data: Store<FloatingData>,
    styles: Store<String>,
    nodes: Mutex<FloatingNodes>,
    cleanup: Mutex<Option<Cleanup>>,
}

/// Positions a floating node relative to a reference node.
///
/// Cheap to clone: clones control the same pair of nodes.
#[derive(Clone)]
pub struct Floating {
    inner: Arc<FloatingInner>,
}

impl Floating {
    pub fn new(document: Arc<dyn Document>, options: FloatingOptions) -> Self {
        let positioner = options
            .positioner
            .clone()
            .unwrap_or_else(|| Arc::new(LayoutPositioner::new(document.clone())));
        let data = Store::new(FloatingData {
            x: 0.0,
            y: 0.0,
            placement: options.placement,
            strategy: options.strategy,
            is_positioned: false,
        });
        let styles = Store::new(format!(
            "position:{};left:0;top:0;",
            options.strategy.as_css()
        ));
        let nodes = FloatingNodes {
            reference: options.reference,
            floating: options.floating,
        };

        let inner = Arc::new(FloatingInner {
            document,
            positioner,
            options,
            data,
            styles,
            nodes: Mutex::new(nodes),
            cleanup: Mutex::new(None),
        });

        let weak = Arc::downgrade(&inner);
        inner.data.subscribe(move |data| {
            if let Some(inner) = weak.upgrade() {
                inner.apply_styles(data);
            }
        });

        Self { inner }
    }

    /// The last settled position.
    pub fn data(&self) -> Store<FloatingData> {
        self.inner.data.clone()
    }

    /// Inline CSS for the floating node.
    pub fn styles(&self) -> Store<String> {
        self.inner.styles.clone()
    }

    /// Recompute the position. No-op unless both nodes are present.
    pub fn update(&self) {
        self.inner.update();
    }

    /// Attach to the reference node.
    pub fn reference(&self, node: NodeId) -> Attachment {
        let node = self.inner.options.reference.unwrap_or(node);
        self.inner.nodes.lock().reference = Some(node);
        FloatingInner::call_update(&self.inner);

        let weak = Arc::downgrade(&self.inner);
        Attachment::new(self.inner.document.clone(), node).on_detach(move || {
            if let Some(inner) = weak.upgrade() {
                let mut nodes = inner.nodes.lock();
                if nodes.reference == Some(node) {
                    nodes.reference = None;
                }
            }
        })
    }

    /// Attach to the floating node.
    ///
    /// Detaching runs the auto-update cleanup.
    pub fn floating(&self, node: NodeId) -> Attachment {
        let node = self.inner.options.floating.unwrap_or(node);
        self.inner.nodes.lock().floating = Some(node);
        FloatingInner::call_update(&self.inner);

        let weak = Arc::downgrade(&self.inner);
        Attachment::new(self.inner.document.clone(), node).on_detach(move || {
            let Some(inner) = weak.upgrade() else { return };
            {
                let mut nodes = inner.nodes.lock();
                if nodes.floating == Some(node) {
                    nodes.floating = None;
                }
            }
            inner.run_cleanup();
        })
    }
}

impl FloatingInner {
    fn call_update(this: &Arc<Self>) {
        let nodes = *this.nodes.lock();
        let (Some(reference), Some(floating)) = (nodes.reference, nodes.floating) else {
            return;
        };
        this.run_cleanup();

        match &this.options.while_elements_mounted {
            Some(hook) => {
                let weak = Arc::downgrade(this);
                let update: UpdateFn = Arc::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.update();
                    }
                });
                let cleanup = hook(reference, floating, update);
                *this.cleanup.lock() = Some(cleanup);
            }
            None => this.update(),
        }
    }

    fn update(self: &Arc<Self>) {
        let nodes = *self.nodes.lock();
        let (Some(reference), Some(floating)) = (nodes.reference, nodes.floating) else {
            return;
        };

        let weak = Arc::downgrade(self);
        self.positioner.compute_position(
            reference,
            floating,
            &self.options.position_config(),
            Box::new(move |result: ComputedPosition| {
                let Some(inner) = weak.upgrade() else { return };
                if inner.nodes.lock().floating != Some(floating) {
                    tracing::debug!(target: targets::FLOATING, "position settled after floating node detached");
                    return;
                }
                inner.data.set(FloatingData {
                    x: result.x,
                    y: result.y,
                    placement: result.placement,
                    strategy: result.strategy,
                    is_positioned: true,
                });
            }),
        );
    }

    fn run_cleanup(&self) {
        let cleanup = self.cleanup.lock().take();
        if let Some(cleanup) = cleanup {
            tracing::trace!(target: targets::FLOATING, "auto-update cleanup");
            cleanup();
        }
    }

    fn apply_styles(&self, data: &FloatingData) {
        let Some(floating) = self.nodes.lock().floating else {
            return;
        };
        let dpr = self.document.device_pixel_ratio(floating);
        let x = round_by_dpr(data.x, dpr);
        let y = round_by_dpr(data.y, dpr);
        let position = data.strategy.as_css();

        let styles = if self.options.transform {
            let will_change = if dpr >= HIGH_DPR {
                "will-change:transform;"
            } else {
                ""
            };
            format!("position:{position};left:0;top:0;transform:translate({x}px, {y}px);{will_change}")
        } else {
            format!("position:{position};left:{x}px;top:{y}px;")
        };
        self.styles.set(styles);
    }
}

/// Round `value` to the nearest device pixel.
pub fn round_by_dpr(value: f32, dpr: f32) -> f32 {
    if dpr <= 0.0 {
        return value.round();
    }
    (value * dpr).round() / dpr
}

impl fmt::Debug for Floating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Floating")
            .field("options", &self.inner.options)
            .field("data", &self.inner.data.get())
            .field("nodes", &*self.inner.nodes.lock())
            .finish()
    }
}

static_assertions::assert_impl_all!(Floating: Send, Sync);

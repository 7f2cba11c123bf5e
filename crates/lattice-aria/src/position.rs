//! Positioning of floating elements relative to a reference element.
//!
//! [`compute_position`] is the pure geometry: given the reference box, the
//! floating element's size and a [`PositionConfig`], it returns where the
//! floating element goes. Behaviors never call it directly; they go through
//! a [`Positioner`], which may settle later than the request (hosts that
//! measure after layout). [`LayoutPositioner`] is the stock implementation
//! over a [`Document`]'s layout boxes.
//!
//! # Example
//!
//! ```
//! use lattice_aria::geometry::{Rect, Size};
//! use lattice_aria::position::{compute_position, Middleware, Placement, PositionConfig};
//!
//! let config = PositionConfig::new(Placement::BottomStart)
//!     .with_middleware(Middleware::Offset(8.0));
//! let input = Rect::new(10.0, 10.0, 200.0, 30.0);
//! let result = compute_position(input, Size::new(200.0, 100.0), &config, None);
//!
//! assert_eq!((result.x, result.y), (10.0, 48.0));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::dom::{Document, NodeId};
use crate::geometry::{Point, Rect, Size};
use lattice_aria_core::logging::targets;

// ============================================================================
// Placement
// ============================================================================

/// The side of the reference element the floating element is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// The side across the reference element.
    pub fn opposite(self) -> Self {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    fn is_vertical(self) -> bool {
        matches!(self, Side::Top | Side::Bottom)
    }
}

/// Alignment of the floating element along the reference edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    Start,
    Center,
    End,
}

/// Where to place the floating element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Placement {
    Top,
    TopStart,
    TopEnd,
    Right,
    RightStart,
    RightEnd,
    #[default]
    Bottom,
    BottomStart,
    BottomEnd,
    Left,
    LeftStart,
    LeftEnd,
}

impl Placement {
    /// Build a placement from its parts.
    pub fn from_parts(side: Side, alignment: Alignment) -> Self {
        use Alignment::*;
        match (side, alignment) {
            (Side::Top, Center) => Placement::Top,
            (Side::Top, Start) => Placement::TopStart,
            (Side::Top, End) => Placement::TopEnd,
            (Side::Right, Center) => Placement::Right,
            (Side::Right, Start) => Placement::RightStart,
            (Side::Right, End) => Placement::RightEnd,
            (Side::Bottom, Center) => Placement::Bottom,
            (Side::Bottom, Start) => Placement::BottomStart,
            (Side::Bottom, End) => Placement::BottomEnd,
            (Side::Left, Center) => Placement::Left,
            (Side::Left, Start) => Placement::LeftStart,
            (Side::Left, End) => Placement::LeftEnd,
        }
    }

    pub fn side(self) -> Side {
        match self {
            Placement::Top | Placement::TopStart | Placement::TopEnd => Side::Top,
            Placement::Right | Placement::RightStart | Placement::RightEnd => Side::Right,
            Placement::Bottom | Placement::BottomStart | Placement::BottomEnd => Side::Bottom,
            Placement::Left | Placement::LeftStart | Placement::LeftEnd => Side::Left,
        }
    }

    pub fn alignment(self) -> Alignment {
        match self {
            Placement::TopStart
            | Placement::RightStart
            | Placement::BottomStart
            | Placement::LeftStart => Alignment::Start,
            Placement::TopEnd | Placement::RightEnd | Placement::BottomEnd | Placement::LeftEnd => {
                Alignment::End
            }
            _ => Alignment::Center,
        }
    }

    /// The same alignment on the opposite side.
    pub fn flipped(self) -> Self {
        Self::from_parts(self.side().opposite(), self.alignment())
    }

    /// Position of a floating element of `size` next to `reference`, before
    /// any middleware.
    fn initial_position(self, reference: Rect, size: Size) -> Point {
        let center = reference.center();
        let mut pos = match self.side() {
            Side::Top => Point::new(center.x - size.width / 2.0, reference.top() - size.height),
            Side::Bottom => Point::new(center.x - size.width / 2.0, reference.bottom()),
            Side::Left => Point::new(reference.left() - size.width, center.y - size.height / 2.0),
            Side::Right => Point::new(reference.right(), center.y - size.height / 2.0),
        };

        match (self.side().is_vertical(), self.alignment()) {
            (true, Alignment::Start) => pos.x = reference.left(),
            (true, Alignment::End) => pos.x = reference.right() - size.width,
            (false, Alignment::Start) => pos.y = reference.top(),
            (false, Alignment::End) => pos.y = reference.bottom() - size.height,
            (_, Alignment::Center) => {}
        }
        pos
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side() {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        };
        match self.alignment() {
            Alignment::Center => f.write_str(side),
            Alignment::Start => write!(f, "{side}-start"),
            Alignment::End => write!(f, "{side}-end"),
        }
    }
}

/// CSS positioning strategy of the floating element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// Coordinates relative to the document.
    #[default]
    Absolute,
    /// Coordinates relative to the viewport.
    Fixed,
}

impl Strategy {
    /// The CSS `position` value.
    pub fn as_css(self) -> &'static str {
        match self {
            Strategy::Absolute => "absolute",
            Strategy::Fixed => "fixed",
        }
    }
}

/// Adjustments applied on top of the base placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Middleware {
    /// Move away from the reference along the placement side.
    Offset(f32),
    /// Move to the opposite side if that overflows the viewport less.
    Flip,
    /// Keep the floating element inside the viewport along the alignment axis.
    Shift {
        /// Minimum distance to the viewport edge.
        padding: f32,
    },
}

/// Configuration for a position computation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionConfig {
    pub placement: Placement,
    pub strategy: Strategy,
    pub middleware: Vec<Middleware>,
}

impl PositionConfig {
    /// Create a configuration with the given placement and no middleware.
    pub fn new(placement: Placement) -> Self {
        Self {
            placement,
            ..Self::default()
        }
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
}

/// The settled result of a position computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedPosition {
    pub x: f32,
    pub y: f32,
    /// Final placement, which differs from the requested one after a flip.
    pub placement: Placement,
    pub strategy: Strategy,
}

// ============================================================================
// Computation
// ============================================================================

/// Compute where the floating element goes.
///
/// Offsets are summed and applied along the placement side. Flip is
/// evaluated on the offset position; shift is applied last. Flip and shift
/// need a `viewport` and are skipped without one.
pub fn compute_position(
    reference: Rect,
    floating: Size,
    config: &PositionConfig,
    viewport: Option<Rect>,
) -> ComputedPosition {
    let offset: f32 = config
        .middleware
        .iter()
        .map(|m| match m {
            Middleware::Offset(value) => *value,
            _ => 0.0,
        })
        .sum();
    let wants_flip = config.middleware.contains(&Middleware::Flip);
    let shift_padding = config.middleware.iter().find_map(|m| match m {
        Middleware::Shift { padding } => Some(*padding),
        _ => None,
    });

    let mut placement = config.placement;
    let mut pos = offset_position(placement, reference, floating, offset);

    if let Some(bounds) = viewport {
        if wants_flip {
            let overflow = main_axis_overflow(placement.side(), pos, floating, bounds);
            if overflow > 0.0 {
                let flipped = placement.flipped();
                let flipped_pos = offset_position(flipped, reference, floating, offset);
                if main_axis_overflow(flipped.side(), flipped_pos, floating, bounds) < overflow {
                    tracing::trace!(target: targets::FLOATING, from = %placement, to = %flipped, "flipped");
                    placement = flipped;
                    pos = flipped_pos;
                }
            }
        }

        if let Some(padding) = shift_padding {
            if placement.side().is_vertical() {
                pos.x = clamp_axis(pos.x, floating.width, bounds.left(), bounds.right(), padding);
            } else {
                pos.y = clamp_axis(pos.y, floating.height, bounds.top(), bounds.bottom(), padding);
            }
        }
    }

    if config.strategy == Strategy::Fixed
        && let Some(bounds) = viewport
    {
        pos.x -= bounds.left();
        pos.y -= bounds.top();
    }

    ComputedPosition {
        x: pos.x,
        y: pos.y,
        placement,
        strategy: config.strategy,
    }
}

fn offset_position(placement: Placement, reference: Rect, floating: Size, offset: f32) -> Point {
    let mut pos = placement.initial_position(reference, floating);
    match placement.side() {
        Side::Top => pos.y -= offset,
        Side::Bottom => pos.y += offset,
        Side::Left => pos.x -= offset,
        Side::Right => pos.x += offset,
    }
    pos
}

/// How far the floating element sticks out of `bounds` on `side`.
fn main_axis_overflow(side: Side, pos: Point, size: Size, bounds: Rect) -> f32 {
    match side {
        Side::Top => bounds.top() - pos.y,
        Side::Bottom => pos.y + size.height - bounds.bottom(),
        Side::Left => bounds.left() - pos.x,
        Side::Right => pos.x + size.width - bounds.right(),
    }
}

fn clamp_axis(value: f32, extent: f32, min: f32, max: f32, padding: f32) -> f32 {
    let low = min + padding;
    let high = max - padding - extent;
    // Start edge wins when the element does not fit.
    value.min(high).max(low)
}

// ============================================================================
// Positioner
// ============================================================================

/// Callback receiving a settled computation.
pub type PositionCallback = Box<dyn FnOnce(ComputedPosition) + Send>;

/// Computes the position of a floating node relative to a reference node.
///
/// `done` runs once the computation settles, synchronously or later. It may
/// never run if the computation cannot settle (a node has no layout).
/// Callers must check that the nodes are still attached when it does.
pub trait Positioner: Send + Sync {
    fn compute_position(
        &self,
        reference: NodeId,
        floating: NodeId,
        config: &PositionConfig,
        done: PositionCallback,
    );
}

/// A [`Positioner`] reading layout boxes from a [`Document`].
///
/// Settles synchronously.
pub struct LayoutPositioner {
    document: Arc<dyn Document>,
}

impl LayoutPositioner {
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self { document }
    }
}

impl Positioner for LayoutPositioner {
    fn compute_position(
        &self,
        reference: NodeId,
        floating: NodeId,
        config: &PositionConfig,
        done: PositionCallback,
    ) {
        let (Some(reference_rect), Some(floating_rect)) = (
            self.document.bounding_rect(reference),
            self.document.bounding_rect(floating),
        ) else {
            tracing::trace!(target: targets::FLOATING, ?reference, ?floating, "no layout, position not settled");
            return;
        };
        done(compute_position(
            reference_rect,
            floating_rect.size,
            config,
            self.document.viewport(),
        ));
    }
}

impl fmt::Debug for LayoutPositioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutPositioner").finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(LayoutPositioner: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: Rect = Rect::new(100.0, 100.0, 200.0, 40.0);
    const LIST: Size = Size::new(100.0, 80.0);

    fn at(placement: Placement) -> (f32, f32) {
        let result = compute_position(INPUT, LIST, &PositionConfig::new(placement), None);
        (result.x, result.y)
    }

    #[test]
    fn test_base_placements() {
        assert_eq!(at(Placement::Bottom), (150.0, 140.0));
        assert_eq!(at(Placement::BottomStart), (100.0, 140.0));
        assert_eq!(at(Placement::BottomEnd), (200.0, 140.0));
        assert_eq!(at(Placement::Top), (150.0, 20.0));
        assert_eq!(at(Placement::RightStart), (300.0, 100.0));
        assert_eq!(at(Placement::LeftEnd), (0.0, 60.0));
        assert_eq!(at(Placement::Left), (0.0, 80.0));
    }

    #[test]
    fn test_offsets_accumulate_along_side() {
        let config = PositionConfig::new(Placement::Top)
            .with_middleware(Middleware::Offset(4.0))
            .with_middleware(Middleware::Offset(4.0));
        let result = compute_position(INPUT, LIST, &config, None);
        assert_eq!(result.y, 12.0);
    }

    #[test]
    fn test_flip_to_opposite_side() {
        let viewport = Rect::new(0.0, 0.0, 800.0, 200.0);
        let config = PositionConfig::new(Placement::BottomStart)
            .with_middleware(Middleware::Offset(8.0))
            .with_middleware(Middleware::Flip);
        let result = compute_position(INPUT, LIST, &config, Some(viewport));

        assert_eq!(result.placement, Placement::TopStart);
        assert_eq!((result.x, result.y), (100.0, 12.0));
    }

    #[test]
    fn test_flip_kept_when_opposite_is_worse() {
        let viewport = Rect::new(0.0, 50.0, 800.0, 160.0);
        let config = PositionConfig::new(Placement::Bottom).with_middleware(Middleware::Flip);
        let result = compute_position(INPUT, LIST, &config, Some(viewport));
        assert_eq!(result.placement, Placement::Bottom);
    }

    #[test]
    fn test_shift_clamps_cross_axis() {
        let viewport = Rect::new(0.0, 0.0, 250.0, 600.0);
        let config =
            PositionConfig::new(Placement::BottomEnd).with_middleware(Middleware::Shift { padding: 5.0 });
        let result = compute_position(INPUT, LIST, &config, Some(viewport));
        assert_eq!((result.x, result.y), (145.0, 140.0));
    }

    #[test]
    fn test_fixed_strategy_is_viewport_relative() {
        let viewport = Rect::new(0.0, 50.0, 800.0, 600.0);
        let config = PositionConfig::new(Placement::BottomStart).with_strategy(Strategy::Fixed);
        let result = compute_position(INPUT, LIST, &config, Some(viewport));
        assert_eq!((result.x, result.y), (100.0, 90.0));
        assert_eq!(result.strategy, Strategy::Fixed);
    }

    #[test]
    fn test_placement_display() {
        assert_eq!(Placement::BottomStart.to_string(), "bottom-start");
        assert_eq!(Placement::Left.to_string(), "left");
        assert_eq!(Placement::TopEnd.flipped(), Placement::BottomEnd);
    }
}

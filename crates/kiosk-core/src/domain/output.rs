//! Output layout registry.
//!
//! Every attached display (an *output*) gets a rectangle in one shared logical
//! coordinate space.  Outputs are auto-placed left to right in attach order at
//! `y = 0`, so the layout is always a single gap-free row:
//!
//! ```text
//!  x=0          x=1920       x=3200
//!  ┌──────────┐ ┌────────┐ ┌──────────┐
//!  │ output#1 │ │output#2│ │ output#3 │
//!  │1920x1080 │ │1280x720│ │2560x1440 │
//!  └──────────┘ └────────┘ │          │
//!                          └──────────┘
//! ```
//!
//! When an output is removed or changes mode the remaining outputs are
//! re-flowed so that no gap opens up.  The registry reports which outputs moved
//! so the caller can tell the engine about the new positions.
//!
//! The *primary output* is the oldest output that is still attached.

use thiserror::Error;

use super::geometry::Rect;
use super::ids::OutputId;

/// Errors that can occur when changing the output layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// An output with this id is already part of the layout.
    #[error("output already in layout: {0}")]
    DuplicateOutput(OutputId),

    /// The specified output does not exist in the layout.
    #[error("output not found: {0}")]
    UnknownOutput(OutputId),

    /// The output reported a zero-sized mode.
    #[error("output {0} has an empty mode ({1}x{2})")]
    EmptyMode(OutputId, u32, u32),

    /// The mode would push the layout past the largest representable coordinate.
    #[error("output {0} mode ({1}x{2}) does not fit in the layout")]
    ModeTooLarge(OutputId, u32, u32),
}

/// Largest layout extent whose coordinates still fit in an `i32`.
const MAX_EXTENT: i64 = i32::MAX as i64;

/// A display positioned in the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Engine id of the output.
    pub id: OutputId,
    /// Human-readable connector name (e.g. `HEADLESS-1`, `DP-2`).
    pub name: String,
    /// Position and size in layout coordinates.
    pub region: Rect,
}

/// Result of removing an output from the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed {
    /// The output that was removed.
    pub output: Output,
    /// Outputs whose position changed during the re-flow.
    pub moved: Vec<OutputId>,
}

/// The set of attached outputs and their positions.
#[derive(Debug, Default)]
pub struct OutputLayout {
    /// Outputs in attach order.  Attach order is also left-to-right order.
    outputs: Vec<Output>,
}

impl OutputLayout {
    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a new output to the right of the current rightmost output.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::DuplicateOutput`] if `id` is already placed.
    /// - [`LayoutError::EmptyMode`] if either dimension is zero.
    /// - [`LayoutError::ModeTooLarge`] if the row of outputs would grow wider
    ///   (or the output taller) than `i32::MAX`.
    pub fn add_output(
        &mut self,
        id: OutputId,
        name: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Result<OutputId, LayoutError> {
        if self.contains(id) {
            return Err(LayoutError::DuplicateOutput(id));
        }
        check_mode(id, width, height, self.total_width())?;

        let x = self.outputs.last().map(|o| o.region.right()).unwrap_or(0);
        let region = Rect::new(x, 0, width, height);
        debug_assert!(
            self.outputs.iter().all(|o| !o.region.overlaps(&region)),
            "auto placement produced an overlapping output"
        );

        self.outputs.push(Output {
            id,
            name: name.into(),
            region,
        });
        Ok(id)
    }

    /// Removes an output and closes the gap it leaves behind.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownOutput`] if `id` is not in the layout.
    pub fn remove_output(&mut self, id: OutputId) -> Result<Removed, LayoutError> {
        let index = self
            .index_of(id)
            .ok_or(LayoutError::UnknownOutput(id))?;
        let output = self.outputs.remove(index);
        let moved = self.reflow();
        Ok(Removed { output, moved })
    }

    /// Applies a new mode to an output and re-flows the outputs to its right.
    ///
    /// Returns the ids of the *other* outputs whose position changed.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::UnknownOutput`] if `id` is not in the layout.
    /// - [`LayoutError::EmptyMode`] if either dimension is zero.
    /// - [`LayoutError::ModeTooLarge`] if the new mode does not fit.
    pub fn set_mode(
        &mut self,
        id: OutputId,
        width: u32,
        height: u32,
    ) -> Result<Vec<OutputId>, LayoutError> {
        let index = self
            .index_of(id)
            .ok_or(LayoutError::UnknownOutput(id))?;
        let others = self.total_width() - i64::from(self.outputs[index].region.width);
        check_mode(id, width, height, others)?;
        self.outputs[index].region.width = width;
        self.outputs[index].region.height = height;
        Ok(self.reflow())
    }

    /// Returns the output whose bounds contain the layout point, if any.
    pub fn resolve(&self, lx: f64, ly: f64) -> Option<OutputId> {
        self.outputs
            .iter()
            .find(|o| o.region.contains(lx, ly))
            .map(|o| o.id)
    }

    /// Returns the output with the given id.
    pub fn get(&self, id: OutputId) -> Option<&Output> {
        self.outputs.iter().find(|o| o.id == id)
    }

    /// Returns `true` if the output is part of the layout.
    pub fn contains(&self, id: OutputId) -> bool {
        self.index_of(id).is_some()
    }

    /// Returns the oldest attached output.
    pub fn primary(&self) -> Option<OutputId> {
        self.outputs.first().map(|o| o.id)
    }

    /// Iterates over all outputs in attach order.
    pub fn iter(&self) -> impl Iterator<Item = &Output> {
        self.outputs.iter()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn index_of(&self, id: OutputId) -> Option<usize> {
        self.outputs.iter().position(|o| o.id == id)
    }

    fn total_width(&self) -> i64 {
        self.outputs.iter().map(|o| i64::from(o.region.width)).sum()
    }

    /// Re-packs the outputs left to right and returns those that moved.
    fn reflow(&mut self) -> Vec<OutputId> {
        let mut moved = Vec::new();
        let mut x = 0;
        for output in &mut self.outputs {
            if output.region.x != x || output.region.y != 0 {
                output.region.x = x;
                output.region.y = 0;
                moved.push(output.id);
            }
            x = output.region.right();
        }
        moved
    }
}

/// Validates a mode placed next to outputs `others_width` pixels wide in total.
fn check_mode(id: OutputId, width: u32, height: u32, others_width: i64) -> Result<(), LayoutError> {
    if width == 0 || height == 0 {
        return Err(LayoutError::EmptyMode(id, width, height));
    }
    if others_width + i64::from(width) > MAX_EXTENT || i64::from(height) > MAX_EXTENT {
        return Err(LayoutError::ModeTooLarge(id, width, height));
    }
    Ok(())
}

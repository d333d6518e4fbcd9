//! Layer stack: auxiliary surfaces stacked in four tiers per output.
//!
//! Besides the one application surface, clients may create *layer surfaces*:
//! panels, wallpapers, on-screen keyboards, notifications.  Each one lives on
//! exactly one output, in one of four tiers:
//!
//! ```text
//!   Overlay      ← drawn last (on top of everything)
//!   Top
//!   (application surface)
//!   Bottom
//!   Background   ← drawn first
//! ```
//!
//! Within a tier the surface registered first is drawn first, so later
//! surfaces composite on top of earlier ones.
//!
//! # Ownership
//!
//! The stack owns every [`LayerSurface`] in an arena keyed by [`SurfaceId`].
//! The per-output tier lists only hold ids.  When an output goes away its lists
//! are dropped and each surface is *detached* (its `output` becomes `None`) but
//! stays in the arena until the client destroys it.  A detached surface never
//! moves to another output.

use std::collections::HashMap;

use bitflags::bitflags;
use thiserror::Error;
use tracing::{debug, error};

use super::geometry::{Rect, Size};
use super::ids::{OutputId, SurfaceId};
use crate::protocol::commands::{Command, CommandSink};

/// The four stacking tiers, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Tier {
    #[default]
    Background = 0,
    Bottom = 1,
    Top = 2,
    Overlay = 3,
}

impl Tier {
    /// All tiers, bottom to top.
    pub const ALL: [Tier; 4] = [Tier::Background, Tier::Bottom, Tier::Top, Tier::Overlay];

    fn index(self) -> usize {
        self as usize
    }
}

bitflags! {
    /// Output edges a layer surface is anchored to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Anchor: u32 {
        const TOP = 1;
        const BOTTOM = 2;
        const LEFT = 4;
        const RIGHT = 8;
    }
}

/// Distance kept from each anchored edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Margin {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

/// Client-controlled state of a layer surface.
///
/// The client sends a new copy with every commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerSurfaceState {
    pub tier: Tier,
    pub anchor: Anchor,
    pub margin: Margin,
    /// Zero means "as large as the anchors allow".
    pub desired_width: u32,
    /// Zero means "as large as the anchors allow".
    pub desired_height: u32,
}

/// A layer surface tracked by the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSurface {
    pub id: SurfaceId,
    pub namespace: String,
    pub state: LayerSurfaceState,
    /// Output-local geometry computed by [`arrange_geometry`].
    pub geometry: Rect,
    pub mapped: bool,
    /// `None` once the owning output has been removed.
    pub output: Option<OutputId>,
}

impl LayerSurface {
    pub fn new(id: SurfaceId, namespace: impl Into<String>, state: LayerSurfaceState) -> Self {
        Self {
            id,
            namespace: namespace.into(),
            state,
            geometry: Rect::default(),
            mapped: false,
            output: None,
        }
    }

    pub fn tier(&self) -> Tier {
        self.state.tier
    }
}

/// Errors reported by the layer stack.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayerError {
    /// The output is not (or no longer) known to the stack.
    #[error("layer stack has no output {0}")]
    UnknownOutput(OutputId),

    #[error("unknown layer surface {0}")]
    UnknownSurface(SurfaceId),

    #[error("layer surface {0} is already registered")]
    DuplicateSurface(SurfaceId),

    /// The surface lost its output and can no longer be placed or shown.
    #[error("layer surface {0} is detached from its output")]
    Detached(SurfaceId),
}

/// Computes the output-local geometry of a layer surface.
///
/// Anchored to two opposite edges with a zero desired size, the surface
/// stretches between them (minus margins).  A zero size on an axis that is not
/// stretched falls back to the full output extent.  On an axis anchored to a
/// single edge the surface sits against that edge plus its margin; otherwise it
/// is centred.
///
/// Margins and sizes come straight from the client.  The size never exceeds the
/// output extent and the position is clamped so the surface ends up at most
/// its own size outside the output.
pub fn arrange_geometry(state: &LayerSurfaceState, output: Size) -> Rect {
    let (x, width) = arrange_axis(
        state.anchor.contains(Anchor::LEFT),
        state.anchor.contains(Anchor::RIGHT),
        state.desired_width,
        state.margin.left,
        state.margin.right,
        output.width,
    );
    let (y, height) = arrange_axis(
        state.anchor.contains(Anchor::TOP),
        state.anchor.contains(Anchor::BOTTOM),
        state.desired_height,
        state.margin.top,
        state.margin.bottom,
        output.height,
    );
    Rect::new(x, y, width, height)
}

// Computed in i64: every operand fits, so nothing here can overflow.
fn arrange_axis(
    start: bool,
    end: bool,
    desired: u32,
    margin_start: i32,
    margin_end: i32,
    extent: u32,
) -> (i32, u32) {
    let extent = i64::from(extent);
    let margin_start = i64::from(margin_start);
    let margin_end = i64::from(margin_end);

    let (pos, size) = if start && end && desired == 0 {
        let size = (extent - margin_start - margin_end).clamp(0, extent);
        (margin_start, size)
    } else {
        let size = if desired == 0 { extent } else { i64::from(desired).min(extent) };
        let pos = match (start, end) {
            (true, false) => margin_start,
            (false, true) => extent - size - margin_end,
            _ => (extent - size) / 2,
        };
        (pos, size)
    };

    let pos = pos.clamp(-size, extent);
    (saturate_i32(pos), u32::try_from(size).unwrap_or(u32::MAX))
}

fn saturate_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Per-output tier lists plus the surface arena.
#[derive(Debug, Default)]
pub struct LayerStack {
    lists: HashMap<OutputId, [Vec<SurfaceId>; 4]>,
    surfaces: HashMap<SurfaceId, LayerSurface>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Outputs ───────────────────────────────────────────────────────────────

    /// Creates the (empty) tier lists for a new output.
    pub fn add_output(&mut self, output: OutputId) {
        self.lists.entry(output).or_default();
    }

    /// Drops the tier lists of an output, detaching and closing its surfaces.
    ///
    /// Detached surfaces stay in the arena; the client is asked to close them
    /// and will eventually destroy them.  Returns the detached surfaces in
    /// bottom-to-top order.
    pub fn remove_output(&mut self, sink: &mut dyn CommandSink, output: OutputId) -> Vec<SurfaceId> {
        let Some(lists) = self.lists.remove(&output) else {
            return Vec::new();
        };

        let detached: Vec<SurfaceId> = lists.into_iter().flatten().collect();
        for id in &detached {
            if let Some(surface) = self.surfaces.get_mut(id) {
                surface.output = None;
            }
            debug!(surface = %id, output = %output, "closing layer surface of removed output");
            sink.submit(Command::CloseSurface { surface: *id });
        }
        detached
    }

    pub fn has_output(&self, output: OutputId) -> bool {
        self.lists.contains_key(&output)
    }

    // ── Membership ────────────────────────────────────────────────────────────

    /// Appends a surface at the tail of `tier` on `output`.
    ///
    /// Only new surfaces are accepted: a detached surface stays detached until
    /// it is destroyed.
    ///
    /// # Errors
    ///
    /// - [`LayerError::UnknownOutput`] if the output was never added or has been
    ///   removed.  This is a lifecycle bug in the caller and is logged loudly.
    /// - [`LayerError::DuplicateSurface`] if the id is already in the arena,
    ///   attached or not.
    pub fn insert(
        &mut self,
        output: OutputId,
        mut surface: LayerSurface,
        tier: Tier,
    ) -> Result<(), LayerError> {
        let id = surface.id;
        let Some(lists) = self.lists.get_mut(&output) else {
            error!(surface = %id, output = %output, "insert into unknown output");
            return Err(LayerError::UnknownOutput(output));
        };
        if self.surfaces.contains_key(&id) {
            error!(surface = %id, output = %output, "layer surface registered twice");
            return Err(LayerError::DuplicateSurface(id));
        }

        lists[tier.index()].push(id);
        surface.state.tier = tier;
        surface.output = Some(output);
        self.surfaces.insert(id, surface);
        Ok(())
    }

    /// Moves a surface to the tail of another tier on the same output.
    ///
    /// Moving to the tier the surface is already in leaves it where it is.
    pub fn retier(&mut self, id: SurfaceId, tier: Tier) -> Result<(), LayerError> {
        let surface = self
            .surfaces
            .get_mut(&id)
            .ok_or(LayerError::UnknownSurface(id))?;
        let output = surface.output.ok_or(LayerError::Detached(id))?;
        if surface.state.tier == tier {
            return Ok(());
        }
        let lists = self
            .lists
            .get_mut(&output)
            .ok_or(LayerError::UnknownOutput(output))?;

        lists[surface.state.tier.index()].retain(|s| *s != id);
        lists[tier.index()].push(id);
        surface.state.tier = tier;
        Ok(())
    }

    /// Takes a surface out of its tier list without freeing it.
    pub fn remove(&mut self, id: SurfaceId) -> Result<(), LayerError> {
        let surface = self
            .surfaces
            .get_mut(&id)
            .ok_or(LayerError::UnknownSurface(id))?;
        if let Some(output) = surface.output.take() {
            if let Some(lists) = self.lists.get_mut(&output) {
                lists[surface.state.tier.index()].retain(|s| *s != id);
            }
        }
        Ok(())
    }

    /// Detaches and frees a surface.  A mapped surface is unmapped first.
    pub fn destroy(&mut self, sink: &mut dyn CommandSink, id: SurfaceId) -> Option<LayerSurface> {
        if self.surfaces.get(&id)?.mapped {
            // Cannot fail: the surface exists.
            let _ = self.unmap(sink, id);
        }
        let _ = self.remove(id);
        self.surfaces.remove(&id)
    }

    pub fn get(&self, id: SurfaceId) -> Option<&LayerSurface> {
        self.surfaces.get(&id)
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.surfaces.contains_key(&id)
    }

    /// Ids in one tier of one output, bottom to top.
    pub fn tier_list(&self, output: OutputId, tier: Tier) -> &[SurfaceId] {
        self.lists
            .get(&output)
            .map(|lists| lists[tier.index()].as_slice())
            .unwrap_or(&[])
    }

    /// Surfaces of one output in hit-test order: overlay first, newest first.
    pub fn iter_top_down(&self, output: OutputId) -> impl Iterator<Item = &LayerSurface> + '_ {
        Tier::ALL
            .into_iter()
            .rev()
            .flat_map(move |tier| self.tier_list(output, tier).iter().rev())
            .filter_map(|id| self.surfaces.get(id))
    }

    // ── Damage ────────────────────────────────────────────────────────────────

    /// Forwards a repaint request for `region` on `output` to the engine.
    pub fn mark_damage(
        &self,
        sink: &mut dyn CommandSink,
        output: OutputId,
        region: Rect,
        full: bool,
    ) -> Result<(), LayerError> {
        if !self.lists.contains_key(&output) {
            return Err(LayerError::UnknownOutput(output));
        }
        sink.submit(Command::Damage {
            output,
            region,
            full,
        });
        Ok(())
    }

    // ── Client-driven state changes ───────────────────────────────────────────

    /// Applies newly committed client state.
    ///
    /// A tier change moves the surface to the tail of the new tier.  When the
    /// tier or the geometry changed, both the old and the new geometry are fully
    /// damaged; otherwise the current geometry gets a content-only repaint.
    /// A size change is sent back to the client as a configure.  Commits of
    /// detached surfaces are ignored.
    pub fn commit(
        &mut self,
        sink: &mut dyn CommandSink,
        id: SurfaceId,
        pending: LayerSurfaceState,
        output_size: Size,
    ) -> Result<(), LayerError> {
        let surface = self.surfaces.get(&id).ok_or(LayerError::UnknownSurface(id))?;
        let Some(output) = surface.output else {
            debug!(surface = %id, "ignoring commit of detached layer surface");
            return Ok(());
        };

        let old_geometry = surface.geometry;
        let tier_changed = surface.state.tier != pending.tier;
        if tier_changed {
            self.retier(id, pending.tier)?;
        }

        let new_geometry = arrange_geometry(&pending, output_size);
        if let Some(surface) = self.surfaces.get_mut(&id) {
            surface.state = pending;
            surface.geometry = new_geometry;
        }

        if tier_changed || old_geometry != new_geometry {
            self.mark_damage(sink, output, old_geometry, true)?;
            self.mark_damage(sink, output, new_geometry, true)?;
        } else {
            self.mark_damage(sink, output, new_geometry, false)?;
        }

        if (old_geometry.width, old_geometry.height) != (new_geometry.width, new_geometry.height) {
            sink.submit(Command::ConfigureSurface {
                surface: id,
                width: new_geometry.width,
                height: new_geometry.height,
            });
        }
        Ok(())
    }

    /// Marks a surface visible: full damage plus an enter for its output.
    pub fn map(&mut self, sink: &mut dyn CommandSink, id: SurfaceId) -> Result<(), LayerError> {
        let surface = self
            .surfaces
            .get_mut(&id)
            .ok_or(LayerError::UnknownSurface(id))?;
        let output = surface.output.ok_or(LayerError::Detached(id))?;
        surface.mapped = true;
        let geometry = surface.geometry;

        self.mark_damage(sink, output, geometry, true)?;
        sink.submit(Command::SurfaceEnterOutput {
            surface: id,
            output,
        });
        Ok(())
    }

    /// Marks a surface hidden and repaints the area it covered.
    pub fn unmap(&mut self, sink: &mut dyn CommandSink, id: SurfaceId) -> Result<(), LayerError> {
        let surface = self
            .surfaces
            .get_mut(&id)
            .ok_or(LayerError::UnknownSurface(id))?;
        surface.mapped = false;
        let (output, geometry) = (surface.output, surface.geometry);

        match output {
            Some(output) => self.mark_damage(sink, output, geometry, true),
            None => Ok(()),
        }
    }

    /// Computes the geometry of one surface and sends it to the client.
    pub fn configure(
        &mut self,
        sink: &mut dyn CommandSink,
        id: SurfaceId,
        output_size: Size,
    ) -> Result<Rect, LayerError> {
        let surface = self
            .surfaces
            .get_mut(&id)
            .ok_or(LayerError::UnknownSurface(id))?;
        surface.geometry = arrange_geometry(&surface.state, output_size);
        let geometry = surface.geometry;
        sink.submit(Command::ConfigureSurface {
            surface: id,
            width: geometry.width,
            height: geometry.height,
        });
        Ok(geometry)
    }

    /// Re-arranges every surface of an output after its size changed.
    pub fn rearrange(
        &mut self,
        sink: &mut dyn CommandSink,
        output: OutputId,
        output_size: Size,
    ) -> Result<(), LayerError> {
        let ids: Vec<SurfaceId> = self
            .lists
            .get(&output)
            .ok_or(LayerError::UnknownOutput(output))?
            .iter()
            .flatten()
            .copied()
            .collect();

        for id in ids {
            self.configure(sink, id, output_size)?;
        }
        self.mark_damage(sink, output, Rect::new(0, 0, output_size.width, output_size.height), true)
    }
}

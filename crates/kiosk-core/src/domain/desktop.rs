//! Everything visible: outputs, layer surfaces and the application surface.
//!
//! [`Desktop::surface_at`] answers "what is under this layout point?".  On the
//! output containing the point, surfaces are tested from the top of the
//! stacking order down:
//!
//! 1. overlay layer surfaces, newest first
//! 2. top layer surfaces, newest first
//! 3. the primary application surface (covers the whole output)
//! 4. bottom layer surfaces, newest first
//! 5. background layer surfaces, newest first
//!
//! Unmapped surfaces are never hit.

use super::geometry::Size;
use super::ids::{OutputId, SurfaceId};
use super::layer::{LayerStack, Tier};
use super::output::OutputLayout;

/// The one application surface shown full-screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryView {
    pub surface: SurfaceId,
    /// Output it fills; `None` while no output exists.
    pub output: Option<OutputId>,
    pub mapped: bool,
}

impl PrimaryView {
    pub fn new(surface: SurfaceId, output: Option<OutputId>) -> Self {
        Self {
            surface,
            output,
            mapped: false,
        }
    }
}

/// Which kind of surface was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceRef {
    Primary(SurfaceId),
    Layer(SurfaceId),
}

impl SurfaceRef {
    pub fn id(&self) -> SurfaceId {
        match self {
            SurfaceRef::Primary(id) | SurfaceRef::Layer(id) => *id,
        }
    }
}

/// A hit-test result with surface-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub surface: SurfaceRef,
    pub sx: f64,
    pub sy: f64,
}

#[derive(Debug, Default)]
pub struct Desktop {
    pub outputs: OutputLayout,
    pub layers: LayerStack,
    pub primary: Option<PrimaryView>,
}

impl Desktop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of an output, if it is in the layout.
    pub fn output_size(&self, output: OutputId) -> Option<Size> {
        self.outputs
            .get(output)
            .map(|o| Size::new(o.region.width, o.region.height))
    }

    /// Returns `true` if `surface` is the primary application surface.
    pub fn is_primary(&self, surface: SurfaceId) -> bool {
        self.primary.is_some_and(|p| p.surface == surface)
    }

    /// Finds the topmost mapped surface under a layout point.
    pub fn surface_at(&self, lx: f64, ly: f64) -> Option<SurfaceHit> {
        let output_id = self.outputs.resolve(lx, ly)?;
        let region = self.outputs.get(output_id)?.region;
        let ox = lx - f64::from(region.x);
        let oy = ly - f64::from(region.y);

        self.layer_at(output_id, &[Tier::Overlay, Tier::Top], ox, oy)
            .or_else(|| self.primary_at(output_id, ox, oy))
            .or_else(|| self.layer_at(output_id, &[Tier::Bottom, Tier::Background], ox, oy))
    }

    fn layer_at(&self, output: OutputId, tiers: &[Tier], ox: f64, oy: f64) -> Option<SurfaceHit> {
        tiers
            .iter()
            .flat_map(|tier| self.layers.tier_list(output, *tier).iter().rev())
            .filter_map(|id| self.layers.get(*id))
            .find(|s| s.mapped && s.geometry.contains(ox, oy))
            .map(|s| SurfaceHit {
                surface: SurfaceRef::Layer(s.id),
                sx: ox - f64::from(s.geometry.x),
                sy: oy - f64::from(s.geometry.y),
            })
    }

    fn primary_at(&self, output: OutputId, ox: f64, oy: f64) -> Option<SurfaceHit> {
        let primary = self.primary?;
        if !primary.mapped || primary.output != Some(output) {
            return None;
        }
        Some(SurfaceHit {
            surface: SurfaceRef::Primary(primary.surface),
            sx: ox,
            sy: oy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layer::{Anchor, LayerSurface, LayerSurfaceState};
    use crate::protocol::commands::Command;

    const OUT: OutputId = OutputId(1);

    fn make_desktop() -> Desktop {
        let mut desktop = Desktop::new();
        desktop.outputs.add_output(OUT, "HEADLESS-1", 800, 600).unwrap();
        desktop.layers.add_output(OUT);
        desktop
    }

    fn add_mapped_primary(desktop: &mut Desktop, id: u64) {
        desktop.primary = Some(PrimaryView {
            surface: SurfaceId(id),
            output: Some(OUT),
            mapped: true,
        });
    }

    /// Adds a full-output layer surface and maps it.
    fn add_mapped_layer(desktop: &mut Desktop, id: u64, tier: Tier) {
        let state = LayerSurfaceState {
            tier,
            anchor: Anchor::all(),
            ..Default::default()
        };
        let mut sink: Vec<Command> = Vec::new();
        desktop
            .layers
            .insert(OUT, LayerSurface::new(SurfaceId(id), "test", state), tier)
            .unwrap();
        desktop
            .layers
            .configure(&mut sink, SurfaceId(id), Size::new(800, 600))
            .unwrap();
        desktop.layers.map(&mut sink, SurfaceId(id)).unwrap();
    }

    #[test]
    fn test_surface_at_outside_every_output_is_none() {
        let mut desktop = make_desktop();
        add_mapped_primary(&mut desktop, 1);
        assert_eq!(desktop.surface_at(900.0, 10.0), None);
        assert_eq!(desktop.surface_at(-1.0, 10.0), None);
    }

    #[test]
    fn test_surface_at_with_only_primary_hits_primary() {
        let mut desktop = make_desktop();
        add_mapped_primary(&mut desktop, 1);

        let hit = desktop.surface_at(100.0, 50.0).unwrap();

        assert_eq!(hit.surface, SurfaceRef::Primary(SurfaceId(1)));
        assert_eq!((hit.sx, hit.sy), (100.0, 50.0));
    }

    #[test]
    fn test_surface_at_overlay_beats_primary() {
        let mut desktop = make_desktop();
        add_mapped_primary(&mut desktop, 1);
        add_mapped_layer(&mut desktop, 2, Tier::Overlay);

        let hit = desktop.surface_at(100.0, 50.0).unwrap();

        assert_eq!(hit.surface, SurfaceRef::Layer(SurfaceId(2)));
    }

    #[test]
    fn test_surface_at_primary_beats_bottom_and_background() {
        let mut desktop = make_desktop();
        add_mapped_layer(&mut desktop, 2, Tier::Background);
        add_mapped_layer(&mut desktop, 3, Tier::Bottom);
        add_mapped_primary(&mut desktop, 1);

        let hit = desktop.surface_at(1.0, 1.0).unwrap();

        assert_eq!(hit.surface, SurfaceRef::Primary(SurfaceId(1)));
    }

    #[test]
    fn test_surface_at_same_tier_newest_wins() {
        let mut desktop = make_desktop();
        add_mapped_layer(&mut desktop, 10, Tier::Top);
        add_mapped_layer(&mut desktop, 11, Tier::Top);

        let hit = desktop.surface_at(400.0, 300.0).unwrap();

        assert_eq!(hit.surface, SurfaceRef::Layer(SurfaceId(11)));
    }

    #[test]
    fn test_surface_at_skips_unmapped_surfaces() {
        let mut desktop = make_desktop();
        add_mapped_primary(&mut desktop, 1);
        add_mapped_layer(&mut desktop, 2, Tier::Overlay);
        let mut sink: Vec<Command> = Vec::new();
        desktop.layers.unmap(&mut sink, SurfaceId(2)).unwrap();

        let hit = desktop.surface_at(5.0, 5.0).unwrap();

        assert_eq!(hit.surface, SurfaceRef::Primary(SurfaceId(1)));
    }

    #[test]
    fn test_surface_at_translates_to_surface_local_coordinates() {
        // Arrange: a 100x40 overlay in the bottom-right corner of a second output.
        let mut desktop = make_desktop();
        desktop.outputs.add_output(OutputId(2), "HEADLESS-2", 1000, 500).unwrap();
        desktop.layers.add_output(OutputId(2));
        let state = LayerSurfaceState {
            tier: Tier::Overlay,
            anchor: Anchor::BOTTOM | Anchor::RIGHT,
            desired_width: 100,
            desired_height: 40,
            ..Default::default()
        };
        let mut sink: Vec<Command> = Vec::new();
        desktop
            .layers
            .insert(OutputId(2), LayerSurface::new(SurfaceId(5), "osd", state), Tier::Overlay)
            .unwrap();
        desktop.layers.configure(&mut sink, SurfaceId(5), Size::new(1000, 500)).unwrap();
        desktop.layers.map(&mut sink, SurfaceId(5)).unwrap();

        // Act: layout x 800+910 = 1710, y 470
        let hit = desktop.surface_at(1710.0, 470.0).unwrap();

        // Assert
        assert_eq!(hit.surface, SurfaceRef::Layer(SurfaceId(5)));
        assert_eq!((hit.sx, hit.sy), (10.0, 10.0));
    }
}

//! Engine event dispatcher.
//!
//! Turns each [`EngineEvent`] into updates of the desktop model and the seat,
//! and pushes the resulting [`Command`]s to the engine.
//!
//! # Architecture
//!
//! The dispatcher owns the session's domain state ([`Desktop`] and [`Seat`])
//! and depends only on the [`CommandSink`] trait for output, so every path can
//! be unit-tested with a `Vec<Command>`.
//!
//! Events that refer to surfaces the session does not know (already destroyed,
//! or never tracked because they were ignored) are logged and dropped.  Domain
//! errors are logged as warnings; none of them end the session.

use kiosk_core::{
    Command, CommandSink, Desktop, EngineEvent, FocusRouter, KeyboardRepeat, LayerError,
    LayerSurface, LayoutError, OutputId, PrimaryView, Rect, Seat, ShellRole, Size, SurfaceId,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error type for a single dispatched event.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Layer(#[from] LayerError),
}

pub struct Dispatcher {
    desktop: Desktop,
    seat: Seat,
}

impl Dispatcher {
    pub fn new(repeat: KeyboardRepeat) -> Self {
        Self {
            desktop: Desktop::new(),
            seat: Seat::new(kiosk_core::domain::seat::DEFAULT_SEAT_NAME, repeat),
        }
    }

    pub fn desktop(&self) -> &Desktop {
        &self.desktop
    }

    pub fn seat(&self) -> &Seat {
        &self.seat
    }

    /// Handles one engine event.  Failures are logged, never propagated.
    pub fn handle(&mut self, sink: &mut dyn CommandSink, event: EngineEvent) {
        if let Err(e) = self.apply(sink, event) {
            warn!("engine event not applied: {e}");
        }
    }

    fn apply(&mut self, sink: &mut dyn CommandSink, event: EngineEvent) -> Result<(), DispatchError> {
        match event {
            EngineEvent::OutputAttached {
                output,
                name,
                width,
                height,
            } => self.on_output_attached(sink, output, name, width, height),
            EngineEvent::OutputRemoved { output } => self.on_output_removed(sink, output),
            EngineEvent::OutputModeChanged {
                output,
                width,
                height,
            } => self.on_output_mode_changed(sink, output, width, height),
            EngineEvent::InputDeviceAttached(device) => {
                self.seat.on_device_added(sink, device);
                Ok(())
            }
            EngineEvent::InputDeviceRemoved { device } => {
                if !self.seat.on_device_removed(sink, device) {
                    debug!(%device, "removal of untracked input device");
                }
                Ok(())
            }
            EngineEvent::PointerMotion { x, y, time_msec } => {
                FocusRouter::route_motion(&mut self.seat, &self.desktop, sink, x, y, time_msec);
                Ok(())
            }
            EngineEvent::ShellSurfaceCreated { surface, role } => {
                self.on_surface_created(sink, surface, role)
            }
            EngineEvent::SurfaceCommitted {
                surface,
                layer_state,
            } => self.on_surface_committed(sink, surface, layer_state),
            EngineEvent::SurfaceMapped { surface } => self.on_surface_mapped(sink, surface),
            EngineEvent::SurfaceUnmapped { surface } => self.on_surface_unmapped(sink, surface),
            EngineEvent::SurfaceDestroyed { surface } => self.on_surface_destroyed(sink, surface),
        }
    }

    // ── Outputs ───────────────────────────────────────────────────────────────

    fn on_output_attached(
        &mut self,
        sink: &mut dyn CommandSink,
        output: OutputId,
        name: String,
        width: u32,
        height: u32,
    ) -> Result<(), DispatchError> {
        self.desktop.outputs.add_output(output, name.as_str(), width, height)?;
        self.desktop.layers.add_output(output);
        self.announce_position(sink, output);
        info!(%output, %name, width, height, "output attached");

        if self.desktop.primary.is_some_and(|p| p.output.is_none()) {
            self.place_primary(sink, output);
        }
        FocusRouter::refocus(&mut self.seat, &self.desktop, sink);
        Ok(())
    }

    fn on_output_removed(
        &mut self,
        sink: &mut dyn CommandSink,
        output: OutputId,
    ) -> Result<(), DispatchError> {
        let closed = self.desktop.layers.remove_output(sink, output);
        let removed = self.desktop.outputs.remove_output(output)?;
        sink.submit(Command::RemoveFromLayout { output });
        for moved in removed.moved {
            self.announce_position(sink, moved);
        }
        info!(%output, name = %removed.output.name, closed = closed.len(), "output removed");

        if let Some(primary) = self.desktop.primary.as_mut() {
            if primary.output == Some(output) {
                primary.output = None;
                if let Some(next) = self.desktop.outputs.primary() {
                    self.place_primary(sink, next);
                }
            }
        }
        FocusRouter::refocus(&mut self.seat, &self.desktop, sink);
        Ok(())
    }

    fn on_output_mode_changed(
        &mut self,
        sink: &mut dyn CommandSink,
        output: OutputId,
        width: u32,
        height: u32,
    ) -> Result<(), DispatchError> {
        let moved = self.desktop.outputs.set_mode(output, width, height)?;
        for id in moved {
            self.announce_position(sink, id);
        }
        let size = Size::new(width, height);
        self.desktop.layers.rearrange(sink, output, size)?;

        if let Some(primary) = self.desktop.primary.filter(|p| p.output == Some(output)) {
            sink.submit(Command::ConfigureSurface {
                surface: primary.surface,
                width,
                height,
            });
        }
        debug!(%output, width, height, "output mode changed");
        FocusRouter::refocus(&mut self.seat, &self.desktop, sink);
        Ok(())
    }

    fn announce_position(&self, sink: &mut dyn CommandSink, output: OutputId) {
        if let Some(o) = self.desktop.outputs.get(output) {
            sink.submit(Command::AddToLayout {
                output,
                x: o.region.x,
                y: o.region.y,
            });
        }
    }

    /// Puts the primary view on `output` and sizes it to fill the output.
    fn place_primary(&mut self, sink: &mut dyn CommandSink, output: OutputId) {
        let Some(size) = self.desktop.output_size(output) else {
            return;
        };
        let Some(primary) = self.desktop.primary.as_mut() else {
            return;
        };
        primary.output = Some(output);
        let primary = *primary;

        sink.submit(Command::ConfigureSurface {
            surface: primary.surface,
            width: size.width,
            height: size.height,
        });
        if primary.mapped {
            sink.submit(Command::SurfaceEnterOutput {
                surface: primary.surface,
                output,
            });
            self.damage_output(sink, output, true);
        }
    }

    fn damage_output(&self, sink: &mut dyn CommandSink, output: OutputId, full: bool) {
        if let Some(size) = self.desktop.output_size(output) {
            let region = Rect::new(0, 0, size.width, size.height);
            if let Err(e) = self.desktop.layers.mark_damage(sink, output, region, full) {
                warn!("output damage dropped: {e}");
            }
        }
    }

    // ── Surfaces ──────────────────────────────────────────────────────────────

    fn on_surface_created(
        &mut self,
        sink: &mut dyn CommandSink,
        surface: SurfaceId,
        role: ShellRole,
    ) -> Result<(), DispatchError> {
        match role {
            ShellRole::Toplevel if self.desktop.primary.is_none() => {
                let output = self.desktop.outputs.primary();
                self.desktop.primary = Some(PrimaryView::new(surface, None));
                info!(%surface, "primary application surface created");
                if let Some(output) = output {
                    self.place_primary(sink, output);
                }
            }
            ShellRole::Toplevel => {
                debug!(%surface, "ignoring additional toplevel surface");
            }
            ShellRole::Popup => {
                debug!(%surface, "ignoring popup surface");
            }
            ShellRole::Layer {
                namespace,
                requested_output,
                state,
            } => {
                debug!(
                    %surface,
                    %namespace,
                    tier = ?state.tier,
                    anchor = ?state.anchor,
                    width = state.desired_width,
                    height = state.desired_height,
                    "new layer surface"
                );
                let output = requested_output
                    .filter(|o| self.desktop.layers.has_output(*o))
                    .or_else(|| self.desktop.outputs.primary());
                let Some(output) = output else {
                    warn!(%surface, %namespace, "no output for layer surface, closing it");
                    sink.submit(Command::CloseSurface { surface });
                    return Ok(());
                };
                let size = self.output_size(output)?;
                self.desktop
                    .layers
                    .insert(output, LayerSurface::new(surface, namespace, state), state.tier)?;
                self.desktop.layers.configure(sink, surface, size)?;
            }
        }
        Ok(())
    }

    fn on_surface_committed(
        &mut self,
        sink: &mut dyn CommandSink,
        surface: SurfaceId,
        layer_state: Option<kiosk_core::LayerSurfaceState>,
    ) -> Result<(), DispatchError> {
        if let Some(layer) = self.desktop.layers.get(surface) {
            let pending = layer_state.unwrap_or(layer.state);
            let size = layer
                .output
                .and_then(|o| self.desktop.output_size(o))
                .unwrap_or_default();
            self.desktop.layers.commit(sink, surface, pending, size)?;
        } else if let Some(primary) = self.primary_if(surface) {
            if let (true, Some(output)) = (primary.mapped, primary.output) {
                self.damage_output(sink, output, false);
            }
        } else {
            debug!(%surface, "commit for unknown surface");
        }
        Ok(())
    }

    fn on_surface_mapped(
        &mut self,
        sink: &mut dyn CommandSink,
        surface: SurfaceId,
    ) -> Result<(), DispatchError> {
        if self.desktop.layers.contains(surface) {
            self.desktop.layers.map(sink, surface)?;
        } else if let Some(primary) = self.desktop.primary.as_mut().filter(|p| p.surface == surface) {
            primary.mapped = true;
            if let Some(output) = primary.output {
                sink.submit(Command::SurfaceEnterOutput { surface, output });
                self.damage_output(sink, output, true);
            }
            self.seat.set_keyboard_focus(sink, Some(surface));
            info!(%surface, "primary application surface mapped");
        } else {
            debug!(%surface, "map for unknown surface");
            return Ok(());
        }
        FocusRouter::refocus(&mut self.seat, &self.desktop, sink);
        Ok(())
    }

    fn on_surface_unmapped(
        &mut self,
        sink: &mut dyn CommandSink,
        surface: SurfaceId,
    ) -> Result<(), DispatchError> {
        if self.desktop.layers.contains(surface) {
            self.desktop.layers.unmap(sink, surface)?;
        } else if self.primary_if(surface).is_some() {
            self.unmap_primary(sink);
        } else {
            debug!(%surface, "unmap for unknown surface");
            return Ok(());
        }
        FocusRouter::forget_surface(&mut self.seat, sink, surface);
        FocusRouter::refocus(&mut self.seat, &self.desktop, sink);
        Ok(())
    }

    fn on_surface_destroyed(
        &mut self,
        sink: &mut dyn CommandSink,
        surface: SurfaceId,
    ) -> Result<(), DispatchError> {
        if self.desktop.layers.contains(surface) {
            self.desktop.layers.destroy(sink, surface);
            debug!(%surface, "layer surface destroyed");
        } else if let Some(primary) = self.primary_if(surface) {
            if primary.mapped {
                self.unmap_primary(sink);
            }
            self.desktop.primary = None;
            info!(%surface, "primary application surface destroyed");
        } else {
            debug!(%surface, "destroy for unknown surface");
            return Ok(());
        }
        FocusRouter::forget_surface(&mut self.seat, sink, surface);
        FocusRouter::refocus(&mut self.seat, &self.desktop, sink);
        Ok(())
    }

    fn unmap_primary(&mut self, sink: &mut dyn CommandSink) {
        let Some(primary) = self.desktop.primary.as_mut() else {
            return;
        };
        primary.mapped = false;
        let primary = *primary;
        if let Some(output) = primary.output {
            self.damage_output(sink, output, true);
        }
        if self.seat.keyboard_focus() == Some(primary.surface) {
            self.seat.set_keyboard_focus(sink, None);
        }
    }

    fn primary_if(&self, surface: SurfaceId) -> Option<PrimaryView> {
        self.desktop.primary.filter(|p| p.surface == surface)
    }

    fn output_size(&self, output: OutputId) -> Result<Size, DispatchError> {
        self.desktop
            .output_size(output)
            .ok_or(DispatchError::Layout(LayoutError::UnknownOutput(output)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_core::{
        Anchor, Capabilities, DeviceId, DeviceKind, InputDevice, LayerSurfaceState, SurfaceRef,
        Tier,
    };

    fn attach(d: &mut Dispatcher, sink: &mut Vec<Command>, id: u64, w: u32, h: u32) {
        d.handle(
            sink,
            EngineEvent::OutputAttached {
                output: OutputId(id),
                name: format!("HEADLESS-{id}"),
                width: w,
                height: h,
            },
        );
    }

    fn create_toplevel(d: &mut Dispatcher, sink: &mut Vec<Command>, id: u64) {
        d.handle(
            sink,
            EngineEvent::ShellSurfaceCreated {
                surface: SurfaceId(id),
                role: ShellRole::Toplevel,
            },
        );
    }

    fn create_layer(
        d: &mut Dispatcher,
        sink: &mut Vec<Command>,
        id: u64,
        tier: Tier,
        requested_output: Option<OutputId>,
    ) {
        d.handle(
            sink,
            EngineEvent::ShellSurfaceCreated {
                surface: SurfaceId(id),
                role: ShellRole::Layer {
                    namespace: "panel".into(),
                    requested_output,
                    state: LayerSurfaceState {
                        tier,
                        anchor: Anchor::TOP | Anchor::LEFT | Anchor::RIGHT,
                        desired_height: 40,
                        ..Default::default()
                    },
                },
            },
        );
    }

    fn map(d: &mut Dispatcher, sink: &mut Vec<Command>, id: u64) {
        d.handle(sink, EngineEvent::SurfaceMapped { surface: SurfaceId(id) });
    }

    // ── Outputs ───────────────────────────────────────────────────────────────

    #[test]
    fn test_output_attached_places_output_and_announces_position() {
        // Arrange
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();

        // Act
        attach(&mut d, &mut sink, 1, 1920, 1080);
        attach(&mut d, &mut sink, 2, 1280, 720);

        // Assert
        assert_eq!(
            sink,
            vec![
                Command::AddToLayout { output: OutputId(1), x: 0, y: 0 },
                Command::AddToLayout { output: OutputId(2), x: 1920, y: 0 },
            ]
        );
        assert_eq!(d.desktop().outputs.len(), 2);
    }

    #[test]
    fn test_duplicate_output_is_logged_and_ignored() {
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();
        attach(&mut d, &mut sink, 1, 1920, 1080);
        sink.clear();

        attach(&mut d, &mut sink, 1, 800, 600);

        assert!(sink.is_empty());
        assert_eq!(d.desktop().outputs.len(), 1);
    }

    #[test]
    fn test_output_removed_closes_layers_and_reflows() {
        // Arrange
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();
        attach(&mut d, &mut sink, 1, 1920, 1080);
        attach(&mut d, &mut sink, 2, 1280, 720);
        attach(&mut d, &mut sink, 3, 800, 600);
        create_layer(&mut d, &mut sink, 50, Tier::Top, Some(OutputId(2)));
        sink.clear();

        // Act
        d.handle(&mut sink, EngineEvent::OutputRemoved { output: OutputId(2) });

        // Assert
        assert_eq!(
            sink,
            vec![
                Command::CloseSurface { surface: SurfaceId(50) },
                Command::RemoveFromLayout { output: OutputId(2) },
                Command::AddToLayout { output: OutputId(3), x: 1920, y: 0 },
            ]
        );
        assert_eq!(d.desktop().layers.get(SurfaceId(50)).unwrap().output, None);
    }

    #[test]
    fn test_primary_moves_to_next_output_when_its_output_is_removed() {
        // Arrange
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();
        attach(&mut d, &mut sink, 1, 1920, 1080);
        attach(&mut d, &mut sink, 2, 1280, 720);
        create_toplevel(&mut d, &mut sink, 7);
        sink.clear();

        // Act
        d.handle(&mut sink, EngineEvent::OutputRemoved { output: OutputId(1) });

        // Assert
        assert_eq!(d.desktop().primary.unwrap().output, Some(OutputId(2)));
        assert!(sink.contains(&Command::ConfigureSurface {
            surface: SurfaceId(7),
            width: 1280,
            height: 720
        }));
    }

    #[test]
    fn test_mode_change_reconfigures_primary_and_shifts_neighbours() {
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();
        attach(&mut d, &mut sink, 1, 1920, 1080);
        attach(&mut d, &mut sink, 2, 1280, 720);
        create_toplevel(&mut d, &mut sink, 7);
        sink.clear();

        d.handle(
            &mut sink,
            EngineEvent::OutputModeChanged { output: OutputId(1), width: 1024, height: 768 },
        );

        assert!(sink.contains(&Command::AddToLayout { output: OutputId(2), x: 1024, y: 0 }));
        assert!(sink.contains(&Command::ConfigureSurface {
            surface: SurfaceId(7),
            width: 1024,
            height: 768
        }));
    }

    // ── Primary surface ───────────────────────────────────────────────────────

    #[test]
    fn test_first_toplevel_becomes_fullscreen_primary() {
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();
        attach(&mut d, &mut sink, 1, 1920, 1080);
        sink.clear();

        create_toplevel(&mut d, &mut sink, 7);
        create_toplevel(&mut d, &mut sink, 8);

        assert_eq!(d.desktop().primary.map(|p| p.surface), Some(SurfaceId(7)));
        assert_eq!(
            sink,
            vec![Command::ConfigureSurface { surface: SurfaceId(7), width: 1920, height: 1080 }]
        );
    }

    #[test]
    fn test_toplevel_before_any_output_is_placed_when_output_arrives() {
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();
        create_toplevel(&mut d, &mut sink, 7);
        assert!(sink.is_empty());

        attach(&mut d, &mut sink, 1, 800, 600);

        assert_eq!(d.desktop().primary.unwrap().output, Some(OutputId(1)));
        assert!(sink.contains(&Command::ConfigureSurface {
            surface: SurfaceId(7),
            width: 800,
            height: 600
        }));
    }

    #[test]
    fn test_mapping_primary_gives_keyboard_and_pointer_focus() {
        // Arrange
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();
        attach(&mut d, &mut sink, 1, 800, 600);
        create_toplevel(&mut d, &mut sink, 7);
        sink.clear();

        // Act
        map(&mut d, &mut sink, 7);

        // Assert
        assert_eq!(
            sink,
            vec![
                Command::SurfaceEnterOutput { surface: SurfaceId(7), output: OutputId(1) },
                Command::Damage {
                    output: OutputId(1),
                    region: Rect::new(0, 0, 800, 600),
                    full: true
                },
                Command::SetKeyboardFocus { surface: SurfaceId(7) },
                Command::PointerEnter { surface: SurfaceId(7), sx: 0.0, sy: 0.0 },
            ]
        );
        assert_eq!(d.seat().keyboard_focus(), Some(SurfaceId(7)));
        assert_eq!(d.seat().pointer_focus(), Some(SurfaceId(7)));
    }

    #[test]
    fn test_primary_commit_damages_content_only() {
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();
        attach(&mut d, &mut sink, 1, 800, 600);
        create_toplevel(&mut d, &mut sink, 7);
        map(&mut d, &mut sink, 7);
        sink.clear();

        d.handle(&mut sink, EngineEvent::SurfaceCommitted { surface: SurfaceId(7), layer_state: None });

        assert_eq!(
            sink,
            vec![Command::Damage { output: OutputId(1), region: Rect::new(0, 0, 800, 600), full: false }]
        );
    }

    #[test]
    fn test_destroying_primary_clears_focus_and_allows_new_primary() {
        // Arrange
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();
        attach(&mut d, &mut sink, 1, 800, 600);
        create_toplevel(&mut d, &mut sink, 7);
        map(&mut d, &mut sink, 7);
        sink.clear();

        // Act
        d.handle(&mut sink, EngineEvent::SurfaceDestroyed { surface: SurfaceId(7) });

        // Assert
        assert!(d.desktop().primary.is_none());
        assert!(sink.contains(&Command::ClearKeyboardFocus));
        assert!(sink.contains(&Command::ClearPointerFocus));
        assert_eq!(d.seat().pointer_focus(), None);

        create_toplevel(&mut d, &mut sink, 8);
        assert_eq!(d.desktop().primary.map(|p| p.surface), Some(SurfaceId(8)));
    }

    // ── Layer surfaces ────────────────────────────────────────────────────────

    #[test]
    fn test_layer_without_requested_output_goes_to_primary_output() {
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();
        attach(&mut d, &mut sink, 1, 1920, 1080);
        attach(&mut d, &mut sink, 2, 1280, 720);
        sink.clear();

        create_layer(&mut d, &mut sink, 50, Tier::Top, None);

        assert_eq!(d.desktop().layers.get(SurfaceId(50)).unwrap().output, Some(OutputId(1)));
        assert_eq!(
            sink,
            vec![Command::ConfigureSurface { surface: SurfaceId(50), width: 1920, height: 40 }]
        );
    }

    #[test]
    fn test_layer_without_any_output_is_closed() {
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();

        create_layer(&mut d, &mut sink, 50, Tier::Top, None);

        assert_eq!(sink, vec![Command::CloseSurface { surface: SurfaceId(50) }]);
        assert!(!d.desktop().layers.contains(SurfaceId(50)));
    }

    #[test]
    fn test_overlay_mapped_over_primary_takes_pointer_focus() {
        // Arrange
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();
        attach(&mut d, &mut sink, 1, 800, 600);
        create_toplevel(&mut d, &mut sink, 7);
        map(&mut d, &mut sink, 7);
        d.handle(&mut sink, EngineEvent::PointerMotion { x: 10.0, y: 10.0, time_msec: 5 });
        create_layer(&mut d, &mut sink, 50, Tier::Overlay, None);
        sink.clear();

        // Act
        map(&mut d, &mut sink, 50);

        // Assert
        assert_eq!(d.seat().pointer_focus(), Some(SurfaceId(50)));
        assert_eq!(
            sink.last(),
            Some(&Command::PointerEnter { surface: SurfaceId(50), sx: 10.0, sy: 10.0 })
        );
        let hit = d.desktop().surface_at(10.0, 10.0).unwrap();
        assert_eq!(hit.surface, SurfaceRef::Layer(SurfaceId(50)));
    }

    #[test]
    fn test_unmapping_focused_layer_returns_focus_to_primary() {
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();
        attach(&mut d, &mut sink, 1, 800, 600);
        create_toplevel(&mut d, &mut sink, 7);
        map(&mut d, &mut sink, 7);
        create_layer(&mut d, &mut sink, 50, Tier::Overlay, None);
        map(&mut d, &mut sink, 50);
        sink.clear();

        d.handle(&mut sink, EngineEvent::SurfaceUnmapped { surface: SurfaceId(50) });

        assert_eq!(d.seat().pointer_focus(), Some(SurfaceId(7)));
        assert!(matches!(
            sink.as_slice(),
            [
                Command::Damage { full: true, .. },
                Command::ClearPointerFocus,
                Command::PointerEnter { surface: SurfaceId(7), .. },
            ]
        ));
    }

    #[test]
    fn test_events_for_unknown_surfaces_are_ignored() {
        let mut d = Dispatcher::new(KeyboardRepeat::default());
        let mut sink: Vec<Command> = Vec::new();
        attach(&mut d, &mut sink, 1, 800, 600);
        sink.clear();

        for event in [
            EngineEvent::SurfaceCommitted { surface: SurfaceId(99), layer_state: None },
            EngineEvent::SurfaceMapped { surface: SurfaceId(99) },
            EngineEvent::SurfaceUnmapped { surface: SurfaceId(99) },
            EngineEvent::SurfaceDestroyed { surface: SurfaceId(99) },
        ] {
            d.handle(&mut sink, event);
        }

        assert!(sink.is_empty());
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_input_devices_update_capabilities() {
        let mut d = Dispatcher::new(KeyboardRepeat { rate: 40, delay_ms: 200 });
        let mut sink: Vec<Command> = Vec::new();

        d.handle(
            &mut sink,
            EngineEvent::InputDeviceAttached(InputDevice::new(DeviceId(1), "kbd", DeviceKind::Keyboard)),
        );
        d.handle(
            &mut sink,
            EngineEvent::InputDeviceAttached(InputDevice::new(DeviceId(2), "touch", DeviceKind::Touch)),
        );

        assert_eq!(d.seat().capabilities(), Capabilities::KEYBOARD);
        assert_eq!(
            sink,
            vec![
                Command::ConfigureKeyboard {
                    device: DeviceId(1),
                    repeat: KeyboardRepeat { rate: 40, delay_ms: 200 }
                },
                Command::SetCapabilities(Capabilities::KEYBOARD),
            ]
        );
    }
}

//! Behavioural properties of the desktop model exercised through the public API.

use kiosk_core::{
    Anchor, Command, Desktop, FocusRouter, LayerSurface, LayerSurfaceState, MotionOutcome,
    OutputId, PrimaryView, Seat, Size, SurfaceId, SurfaceRef, Tier,
};

fn attach(desktop: &mut Desktop, id: u64, width: u32, height: u32) {
    desktop
        .outputs
        .add_output(OutputId(id), format!("HEADLESS-{id}"), width, height)
        .unwrap();
    desktop.layers.add_output(OutputId(id));
}

fn add_layer(desktop: &mut Desktop, output: u64, id: u64, tier: Tier) {
    let mut sink: Vec<Command> = Vec::new();
    let state = LayerSurfaceState {
        tier,
        anchor: Anchor::all(),
        ..Default::default()
    };
    let size = desktop.output_size(OutputId(output)).unwrap();
    desktop
        .layers
        .insert(OutputId(output), LayerSurface::new(SurfaceId(id), "test", state), tier)
        .unwrap();
    desktop.layers.configure(&mut sink, SurfaceId(id), size).unwrap();
    desktop.layers.map(&mut sink, SurfaceId(id)).unwrap();
}

// ── Output placement ──────────────────────────────────────────────────────────

#[test]
fn test_three_outputs_are_placed_left_to_right_without_gaps() {
    // Arrange
    let mut desktop = Desktop::new();

    // Act
    attach(&mut desktop, 1, 1920, 1080);
    attach(&mut desktop, 2, 1280, 1024);
    attach(&mut desktop, 3, 800, 600);

    // Assert
    let outputs: Vec<_> = desktop.outputs.iter().collect();
    assert_eq!(outputs.len(), 3);
    assert_eq!(outputs[0].region.x, 0);
    for pair in outputs.windows(2) {
        assert_eq!(pair[0].region.right(), pair[1].region.x, "no gap between outputs");
        assert!(!pair[0].region.overlaps(&pair[1].region));
    }
    for output in &outputs {
        let cx = f64::from(output.region.x) + f64::from(output.region.width) / 2.0;
        let cy = f64::from(output.region.height) / 2.0;
        assert_eq!(desktop.outputs.resolve(cx, cy), Some(output.id));
    }
}

#[test]
fn test_placed_outputs_never_overlap_after_removal_and_mode_change() {
    let mut desktop = Desktop::new();
    for id in 1..=5 {
        attach(&mut desktop, id, 640 + id as u32 * 100, 480);
    }

    desktop.outputs.remove_output(OutputId(2)).unwrap();
    desktop.outputs.set_mode(OutputId(4), 3000, 2000).unwrap();
    desktop.outputs.remove_output(OutputId(1)).unwrap();

    let outputs: Vec<_> = desktop.outputs.iter().collect();
    for (i, a) in outputs.iter().enumerate() {
        for b in &outputs[i + 1..] {
            assert!(!a.region.overlaps(&b.region), "{:?} overlaps {:?}", a.id, b.id);
        }
    }
    assert_eq!(desktop.outputs.primary(), Some(OutputId(3)));
    assert_eq!(outputs[0].region.x, 0);
}

// ── Hit testing ───────────────────────────────────────────────────────────────

#[test]
fn test_hit_test_stacking_across_outputs() {
    // Arrange
    let mut desktop = Desktop::new();
    attach(&mut desktop, 1, 800, 600);
    attach(&mut desktop, 2, 800, 600);
    desktop.primary = Some(PrimaryView {
        surface: SurfaceId(1),
        output: Some(OutputId(1)),
        mapped: true,
    });
    add_layer(&mut desktop, 1, 10, Tier::Background);
    add_layer(&mut desktop, 2, 20, Tier::Top);
    add_layer(&mut desktop, 2, 21, Tier::Top);

    // Act / Assert
    assert_eq!(
        desktop.surface_at(100.0, 100.0).map(|h| h.surface),
        Some(SurfaceRef::Primary(SurfaceId(1))),
        "primary covers the background layer"
    );
    assert_eq!(
        desktop.surface_at(900.0, 100.0).map(|h| h.surface),
        Some(SurfaceRef::Layer(SurfaceId(21))),
        "newest surface of a tier wins"
    );
    assert_eq!(desktop.surface_at(1700.0, 100.0), None);
}

// ── Output removal ────────────────────────────────────────────────────────────

#[test]
fn test_removing_output_detaches_and_closes_layers_in_different_tiers() {
    // Arrange
    let mut desktop = Desktop::new();
    attach(&mut desktop, 1, 800, 600);
    add_layer(&mut desktop, 1, 10, Tier::Bottom);
    add_layer(&mut desktop, 1, 11, Tier::Overlay);
    let mut sink: Vec<Command> = Vec::new();

    // Act
    let detached = desktop.layers.remove_output(&mut sink, OutputId(1));
    desktop.outputs.remove_output(OutputId(1)).unwrap();

    // Assert
    assert_eq!(detached.len(), 2);
    for id in [SurfaceId(10), SurfaceId(11)] {
        let surface = desktop.layers.get(id).expect("still allocated");
        assert_eq!(surface.output, None);
        assert!(sink.contains(&Command::CloseSurface { surface: id }));
    }
    assert_eq!(desktop.surface_at(10.0, 10.0), None);
}

// ── Focus routing ─────────────────────────────────────────────────────────────

#[test]
fn test_route_motion_sequence_enter_then_motion_then_enter_on_change() {
    // Arrange: primary on output 1, overlay covering output 2.
    let mut desktop = Desktop::new();
    attach(&mut desktop, 1, 800, 600);
    attach(&mut desktop, 2, 800, 600);
    desktop.primary = Some(PrimaryView {
        surface: SurfaceId(1),
        output: Some(OutputId(1)),
        mapped: true,
    });
    add_layer(&mut desktop, 2, 30, Tier::Overlay);
    let mut seat = Seat::default();
    let mut sink: Vec<Command> = Vec::new();

    // Act
    let moves = [
        (10.0, 10.0, 1),
        (20.0, 10.0, 2),
        (30.0, 10.0, 3),
        (810.0, 10.0, 4),
        (820.0, 10.0, 5),
        (5000.0, 10.0, 6),
    ];
    let outcomes: Vec<MotionOutcome> = moves
        .iter()
        .map(|&(x, y, t)| FocusRouter::route_motion(&mut seat, &desktop, &mut sink, x, y, t))
        .collect();

    // Assert
    assert_eq!(
        outcomes,
        vec![
            MotionOutcome::Entered(SurfaceRef::Primary(SurfaceId(1))),
            MotionOutcome::Moved(SurfaceRef::Primary(SurfaceId(1))),
            MotionOutcome::Moved(SurfaceRef::Primary(SurfaceId(1))),
            MotionOutcome::Entered(SurfaceRef::Layer(SurfaceId(30))),
            MotionOutcome::Moved(SurfaceRef::Layer(SurfaceId(30))),
            MotionOutcome::Cleared,
        ]
    );
    // One command per event, never an enter and a motion together.
    assert_eq!(sink.len(), moves.len());
    assert!(matches!(sink[0], Command::PointerEnter { .. }));
    assert!(matches!(sink[3], Command::PointerEnter { sx, .. } if sx == 10.0));
}

#[test]
fn test_primary_view_fills_output_it_is_assigned_to() {
    let mut desktop = Desktop::new();
    attach(&mut desktop, 1, 1024, 768);
    desktop.primary = Some(PrimaryView::new(SurfaceId(1), Some(OutputId(1))));

    // Not mapped yet.
    assert_eq!(desktop.surface_at(1.0, 1.0), None);

    if let Some(p) = desktop.primary.as_mut() {
        p.mapped = true;
    }
    let hit = desktop.surface_at(1023.5, 767.5).unwrap();
    assert_eq!(hit.surface, SurfaceRef::Primary(SurfaceId(1)));
    assert_eq!(desktop.output_size(OutputId(1)), Some(Size::new(1024, 768)));
}

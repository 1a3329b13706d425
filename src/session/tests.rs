//! Unit and property tests for the editing session.

use proptest::prelude::*;

use super::*;
use crate::mask::{MAX_RADIUS, MIN_RADIUS, SolidFill, SubstituteImage};

fn disc(id: &str, x: f32, y: f32, radius: f32) -> MaskRegion {
    MaskRegion::new(RegionId::new(id), Point::new(x, y), radius, FillMode::default())
}

fn session_with(regions: Vec<MaskRegion>) -> EditingSession {
    EditingSession::new(regions, 1000, 800)
}

fn region<'a>(session: &'a EditingSession, id: &str) -> &'a MaskRegion {
    session
        .current_regions()
        .iter()
        .find(|r| r.id().as_str() == id)
        .expect("region exists")
}

#[test]
fn test_initial_state_is_idle_without_selection() {
    let session = session_with(vec![disc("face-0", 500.0, 400.0, 80.0)]);
    assert_eq!(session.mode(), InteractionMode::Idle);
    assert!(session.selected().is_none());
}

#[test]
fn test_drag_keeps_anchor_offset() {
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0)]);

    session.pointer_down(Point::new(110.0, 95.0));
    assert_eq!(session.selected().map(RegionId::as_str), Some("a"));
    assert!(matches!(session.mode(), InteractionMode::Dragging { .. }));

    session.pointer_move(Point::new(210.0, 195.0));
    assert_eq!(region(&session, "a").center, Point::new(200.0, 200.0));

    session.pointer_up();
    assert_eq!(session.mode(), InteractionMode::Idle);
    assert_eq!(session.selected().map(RegionId::as_str), Some("a"));
}

#[test]
fn test_resting_pointer_keeps_revision() {
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0)]);
    session.pointer_down(Point::new(100.0, 100.0));
    session.pointer_move(Point::new(120.0, 100.0));
    let revision = session.revision();

    session.pointer_move(Point::new(120.0, 100.0));
    session.pointer_move(Point::new(120.0, 100.0));
    assert_eq!(session.revision(), revision);

    session.pointer_move(Point::new(121.0, 100.0));
    assert_ne!(session.revision(), revision);
}

#[test]
fn test_click_on_empty_space_clears_selection() {
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0)]);
    session.pointer_down(Point::new(100.0, 100.0));
    session.pointer_up();

    session.pointer_down(Point::new(600.0, 600.0));
    assert!(session.selected().is_none());
    assert_eq!(session.mode(), InteractionMode::Idle);
}

#[test]
fn test_handle_takes_priority_over_bodies() {
    // "b" overlaps the handle of "a"
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0), disc("b", 150.0, 100.0, 30.0)]);
    session.pointer_down(Point::new(80.0, 100.0));
    session.pointer_up();
    assert_eq!(session.selected().map(RegionId::as_str), Some("a"));

    session.pointer_down(Point::new(140.0, 100.0));
    assert!(matches!(session.mode(), InteractionMode::Resizing { .. }));
    assert_eq!(session.selected().map(RegionId::as_str), Some("a"));

    session.pointer_move(Point::new(160.0, 100.0));
    assert!((region(&session, "a").radius() - 60.0).abs() < 1e-4);
}

#[test]
fn test_handle_of_unselected_region_is_ignored() {
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0)]);
    // Just outside the disc, on the handle
    session.pointer_down(Point::new(144.0, 100.0));
    assert!(session.selected().is_none());
    assert_eq!(session.mode(), InteractionMode::Idle);
}

#[test]
fn test_resize_clamps() {
    let mut session = session_with(vec![disc("a", 300.0, 300.0, 50.0)]);
    session.pointer_down(Point::new(300.0, 300.0));
    session.pointer_up();

    session.pointer_down(Point::new(350.0, 300.0));
    session.pointer_move(Point::new(302.0, 300.0));
    assert_eq!(region(&session, "a").radius(), MIN_RADIUS);

    session.pointer_move(Point::new(900.0, 300.0));
    assert_eq!(region(&session, "a").radius(), MAX_RADIUS);
    session.pointer_leave();
    assert_eq!(session.mode(), InteractionMode::Idle);
}

#[test]
fn test_overlapping_hit_selects_most_recent() {
    let mut session = session_with(vec![disc("old", 200.0, 200.0, 60.0), disc("new", 220.0, 200.0, 60.0)]);
    session.pointer_down(Point::new(210.0, 200.0));
    assert_eq!(session.selected().map(RegionId::as_str), Some("new"));
}

#[test]
fn test_wheel_scales_and_selects() {
    let mut session = session_with(vec![disc("a", 200.0, 200.0, 100.0)]);

    session.wheel(Point::new(200.0, 200.0), WheelStep::Shrink);
    assert!((region(&session, "a").radius() - 90.0).abs() < 1e-3);
    assert_eq!(session.selected().map(RegionId::as_str), Some("a"));

    session.wheel(Point::new(200.0, 200.0), WheelStep::Grow);
    assert!((region(&session, "a").radius() - 99.0).abs() < 1e-3);
}

#[test]
fn test_wheel_over_empty_space_is_noop() {
    let mut session = session_with(vec![disc("a", 200.0, 200.0, 100.0)]);
    let revision = session.revision();
    session.wheel(Point::new(900.0, 700.0), WheelStep::Grow);
    assert_eq!(session.revision(), revision);
    assert!(session.selected().is_none());
    assert!(!session.can_undo());
}

#[test]
fn test_context_menu_adds_inside_bounds_only() {
    let mut session = session_with(vec![]);

    let id = session.context_menu(Point::new(1000.0, 800.0)).expect("corner is inside");
    assert_eq!(session.selected(), Some(&id));
    assert_eq!(session.current_regions().len(), 1);
    assert_eq!(session.current_regions()[0].radius(), DEFAULT_RADIUS);

    assert!(session.context_menu(Point::new(1000.5, 10.0)).is_none());
    assert!(session.context_menu(Point::new(-1.0, 10.0)).is_none());
    assert_eq!(session.current_regions().len(), 1);
}

#[test]
fn test_new_regions_use_default_fill() {
    let mut session = session_with(vec![]);
    let fill = FillMode::SolidColor(SolidFill {
        color: image::Rgba([0, 0, 0, 255]),
        outline: None,
    });
    session.set_default_fill(fill.clone(), false);

    let id = session.context_menu(Point::new(10.0, 10.0)).unwrap();
    assert_eq!(session.current_regions()[0].fill, fill);
    assert_eq!(session.selected(), Some(&id));
}

#[test]
fn test_delete_selected_clears_selection() {
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0), disc("b", 400.0, 400.0, 40.0)]);
    session.pointer_down(Point::new(100.0, 100.0));
    session.pointer_up();

    session.press_key(KeyPress::Delete);
    assert!(session.selected().is_none());
    assert_eq!(session.current_regions().len(), 1);
    assert_eq!(session.mode(), InteractionMode::Idle);
}

#[test]
fn test_delete_mid_drag_returns_to_idle() {
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0)]);
    session.pointer_down(Point::new(100.0, 100.0));
    session.pointer_move(Point::new(120.0, 100.0));

    session.press_key(KeyPress::Backspace);
    assert_eq!(session.mode(), InteractionMode::Idle);
    assert!(session.current_regions().is_empty());
}

#[test]
fn test_deleting_unselected_region_keeps_selection() {
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0), disc("b", 400.0, 400.0, 40.0)]);
    session.pointer_down(Point::new(100.0, 100.0));
    session.pointer_up();

    assert!(session.remove_region(&RegionId::new("b")));
    assert_eq!(session.selected().map(RegionId::as_str), Some("a"));
    assert!(!session.remove_region(&RegionId::new("b")));
}

#[test]
fn test_delete_without_selection_is_noop() {
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0)]);
    assert!(!session.delete_selected());
    assert_eq!(session.current_regions().len(), 1);
}

#[test]
fn test_escape_clears_selection() {
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0)]);
    session.pointer_down(Point::new(100.0, 100.0));
    session.press_key(KeyPress::Escape);
    assert!(session.selected().is_none());
    assert_eq!(session.mode(), InteractionMode::Idle);
    assert_eq!(session.current_regions().len(), 1);
}

#[test]
fn test_dispatch_maps_display_space() {
    // 1000x800 fits to 750x600
    let mut session = session_with(vec![disc("a", 500.0, 400.0, 80.0)]);
    session.dispatch(InputEvent::PointerDown(Point::new(375.0, 300.0)));
    assert_eq!(session.selected().map(RegionId::as_str), Some("a"));

    session.dispatch(InputEvent::PointerMove(Point::new(450.0, 300.0)));
    session.dispatch(InputEvent::PointerUp);
    assert!(region(&session, "a").center.distance(Point::new(600.0, 400.0)) < 1e-3);

    session.mapper_mut().set_rendered_size(500.0, 400.0);
    session.dispatch(InputEvent::ContextMenu(Point::new(50.0, 50.0)));
    assert_eq!(session.current_regions()[1].center, Point::new(100.0, 100.0));
}

#[test]
fn test_undo_redo_move() {
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0)]);
    session.pointer_down(Point::new(100.0, 100.0));
    session.pointer_move(Point::new(150.0, 100.0));
    session.pointer_up();

    assert!(session.undo());
    assert_eq!(region(&session, "a").center, Point::new(100.0, 100.0));
    assert!(session.redo());
    assert_eq!(region(&session, "a").center, Point::new(150.0, 100.0));
}

#[test]
fn test_click_without_motion_records_nothing() {
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0)]);
    session.pointer_down(Point::new(100.0, 100.0));
    session.pointer_up();
    assert!(!session.can_undo());
}

#[test]
fn test_undo_add_clears_selection() {
    let mut session = session_with(vec![]);
    session.context_menu(Point::new(10.0, 10.0));

    assert!(session.undo());
    assert!(session.current_regions().is_empty());
    assert!(session.selected().is_none());

    assert!(session.redo());
    assert_eq!(session.current_regions().len(), 1);
}

#[test]
fn test_undo_delete_restores_paint_order() {
    let mut session = session_with(vec![
        disc("a", 100.0, 100.0, 20.0),
        disc("b", 300.0, 100.0, 20.0),
        disc("c", 500.0, 100.0, 20.0),
    ]);
    session.pointer_down(Point::new(300.0, 100.0));
    session.pointer_up();
    session.press_key(KeyPress::Delete);

    session.press_key(KeyPress::Undo);
    let ids: Vec<&str> = session.current_regions().iter().map(|r| r.id().as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    session.press_key(KeyPress::Redo);
    assert_eq!(session.current_regions().len(), 2);
}

#[test]
fn test_undo_resize_restores_unclamped_detector_radius() {
    let mut session = session_with(vec![disc("face-0", 100.0, 100.0, 4.0)]);
    session.wheel(Point::new(100.0, 100.0), WheelStep::Grow);
    assert_eq!(region(&session, "face-0").radius(), MIN_RADIUS);

    session.undo();
    assert_eq!(region(&session, "face-0").radius(), 4.0);
}

#[test]
fn test_undo_ignored_while_dragging() {
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0)]);
    session.context_menu(Point::new(500.0, 500.0));
    session.pointer_down(Point::new(100.0, 100.0));
    assert!(!session.undo());
    assert_eq!(session.current_regions().len(), 2);
}

#[test]
fn test_new_edit_clears_redo() {
    let mut session = session_with(vec![]);
    session.context_menu(Point::new(10.0, 10.0));
    session.undo();
    assert!(session.can_redo());

    session.context_menu(Point::new(20.0, 20.0));
    assert!(!session.can_redo());
}

#[test]
fn test_ids_are_not_reused_after_delete() {
    let mut session = session_with(vec![]);
    let first = session.context_menu(Point::new(10.0, 10.0)).unwrap();
    session.delete_selected();
    let second = session.context_menu(Point::new(10.0, 10.0)).unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_global_fill_switch_is_one_undo_step() {
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0), disc("b", 300.0, 300.0, 40.0)]);
    let substitute = FillMode::SubstituteImage(SubstituteImage::new(image::RgbaImage::new(4, 4), None));

    session.set_default_fill(substitute.clone(), true);
    assert!(session.current_regions().iter().all(|r| r.fill == substitute));
    assert_eq!(session.default_fill(), &substitute);
    assert_eq!(session.history().undo_count(), 1);

    session.undo();
    assert!(session.current_regions().iter().all(|r| r.fill == FillMode::default()));
    assert_eq!(session.default_fill(), &FillMode::default());
}

#[test]
fn test_set_region_fill() {
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0)]);
    let substitute = FillMode::SubstituteImage(SubstituteImage::new(image::RgbaImage::new(2, 2), None));
    assert!(session.set_region_fill(&RegionId::new("a"), substitute.clone()));
    assert_eq!(region(&session, "a").fill, substitute);
    assert!(!session.set_region_fill(&RegionId::new("zzz"), FillMode::default()));
}

#[test]
fn test_history_is_capped() {
    let mut session = session_with(vec![disc("a", 500.0, 400.0, 100.0)]);
    for i in 0..150 {
        let step = if i % 2 == 0 { WheelStep::Grow } else { WheelStep::Shrink };
        session.wheel(Point::new(500.0, 400.0), step);
    }
    assert_eq!(session.history().undo_count(), MAX_HISTORY_SIZE);
}

#[test]
fn test_keyboard_subscription_lifecycle() {
    let hub = KeyboardHub::new();
    let mut session = session_with(vec![disc("a", 100.0, 100.0, 40.0)]);
    session.attach_keyboard(&hub);
    assert!(session.is_keyboard_attached());

    session.pointer_down(Point::new(100.0, 100.0));
    session.pointer_up();
    hub.publish(KeyPress::Delete);
    assert_eq!(session.process_keyboard(), 1);
    assert!(session.current_regions().is_empty());

    session.detach_keyboard();
    assert_eq!(hub.subscriber_count(), 0);
    hub.publish(KeyPress::Undo);
    assert_eq!(session.process_keyboard(), 0);
}

#[test]
fn test_dropping_session_unsubscribes() {
    let hub = KeyboardHub::new();
    {
        let mut session = session_with(vec![]);
        session.attach_keyboard(&hub);
        assert_eq!(hub.subscriber_count(), 1);
    }
    assert_eq!(hub.subscriber_count(), 0);
}

#[derive(Debug, Clone)]
enum Op {
    Down(f32, f32),
    Move(f32, f32),
    Up,
    Wheel(f32, f32, bool),
    Add(f32, f32),
    Delete,
    Undo,
    Redo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let coord = || -50.0f32..1050.0;
    prop_oneof![
        (coord(), coord()).prop_map(|(x, y)| Op::Down(x, y)),
        (coord(), coord()).prop_map(|(x, y)| Op::Move(x, y)),
        Just(Op::Up),
        (coord(), coord(), any::<bool>()).prop_map(|(x, y, g)| Op::Wheel(x, y, g)),
        (coord(), coord()).prop_map(|(x, y)| Op::Add(x, y)),
        Just(Op::Delete),
        Just(Op::Undo),
        Just(Op::Redo),
    ]
}

proptest! {
    #[test]
    fn prop_session_invariants_hold(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut session = session_with(vec![disc("a", 300.0, 300.0, 50.0), disc("b", 600.0, 400.0, 120.0)]);

        for op in ops {
            match op {
                Op::Down(x, y) => session.pointer_down(Point::new(x, y)),
                Op::Move(x, y) => session.pointer_move(Point::new(x, y)),
                Op::Up => session.pointer_up(),
                Op::Wheel(x, y, grow) => {
                    let step = if grow { WheelStep::Grow } else { WheelStep::Shrink };
                    session.wheel(Point::new(x, y), step);
                }
                Op::Add(x, y) => { session.context_menu(Point::new(x, y)); }
                Op::Delete => { session.delete_selected(); }
                Op::Undo => { session.undo(); }
                Op::Redo => { session.redo(); }
            }

            // Dragging/Resizing imply a live selection
            if session.mode() != InteractionMode::Idle {
                prop_assert!(session.selected_region().is_some());
            }
            // Selection always refers to an existing region
            if let Some(id) = session.selected() {
                prop_assert!(session.current_regions().iter().any(|r| r.id() == id));
            }
            for region in session.current_regions() {
                prop_assert!(region.radius() >= MIN_RADIUS && region.radius() <= MAX_RADIUS);
            }
            // Ids are unique
            let ids: std::collections::HashSet<_> = session.current_regions().iter().map(|r| r.id().clone()).collect();
            prop_assert_eq!(ids.len(), session.current_regions().len());
        }
    }

    #[test]
    fn prop_handle_resize_stays_in_bounds(distances in prop::collection::vec(0.0f32..2000.0, 1..40)) {
        let mut session = session_with(vec![disc("a", 500.0, 400.0, 50.0)]);
        session.pointer_down(Point::new(500.0, 400.0));
        session.pointer_up();
        session.pointer_down(Point::new(550.0, 400.0));
        let resizing = matches!(session.mode(), InteractionMode::Resizing { .. });
        prop_assert!(resizing);

        for d in distances {
            session.pointer_move(Point::new(500.0 + d, 400.0));
            let radius = session.selected_region().map(MaskRegion::radius).unwrap_or_default();
            prop_assert!((MIN_RADIUS..=MAX_RADIUS).contains(&radius));
        }
    }
}

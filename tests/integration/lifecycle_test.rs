//! Decoration lifecycle: registry population from the command event
//! stream, placeholder replacement, invalidation, and rebinding.

use std::rc::Rc;

use termdeco::{CommandRecord, Decoration, InvalidationReason, Marker};

use crate::helpers::{finished_command, running_command, Fixture};

// ============================================================================
// Binding and history replay
// ============================================================================

#[test]
fn activate_replays_finished_history() {
    let fixture = Fixture::activated();
    // Seeded after activation would be too late for replay; rebuild the
    // fixture with pre-attach history instead.
    let fixture = {
        fixture.capability.push_history(finished_command(1, 1, "ls", 0));
        fixture.capability.push_history(finished_command(2, 3, "make", 2));
        // Re-attach so bind replays the seeded history.
        fixture.capabilities.remove_command_detection();
        fixture.capabilities.set_command_detection(
            Rc::clone(&fixture.capability) as Rc<dyn termdeco::CommandDetection>
        );
        fixture
    };

    assert_eq!(fixture.addon.decoration_count(), 2);
    assert!(!fixture.addon.has_placeholder());

    fixture.surface.render_all();
    let decoration = fixture.surface.decoration_for(2).unwrap();
    let element = decoration.element().unwrap();
    assert!(element.has_class("terminal-command-decoration"));
    assert!(element.has_class("error"));
}

#[test]
fn bind_creates_placeholder_for_executing_command() {
    let fixture = Fixture::activated();
    fixture.capability.set_executing(running_command(7, 4, "sleep 10"));
    fixture.capabilities.remove_command_detection();
    fixture.capabilities.set_command_detection(
        Rc::clone(&fixture.capability) as Rc<dyn termdeco::CommandDetection>
    );

    assert!(fixture.addon.has_placeholder());
    assert_eq!(fixture.addon.decoration_count(), 0);
}

#[test]
fn capability_added_later_binds_lazily() {
    let fixture = Fixture::activated();
    fixture.capabilities.remove_command_detection();
    assert!(!fixture.addon.is_bound());

    fixture.capability.push_history(finished_command(1, 1, "ls", 0));
    fixture.capabilities.set_command_detection(
        Rc::clone(&fixture.capability) as Rc<dyn termdeco::CommandDetection>
    );

    assert!(fixture.addon.is_bound());
    assert_eq!(fixture.addon.decoration_count(), 1);
}

#[test]
fn capability_removal_unbinds_all_subscriptions() {
    let fixture = Fixture::activated();
    assert_eq!(fixture.capability.started_listeners(), 1);
    assert_eq!(fixture.capability.finished_listeners(), 1);

    fixture.capabilities.remove_command_detection();

    assert!(!fixture.addon.is_bound());
    assert_eq!(fixture.capability.started_listeners(), 0);
    assert_eq!(fixture.capability.finished_listeners(), 0);
    assert_eq!(fixture.capability.invalidated_listeners(), 0);
    assert_eq!(fixture.capability.current_invalidated_listeners(), 0);
}

#[test]
fn rebinding_never_duplicates_subscriptions() {
    let fixture = Fixture::activated();

    // Detach and re-attach the capability twice.
    for _ in 0..2 {
        fixture.capabilities.remove_command_detection();
        fixture.capabilities.set_command_detection(
            Rc::clone(&fixture.capability) as Rc<dyn termdeco::CommandDetection>
        );
    }

    assert_eq!(fixture.capability.started_listeners(), 1);
    assert_eq!(fixture.capability.finished_listeners(), 1);
    assert_eq!(fixture.capability.invalidated_listeners(), 1);
    assert_eq!(fixture.capability.current_invalidated_listeners(), 1);

    // A single upstream event produces exactly one decoration.
    fixture.capability.finish_command(finished_command(9, 2, "ls", 0));
    assert_eq!(fixture.addon.decoration_count(), 1);
    assert_eq!(fixture.surface.live().len(), 1);
}

// ============================================================================
// Placeholder lifecycle
// ============================================================================

#[test]
fn command_started_creates_placeholder() {
    let fixture = Fixture::activated();
    fixture.capability.start_command(running_command(1, 0, "make"));

    assert!(fixture.addon.has_placeholder());
    assert_eq!(fixture.addon.decoration_count(), 0);
}

#[test]
fn new_command_replaces_prior_placeholder() {
    let fixture = Fixture::activated();
    fixture.capability.start_command(running_command(1, 0, "first"));
    fixture.capability.start_command(running_command(2, 1, "second"));

    assert!(fixture.addon.has_placeholder());
    // The first placeholder's surface decoration was disposed.
    let first = fixture.surface.all().into_iter().find(|d| d.marker_id() == 1);
    assert!(first.unwrap().is_disposed());
    assert_eq!(fixture.surface.live().len(), 1);
}

#[test]
fn finish_supersedes_the_commands_own_placeholder() {
    let fixture = Fixture::activated();
    let marker = Marker::new(5, 2);
    fixture
        .capability
        .start_command(Rc::new(CommandRecord::new("cargo test", Some(Rc::clone(&marker)))));
    assert!(fixture.addon.has_placeholder());

    fixture.capability.finish_command(Rc::new(
        CommandRecord::new("cargo test", Some(marker)).with_exit_code(0),
    ));

    assert!(!fixture.addon.has_placeholder());
    assert_eq!(fixture.addon.decoration_count(), 1);
}

#[test]
fn generic_mark_never_gets_a_placeholder() {
    let fixture = Fixture::activated();
    let mark = Rc::new(
        CommandRecord::new("", Some(Marker::new(3, 1)))
            .with_generic_mark(termdeco::GenericMarkProperties::default()),
    );
    let result = fixture.addon.register_command_decoration(&mark, true);
    assert!(matches!(result, Ok(None)));
    assert!(!fixture.addon.has_placeholder());

    // As a final decoration it registers fine.
    let result = fixture.addon.register_command_decoration(&mark, false);
    assert!(matches!(result, Ok(Some(3))));
}

// ============================================================================
// Invalidation
// ============================================================================

#[test]
fn batch_invalidation_removes_by_marker() {
    let fixture = Fixture::activated();
    let a = finished_command(1, 1, "a", 0);
    let b = finished_command(2, 2, "b", 0);
    fixture.capability.finish_command(Rc::clone(&a));
    fixture.capability.finish_command(Rc::clone(&b));
    assert_eq!(fixture.addon.decoration_count(), 2);

    fixture.capability.invalidate(vec![a]);

    assert_eq!(fixture.addon.decoration_ids(), vec![2]);
    // Removing an already-removed marker is a no-op.
    fixture.capability.invalidate(vec![b.clone(), b]);
    assert_eq!(fixture.addon.decoration_count(), 0);
}

#[test]
fn no_problems_reported_drops_lone_placeholder() {
    let fixture = Fixture::activated();
    fixture.capability.start_command(running_command(1, 0, ""));
    assert!(fixture.addon.has_placeholder());

    fixture
        .capability
        .invalidate_current(InvalidationReason::NoProblemsReported);

    assert!(!fixture.addon.has_placeholder());
    assert_eq!(fixture.addon.decoration_count(), 0);
}

#[test]
fn no_problems_reported_drops_most_recent_entry() {
    let fixture = Fixture::activated();
    fixture.capability.finish_command(finished_command(1, 1, "a", 0));
    fixture.capability.finish_command(finished_command(2, 2, "b", 0));

    fixture
        .capability
        .invalidate_current(InvalidationReason::NoProblemsReported);

    assert_eq!(fixture.addon.decoration_ids(), vec![1]);
}

#[test]
fn host_redraw_drops_only_the_placeholder() {
    let fixture = Fixture::activated();
    fixture.capability.finish_command(finished_command(1, 1, "a", 0));
    fixture.capability.start_command(running_command(2, 2, "b"));

    fixture
        .capability
        .invalidate_current(InvalidationReason::HostRedraw);

    assert!(!fixture.addon.has_placeholder());
    assert_eq!(fixture.addon.decoration_ids(), vec![1]);
}

// ============================================================================
// Contract violations and expected absences
// ============================================================================

#[test]
fn final_decoration_without_marker_is_an_error() {
    let fixture = Fixture::activated();
    let markerless = Rc::new(CommandRecord::new("ghost", None).with_exit_code(0));

    let result = fixture.addon.register_command_decoration(&markerless, false);
    assert!(result.is_err());
}

#[test]
fn placeholder_without_marker_is_an_expected_absence() {
    let fixture = Fixture::activated();
    let markerless = Rc::new(CommandRecord::new("early", None));

    let result = fixture.addon.register_command_decoration(&markerless, true);
    assert!(matches!(result, Ok(None)));
}

#[test]
fn registration_is_idempotent_per_marker() {
    let fixture = Fixture::activated();
    let command = finished_command(4, 2, "ls", 0);

    let first = fixture.addon.register_command_decoration(&command, false);
    let second = fixture.addon.register_command_decoration(&command, false);

    assert!(matches!(first, Ok(Some(4))));
    assert!(matches!(second, Ok(Some(4))));
    assert_eq!(fixture.addon.decoration_count(), 1);
    assert_eq!(fixture.surface.live().len(), 1);
}

// ============================================================================
// Render-callback wiring
// ============================================================================

#[test]
fn render_wiring_is_idempotent_per_element() {
    let fixture = Fixture::activated();
    fixture.capability.finish_command(finished_command(1, 3, "ls", 0));

    let decoration = fixture.surface.decoration_for(1).unwrap();
    let element = decoration.render();
    // Two handlers: hover and context menu.
    assert_eq!(element.pointer_events().listener_count(), 2);

    // A repaint of the same element must not wire handlers again.
    decoration.render_again();
    assert_eq!(element.pointer_events().listener_count(), 2);
}

#[test]
fn redraw_with_fresh_element_rewires() {
    let fixture = Fixture::activated();
    fixture.capability.finish_command(finished_command(1, 3, "make", 2));

    let decoration = fixture.surface.decoration_for(1).unwrap();
    let first = decoration.render();
    assert!(first.has_class("error"));

    // Buffer-clearing redraw: the surface hands out a new element.
    let second = decoration.render();
    assert!(second.has_class("error"));
    assert_eq!(second.pointer_events().listener_count(), 2);
    assert!(second.geometry().is_some());
}

#[test]
fn render_after_removal_is_ignored() {
    let fixture = Fixture::activated();
    let command = finished_command(1, 1, "ls", 0);
    fixture.capability.finish_command(Rc::clone(&command));
    let decoration = fixture.surface.decoration_for(1).unwrap();

    fixture.capability.invalidate(vec![command]);
    let element = decoration.render();

    // Entry is gone; nothing gets stamped or wired.
    assert!(!element.has_class("terminal-command-decoration"));
    assert_eq!(element.pointer_events().listener_count(), 0);
}

#[test]
fn host_disposed_markers_are_pruned_on_the_next_sweep() {
    let fixture = Fixture::activated();
    let marker = Marker::new(1, 2);
    fixture.capability.finish_command(Rc::new(
        CommandRecord::new("ls", Some(Rc::clone(&marker))).with_exit_code(0),
    ));
    assert_eq!(fixture.addon.decoration_count(), 1);

    // The marker's row scrolled out of the buffer; the surface disposes
    // the marker, taking the decoration with it.
    marker.dispose();
    fixture.addon.refresh_layouts();

    assert_eq!(fixture.addon.decoration_count(), 0);
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn dispose_tears_everything_down() {
    let fixture = Fixture::activated();
    fixture.capability.finish_command(finished_command(1, 1, "a", 0));
    fixture.capability.start_command(running_command(2, 2, "b"));

    fixture.addon.dispose();

    assert_eq!(fixture.addon.decoration_count(), 0);
    assert!(!fixture.addon.has_placeholder());
    assert!(fixture.surface.live().is_empty());
    assert_eq!(fixture.capability.started_listeners(), 0);
    assert_eq!(fixture.capabilities.on_capability_added().listener_count(), 0);
}

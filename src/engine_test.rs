#![allow(clippy::float_cmp)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::*;
use crate::dom::VirtualDom;
use crate::geometry::Bounds;
use crate::modifier::{Anchor, Offset, OffsetModifier};
use crate::sensor::{Button, Key, ManualSensor, PointerSensor};
use crate::strategy::{Aggregation, ClosestCorner, Collision, RectangleIntersection, closest_center};

type Ctx = &'static str;
type Log = Rc<RefCell<Vec<String>>>;

// =============================================================
// Helpers
// =============================================================

/// Document layout (document space):
///
/// - `todo_col` (0,0 200x400), droppable "todo"
///   - `card` (10,10 100x50), draggable "card-1"
///     - `handle` (20,20 10x10)
/// - `scroller` (300,0 200x400), overflow auto
///   - `done_node` (300,0 200x300), droppable "done"
struct Board {
    dom: Rc<VirtualDom>,
    engine: Engine<Ctx, Ctx>,
    todo_col: NodeId,
    card: NodeId,
    handle: NodeId,
    scroller: NodeId,
    done_node: NodeId,
    card_model: Draggable<Ctx>,
    todo: Droppable<Ctx, Ctx>,
    done: Droppable<Ctx, Ctx>,
}

fn board() -> Board {
    board_with(|builder| builder)
}

/// Capture engine logs in the test harness output.
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).with_test_writer().try_init();
}

fn board_with(configure: impl FnOnce(EngineBuilder<Ctx, Ctx>) -> EngineBuilder<Ctx, Ctx>) -> Board {
    init_tracing();
    let dom = Rc::new(VirtualDom::new());
    let todo_col = dom.create(VirtualDom::ROOT, Bounds::new(0.0, 0.0, 200.0, 400.0)).unwrap();
    let card = dom.create(todo_col, Bounds::new(10.0, 10.0, 100.0, 50.0)).unwrap();
    let handle = dom.create(card, Bounds::new(20.0, 20.0, 10.0, 10.0)).unwrap();
    let scroller = dom.create_scrollable(VirtualDom::ROOT, Bounds::new(300.0, 0.0, 200.0, 400.0)).unwrap();
    let done_node = dom.create(scroller, Bounds::new(300.0, 0.0, 200.0, 300.0)).unwrap();

    let document: Rc<dyn Document> = dom.clone();
    let engine = configure(Engine::builder(document)).build();

    let card_model = engine.draggable("card-1", "card context");
    card_model.set_node(Some(card));
    let todo = engine.droppable("todo", "todo column");
    todo.set_node(Some(todo_col));
    let done = engine.droppable("done", "done column");
    done.set_node(Some(done_node));

    Board { dom, engine, todo_col, card, handle, scroller, done_node, card_model, todo, done }
}

fn pt(x: f64, y: f64) -> Position {
    Position::new(x, y)
}

/// Pointer over the card; `todo` is the closest center.
fn over_todo() -> Position {
    pt(60.0, 35.0)
}

/// Pointer over the done column; `done` is the closest center.
fn over_done() -> Position {
    pt(390.0, 150.0)
}

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

fn strategy_fn(
    f: impl Fn(&CollisionInput<'_>) -> Vec<Collision> + 'static,
) -> impl IntersectionStrategy + 'static {
    f
}

/// Record every model-level and engine-level lifecycle event as
/// `"<source>:<event>:<id>"`.
fn record(board: &Board, log: &Log) -> Subscription {
    let mut subs = Vec::new();

    let l = Rc::clone(log);
    subs.push(board.card_model.on_drag_start(move |e| l.borrow_mut().push(format!("model:start:{}", e.id))));
    let l = Rc::clone(log);
    subs.push(board.card_model.on_drag_end(move |e| l.borrow_mut().push(format!("model:end:{}", e.id))));
    let l = Rc::clone(log);
    subs.push(board.card_model.on_drag_cancel(move |e| l.borrow_mut().push(format!("model:cancel:{}", e.id))));

    for drop in [&board.todo, &board.done] {
        let l = Rc::clone(log);
        subs.push(drop.on_drop(move |e| l.borrow_mut().push(format!("model:drop:{}", e.id))));
        let l = Rc::clone(log);
        subs.push(drop.on_drop_enter(move |e| l.borrow_mut().push(format!("model:enter:{}", e.id))));
        let l = Rc::clone(log);
        subs.push(drop.on_drop_leave(move |e| l.borrow_mut().push(format!("model:leave:{}", e.id))));
    }

    let engine = &board.engine;
    let l = Rc::clone(log);
    subs.push(engine.on_drag_start(move |e| l.borrow_mut().push(format!("engine:start:{}", e.id))));
    let l = Rc::clone(log);
    subs.push(engine.on_drag_end(move |e| l.borrow_mut().push(format!("engine:end:{}", e.id))));
    let l = Rc::clone(log);
    subs.push(engine.on_drag_cancel(move |e| l.borrow_mut().push(format!("engine:cancel:{}", e.id))));
    let l = Rc::clone(log);
    subs.push(engine.on_drop(move |e| l.borrow_mut().push(format!("engine:drop:{}", e.id))));
    let l = Rc::clone(log);
    subs.push(engine.on_drop_enter(move |e| l.borrow_mut().push(format!("engine:enter:{}", e.id))));
    let l = Rc::clone(log);
    subs.push(engine.on_drop_leave(move |e| l.borrow_mut().push(format!("engine:leave:{}", e.id))));

    Subscription::merge(subs)
}

// =============================================================
// Drag start
// =============================================================

#[test]
fn drag_start_resolves_ancestor_and_fires_once() {
    let board = board();
    let contexts = Rc::new(RefCell::new(Vec::new()));
    let c = Rc::clone(&contexts);
    let _sub = board.card_model.on_drag_start(move |e| c.borrow_mut().push(e.context));

    assert!(board.engine.drag_start(board.handle, over_todo()));

    assert_eq!(board.engine.dragging().map(|d| d.id().to_string()), Some(String::from("card-1")));
    assert!(board.card_model.is_active());
    assert_eq!(board.engine.phase(), Phase::Dragging);
    assert_eq!(*contexts.borrow(), vec!["card context"]);
}

#[test]
fn model_listeners_fire_before_engine_listeners() {
    let board = board();
    let log = new_log();
    let _rec = record(&board, &log);
    board.engine.drag_start(board.card, over_todo());
    assert_eq!(entries(&log), vec!["model:start:card-1", "engine:start:card-1"]);
}

#[test]
fn drag_start_on_unregistered_node_stays_idle() {
    let board = board();
    assert!(!board.engine.drag_start(board.scroller, over_done()));
    assert!(!board.engine.is_dragging());
    assert_eq!(board.engine.phase(), Phase::Idle);
}

#[test]
fn disabled_draggable_does_not_start() {
    let board = board();
    board.card_model.set_disabled(true);
    assert!(!board.engine.drag_start(board.handle, over_todo()));
    board.card_model.set_disabled(false);
    assert!(board.engine.drag_start(board.handle, over_todo()));
}

#[test]
fn detached_draggable_does_not_start() {
    let board = board();
    board.dom.detach(board.card).unwrap();
    assert!(!board.engine.drag_start(board.handle, over_todo()));
}

#[test]
fn activator_restricts_drag_start() {
    let board = board();
    board.card_model.set_activator_node(Some(board.handle));
    assert!(!board.engine.drag_start(board.card, over_todo()));
    assert!(board.engine.drag_start(board.handle, over_todo()));
}

#[test]
fn second_drag_start_is_ignored() {
    let board = board();
    let other = board.engine.draggable("card-2", "other");
    let node = board.dom.create(board.todo_col, Bounds::new(10.0, 100.0, 100.0, 50.0)).unwrap();
    other.set_node(Some(node));

    assert!(board.engine.drag_start(board.card, over_todo()));
    assert!(!board.engine.drag_start(node, over_todo()));
    assert_eq!(board.engine.session().dragging(), Some(String::from("card-1")));
    assert!(!other.is_active());
}

#[test]
fn drag_start_remeasures_drop_rects() {
    let board = board();
    board.dom.set_bounds(board.done_node, Bounds::new(300.0, 50.0, 200.0, 300.0)).unwrap();
    assert_eq!(board.done.rect().unwrap().top(), 0.0);

    board.engine.drag_start(board.card, over_todo());
    assert_eq!(board.done.rect().unwrap().top(), 50.0);
}

// =============================================================
// Frames and collision
// =============================================================

#[test]
fn collision_waits_for_frame() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    board.engine.move_pointer(over_done());
    assert!(board.engine.dropping().is_none());

    assert!(board.engine.frame());
    assert_eq!(board.engine.dropping().map(|d| d.id().to_string()), Some(String::from("done")));
    assert!(board.done.is_active());
    assert_eq!(board.engine.phase(), Phase::Targeting);
}

#[test]
fn collision_runs_at_most_once_per_frame() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let board = board_with(move |builder| {
        builder.strategy(strategy_fn(move |input| {
            counter.set(counter.get() + 1);
            closest_center(input)
        }))
    });

    board.engine.drag_start(board.card, over_todo());
    for step in 0..20 {
        board.engine.move_pointer(pt(60.0 + f64::from(step), 35.0));
    }
    assert!(board.engine.frame());
    assert_eq!(calls.get(), 1);

    // Nothing new since the last pass.
    assert!(!board.engine.frame());
    board.engine.move_pointer(pt(79.0, 35.0));
    assert!(!board.engine.frame());
    assert_eq!(calls.get(), 1);

    board.engine.move_pointer(pt(80.0, 35.0));
    assert!(board.engine.frame());
    assert_eq!(calls.get(), 2);
}

#[test]
fn frame_while_idle_does_nothing() {
    let board = board();
    assert!(!board.engine.move_pointer(over_done()));
    assert!(!board.engine.frame());
}

#[test]
fn leave_fires_before_enter() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    board.engine.frame();

    let log = new_log();
    let _rec = record(&board, &log);
    board.engine.move_pointer(over_done());
    board.engine.frame();

    assert_eq!(
        entries(&log),
        vec!["model:leave:todo", "engine:leave:todo", "model:enter:done", "engine:enter:done"]
    );
    assert!(!board.todo.is_active());
    assert!(board.done.is_active());
}

#[test]
fn drop_events_carry_both_contexts() {
    let board = board();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    let _sub = board.engine.on_drop_enter(move |e| s.borrow_mut().push((e.drag.context, e.context)));

    board.engine.drag_start(board.card, over_todo());
    board.engine.frame();
    assert_eq!(*seen.borrow(), vec![("card context", "todo column")]);
}

#[test]
fn disabled_drop_is_not_a_candidate() {
    let board = board();
    board.todo.set_disabled(true);
    board.engine.drag_start(board.card, over_todo());
    board.engine.frame();
    assert_eq!(board.engine.session().dropping(), Some(String::from("done")));
}

#[test]
fn disabling_the_active_drop_retargets_next_frame() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    board.engine.frame();
    assert_eq!(board.engine.session().dropping(), Some(String::from("todo")));

    let log = new_log();
    let _rec = record(&board, &log);
    board.todo.set_disabled(true);
    assert!(board.engine.frame());
    assert_eq!(entries(&log)[..2], ["model:leave:todo", "engine:leave:todo"]);
    assert_eq!(board.engine.session().dropping(), Some(String::from("done")));
}

#[test]
fn detached_drop_is_silently_excluded() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    board.dom.detach(board.todo_col).unwrap();
    assert!(board.engine.frame());
    assert_eq!(board.engine.session().dropping(), Some(String::from("done")));
}

#[test]
fn no_candidates_means_no_target() {
    let board = board();
    board.todo.set_node(None);
    board.done.set_node(None);
    board.engine.drag_start(board.card, over_todo());
    assert!(board.engine.frame());
    assert!(board.engine.dropping().is_none());
    assert_eq!(board.engine.phase(), Phase::Dragging);
}

// =============================================================
// Drag end and cancel
// =============================================================

#[test]
fn drag_end_without_target_never_drops() {
    let board = board();
    let log = new_log();
    let _rec = record(&board, &log);
    board.engine.drag_start(board.card, over_todo());
    assert!(board.engine.drag_end(over_todo()));

    assert_eq!(entries(&log), vec!["model:start:card-1", "engine:start:card-1", "model:end:card-1", "engine:end:card-1"]);
    assert!(!board.engine.is_dragging());
}

#[test]
fn drag_end_fires_end_then_drop_then_resets() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    board.engine.frame();

    let log = new_log();
    let _rec = record(&board, &log);
    let still_dragging = Rc::new(Cell::new(false));
    let flag = Rc::clone(&still_dragging);
    let engine = board.engine.clone();
    let _query = board.engine.on_drop(move |_| flag.set(engine.is_dragging() && engine.is_droppable()));

    assert!(board.engine.drag_end(over_todo()));
    assert_eq!(entries(&log), vec!["model:end:card-1", "engine:end:card-1", "model:drop:todo", "engine:drop:todo"]);
    assert!(still_dragging.get());
    assert_eq!(board.engine.phase(), Phase::Idle);
    assert!(!board.card_model.is_active());
    assert!(!board.todo.is_active());
}

#[test]
fn cancel_fires_cancel_only_and_resets() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    board.engine.frame();

    let log = new_log();
    let _rec = record(&board, &log);
    assert!(board.engine.cancel());
    assert_eq!(entries(&log), vec!["model:cancel:card-1", "engine:cancel:card-1"]);
    assert!(board.engine.dragging().is_none());
    assert!(board.engine.dropping().is_none());
    assert!(!board.todo.is_active());
}

#[test]
fn cancel_is_idempotent() {
    let board = board();
    let log = new_log();
    let _rec = record(&board, &log);
    assert!(!board.engine.cancel());
    board.engine.drag_start(board.card, over_todo());
    assert!(board.engine.cancel());
    assert!(!board.engine.cancel());
    assert_eq!(entries(&log).iter().filter(|e| e.contains("cancel")).count(), 2);
}

#[test]
fn drag_end_while_idle_is_ignored() {
    let board = board();
    let log = new_log();
    let _rec = record(&board, &log);
    assert!(!board.engine.drag_end(over_todo()));
    assert!(entries(&log).is_empty());
}

#[test]
fn a_new_drag_can_start_after_end() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    board.engine.drag_end(over_todo());
    assert!(board.engine.drag_start(board.card, over_todo()));
}

// =============================================================
// Scroll
// =============================================================

#[test]
fn scroll_translates_only_affected_drops() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    let card_before = board.card_model.rect().unwrap();
    let todo_before = board.todo.rect().unwrap();

    board.dom.scroll_by(board.scroller, 0.0, 30.0).unwrap();
    assert!(board.engine.on_scroll(board.scroller));
    assert_eq!(board.done.rect().unwrap().top(), 0.0);

    board.engine.frame();
    let done = board.done.rect().unwrap();
    assert_eq!(done.bounds(), Bounds::new(300.0, -30.0, 200.0, 300.0));
    assert_eq!(Some(done.bounds()), board.dom.measure(board.done_node));
    assert_eq!(board.card_model.rect().unwrap(), card_before);
    assert_eq!(board.todo.rect().unwrap(), todo_before);
}

#[test]
fn scroll_deltas_coalesce_within_a_frame() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    for _ in 0..3 {
        board.dom.scroll_by(board.scroller, 0.0, 10.0).unwrap();
        board.engine.on_scroll(board.scroller);
    }
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    let _sub = board.done.subscribe_rect(move |r| s.borrow_mut().push(r.as_ref().map(Rect::top)));

    board.engine.frame();
    assert_eq!(*seen.borrow(), vec![Some(-30.0)]);
}

#[test]
fn scroll_of_root_moves_dragging_rect_too() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    board.dom.scroll_by(VirtualDom::ROOT, 0.0, 5.0).unwrap();
    board.engine.on_scroll(VirtualDom::ROOT);
    board.engine.frame();
    assert_eq!(board.card_model.rect().unwrap().top(), 5.0);
    assert_eq!(board.todo.rect().unwrap().top(), -5.0);
    assert_eq!(board.done.rect().unwrap().top(), -5.0);
}

#[test]
fn scroll_skips_disabled_drops() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    board.done.set_disabled(true);
    board.dom.scroll_by(board.scroller, 0.0, 30.0).unwrap();
    board.engine.on_scroll(board.scroller);
    board.engine.frame();
    assert_eq!(board.done.rect().unwrap().top(), 0.0);
}

#[test]
fn scroll_while_idle_is_ignored() {
    let board = board();
    board.dom.scroll_by(board.scroller, 0.0, 30.0).unwrap();
    assert!(!board.engine.on_scroll(board.scroller));
    board.engine.frame();
    assert_eq!(board.done.rect().unwrap().top(), 0.0);
}

#[test]
fn drag_end_flushes_pending_scroll() {
    let board = board();
    board.engine.drag_start(board.card, over_done());
    board.engine.frame();

    let top_at_drop = Rc::new(Cell::new(None));
    let seen = Rc::clone(&top_at_drop);
    let done = board.done.clone();
    let _sub = board.done.on_drop(move |_| seen.set(done.rect().map(|r| r.top())));

    board.dom.scroll_by(board.scroller, 0.0, 30.0).unwrap();
    board.engine.on_scroll(board.scroller);
    board.engine.drag_end(over_done());
    assert_eq!(top_at_drop.get(), Some(-30.0));
}

#[test]
fn cancel_discards_pending_scroll() {
    let board = board();
    board.engine.drag_start(board.card, over_done());
    board.dom.scroll_by(board.scroller, 0.0, 30.0).unwrap();
    board.engine.on_scroll(board.scroller);
    board.engine.cancel();
    board.engine.frame();
    assert_eq!(board.done.rect().unwrap().top(), 0.0);
}

// =============================================================
// Resize
// =============================================================

#[test]
fn resize_remeasures_on_next_frame() {
    let board = board();
    board.dom.set_bounds(board.done_node, Bounds::new(300.0, 0.0, 200.0, 100.0)).unwrap();
    assert_eq!(board.engine.notify_resize(&[board.done_node, board.scroller]), 1);
    assert_eq!(board.done.rect().unwrap().height(), 300.0);

    assert!(!board.engine.frame());
    assert_eq!(board.done.rect().unwrap().height(), 100.0);
}

#[test]
fn scroll_then_resize_in_one_frame_ends_on_fresh_measurement() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    board.dom.scroll_by(board.scroller, 0.0, 30.0).unwrap();
    board.engine.on_scroll(board.scroller);
    board.dom.set_bounds(board.done_node, Bounds::new(300.0, 0.0, 200.0, 100.0)).unwrap();
    board.engine.notify_resize(&[board.done_node]);

    board.engine.frame();
    assert_eq!(board.done.rect().unwrap().bounds(), Bounds::new(300.0, -30.0, 200.0, 100.0));
}

#[test]
fn cleared_node_stops_resize_observation() {
    let board = board();
    board.done.set_node(None);
    assert!(board.done.rect().is_none());
    assert_eq!(board.engine.notify_resize(&[board.done_node]), 0);
}

// =============================================================
// Overlay and modifiers
// =============================================================

#[test]
fn overlay_follows_modifiers_and_drives_rectangle_intersection() {
    let board = board_with(|builder| {
        builder
            .strategy(RectangleIntersection)
            .modifier(OffsetModifier::new(Offset::Anchor(Anchor::Center), Offset::Anchor(Anchor::Center)))
    });
    let overlay_node = board.dom.create(VirtualDom::ROOT, Bounds::new(0.0, 0.0, 100.0, 100.0)).unwrap();
    board.engine.set_overlay_node(Some(overlay_node));

    board.engine.drag_start(board.card, over_done());
    assert_eq!(board.engine.overlay().position(), pt(340.0, 100.0));
    assert_eq!(board.engine.overlay().rect().unwrap().bounds(), Bounds::new(340.0, 100.0, 100.0, 100.0));

    board.engine.frame();
    assert_eq!(board.engine.session().dropping(), Some(String::from("done")));
}

#[test]
fn rectangle_intersection_without_overlay_never_targets() {
    let board = board_with(|builder| builder.strategy(RectangleIntersection));
    board.engine.drag_start(board.card, over_todo());
    board.engine.frame();
    assert!(board.engine.dropping().is_none());
}

#[test]
fn closest_corner_without_overlay_ranks_from_dragging_rect() {
    let board = board_with(|builder| builder.strategy(ClosestCorner::new(Aggregation::Sum)));
    assert!(board.engine.overlay().node().is_none());
    board.engine.drag_start(board.card, over_todo());
    board.engine.move_pointer(over_done());
    assert!(board.engine.frame());
    // The card's corners sit inside the todo column.
    assert_eq!(board.engine.session().dropping(), Some(String::from("todo")));
}

#[test]
fn config_installs_strategy_and_offset() {
    let config = EngineConfig::from_json(r#"{"strategy":{"kind":"rectangle-intersection"},"overlay_offset":{"x":"center","y":"center"}}"#)
        .unwrap();
    let board = board_with(|builder| builder.config(&config));
    let overlay_node = board.dom.create(VirtualDom::ROOT, Bounds::new(0.0, 0.0, 100.0, 100.0)).unwrap();
    board.engine.set_overlay_node(Some(overlay_node));

    board.engine.drag_start(board.card, over_done());
    assert_eq!(board.engine.overlay().position(), pt(340.0, 100.0));
    board.engine.frame();
    assert_eq!(board.engine.session().dropping(), Some(String::from("done")));
}

#[test]
fn overlay_resize_is_observed() {
    let board = board();
    let overlay_node = board.dom.create(VirtualDom::ROOT, Bounds::new(0.0, 0.0, 100.0, 100.0)).unwrap();
    board.engine.set_overlay_node(Some(overlay_node));
    board.dom.set_bounds(overlay_node, Bounds::new(0.0, 0.0, 40.0, 20.0)).unwrap();
    assert_eq!(board.engine.notify_resize(&[overlay_node]), 1);
    board.engine.frame();
    assert_eq!(board.engine.overlay().rect().unwrap().width(), 40.0);
}

#[test]
fn overlay_on_a_draggable_node_keeps_both_observed() {
    let board = board();
    board.engine.set_overlay_node(Some(board.card));
    board.dom.set_bounds(board.card, Bounds::new(10.0, 10.0, 300.0, 50.0)).unwrap();
    assert_eq!(board.engine.notify_resize(&[board.card]), 1);
    board.engine.frame();
    assert_eq!(board.card_model.rect().unwrap().width(), 300.0);
    assert_eq!(board.engine.overlay().rect().unwrap().width(), 300.0);

    board.engine.set_overlay_node(None);
    board.dom.set_bounds(board.card, Bounds::new(10.0, 10.0, 120.0, 50.0)).unwrap();
    assert_eq!(board.engine.notify_resize(&[board.card]), 1);
    board.engine.frame();
    assert_eq!(board.card_model.rect().unwrap().width(), 120.0);
}

// =============================================================
// Registration and disposal
// =============================================================

#[test]
fn reregistration_replaces_without_duplicate_events() {
    let board = board();
    let log = new_log();
    let _rec = record(&board, &log);

    let replacement = board.engine.draggable("card-1", "fresh");
    assert!(board.card_model.is_disposed());
    assert_eq!(replacement.node(), Some(board.card));
    assert!(replacement.rect().is_some());

    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    let _sub = board.engine.on_drag_start(move |e| s.borrow_mut().push(e.context));
    let l = Rc::clone(&log);
    let _new = replacement.on_drag_start(move |e| l.borrow_mut().push(format!("new:start:{}", e.id)));

    board.engine.drag_start(board.handle, over_todo());
    assert_eq!(entries(&log), vec!["new:start:card-1", "engine:start:card-1"]);
    assert_eq!(*seen.borrow(), vec!["fresh"]);
}

#[test]
fn late_dispose_of_replaced_model_keeps_successor() {
    let board = board();
    let replacement = board.engine.draggable("card-1", "fresh");
    board.card_model.dispose();
    assert_eq!(board.engine.find_draggable("card-1").map(|d| d.context()), Some("fresh"));
    assert!(board.engine.drag_start(board.card, over_todo()));
    assert!(replacement.is_active());
}

#[test]
fn reregistration_mid_drag_keeps_the_session() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    let replacement = board.engine.draggable("card-1", "fresh");
    assert!(board.engine.is_dragging());
    assert!(replacement.is_active());

    let ended = Rc::new(RefCell::new(Vec::new()));
    let e = Rc::clone(&ended);
    let _sub = replacement.on_drag_end(move |event| e.borrow_mut().push(event.context));
    board.engine.drag_end(over_todo());
    assert_eq!(*ended.borrow(), vec!["fresh"]);
}

#[test]
fn droppable_reregistration_keeps_candidate_order() {
    let board = board();
    let replacement = board.engine.droppable("todo", "fresh todo");
    assert!(board.todo.is_disposed());
    assert_eq!(replacement.node(), Some(board.todo_col));

    board.engine.drag_start(board.card, over_todo());
    board.engine.frame();
    assert_eq!(board.engine.dropping().map(|d| d.context()), Some("fresh todo"));
}

#[test]
fn disposing_dragging_model_cancels_session() {
    let board = board();
    let log = new_log();
    let _rec = record(&board, &log);
    board.engine.drag_start(board.card, over_todo());
    log.borrow_mut().clear();

    board.card_model.dispose();
    assert_eq!(entries(&log), vec!["engine:cancel:card-1"]);
    assert!(!board.engine.is_dragging());
    assert!(board.engine.find_draggable("card-1").is_none());
    assert!(!board.engine.drag_start(board.card, over_todo()));
}

#[test]
fn disposing_active_drop_clears_without_leave() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    board.engine.frame();

    let log = new_log();
    let _rec = record(&board, &log);
    board.todo.dispose();
    assert!(entries(&log).is_empty());
    assert_eq!(board.engine.phase(), Phase::Dragging);

    board.engine.frame();
    assert_eq!(entries(&log), vec!["model:enter:done", "engine:enter:done"]);
}

#[test]
fn disposed_model_ignores_node_changes() {
    let board = board();
    board.done.dispose();
    board.done.set_node(Some(board.scroller));
    assert_eq!(board.done.node(), Some(board.done_node));
    assert!(board.engine.find_droppable("done").is_none());
}

#[test]
fn engines_do_not_share_state() {
    let board = board();
    let document: Rc<dyn Document> = board.dom.clone();
    let other: Engine<Ctx, Ctx> = Engine::new(document);
    let twin = other.draggable("card-1", "twin");
    twin.set_node(Some(board.card));

    board.engine.drag_start(board.card, over_todo());
    assert!(!other.is_dragging());
    assert!(!twin.is_active());
    assert_ne!(board.engine.id(), other.id());
}

// =============================================================
// Sensors
// =============================================================

#[test]
fn manual_sensor_drives_full_session() {
    let board = board();
    let sensor = ManualSensor::new();
    let connection = board.engine.connect(&sensor);
    let log = new_log();
    let _rec = record(&board, &log);

    sensor.drag_start(board.handle, over_todo());
    sensor.drop_enter(board.done_node);
    assert_eq!(board.engine.session().dropping(), Some(String::from("done")));
    sensor.drop_leave(board.done_node);
    assert!(board.engine.dropping().is_none());
    sensor.drop_at(Some(board.done_node));

    assert_eq!(
        entries(&log),
        vec![
            "model:start:card-1",
            "engine:start:card-1",
            "model:enter:done",
            "engine:enter:done",
            "model:leave:done",
            "engine:leave:done",
            "model:enter:done",
            "engine:enter:done",
            "model:end:card-1",
            "engine:end:card-1",
            "model:drop:done",
            "engine:drop:done",
        ]
    );

    connection.unsubscribe();
    sensor.drag_start(board.handle, over_todo());
    assert!(!board.engine.is_dragging());
}

#[test]
fn drop_at_disabled_target_clears_active_drop() {
    let board = board();
    let log = new_log();
    let _rec = record(&board, &log);
    board.engine.drag_start(board.card, over_todo());
    assert!(board.engine.enter_drop(board.todo_col));
    board.done.set_disabled(true);

    assert!(board.engine.drop_at(Some(board.done_node)));
    assert_eq!(
        entries(&log),
        vec![
            "model:start:card-1",
            "engine:start:card-1",
            "model:enter:todo",
            "engine:enter:todo",
            "model:leave:todo",
            "engine:leave:todo",
            "model:end:card-1",
            "engine:end:card-1",
        ]
    );
    assert!(!board.engine.is_dragging());
}

#[test]
fn drop_at_detached_or_foreign_target_drops_nothing() {
    for detach in [true, false] {
        let board = board();
        let dropped = new_log();
        let l = Rc::clone(&dropped);
        let _sub = board.engine.on_drop(move |e| l.borrow_mut().push(e.id.to_string()));
        board.engine.drag_start(board.card, over_todo());
        assert!(board.engine.enter_drop(board.todo_col));

        let target = if detach {
            board.dom.detach(board.done_node).unwrap();
            board.done_node
        } else {
            board.scroller
        };
        assert!(board.engine.drop_at(Some(target)));
        assert!(entries(&dropped).is_empty(), "detach={detach}");
        assert!(board.engine.dropping().is_none());
    }
}

#[test]
fn drop_at_current_target_keeps_it() {
    let board = board();
    let dropped = new_log();
    let l = Rc::clone(&dropped);
    let _sub = board.engine.on_drop(move |e| l.borrow_mut().push(e.id.to_string()));
    board.engine.drag_start(board.card, over_todo());
    assert!(board.engine.enter_drop(board.todo_col));
    assert!(board.engine.drop_at(Some(board.todo_col)));
    assert_eq!(entries(&dropped), vec!["todo"]);
}

#[test]
fn drop_leave_for_inactive_target_is_ignored() {
    let board = board();
    board.engine.drag_start(board.card, over_todo());
    board.engine.enter_drop(board.done_node);
    assert!(!board.engine.leave_drop(board.todo_col));
    assert_eq!(board.engine.session().dropping(), Some(String::from("done")));
}

#[test]
fn pointer_sensor_escape_cancels() {
    let board = board();
    let sensor = PointerSensor::new();
    let _connection = board.engine.connect(&sensor);
    let log = new_log();
    let _rec = record(&board, &log);

    sensor.pointer_down(board.handle, over_todo(), Button::Primary);
    sensor.pointer_move(over_done());
    board.engine.frame();
    sensor.key_down(&Key(String::from("Escape")));

    assert_eq!(
        entries(&log),
        vec![
            "model:start:card-1",
            "engine:start:card-1",
            "model:enter:done",
            "engine:enter:done",
            "model:cancel:card-1",
            "engine:cancel:card-1",
        ]
    );
}

#[test]
fn dropped_engine_leaves_sensor_inert() {
    let sensor = ManualSensor::new();
    let board = board();
    let _connection = board.engine.connect(&sensor);
    let handle = board.handle;
    drop(board);
    sensor.drag_start(handle, over_todo());
}

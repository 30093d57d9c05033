use std::cell::RefCell;
use std::rc::Rc;

use super::*;

fn recorder<E: Clone + 'static>() -> (Rc<RefCell<Vec<E>>>, impl Fn(&E) + 'static) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    (log, move |e: &E| sink.borrow_mut().push(e.clone()))
}

// =============================================================
// Emitter
// =============================================================

#[test]
fn emitter_calls_listeners_in_registration_order() {
    let emitter: Emitter<u32> = Emitter::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let a = Rc::clone(&log);
    let b = Rc::clone(&log);
    let _first = emitter.subscribe(move |v| a.borrow_mut().push(("first", *v)));
    let _second = emitter.subscribe(move |v| b.borrow_mut().push(("second", *v)));

    emitter.emit(&7);

    assert_eq!(*log.borrow(), vec![("first", 7), ("second", 7)]);
}

#[test]
fn unsubscribe_removes_only_that_listener() {
    let emitter: Emitter<u32> = Emitter::new();
    let (log_a, a) = recorder();
    let (log_b, b) = recorder();
    let sub_a = emitter.subscribe(a);
    let _sub_b = emitter.subscribe(b);

    sub_a.unsubscribe();
    emitter.emit(&1);

    assert!(log_a.borrow().is_empty());
    assert_eq!(*log_b.borrow(), vec![1]);
    assert_eq!(emitter.len(), 1);
}

#[test]
fn clear_drops_every_listener() {
    let emitter: Emitter<u32> = Emitter::new();
    let (log, handler) = recorder();
    let _sub = emitter.subscribe(handler);
    emitter.clear();
    emitter.emit(&1);
    assert!(log.borrow().is_empty());
    assert!(emitter.is_empty());
}

#[test]
fn listener_may_unsubscribe_itself_while_emitting() {
    let emitter: Emitter<u32> = Emitter::new();
    let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let hits = Rc::new(RefCell::new(0));
    let slot_in = Rc::clone(&slot);
    let hits_in = Rc::clone(&hits);
    let sub = emitter.subscribe(move |_| {
        *hits_in.borrow_mut() += 1;
        if let Some(sub) = slot_in.borrow_mut().take() {
            sub.unsubscribe();
        }
    });
    *slot.borrow_mut() = Some(sub);

    emitter.emit(&1);
    emitter.emit(&2);

    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn unsubscribe_after_emitter_dropped_is_harmless() {
    let emitter: Emitter<u32> = Emitter::new();
    let sub = emitter.subscribe(|_| {});
    drop(emitter);
    sub.unsubscribe();
}

#[test]
fn merged_subscription_releases_all() {
    let a: Emitter<u32> = Emitter::new();
    let b: Emitter<u32> = Emitter::new();
    let merged = Subscription::merge([a.subscribe(|_| {}), b.subscribe(|_| {})]);
    assert_eq!(a.len() + b.len(), 2);
    merged.unsubscribe();
    assert_eq!(a.len() + b.len(), 0);
}

// =============================================================
// Signal
// =============================================================

#[test]
fn signal_set_notifies_on_change() {
    let runtime = Runtime::new();
    let signal = Signal::new(&runtime, 1);
    let (log, handler) = recorder();
    let _sub = signal.subscribe(handler);

    assert!(signal.set(2));
    assert_eq!(signal.get(), 2);
    assert_eq!(*log.borrow(), vec![2]);
}

#[test]
fn signal_set_same_value_is_deduplicated() {
    let runtime = Runtime::new();
    let signal = Signal::new(&runtime, String::from("a"));
    let (log, handler) = recorder();
    let _sub = signal.subscribe(handler);

    assert!(!signal.set(String::from("a")));
    assert!(log.borrow().is_empty());
}

#[test]
fn signal_update_derives_from_current() {
    let runtime = Runtime::new();
    let signal = Signal::new(&runtime, 10);
    signal.update(|v| v + 5);
    assert_eq!(signal.get(), 15);
    assert_eq!(signal.with(|v| v * 2), 30);
}

#[test]
fn clones_share_the_same_cell() {
    let runtime = Runtime::new();
    let a = Signal::new(&runtime, 0);
    let b = a.clone();
    b.set(3);
    assert_eq!(a.get(), 3);
}

// =============================================================
// Runtime batching
// =============================================================

#[test]
fn batch_defers_notifications_until_end() {
    let runtime = Runtime::new();
    let left = Signal::new(&runtime, 0);
    let right = Signal::new(&runtime, 0);
    let seen = Rc::new(RefCell::new(Vec::new()));

    let seen_in = Rc::clone(&seen);
    let right_in = right.clone();
    let _sub = left.subscribe(move |l| seen_in.borrow_mut().push((*l, right_in.get())));

    runtime.batch(|| {
        left.set(1);
        assert!(seen.borrow().is_empty());
        right.set(2);
    });

    // The listener observed the finished state, not the half-written one.
    assert_eq!(*seen.borrow(), vec![(1, 2)]);
}

#[test]
fn nested_batches_flush_once_at_outermost() {
    let runtime = Runtime::new();
    let signal = Signal::new(&runtime, 0);
    let (log, handler) = recorder();
    let _sub = signal.subscribe(handler);

    runtime.batch(|| {
        runtime.batch(|| {
            signal.set(1);
        });
        assert!(log.borrow().is_empty());
        assert!(runtime.is_batching());
    });

    assert_eq!(*log.borrow(), vec![1]);
    assert!(!runtime.is_batching());
}

#[test]
fn batch_returns_action_result() {
    let runtime = Runtime::new();
    assert_eq!(runtime.batch(|| 42), 42);
}

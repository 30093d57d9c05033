#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::dom::VirtualDom;

fn setup() -> (VirtualDom, NodeId, Overlay) {
    let dom = VirtualDom::new();
    let node = dom.create(VirtualDom::ROOT, Bounds::new(500.0, 500.0, 80.0, 30.0)).unwrap();
    (dom, node, Overlay::new(&Runtime::new()))
}

#[test]
fn unmounted_overlay_has_no_rect() {
    let (_dom, _node, overlay) = setup();
    overlay.set_position(Position::new(10.0, 10.0));
    assert_eq!(overlay.position(), Position::new(10.0, 10.0));
    assert!(overlay.rect().is_none());
}

#[test]
fn mounting_takes_size_from_node_and_origin_from_position() {
    let (dom, node, overlay) = setup();
    overlay.set_position(Position::new(10.0, 20.0));
    overlay.set_node(&dom, Some(node));

    let rect = overlay.rect().unwrap();
    assert_eq!(rect.id(), OVERLAY_RECT_ID);
    assert_eq!(rect.bounds(), Bounds::new(10.0, 20.0, 80.0, 30.0));
}

#[test]
fn position_moves_rect_at_fixed_size() {
    let (dom, node, overlay) = setup();
    overlay.set_node(&dom, Some(node));
    overlay.set_position(Position::new(-5.0, 7.0));
    assert_eq!(overlay.rect().unwrap().bounds(), Bounds::new(-5.0, 7.0, 80.0, 30.0));
}

#[test]
fn remeasure_picks_up_resized_node() {
    let (dom, node, overlay) = setup();
    overlay.set_node(&dom, Some(node));
    dom.set_bounds(node, Bounds::new(0.0, 0.0, 120.0, 60.0)).unwrap();
    overlay.remeasure(&dom);
    assert_eq!(overlay.rect().unwrap().bounds(), Bounds::new(0.0, 0.0, 120.0, 60.0));
}

#[test]
fn unmounting_clears_rect_and_notifies() {
    let (dom, node, overlay) = setup();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    let _sub = overlay.subscribe_rect(move |r| log.borrow_mut().push(r.is_some()));

    overlay.set_node(&dom, Some(node));
    overlay.set_node(&dom, None);
    assert!(overlay.node().is_none());
    assert_eq!(*seen.borrow(), vec![true, false]);
}

//! Scripted drag sessions.
//!
//! A [`Scenario`] describes a small document, the draggables and droppables
//! registered on it, and a list of input steps. [`replay`] builds a
//! [`VirtualDom`], wires an engine to a pointer sensor and a manual sensor,
//! feeds the steps through them, and returns every lifecycle callback in the
//! order the engine fired it.

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use dropkit::dom::DomError;
use dropkit::sensor::{Button, Key};
use dropkit::{
    Bounds, CompositeSensor, Document, Engine, EngineConfig, ManualSensor, NodeId, Overflow, Phase, PointerSensor,
    Position, Sensor, Subscription, VirtualDom,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document error: {0}")]
    Dom(#[from] DomError),
    #[error("unknown node `{0}`")]
    UnknownNode(String),
    #[error("duplicate node `{0}`")]
    DuplicateNode(String),
}

// =============================================================================
// SCENARIO
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub config: EngineConfig,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub draggables: Vec<DraggableSpec>,
    #[serde(default)]
    pub droppables: Vec<DroppableSpec>,
    /// Name of the node mounted as the drag overlay.
    #[serde(default)]
    pub overlay: Option<String>,
    /// Run a frame after every step.
    #[serde(default = "default_auto_frame")]
    pub auto_frame: bool,
    pub steps: Vec<Step>,
}

fn default_auto_frame() -> bool {
    true
}

/// A document node. Parents must be declared before their children; a
/// missing parent means the document root.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub bounds: Bounds,
    #[serde(default)]
    pub overflow: Overflow,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DraggableSpec {
    pub id: String,
    pub node: String,
    #[serde(default)]
    pub activator: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DroppableSpec {
    pub id: String,
    pub node: String,
    #[serde(default)]
    pub disabled: bool,
}

/// One scripted input. Pointer steps go through the pointer sensor; drop
/// targeting steps go through the manual sensor.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Step {
    Down { target: String, x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Key { key: String },
    Enter { target: String },
    Leave { target: String },
    Drop {
        #[serde(default)]
        target: Option<String>,
    },
    Scroll { node: String, dx: f64, dy: f64 },
    Resize { node: String, bounds: Bounds },
    Detach { node: String },
    Frame,
}

// =============================================================================
// REPORT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Index of the step that produced the callback.
    pub step: usize,
    pub event: &'static str,
    pub drag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop: Option<String>,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:<3} {:<11} {}", self.step, self.event, self.drag)?;
        match &self.drop {
            Some(drop) => write!(f, " -> {drop}"),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub events: Vec<LogEntry>,
    pub phase: Phase,
    pub dragging: Option<String>,
    pub dropping: Option<String>,
    pub overlay: Position,
}

// =============================================================================
// REPLAY
// =============================================================================

/// Read and parse a scenario file.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read and `Json` if it does not parse.
pub fn load(path: &std::path::Path) -> Result<Scenario, ReplayError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Run `scenario` against a fresh document and engine.
///
/// # Errors
///
/// Returns `UnknownNode` or `DuplicateNode` for bad node references and
/// `Dom` if the document rejects a mutation.
pub fn replay(scenario: &Scenario) -> Result<Report, ReplayError> {
    let dom = Rc::new(VirtualDom::new());
    let nodes = build_nodes(&dom, &scenario.nodes)?;
    let lookup = |name: &str| nodes.get(name).copied().ok_or_else(|| ReplayError::UnknownNode(name.to_owned()));

    let document: Rc<dyn Document> = dom.clone();
    let engine: Engine<(), ()> = Engine::builder(document).config(&scenario.config).build();
    info!(engine = %engine.id(), steps = scenario.steps.len(), "replaying scenario");

    let mut draggables = Vec::with_capacity(scenario.draggables.len());
    for spec in &scenario.draggables {
        let draggable = engine.draggable(&spec.id, ());
        draggable.set_node(Some(lookup(&spec.node)?));
        draggable.set_activator_node(spec.activator.as_deref().map(lookup).transpose()?);
        draggable.set_disabled(spec.disabled);
        draggables.push(draggable);
    }
    let mut droppables = Vec::with_capacity(scenario.droppables.len());
    for spec in &scenario.droppables {
        let droppable = engine.droppable(&spec.id, ());
        droppable.set_node(Some(lookup(&spec.node)?));
        droppable.set_disabled(spec.disabled);
        droppables.push(droppable);
    }
    if let Some(overlay) = &scenario.overlay {
        engine.set_overlay_node(Some(lookup(overlay)?));
    }

    let step = Rc::new(Cell::new(0));
    let events = Rc::new(RefCell::new(Vec::new()));
    let callbacks = record(&engine, &step, &events);

    let pointer = PointerSensor::new();
    let manual = ManualSensor::new();
    let inputs: Vec<Box<dyn Sensor>> = vec![Box::new(pointer.clone()), Box::new(manual.clone())];
    let sensors = CompositeSensor::new(inputs);
    let connection = engine.connect(&sensors);

    for (index, input) in scenario.steps.iter().enumerate() {
        step.set(index);
        debug!(step = index, ?input, "step");
        match input {
            Step::Down { target, x, y } => pointer.pointer_down(lookup(target)?, Position::new(*x, *y), Button::Primary),
            Step::Move { x, y } => pointer.pointer_move(Position::new(*x, *y)),
            Step::Up { x, y } => pointer.pointer_up(Position::new(*x, *y), Button::Primary),
            Step::Key { key } => pointer.key_down(&Key(key.clone())),
            Step::Enter { target } => manual.drop_enter(lookup(target)?),
            Step::Leave { target } => manual.drop_leave(lookup(target)?),
            Step::Drop { target } => manual.drop_at(target.as_deref().map(lookup).transpose()?),
            Step::Scroll { node, dx, dy } => {
                let node = lookup(node)?;
                dom.scroll_by(node, *dx, *dy)?;
                engine.on_scroll(node);
            }
            Step::Resize { node, bounds } => {
                let node = lookup(node)?;
                dom.set_bounds(node, *bounds)?;
                engine.notify_resize(&[node]);
            }
            Step::Detach { node } => dom.detach(lookup(node)?)?,
            Step::Frame => {
                engine.frame();
            }
        }
        if scenario.auto_frame {
            engine.frame();
        }
    }

    connection.unsubscribe();
    callbacks.unsubscribe();

    let report = Report {
        events: events.take(),
        phase: engine.phase(),
        dragging: engine.session().dragging(),
        dropping: engine.session().dropping(),
        overlay: engine.overlay().position(),
    };
    for draggable in draggables {
        draggable.dispose();
    }
    for droppable in droppables {
        droppable.dispose();
    }
    Ok(report)
}

fn build_nodes(dom: &VirtualDom, specs: &[NodeSpec]) -> Result<HashMap<String, NodeId>, ReplayError> {
    let mut nodes = HashMap::with_capacity(specs.len());
    for spec in specs {
        if nodes.contains_key(&spec.name) {
            return Err(ReplayError::DuplicateNode(spec.name.clone()));
        }
        let parent = match &spec.parent {
            Some(parent) => *nodes.get(parent).ok_or_else(|| ReplayError::UnknownNode(parent.clone()))?,
            None => VirtualDom::ROOT,
        };
        let node = dom.create_with(parent, spec.bounds, spec.overflow)?;
        nodes.insert(spec.name.clone(), node);
    }
    Ok(nodes)
}

fn record(engine: &Engine<(), ()>, step: &Rc<Cell<usize>>, events: &Rc<RefCell<Vec<LogEntry>>>) -> Subscription {
    let push = {
        let step = Rc::clone(step);
        let events = Rc::clone(events);
        move |event: &'static str, drag: &str, drop: Option<&str>| {
            events.borrow_mut().push(LogEntry {
                step: step.get(),
                event,
                drag: drag.to_owned(),
                drop: drop.map(str::to_owned),
            });
        }
    };
    let push = Rc::new(push);

    let (start, end, cancel) = (Rc::clone(&push), Rc::clone(&push), Rc::clone(&push));
    let (enter, leave, dropped) = (Rc::clone(&push), Rc::clone(&push), push);
    Subscription::merge([
        engine.on_drag_start(move |e| start("drag-start", &e.id, None)),
        engine.on_drag_end(move |e| end("drag-end", &e.id, None)),
        engine.on_drag_cancel(move |e| cancel("drag-cancel", &e.id, None)),
        engine.on_drop_enter(move |e| enter("drop-enter", &e.drag.id, Some(&e.id))),
        engine.on_drop_leave(move |e| leave("drop-leave", &e.drag.id, Some(&e.id))),
        engine.on_drop(move |e| dropped("drop", &e.drag.id, Some(&e.id))),
    ])
}

//! Drag-and-drop session engine.
//!
//! This crate decides what can be picked up, where it can be released, and
//! which drop zone the dragged item is currently over. It does no rendering.
//! The host UI layer feeds it node handles (through [`dom::Document`]), raw
//! input (through [`sensor::Sensor`]s), scroll and resize notifications, and
//! one [`engine::Engine::frame`] call per animation frame. The engine answers
//! with observable session state and ordered lifecycle events.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | The [`engine::Engine`] handle, its builder, and the session state machine |
//! | [`session`] | Observable dragging/dropping/pointer state |
//! | [`model`] | Draggable and droppable models and their lifecycle listeners |
//! | [`registry`] | Node-to-id association per namespace, ancestor lookup, liveness |
//! | [`scroll`] | Scroll baselines, per-frame delta batching, scroll-parent index |
//! | [`resize`] | Shared resize observer multiplexed across registered nodes |
//! | [`rect`] | Tracked rect cell (update, translate, reposition) |
//! | [`geometry`] | `Position`, `Bounds`, and `Rect` value types |
//! | [`sensor`] | Sensor contract, composition, manual and pointer sensors |
//! | [`strategy`] | Intersection strategies for ranking drop candidates |
//! | [`modifier`] | Overlay position modifier pipeline |
//! | [`overlay`] | The floating drag proxy's node/position/rect |
//! | [`signal`] | Single-threaded reactive cells, emitters, and batching |
//! | [`dom`] | Host document boundary and the in-memory `VirtualDom` |
//! | [`config`] | Serde/env configuration for strategies and modifiers |
//! | [`consts`] | Shared constants |

pub mod config;
pub mod consts;
pub mod dom;
pub mod engine;
pub mod geometry;
pub mod model;
pub mod modifier;
pub mod overlay;
pub mod rect;
pub mod registry;
pub mod resize;
pub mod scroll;
pub mod sensor;
pub mod session;
pub mod signal;
pub mod strategy;

pub use config::{ConfigError, EngineConfig, StrategyKind};
pub use dom::{Document, NodeId, Overflow, VirtualDom};
pub use engine::{Engine, EngineBuilder, EngineId};
pub use geometry::{Bounds, Position, Rect};
pub use model::{DragEvent, Draggable, DropEvent, Droppable};
pub use sensor::{CompositeSensor, ManualSensor, PointerSensor, Sensor};
pub use session::{Phase, Session};
pub use signal::{Emitter, Runtime, Signal, Subscription};

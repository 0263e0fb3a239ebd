//! Platform-agnostic message routing for conversational bots.
//!
//! An application assembles a [`Core`] from interfaces (platform adapters),
//! condition packs, and a declarative route tree, then feeds it normalized
//! [`InboundEvent`]s. For each event the core snapshots every registered
//! input property once, walks the tree to the deepest passing node in
//! declaration order, and runs that node's response actions: immediate ones
//! deliver through the originating interface before the next action starts,
//! deferred ones detach onto their own tasks. A miss runs the default
//! response list; a failing immediate action runs the error list. All
//! registration is validated when the core is built, so unknown condition
//! kinds, unknown output properties, colliding names, and unreachable routes
//! never survive to runtime.

pub mod condition;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod hub;
pub mod input;
pub mod interface;
pub mod log;
pub mod output;
pub mod property;
pub mod response;
pub mod route;
mod router;

pub use {
    condition::{Condition, ConditionFn, ConditionPack, ConditionRegistry},
    dispatch::{Deferred, Handled, Outcome},
    error::{ConfigError, DeliveryError, DispatchError},
    event::InboundEvent,
    hub::{Core, CoreBuilder},
    input::Input,
    interface::{Interface, Registrar},
    log::{BufferSink, LogEvent, LogEventKind, LogSink, Severity},
    output::{OutputBuilder, OutputBundle},
    property::{Direction, Extractor, PropertyRegistry},
    response::{Responder, Response, ResponseContext, ResponseMode},
    route::Route,
};

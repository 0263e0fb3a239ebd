//! Built-in condition packs.
//!
//! Interfaces register packs for their platform's concepts; the two packs
//! here cover the platform-independent conditions nearly every bot needs:
//! [`flow`] for flow control (the `any` catch-all) and [`text`] for matching
//! on a text input property. Register them with
//! `CoreBuilder::pack(flow::flow_pack())` and build routes from the typed
//! constructors (`flow::any()`, `text::equals("hi")`) instead of spelling
//! out pack/kind strings.

pub mod flow;
pub mod text;

pub use {flow::flow_pack, text::text_pack};

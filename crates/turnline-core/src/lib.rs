#![forbid(unsafe_code)]

//! Core: geometry primitives, turn records, and the marker model.
//!
//! # Role in Turnline
//! `turnline-core` is the input layer. It owns the pixel-space geometry types
//! shared by every engine, the [`TurnRecord`](marker::TurnRecord) shape that
//! discovery collaborators produce, and the [`MarkerModel`](marker::MarkerModel)
//! that turns those records into track markers.
//!
//! # How it fits in the system
//! `turnline-layout` computes marker positions, tooltip placement, and drag
//! constraints over these types; `turnline-runtime` drives the recompute
//! pipeline and scheduling. Nothing here depends on time or on a host.

pub mod discovery;
pub mod geometry;
pub mod marker;

pub use discovery::{DiscoveryChain, DiscoveryMatch, FnSource, TurnSource};
pub use geometry::{Point, Rect, Size};
pub use marker::{Marker, MarkerModel, RebuildOutcome, SourceRef, SummaryRules, TurnRecord};

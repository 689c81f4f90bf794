//! Framebuffer differencing for serial-bus displays
//!
//! Compares the current framebuffer against the previous one and describes
//! what changed as a short linked list of rectangular [`Span`]s, sized so that
//! a slow SPI link only re-sends pixels that actually differ (plus a bounded
//! number of unchanged pixels where bridging a gap is cheaper than paying a
//! new span's fixed transmission overhead).
//!
//! # Architecture
//!
//! ```text
//! DiffEngine::compute_diff (orchestrator)
//!         ↓ selects one strategy per DiffConfig
//! ┌──────────────┬──────────────┬─────────────────────────────┐
//! │ full_frame   │ bbox         │ scanline (coarse | exact)   │
//! │              │  ↓           │  ↓                          │
//! │              │ compare      │ merge (progressive only)    │
//! └──────────────┴──────────────┴─────────────────────────────┘
//!         ↓ all write into
//! SpanPool (preallocated arena, index-linked list)
//! ```
//!
//! # Example
//!
//! ```
//! use frame_diff::{DiffConfig, DiffEngine, Frame, FrameGeometry, Interlace};
//!
//! let geometry = FrameGeometry::packed(8, 4).unwrap();
//! let prev = vec![0u16; 32];
//! let mut cur = prev.clone();
//! cur[2 * 8 + 3] = 0xF800;
//!
//! let mut engine = DiffEngine::new(8, 4, DiffConfig::DEFAULT).unwrap();
//! let spans = engine
//!     .compute_diff(
//!         Frame::new(&cur, geometry),
//!         Frame::new(&prev, geometry),
//!         true,
//!         Interlace::Progressive,
//!     )
//!     .unwrap();
//!
//! let span = spans.iter().next().unwrap();
//! assert_eq!((span.x, span.end_x, span.y, span.end_y), (3, 4, 2, 3));
//! assert_eq!(span.size, 1);
//! ```
//!
//! # Features
//!
//! - `std` (default): standard library support
//! - `defmt`: `defmt::Format` derives and on-target log events
//! - `tracing`: host log events
//! - `serde`: `Serialize`/`Deserialize` on configuration types

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::module_name_repetitions)]

extern crate alloc;

pub mod alignment;
pub mod bbox;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod full_frame;
pub mod geometry;
pub mod merge;
pub mod scanline;
pub mod span;

pub use compare::{NativeCompare, PortableCompare, WideCompare};
pub use config::{DiffConfig, DiffStrategy, LinkProfile};
pub use engine::{DiffEngine, DiffStats};
pub use error::ConfigError;
pub use geometry::{Frame, FrameGeometry, Interlace};
pub use merge::MergeLimits;
pub use span::{Span, SpanIndex, SpanList, SpanPool};

//! Geometric Structuring Engine
//!
//! Turns a set of embedded text units into entropy-regularized semantic
//! clusters, a manifold-shape classification of the embedding space, and a
//! portable hierarchical geometry packet with an optional cryptographically
//! verifiable attribution record.
//!
//! # Architecture
//!
//! ```text
//! EmbeddedUnit[] ──> clustering (CHR) ──> ClusteringResult
//!        │                                      │
//!        ├──> curvature ──> ManifoldSample      │
//!        │                                      ▼
//!        │          spectral (zeta filter, per cluster signal)
//!        │                                      │
//!        ▼                                      ▼
//!   attribution (optional) ────────────> encoder ──> GeometryPacket
//! ```
//!
//! The engine is synchronous and performs no I/O; the only shared mutable
//! state is the attribution ledger, which lives in the companion
//! `manifold-engine-attribution` crate and is injected by the caller.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::AtomicBool;
//! use manifold_engine_core::config::EngineConfig;
//! use manifold_engine_core::pipeline::StructuringPipeline;
//! use manifold_engine_core::types::{EmbeddedUnit, SourceLocation};
//!
//! let units: Vec<EmbeddedUnit> = (0..8)
//!     .map(|i| {
//!         let mut v = vec![0.0f32; 4];
//!         v[i % 4] = 1.0;
//!         EmbeddedUnit::new(
//!             v,
//!             SourceLocation { page: Some(1), paragraph_index: Some(i), char_span: (0, 10) },
//!             format!("sentence {i}"),
//!         )
//!     })
//!     .collect();
//!
//! let pipeline = StructuringPipeline::new(EngineConfig::default()).unwrap();
//! let packet = pipeline.structure(&units, None, &AtomicBool::new(false)).unwrap();
//! assert!(!packet.super_nodes.is_empty());
//! ```

pub mod clustering;
pub mod config;
pub mod curvature;
pub mod encoder;
pub mod entropy;
pub mod error;
pub mod math;
pub mod pipeline;
pub mod preview;
pub mod spectral;
pub mod types;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use pipeline::{AttributionContext, StructuringPipeline};

//! Domain types for the structuring engine.
//!
//! Everything here is created fresh per structuring request and handed back
//! to the caller; the engine keeps no long-lived copies.

mod cluster;
mod manifold;
mod packet;
mod unit;

pub use cluster::{Cluster, ClusteringResult, ParamClamp, PreviewRow};
pub use manifold::{ManifoldSample, ManifoldShape, CURVATURE_CLASS_THRESHOLD};
pub use packet::{
    AttributionMeta, Constellation, EntropyMeta, GeometryPacket, HyperbolicEncoding, PacketMeta,
    Point, SpecVersion, SuperNode,
};
pub use unit::{EmbeddedUnit, SourceLocation, UnitGranularity};

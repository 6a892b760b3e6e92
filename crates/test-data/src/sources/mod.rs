//! Route sources for workout generation.
//!
//! - [`ProceduralGenerator`]: Generate synthetic routes with configurable parameters

mod procedural;

pub use procedural::{GeneratedRoute, ProceduralGenerator, RouteConfig};

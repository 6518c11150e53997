//! Assembly Viewer Core
//!
//! This crate contains the placement engine behind the exploded-view viewer:
//! - Part: a physical component with its placement constraint and explode parameters
//! - AssemblyConstraintResolver: memoized resolution of assembled positions
//! - Mate: face-to-face rigid transforms and their composition
//! - Explode: pure interpolation from an explode factor to displayed positions
//! - Sequence: mate-driven placement of a whole assembly
//! - Project: serializable assembly description

pub mod bounds;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod constraint;
pub mod explode;
pub mod face;
pub mod inference;
pub mod mate;
pub mod mesh;
pub mod part;
pub mod project;
pub mod reconcile;
pub mod resolver;
pub mod sequence;
pub mod snapshot;

pub use bounds::*;
pub use catalog::*;
pub use config::*;
pub use constants::*;
pub use constraint::*;
pub use explode::*;
pub use face::*;
pub use inference::*;
pub use mate::*;
pub use mesh::*;
pub use part::*;
pub use project::*;
pub use reconcile::*;
pub use resolver::*;
pub use sequence::*;
pub use snapshot::*;

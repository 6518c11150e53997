//! Global constants for av-core

/// Explode distance added per position in the assembly order when a part
/// has no explicit distance
pub const EXPLODE_DISTANCE_STEP: f32 = 40.0;

/// Explode distance for a part with neither an explicit distance nor an order index
pub const DEFAULT_EXPLODE_DISTANCE: f32 = 40.0;

/// Explode speed multiplier (explosion completes exactly at factor 1)
pub const DEFAULT_EXPLODE_SPEED: f32 = 1.0;

/// Fraction of the rod height a threaded part sits at when unspecified
pub const DEFAULT_THREAD_DEPTH: f32 = 0.5;

/// Minimum inference confidence for inferred positions to be trusted
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Vectors shorter than this are treated as degenerate
pub const DIRECTION_EPSILON: f32 = 1e-6;

/// Face grouping precision for normals (multiply by this, then round to int)
pub const FACE_NORMAL_PRECISION: f32 = 1000.0;

/// Face grouping precision for plane offsets (multiply by this, then round to int)
pub const FACE_OFFSET_PRECISION: f32 = 1000.0;

/// STL vertex comparison precision (multiply by this, then round to int)
pub const STL_VERTEX_PRECISION: f32 = 10000.0;

/// Current project file format version
pub const PROJECT_VERSION: u32 = 1;

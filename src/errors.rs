//! Modeling and meshing errors

use crate::float_types::Real;
use crate::model::{Dim, DimTag, Tag};
use nalgebra::Point3;

/// Result type for modeling operations.
pub type Result<T, E = GeoError> = std::result::Result<T, E>;

/// All the possible issues the built-in geometry kernel reports
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    /// (UnknownEntity) An operation referenced a tag that does not exist
    #[error("(UnknownEntity) no {} with tag {}", .0.dim, .0.tag)]
    UnknownEntity(DimTag),
    /// (UnknownLoop) A curve or surface loop tag that does not exist
    #[error("(UnknownLoop) no {dim} loop with tag {tag}")]
    UnknownLoop { dim: Dim, tag: Tag },
    /// (DuplicateTag) An explicit tag is already in use for that dimension
    #[error("(DuplicateTag) {} {} already exists", .0.dim, .0.tag)]
    DuplicateTag(DimTag),
    /// (InvalidTag) Tags are strictly positive
    #[error("(InvalidTag) tag {1} is not valid for a {0}, tags must be positive")]
    InvalidTag(Dim, Tag),
    /// (InvalidCoordinate) The coordinate has a NaN or infinite
    #[error("(InvalidCoordinate) the coordinate ({0}) has a NaN or infinite")]
    InvalidCoordinate(Point3<Real>),
    /// (InvalidMeshSize) Mesh sizes are finite and non-negative
    #[error("(InvalidMeshSize) mesh size {0} must be finite and >= 0")]
    InvalidMeshSize(Real),
    /// (DegenerateCurve) A line or arc has coincident end points
    #[error("(DegenerateCurve) curve end points coincide at: {0}")]
    DegenerateCurve(Point3<Real>),
    /// (ArcRadiusMismatch) Start and end of an arc are not equidistant from its center
    #[error("(ArcRadiusMismatch) arc start radius {start} differs from end radius {end}")]
    ArcRadiusMismatch { start: Real, end: Real },
    /// (ArcTooWide) Circle arcs must sweep strictly less than π
    #[error("(ArcTooWide) circle arc sweeps {0} rad, it must be strictly smaller than Pi")]
    ArcTooWide(Real),
    /// (EmptyLoop) A curve or surface loop without members
    #[error("(EmptyLoop) a {0} loop needs at least one member")]
    EmptyLoop(Dim),
    /// (LoopNotClosed) The curves of a loop do not chain into a closed ring
    #[error("(LoopNotClosed) curve loop is not closed, curve {0} does not connect")]
    LoopNotClosed(Tag),
    /// (ShellNotClosed) A surface loop leaves curves with a single adjacent surface
    #[error("(ShellNotClosed) surface loop is open along curve {0}")]
    ShellNotClosed(Tag),
    /// (NonPlanarSurface) A plane surface whose boundary is not planar
    #[error("(NonPlanarSurface) boundary of plane surface leaves its plane at: {0}")]
    NonPlanarSurface(Point3<Real>),
    /// (InvalidSweep) Zero translation, zero axis, point on the axis, or a too wide angle
    #[error("(InvalidSweep) {0}")]
    InvalidSweep(String),
    /// (InvalidLayers) Layer counts must be positive, heights increasing and ending at 1
    #[error("(InvalidLayers) {0}")]
    InvalidLayers(String),
    /// (Unsupported) The operation is not defined for that dimension
    #[error("(Unsupported) {operation} is not supported on a {dim}")]
    Unsupported { operation: &'static str, dim: Dim },
    /// (InUse) Removing an entity still referenced by a higher dimensional one
    #[error("(InUse) {} {} is still bounding {} {}", .entity.dim, .entity.tag, .user.dim, .user.tag)]
    InUse { entity: DimTag, user: DimTag },
    /// (UnknownModel) The session has no model with that name
    #[error("(UnknownModel) no model named {0:?}")]
    UnknownModel(String),
    /// (NoCurrentModel) No model was added to the session yet
    #[error("(NoCurrentModel) the session has no current model")]
    NoCurrentModel,
}

/// Everything mesh generation can report
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    /// Invalid geometry bubbled up from the model
    #[error(transparent)]
    Geo(#[from] GeoError),
    /// The mesher cannot produce elements for this configuration
    #[error("(Unsupported) {0}")]
    Unsupported(String),
    /// The model has entities that were never synchronized
    #[error("(NotSynchronized) the model has no synchronized entities")]
    NotSynchronized,
    /// Mesh options that cannot produce a positive element size
    #[error("(InvalidOptions) {0}")]
    InvalidOptions(String),
    /// Mesh dimension out of 0..=3
    #[error("(InvalidDimension) cannot generate a {0}D mesh")]
    InvalidDimension(i32),
    /// The constrained triangulation of a plane surface failed
    #[error("(Triangulation) surface {tag}: {reason}")]
    Triangulation { tag: Tag, reason: String },
    /// (HoleOutsideShell) A hole is *not* contained by its outer loop
    #[error("(HoleOutsideShell) surface {tag}: hole loop {hole} lies outside the outer loop")]
    HoleOutsideShell { tag: Tag, hole: Tag },
    /// A shell volume that cannot be tetrahedralized from its centroid
    #[error("(NotStarShaped) volume {0} is not star-shaped about its centroid")]
    NotStarShaped(Tag),
    /// An element with zero or negative measure
    #[error("(InvertedElement) element {element} of {} {} has measure {measure}", .entity.dim, .entity.tag)]
    InvertedElement {
        entity: DimTag,
        element: usize,
        measure: Real,
    },
    /// The boundary of a meshed volume is not a closed 2-manifold
    #[error("(OpenBoundary) boundary of volume {tag} has {open_edges} edges not shared by exactly two faces")]
    OpenBoundary { tag: Tag, open_edges: usize },
    /// Boundary faces of a meshed volume that match no surface element
    #[error("(NonConforming) volume {tag} has {faces} boundary faces missing from the surface mesh")]
    NonConforming { tag: Tag, faces: usize },
}

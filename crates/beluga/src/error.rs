pub type Result<T> = std::result::Result<T, LayoutError>;

/// Reportable layout failures.
///
/// Only conditions that can legitimately arise from caller input are errors;
/// internal invariant violations panic at the point of detection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// The graph (or the root container after collapsing) has no vertices.
    #[error("graph is empty")]
    GraphEmpty,

    /// Two subgraphs sharing nodes pin them to opposite rank extremes.
    #[error("subgraphs `{first}` and `{second}` pin shared nodes to opposite rank extremes")]
    OppositeRankConstraint { first: String, second: String },
}

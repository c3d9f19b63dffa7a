use thiserror::Error;

/// Failure taxonomy for the NEAT core. All fallible operations return one of
/// these; soft no-ops (e.g. a mutation with no valid candidates) are not
/// errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NeatError {
    /// A structural request that the genome model cannot represent, such as
    /// a connection out of an output node or a duplicate enabled connection.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// The input vector handed to an evaluator does not match the number of
    /// sensor nodes.
    #[error("input vector has length {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// `advance_generation` was called while some organisms still lack a
    /// fitness report.
    #[error("{missing} organism(s) have no fitness report for this generation")]
    IncompleteFitnessReports { missing: usize },

    /// Out-of-range probabilities, non-positive sizes, or other settings
    /// rejected at population construction.
    #[error("invalid configuration: {0}")]
    ConfigurationError(String),
}

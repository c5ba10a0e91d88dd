//! Registry error types

use thiserror::Error;

use crate::routing::RoutingError;

/// Error type for registry admissions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// All subscriber slots are taken
    #[error("subscriber limit of {max} reached")]
    CapacityReached { max: usize },

    /// The routing graph refused the branch; nothing was recorded
    #[error(transparent)]
    Routing(#[from] RoutingError),
}

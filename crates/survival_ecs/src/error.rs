//! World error types.

use survival_component::Entity;

/// Errors returned by [`World`](crate::World) operations.
///
/// These are programmer errors. Expected absences (a missing entity or
/// component on a read) are reported as `None`/`false` instead.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The component kind was used before `register_component`.
    #[error("component '{0}' is not registered")]
    UnregisteredComponent(String),

    /// A component was added to an entity that does not exist.
    #[error("{0} not found")]
    EntityNotFound(Entity),

    /// Two distinct Rust types share a component name.
    #[error("component name '{0}' is registered to a different type")]
    NameCollision(&'static str),
}

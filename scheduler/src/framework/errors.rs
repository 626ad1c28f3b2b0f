use thiserror::Error;

/// Errors raised by the scheduling framework and its plugins.
#[derive(Debug, Error)]
pub enum FrameworkError {
    /// The snapshot has no entry for the requested node.
    #[error("nodeinfo not found for node name \"{0}\"")]
    NodeNotFound(String),
    /// Plugin arguments do not have the shape the plugin expects.
    #[error("invalid arguments for plugin {plugin}: {reason}")]
    ArgsMismatch { plugin: String, reason: String },
    #[error("plugin {0} is not registered")]
    UnknownPlugin(String),
    #[error("plugin {0} is already registered")]
    DuplicatePlugin(String),
    /// The lister could not serve a consistent view of the cluster.
    #[error("snapshot unavailable: {0}")]
    Snapshot(String),
}

pub mod metadata;
pub mod node;
pub mod pod;

pub use node::{Node, NodeStatus};
pub use pod::Pod;

pub mod builder;
pub mod constraint;
pub mod error;
pub mod lca;
pub mod mapping;
pub mod node;
pub mod parser;
pub mod reader;
pub mod rf;
pub mod subtree;
pub mod taxa;
pub mod tree;
pub mod writer;

pub use builder::{BuildOptions, SupertreeBuilder};
pub use constraint::CladeSet;
pub use error::MulRfError;
pub use node::{CladeId, Node, NodeId};
pub use parser::ParsedTree;
pub use tree::Tree;

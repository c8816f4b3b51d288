pub mod digest;
pub mod parse;
pub mod serialize;
pub mod tree;

pub use digest::skeleton_digest;
pub use parse::parse_markup;
pub use serialize::serialize_fragment;
pub use tree::{MarkupTree, NodeId, NodeKind};

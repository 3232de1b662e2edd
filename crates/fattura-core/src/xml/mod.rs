//! XML reading and tree flattening.

mod flatten;
mod tree;

pub use flatten::{flatten, flatten_into};
pub use tree::{XmlElement, local_name};

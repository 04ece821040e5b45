pub mod common;
pub mod selection;
pub mod topology;

pub use common::{GraphView, NodeIndex};
pub use selection::TopN;
pub use topology::{count_triangles, enumerate_cliques, intersect_sorted};

//! Record transforms applied between fetch and rendering
//!
//! - [`normalize`]: reconciles the two Hacker News item shapes
//! - [`trim`]: bounds comment trees by depth and per-level breadth
//! - [`citations`]: maps `[domain#N]` markers to numbered sources

pub mod citations;
pub mod normalize;
pub mod trim;

pub use citations::{build_citation_map, cite, process_citations, CitationMap, CitationSource, CitationTarget};
pub use normalize::{count_descendants, normalize_item};
pub use trim::{trim_tree, TreeNode, TrimLimits};

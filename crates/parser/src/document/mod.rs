//! Graph document front-end interface
//!
//! A graph document is the JSON form of a service description graph as a
//! front-end hands it over: namespaces with their operations, named types,
//! and override directives.
//!
//! ## Usage
//! ```rust,ignore
//! use clientgraph_parser::GraphParser;
//!
//! let parser = GraphParser::from_file("widgets.graph.json")?;
//! let graph = parser.parse()?;
//! ```

mod converter;
mod parser;
mod types;

pub use converter::{parse_status, primitive_kind};
pub use parser::GraphParser;
pub use types::*;

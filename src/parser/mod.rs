//! The declarative UI format: literal lexing, escapes, the streaming parser
//! and the node tree it builds.

pub mod escape;
pub mod lexer;
pub mod node;
pub mod text_parser;

pub use escape::{escape, unescape};
pub use node::{Node, NodeBuilder, ParseDiagnostic};
pub use text_parser::{ReadStream, SliceStream, TextParser, TextParserStream, TextParserTarget};

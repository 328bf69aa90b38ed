//! Go declaration parser (Logos lexer + recursive descent).
//!
//! - The lexer uses Logos and implements Go semicolon insertion. Comments are
//!   captured so declarations can carry their doc comments.
//! - The parser reads package clauses, imports and type declarations into an
//!   arena AST; function bodies and value declarations are skipped.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
mod parser_support;
pub mod walk;

pub use error::{Diag, LineIndex, ParseFailure};
pub use lexer::Lexer;
pub use parser::{
    parse_file, parse_receiver, parse_type_list, ParsedFile, ParsedReceiver, ParsedTypes,
};

pub mod annotations;
pub mod ast;
pub mod checker;
pub mod error;
pub mod lexer;
pub mod location;
pub mod parser;
pub mod printer;
pub mod scanner;
pub mod serialization;
pub mod utils;
pub mod api;

pub use api::{analyze, check, parse, tokenize, AnalysisResult};
pub use error::{ContractError, ErrorKind};

pub mod codegen;
pub mod parser;

pub use codegen::generate;
pub use parser::{parse, ParseOutput, SourceLine};

//! Document loading and chunking

mod chunker;
mod parser;

pub use chunker::RecursiveTextSplitter;
pub use parser::DocumentLoader;

#[cfg(test)]
pub(crate) use parser::tests::build_pdf as test_pdf;

//! Local sentence embeddings

pub mod onnx_embedder;

pub use onnx_embedder::OnnxEmbedder;

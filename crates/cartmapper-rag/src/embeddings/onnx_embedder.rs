//! ONNX-based sentence embeddings
//!
//! Runs all-MiniLM-L6-v2 on the CPU through ONNX Runtime. Token embeddings
//! are mean-pooled under the attention mask and L2-normalized, so cosine
//! similarity between two outputs is their dot product.

use async_trait::async_trait;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;

/// Model files fetched on first use
const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

struct OnnxModel {
    session: Session,
    tokenizer: Tokenizer,
}

/// ONNX sentence embedder shared across requests
pub struct OnnxEmbedder {
    model: Arc<Mutex<OnnxModel>>,
    model_name: String,
    dimensions: usize,
    max_length: usize,
    batch_size: usize,
}

impl OnnxEmbedder {
    /// Load the model, downloading it into the cache directory if needed
    pub async fn new(config: &EmbeddingConfig) -> Result<Self> {
        tracing::info!("Initializing ONNX embedder with model: {}", config.model);

        let model_dir = config.cache_dir.join(&config.model);
        tokio::fs::create_dir_all(&model_dir).await.map_err(|e| {
            Error::Config(format!("Failed to create model cache directory: {}", e))
        })?;

        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);

        if !model_path.exists() {
            download_model_file(&config.model, "onnx/model.onnx", &model_path).await?;
        }
        if !tokenizer_path.exists() {
            download_model_file(&config.model, TOKENIZER_FILE, &tokenizer_path).await?;
        }

        let threads = config.threads.max(1);
        let model = tokio::task::spawn_blocking(move || load_model(&model_path, &tokenizer_path, threads))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        tracing::info!("ONNX embedder ready ({} dimensions)", config.dimensions);

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_name: config.model.clone(),
            dimensions: config.dimensions,
            max_length: config.max_length,
            batch_size: config.batch_size.max(1),
        })
    }
}

fn load_model(model_path: &Path, tokenizer_path: &Path, threads: usize) -> Result<OnnxModel> {
    let session = Session::builder()
        .map_err(|e| Error::embedding(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| Error::embedding(format!("Failed to set optimization level: {}", e)))?
        .with_intra_threads(threads)
        .map_err(|e| Error::embedding(format!("Failed to set threads: {}", e)))?
        .commit_from_file(model_path)
        .map_err(|e| Error::embedding(format!("Failed to load model: {}", e)))?;

    let tokenizer = Tokenizer::from_file(tokenizer_path)
        .map_err(|e| Error::embedding(format!("Failed to load tokenizer: {}", e)))?;

    Ok(OnnxModel { session, tokenizer })
}

impl OnnxModel {
    /// Embed one batch of texts
    fn embed(&mut self, texts: &[String], max_length: usize, dimensions: usize) -> Result<Vec<Vec<f32>>> {
        let batch = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| Error::embedding(format!("Tokenization failed: {}", e)))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .clamp(1, max_length);

        let mut input_ids = vec![0i64; batch * seq_len];
        let mut attention_mask = vec![0i64; batch * seq_len];
        let mut token_type_ids = vec![0i64; batch * seq_len];

        for (row, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();

            for col in 0..ids.len().min(seq_len) {
                let at = row * seq_len + col;
                input_ids[at] = ids[col] as i64;
                attention_mask[at] = mask[col] as i64;
                token_type_ids[at] = types[col] as i64;
            }
        }

        let shape = vec![batch, seq_len];
        let to_tensor = |data: Vec<i64>, name: &str| {
            Tensor::from_array((shape.clone(), data.into_boxed_slice()))
                .map_err(|e| Error::embedding(format!("Failed to build {} tensor: {}", name, e)))
        };

        let inputs = vec![
            ("input_ids", to_tensor(input_ids, "input_ids")?.into_dyn()),
            ("attention_mask", to_tensor(attention_mask.clone(), "attention_mask")?.into_dyn()),
            ("token_type_ids", to_tensor(token_type_ids, "token_type_ids")?.into_dyn()),
        ];

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| Error::embedding(format!("Inference failed: {}", e)))?;

        let outputs: Vec<_> = outputs.iter().collect();
        let hidden = outputs
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| outputs.first())
            .map(|(_, value)| value)
            .ok_or_else(|| Error::embedding("Model produced no output tensor"))?;

        let (out_shape, data) = hidden
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::embedding(format!("Failed to extract tensor: {}", e)))?;

        let hidden_size = out_shape.get(2).map(|&d| d as usize).unwrap_or(dimensions);
        if hidden_size != dimensions {
            return Err(Error::embedding(format!(
                "Model hidden size {} does not match configured dimensions {}",
                hidden_size, dimensions
            )));
        }
        if data.len() < batch * seq_len * hidden_size {
            return Err(Error::embedding(format!(
                "Output tensor has {} values, expected {}",
                data.len(),
                batch * seq_len * hidden_size
            )));
        }

        let mut embeddings = Vec::with_capacity(batch);
        for row in 0..batch {
            let mask = &attention_mask[row * seq_len..(row + 1) * seq_len];
            let tokens = &data[row * seq_len * hidden_size..(row + 1) * seq_len * hidden_size];
            embeddings.push(mean_pool_normalized(tokens, mask, hidden_size));
        }

        Ok(embeddings)
    }
}

/// Mean-pool token vectors where the mask is set, then L2-normalize
fn mean_pool_normalized(tokens: &[f32], mask: &[i64], hidden_size: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_size];
    let mut count = 0.0f32;

    for (token, &m) in tokens.chunks(hidden_size).zip(mask) {
        if m > 0 {
            for (acc, value) in pooled.iter_mut().zip(token) {
                *acc += value;
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        pooled.iter_mut().for_each(|v| *v /= count);
    }

    let norm = pooled.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        pooled.iter_mut().for_each(|v| *v /= norm);
    }

    pooled
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        let (max_length, dimensions, batch_size) = (self.max_length, self.dimensions, self.batch_size);

        tokio::task::spawn_blocking(move || {
            let mut model = model.lock();
            let mut all = Vec::with_capacity(texts.len());
            for batch in texts.chunks(batch_size) {
                all.extend(model.embed(batch, max_length, dimensions)?);
            }
            Ok(all)
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

/// Download one file of a sentence-transformers model from Hugging Face
async fn download_model_file(model_name: &str, remote_path: &str, path: &Path) -> Result<()> {
    let url = format!(
        "https://huggingface.co/sentence-transformers/{}/resolve/main/{}",
        model_name, remote_path
    );

    tracing::info!("Downloading {}", url);

    let response = reqwest::get(&url)
        .await
        .map_err(|e| Error::embedding(format!("Failed to download {}: {}", remote_path, e)))?;

    if !response.status().is_success() {
        return Err(Error::embedding(format!(
            "Download of {} failed: HTTP {}",
            remote_path,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::embedding(format!("Failed to read {}: {}", remote_path, e)))?;

    tokio::fs::write(path, &bytes).await?;
    tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());

    Ok(())
}

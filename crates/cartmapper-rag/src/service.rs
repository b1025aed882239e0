//! Request orchestration shared by the HTTP handlers

use bytes::Bytes;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::pipeline::{PipelineRegistry, SourceFile};
use crate::providers::RemoteFetcher;
use crate::qr::{validate_url, QrDecoder};
use crate::translation::{resolve_language, Translator, BASE_LANGUAGE};
use crate::types::{
    FileType, QrRequest, QueryOutcome, QueryRequest, QueryResponse, SourceSummary,
    TranslationWarning,
};

/// Answers questions against the active pipeline, translating as needed
pub struct QueryService {
    registry: Arc<PipelineRegistry>,
    translator: Translator,
    reject_unknown_languages: bool,
}

impl QueryService {
    /// Create a query service
    pub fn new(registry: Arc<PipelineRegistry>, translator: Translator, reject_unknown_languages: bool) -> Self {
        Self {
            registry,
            translator,
            reject_unknown_languages,
        }
    }

    /// Answer one query.
    ///
    /// A failed inbound translation short-circuits with a warning and the
    /// pipeline is not invoked. A failed outbound translation returns the
    /// untranslated answer.
    pub async fn answer(&self, request: QueryRequest) -> Result<QueryOutcome> {
        let pipeline = self.registry.current().ok_or(Error::NoPipeline)?;
        let code = resolve_language(&request.language, self.reject_unknown_languages)?;

        let question = if code == BASE_LANGUAGE {
            request.query.clone()
        } else {
            let (translated, ok) = self
                .translator
                .safe_translate(&request.query, code, BASE_LANGUAGE)
                .await;
            if !ok {
                tracing::warn!("Query translation from {} failed, not invoking pipeline", code);
                return Ok(QueryOutcome::Warning(TranslationWarning::query_translation_failed()));
            }
            translated
        };

        tracing::info!("Processing query: {}", question);
        let answer = pipeline.invoke(&question).await?;

        let answer = if code == BASE_LANGUAGE {
            answer
        } else {
            let (translated, ok) = self.translator.safe_translate(&answer, BASE_LANGUAGE, code).await;
            if !ok {
                tracing::warn!("Answer translation to {} failed, returning untranslated answer", code);
            }
            translated
        };

        Ok(QueryOutcome::Answered(QueryResponse {
            answer,
            language: request.language,
            output_method: request.output_method,
        }))
    }
}

/// Turns uploads, QR codes and PDF links into an active pipeline
pub struct IngestService {
    registry: Arc<PipelineRegistry>,
    fetcher: Arc<dyn RemoteFetcher>,
}

impl IngestService {
    /// Create an ingest service
    pub fn new(registry: Arc<PipelineRegistry>, fetcher: Arc<dyn RemoteFetcher>) -> Self {
        Self { registry, fetcher }
    }

    /// Ingest an uploaded file
    pub async fn ingest_upload(&self, file_type: FileType, data: Bytes, filename: String) -> Result<SourceSummary> {
        tracing::info!(
            "Ingesting uploaded {} {} ({} bytes)",
            file_type.display_name(),
            filename,
            data.len()
        );
        self.registry.rebuild(SourceFile::new(file_type, data, filename)).await
    }

    /// Decode a QR code, download the PDF it links to and ingest it.
    ///
    /// Returns the decoded URL.
    pub async fn ingest_qr(&self, request: QrRequest) -> Result<String> {
        let image = if request.is_url {
            self.fetcher.fetch_image(&request.qr_data).await?
        } else {
            Bytes::new()
        };

        let payload = tokio::task::spawn_blocking(move || {
            if request.is_url {
                QrDecoder::decode_bytes(&image)
            } else {
                QrDecoder::decode_base64(&request.qr_data)
            }
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??
        .ok_or(Error::NoQrCode)?;

        let url = validate_url(&payload)?.to_string();
        tracing::info!("QR code points to {}", url);

        self.ingest_pdf_url(&url).await?;
        Ok(url)
    }

    /// Download a PDF and ingest it
    pub async fn ingest_pdf_url(&self, url: &str) -> Result<SourceSummary> {
        let data = self.fetcher.download_pdf(url).await?;
        self.registry
            .rebuild(SourceFile::new(FileType::Pdf, data, url))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RagConfig, TranslationConfig};
    use crate::ingestion::test_pdf;
    use crate::pipeline::PipelineBuilder;
    use crate::providers::TranslationProvider;
    use crate::testing::{FailingTranslator, HashEmbedder, ScriptedLlm, StaticFetcher, TaggingTranslator};
    use base64::Engine;
    use image::{DynamicImage, ImageFormat, Luma};
    use std::io::Cursor;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn registry(dir: &TempDir, llm: Arc<ScriptedLlm>) -> Arc<PipelineRegistry> {
        let mut config = RagConfig::default();
        config.vector_db.storage_path = dir.path().to_path_buf();
        Arc::new(PipelineRegistry::new(PipelineBuilder::new(
            &config,
            Arc::new(HashEmbedder::new(32)),
            llm,
        )))
    }

    fn query_service(registry: Arc<PipelineRegistry>, provider: Arc<dyn TranslationProvider>) -> QueryService {
        let config = TranslationConfig {
            retry_delay_ms: 1,
            ..TranslationConfig::default()
        };
        QueryService::new(registry, Translator::new(provider, &config), false)
    }

    fn qr_png(payload: &str) -> Vec<u8> {
        let image = qrcode::QrCode::new(payload.as_bytes())
            .unwrap()
            .render::<Luma<u8>>()
            .min_dimensions(200, 200)
            .build();
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(image)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    async fn ingest_csv(registry: &Arc<PipelineRegistry>) {
        registry
            .rebuild(SourceFile::new(FileType::Csv, &b"name,price\nApple,1.50\n"[..], "prices.csv"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_query_before_ingest_is_rejected() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new("x"));
        let service = query_service(registry(&dir, llm.clone()), Arc::new(TaggingTranslator::new()));

        let err = service.answer(QueryRequest::new("price?")).await.unwrap_err();
        assert!(matches!(err, Error::NoPipeline));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_english_query_skips_translation() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new("apple price"));
        let registry = registry(&dir, llm.clone());
        ingest_csv(&registry).await;
        let translator = Arc::new(TaggingTranslator::new());
        let service = query_service(registry, translator.clone());

        let outcome = service.answer(QueryRequest::new("price of apples?")).await.unwrap();
        match outcome {
            QueryOutcome::Answered(response) => {
                assert!(response.answer.contains("price: 1.50"));
                assert_eq!(response.language, "English");
                assert_eq!(response.output_method, "Text Only");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_translates_in_and_out() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new("apple price"));
        let registry = registry(&dir, llm.clone());
        ingest_csv(&registry).await;
        let service = query_service(registry, Arc::new(TaggingTranslator::new()));

        let outcome = service
            .answer(QueryRequest::new("seb ka daam?").with_language("Hindi"))
            .await
            .unwrap();

        let QueryOutcome::Answered(response) = outcome else {
            panic!("expected an answer");
        };
        assert!(response.answer.starts_with("[hi] ECHO"));
        assert!(llm.answer_prompts()[0].contains("Question: [en] seb ka daam?"));
        assert_eq!(response.language, "Hindi");
    }

    #[tokio::test]
    async fn test_failed_inbound_translation_returns_warning_only() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new("apple price"));
        let registry = registry(&dir, llm.clone());
        ingest_csv(&registry).await;
        let calls_after_ingest = llm.calls();
        let service = query_service(registry, Arc::new(FailingTranslator::new()));

        let outcome = service
            .answer(QueryRequest::new("seb ka daam?").with_language("Hindi"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            QueryOutcome::Warning(TranslationWarning::query_translation_failed())
        );
        assert_eq!(llm.calls(), calls_after_ingest);
    }

    #[tokio::test]
    async fn test_pipeline_failure_is_internal_error() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, Arc::new(ScriptedLlm::failing_answers("apple")));
        ingest_csv(&registry).await;
        let service = query_service(registry, Arc::new(TaggingTranslator::new()));

        let err = service.answer(QueryRequest::new("price?")).await.unwrap_err();
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_qr_without_code() {
        let dir = TempDir::new().unwrap();
        let blank = image::GrayImage::from_pixel(100, 100, Luma([255]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(blank).write_to(&mut buf, ImageFormat::Png).unwrap();
        let encoded = base64::engine::general_purpose::STANDARD.encode(buf.into_inner());

        let service = IngestService::new(
            registry(&dir, Arc::new(ScriptedLlm::new(""))),
            Arc::new(StaticFetcher { image: None, pdf: None }),
        );
        let err = service
            .ingest_qr(QrRequest { qr_data: encoded, is_url: false })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No QR code found");
    }

    #[tokio::test]
    async fn test_qr_url_flow_ingests_pdf() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, Arc::new(ScriptedLlm::new("")));
        let pdf = test_pdf(&[Some("Dairy aisle 4")]);
        let service = IngestService::new(
            registry.clone(),
            Arc::new(StaticFetcher {
                image: Some(Bytes::from(qr_png("https://example.com/menu.pdf"))),
                pdf: Some(Bytes::from(pdf)),
            }),
        );

        let url = service
            .ingest_qr(QrRequest {
                qr_data: "https://example.com/qr.png".to_string(),
                is_url: true,
            })
            .await
            .unwrap();

        assert_eq!(url, "https://example.com/menu.pdf");
        let summary = registry.summary().unwrap();
        assert_eq!(summary.file_type, FileType::Pdf);
        assert_eq!(summary.origin, "https://example.com/menu.pdf");
    }

    #[tokio::test]
    async fn test_qr_with_plain_text_payload() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, Arc::new(ScriptedLlm::new("")));
        let service = IngestService::new(
            registry.clone(),
            Arc::new(StaticFetcher { image: None, pdf: None }),
        );
        let encoded = base64::engine::general_purpose::STANDARD.encode(qr_png("hello"));

        let err = service
            .ingest_qr(QrRequest { qr_data: encoded, is_url: false })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "QR code does not contain a valid URL");
        assert!(registry.current().is_none());
    }
}

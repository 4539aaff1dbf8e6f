//! Multi-step document analysis and cache warming.
//!
//! Unlike the single operations on [`DocumentIntelligence`], the pipeline
//! never fails on an upstream error: each step falls back to a neutral value
//! and the report is still produced. Fallback values are never cached.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{Classification, DocumentIntelligence};

/// Sample documents classified by [`DocumentIntelligence::warm`].
pub const WARM_SAMPLES: &[(&str, &str)] = &[
    (
        "invoice",
        "INVOICE\nInvoice No: INV-12345\nDate: 2024-01-15\nTotal: $1,234.56",
    ),
    (
        "receipt",
        "RECEIPT\nStore: ABC Mart\nDate: 2024-01-15\nTotal: $45.99",
    ),
    (
        "report",
        "QUARTERLY REPORT\nQ4 2024\nRevenue: $1.2M\nProfit: $450K",
    ),
];

const SUMMARY_UNAVAILABLE: &str = "Summary unavailable";

/// Input to [`DocumentIntelligence::analyze`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeRequest {
    pub text: String,
    /// Extract as this type instead of the detected one.
    pub override_type: Option<String>,
    pub include_summary: bool,
    pub include_embeddings: bool,
}

impl AnalyzeRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Output of [`DocumentIntelligence::analyze`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub detected_type: String,
    pub used_type: String,
    pub override_used: bool,
    pub detection_confidence: f64,
    pub extraction: Value,
    pub summary: Option<String>,
    pub embeddings: Option<Vec<f32>>,
}

/// One classified warm-up sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmedSample {
    #[serde(rename = "type")]
    pub sample_type: String,
    pub classified_as: String,
    pub confidence: f64,
}

impl DocumentIntelligence {
    /// Classify, extract and optionally summarize and embed a document.
    pub async fn analyze(&self, request: &AnalyzeRequest) -> AnalysisReport {
        let text = request.text.as_str();

        let detected = self.classify(text).await.unwrap_or_else(|e| {
            warn!(error = %e, "Classification failed, using fallback");
            Classification::unknown()
        });

        let used_type = request
            .override_type
            .clone()
            .unwrap_or_else(|| detected.document_type.clone());

        let extraction = self.extract(text, &used_type).await.unwrap_or_else(|e| {
            warn!(doc_type = %used_type, error = %e, "Extraction failed, using fallback");
            json!({ "raw_text": text })
        });

        let summary = if request.include_summary {
            Some(self.summarize(text).await.unwrap_or_else(|e| {
                warn!(error = %e, "Summary failed, using fallback");
                SUMMARY_UNAVAILABLE.to_string()
            }))
        } else {
            None
        };

        let embeddings = if request.include_embeddings {
            Some(self.embed(text).await.unwrap_or_else(|e| {
                warn!(error = %e, "Embedding failed, using fallback");
                Vec::new()
            }))
        } else {
            None
        };

        info!(
            detected_type = %detected.document_type,
            used_type = %used_type,
            confidence = detected.confidence,
            "Document analyzed"
        );

        AnalysisReport {
            detected_type: detected.document_type,
            used_type,
            override_used: request.override_type.is_some(),
            detection_confidence: detected.confidence,
            extraction,
            summary,
            embeddings,
        }
    }

    /// Classify every entry of [`WARM_SAMPLES`] concurrently, populating the
    /// classify cache.
    pub async fn warm(&self) -> Vec<WarmedSample> {
        let tasks = WARM_SAMPLES.iter().map(|(sample_type, text)| async move {
            let result = self.classify(text).await.unwrap_or_else(|e| {
                warn!(sample = %sample_type, error = %e, "Warm-up classification failed");
                Classification::unknown()
            });
            WarmedSample {
                sample_type: sample_type.to_string(),
                classified_as: result.document_type,
                confidence: result.confidence,
            }
        });
        let warmed = join_all(tasks).await;
        info!(samples = warmed.len(), "Cache warmed");
        warmed
    }
}

//! Confidence-gated autofill from image extraction

use crate::error::ExtractError;
use crate::form::FlightForm;
use crate::ports::{FlightExtractor, ImageUpload};
use crate::types::{ExtractedFlightData, FieldName};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Above this confidence the extraction is trusted
pub const HIGH_CONFIDENCE: f64 = 0.6;

/// At or below this confidence nothing is filled
pub const MIN_CONFIDENCE: f64 = 0.3;

/// Fields an extraction can fill
pub const EXTRACTABLE_FIELDS: [FieldName; 4] = [
    FieldName::Airline,
    FieldName::FlightNumber,
    FieldName::ArrivalDate,
    FieldName::ArrivalTime,
];

/// How far an extraction can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    /// confidence > 0.6
    High,
    /// 0.3 < confidence <= 0.6
    Low,
    /// confidence <= 0.3, or not a number
    Rejected,
}

impl ConfidenceTier {
    /// Classify a confidence score
    #[must_use]
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > HIGH_CONFIDENCE {
            Self::High
        } else if confidence > MIN_CONFIDENCE {
            Self::Low
        } else {
            Self::Rejected
        }
    }

    /// Whether values should be copied into the form
    #[inline]
    #[must_use]
    pub fn autofills(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// What happened to the form after an extraction
#[derive(Debug, Clone, PartialEq)]
pub enum AutofillReport {
    /// Fields filled with high confidence
    Filled {
        fields: Vec<FieldName>,
        confidence: f64,
    },
    /// Fields filled, but the user should double-check them
    LowConfidence {
        fields: Vec<FieldName>,
        confidence: f64,
    },
    /// Nothing filled; fall back to manual entry
    Unreadable { confidence: f64 },
    /// The extraction call failed
    Failed { error: ExtractError },
    /// An extraction is already running
    Busy,
}

impl AutofillReport {
    /// Message to show the user
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Filled { .. } => {
                "Flight details extracted. Please review before submitting.".to_string()
            }
            Self::LowConfidence { .. } => {
                "Some details may be inaccurate. Please double-check the highlighted fields."
                    .to_string()
            }
            Self::Unreadable { .. } => {
                "Could not read flight details from this image. Please fill the form manually."
                    .to_string()
            }
            Self::Failed { error } => error.to_string(),
            Self::Busy => "Image analysis already in progress.".to_string(),
        }
    }

    /// Confidence reported by the extractor, when a reply was parsed
    #[must_use]
    pub fn confidence(&self) -> Option<f64> {
        match self {
            Self::Filled { confidence, .. }
            | Self::LowConfidence { confidence, .. }
            | Self::Unreadable { confidence } => Some(*confidence),
            Self::Failed { .. } | Self::Busy => None,
        }
    }

    /// Fields that were written into the form
    #[must_use]
    pub fn filled_fields(&self) -> &[FieldName] {
        match self {
            Self::Filled { fields, .. } | Self::LowConfidence { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Whether any field was written
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Filled { .. } | Self::LowConfidence { .. })
    }
}

impl FlightForm {
    /// Merge extracted data into the form behind the confidence gate
    ///
    /// Filled fields are marked touched so validation feedback shows at once.
    pub fn apply_extraction(&mut self, data: &ExtractedFlightData) -> AutofillReport {
        let confidence = data.confidence;
        let tier = ConfidenceTier::from_confidence(confidence);
        if !tier.autofills() {
            return AutofillReport::Unreadable { confidence };
        }

        let mut fields = Vec::new();
        for field in EXTRACTABLE_FIELDS {
            if let Some(value) = data.value_for(field) {
                self.set_value(field, value);
                self.mark_touched(field);
                fields.push(field);
            }
        }

        match tier {
            ConfidenceTier::High => AutofillReport::Filled { fields, confidence },
            _ => AutofillReport::LowConfidence { fields, confidence },
        }
    }
}

/// Runs extractions against a form, one at a time
pub struct AutofillFlow {
    extractor: Arc<dyn FlightExtractor>,
    processing: AtomicBool,
}

impl std::fmt::Debug for AutofillFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutofillFlow")
            .field("processing", &self.is_processing())
            .finish_non_exhaustive()
    }
}

impl AutofillFlow {
    /// Create a flow over an extractor
    #[inline]
    #[must_use]
    pub fn new(extractor: Arc<dyn FlightExtractor>) -> Self {
        Self {
            extractor,
            processing: AtomicBool::new(false),
        }
    }

    /// Busy flag while an image is being analysed
    #[inline]
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Option<Processing<'_>> {
        self.processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Processing(&self.processing))
    }

    /// Extract flight data from an image and merge it into the form
    pub async fn autofill(&self, form: &mut FlightForm, image: ImageUpload) -> AutofillReport {
        let Some(processing) = self.try_begin() else {
            tracing::debug!("Autofill ignored: extraction already running");
            return AutofillReport::Busy;
        };

        tracing::info!(
            "Analysing image {} ({} bytes)",
            image.file_name,
            image.len()
        );
        let result = self.extractor.extract(image).await;
        drop(processing);

        match result {
            Ok(data) => {
                let report = form.apply_extraction(&data);
                tracing::info!(
                    "Extraction confidence {:.2}: {} field(s) filled",
                    data.confidence,
                    report.filled_fields().len()
                );
                report
            }
            Err(error) => {
                if let ExtractError::Failed { detail } = &error {
                    tracing::error!("Extraction failed: {}", detail);
                } else {
                    tracing::error!("Extraction failed: {}", error);
                }
                AutofillReport::Failed { error }
            }
        }
    }
}

/// Clears the busy flag when the extraction ends or is dropped
struct Processing<'a>(&'a AtomicBool);

impl Drop for Processing<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

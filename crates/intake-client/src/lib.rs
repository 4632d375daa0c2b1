//! Flight Intake Client - HTTP adapters
//!
//! - [`HttpFlightGateway`]: posts payloads to the submission endpoint
//! - [`VisionExtractor`]: reads flight details from images via a vision model

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod imaging;
pub mod submit;
pub mod vision;

pub use imaging::{fit_within, prepare_image, ImageOptions, PreparedImage};
pub use submit::HttpFlightGateway;
pub use vision::{parse_extraction, strip_code_fences, VisionExtractor, EXTRACTION_PROMPT};

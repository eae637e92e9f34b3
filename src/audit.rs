//! Content fingerprints for reproducibility checks
//!
//! Two runs over the same intake must produce the same financial model;
//! the fingerprints recorded in generation metadata make that auditable.

use crate::financial::FinancialModel;
use crate::models::BusinessIntake;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Write;
use tracing::warn;

/// SHA-256 of the intake's canonical JSON
pub fn intake_fingerprint(intake: &BusinessIntake) -> Option<String> {
    fingerprint(intake)
}

/// SHA-256 of the financial model's canonical JSON
pub fn model_fingerprint(model: &FinancialModel) -> Option<String> {
    fingerprint(model)
}

/// Stream JSON directly into the hasher (no intermediate String).
/// `None` if the value cannot be serialized.
fn fingerprint<T: Serialize>(value: &T) -> Option<String> {
    let mut hasher = Sha256::new();

    if let Err(e) = serde_json::to_writer(&mut HashWriter(&mut hasher), value) {
        warn!(error = %e, "Could not fingerprint value");
        return None;
    }

    Some(hex::encode(hasher.finalize()))
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use sha2::{Digest, Sha256};

/// UID root for identifiers derived from a 128-bit number (ISO/IEC 9834-8).
const UUID_ROOT: &str = "2.25";

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh DICOM UID of the form `2.25.<decimal 128-bit value>`.
pub fn generate_uid() -> String {
    let mut hasher = Sha256::new();
    hasher.update(Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    format!("{}.{}", UUID_ROOT, u128::from_be_bytes(bytes))
}

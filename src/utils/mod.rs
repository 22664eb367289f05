//! Utility modules for the Wellscore Gateway

pub mod error;

pub use error::{AnalysisFailure, GatewayError, Result};

/// Generate an opaque analysis id (timestamp + random composite)
pub fn generate_analysis_id() -> String {
    format!(
        "analysis_{}_{:08x}",
        chrono::Utc::now().timestamp_millis(),
        rand::random::<u32>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_ids_are_unique() {
        let a = generate_analysis_id();
        let b = generate_analysis_id();
        assert!(a.starts_with("analysis_"));
        assert_ne!(a, b);
    }
}

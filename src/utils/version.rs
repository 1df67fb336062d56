//! Version tokens for new executions.

use chrono::{DateTime, Utc};

/// Mint a version token `<prefix>-<yyyyMMddHHmmssSSS>` from the current UTC
/// time. An empty prefix yields the bare timestamp.
pub fn generate_version(prefix: &str) -> String {
    version_at(prefix, Utc::now())
}

fn version_at(prefix: &str, at: DateTime<Utc>) -> String {
    let stamp = at.format("%Y%m%d%H%M%S%3f");
    if prefix.is_empty() {
        stamp.to_string()
    } else {
        format!("{}-{}", prefix, stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_version_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(version_at("deploy", at), "deploy-20240305070809042");
        assert_eq!(version_at("", at), "20240305070809042");
    }

    #[test]
    fn test_generate_version_has_prefix() {
        let version = generate_version("deploy");
        assert!(version.starts_with("deploy-"));
        assert_eq!(version.len(), "deploy-".len() + 17);
    }
}

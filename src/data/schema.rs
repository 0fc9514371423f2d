//! Fixed feature schema for the phishing-website dataset.
//!
//! The 30 feature names and the target column are the contract between every
//! pipeline stage: validation requires an exact match, transformation and
//! serving address columns by these names.

use std::collections::BTreeSet;

/// Name of the label column. Raw labels are `{-1, 1}` and are remapped to
/// `{0, 1}` before any metric computation.
pub const TARGET_COLUMN: &str = "Result";

/// The 30 named features, order-insensitive across stages.
pub const FEATURE_COLUMNS: [&str; 30] = [
    "having_IP_Address",
    "URL_Length",
    "Shortining_Service",
    "having_At_Symbol",
    "double_slash_redirecting",
    "Prefix_Suffix",
    "having_Sub_Domain",
    "SSLfinal_State",
    "Domain_registeration_length",
    "Favicon",
    "port",
    "HTTPS_token",
    "Request_URL",
    "URL_of_Anchor",
    "Links_in_tags",
    "SFH",
    "Submitting_to_email",
    "Abnormal_URL",
    "Redirect",
    "on_mouseover",
    "RightClick",
    "popUpWidnow",
    "Iframe",
    "age_of_domain",
    "DNSRecord",
    "web_traffic",
    "Page_Rank",
    "Google_Index",
    "Links_pointing_to_page",
    "Statistical_report",
];

/// The full expected column set: all features plus the target.
pub fn expected_columns() -> BTreeSet<&'static str> {
    let mut set: BTreeSet<&'static str> = FEATURE_COLUMNS.iter().copied().collect();
    set.insert(TARGET_COLUMN);
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_has_thirty_features_plus_target() {
        assert_eq!(FEATURE_COLUMNS.len(), 30);
        let expected = expected_columns();
        assert_eq!(expected.len(), 31);
        assert!(expected.contains(TARGET_COLUMN));
    }
}

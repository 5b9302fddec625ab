//! Researcher profile types
//!
//! JSON field names match what the dashboard front end already consumes
//! (`orcid_id`, `name`, `current_affiliation`, ...).

use serde::{Deserialize, Serialize};

use crate::orcid_id;

/// Researcher identity as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Bare ORCID iD, or [`orcid_id::UNKNOWN_ID`]
    #[serde(rename = "orcid_id")]
    pub id: String,
    /// Display name
    #[serde(rename = "name")]
    pub display_name: String,
    /// Primary email, when public
    pub email: Option<String>,
    /// Current employer
    #[serde(rename = "current_affiliation")]
    pub affiliation: Option<String>,
    /// Location of the current employer
    #[serde(rename = "current_location")]
    pub location: Option<String>,
    /// Public ORCID profile page
    pub profile_url: String,
    /// Whether the session counts as signed in
    pub authenticated: bool,
}

impl Identity {
    /// Identity with only an identifier and a display name
    ///
    /// Malformed identifiers collapse to the `Unknown` sentinel.
    pub fn bare(raw_id: &str, display_name: impl Into<String>) -> Self {
        let id = orcid_id::normalize_or_unknown(raw_id);
        Self {
            profile_url: orcid_id::profile_url(&id),
            id,
            display_name: display_name.into(),
            email: None,
            affiliation: None,
            location: None,
            authenticated: false,
        }
    }
}

/// One row of a batch profile summary lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearcherSummary {
    pub id: String,
    pub name: Option<String>,
    pub institution: Option<String>,
}

/// One row of the following view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEntry {
    #[serde(rename = "orcid_id")]
    pub researcher_id: String,
    pub name: Option<String>,
    pub institution: Option<String>,
}

impl FollowEntry {
    /// Row carrying only the identifier (no public data available)
    pub fn placeholder(researcher_id: impl Into<String>) -> Self {
        Self {
            researcher_id: researcher_id.into(),
            name: None,
            institution: None,
        }
    }

    /// True when this row was synthesized without summary data
    pub fn is_placeholder(&self) -> bool {
        self.name.is_none() && self.institution.is_none()
    }
}

impl From<ResearcherSummary> for FollowEntry {
    fn from(summary: ResearcherSummary) -> Self {
        Self {
            researcher_id: summary.id,
            name: summary.name,
            institution: summary.institution,
        }
    }
}

/// Credential held by the local session store after sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub orcid_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_identity_unknown_for_malformed_id() {
        let identity = Identity::bare("garbage", "Someone");
        assert_eq!(identity.id, orcid_id::UNKNOWN_ID);
        assert!(!identity.authenticated);
    }

    #[test]
    fn test_identity_json_field_names() {
        let identity = Identity::bare("0000-0003-1574-0784", "Ada");
        let json = serde_json::to_value(&identity).unwrap();

        assert_eq!(json["orcid_id"], "0000-0003-1574-0784");
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["profile_url"], "https://orcid.org/0000-0003-1574-0784");
        assert!(json["current_affiliation"].is_null());
    }

    #[test]
    fn test_placeholder_entry() {
        let entry = FollowEntry::placeholder("0000-0002");
        assert!(entry.is_placeholder());

        let full = FollowEntry::from(ResearcherSummary {
            id: "0000-0001".to_string(),
            name: Some("Grace".to_string()),
            institution: None,
        });
        assert!(!full.is_placeholder());
    }
}

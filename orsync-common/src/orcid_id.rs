//! ORCID iD helpers
//!
//! An ORCID iD is four hyphen-separated groups of four characters, e.g.
//! `0000-0003-1574-0784`. The final character is a checksum digit and may be
//! `X`. Identifiers are often passed around in URI form
//! (`https://orcid.org/0000-...`), so everything here accepts either.

use crate::{Error, Result};

/// Sentinel identifier for identities whose ORCID iD could not be determined
pub const UNKNOWN_ID: &str = "Unknown";

/// Public profile host used to build profile links
pub const PROFILE_HOST: &str = "https://orcid.org";

const URI_PREFIXES: [&str; 2] = ["https://orcid.org/", "http://orcid.org/"];

/// Strip any `orcid.org` URI prefix and surrounding whitespace
///
/// Does not check the format; see [`is_valid`] for that.
///
/// # Examples
///
/// ```
/// use orsync_common::orcid_id::clean;
///
/// assert_eq!(clean("https://orcid.org/0000-0003-1574-0784").unwrap(), "0000-0003-1574-0784");
/// assert!(clean("   ").is_err());
/// ```
pub fn clean(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("ORCID iD cannot be empty".to_string()));
    }

    let bare = URI_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);

    Ok(bare.to_string())
}

/// Check that `raw` is a well-formed ORCID iD (after cleaning)
pub fn is_valid(raw: &str) -> bool {
    match clean(raw) {
        Ok(id) => has_orcid_shape(&id),
        Err(_) => false,
    }
}

/// Clean and validate, returning the bare identifier
pub fn parse(raw: &str) -> Result<String> {
    let id = clean(raw)?;
    if has_orcid_shape(&id) {
        Ok(id)
    } else {
        Err(Error::InvalidInput(format!("Malformed ORCID iD: {}", raw)))
    }
}

/// Bare identifier if `raw` is well-formed, [`UNKNOWN_ID`] otherwise
pub fn normalize_or_unknown(raw: &str) -> String {
    parse(raw).unwrap_or_else(|_| UNKNOWN_ID.to_string())
}

/// Public profile URL for an identifier
pub fn profile_url(id: &str) -> String {
    let bare = clean(id).unwrap_or_else(|_| id.to_string());
    format!("{}/{}", PROFILE_HOST, bare)
}

fn has_orcid_shape(id: &str) -> bool {
    let groups: Vec<&str> = id.split('-').collect();
    if groups.len() != 4 {
        return false;
    }

    groups.iter().enumerate().all(|(index, group)| {
        group.len() == 4
            && group.chars().enumerate().all(|(pos, c)| {
                let is_checksum = index == 3 && pos == 3;
                c.is_ascii_digit() || (is_checksum && c == 'X')
            })
    })
}

// Stable error codes, grouped by taxonomy category.
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    pub const INVALID_INPUT: Self = Self(validation::INVALID_INPUT);
    pub const INVALID_CONFIGURATION: Self = Self(validation::INVALID_CONFIGURATION);
    pub const STORE_UNAVAILABLE: Self = Self(collaborator::STORE_UNAVAILABLE);
    pub const CATALOG_UNAVAILABLE: Self = Self(collaborator::CATALOG_UNAVAILABLE);
    pub const SCHEDULING_UNAVAILABLE: Self = Self(collaborator::SCHEDULING_UNAVAILABLE);
    pub const SLOT_TAKEN: Self = Self(collaborator::SLOT_TAKEN);
    pub const RESPONDER_FAILED: Self = Self(collaborator::RESPONDER_FAILED);
    pub const EXTRACTION_FAILED: Self = Self(collaborator::EXTRACTION_FAILED);
    pub const STALE_STEP: Self = Self(reconstruction::STALE_STEP);
    pub const NO_PROCEDURE: Self = Self(no_match::NO_PROCEDURE);
    pub const INTERNAL: Self = Self(internal::INTERNAL);

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
    pub const INVALID_CONFIGURATION: &str = "VALIDATION_1002";
}

pub mod collaborator {
    pub const STORE_UNAVAILABLE: &str = "COLLAB_2001";
    pub const CATALOG_UNAVAILABLE: &str = "COLLAB_2002";
    pub const SCHEDULING_UNAVAILABLE: &str = "COLLAB_2003";
    pub const SLOT_TAKEN: &str = "COLLAB_2004";
    pub const RESPONDER_FAILED: &str = "COLLAB_2005";
    pub const EXTRACTION_FAILED: &str = "COLLAB_2006";
}

pub mod reconstruction {
    pub const STALE_STEP: &str = "RECON_3001";
}

pub mod no_match {
    pub const NO_PROCEDURE: &str = "MATCH_4001";
}

pub mod internal {
    pub const INTERNAL: &str = "INTERNAL_9001";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_serialize_as_plain_strings() {
        let json = serde_json::to_string(&ErrorCode::SLOT_TAKEN).unwrap();
        assert_eq!(json, "\"COLLAB_2004\"");
        assert_eq!(ErrorCode::STALE_STEP.to_string(), "RECON_3001");
    }
}

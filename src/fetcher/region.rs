//! Server region derivation from a player UID

use super::{FetcherError, FetcherResult};
use std::fmt;

/// HoYoLAB game server region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// America
    America,
    /// Asia
    Asia,
    /// Europe
    Europe,
    /// TW/HK/MO
    Sar,
}

impl Region {
    /// Derive the region from the UID prefix
    ///
    /// # Errors
    /// Returns [`FetcherError::InvalidUid`] if the UID is not numeric or its
    /// prefix belongs to no known region.
    pub fn from_uid(uid: &str) -> FetcherResult<Self> {
        if uid.len() < 3 || !uid.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FetcherError::InvalidUid(uid.to_string()));
        }

        match &uid[..2] {
            "10" => Ok(Region::America),
            "13" => Ok(Region::Asia),
            "15" => Ok(Region::Europe),
            "17" => Ok(Region::Sar),
            _ => Err(FetcherError::InvalidUid(uid.to_string())),
        }
    }

    /// Server identifier sent to the API
    pub fn server(&self) -> &'static str {
        match self {
            Region::America => "prod_gf_us",
            Region::Asia => "prod_gf_jp",
            Region::Europe => "prod_gf_eu",
            Region::Sar => "prod_gf_sg",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.server())
    }
}

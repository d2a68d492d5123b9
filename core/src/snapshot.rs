use rkyv::{Archive, Deserialize, Serialize};

use crate::codec::{decode, encode, CodecError};

pub const SESSION_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub collection: String,
    pub display_order: Vec<u32>,
    pub guess: Vec<u32>,
    pub verification: Option<Vec<bool>>,
    pub verification_stale: bool,
    pub attempts: u32,
    pub total_correct: u64,
    pub best_score: u32,
    pub started_at_ms: u64,
}

impl SessionSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        decode::<SessionSnapshot>(bytes)
    }
}

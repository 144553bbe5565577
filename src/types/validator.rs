// Validator - Misbehavior evidence in, validator-set diffs out
use super::primitives::{BlockHeight, Timestamp};
use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

/// Misbehavior kinds reported by the consensus engine
///
/// The numeric codes are the engine's own; anything else is a host-level
/// invariant violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    DuplicateVote,
    LightClientAttack,
}

impl EvidenceKind {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(EvidenceKind::DuplicateVote),
            2 => Some(EvidenceKind::LightClientAttack),
            _ => None,
        }
    }
}

/// Raw misbehavior record as handed over by the block-processing loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Misbehavior {
    pub kind_code: i32,
    pub validator_address: Vec<u8>,
    pub validator_power: u64,
    pub height: BlockHeight,
    pub time: Timestamp,
    pub total_voting_power: u64,
}

/// Validator as seen by contracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceValidator {
    /// Hex-encoded consensus address
    pub address: String,
    pub power: u64,
}

/// Misbehavior record forwarded to begin-block contracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub evidence_type: EvidenceKind,
    pub validator: EvidenceValidator,
    pub height: BlockHeight,
    pub time: Timestamp,
    pub total_voting_power: u64,
}

/// One validator-set change: `power == 0` removes the validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    /// Hex-encoded Ed25519 public key
    pub pubkey: String,
    pub power: u64,
}

impl ValidatorUpdate {
    pub fn new(key: &VerifyingKey, power: u64) -> Self {
        Self {
            pubkey: hex::encode(key.as_bytes()),
            power,
        }
    }

    /// Decode and check the public key
    pub fn verifying_key(&self) -> Result<VerifyingKey, ValidatorUpdateError> {
        let bytes = hex::decode(&self.pubkey)
            .map_err(|e| ValidatorUpdateError::InvalidPubKey(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ValidatorUpdateError::InvalidPubKey(format!("{} bytes", bytes.len())))?;
        VerifyingKey::from_bytes(&bytes).map_err(|e| ValidatorUpdateError::InvalidPubKey(e.to_string()))
    }
}

/// Response payload of the validator-set callback
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorDiffResponse {
    #[serde(default)]
    pub diffs: Vec<ValidatorUpdate>,
}

impl ValidatorDiffResponse {
    /// Parse an optional payload; empty or absent means no change.
    ///
    /// Only the structure is decoded. Keys are handed to consensus as the
    /// contract wrote them.
    pub fn parse(data: Option<&[u8]>) -> Result<Vec<ValidatorUpdate>, ValidatorUpdateError> {
        let data = match data {
            Some(d) if !d.is_empty() => d,
            _ => return Ok(Vec::new()),
        };
        let response: ValidatorDiffResponse = serde_json::from_slice(data)
            .map_err(|e| ValidatorUpdateError::Malformed(e.to_string()))?;
        Ok(response.diffs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidatorUpdateError {
    #[error("malformed validator diff payload: {0}")]
    Malformed(String),

    #[error("invalid validator public key: {0}")]
    InvalidPubKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;

    fn key(seed: u8) -> VerifyingKey {
        SigningKey::from_bytes(&[seed; 32]).verifying_key()
    }

    #[test]
    fn test_evidence_codes() {
        assert_eq!(EvidenceKind::from_code(1), Some(EvidenceKind::DuplicateVote));
        assert_eq!(EvidenceKind::from_code(2), Some(EvidenceKind::LightClientAttack));
        assert_eq!(EvidenceKind::from_code(0), None);
        assert_eq!(EvidenceKind::from_code(7), None);
    }

    #[test]
    fn test_parse_absent_or_empty_payload() {
        assert!(ValidatorDiffResponse::parse(None).unwrap().is_empty());
        assert!(ValidatorDiffResponse::parse(Some(b"")).unwrap().is_empty());
        assert!(ValidatorDiffResponse::parse(Some(b"{}")).unwrap().is_empty());
    }

    #[test]
    fn test_parse_diffs() {
        let update = ValidatorUpdate::new(&key(1), 5);
        let payload = serde_json::to_vec(&ValidatorDiffResponse { diffs: vec![update.clone()] }).unwrap();
        let diffs = ValidatorDiffResponse::parse(Some(&payload)).unwrap();
        assert_eq!(diffs, vec![update]);
    }

    #[test]
    fn test_parse_keeps_keys_verbatim() {
        let payload = br#"{"diffs":[{"pubkey":"k1","power":5}]}"#;
        let diffs = ValidatorDiffResponse::parse(Some(payload)).unwrap();
        assert_eq!(
            diffs,
            vec![ValidatorUpdate {
                pubkey: "k1".into(),
                power: 5
            }]
        );
        assert!(matches!(diffs[0].verifying_key(), Err(ValidatorUpdateError::InvalidPubKey(_))));

        assert!(matches!(
            ValidatorDiffResponse::parse(Some(b"not json")),
            Err(ValidatorUpdateError::Malformed(_))
        ));
        assert!(matches!(
            ValidatorDiffResponse::parse(Some(br#"{"diffs":[{"power":5}]}"#)),
            Err(ValidatorUpdateError::Malformed(_))
        ));
    }

    #[test]
    fn test_verifying_key_roundtrip() {
        let update = ValidatorUpdate::new(&key(3), 1);
        assert_eq!(update.verifying_key().unwrap(), key(3));
    }
}

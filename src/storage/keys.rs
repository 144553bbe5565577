// Keys - Typed composite keys for the privilege index
//
// Layout:
//   registration: PREFIX_REGISTRATION | tag (1 byte) | position (1 byte) -> contract address
//   flag:         PREFIX_PRIVILEGED   | address (32 bytes)                -> FLAG_SET
//
// Every component is fixed width, so lexicographic byte order equals
// (tag, position) order and ascending position within one tag.

use super::kv::StoreError;
use crate::types::Address;

pub const PREFIX_REGISTRATION: &[u8] = b"priv:reg:";
pub const PREFIX_PRIVILEGED: &[u8] = b"priv:flag:";
pub const FLAG_SET: &[u8] = &[1];

/// Key of one registration slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RegistrationKey {
    pub tag: u8,
    pub position: u8,
}

impl RegistrationKey {
    pub const ENCODED_LEN: usize = PREFIX_REGISTRATION.len() + 2;

    pub fn new(tag: u8, position: u8) -> Self {
        Self { tag, position }
    }

    /// Prefix covering every slot of one privilege type
    pub fn type_prefix(tag: u8) -> Vec<u8> {
        let mut key = PREFIX_REGISTRATION.to_vec();
        key.push(tag);
        key
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut key = Self::type_prefix(self.tag);
        key.push(self.position);
        key
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        let rest = bytes
            .strip_prefix(PREFIX_REGISTRATION)
            .ok_or_else(|| StoreError::InvalidKey(hex::encode(bytes)))?;
        match rest {
            [tag, position] => Ok(Self::new(*tag, *position)),
            _ => Err(StoreError::InvalidKey(hex::encode(bytes))),
        }
    }
}

/// Key of the privileged flag of one contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PrivilegedKey(pub Address);

impl PrivilegedKey {
    pub fn encode(&self) -> Vec<u8> {
        let mut key = PREFIX_PRIVILEGED.to_vec();
        key.extend_from_slice(self.0.as_bytes());
        key
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        let rest = bytes
            .strip_prefix(PREFIX_PRIVILEGED)
            .ok_or_else(|| StoreError::InvalidKey(hex::encode(bytes)))?;
        Address::from_slice(rest)
            .map(PrivilegedKey)
            .map_err(|e| StoreError::InvalidKey(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_key_roundtrip() {
        let key = RegistrationKey::new(3, 200);
        let bytes = key.encode();
        assert_eq!(bytes.len(), RegistrationKey::ENCODED_LEN);
        assert!(bytes.starts_with(&RegistrationKey::type_prefix(3)));
        assert_eq!(RegistrationKey::decode(&bytes).unwrap(), key);
    }

    #[test]
    fn test_registration_key_byte_order_matches_position_order() {
        let mut keys: Vec<RegistrationKey> = vec![
            RegistrationKey::new(2, 1),
            RegistrationKey::new(1, 255),
            RegistrationKey::new(1, 2),
            RegistrationKey::new(1, 10),
        ];
        let mut encoded: Vec<Vec<u8>> = keys.iter().map(|k| k.encode()).collect();
        keys.sort();
        encoded.sort();
        let decoded: Vec<RegistrationKey> = encoded.iter().map(|b| RegistrationKey::decode(b).unwrap()).collect();
        assert_eq!(decoded, keys);
    }

    #[test]
    fn test_decode_rejects_foreign_keys() {
        assert!(RegistrationKey::decode(b"other:key").is_err());
        assert!(RegistrationKey::decode(&RegistrationKey::type_prefix(1)).is_err());
        assert!(PrivilegedKey::decode(b"priv:flag:short").is_err());
    }

    #[test]
    fn test_privileged_key_roundtrip() {
        let key = PrivilegedKey(Address::from_bytes([9; 32]));
        assert_eq!(PrivilegedKey::decode(&key.encode()).unwrap(), key);
    }
}

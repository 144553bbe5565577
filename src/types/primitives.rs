// Primitives - Types fondamentaux minimaux
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Hash universel (Blake3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash([u8; 32]);

impl Hash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash des données avec Blake3
    pub fn hash(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        Hash(*hash.as_bytes())
    }
}

/// Adresse d'un compte ou d'un contrat (32 bytes)
///
/// Text form is `0x` followed by 64 lowercase hex digits. Ordering is the
/// byte order of the raw address, which is also the store key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 32]);

impl Address {
    pub const LEN: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        if bytes.len() != Self::LEN {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(bytes);
        Ok(Address(out))
    }

    /// Derive a module account address from its name
    pub fn module(name: &str) -> Self {
        let mut data = b"module:".to_vec();
        data.extend_from_slice(name.as_bytes());
        Address(*Hash::hash(&data).as_bytes())
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Short form used in log lines
    pub fn short(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() {
            return Err(AddressError::Empty);
        }
        let bytes = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Address::from_slice(&bytes)
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("empty address")]
    Empty,

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid address length: {0} bytes (expected 32)")]
    InvalidLength(usize),
}

/// Numéro de bloc
pub type BlockHeight = u64;

/// Timestamp Unix en secondes
pub type Timestamp = u64;

/// Identifiant d'un code compilé stocké par la VM
pub type CodeId = u64;

/// Montant en unités de base
pub type Balance = u128;

/// Montant d'une dénomination donnée
///
/// `amount` is carried as a decimal string on the wire, the way contracts
/// encode 128-bit integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount_string")]
    pub amount: Balance,
}

impl Coin {
    pub fn new(amount: Balance, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Vérifie la dénomination et le montant
    pub fn validate(&self) -> Result<(), CoinError> {
        validate_denom(&self.denom)?;
        if self.amount == 0 {
            return Err(CoinError::ZeroAmount);
        }
        Ok(())
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Denominations are 3-128 characters, start with a letter and continue
/// with letters, digits or one of `/ : . _ -`.
pub fn validate_denom(denom: &str) -> Result<(), CoinError> {
    let len = denom.len();
    if !(3..=128).contains(&len) {
        return Err(CoinError::InvalidDenom(denom.to_string()));
    }
    let mut chars = denom.chars();
    let first_ok = chars.next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false);
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'));
    if !first_ok || !rest_ok {
        return Err(CoinError::InvalidDenom(denom.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoinError {
    #[error("invalid denomination: {0:?}")]
    InvalidDenom(String),

    #[error("amount must be positive")]
    ZeroAmount,
}

mod amount_string {
    use super::Balance;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Balance, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Balance, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<Balance>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let hash1 = Hash::hash(b"KratOs");
        let hash2 = Hash::hash(b"KratOs");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_address_text_roundtrip() {
        let addr = Address::from_bytes([0xab; 32]);
        let text = addr.to_string();
        assert!(text.starts_with("0xabab"));
        assert_eq!(text.parse::<Address>().unwrap(), addr);
        // Prefix is optional
        assert_eq!(text[2..].parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_address_rejects_garbage() {
        assert_eq!("".parse::<Address>(), Err(AddressError::Empty));
        assert!(matches!("0xzz".parse::<Address>(), Err(AddressError::InvalidHex(_))));
        assert_eq!("0xabcd".parse::<Address>(), Err(AddressError::InvalidLength(2)));
    }

    #[test]
    fn test_module_address_is_stable() {
        assert_eq!(Address::module("privileged"), Address::module("privileged"));
        assert_ne!(Address::module("privileged"), Address::module("bank"));
    }

    #[test]
    fn test_coin_json_uses_string_amount() {
        let coin = Coin::new(1_000, "ukrat");
        let json = serde_json::to_string(&coin).unwrap();
        assert_eq!(json, r#"{"denom":"ukrat","amount":"1000"}"#);
        let back: Coin = serde_json::from_str(&json).unwrap();
        assert_eq!(back, coin);
    }

    #[test]
    fn test_coin_validation() {
        assert!(Coin::new(1, "ukrat").validate().is_ok());
        assert!(Coin::new(1, "ibc/27394FB0").validate().is_ok());
        assert_eq!(Coin::new(0, "ukrat").validate(), Err(CoinError::ZeroAmount));
        assert!(Coin::new(1, "1krat").validate().is_err());
        assert!(Coin::new(1, "kr").validate().is_err());
        assert!(Coin::new(1, "krat token").validate().is_err());
    }
}

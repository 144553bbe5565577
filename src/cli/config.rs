// Configuration du module de contrats privilégiés
use crate::types::{validate_denom, PrivilegeTableError, PrivilegeType, PrivilegeTypeTable, STANDARD_PRIVILEGES};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default module account receiving freshly minted tokens
pub const DEFAULT_MODULE_ACCOUNT: &str = "privileged";

/// Runtime configuration of the privilege keeper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegedConfig {
    /// Module account used as the mint source
    #[serde(default = "default_module_account")]
    pub module_account: String,

    /// Denominations token minters may create; empty allows any valid denom
    #[serde(default)]
    pub mint_denoms: Vec<String>,
}

fn default_module_account() -> String {
    DEFAULT_MODULE_ACCOUNT.to_string()
}

impl Default for PrivilegedConfig {
    fn default() -> Self {
        Self {
            module_account: default_module_account(),
            mint_denoms: Vec::new(),
        }
    }
}

impl PrivilegedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.module_account.trim().is_empty() {
            return Err(ConfigError::InvalidValue("module_account must not be empty".into()));
        }
        for denom in &self.mint_denoms {
            validate_denom(denom).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        }
        Ok(())
    }

    pub fn allows_denom(&self, denom: &str) -> bool {
        self.mint_denoms.is_empty() || self.mint_denoms.iter().any(|d| d == denom)
    }

    /// Charge depuis un fichier JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sauvegarde vers un fichier JSON
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))
    }
}

/// Build the node's privilege table, checking tags and names
pub fn load_privilege_table(entries: &[PrivilegeType]) -> Result<PrivilegeTypeTable, ConfigError> {
    Ok(PrivilegeTypeTable::new(entries.to_vec())?)
}

/// Table of the stock privilege types
pub fn standard_privilege_table() -> Result<PrivilegeTypeTable, ConfigError> {
    load_privilege_table(&STANDARD_PRIVILEGES)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidValue(String),

    #[error("Failed to read configuration: {0}")]
    Io(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid privilege table: {0}")]
    PrivilegeTable(#[from] PrivilegeTableError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = PrivilegedConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.module_account, "privileged");
        assert!(config.allows_denom("anything"));
    }

    #[test]
    fn test_denom_allow_list() {
        let config = PrivilegedConfig {
            mint_denoms: vec!["ukrat".into()],
            ..Default::default()
        };
        assert!(config.allows_denom("ukrat"));
        assert!(!config.allows_denom("uatom"));

        let bad = PrivilegedConfig {
            mint_denoms: vec!["1bad".into()],
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_file_roundtrip_and_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("privileged.json");

        let config = PrivilegedConfig {
            module_account: "minter".into(),
            mint_denoms: vec!["ukrat".into()],
        };
        config.to_file(&path).unwrap();
        assert_eq!(PrivilegedConfig::from_file(&path).unwrap(), config);

        std::fs::write(&path, "{}").unwrap();
        assert_eq!(PrivilegedConfig::from_file(&path).unwrap(), PrivilegedConfig::default());

        std::fs::write(&path, r#"{"module_account":""}"#).unwrap();
        assert!(matches!(PrivilegedConfig::from_file(&path), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_privilege_table_loading() {
        let table = standard_privilege_table().unwrap();
        assert_eq!(table.len(), STANDARD_PRIVILEGES.len());

        let clash = PrivilegeType {
            tag: 1,
            name: "shadow_blocker",
            singleton: false,
        };
        let err = load_privilege_table(&[STANDARD_PRIVILEGES[0], clash]).unwrap_err();
        assert!(matches!(err, ConfigError::PrivilegeTable(PrivilegeTableError::DuplicateTag(1))));
    }
}

// Runner - Execution of CLI commands
use crate::cli::InspectCmd;
use crate::cli::config::PrivilegedConfig;
use crate::genesis::GenesisState;
use crate::privileged::PrivilegeRegistry;
use crate::storage::{BlockInfo, Database, StateContext};
use crate::types::PrivilegeTypeTable;
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Print the privilege type table
pub fn print_types(types: &PrivilegeTypeTable) {
    println!("{:<4} {:<28} SINGLETON", "TAG", "NAME");
    for privilege in types.iter() {
        println!(
            "{:<4} {:<28} {}",
            privilege.tag,
            privilege.name,
            if privilege.singleton { "yes" } else { "no" }
        );
    }
}

/// Load a genesis file and check it against `types`
pub fn validate_genesis(path: &Path, types: &PrivilegeTypeTable) -> anyhow::Result<()> {
    let state = GenesisState::from_file(path)?;
    state
        .validate(types)
        .with_context(|| format!("{} is not a valid privileged genesis", path.display()))?;

    let registrations: usize = state.privileged_contracts.iter().map(|c| c.privileges.len()).sum();
    println!(
        "OK: {} privileged contract(s), {} registration(s), {} pinned code(s)",
        state.privileged_contracts.len(),
        registrations,
        state.pinned_code_ids.len()
    );
    Ok(())
}

/// Dump privileged contracts and registrations from a node database
pub fn inspect(cmd: &InspectCmd, types: Arc<PrivilegeTypeTable>) -> anyhow::Result<()> {
    let path = cmd.get_db_path();
    info!("Opening database at {}", path.display());
    let mut db = Database::open_read_only(&path).with_context(|| format!("cannot open {}", path.display()))?;

    let selected = match &cmd.privilege {
        Some(name) => vec![types
            .by_name(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown privilege type: {}", name))?],
        None => types.iter().collect(),
    };

    let registry = PrivilegeRegistry::new(types);
    // Read-only view, never committed
    let ctx = StateContext::new(&mut db, BlockInfo::default());

    if cmd.privilege.is_none() {
        let contracts = registry.privileged_contracts(&ctx)?;
        println!("Privileged contracts ({}):", contracts.len());
        for contract in contracts {
            println!("  {}", contract);
        }
    }

    for privilege in selected {
        let registrations = registry.registrations(&ctx, privilege)?;
        println!("{} ({}):", privilege, registrations.len());
        for (position, contract) in registrations {
            println!("  {:>3}  {}", position, contract);
        }
    }
    Ok(())
}

/// Write a default configuration file
pub fn init_config(output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }
    PrivilegedConfig::default().to_file(output)?;
    info!("Configuration written to {}", output.display());
    Ok(())
}

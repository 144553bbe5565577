// Tests module
// Scenario tests across registry, lifecycle, dispatch, bridge and genesis

pub mod genesis_roundtrip;

pub mod capability;
pub mod pattern;
pub mod policy;

pub use capability::{Capability, CapabilityStore, Complexity};
pub use pattern::{Pattern, PatternStore};
pub use policy::{DeployedPolicyReference, PolicyIntent, PolicyStore};

//! Per-agent permission policy.
//!
//! Core principle: **an agent only touches what it was explicitly granted.**
//!
//! Two grants exist: the set of tool names an agent may invoke, and a
//! comma-separated list of vault path prefixes that restrict file reads.
//! An empty path list leaves reads unrestricted.

mod capability;
mod path;
mod policy;

pub use capability::CapabilityRequest;
pub use path::{PathAllowlist, PathMatch, is_path_allowed, normalize_path};
pub use policy::{Decision, Policy};

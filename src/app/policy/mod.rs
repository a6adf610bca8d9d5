//! The tenant-isolation and privilege-resolution core.
//!
//! Every read passes through [`scope::ScopeFilter`], every write through
//! [`guard::authorize_mutation`], and every nested write through the checks
//! in [`nested`]. Handlers never build their own organization predicates.

pub mod cascade;
pub mod guard;
pub mod nested;
pub mod scope;

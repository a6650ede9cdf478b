//! Core types and constants for the unikit wallet connection kit.
//!
//! This crate provides the foundational types shared by every unikit crate:
//! backend descriptors and readiness, cluster/theme/language settings,
//! well-known wallet names, storage keys, and public address helpers.

pub mod address;
pub mod constants;
pub mod descriptor;

pub use address::{shorten_address, AddressError, PublicAddress};
pub use constants::{Cluster, Language, Theme};
pub use descriptor::{
    default_sign_modes, BackendDescriptor, BackendId, DescriptorError, Readiness, SignMode,
};

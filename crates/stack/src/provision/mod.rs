//! Provisioners
//!
//! Each provisioner declares the nodes of one layer into the construction
//! graph and returns a handle with the logical IDs later layers reference.
//! Leaf layers first: network, security, storage, then compute, api and
//! observability.

pub mod api;
pub mod compute;
pub mod network;
#[cfg(test)]
mod network_test;
pub mod observability;
#[cfg(test)]
mod observability_test;
pub mod security;
pub mod storage;
#[cfg(test)]
mod storage_test;

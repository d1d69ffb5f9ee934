//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering the Fitbit
//! authorization, token, revocation, and resource endpoints, supported grant flags, client
//! authentication preferences, and small quirks (PKCE requirement, scope delimiter).
//! `strategy` defines [`ProviderStrategy`], an HTTP-client-agnostic hook used by flows to map
//! token endpoint failures into the crate error taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;

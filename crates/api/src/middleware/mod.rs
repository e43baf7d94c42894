//! Request-context extractors.
//!
//! Authentication happens upstream; the gateway forwards the caller's
//! identity in headers.
//!
//! - [`merchant::MerchantContext`] -- the merchant a request acts for.
//! - [`merchant::RequireAdmin`] -- requires the platform admin role.

pub mod merchant;

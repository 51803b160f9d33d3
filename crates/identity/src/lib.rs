/**
 * Identity services client (Keystone-style).
 *
 * Authenticate with username/password, account access keys, or an
 * existing token, and get back an Identity: the token itself plus the
 * service catalog used to locate the other service endpoints.
 */
pub mod client;
pub mod error;
pub mod identity;
pub mod types;

pub use client::{IdentityClient, TenantRef};
pub use error::IdentityError;
pub use identity::Identity;

pub mod prelude {
    pub use crate::client::{IdentityClient, TenantRef};
    pub use crate::error::IdentityError;
    pub use crate::identity::Identity;
    pub use crate::types::{AuthPayload, Endpoint, Tenant};
}

pub mod account;
pub mod ephemeral_token;
pub mod role;
pub mod tenant;

pub use account::{Account, AccountSummary};
pub use ephemeral_token::{EphemeralToken, Redemption, TokenPurpose, EPHEMERAL_TOKEN_TTL_MINUTES};
pub use role::Role;
pub use tenant::Tenant;

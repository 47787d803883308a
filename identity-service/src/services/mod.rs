//! Services layer for identity-service.
//!
//! Business logic for account lifecycle, token handling and notification
//! delivery, plus the storage seams it runs against.

pub mod auth;
pub mod authorization;
mod database;
pub mod error;
mod jwt;
mod memory;
pub mod metrics;
mod notification;
pub mod repository;
mod token_issuer;

pub use auth::{AuthService, AuthTimeouts, LoginResult};
pub use database::Database;
pub use error::ServiceError;
pub use jwt::{SessionClaims, SessionTokenCodec, SessionTokenError, SESSION_TTL_MINUTES};
pub use memory::MemoryStore;
pub use notification::{
    LinkBuilder, MockNotificationGateway, Notification, NotificationError, NotificationGateway,
    NotificationKind, ResendGateway, SmtpGateway,
};
pub use repository::{AccountRepository, StoreError, TokenStore, UniqueKey};
pub use token_issuer::TokenIssuer;

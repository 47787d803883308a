pub mod invitation;
pub mod password;
pub mod registration;
pub mod session;

pub use invitation::{accept_invite, invite_user};
pub use password::{request_password_reset, reset_password};
pub use registration::{register_independent, register_org, resend_verification, verify_email};
pub use session::login;

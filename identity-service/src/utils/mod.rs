pub mod password;
pub mod validation;

pub use password::{
    dummy_password_hash, generate_temporary_password, hash_password, verify_password, Password,
    PasswordHashString,
};
pub use validation::{is_valid_subdomain, normalize_email, ValidatedJson};

//! JWT claims, type-state tokens and the HMAC validator

pub mod claims;
pub mod token;
pub mod validator;

pub use claims::{Claims, TokenKind};
pub use token::{SignatureValidated, Token, TokenState, Unvalidated, Validated};
pub use validator::TokenValidator;

//! Type-State JWT Token with compile-time validation guarantees
//!
//! Claims are only reachable on a token that passed both signature and
//! expiry checks.

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Header, Validation};

use crate::error::ValidationError;
use crate::jwt::claims::{Claims, TokenKind};

// ============================================================================
// Sealed Trait Pattern for Token States
// ============================================================================

mod private {
    pub trait Sealed {}
}

/// Marker trait for token validation states
pub trait TokenState: private::Sealed {
    /// Human-readable state name for debugging
    fn state_name() -> &'static str;
}

/// Header parsed, nothing verified yet
pub struct Unvalidated {
    raw: String,
}

/// Signature verified, claims decoded but not checked
pub struct SignatureValidated {
    claims: Claims,
}

/// Signature and claims verified
pub struct Validated {
    claims: Claims,
}

impl private::Sealed for Unvalidated {}
impl private::Sealed for SignatureValidated {}
impl private::Sealed for Validated {}

impl TokenState for Unvalidated {
    fn state_name() -> &'static str {
        "Unvalidated"
    }
}

impl TokenState for SignatureValidated {
    fn state_name() -> &'static str {
        "SignatureValidated"
    }
}

impl TokenState for Validated {
    fn state_name() -> &'static str {
        "Validated"
    }
}

// ============================================================================
// Type-State Token Wrapper
// ============================================================================

/// Type-state token wrapper that enforces validation order at compile time
pub struct Token<State: TokenState> {
    header: Header,
    state: State,
}

impl Token<Unvalidated> {
    /// Parse a raw JWT string into an unvalidated token
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::Absent);
        }

        let header = decode_header(raw).map_err(|_| ValidationError::Malformed {
            reason: "Invalid header".to_string(),
        })?;

        Ok(Token {
            header,
            state: Unvalidated {
                raw: raw.to_string(),
            },
        })
    }

    /// Get the algorithm from the token header
    pub fn algorithm(&self) -> Algorithm {
        self.header.alg
    }

    /// Verify the signature with the given key. Expiry is left to
    /// `validate_claims` so it can be reported as its own failure.
    pub fn validate_signature(
        self,
        key: &DecodingKey,
        algorithm: Algorithm,
    ) -> Result<Token<SignatureValidated>, ValidationError> {
        if self.header.alg != algorithm {
            return Err(ValidationError::Malformed {
                reason: format!("Unexpected algorithm {:?}", self.header.alg),
            });
        }

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<Claims>(&self.state.raw, key, &validation)?;

        Ok(Token {
            header: self.header,
            state: SignatureValidated {
                claims: token_data.claims,
            },
        })
    }
}

impl Token<SignatureValidated> {
    /// Check expiry and token kind against `now` (unix seconds)
    pub fn validate_claims(
        self,
        now: i64,
        leeway_secs: u64,
    ) -> Result<Token<Validated>, ValidationError> {
        let claims = self.state.claims;

        if claims.is_expired_at(now, leeway_secs) {
            return Err(ValidationError::Expired {
                expired_at: claims.expires_at(),
            });
        }

        if claims.sub.is_empty() {
            return Err(ValidationError::Malformed {
                reason: "Missing subject".to_string(),
            });
        }

        if claims.kind() == TokenKind::Refresh {
            return Err(ValidationError::Malformed {
                reason: "Refresh credential presented as access credential".to_string(),
            });
        }

        Ok(Token {
            header: self.header,
            state: Validated { claims },
        })
    }

    /// Read-only access to claims before they are checked
    pub fn peek_claims(&self) -> &Claims {
        &self.state.claims
    }
}

impl Token<Validated> {
    /// Access claims - only available on fully validated tokens
    pub fn claims(&self) -> &Claims {
        &self.state.claims
    }

    /// Get the subject claim
    pub fn subject(&self) -> &str {
        &self.state.claims.sub
    }

    /// Consume the token and keep the claims
    pub fn into_claims(self) -> Claims {
        self.state.claims
    }

    /// Get the token header
    pub fn header(&self) -> &Header {
        &self.header
    }
}

impl<S: TokenState> Token<S> {
    /// Get the current state name
    pub fn state_name(&self) -> &'static str {
        S::state_name()
    }
}

impl<S: TokenState> std::fmt::Debug for Token<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("alg", &self.header.alg)
            .field("state", &S::state_name())
            .finish_non_exhaustive()
    }
}

pub mod role;
pub mod verifier;

pub use role::Role;
pub use verifier::{ClaimVerifier, JwtClaimVerifier, UserTokenClaims, VerifyError};

//! Key revocation policy.
//!
//! Self-signatures are not verified. A key counts as revoked when it
//! carries a key-revocation signature on the primary key.

use pgp::composed::SignedPublicKey;
use pgp::packet::SignatureType;

/// Check if the primary key is revoked.
pub(crate) fn is_key_revoked(key: &SignedPublicKey) -> bool {
    key.details
        .revocation_signatures
        .iter()
        .any(|sig| sig.typ() == Some(SignatureType::KeyRevocation))
}

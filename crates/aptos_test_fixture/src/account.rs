//! Aptos account addresses and the Ed25519 identities the fixture creates.
//!
//! An Aptos address is 32 bytes, written as `0x` followed by hex. For a single-key Ed25519
//! account the address is the SHA3-256 digest of the public key followed by the scheme byte.

use crate::error::FixtureError;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use sha3::{Digest, Sha3_256};
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::str::FromStr;

pub const ADDRESS_BYTE_LENGTH: usize = 32;
pub const PRIVATE_KEY_BYTE_LENGTH: usize = 32;

/// Authentication scheme byte for single-key Ed25519 accounts.
const ED25519_SCHEME: u8 = 0x00;

/// A 32-byte Aptos account address.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountAddress(pub [u8; ADDRESS_BYTE_LENGTH]);

impl AccountAddress {
    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTE_LENGTH] {
        &self.0
    }

    /// Derives the address of a single-key Ed25519 account from its public key.
    pub fn from_ed25519_public_key(public_key: &[u8; 32]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(public_key);
        hasher.update([ED25519_SCHEME]);
        AccountAddress(hasher.finalize().into())
    }

    /// Long form: `0x` followed by 64 lowercase hex digits.
    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for AccountAddress {
    type Err = FixtureError;

    /// Parses an address with or without the `0x` prefix. Short forms such as `0x1` are
    /// left-padded with zeros.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);

        if digits.is_empty() {
            return Err(FixtureError::InvalidAddress {
                message: "Aptos address must contain at least one hex digit".to_string(),
            });
        }
        if digits.len() > ADDRESS_BYTE_LENGTH * 2 {
            return Err(FixtureError::InvalidAddress {
                message: format!(
                    "Aptos address must be at most {} hex digits, got {}",
                    ADDRESS_BYTE_LENGTH * 2,
                    digits.len()
                ),
            });
        }

        let padded = format!("{:0>width$}", digits, width = ADDRESS_BYTE_LENGTH * 2);
        let mut bytes = [0u8; ADDRESS_BYTE_LENGTH];
        hex::decode_to_slice(&padded, &mut bytes).map_err(|e| FixtureError::InvalidAddress {
            message: format!("Invalid hex in Aptos address '{}': {}", s, e),
        })?;

        Ok(AccountAddress(bytes))
    }
}

impl Display for AccountAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl Debug for AccountAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "AccountAddress({})", self.to_hex_literal())
    }
}

/// A test account backed by an Ed25519 signing key.
#[derive(Clone)]
pub struct TestAccount {
    signing_key: SigningKey,
    address: AccountAddress,
}

impl TestAccount {
    /// Generate a new random account.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Restore an account from a `0x`-prefixed (or bare) hex private key.
    pub fn from_private_key_hex(private_key: &str) -> Result<Self, FixtureError> {
        let digits = private_key.strip_prefix("0x").unwrap_or(private_key);
        let mut key_bytes = [0u8; PRIVATE_KEY_BYTE_LENGTH];
        hex::decode_to_slice(digits, &mut key_bytes).map_err(|e| {
            FixtureError::InvalidPrivateKey {
                message: format!("expected {} hex-encoded bytes: {}", PRIVATE_KEY_BYTE_LENGTH, e),
            }
        })?;

        Ok(Self::from_signing_key(SigningKey::from_bytes(&key_bytes)))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address =
            AccountAddress::from_ed25519_public_key(&signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            address,
        }
    }

    pub fn address(&self) -> AccountAddress {
        self.address
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Private key in the `0x`-prefixed hex form the Aptos CLI accepts.
    pub fn private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signing_key.to_bytes()))
    }
}

impl PartialEq for TestAccount {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for TestAccount {}

impl Debug for TestAccount {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("TestAccount")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

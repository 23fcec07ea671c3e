//! Signing key and address derivation
//!
//! The wallet's secp256k1 keypair is derived deterministically from the
//! seed phrase, and the public address is derived from the public key, so
//! create/recover with the same seed always yields the same address.

use crate::keyvault::SeedPhrase;
use crate::{Error, Result};
use blake2b_simd::Params as Blake2bParams;
use once_cell::sync::Lazy;
use secp256k1::ecdsa::Signature;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Domain separator for seed-to-key derivation
const KEY_PERSONALIZATION: &[u8; 16] = b"LuminaSeed2Key__";
/// Domain separator for address hashing
const ADDR_PERSONALIZATION: &[u8; 16] = b"LuminaAddrHash__";

/// Prefix carried by every LuminaChain address
pub const ADDRESS_PREFIX: &str = "LMT";

const ADDR_HASH_LEN: usize = 20;
const ADDR_CHECKSUM_LEN: usize = 4;

static SECP: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Wallet signing keypair
#[derive(Clone)]
pub struct SigningKey {
    secret: SecretKey,
    public: PublicKey,
}

impl SigningKey {
    /// Derive the keypair from a seed phrase.
    ///
    /// BLAKE2b-256 with a dedicated personalization maps the phrase to the
    /// scalar; the out-of-range case is retried with a counter byte.
    pub fn from_seed(seed: &SeedPhrase) -> Result<Self> {
        let normalized: String = seed.words().collect::<Vec<_>>().join(" ");
        for counter in 0u8..=255 {
            let mut state = Blake2bParams::new()
                .hash_length(32)
                .personal(KEY_PERSONALIZATION)
                .to_state();
            state.update(normalized.as_bytes());
            state.update(&[counter]);
            let hash = state.finalize();
            let mut digest = Zeroizing::new([0u8; 32]);
            digest.copy_from_slice(hash.as_bytes());

            if let Ok(secret) = SecretKey::from_slice(&digest[..]) {
                let public = PublicKey::from_secret_key(&SECP, &secret);
                return Ok(Self { secret, public });
            }
        }
        // 256 consecutive out-of-range hashes is not reachable in practice
        Err(Error::KeyDerivation(
            "Failed to derive a valid signing key from seed".to_string(),
        ))
    }

    /// Public half of the keypair.
    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Sign a 32-byte digest.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<Signature> {
        let msg = Message::from_slice(digest)
            .map_err(|e| Error::TransactionSigning(e.to_string()))?;
        Ok(SECP.sign_ecdsa(&msg, &self.secret))
    }
}

/// Verify an ECDSA signature over a 32-byte digest.
pub fn verify_digest(digest: &[u8; 32], signature: &Signature, public: &PublicKey) -> bool {
    match Message::from_slice(digest) {
        Ok(msg) => SECP.verify_ecdsa(&msg, signature, public).is_ok(),
        Err(_) => false,
    }
}

/// Derive the wallet address for a public key.
///
/// `LMT` + Base58(BLAKE2b-160(pubkey) || SHA-256d checksum).
pub fn derive_address(public: &PublicKey) -> String {
    let hash = Blake2bParams::new()
        .hash_length(ADDR_HASH_LEN)
        .personal(ADDR_PERSONALIZATION)
        .to_state()
        .update(&public.serialize())
        .finalize();

    let mut payload = Vec::with_capacity(ADDR_HASH_LEN + ADDR_CHECKSUM_LEN);
    payload.extend_from_slice(hash.as_bytes());
    payload.extend_from_slice(&address_checksum(hash.as_bytes()));

    format!("{}{}", ADDRESS_PREFIX, bs58::encode(payload).into_string())
}

/// Check whether a string is a well-formed LuminaChain address.
pub fn is_valid_address(address: &str) -> bool {
    let Some(body) = address.strip_prefix(ADDRESS_PREFIX) else {
        return false;
    };
    let Ok(payload) = bs58::decode(body).into_vec() else {
        return false;
    };
    if payload.len() != ADDR_HASH_LEN + ADDR_CHECKSUM_LEN {
        return false;
    }
    let (hash, checksum) = payload.split_at(ADDR_HASH_LEN);
    checksum == address_checksum(hash)
}

fn address_checksum(hash: &[u8]) -> [u8; ADDR_CHECKSUM_LEN] {
    let first = Sha256::digest(hash);
    let second = Sha256::digest(first);
    let mut checksum = [0u8; ADDR_CHECKSUM_LEN];
    checksum.copy_from_slice(&second[..ADDR_CHECKSUM_LEN]);
    checksum
}

//! Seed phrase custody
//!
//! Generates, validates, and encrypts the wallet's 12-word seed phrase.
//! Encryption is Argon2id passphrase derivation feeding ChaCha20-Poly1305,
//! so a wrong password fails authentication instead of yielding garbage.

use crate::{Error, Result};
use argon2::{Argon2, ParamsBuilder, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use std::fmt;
use zeroize::Zeroizing;

/// Number of words in a seed phrase
pub const SEED_WORD_COUNT: usize = 12;

/// Fixed dictionary for seed phrase generation
pub const SEED_WORDS: &[&str] = &[
    "abandon", "ability", "able", "about", "above", "absent", "absorb", "abstract", "absurd", "abuse",
    "access", "accident", "account", "accuse", "achieve", "acid", "acoustic", "acquire", "across", "act",
    "action", "actor", "actress", "actual", "adapt", "add", "addict", "address", "adjust", "admit",
    "adult", "advance", "advice", "aerobic", "affair", "afford", "afraid", "again", "age", "agent",
    "agree", "ahead", "aim", "air", "airport", "aisle", "alarm", "album", "alcohol", "alert",
    "alien", "all", "alley", "allow", "almost", "alone", "alpha", "already", "also", "alter",
    "always", "amateur", "amazing", "among", "amount", "amused", "analyst", "anchor", "ancient", "anger",
    "angle", "angry", "animal", "ankle", "announce", "annual", "another", "answer", "antenna", "antique",
    "anxiety", "any", "apart", "apology", "appear", "apple", "approve", "april", "arch", "arctic",
    "area", "arena", "argue", "arm", "armed", "armor", "army", "around", "arrange", "arrest",
    "arrive", "arrow", "art", "artefact", "artist", "artwork", "ask", "aspect", "assault", "asset",
    "assist", "assume", "asthma", "athlete", "atom", "attack", "attend", "attitude", "attract", "auction",
];

/// Encrypted seed blob layout: `[version(1)][salt(16)][nonce(12)][ciphertext+tag]`
const BLOB_VERSION: u8 = 1;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// A 12-word mnemonic. Zeroized on drop, redacted in debug output.
#[derive(Clone)]
pub struct SeedPhrase(Zeroizing<String>);

impl SeedPhrase {
    /// Wrap an existing phrase string.
    pub fn new(phrase: impl Into<String>) -> Self {
        Self(Zeroizing::new(phrase.into()))
    }

    /// Access the phrase text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Words of the phrase, in order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.split_whitespace()
    }
}

impl fmt::Debug for SeedPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SeedPhrase(<redacted>)")
    }
}

impl PartialEq for SeedPhrase {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl Eq for SeedPhrase {}

/// Seed phrase vault
///
/// Stateless; constructed once by the application entry point and shared
/// with the wallet.
#[derive(Debug, Default)]
pub struct KeyVault;

impl KeyVault {
    /// Argon2id parameters: memory (KiB), iterations, parallelism
    const ARGON2_PARAMS: (u32, u32, u32) = (65536, 3, 4);

    /// Create a new vault.
    pub fn new() -> Self {
        Self
    }

    /// Generate a fresh 12-word seed phrase.
    ///
    /// Words are drawn independently and uniformly from the dictionary
    /// using the OS random source.
    pub fn generate_seed(&self) -> SeedPhrase {
        let mut words = Vec::with_capacity(SEED_WORD_COUNT);
        for _ in 0..SEED_WORD_COUNT {
            let idx = OsRng.gen_range(0..SEED_WORDS.len());
            words.push(SEED_WORDS[idx]);
        }
        SeedPhrase::new(words.join(" "))
    }

    /// Validate a seed phrase: exactly 12 whitespace-separated words, each
    /// present in the dictionary.
    pub fn validate_seed(&self, phrase: &str) -> Result<()> {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        if words.len() != SEED_WORD_COUNT {
            return Err(Error::Validation(format!(
                "Seed phrase must contain exactly {} words, got {}",
                SEED_WORD_COUNT,
                words.len()
            )));
        }
        for word in words {
            if !SEED_WORDS.contains(&word) {
                return Err(Error::Validation(format!(
                    "Seed phrase contains unknown word: {word}"
                )));
            }
        }
        Ok(())
    }

    /// Encrypt a seed phrase with a password.
    pub fn encrypt_seed(&self, seed: &SeedPhrase, password: &str) -> Result<Vec<u8>> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let key = Self::derive_key(password, &salt)?;

        let cipher = ChaCha20Poly1305::new(key.as_ref().into());
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, seed.as_str().as_bytes())
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;

        let mut blob = Vec::with_capacity(1 + SALT_LEN + NONCE_LEN + ciphertext.len());
        blob.push(BLOB_VERSION);
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypt a seed blob with a password.
    ///
    /// A wrong password fails the authentication tag and is reported as
    /// `Error::Authentication`; malformed framing is `Error::Validation`.
    pub fn decrypt_seed(&self, blob: &[u8], password: &str) -> Result<SeedPhrase> {
        if blob.len() < 1 + SALT_LEN + NONCE_LEN + TAG_LEN {
            return Err(Error::Validation("Encrypted seed blob too short".to_string()));
        }
        if blob[0] != BLOB_VERSION {
            return Err(Error::Validation(format!(
                "Unsupported seed blob version: {}",
                blob[0]
            )));
        }

        let salt = &blob[1..1 + SALT_LEN];
        let nonce = Nonce::from_slice(&blob[1 + SALT_LEN..1 + SALT_LEN + NONCE_LEN]);
        let ciphertext = &blob[1 + SALT_LEN + NONCE_LEN..];

        let key = Self::derive_key(password, salt)?;
        let cipher = ChaCha20Poly1305::new(key.as_ref().into());

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| Error::Authentication("Seed decryption failed".to_string()))?;
        let phrase = String::from_utf8(plaintext)
            .map_err(|_| Error::Authentication("Seed decryption failed".to_string()))?;
        Ok(SeedPhrase::new(phrase))
    }

    /// Derive a 32-byte key from a password with Argon2id.
    fn derive_key(password: &str, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
        let params = ParamsBuilder::new()
            .m_cost(Self::ARGON2_PARAMS.0)
            .t_cost(Self::ARGON2_PARAMS.1)
            .p_cost(Self::ARGON2_PARAMS.2)
            .output_len(32)
            .build()
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; 32]);
        argon2
            .hash_password_into(password.as_bytes(), salt, &mut *key)
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;
        Ok(key)
    }
}

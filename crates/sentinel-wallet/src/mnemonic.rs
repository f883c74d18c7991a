use bip39::{Language, Mnemonic};
use crypto_utils::random::try_random_bytes_fixed;
use crypto_utils::{SecretBytes, SecretString};
use zeroize::Zeroize;

use crate::error::WalletError;
use crate::types::WordCount;

/// Generate a fresh BIP-39 phrase from OS randomness.
///
/// 12 words carry 128 bits of entropy, 24 words carry 256 bits.
pub fn generate_phrase(count: WordCount) -> Result<SecretString, WalletError> {
    let mut entropy = try_random_bytes_fixed::<32>()?;
    let result = Mnemonic::from_entropy_in(Language::English, &entropy[..count.entropy_len()])
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()));
    entropy.zeroize();
    Ok(SecretString::new(result?.to_string()))
}

fn parse(phrase: &str) -> Result<Mnemonic, WalletError> {
    let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, &normalized)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()));
    let mut normalized = normalized;
    normalized.zeroize();
    let mnemonic = mnemonic?;

    match mnemonic.word_count() {
        12 | 24 => Ok(mnemonic),
        n => Err(WalletError::InvalidMnemonic(format!(
            "expected 12 or 24 words, got {n}"
        ))),
    }
}

/// Validate a phrase: English wordlist, valid checksum, 12 or 24 words.
pub fn validate_phrase(phrase: &str) -> bool {
    parse(phrase).is_ok()
}

/// Canonical single-space form of a valid phrase.
pub(crate) fn normalize_phrase(phrase: &str) -> Result<SecretString, WalletError> {
    Ok(SecretString::new(parse(phrase)?.to_string()))
}

/// Validate a single word against the BIP-39 word list
pub fn is_valid_word(word: &str) -> bool {
    Language::English.find_word(word).is_some()
}

/// 64-byte BIP-39 seed of `phrase` under an optional passphrase.
pub fn phrase_to_seed(phrase: &str, passphrase: &str) -> Result<SecretBytes, WalletError> {
    let mnemonic = parse(phrase)?;
    let mut seed = mnemonic.to_seed(passphrase);
    let out = SecretBytes::new(seed.to_vec());
    seed.zeroize();
    Ok(out)
}

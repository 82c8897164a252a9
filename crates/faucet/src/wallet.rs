//! Per-chain faucet signing wallets.
//!
//! Each dispensing chain has exactly one signing key, supplied out-of-band
//! through the `PK_<chain_id>` environment variable. The wallet owns nothing
//! but the key; balances and nonces live on-chain.

use crate::error::{FaucetError, FaucetResult};
use faucet_common::Address;
use k256::ecdsa::{RecoveryId, Signature, SigningKey};

pub struct FaucetWallet {
    signing_key: SigningKey,
    address: Address,
}

impl FaucetWallet {
    /// Resolve the signing key for `chain_id` from `PK_<chain_id>`.
    ///
    /// A missing or malformed secret is `WalletUnavailable`; the operator
    /// has to fix the deployment either way.
    pub fn from_env(chain_id: u64) -> FaucetResult<Self> {
        let key = std::env::var(format!("PK_{chain_id}"))
            .map_err(|_| FaucetError::WalletUnavailable)?;
        Self::from_hex_key(&key)
    }

    pub fn from_hex_key(key: &str) -> FaucetResult<Self> {
        let key_hex = key.strip_prefix("0x").unwrap_or(key);
        let key_bytes = hex::decode(key_hex).map_err(|_| FaucetError::WalletUnavailable)?;
        let signing_key =
            SigningKey::from_slice(&key_bytes).map_err(|_| FaucetError::WalletUnavailable)?;
        let address = derive_address(&signing_key);
        Ok(Self { signing_key, address })
    }

    /// The wallet's 0x address, derived from the public key.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte transaction hash, returning the signature and the
    /// recovery id needed for the EIP-155 `v` value.
    pub fn sign_prehash(&self, prehash: &[u8; 32]) -> FaucetResult<(Signature, RecoveryId)> {
        self.signing_key
            .sign_prehash_recoverable(prehash)
            .map_err(|e| FaucetError::DispatchFailed(format!("signing failed: {e}")))
    }
}

/// Ethereum address derivation: keccak256 of the uncompressed public key
/// (without the 0x04 tag), last 20 bytes.
fn derive_address(signing_key: &SigningKey) -> Address {
    let encoded = signing_key.verifying_key().to_encoded_point(false);
    let hash = keccak_hash::keccak(&encoded.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.0[12..]);
    Address(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::VerifyingKey;

    // Well-known test key; its address is a fixed point of secp256k1 + keccak.
    const TEST_KEY: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";
    const TEST_ADDRESS: &str = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf";

    #[test]
    fn test_address_derivation() {
        let wallet = FaucetWallet::from_hex_key(TEST_KEY).unwrap();
        assert_eq!(wallet.address().to_string(), TEST_ADDRESS);
    }

    #[test]
    fn test_key_without_prefix() {
        let wallet = FaucetWallet::from_hex_key(TEST_KEY.trim_start_matches("0x")).unwrap();
        assert_eq!(wallet.address().to_string(), TEST_ADDRESS);
    }

    #[test]
    fn test_rejects_malformed_keys() {
        assert!(matches!(
            FaucetWallet::from_hex_key("0x1234"),
            Err(FaucetError::WalletUnavailable)
        ));
        assert!(matches!(
            FaucetWallet::from_hex_key("not-hex"),
            Err(FaucetError::WalletUnavailable)
        ));
        // The zero scalar is not a valid secp256k1 key.
        assert!(matches!(
            FaucetWallet::from_hex_key(
                "0x0000000000000000000000000000000000000000000000000000000000000000"
            ),
            Err(FaucetError::WalletUnavailable)
        ));
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("PK_909090", TEST_KEY);
        let wallet = FaucetWallet::from_env(909090).unwrap();
        assert_eq!(wallet.address().to_string(), TEST_ADDRESS);

        assert!(matches!(FaucetWallet::from_env(909091), Err(FaucetError::WalletUnavailable)));
    }

    #[test]
    fn test_signature_recovers_to_wallet_address() {
        let wallet = FaucetWallet::from_hex_key(TEST_KEY).unwrap();
        let prehash = keccak_hash::keccak(b"faucet test payload").0;

        let (signature, recovery_id) = wallet.sign_prehash(&prehash).unwrap();
        let recovered =
            VerifyingKey::recover_from_prehash(&prehash, &signature, recovery_id).unwrap();

        let encoded = recovered.to_encoded_point(false);
        let hash = keccak_hash::keccak(&encoded.as_bytes()[1..]);
        assert_eq!(&hash.0[12..], wallet.address().as_bytes());
    }
}

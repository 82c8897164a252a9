//! Transaction construction: ERC20 call encoding and legacy EIP-155
//! signing/serialization.

use crate::error::{FaucetError, FaucetResult};
use crate::wallet::FaucetWallet;
use ethabi::{ParamType, Token};
use faucet_common::Address;
use num_bigint::BigUint;
use rlp::RlpStream;

/// Intrinsic gas of a plain value transfer.
pub const NATIVE_TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Fixed estimate for an ERC20 `transfer` call. Deliberately not simulated;
/// changing this would change observable fee behavior.
pub const TOKEN_TRANSFER_GAS_LIMIT: u64 = 65_000;

/// A fully-determined transaction awaiting signature and broadcast.
/// Consumed exactly once.
#[derive(Debug, Clone)]
pub struct PreparedTransaction {
    pub to: Address,
    pub value: BigUint,
    pub gas_price: BigUint,
    pub gas_limit: u64,
    pub data: Vec<u8>,
}

impl PreparedTransaction {
    /// A native-coin transfer of `amount` wei to `receiver`.
    pub fn native_transfer(receiver: Address, amount: BigUint, gas_price: BigUint) -> Self {
        Self {
            to: receiver,
            value: amount,
            gas_price,
            gas_limit: NATIVE_TRANSFER_GAS_LIMIT,
            data: Vec::new(),
        }
    }

    /// An ERC20 `transfer(receiver, amount)` call against `token`.
    pub fn token_transfer(
        token: Address,
        receiver: Address,
        amount: &BigUint,
        gas_price: BigUint,
    ) -> FaucetResult<Self> {
        Ok(Self {
            to: token,
            value: BigUint::from(0u32),
            gas_price,
            gas_limit: TOKEN_TRANSFER_GAS_LIMIT,
            data: erc20_transfer_data(&receiver, amount)?,
        })
    }

    /// RLP-encode the signed legacy transaction under EIP-155 replay
    /// protection for `chain_id`, ready for `eth_sendRawTransaction`.
    pub fn encode_signed(
        &self,
        wallet: &FaucetWallet,
        chain_id: u64,
        nonce: u64,
    ) -> FaucetResult<Vec<u8>> {
        // Signing payload: the 9-item list with (chain_id, 0, 0) in the
        // signature slots.
        let mut unsigned = RlpStream::new_list(9);
        self.append_body(&mut unsigned, nonce);
        unsigned.append(&chain_id);
        unsigned.append(&0u8);
        unsigned.append(&0u8);

        let sighash = keccak_hash::keccak(&unsigned.out());
        let (signature, recovery_id) = wallet.sign_prehash(&sighash.0)?;
        let v = chain_id * 2 + 35 + u64::from(recovery_id.to_byte());

        let mut signed = RlpStream::new_list(9);
        self.append_body(&mut signed, nonce);
        let (r, s) = signature.split_bytes();
        signed.append(&v);
        signed.append(&trim_leading_zeros(r.as_slice()));
        signed.append(&trim_leading_zeros(s.as_slice()));

        Ok(signed.out().to_vec())
    }

    fn append_body(&self, stream: &mut RlpStream, nonce: u64) {
        stream.append(&nonce);
        stream.append(&quantity_bytes(&self.gas_price));
        stream.append(&self.gas_limit);
        stream.append(&self.to.as_bytes().to_vec());
        stream.append(&quantity_bytes(&self.value));
        stream.append(&self.data);
    }
}

/// ABI-encode `transfer(address,uint256)`.
pub fn erc20_transfer_data(receiver: &Address, amount: &BigUint) -> FaucetResult<Vec<u8>> {
    let params = [ParamType::Address, ParamType::Uint(256)];
    let mut data = ethabi::short_signature("transfer", &params).to_vec();
    data.extend(ethabi::encode(&[
        Token::Address(ethabi::Address::from_slice(receiver.as_bytes())),
        Token::Uint(to_u256(amount)?),
    ]));
    Ok(data)
}

/// ABI-encode `balanceOf(address)`.
pub fn erc20_balance_of_data(holder: &Address) -> Vec<u8> {
    let mut data = ethabi::short_signature("balanceOf", &[ParamType::Address]).to_vec();
    data.extend(ethabi::encode(&[Token::Address(ethabi::Address::from_slice(
        holder.as_bytes(),
    ))]));
    data
}

fn to_u256(value: &BigUint) -> FaucetResult<ethabi::Uint> {
    let bytes = value.to_bytes_be();
    if bytes.len() > 32 {
        return Err(FaucetError::Internal(format!("amount {value} exceeds uint256")));
    }
    let mut padded = [0u8; 32];
    padded[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(ethabi::Uint::from_big_endian(&padded))
}

/// Minimal big-endian byte representation, as RLP integers require.
fn quantity_bytes(value: &BigUint) -> Vec<u8> {
    if value == &BigUint::from(0u32) {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}

fn trim_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().skip_while(|b| **b == 0).copied().collect()
}

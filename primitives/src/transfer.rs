//! Interpretation of raw token-transfer return data
//!
//! Tokens behind the host execution primitive do not agree on a return convention:
//! legacy tokens return nothing, compliant ones return an ABI-encoded `bool`, and
//! broken ones return anything at all. Only the first two shapes count as success.

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;

/// Length of one ABI word.
pub const ABI_WORD_LEN: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode, DecodeWithMemTracking, MaxEncodedLen, TypeInfo)]
pub enum TransferReturnError {
  /// 32-byte word decoding to `false`.
  ReturnedFalse,
  /// Any other length, or a 32-byte word that is neither `0` nor `1`.
  Malformed,
}

pub fn interpret_transfer_return(data: &[u8]) -> Result<(), TransferReturnError> {
  if data.is_empty() {
    return Ok(());
  }
  if data.len() != ABI_WORD_LEN {
    return Err(TransferReturnError::Malformed);
  }
  let (padding, last) = data.split_at(ABI_WORD_LEN - 1);
  if padding.iter().any(|b| *b != 0) {
    return Err(TransferReturnError::Malformed);
  }
  match last[0] {
    1 => Ok(()),
    0 => Err(TransferReturnError::ReturnedFalse),
    _ => Err(TransferReturnError::Malformed),
  }
}

/// ABI encoding of a `bool` return value.
pub fn abi_bool(value: bool) -> [u8; ABI_WORD_LEN] {
  let mut word = [0u8; ABI_WORD_LEN];
  word[ABI_WORD_LEN - 1] = value as u8;
  word
}

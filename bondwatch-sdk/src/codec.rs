//! Smart contract data codec.
//!
//! Covers the two directions the watcher needs:
//!
//! * decoding the registry view's return data into [`BondingRecord`]s, and
//! * encoding `ESDTTransfer` call data for the swap call.
//!
//! Return data uses the nested encoding: identifiers are a big-endian `u32`
//! length followed by the bytes, addresses are 32 raw bytes. A registry entry
//! may hold one record (multi-value result) or many concatenated records (a
//! managed vec), so decoding consumes records until the buffer is empty.

use crate::address::{Address, AddressError};

/// Errors produced while decoding contract return data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("unexpected end of input: needed {needed} bytes at offset {offset}")]
    UnexpectedEof { offset: usize, needed: usize },
    #[error("token identifier is not valid utf-8 at offset {0}")]
    InvalidUtf8(usize),
    #[error("invalid address: {0}")]
    Address(#[from] AddressError),
}

/// One bonding pair as stored by the registry contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BondingRecord {
    pub first_token_id: String,
    pub second_token_id: String,
    pub address: Address,
}

/// Cursor over nested-encoded bytes.
struct NestedReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> NestedReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn is_empty(&self) -> bool {
        self.offset >= self.buf.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(CodecError::UnexpectedEof {
                offset: self.offset,
                needed: len,
            })?;
        let slice = &self.buf[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_token_identifier(&mut self) -> Result<String, CodecError> {
        let len = self.read_u32()? as usize;
        let start = self.offset;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8(start))
    }

    fn read_address(&mut self) -> Result<Address, CodecError> {
        Ok(Address::from_slice(self.take(Address::LEN)?)?)
    }

    fn read_bonding_record(&mut self) -> Result<BondingRecord, CodecError> {
        Ok(BondingRecord {
            first_token_id: self.read_token_identifier()?,
            second_token_id: self.read_token_identifier()?,
            address: self.read_address()?,
        })
    }
}

/// Decode every bonding record contained in the given return-data entries,
/// preserving contract order.
pub fn decode_bonding_records<B: AsRef<[u8]>>(
    return_data: &[B],
) -> Result<Vec<BondingRecord>, CodecError> {
    let mut records = Vec::new();
    for entry in return_data {
        let mut reader = NestedReader::new(entry.as_ref());
        while !reader.is_empty() {
            records.push(reader.read_bonding_record()?);
        }
    }
    Ok(records)
}

/// Hex of the minimal big-endian representation of `value` (empty for zero).
pub fn encode_biguint_hex(value: u128) -> String {
    let bytes = value.to_be_bytes();
    match bytes.iter().position(|b| *b != 0) {
        Some(first) => hex::encode(&bytes[first..]),
        None => String::new(),
    }
}

/// Hex of a string argument (token identifiers, function names).
pub fn encode_str_hex(value: &str) -> String {
    hex::encode(value.as_bytes())
}

/// Build `ESDTTransfer@token@amount@function@args…` call data.
///
/// `args` must already be hex encoded.
pub fn esdt_transfer_data(token: &str, amount: u128, function: &str, args: &[String]) -> String {
    let mut data = format!(
        "ESDTTransfer@{}@{}@{}",
        encode_str_hex(token),
        encode_biguint_hex(amount),
        encode_str_hex(function)
    );
    for arg in args {
        data.push('@');
        data.push_str(arg);
    }
    data
}

//! Output script encoding/decoding utilities
//!
//! Scripts are a flat byte sequence of opcodes and data pushes:
//! - 0x01..=0x4b: push the next N bytes
//! - 0x4c (OP_PUSHDATA1): 1-byte length, then data
//! - 0x4d (OP_PUSHDATA2): 2-byte little-endian length, then data
//! - 0x4e (OP_PUSHDATA4): 4-byte little-endian length, then data
//! - anything else: a plain opcode

use std::fmt;

use serde::{Deserialize, Serialize};

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;

/// Largest push that fits in the single-byte length form
const MAX_DIRECT_PUSH: usize = 0x4b;

/// A serialized output script
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script(#[serde(with = "hex::serde")] pub Vec<u8>);

impl Script {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        hex::decode(hex_str)
            .map(Self)
            .map_err(|_| ScriptError::InvalidHex)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pay-to-public-key-hash script for a 20-byte hash:
    /// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn p2pkh(hash: &[u8; 20]) -> Self {
        let mut bytes = Vec::with_capacity(25);
        bytes.push(OP_DUP);
        bytes.push(OP_HASH160);
        push_bytes(&mut bytes, hash);
        bytes.push(OP_EQUALVERIFY);
        bytes.push(OP_CHECKSIG);
        Self(bytes)
    }

    pub fn is_op_return(&self) -> bool {
        self.0.first() == Some(&OP_RETURN)
    }

    /// Iterate over the opcodes and pushes of this script
    pub fn ops(&self) -> ScriptReader<'_> {
        ScriptReader::new(&self.0)
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Append a push of `data` to `script` using the smallest push form.
///
/// An empty push is encoded as `OP_PUSHDATA1 0x00`, which is what the SLP
/// parser expects for empty fields.
pub fn push_bytes(script: &mut Vec<u8>, data: &[u8]) {
    match data.len() {
        0 => {
            script.push(OP_PUSHDATA1);
            script.push(0);
        }
        len if len <= MAX_DIRECT_PUSH => script.push(len as u8),
        len if len <= 0xff => {
            script.push(OP_PUSHDATA1);
            script.push(len as u8);
        }
        len if len <= 0xffff => {
            script.push(OP_PUSHDATA2);
            script.extend_from_slice(&(len as u16).to_le_bytes());
        }
        len => {
            script.push(OP_PUSHDATA4);
            script.extend_from_slice(&(len as u32).to_le_bytes());
        }
    }
    script.extend_from_slice(data);
}

/// A single decoded script element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op<'a> {
    Code(u8),
    Push(&'a [u8]),
}

/// Sequential reader over script elements
#[derive(Debug, Clone)]
pub struct ScriptReader<'a> {
    bytes: &'a [u8],
    idx: usize,
}

impl<'a> ScriptReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, idx: 0 }
    }

    pub fn is_finished(&self) -> bool {
        self.idx >= self.bytes.len()
    }

    /// Read the next element, `Ok(None)` once the script is exhausted
    pub fn read_op(&mut self) -> Result<Option<Op<'a>>, ScriptError> {
        let Some(&opcode) = self.bytes.get(self.idx) else {
            return Ok(None);
        };
        self.idx += 1;

        let len = match opcode {
            0x01..=0x4b => opcode as usize,
            OP_PUSHDATA1 => self.read_len(1)?,
            OP_PUSHDATA2 => self.read_len(2)?,
            OP_PUSHDATA4 => self.read_len(4)?,
            _ => return Ok(Some(Op::Code(opcode))),
        };
        let data = self.take(len)?;
        Ok(Some(Op::Push(data)))
    }

    /// Read the next element and require it to be a push
    pub fn read_push(&mut self) -> Result<&'a [u8], ScriptError> {
        match self.read_op()? {
            Some(Op::Push(data)) => Ok(data),
            Some(Op::Code(opcode)) => Err(ScriptError::ExpectedPush { found: opcode }),
            None => Err(ScriptError::UnexpectedEnd),
        }
    }

    fn read_len(&mut self, width: usize) -> Result<usize, ScriptError> {
        let raw = self.take(width)?;
        let mut le = [0u8; 4];
        le[..width].copy_from_slice(raw);
        Ok(u32::from_le_bytes(le) as usize)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ScriptError> {
        let end = self
            .idx
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(ScriptError::TruncatedPush {
                expected: len,
                available: self.bytes.len().saturating_sub(self.idx),
            })?;
        let data = &self.bytes[self.idx..end];
        self.idx = end;
        Ok(data)
    }
}

impl<'a> Iterator for ScriptReader<'a> {
    type Item = Result<Op<'a>, ScriptError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_op() {
            Ok(Some(op)) => Some(Ok(op)),
            Ok(None) => None,
            Err(e) => {
                // Stop after the first error
                self.idx = self.bytes.len();
                Some(Err(e))
            }
        }
    }
}

/// Errors that can occur during script decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    InvalidHex,
    UnexpectedEnd,
    ExpectedPush { found: u8 },
    TruncatedPush { expected: usize, available: usize },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHex => write!(f, "Invalid hex string"),
            Self::UnexpectedEnd => write!(f, "Unexpected end of script"),
            Self::ExpectedPush { found } => {
                write!(f, "Expected a data push, found opcode 0x{:02x}", found)
            }
            Self::TruncatedPush {
                expected,
                available,
            } => write!(
                f,
                "Push of {} bytes exceeds the {} bytes left in script",
                expected, available
            ),
        }
    }
}

impl std::error::Error for ScriptError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_forms() {
        let mut script = Vec::new();
        push_bytes(&mut script, &[]);
        assert_eq!(script, vec![0x4c, 0x00]);

        let mut script = Vec::new();
        push_bytes(&mut script, &[0xaa; 4]);
        assert_eq!(script, vec![0x04, 0xaa, 0xaa, 0xaa, 0xaa]);

        let mut script = Vec::new();
        push_bytes(&mut script, &[0x01; 76]);
        assert_eq!(&script[..2], &[0x4c, 76]);
        assert_eq!(script.len(), 78);

        let mut script = Vec::new();
        push_bytes(&mut script, &[0x01; 300]);
        assert_eq!(&script[..3], &[0x4d, 0x2c, 0x01]);
        assert_eq!(script.len(), 303);
    }

    #[test]
    fn test_p2pkh() {
        let script = Script::p2pkh(&[0x95; 20]);
        assert_eq!(script.to_hex(), format!("76a914{}88ac", "95".repeat(20)));
        assert!(!script.is_op_return());
    }

    #[test]
    fn test_reader_walks_ops() {
        let script = Script::from_hex("6a04534c500001410100").unwrap();
        let ops: Vec<Op> = script.ops().collect::<Result<_, _>>().unwrap();
        assert_eq!(
            ops,
            vec![
                Op::Code(OP_RETURN),
                Op::Push(&[0x53, 0x4c, 0x50, 0x00]),
                Op::Push(&[0x41]),
                Op::Push(&[0x00]),
            ]
        );
    }

    #[test]
    fn test_reader_reads_empty_pushdata1() {
        let mut reader = ScriptReader::new(&[0x4c, 0x00]);
        assert_eq!(reader.read_push().unwrap(), &[] as &[u8]);
        assert!(reader.is_finished());
    }

    #[test]
    fn test_reader_rejects_truncated_push() {
        let mut reader = ScriptReader::new(&[0x08, 0x00, 0x00]);
        assert_eq!(
            reader.read_op(),
            Err(ScriptError::TruncatedPush {
                expected: 8,
                available: 2,
            })
        );
    }

    #[test]
    fn test_read_push_rejects_opcode() {
        let mut reader = ScriptReader::new(&[OP_RETURN]);
        assert_eq!(
            reader.read_push(),
            Err(ScriptError::ExpectedPush { found: OP_RETURN })
        );
    }

    #[test]
    fn test_script_hex_serde() {
        let script = Script::new(vec![0x6a, 0x00]);
        let json = serde_json::to_string(&script).unwrap();
        assert_eq!(json, "\"6a00\"");
        let parsed: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, script);
    }
}

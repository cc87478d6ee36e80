//! Fixed-width row encoding.
//!
//! Layout:
//! ```text
//! Offset  Size  Description
//! 0       4     id (big-endian)
//! 4       32    username, zero-padded
//! 36      255   email, zero-padded
//! ```

use crate::error::{Result, StorageError};
use std::borrow::Cow;
use std::fmt;

/// Width of the username column
pub const USERNAME_SIZE: usize = 32;

/// Width of the email column
pub const EMAIL_SIZE: usize = 255;

const ID_SIZE: usize = std::mem::size_of::<u32>();
const ID_OFFSET: usize = 0;
const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Encoded size of a row
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

/// A table row: integer primary key plus two fixed-width text columns.
///
/// Text columns are kept in their on-disk form, so encoding and decoding are
/// plain copies and never fail.
#[derive(Clone, PartialEq, Eq)]
pub struct Row {
    /// Primary key
    pub id: u32,
    username: [u8; USERNAME_SIZE],
    email: [u8; EMAIL_SIZE],
}

impl Row {
    /// Build a row, rejecting text that does not fit its column
    pub fn new(id: u32, username: &str, email: &str) -> Result<Self> {
        Ok(Self {
            id,
            username: pad_field("username", username)?,
            email: pad_field("email", email)?,
        })
    }

    /// Username without its padding
    pub fn username(&self) -> Cow<'_, str> {
        field_str(&self.username)
    }

    /// Email without its padding
    pub fn email(&self) -> Cow<'_, str> {
        field_str(&self.email)
    }

    /// Write this row into `dst`, which must hold at least `ROW_SIZE` bytes
    pub fn encode(&self, dst: &mut [u8]) {
        dst[ID_OFFSET..USERNAME_OFFSET].copy_from_slice(&self.id.to_be_bytes());
        dst[USERNAME_OFFSET..EMAIL_OFFSET].copy_from_slice(&self.username);
        dst[EMAIL_OFFSET..ROW_SIZE].copy_from_slice(&self.email);
    }

    /// Read a row from `src`, which must hold at least `ROW_SIZE` bytes.
    ///
    /// Padding is copied verbatim; whatever follows the first NUL of a column
    /// is kept as-is.
    pub fn decode(src: &[u8]) -> Self {
        let mut id = [0u8; ID_SIZE];
        id.copy_from_slice(&src[ID_OFFSET..USERNAME_OFFSET]);
        let mut username = [0u8; USERNAME_SIZE];
        username.copy_from_slice(&src[USERNAME_OFFSET..EMAIL_OFFSET]);
        let mut email = [0u8; EMAIL_SIZE];
        email.copy_from_slice(&src[EMAIL_OFFSET..ROW_SIZE]);

        Self {
            id: u32::from_be_bytes(id),
            username,
            email,
        }
    }
}

fn pad_field<const N: usize>(field: &'static str, value: &str) -> Result<[u8; N]> {
    let bytes = value.as_bytes();
    if bytes.len() > N {
        return Err(StorageError::FieldTooLong {
            field,
            len: bytes.len(),
            max: N,
        });
    }
    let mut out = [0u8; N];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

fn field_str(bytes: &[u8]) -> Cow<'_, str> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end])
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("id", &self.id)
            .field("username", &self.username())
            .field("email", &self.email())
            .finish()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username(), self.email())
    }
}

use std::fmt;

use derive_more::{From, Into};

/// Width of a [`TransactionId`] on the wire.
pub const TRANSACTION_ID_LEN: usize = 16;

/// Opaque token shared by every slice of one logical message.
///
/// The bytes carry no structure and need not be printable. [`Display`]
/// renders them as lowercase hex for logs.
///
/// # Examples
///
/// ```
/// use slicegram::fragment::TransactionId;
/// let id = TransactionId::new([0xab; 16]);
/// assert_eq!(id.as_bytes(), &[0xab; 16]);
/// assert_eq!(id.to_string(), "ab".repeat(16));
/// ```
///
/// [`Display`]: fmt::Display
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, From, Into)]
pub struct TransactionId([u8; TRANSACTION_ID_LEN]);

impl TransactionId {
    /// Wrap raw identifier bytes.
    #[must_use]
    pub const fn new(bytes: [u8; TRANSACTION_ID_LEN]) -> Self { Self(bytes) }

    /// Generate a fresh random identifier.
    #[must_use]
    pub fn random() -> Self { Self(rand::random()) }

    /// Borrow the identifier bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; TRANSACTION_ID_LEN] { &self.0 }
}

impl TryFrom<&[u8]> for TransactionId {
    type Error = std::array::TryFromSliceError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> { value.try_into().map(Self) }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&hex::encode(self.0)) }
}

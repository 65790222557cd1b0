use crate::{OrmResult, Value};

/// A record body that can be written to and read from the store.
///
/// Decoding happens into a caller-supplied buffer, so the caller picks the
/// concrete record type when it drives an iterator:
///
/// ```
/// # use signet_orm_iter::{Message, OrmResult};
/// let mut dst = Vec::<u8>::new();
/// dst.decode_into(b"body").unwrap();
/// assert_eq!(dst, b"body");
/// ```
///
/// ## Implementing
///
/// ```
/// # use signet_orm_iter::{Message, OrmError, OrmResult};
/// #[derive(Default)]
/// struct Balance(u64);
///
/// impl Message for Balance {
///     fn encode(&self) -> Vec<u8> {
///         self.0.to_be_bytes().to_vec()
///     }
///
///     fn decode_into(&mut self, bytes: &[u8]) -> OrmResult<()> {
///         let arr: [u8; 8] = bytes
///             .try_into()
///             .map_err(|_| OrmError::Decode("balance must be 8 bytes".into()))?;
///         self.0 = u64::from_be_bytes(arr);
///         Ok(())
///     }
/// }
/// ```
pub trait Message {
    /// Encodes the record body.
    fn encode(&self) -> Vec<u8>;

    /// Replaces the contents of `self` with the decoded record body.
    fn decode_into(&mut self, bytes: &[u8]) -> OrmResult<()>;
}

impl Message for Vec<u8> {
    fn encode(&self) -> Vec<u8> {
        self.clone()
    }

    fn decode_into(&mut self, bytes: &[u8]) -> OrmResult<()> {
        self.clear();
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// A [`Message`] that can be stored in a table.
///
/// Tables project the primary key and every index key out of a record by
/// field name, in the order the table declares them.
pub trait Record: Message {
    /// Returns the value of the named key field, if the record has one.
    fn field(&self, name: &str) -> Option<Value>;
}

use crate::iter::OrmIterator;

/// A producer that supports no operation at all.
///
/// Returned when a request asks for a capability the table does not have,
/// such as a scan over an index the table does not define. `advance` fails
/// with [`OrmError::UnsupportedOperation`], as does every accessor. The
/// cursor is always empty and closing is a no-op.
///
/// [`OrmError::UnsupportedOperation`]: crate::OrmError::UnsupportedOperation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnimplementedIterator;

impl OrmIterator for UnimplementedIterator {}

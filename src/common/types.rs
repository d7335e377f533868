use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

/// A generic boxed error type.
pub type AnyError = Box<dyn std::error::Error + Send + Sync>;

/// A convenient Result alias returning `AnyError`.
pub type AnyResult<T> = std::result::Result<T, AnyError>;

/// Response bodies and download output share this shape.
pub type ByteStream =
    Pin<Box<dyn Stream<Item = crate::common::errors::Result<Bytes>> + Send + 'static>>;

//! Output slots for matched values.
//!
//! Every value-carrying node gets one [`Receiver`]. By default it is
//! [`Receiver::Owned`]: the library keeps the raw strings and hands them out
//! through [`Matches`](crate::Matches). Binding a caller variable swaps in a
//! [`Receiver::Reference`], which writes straight into the caller's storage.

use std::fmt::Display;
use std::str::FromStr;

/// Typed destination for raw values.
///
/// `store` converts `raw` into the destination type and writes it. The only
/// failure is the conversion itself, returned as the converter's message; the
/// matcher turns it into an `invalid_argument` error with the value's
/// location.
pub trait Store {
    fn store(&mut self, raw: &str) -> Result<(), String>;
}

/// Overwrites a single value on every occurrence.
struct Scalar<'a, T>(&'a mut T);

impl<T> Store for Scalar<'_, T>
where
    T: FromStr,
    T::Err: Display,
{
    fn store(&mut self, raw: &str) -> Result<(), String> {
        *self.0 = raw.parse().map_err(|e: T::Err| e.to_string())?;
        Ok(())
    }
}

/// Appends each occurrence in arrival order.
struct Sequence<'a, T>(&'a mut Vec<T>);

impl<T> Store for Sequence<'_, T>
where
    T: FromStr,
    T::Err: Display,
{
    fn store(&mut self, raw: &str) -> Result<(), String> {
        self.0.push(raw.parse().map_err(|e: T::Err| e.to_string())?);
        Ok(())
    }
}

/// Owned-or-borrowed destination of one node's values.
pub enum Receiver<'a> {
    /// Library-owned storage of raw values, in arrival order.
    Owned(Vec<String>),
    /// Caller-owned storage reached through a typed sink.
    Reference(Box<dyn Store + 'a>),
}

impl<'a> Receiver<'a> {
    pub fn owned() -> Self {
        Receiver::Owned(Vec::new())
    }

    /// Writes each value into `slot`; later occurrences overwrite earlier ones.
    pub fn reference<T>(slot: &'a mut T) -> Self
    where
        T: FromStr + 'a,
        T::Err: Display,
    {
        Receiver::Reference(Box::new(Scalar(slot)))
    }

    /// Appends every value to `slot`.
    pub fn reference_all<T>(slot: &'a mut Vec<T>) -> Self
    where
        T: FromStr + 'a,
        T::Err: Display,
    {
        Receiver::Reference(Box::new(Sequence(slot)))
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Receiver::Owned(_))
    }

    /// Delivers one value.
    pub fn receive(&mut self, raw: &str) -> Result<(), String> {
        match self {
            Receiver::Owned(values) => {
                values.push(raw.to_string());
                Ok(())
            }
            Receiver::Reference(sink) => sink.store(raw),
        }
    }

    /// The owned values, or `None` for a reference receiver.
    pub fn into_values(self) -> Option<Vec<String>> {
        match self {
            Receiver::Owned(values) => Some(values),
            Receiver::Reference(_) => None,
        }
    }
}

impl std::fmt::Debug for Receiver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Receiver::Owned(values) => f.debug_tuple("Owned").field(values).finish(),
            Receiver::Reference(_) => f.write_str("Reference(..)"),
        }
    }
}

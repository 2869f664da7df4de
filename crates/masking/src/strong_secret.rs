//!
//! Secret which is wiped from memory when dropped.
//!

use std::{fmt, marker::PhantomData, str::FromStr};

use zeroize::Zeroize;

use crate::{strategy::Strategy, PeekInterface};

///
/// Secret thing which zeroizes its value on drop.
///
/// Use it for data that must not outlive its purpose in memory, such as a card number or
/// security code that is replaced once a payment is authorized. There is no `ExposeInterface`
/// for it: moving the value out would defeat the wipe.
///
pub struct StrongSecret<S: Zeroize, I = crate::WithType>
where
    I: Strategy<S>,
{
    pub(crate) inner_secret: S,
    marker: PhantomData<I>,
}

impl<S: Zeroize, I> StrongSecret<S, I>
where
    I: Strategy<S>,
{
    /// Take ownership of a secret value
    pub fn new(secret: S) -> Self {
        Self {
            inner_secret: secret,
            marker: PhantomData,
        }
    }
}

impl<S: Zeroize, I> PeekInterface<S> for StrongSecret<S, I>
where
    I: Strategy<S>,
{
    fn peek(&self) -> &S {
        &self.inner_secret
    }
}

impl<S: Zeroize, I> From<S> for StrongSecret<S, I>
where
    I: Strategy<S>,
{
    fn from(secret: S) -> Self {
        Self::new(secret)
    }
}

impl<S: Clone + Zeroize, I> Clone for StrongSecret<S, I>
where
    I: Strategy<S>,
{
    fn clone(&self) -> Self {
        Self::new(self.inner_secret.clone())
    }
}

impl<S, I> PartialEq for StrongSecret<S, I>
where
    S: PartialEq + Zeroize,
    I: Strategy<S>,
{
    fn eq(&self, other: &Self) -> bool {
        self.peek().eq(other.peek())
    }
}

impl<S, I> Eq for StrongSecret<S, I>
where
    S: Eq + Zeroize,
    I: Strategy<S>,
{
}

impl<S: Zeroize, I> fmt::Debug for StrongSecret<S, I>
where
    I: Strategy<S>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        I::fmt(&self.inner_secret, f)
    }
}

impl<S: Zeroize + Default, I> Default for StrongSecret<S, I>
where
    I: Strategy<S>,
{
    fn default() -> Self {
        S::default().into()
    }
}

impl<S: Zeroize, I> Drop for StrongSecret<S, I>
where
    I: Strategy<S>,
{
    fn drop(&mut self) {
        self.inner_secret.zeroize();
    }
}

/// Parsing never fails. `String` only implements `Zeroize` with the `alloc` feature.
#[cfg(feature = "alloc")]
impl<I> FromStr for StrongSecret<String, I>
where
    I: Strategy<String>,
{
    type Err = core::convert::Infallible;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(src.to_owned()))
    }
}

use std::{
    fmt,
    fmt::{Debug, Display},
};

const MASK: &str = "****";

/// Wrapper for credentials that must never leak into logs. `Debug` and `Display` print `****`;
/// callers that really need the value go through [`Secret::reveal`].
#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    inner: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn reveal(&self) -> &T {
        &self.inner
    }
}

impl<T: Clone + Default> From<T> for Secret<T> {
    fn from(inner: T) -> Self {
        Self::new(inner)
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

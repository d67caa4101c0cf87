//! Ordered, lazily evaluated fallback chains for tag values.
//!
//! ```ignore
//! let title = Fallback::new()
//!     .then(|| source.property(TagField::Title))
//!     .then(|| source.basic(BasicField::Title))
//!     .then(|| file_stem(path))
//!     .resolve();
//! ```
//!
//! Providers run in order and stop at the first present value. Later
//! providers are never called once an earlier one answered.

/// Values that can be "absent" even when `Some`.
pub trait Present {
    fn is_present(&self) -> bool;
}

impl Present for String {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Present for u32 {
    fn is_present(&self) -> bool {
        true
    }
}

impl Present for bool {
    fn is_present(&self) -> bool {
        true
    }
}

impl Present for Vec<u8> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

type Provider<'a, T> = Box<dyn FnOnce() -> Option<T> + 'a>;

/// A chain of value providers.
pub struct Fallback<'a, T> {
    providers: Vec<Provider<'a, T>>,
}

impl<'a, T: Present> Fallback<'a, T> {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Appends a provider.
    pub fn then(mut self, provider: impl FnOnce() -> Option<T> + 'a) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// First present value, if any provider has one.
    pub fn resolve(self) -> Option<T> {
        self.providers
            .into_iter()
            .find_map(|provider| provider().filter(T::is_present))
    }

    pub fn resolve_or(self, default: T) -> T {
        self.resolve().unwrap_or(default)
    }
}

impl<'a, T: Present> Default for Fallback<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_first_present_value_wins() {
        let value = Fallback::new()
            .then(|| None)
            .then(|| Some("   ".to_string()))
            .then(|| Some("second".to_string()))
            .then(|| Some("third".to_string()))
            .resolve();
        assert_eq!(value.as_deref(), Some("second"));
    }

    #[test]
    fn test_later_providers_not_evaluated() {
        let calls = Cell::new(0);
        let value = Fallback::new()
            .then(|| Some(7u32))
            .then(|| {
                calls.set(calls.get() + 1);
                Some(8)
            })
            .resolve();
        assert_eq!(value, Some(7));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_default_when_nothing_present() {
        let value = Fallback::<String>::new()
            .then(|| None)
            .then(|| Some(String::new()))
            .resolve_or("fallback".to_string());
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_empty_bytes_are_absent() {
        let value = Fallback::new()
            .then(|| Some(Vec::new()))
            .then(|| Some(vec![1u8]))
            .resolve();
        assert_eq!(value, Some(vec![1]));
    }
}

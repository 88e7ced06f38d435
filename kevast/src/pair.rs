//! Key/value carriers threaded through a middleware chain

/// Carrier for writes: the value is always present
///
/// Interceptors may rewrite either slot before the pair reaches the storages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub key: String,
    pub value: String,
}

impl Pair {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Carrier for reads: the value starts unset
///
/// The terminal step fills `value` from the master storage. An interceptor
/// may overwrite it on the way back out, or fill it before continuing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullablePair {
    pub key: String,
    pub value: Option<String>,
}

impl NullablePair {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }
}

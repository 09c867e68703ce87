/// Values a coroutine is resumed with.
///
/// A continuation can be called with any number of values. They are
/// unwrapped by count: no value is [`Unit`](Self::Unit), one value is
/// [`Single`](Self::Single), and more than one is an ordered
/// [`Tuple`](Self::Tuple).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resumed<V> {
    Unit,
    Single(V),
    Tuple(Vec<V>),
}

impl<V> Default for Resumed<V> {
    fn default() -> Self {
        Self::Unit
    }
}

impl<V> From<Vec<V>> for Resumed<V> {
    fn from(mut values: Vec<V>) -> Self {
        match values.len() {
            0 => Self::Unit,
            1 => match values.pop() {
                Some(value) => Self::Single(value),
                None => Self::Unit,
            },
            _ => Self::Tuple(values),
        }
    }
}

impl<V> From<Option<V>> for Resumed<V> {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(value) => Self::Single(value),
            None => Self::Unit,
        }
    }
}

impl<V> Resumed<V> {
    /// Number of values the continuation was called with
    pub fn len(&self) -> usize {
        match self {
            Self::Unit => 0,
            Self::Single(_) => 1,
            Self::Tuple(values) => values.len(),
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }

    /// Get the value if resumed with exactly one value
    pub fn single(self) -> Option<V> {
        match self {
            Self::Single(value) => Some(value),
            _ => None,
        }
    }

    /// Like [`single`](Self::single), but error if not resumed with exactly one value.
    ///
    /// This is convenient in a coroutine body:
    /// ```rust,ignore
    /// let value = cx.suspend().await?.into_single()?;
    /// ```
    pub fn into_single(self) -> crate::Result<V> {
        match self {
            Self::Single(value) => Ok(value),
            other => crate::bail!("expected 1 resumption value, got {}", other.len()),
        }
    }

    /// Flatten into the values in order
    pub fn into_vec(self) -> Vec<V> {
        match self {
            Self::Unit => Vec::new(),
            Self::Single(value) => vec![value],
            Self::Tuple(values) => values,
        }
    }
}

use std::fmt::{self, Display, Formatter};

/// Factory for the placeholder syntax a dialect uses for parameterized values.
///
/// A factory is stateless and shared; [`BindMarkersFactory::create`] produces a
/// fresh stateful [`BindMarkers`] per query render so placeholder indices are
/// monotonic and consistent across the whole statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMarkersFactory {
    /// `?`-style markers with no identity.
    Anonymous,
    /// `$1, $2, …` style markers counting from `begin`.
    Indexed {
        prefix: &'static str,
        begin: usize,
    },
    /// `@name` style markers deriving the name from a hint.
    Named {
        prefix: &'static str,
        name_prefix: &'static str,
    },
}

impl BindMarkersFactory {
    pub fn anonymous() -> Self {
        Self::Anonymous
    }
    pub fn indexed(prefix: &'static str, begin: usize) -> Self {
        Self::Indexed { prefix, begin }
    }
    pub fn named(prefix: &'static str, name_prefix: &'static str) -> Self {
        Self::Named {
            prefix,
            name_prefix,
        }
    }

    pub fn create(&self) -> BindMarkers {
        BindMarkers {
            factory: *self,
            counter: 0,
        }
    }
}

/// Stateful marker sequence for a single query render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMarkers {
    factory: BindMarkersFactory,
    counter: usize,
}

impl BindMarkers {
    /// Next marker. The hint contributes to the placeholder name for named
    /// dialects (reduced to `[A-Za-z0-9_]` characters) and is ignored
    /// otherwise.
    pub fn next(&mut self, hint: &str) -> BindMarker {
        let ordinal = self.counter;
        self.counter += 1;
        let placeholder = match self.factory {
            BindMarkersFactory::Anonymous => "?".to_owned(),
            BindMarkersFactory::Indexed { prefix, begin } => {
                let mut buffer = itoa::Buffer::new();
                let mut placeholder = String::with_capacity(prefix.len() + 2);
                placeholder.push_str(prefix);
                placeholder.push_str(buffer.format(begin + ordinal));
                placeholder
            }
            BindMarkersFactory::Named {
                prefix,
                name_prefix,
            } => {
                let mut buffer = itoa::Buffer::new();
                let mut placeholder = String::with_capacity(prefix.len() + hint.len() + 4);
                placeholder.push_str(prefix);
                placeholder.push_str(name_prefix);
                placeholder.push_str(buffer.format(ordinal));
                let mut separated = false;
                for c in hint.chars() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        if !separated {
                            placeholder.push('_');
                            separated = true;
                        }
                        placeholder.push(c);
                    }
                }
                placeholder
            }
        };
        BindMarker {
            placeholder,
            ordinal,
        }
    }
}

/// A single placeholder occurrence inside a rendered statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMarker {
    placeholder: String,
    ordinal: usize,
}

impl BindMarker {
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }
    /// Zero based position of this marker within its render.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

impl Display for BindMarker {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.placeholder)
    }
}

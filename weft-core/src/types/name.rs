use std::fmt;

use crate::TypeNameError;

/// A namespace-qualified type name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    /// Namespace URI; empty for unqualified names.
    pub namespace: String,
    /// Local name.
    pub name: String,
}

impl TypeName {
    /// Build a name from its namespace and local part.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse `prefix:Name` (or bare `Name`, which uses the empty prefix),
    /// mapping the prefix through `lookup`.
    pub fn parse(
        qualified: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, TypeNameError> {
        let qualified = qualified.trim();
        let (prefix, local) = qualified.split_once(':').unwrap_or(("", qualified));
        if local.is_empty() {
            return Err(TypeNameError::Empty);
        }
        let namespace =
            lookup(prefix).ok_or_else(|| TypeNameError::UnknownPrefix(prefix.to_string()))?;
        Ok(Self::new(namespace, local))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.name)
        }
    }
}

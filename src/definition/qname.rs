use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Qualified name identifying a composite and the deployable unit it defines
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    pub namespace: String,
    pub local: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

impl FromStr for QName {
    type Err = String;

    /// Parses `{namespace}local` or a bare `local`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('{') {
            Some(rest) => {
                let (namespace, local) = rest
                    .split_once('}')
                    .ok_or_else(|| format!("Unterminated namespace in qualified name: {s}"))?;
                if local.is_empty() {
                    return Err(format!("Missing local part in qualified name: {s}"));
                }
                Ok(QName::new(namespace, local))
            }
            None if s.is_empty() => Err("Qualified name cannot be empty".to_string()),
            None => Ok(QName::new("", s)),
        }
    }
}

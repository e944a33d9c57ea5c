//! The closed set of operations the dispatcher can route to

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Store a document under a name
    DataSet,
    /// Fetch the document stored under a name
    DataGet,
    /// Remove every document
    Reset,
    /// List every stored name
    ListNames,
}

/// Normalized wire names, including the `db_` names older clients send
const NAME_TABLE: &[(&str, Operation)] = &[
    ("data_set", Operation::DataSet),
    ("data_get", Operation::DataGet),
    ("reset", Operation::Reset),
    ("list_names", Operation::ListNames),
    ("db_data_set", Operation::DataSet),
    ("db_data_get", Operation::DataGet),
    ("db_reset", Operation::Reset),
    ("db_list_names", Operation::ListNames),
];

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::DataSet,
        Operation::DataGet,
        Operation::Reset,
        Operation::ListNames,
    ];

    /// Resolve a requested method name. Hyphens and underscores are
    /// interchangeable; anything else must match exactly.
    pub fn resolve(method: &str) -> Option<Self> {
        let normalized = method.replace('-', "_");
        NAME_TABLE
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, op)| *op)
    }

    /// Canonical hyphenated name
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::DataSet => "data-set",
            Operation::DataGet => "data-get",
            Operation::Reset => "reset",
            Operation::ListNames => "list-names",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s).ok_or_else(|| crate::CoreError::UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_both_conventions() {
        assert_eq!(Operation::resolve("data-set"), Some(Operation::DataSet));
        assert_eq!(Operation::resolve("data_set"), Some(Operation::DataSet));
        assert_eq!(Operation::resolve("list-names"), Some(Operation::ListNames));
        assert_eq!(Operation::resolve("list_names"), Some(Operation::ListNames));
        assert_eq!(Operation::resolve("reset"), Some(Operation::Reset));
    }

    #[test]
    fn test_resolve_legacy_names() {
        assert_eq!(Operation::resolve("db_data_get"), Some(Operation::DataGet));
        assert_eq!(Operation::resolve("db-list-names"), Some(Operation::ListNames));
    }

    #[test]
    fn test_resolve_unknown() {
        assert_eq!(Operation::resolve(""), None);
        assert_eq!(Operation::resolve("drop_table"), None);
        assert_eq!(Operation::resolve("DATA_SET"), None);
        assert_eq!(Operation::resolve("data set"), None);
    }

    #[test]
    fn test_canonical_names_resolve_to_themselves() {
        for op in Operation::ALL {
            assert_eq!(Operation::resolve(op.as_str()), Some(op));
        }
    }

    #[test]
    fn test_from_str_error() {
        let err = "nope".parse::<Operation>().unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}

use std::fmt;

use itertools::Itertools;

/// The schema names involved in a conflict, rendered for humans: `schema "A"`,
/// `schemas "A" and "B"`, `schemas "A", "B" and "C"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaNames(Vec<String>);

impl SchemaNames {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, schema: &str) -> bool {
        self.0.iter().any(|name| name == schema)
    }
}

impl<S: Into<String>> FromIterator<S> for SchemaNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).unique().collect())
    }
}

impl fmt::Display for SchemaNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted = self.0.iter().map(|name| format!("\"{name}\"")).collect_vec();
        match quoted.as_slice() {
            [] => f.write_str("no schema"),
            [single] => write!(f, "schema {single}"),
            [init @ .., last] => write!(f, "schemas {} and {last}", init.join(", ")),
        }
    }
}

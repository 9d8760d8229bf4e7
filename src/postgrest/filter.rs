//! Filter expressions shared by REST queries and realtime subscriptions

use std::fmt;

/// A single `column = value` condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    /// Rows where `column` equals `value`
    pub fn eq<T: ToString>(column: &str, value: T) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    /// The query-string value, e.g. `eq.true`
    pub fn param_value(&self) -> String {
        format!("eq.{}", self.value)
    }
}

/// Realtime filter syntax: `column=op.value`
impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.column, self.param_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_formats() {
        let filter = Filter::eq("public_status", true);
        assert_eq!(filter.param_value(), "eq.true");
        assert_eq!(filter.to_string(), "public_status=eq.true");
    }
}

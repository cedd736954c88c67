//! Post-processing applied to the headline value before it is published.

/// Turns the raw "tomorrow" value into the published headline value.
pub trait ValueTransform: Send + Sync {
    /// Transform the raw value.
    fn apply(&self, raw: &str) -> String;
}

impl<F> ValueTransform for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn apply(&self, raw: &str) -> String {
        self(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Substitutes the raw value for every `{value}` placeholder in a pattern.
pub struct Template {
    pattern: String,
}

impl Template {
    /// Placeholder replaced by the raw value.
    pub const PLACEHOLDER: &'static str = "{value}";

    /// Create a template from a pattern such as `"Tomorrow: {value}"`.
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// The pattern as configured.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl ValueTransform for Template {
    fn apply(&self, raw: &str) -> String {
        self.pattern.replace(Self::PLACEHOLDER, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_replaces_every_placeholder() {
        let template = Template::new("{value} ({value})");
        assert_eq!(template.apply("Paper"), "Paper (Paper)");
    }

    #[test]
    fn template_without_placeholder_is_constant() {
        assert_eq!(Template::new("bins out").apply("Paper"), "bins out");
    }

    #[test]
    fn closures_are_transforms() {
        let upper = |raw: &str| raw.to_uppercase();
        assert_eq!(upper.apply("Paper"), "PAPER");
    }
}

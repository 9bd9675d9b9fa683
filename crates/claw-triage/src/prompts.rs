//! Explanation prompt templates.
//!
//! Each finding's kind selects a prompt template for the explanation
//! backend. Templates carry exactly two [`SLOT`]s, filled in order with the
//! target language and the finding's error payload. The table is built once
//! and passed to whoever needs it; it is never mutated during a pass.

use crate::config::TriageConfig;
use crate::error::{Result, TriageError};
use std::collections::HashMap;

/// Substitution slot marker.
pub const SLOT: &str = "{}";

/// Kind whose template is used when no kind-specific template exists.
pub const DEFAULT_KIND: &str = "default";

const DEFAULT_PROMPT: &str = "Simplify the following Kubernetes error message delimited by triple dashes written in --- {} --- language; --- {} ---.
Provide the most possible solution in a step by step style in no more than 280 characters. Write the output in the following format:
Error: {Explain error here}
Solution: {Step by step solution here}
";

const APPS_PROMPT: &str = "Simplify the following Carvel error message delimited by triple dashes written in --- {} --- language; --- {} ---.
Provide the most possible solution in a step by step style in no more than 280 characters also refer to https://github.com/carvel-dev. Write the output in the following format:
Error: {Explain error here}
Solution: {Step by step solution here}
Provide GitHub Issue or PR from https://github.com/carvel-dev if exists as a reference";

const VULNERABILITY_PROMPT: &str = "Explain the following trivy scan result and the detail risk or root cause of the CVE ID, then provide a solution. Response in {}: {}";

/// Counts the substitution slots in a template.
#[must_use]
pub fn count_slots(template: &str) -> usize {
    template.matches(SLOT).count()
}

/// Fills a template's two slots with the target language and error payload.
///
/// Slot markers inside the substituted values are left untouched.
#[must_use]
pub fn fill_template(template: &str, language: &str, payload: &str) -> String {
    let mut output = String::with_capacity(template.len() + language.len() + payload.len());
    let mut values = [language, payload].into_iter();
    let mut rest = template;

    while let Some(index) = rest.find(SLOT) {
        let Some(value) = values.next() else { break };
        output.push_str(&rest[..index]);
        output.push_str(value);
        rest = &rest[index + SLOT.len()..];
    }
    output.push_str(rest);
    output
}

/// Table mapping kinds to prompt templates.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    templates: HashMap<String, String>,
}

impl PromptTemplates {
    /// Creates a table with only the default template.
    #[must_use]
    pub fn new() -> Self {
        let mut templates = HashMap::new();
        templates.insert(DEFAULT_KIND.to_string(), DEFAULT_PROMPT.to_string());
        Self { templates }
    }

    /// Creates the built-in table: the default template plus Carvel apps and
    /// Trivy vulnerability reports.
    #[must_use]
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table
            .templates
            .insert("apps".to_string(), APPS_PROMPT.to_string());
        table
            .templates
            .insert("VulnerabilityReport".to_string(), VULNERABILITY_PROMPT.to_string());
        table
    }

    /// Creates the built-in table with the configured overrides applied.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidTemplate`] if an override does not
    /// carry exactly two slots.
    pub fn from_config(config: &TriageConfig) -> Result<Self> {
        let mut table = Self::builtin();
        for (kind, template) in &config.prompts {
            table.insert(kind.clone(), template.clone())?;
        }
        Ok(table)
    }

    /// Adds or replaces the template for a kind.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidTemplate`] if the template does not
    /// carry exactly two slots.
    pub fn insert(&mut self, kind: impl Into<String>, template: impl Into<String>) -> Result<()> {
        let kind = kind.into();
        let template = template.into();
        let slots = count_slots(&template);
        if slots != 2 {
            return Err(TriageError::InvalidTemplate { kind, slots });
        }
        self.templates.insert(kind, template);
        Ok(())
    }

    /// Returns the template for `kind`, or the default template.
    #[must_use]
    pub fn select(&self, kind: &str) -> &str {
        self.templates
            .get(kind)
            .or_else(|| self.templates.get(DEFAULT_KIND))
            .map_or(DEFAULT_PROMPT, String::as_str)
    }

    /// Returns true if `kind` has its own template.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.templates.contains_key(kind)
    }

    /// Returns the number of templates, including the default.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Always false: the default template is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("" => 0 ; "empty")]
    #[test_case("Explain {} in {}" => 2 ; "two slots")]
    #[test_case("{Explain error here} {}" => 1 ; "braced prose is not a slot")]
    #[test_case("{}{}{}" => 3 ; "adjacent slots")]
    fn slot_counting(template: &str) -> usize {
        count_slots(template)
    }

    #[test]
    fn builtin_templates_have_two_slots() {
        for template in [DEFAULT_PROMPT, APPS_PROMPT, VULNERABILITY_PROMPT] {
            assert_eq!(count_slots(template), 2);
        }
    }

    #[test]
    fn default_matches_new() {
        let table = PromptTemplates::default();
        assert_eq!(table.len(), PromptTemplates::new().len());
        assert!(table.contains(DEFAULT_KIND));
        assert!(!table.contains("apps"));
        assert_eq!(table.select("apps"), DEFAULT_PROMPT);
    }

    #[test]
    fn select_exact_kind() {
        let table = PromptTemplates::builtin();
        assert_eq!(table.select("apps"), APPS_PROMPT);
        assert_eq!(table.select("VulnerabilityReport"), VULNERABILITY_PROMPT);
    }

    #[test_case("unregistered-kind" ; "unknown kind")]
    #[test_case("Clusters" ; "analyzer without template")]
    #[test_case("Apps" ; "lookup is case sensitive")]
    fn unknown_kind_falls_back_to_default(kind: &str) {
        let table = PromptTemplates::builtin();
        assert_eq!(table.select(kind), table.select(DEFAULT_KIND));
    }

    #[test]
    fn insert_validates_slots() {
        let mut table = PromptTemplates::new();
        let err = table.insert("Clusters", "no slots here").expect_err("should reject");
        assert!(matches!(err, TriageError::InvalidTemplate { slots: 0, .. }));
        assert!(!table.contains("Clusters"));

        table
            .insert("Clusters", "Explain this Cluster API error in {}: {}")
            .expect("insert");
        assert_eq!(table.select("Clusters"), "Explain this Cluster API error in {}: {}");
    }

    #[test]
    fn default_can_be_replaced() {
        let mut table = PromptTemplates::builtin();
        table.insert(DEFAULT_KIND, "In {}: {}").expect("insert");
        assert_eq!(table.select("unregistered-kind"), "In {}: {}");
    }

    #[test]
    fn from_config_applies_overrides() {
        let mut config = TriageConfig::default();
        config
            .prompts
            .insert("Clusters".to_string(), "Cluster API, {}: {}".to_string());

        let table = PromptTemplates::from_config(&config).expect("table");

        assert_eq!(table.select("Clusters"), "Cluster API, {}: {}");
        assert_eq!(table.select("apps"), APPS_PROMPT);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn fill_substitutes_in_order() {
        let filled = fill_template("Explain in {}: {}", "german", "pod crashed");
        assert_eq!(filled, "Explain in german: pod crashed");
    }

    #[test]
    fn fill_leaves_slots_in_values_alone() {
        let filled = fill_template("{} -> {}", "{}", "a {} b");
        assert_eq!(filled, "{} -> a {} b");
    }

    #[test]
    fn fill_keeps_braced_prose() {
        let filled = fill_template(DEFAULT_PROMPT, "english", "boom");
        assert!(filled.contains("--- english ---"));
        assert!(filled.contains("--- boom ---"));
        assert!(filled.contains("{Explain error here}"));
    }
}

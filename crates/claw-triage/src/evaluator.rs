//! Failure detection over resource status.
//!
//! A [`ConditionEvaluator`] turns the status of one resource into zero or
//! more [`Failure`]s. Two signal classes are combined:
//!
//! - a top-level failure message, emitted whenever it is non-empty, and
//! - status conditions, matched by a per-kind [`FailureRule`].

use crate::types::{Condition, ConditionSeverity, Failure};
use serde::{Deserialize, Serialize};

/// Which condition field becomes failure text.
///
/// If the chosen field is empty, the other one is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConditionText {
    /// The human-readable `message` field.
    #[default]
    Message,
    /// The machine-readable `reason` field.
    Reason,
}

impl ConditionText {
    /// Returns the text describing a condition.
    #[must_use]
    pub fn describe(self, condition: &Condition) -> String {
        let message = non_empty(condition.message.as_deref());
        let reason = non_empty(condition.reason.as_deref());
        let picked = match self {
            Self::Message => message.or(reason),
            Self::Reason => reason.or(message),
        };
        picked.map_or_else(
            || format!("{} condition is {}", condition.type_, condition.status),
            str::to_string,
        )
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Rule deciding which conditions signal a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureRule {
    /// Every condition at this severity tier is a failure.
    SeverityTier(ConditionSeverity),
    /// The first condition whose type is listed and whose status matches is a
    /// failure; later matches are ignored.
    Signature {
        /// Condition types that signal failure.
        types: Vec<String>,
        /// Status value the condition must carry.
        status: String,
    },
}

impl FailureRule {
    /// Returns true if the condition matches this rule.
    #[must_use]
    pub fn matches(&self, condition: &Condition) -> bool {
        match self {
            Self::SeverityTier(tier) => condition.severity == *tier,
            Self::Signature { types, status } => {
                condition.status == *status && types.iter().any(|t| *t == condition.type_)
            }
        }
    }
}

/// Status fields an evaluator reads from one resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusSignals<'a> {
    /// Top-level failure message.
    pub failure_message: Option<&'a str>,
    /// Resource-provided summary used as text for signature matches.
    pub useful_error_message: Option<&'a str>,
    /// Status conditions.
    pub conditions: &'a [Condition],
}

/// Result of evaluating one resource.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Evaluation {
    /// Failures in discovery order.
    pub failures: Vec<Failure>,
    /// True when at least one condition matched the rule.
    pub condition_failed: bool,
}

impl Evaluation {
    /// Returns true if the resource produced no failures.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Evaluates resource status against a [`FailureRule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionEvaluator {
    rule: FailureRule,
    text: ConditionText,
}

impl ConditionEvaluator {
    /// Creates an evaluator with the given rule and message text source.
    #[must_use]
    pub const fn new(rule: FailureRule) -> Self {
        Self {
            rule,
            text: ConditionText::Message,
        }
    }

    /// Creates an evaluator that flags every condition at `tier`.
    #[must_use]
    pub const fn severity_tier(tier: ConditionSeverity) -> Self {
        Self::new(FailureRule::SeverityTier(tier))
    }

    /// Creates an evaluator that flags the first condition matching a
    /// `(type, status)` signature.
    #[must_use]
    pub fn signature<I, S>(types: I, status: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(FailureRule::Signature {
            types: types.into_iter().map(Into::into).collect(),
            status: status.into(),
        })
    }

    /// Selects which condition field becomes failure text.
    #[must_use]
    pub const fn with_text_source(mut self, text: ConditionText) -> Self {
        self.text = text;
        self
    }

    /// Returns the rule.
    #[must_use]
    pub const fn rule(&self) -> &FailureRule {
        &self.rule
    }

    /// Returns the condition text source.
    #[must_use]
    pub const fn text_source(&self) -> ConditionText {
        self.text
    }

    /// Evaluates one resource.
    ///
    /// `doc_ref` is attached to the top-level failure and to signature
    /// matches.
    #[must_use]
    pub fn evaluate(&self, signals: &StatusSignals<'_>, doc_ref: &str) -> Evaluation {
        let mut evaluation = Evaluation::default();

        if let Some(message) = non_empty(signals.failure_message) {
            evaluation
                .failures
                .push(Failure::new(message).with_doc_ref(doc_ref));
        }

        match &self.rule {
            FailureRule::SeverityTier(_) => {
                for condition in signals.conditions.iter().filter(|c| self.rule.matches(c)) {
                    evaluation
                        .failures
                        .push(Failure::new(self.text.describe(condition)));
                    evaluation.condition_failed = true;
                }
            }
            FailureRule::Signature { .. } => {
                if let Some(condition) = signals.conditions.iter().find(|c| self.rule.matches(c)) {
                    let text = non_empty(signals.useful_error_message)
                        .map_or_else(|| self.text.describe(condition), str::to_string);
                    evaluation
                        .failures
                        .push(Failure::new(text).with_doc_ref(doc_ref));
                    evaluation.condition_failed = true;
                }
            }
        }

        evaluation
    }

    /// Evaluates bare conditions, as used for dependent resources.
    #[must_use]
    pub fn evaluate_conditions(&self, conditions: &[Condition]) -> Vec<Failure> {
        let signals = StatusSignals {
            conditions,
            ..StatusSignals::default()
        };
        self.evaluate(&signals, "").failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "Clusters.metadata.name (cluster.x-k8s.io/v1beta1)";

    fn error_condition(message: &str) -> Condition {
        Condition::new("Ready", "False")
            .with_severity(ConditionSeverity::Error)
            .with_reason("ReasonCode")
            .with_message(message)
    }

    fn app_evaluator() -> ConditionEvaluator {
        ConditionEvaluator::signature(["ReconcileFailed", "DeleteFailed"], "True")
    }

    mod top_level_tests {
        use super::*;

        #[test]
        fn failure_message_always_emitted_with_doc() {
            let evaluator = ConditionEvaluator::severity_tier(ConditionSeverity::Error);
            let signals = StatusSignals {
                failure_message: Some("control plane unreachable"),
                ..StatusSignals::default()
            };

            let evaluation = evaluator.evaluate(&signals, DOC);

            assert_eq!(
                evaluation.failures,
                vec![Failure::new("control plane unreachable").with_doc_ref(DOC)]
            );
            assert!(!evaluation.condition_failed);
        }

        #[test]
        fn empty_failure_message_ignored() {
            let evaluator = ConditionEvaluator::severity_tier(ConditionSeverity::Error);
            let signals = StatusSignals {
                failure_message: Some(""),
                ..StatusSignals::default()
            };

            assert!(evaluator.evaluate(&signals, DOC).is_healthy());
        }
    }

    mod severity_tier_tests {
        use super::*;
        use test_case::test_case;

        #[test]
        fn every_error_condition_is_reported() {
            let evaluator = ConditionEvaluator::severity_tier(ConditionSeverity::Error);
            let conditions = vec![
                error_condition("infrastructure not ready"),
                Condition::new("Ready", "True").with_severity(ConditionSeverity::Info),
                error_condition("kubeconfig missing"),
            ];
            let signals = StatusSignals {
                conditions: &conditions,
                ..StatusSignals::default()
            };

            let evaluation = evaluator.evaluate(&signals, DOC);

            assert!(evaluation.condition_failed);
            let texts: Vec<_> = evaluation.failures.iter().map(|f| f.text.as_str()).collect();
            assert_eq!(texts, vec!["infrastructure not ready", "kubeconfig missing"]);
            assert!(evaluation.failures.iter().all(|f| f.doc_ref.is_none()));
        }

        #[test_case(ConditionSeverity::Warning ; "warning")]
        #[test_case(ConditionSeverity::Info ; "info")]
        #[test_case(ConditionSeverity::None ; "none")]
        fn other_tiers_are_ignored(severity: ConditionSeverity) {
            let evaluator = ConditionEvaluator::severity_tier(ConditionSeverity::Error);
            let conditions = vec![Condition::new("Ready", "False")
                .with_severity(severity)
                .with_message("slow")];

            assert!(evaluator.evaluate_conditions(&conditions).is_empty());
        }

        #[test]
        fn failure_message_and_conditions_combine() {
            let evaluator = ConditionEvaluator::severity_tier(ConditionSeverity::Error);
            let conditions = vec![error_condition("machine failed")];
            let signals = StatusSignals {
                failure_message: Some("boom"),
                conditions: &conditions,
                ..StatusSignals::default()
            };

            let evaluation = evaluator.evaluate(&signals, DOC);

            assert_eq!(evaluation.failures.len(), 2);
            assert_eq!(evaluation.failures[0].text, "boom");
            assert_eq!(evaluation.failures[1].text, "machine failed");
        }
    }

    mod signature_tests {
        use super::*;
        use test_case::test_case;

        #[test]
        fn uses_useful_error_message() {
            let conditions = vec![Condition::new("ReconcileFailed", "True").with_message("raw")];
            let signals = StatusSignals {
                useful_error_message: Some("image pull failed"),
                conditions: &conditions,
                ..StatusSignals::default()
            };

            let evaluation = app_evaluator().evaluate(&signals, DOC);

            assert_eq!(
                evaluation.failures,
                vec![Failure::new("image pull failed").with_doc_ref(DOC)]
            );
            assert!(evaluation.condition_failed);
        }

        #[test]
        fn stops_at_first_match() {
            let conditions = vec![
                Condition::new("ReconcileFailed", "True"),
                Condition::new("DeleteFailed", "True"),
            ];
            let signals = StatusSignals {
                useful_error_message: Some("delete blocked"),
                conditions: &conditions,
                ..StatusSignals::default()
            };

            let evaluation = app_evaluator().evaluate(&signals, DOC);

            assert_eq!(evaluation.failures.len(), 1);
        }

        #[test_case("ReconcileFailed", "False" ; "status false")]
        #[test_case("ReconcileSucceeded", "True" ; "other type")]
        #[test_case("DeleteFailed", "Unknown" ; "status unknown")]
        fn non_matching_pairs_are_ignored(type_: &str, status: &str) {
            let conditions = vec![Condition::new(type_, status)];
            assert!(app_evaluator().evaluate_conditions(&conditions).is_empty());
        }

        #[test]
        fn severity_does_not_matter_for_signatures() {
            let conditions =
                vec![Condition::new("Ready", "False").with_severity(ConditionSeverity::Error)];
            assert!(app_evaluator().evaluate_conditions(&conditions).is_empty());
        }

        #[test]
        fn empty_useful_message_falls_back_to_condition() {
            let conditions =
                vec![Condition::new("DeleteFailed", "True").with_message("finalizer stuck")];
            let signals = StatusSignals {
                useful_error_message: Some(""),
                conditions: &conditions,
                ..StatusSignals::default()
            };

            let evaluation = app_evaluator().evaluate(&signals, DOC);
            assert_eq!(evaluation.failures[0].text, "finalizer stuck");
        }
    }

    mod text_source_tests {
        use super::*;
        use test_case::test_case;

        #[test]
        fn message_is_default() {
            let evaluator = ConditionEvaluator::severity_tier(ConditionSeverity::Error);
            assert_eq!(evaluator.text_source(), ConditionText::Message);

            let failures = evaluator.evaluate_conditions(&[error_condition("detail")]);
            assert_eq!(failures[0].text, "detail");
        }

        #[test]
        fn reason_can_be_selected() {
            let evaluator = ConditionEvaluator::severity_tier(ConditionSeverity::Error)
                .with_text_source(ConditionText::Reason);

            let failures = evaluator.evaluate_conditions(&[error_condition("detail")]);
            assert_eq!(failures[0].text, "ReasonCode");
        }

        #[test_case(ConditionText::Message, Some("r"), None, "r" ; "message falls back to reason")]
        #[test_case(ConditionText::Reason, None, Some("m"), "m" ; "reason falls back to message")]
        #[test_case(ConditionText::Message, None, None, "Ready condition is False" ; "synthesized")]
        fn describe_fallbacks(
            text: ConditionText,
            reason: Option<&str>,
            message: Option<&str>,
            expected: &str,
        ) {
            let mut condition = Condition::new("Ready", "False");
            condition.reason = reason.map(str::to_string);
            condition.message = message.map(str::to_string);

            assert_eq!(text.describe(&condition), expected);
        }
    }
}

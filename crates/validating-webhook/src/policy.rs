//! Label policy applied to Pods.
//!
//! Rules are evaluated in the order they appear in [`RULES`]. The first rule
//! returning a denial decides the verdict; warnings produced by the rules
//! evaluated up to that point are always surfaced to the caller.

use k8s_openapi::api::core::v1::Pod;
use tracing::debug;

pub const HELLO_LABEL: &str = "hello";
pub const DEPRECATED_HELLO_VALUE: &str = "world";
pub const MISSING_HELLO_LABEL_MESSAGE: &str = "missing required hello label";
pub const DEPRECATED_HELLO_VALUE_WARNING: &str =
    "world will be deprecated for hello in the future";

/// Outcome of the policy evaluation, independent of the wire format.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Verdict {
    pub allowed: bool,
    /// Set only when the Pod is denied.
    pub message: Option<String>,
    pub warnings: Vec<String>,
}

/// What a single rule has to say about a Pod.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleOutcome {
    pub denial: Option<String>,
    pub warnings: Vec<String>,
}

impl RuleOutcome {
    pub fn pass() -> Self {
        RuleOutcome::default()
    }

    pub fn deny(message: impl Into<String>) -> Self {
        RuleOutcome {
            denial: Some(message.into()),
            warnings: Vec::new(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        RuleOutcome {
            denial: None,
            warnings: vec![message.into()],
        }
    }
}

pub type Rule = fn(&Pod) -> RuleOutcome;

pub const RULES: &[(&str, Rule)] = &[("hello-label", hello_label)];

pub fn evaluate(pod: &Pod) -> Verdict {
    evaluate_rules(RULES, pod)
}

pub fn evaluate_rules(rules: &[(&str, Rule)], pod: &Pod) -> Verdict {
    let mut warnings = Vec::new();

    for (name, rule) in rules {
        let outcome = rule(pod);
        warnings.extend(outcome.warnings);

        if let Some(message) = outcome.denial {
            debug!(rule = *name, message = message.as_str(), "validation denied");
            return Verdict {
                allowed: false,
                message: Some(message),
                warnings,
            };
        }
    }

    Verdict {
        allowed: true,
        message: None,
        warnings,
    }
}

/// Every Pod must carry a `hello` label; the `world` value is still accepted
/// but on its way out.
pub fn hello_label(pod: &Pod) -> RuleOutcome {
    let value = pod
        .metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(HELLO_LABEL));

    match value {
        None => RuleOutcome::deny(MISSING_HELLO_LABEL_MESSAGE),
        Some(value) if value == DEPRECATED_HELLO_VALUE => {
            RuleOutcome::warn(DEPRECATED_HELLO_VALUE_WARNING)
        }
        Some(_) => RuleOutcome::pass(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn pod(labels: Option<&[(&str, &str)]>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some("test-pod".to_owned()),
                labels: labels.map(|labels| {
                    labels
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect::<BTreeMap<_, _>>()
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[rstest]
    #[case::no_labels_at_all(None)]
    #[case::empty_labels(Some(&[][..]))]
    #[case::other_labels(Some(&[("app", "nginx"), ("Hello", "world")][..]))]
    fn missing_hello_label_is_denied(#[case] labels: Option<&[(&str, &str)]>) {
        let verdict = evaluate(&pod(labels));

        assert_eq!(
            verdict,
            Verdict {
                allowed: false,
                message: Some("missing required hello label".to_owned()),
                warnings: Vec::new(),
            }
        );
    }

    #[test]
    fn hello_world_is_allowed_with_a_warning() {
        let verdict = evaluate(&pod(Some(&[("hello", "world"), ("app", "nginx")])));

        assert_eq!(
            verdict,
            Verdict {
                allowed: true,
                message: None,
                warnings: vec!["world will be deprecated for hello in the future".to_owned()],
            }
        );
    }

    #[rstest]
    #[case::there("there")]
    #[case::empty("")]
    #[case::capitalized("World")]
    #[case::padded(" world")]
    fn other_hello_values_are_allowed(#[case] value: &str) {
        let verdict = evaluate(&pod(Some(&[("hello", value)])));

        assert_eq!(
            verdict,
            Verdict {
                allowed: true,
                message: None,
                warnings: Vec::new(),
            }
        );
    }

    #[test]
    fn evaluation_is_idempotent() {
        let pod = pod(Some(&[("hello", "world")]));

        assert_eq!(evaluate(&pod), evaluate(&pod));
    }

    fn always_warn(_: &Pod) -> RuleOutcome {
        RuleOutcome::warn("first warning")
    }

    fn always_deny(_: &Pod) -> RuleOutcome {
        RuleOutcome::deny("denied by the second rule")
    }

    fn unreachable_rule(_: &Pod) -> RuleOutcome {
        panic!("rules after the first denial must not run")
    }

    #[test]
    fn first_denial_wins_and_keeps_earlier_warnings() {
        let rules: &[(&str, Rule)] = &[
            ("warn", always_warn),
            ("deny", always_deny),
            ("unreachable", unreachable_rule),
        ];

        let verdict = evaluate_rules(rules, &pod(None));

        assert_eq!(
            verdict,
            Verdict {
                allowed: false,
                message: Some("denied by the second rule".to_owned()),
                warnings: vec!["first warning".to_owned()],
            }
        );
    }

    #[test]
    fn warnings_accumulate_in_rule_order() {
        let rules: &[(&str, Rule)] = &[("warn", always_warn), ("hello-label", hello_label)];

        let verdict = evaluate_rules(rules, &pod(Some(&[("hello", "world")])));

        assert!(verdict.allowed);
        assert_eq!(
            verdict.warnings,
            vec![
                "first warning".to_owned(),
                "world will be deprecated for hello in the future".to_owned()
            ]
        );
    }

    #[test]
    fn no_rules_allows_everything() {
        assert_eq!(
            evaluate_rules(&[], &pod(None)),
            Verdict {
                allowed: true,
                message: None,
                warnings: Vec::new(),
            }
        );
    }
}

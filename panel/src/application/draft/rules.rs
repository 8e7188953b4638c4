use regex::Regex;

/// Placeholder the rule evaluator uses for the subject of a message. The
/// gate swaps it for the variable's display name before the message leaves
/// the panel.
pub const SUBJECT: &str = "{subject}";

/// How the value of a free variable is entered.
///
/// Resolved once per variable definition. A rule string with an `in:` clause
/// turns the variable into a closed enumeration, everything else stays free
/// form text checked by the rule evaluator.
#[derive(Clone, PartialEq, Debug)]
pub enum VariableInputKind {
    Text,
    Enumeration(Vec<String>),
}

impl VariableInputKind {
    pub fn resolve(rules: &str) -> Self {
        let mut values = None;
        for clause in rules.split('|') {
            if let Some(list) = clause.strip_prefix("in:") {
                values = Some(
                    list.split(',')
                        .map(|value| value.trim().to_string())
                        .collect::<Vec<_>>(),
                );
            }
        }
        match values {
            Some(values) => VariableInputKind::Enumeration(values),
            None => VariableInputKind::Text,
        }
    }
}

pub enum RuleOutcome {
    Pass,
    Fail(String),
}

/// Pluggable capability that checks a candidate value against a pipe
/// delimited rule string. Failure messages refer to the subject with the
/// [`SUBJECT`] placeholder.
pub trait RuleEvaluator {
    fn evaluate(&self, rules: &str, value: &str) -> RuleOutcome;
}

/// Covers the rule vocabulary the stock egg catalog uses. Unknown rule
/// names pass.
#[derive(Default)]
pub struct BasicRuleEvaluator;

impl RuleEvaluator for BasicRuleEvaluator {
    fn evaluate(&self, rules: &str, value: &str) -> RuleOutcome {
        let clauses = rules.split('|').collect::<Vec<_>>();

        if value.is_empty() {
            if clauses.iter().any(|clause| *clause == "required") {
                return RuleOutcome::Fail(format!("The {} field is required", SUBJECT));
            }
            // Optional fields skip the remaining checks when empty
            return RuleOutcome::Pass;
        }

        let numeric = clauses
            .iter()
            .any(|clause| *clause == "numeric" || *clause == "integer");

        for clause in clauses {
            let outcome = match clause.split_once(':') {
                None => check_bare(clause, value),
                Some((name, argument)) => check_with_argument(name, argument, value, numeric),
            };
            if let RuleOutcome::Fail(message) = outcome {
                return RuleOutcome::Fail(message);
            }
        }
        RuleOutcome::Pass
    }
}

fn check_bare(clause: &str, value: &str) -> RuleOutcome {
    match clause {
        "numeric" => {
            if value.parse::<f64>().is_err() {
                return RuleOutcome::Fail(format!("The {} field must be numeric", SUBJECT));
            }
        }
        "integer" => {
            if value.parse::<i64>().is_err() {
                return RuleOutcome::Fail(format!("The {} field must be an integer", SUBJECT));
            }
        }
        "boolean" => {
            if !matches!(value, "0" | "1" | "true" | "false") {
                return RuleOutcome::Fail(format!(
                    "The {} field must be true or false",
                    SUBJECT
                ));
            }
        }
        // "string", "required", "nullable", the "port" marker and unknown
        // rules place no constraint on a non empty value
        _ => {}
    }
    RuleOutcome::Pass
}

fn check_with_argument(name: &str, argument: &str, value: &str, numeric: bool) -> RuleOutcome {
    match name {
        "in" => {
            let allowed = argument.split(',').map(str::trim);
            if !allowed.clone().any(|candidate| candidate == value) {
                return RuleOutcome::Fail(format!(
                    "The selected {} is invalid. It must be one of: {}",
                    SUBJECT,
                    allowed.collect::<Vec<_>>().join(", ")
                ));
            }
        }
        "max" => {
            if let Ok(limit) = argument.parse::<f64>() {
                if magnitude(value, numeric) > limit {
                    return RuleOutcome::Fail(format!(
                        "The {} field must not be greater than {}",
                        SUBJECT, argument
                    ));
                }
            }
        }
        "min" => {
            if let Ok(limit) = argument.parse::<f64>() {
                if magnitude(value, numeric) < limit {
                    return RuleOutcome::Fail(format!(
                        "The {} field must be at least {}",
                        SUBJECT, argument
                    ));
                }
            }
        }
        "between" => {
            if let Some((low, high)) = argument.split_once(',') {
                if let (Ok(low), Ok(high)) = (low.trim().parse::<f64>(), high.trim().parse::<f64>())
                {
                    let magnitude = magnitude(value, numeric);
                    if magnitude < low || magnitude > high {
                        return RuleOutcome::Fail(format!(
                            "The {} field must be between {} and {}",
                            SUBJECT, low, high
                        ));
                    }
                }
            }
        }
        "regex" => {
            let pattern = argument
                .strip_prefix('/')
                .and_then(|pattern| pattern.strip_suffix('/'))
                .unwrap_or(argument);
            if let Ok(regex) = Regex::new(pattern) {
                if !regex.is_match(value) {
                    return RuleOutcome::Fail(format!(
                        "The {} field format is invalid",
                        SUBJECT
                    ));
                }
            }
        }
        _ => {}
    }
    RuleOutcome::Pass
}

/// Size rules measure numeric values by magnitude and everything else by
/// string length.
fn magnitude(value: &str, numeric: bool) -> f64 {
    if numeric {
        if let Ok(value) = value.parse::<f64>() {
            return value;
        }
    }
    value.chars().count() as f64
}

/// Runs the gate for one free variable and substitutes the subject name
/// into the failure message.
pub fn check_variable(
    kind: &VariableInputKind,
    name: &str,
    rules: &str,
    value: &str,
    evaluator: &dyn RuleEvaluator,
) -> Option<String> {
    match kind {
        VariableInputKind::Enumeration(allowed) => {
            if allowed.iter().any(|candidate| candidate == value) {
                None
            } else {
                Some(format!(
                    "The selected {} is invalid. It must be one of: {}",
                    name,
                    allowed.join(", ")
                ))
            }
        }
        VariableInputKind::Text => match evaluator.evaluate(rules, value) {
            RuleOutcome::Pass => None,
            RuleOutcome::Fail(message) => Some(message.replace(SUBJECT, name)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{
        check_variable, BasicRuleEvaluator, RuleEvaluator, RuleOutcome, VariableInputKind,
    };

    #[test]
    fn kind_resolution_depends_on_in_clause() {
        assert_eq!(
            VariableInputKind::resolve("required|string|max:20"),
            VariableInputKind::Text
        );
        assert_eq!(
            VariableInputKind::resolve("required|in:a, b ,c"),
            VariableInputKind::Enumeration(vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string()
            ])
        );
    }

    #[test]
    fn last_in_clause_wins() {
        assert_eq!(
            VariableInputKind::resolve("in:a,b|in:c,d"),
            VariableInputKind::Enumeration(vec!["c".to_string(), "d".to_string()])
        );
    }

    #[test]
    fn enumeration_is_a_closed_set() {
        let kind = VariableInputKind::resolve("required|in:a,b,c");
        let evaluator = BasicRuleEvaluator;
        assert!(check_variable(&kind, "MODE", "required|in:a,b,c", "b", &evaluator).is_none());
        let message =
            check_variable(&kind, "MODE", "required|in:a,b,c", "d", &evaluator).unwrap();
        assert!(message.contains("MODE"));
    }

    #[test]
    fn required_rejects_empty_values() {
        let evaluator = BasicRuleEvaluator;
        assert!(matches!(
            evaluator.evaluate("required|string", ""),
            RuleOutcome::Fail(_)
        ));
        assert!(matches!(
            evaluator.evaluate("nullable|numeric", ""),
            RuleOutcome::Pass
        ));
    }

    #[test]
    fn numeric_rules_check_magnitude() {
        let evaluator = BasicRuleEvaluator;
        assert!(matches!(
            evaluator.evaluate("required|numeric|max:1024", "512"),
            RuleOutcome::Pass
        ));
        assert!(matches!(
            evaluator.evaluate("required|numeric|max:1024", "2048"),
            RuleOutcome::Fail(_)
        ));
        assert!(matches!(
            evaluator.evaluate("required|integer|between:1,10", "5"),
            RuleOutcome::Pass
        ));
        assert!(matches!(
            evaluator.evaluate("required|integer|between:1,10", "11"),
            RuleOutcome::Fail(_)
        ));
    }

    #[test]
    fn string_rules_check_length() {
        let evaluator = BasicRuleEvaluator;
        assert!(matches!(
            evaluator.evaluate("required|string|max:5", "abc"),
            RuleOutcome::Pass
        ));
        assert!(matches!(
            evaluator.evaluate("required|string|max:5", "abcdef"),
            RuleOutcome::Fail(_)
        ));
    }

    #[test]
    fn regex_rule_matches_the_pattern() {
        let evaluator = BasicRuleEvaluator;
        assert!(matches!(
            evaluator.evaluate(r"required|regex:/^[a-z]+$/", "abc"),
            RuleOutcome::Pass
        ));
        assert!(matches!(
            evaluator.evaluate(r"required|regex:/^[a-z]+$/", "abc1"),
            RuleOutcome::Fail(_)
        ));
    }

    #[test]
    fn failure_messages_name_the_subject() {
        let evaluator = BasicRuleEvaluator;
        let message = check_variable(
            &VariableInputKind::Text,
            "MAX_PLAYERS",
            "required|integer",
            "many",
            &evaluator,
        )
        .unwrap();
        assert_eq!(message, "The MAX_PLAYERS field must be an integer");
    }

    #[test]
    fn unknown_rules_pass() {
        let evaluator = BasicRuleEvaluator;
        assert!(matches!(
            evaluator.evaluate("required|alpha_dash|starts_with:a", "value"),
            RuleOutcome::Pass
        ));
    }
}

//! Running checks against a completion.

use std::borrow::Cow;

use promptc_ir::{Check, CheckKind, EvaluationCase, EvaluationSuite, ExpectedToolCall};
use serde::Serialize;
use serde_json::{json, Value};

use crate::completion::Completion;
use crate::context::{CheckContext, Judge};
use crate::error::Error;
use crate::Result;

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    /// The check's display name, or its id.
    pub name: String,
    pub success: bool,
    /// Check-specific details: expected values, the model used, ...
    pub data: Value,
}

/// First non-empty of the check's own model and the default model.
pub fn resolve_model<'a>(check_model: Option<&'a str>, default_model: Option<&'a str>) -> Option<&'a str> {
    [check_model, default_model]
        .into_iter()
        .flatten()
        .find(|model| !model.is_empty())
}

/// Checks that apply to `case`: the suite-wide ones first.
pub fn checks_for_case<'a>(suite: &'a EvaluationSuite, case: &'a EvaluationCase) -> Vec<&'a Check> {
    suite.checks.iter().chain(&case.checks).collect()
}

/// Run every check for `case`. Custom checks with no registered
/// implementation are logged and skipped.
pub fn run_case(
    suite: &EvaluationSuite,
    case: &EvaluationCase,
    completion: &Completion,
    ctx: &CheckContext,
) -> Result<Vec<CheckResult>> {
    let mut results = Vec::new();
    for check in checks_for_case(suite, case) {
        match run_check(check, completion, ctx) {
            Ok(result) => results.push(result),
            Err(Error::UnknownCheck(id)) => {
                tracing::error!(check = %id, "check not found");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(results)
}

/// Run a single check.
pub fn run_check(check: &Check, completion: &Completion, ctx: &CheckContext) -> Result<CheckResult> {
    let name = check.display_name().to_string();
    tracing::debug!(check = %name, id = check.id(), "running check");

    match &check.kind {
        CheckKind::ExactMatch { value, case_insensitive } => {
            let text = completion.as_text();
            let success = if *case_insensitive {
                text.to_lowercase() == value.to_lowercase()
            } else {
                text == *value
            };
            Ok(CheckResult {
                name,
                success,
                data: json!({ "case_insensitive": case_insensitive }),
            })
        }
        CheckKind::ToolCall { tool_calls } => Ok(tool_call_check(name, tool_calls, completion)),
        CheckKind::StructuredOutput { result } => {
            let actual = completion.to_value();
            Ok(CheckResult {
                name,
                success: values_equal(&actual, result),
                data: json!({ "check": result, "result": actual }),
            })
        }
        CheckKind::Profanity { model, forbidden } => {
            let Some(model) = resolve_model(model.as_deref(), ctx.default_model.as_deref()) else {
                return Ok(model_unavailable(name, None));
            };
            match judge(ctx)?.has_profanity(model, forbidden, &completion.as_text()) {
                Ok(found) => Ok(CheckResult {
                    name,
                    success: !found,
                    data: json!({ "forbidden": forbidden, "model": model }),
                }),
                Err(Error::UnknownModel(model)) => Ok(model_unavailable(name, Some(model.as_str()))),
                Err(e) => Err(e),
            }
        }
        CheckKind::Aligned { model, instructions } => {
            let Some(model) = resolve_model(model.as_deref(), ctx.default_model.as_deref()) else {
                return Ok(model_unavailable(name, None));
            };
            match judge(ctx)?.is_aligned(model, instructions, &completion.as_text()) {
                Ok(aligned) => Ok(CheckResult {
                    name,
                    success: aligned,
                    data: json!({ "instructions": instructions, "model": model }),
                }),
                Err(Error::UnknownModel(model)) => Ok(model_unavailable(name, Some(model.as_str()))),
                Err(e) => Err(e),
            }
        }
        CheckKind::Custom { id, .. } => {
            let custom = ctx.custom.get(id).ok_or_else(|| Error::UnknownCheck(id.clone()))?;
            custom.run(check, completion, ctx)
        }
    }
}

fn judge(ctx: &CheckContext) -> Result<&dyn Judge> {
    ctx.judge
        .as_deref()
        .ok_or_else(|| Error::Judge("no judge configured for model-graded checks".to_string()))
}

fn model_unavailable(name: String, model: Option<&str>) -> CheckResult {
    tracing::warn!(check = %name, model = model.unwrap_or("<none>"), "no usable model for check");
    CheckResult {
        name,
        success: false,
        data: json!({ "model": model }),
    }
}

fn tool_call_check(name: String, expected: &[ExpectedToolCall], completion: &Completion) -> CheckResult {
    let expected_json: Vec<Value> = expected
        .iter()
        .map(|call| json!({ "tool_name": call.tool_name, "args": call.args }))
        .collect();

    let Completion::Text { tool_calls, .. } = completion else {
        tracing::error!(check = %name, "tool call checks do not support structured output");
        return CheckResult {
            name,
            success: false,
            data: json!({ "check": expected_json, "tool_calls": [] }),
        };
    };

    let success = expected.len() == tool_calls.len()
        && expected.iter().zip(tool_calls).all(|(want, got)| {
            want.tool_name == got.function.name && values_equal(&want.args, &arguments(&got.function.arguments))
        });

    let actual: Vec<Value> = tool_calls
        .iter()
        .map(|call| json!({ "id": call.id, "name": call.function.name, "arguments": call.function.arguments }))
        .collect();
    CheckResult {
        name,
        success,
        data: json!({ "check": expected_json, "tool_calls": actual }),
    }
}

/// Tool call arguments may arrive as a JSON string.
fn arguments(raw: &Value) -> Cow<'_, Value> {
    match raw {
        Value::String(text) => serde_json::from_str(text).map(Cow::Owned).unwrap_or(Cow::Borrowed(raw)),
        other => Cow::Borrowed(other),
    }
}

/// Deep equality where `1` and `1.0` are the same number.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

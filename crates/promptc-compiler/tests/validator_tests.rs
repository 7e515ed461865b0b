/// Running generated validators against values
///
/// Each schema is compiled to a CommonJS fragment and evaluated by `node`.
/// Values satisfying the schema must parse; each counter-example must not.
/// The tests are skipped when `node` cannot resolve `zod` from this package.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use promptc_compiler::{generate, VariantProfile};
use promptc_ir::JsonSchema;
use serde_json::{json, Value};

/// Directory `node` resolves `zod` from, or `None` when it is unavailable.
fn zod_runtime() -> Option<PathBuf> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let status = Command::new("node")
        .args(["-e", "require.resolve(\"zod\")"])
        .current_dir(&dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(status) if status.success() => Some(dir),
        _ => {
            eprintln!("skipping: node with zod is not available");
            None
        }
    }
}

/// `safeParse(..).success` for every value, in order.
fn verdicts(dir: &Path, schema: &Value, values: &[Value]) -> Vec<bool> {
    let fragment = generate(&JsonSchema::new(schema.clone()), "subjectSchema", &VariantProfile::node_cjs())
        .expect("schema should compile");
    let script = format!(
        "const {{ z }} = require(\"zod\");\n{}\nconst values = {};\nconsole.log(JSON.stringify(values.map((value) => {}.safeParse(value).success)));\n",
        fragment.source,
        Value::Array(values.to_vec()),
        fragment.binding,
    );

    let mut child = Command::new("node")
        .arg("-")
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start node");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(
        output.status.success(),
        "node failed:\n{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        script
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn assert_validates(dir: &Path, schema: Value, accepted: &[Value], rejected: &[Value]) {
    let values: Vec<Value> = accepted.iter().chain(rejected).cloned().collect();
    let results = verdicts(dir, &schema, &values);
    assert_eq!(results.len(), values.len());

    let (acc, rej) = results.split_at(accepted.len());
    for (value, ok) in accepted.iter().zip(acc) {
        assert!(*ok, "{} should accept {}", schema, value);
    }
    for (value, ok) in rejected.iter().zip(rej) {
        assert!(!*ok, "{} should reject {}", schema, value);
    }
}

#[test]
fn test_object_keywords() {
    let Some(dir) = zod_runtime() else { return };
    assert_validates(
        &dir,
        json!({
            "type": "object",
            "properties": {
                "city": { "type": "string", "minLength": 1 },
                "days": { "type": "integer", "minimum": 1, "maximum": 7 },
                "unit": { "enum": ["celsius", "fahrenheit"] }
            },
            "required": ["city"],
            "additionalProperties": false
        }),
        &[
            json!({ "city": "Oslo" }),
            json!({ "city": "Oslo", "days": 7, "unit": "celsius" }),
        ],
        &[
            json!({}),
            json!({ "city": 5 }),
            json!({ "city": "" }),
            json!({ "city": "Oslo", "unit": "kelvin" }),
            json!({ "city": "Oslo", "days": 1.5 }),
            json!({ "city": "Oslo", "days": 8 }),
            json!({ "city": "Oslo", "wind": true }),
            json!("Oslo"),
        ],
    );
}

#[test]
fn test_catchall_properties() {
    let Some(dir) = zod_runtime() else { return };
    assert_validates(
        &dir,
        json!({ "type": "object", "additionalProperties": { "type": "number" } }),
        &[json!({}), json!({ "a": 1, "b": 2.5 })],
        &[json!({ "a": "1" }), json!([])],
    );
}

#[test]
fn test_array_keywords() {
    let Some(dir) = zod_runtime() else { return };
    assert_validates(
        &dir,
        json!({ "type": "array", "items": { "type": "string" }, "minItems": 1, "maxItems": 2 }),
        &[json!(["a"]), json!(["a", "b"])],
        &[json!([]), json!(["a", "b", "c"]), json!([1]), json!("a")],
    );
    assert_validates(
        &dir,
        json!({ "type": "array", "items": [{ "type": "string" }, { "type": "number" }] }),
        &[json!(["a", 1])],
        &[json!(["a"]), json!([1, "a"]), json!(["a", 1, 2])],
    );
    assert_validates(
        &dir,
        json!({ "type": "array", "items": [{ "type": "string" }], "minItems": 2 }),
        &[],
        &[json!(["a"])],
    );
}

#[test]
fn test_scalar_keywords() {
    let Some(dir) = zod_runtime() else { return };
    assert_validates(
        &dir,
        json!({ "type": "string", "pattern": "^[a-z]+$", "maxLength": 4 }),
        &[json!("abc")],
        &[json!("ABC"), json!("abcde"), json!(1)],
    );
    assert_validates(
        &dir,
        json!({ "type": "number", "exclusiveMinimum": 0, "multipleOf": 0.5 }),
        &[json!(0.5), json!(10)],
        &[json!(0), json!(0.3), json!("1")],
    );
    assert_validates(&dir, json!({ "type": "boolean" }), &[json!(false)], &[json!("true"), json!(null)]);
    assert_validates(&dir, json!({ "type": ["number", "null"] }), &[json!(1), json!(null)], &[json!("1")]);
    assert_validates(
        &dir,
        json!({ "type": "string", "nullable": true }),
        &[json!("x"), json!(null)],
        &[json!(1)],
    );
}

#[test]
fn test_literal_and_combinator_keywords() {
    let Some(dir) = zod_runtime() else { return };
    assert_validates(&dir, json!({ "const": "fixed" }), &[json!("fixed")], &[json!("other")]);
    assert_validates(&dir, json!({ "enum": [1, "one", null] }), &[json!(1), json!("one"), json!(null)], &[json!(2)]);
    assert_validates(
        &dir,
        json!({ "anyOf": [{ "type": "string" }, { "type": "boolean" }] }),
        &[json!("x"), json!(true)],
        &[json!(1)],
    );
    assert_validates(
        &dir,
        json!({
            "allOf": [
                { "type": "object", "properties": { "a": { "type": "string" } }, "required": ["a"] },
                { "type": "object", "properties": { "b": { "type": "number" } }, "required": ["b"] }
            ]
        }),
        &[json!({ "a": "x", "b": 1 })],
        &[json!({ "a": "x" }), json!({ "b": 1 }), json!({ "a": 1, "b": 1 })],
    );
}

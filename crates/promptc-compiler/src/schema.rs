/// Schema code generation
///
/// Transpiles a JSON Schema node into a zod validator expression bound to a
/// name. Nested nodes are always inlined. Nodes that lack the information
/// needed to pick a validator degrade to `z.any()` with a comment; only
/// input that cannot be represented at all is an error.

use promptc_ir::JsonSchema;
use serde_json::{Map, Value};
use std::fmt::{self, Write as _};

use crate::error::{CompileError, Result};
use crate::identifiers::upper_first;
use crate::variant::{ModuleStyle, VariantProfile};

/// Generated source for one schema binding.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFragment {
    /// Name the validator is bound to, e.g. `toolASchema`.
    pub binding: String,
    /// Companion type alias, e.g. `ToolASchema`, when types are emitted.
    pub type_name: Option<String>,
    /// Source text defining the binding (and the alias).
    pub source: String,
}

/// Generate the fragment defining `binding` as a validator for `node`.
pub fn generate(node: &JsonSchema, binding: &str, profile: &VariantProfile) -> Result<SchemaFragment> {
    let mut generator = SchemaGenerator::new();
    generator.write_node(node.as_value(), &SchemaPath::root())?;
    if generator.fallbacks > 0 {
        tracing::warn!(binding, count = generator.fallbacks, "schema nodes fell back to z.any()");
    }
    let expr = generator.finish();

    let type_name = profile.include_types.then(|| upper_first(binding));

    let mut source = String::new();
    match profile.module_style {
        ModuleStyle::Esm => {
            writeln!(source, "export const {} = {};", binding, expr)?;
        }
        ModuleStyle::CommonJs => {
            writeln!(source, "const {} = {};", binding, expr)?;
            writeln!(source, "module.exports.{} = {};", binding, binding)?;
        }
    }
    if let Some(type_name) = &type_name {
        let export = if profile.module_style == ModuleStyle::Esm { "export " } else { "" };
        writeln!(source, "{}type {} = z.infer<typeof {}>;", export, type_name, binding)?;
    }

    Ok(SchemaFragment {
        binding: binding.to_string(),
        type_name,
        source,
    })
}

/// Location of a node inside the schema tree, rendered as `#/properties/a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPath(Vec<String>);

impl SchemaPath {
    pub fn root() -> Self {
        SchemaPath(Vec::new())
    }

    pub fn child(&self, segment: impl fmt::Display) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        SchemaPath(segments)
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("#")?;
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// zod expression writer for a single schema tree
struct SchemaGenerator {
    /// Output buffer
    output: String,
    /// Number of nodes that degraded to `z.any()`
    fallbacks: usize,
}

impl SchemaGenerator {
    fn new() -> Self {
        Self {
            output: String::new(),
            fallbacks: 0,
        }
    }

    fn finish(self) -> String {
        self.output
    }

    fn write_node(&mut self, node: &Value, path: &SchemaPath) -> Result<()> {
        let map = match node {
            Value::Object(map) => map,
            Value::Bool(true) => {
                self.output.push_str("z.any()");
                return Ok(());
            }
            Value::Bool(false) => {
                self.output.push_str("z.never()");
                return Ok(());
            }
            other => {
                return Err(CompileError::schema(
                    path.to_string(),
                    format!("expected a schema object, found {}", kind_of(other)),
                ));
            }
        };

        if let Some(value) = map.get("const") {
            self.write_literal(value, &path.child("const"))?;
        } else if let Some(values) = map.get("enum") {
            self.write_enum(values, &path.child("enum"))?;
        } else if let Some(members) = map.get("anyOf").or_else(|| map.get("oneOf")) {
            let keyword = if map.contains_key("anyOf") { "anyOf" } else { "oneOf" };
            self.write_union(members, &path.child(keyword))?;
        } else if let Some(members) = map.get("allOf") {
            self.write_intersection(members, &path.child("allOf"))?;
        } else {
            match map.get("type") {
                None => self.write_fallback("no \"type\" given"),
                Some(Value::String(kind)) => self.write_typed(kind, map, path)?,
                Some(Value::Array(kinds)) => self.write_type_union(kinds, map, path)?,
                Some(other) => {
                    return Err(CompileError::schema(
                        path.child("type").to_string(),
                        format!("\"type\" must be a string or a list of strings, found {}", kind_of(other)),
                    ));
                }
            }
        }

        if map.get("nullable") == Some(&Value::Bool(true)) {
            self.output.push_str(".nullable()");
        }
        if let Some(Value::String(description)) = map.get("description") {
            write!(self.output, ".describe({})", quote(description))?;
        }
        Ok(())
    }

    fn write_typed(&mut self, kind: &str, map: &Map<String, Value>, path: &SchemaPath) -> Result<()> {
        match kind {
            "string" => self.write_string(map, path),
            "number" => {
                self.output.push_str("z.number()");
                self.write_numeric_bounds(map, path)
            }
            "integer" => {
                self.output.push_str("z.number().int()");
                self.write_numeric_bounds(map, path)
            }
            "boolean" => {
                self.output.push_str("z.boolean()");
                Ok(())
            }
            "null" => {
                self.output.push_str("z.null()");
                Ok(())
            }
            "array" => self.write_array(map, path),
            "object" => self.write_object(map, path),
            unknown => {
                self.write_fallback(&format!("unknown type \"{}\"", unknown));
                Ok(())
            }
        }
    }

    /// `"type": ["string", "null"]` becomes a union of each kind.
    fn write_type_union(&mut self, kinds: &[Value], map: &Map<String, Value>, path: &SchemaPath) -> Result<()> {
        let mut names = Vec::with_capacity(kinds.len());
        for (i, kind) in kinds.iter().enumerate() {
            match kind {
                Value::String(name) => names.push(name.as_str()),
                other => {
                    return Err(CompileError::schema(
                        path.child("type").child(i).to_string(),
                        format!("type names must be strings, found {}", kind_of(other)),
                    ));
                }
            }
        }

        match names.as_slice() {
            [] => self.write_fallback("empty \"type\" list"),
            [single] => self.write_typed(single, map, path)?,
            _ => {
                self.output.push_str("z.union([");
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.write_typed(name, map, path)?;
                }
                self.output.push_str("])");
            }
        }
        Ok(())
    }

    fn write_string(&mut self, map: &Map<String, Value>, path: &SchemaPath) -> Result<()> {
        self.output.push_str("z.string()");
        if let Some(n) = number_keyword(map, "minLength", path)? {
            write!(self.output, ".min({})", n)?;
        }
        if let Some(n) = number_keyword(map, "maxLength", path)? {
            write!(self.output, ".max({})", n)?;
        }
        if let Some(pattern) = map.get("pattern") {
            let pattern = pattern.as_str().ok_or_else(|| {
                CompileError::schema(path.child("pattern").to_string(), "\"pattern\" must be a string")
            })?;
            write!(self.output, ".regex(new RegExp({}))", quote(pattern))?;
        }
        match map.get("format").and_then(Value::as_str) {
            Some("email") => self.output.push_str(".email()"),
            Some("uri") | Some("url") => self.output.push_str(".url()"),
            Some("uuid") => self.output.push_str(".uuid()"),
            Some("date-time") => self.output.push_str(".datetime()"),
            _ => {}
        }
        Ok(())
    }

    fn write_numeric_bounds(&mut self, map: &Map<String, Value>, path: &SchemaPath) -> Result<()> {
        // Draft 4 spells exclusive bounds as booleans next to minimum/maximum.
        let exclusive_min = map.get("exclusiveMinimum") == Some(&Value::Bool(true));
        let exclusive_max = map.get("exclusiveMaximum") == Some(&Value::Bool(true));

        let bounds = [
            ("minimum", if exclusive_min { "gt" } else { "gte" }),
            ("exclusiveMinimum", "gt"),
            ("maximum", if exclusive_max { "lt" } else { "lte" }),
            ("exclusiveMaximum", "lt"),
            ("multipleOf", "multipleOf"),
        ];
        for (keyword, method) in bounds {
            if matches!(map.get(keyword), Some(Value::Bool(_))) {
                continue;
            }
            if let Some(n) = number_keyword(map, keyword, path)? {
                write!(self.output, ".{}({})", method, n)?;
            }
        }
        Ok(())
    }

    fn write_array(&mut self, map: &Map<String, Value>, path: &SchemaPath) -> Result<()> {
        match map.get("items") {
            None => self.output.push_str("z.array(z.any())"),
            Some(Value::Array(items)) => {
                self.output.push_str("z.tuple([");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.write_node(item, &path.child("items").child(i))?;
                }
                self.output.push_str("])");
                // Tuples have no .min/.max; check the length directly.
                if let Some(n) = number_keyword(map, "minItems", path)? {
                    write!(self.output, ".refine((items) => items.length >= {})", n)?;
                }
                if let Some(n) = number_keyword(map, "maxItems", path)? {
                    write!(self.output, ".refine((items) => items.length <= {})", n)?;
                }
                return Ok(());
            }
            Some(item @ (Value::Object(_) | Value::Bool(_))) => {
                self.output.push_str("z.array(");
                self.write_node(item, &path.child("items"))?;
                self.output.push(')');
            }
            Some(other) => {
                return Err(CompileError::schema(
                    path.child("items").to_string(),
                    format!("\"items\" must be a schema or a list of schemas, found {}", kind_of(other)),
                ));
            }
        }
        if let Some(n) = number_keyword(map, "minItems", path)? {
            write!(self.output, ".min({})", n)?;
        }
        if let Some(n) = number_keyword(map, "maxItems", path)? {
            write!(self.output, ".max({})", n)?;
        }
        Ok(())
    }

    fn write_object(&mut self, map: &Map<String, Value>, path: &SchemaPath) -> Result<()> {
        let empty = Map::new();
        let properties = match map.get("properties") {
            None => &empty,
            Some(Value::Object(properties)) => properties,
            Some(other) => {
                return Err(CompileError::schema(
                    path.child("properties").to_string(),
                    format!("\"properties\" must be a map, found {}", kind_of(other)),
                ));
            }
        };
        let required = required_names(map, path)?;

        if properties.is_empty() {
            self.output.push_str("z.object({})");
        } else {
            self.output.push_str("z.object({\n");
            for (i, (name, property)) in properties.iter().enumerate() {
                if i > 0 {
                    self.output.push_str(",\n");
                }
                write!(self.output, "{}: ", quote(name))?;
                self.write_node(property, &path.child("properties").child(name))?;
                if !required.contains(&name.as_str()) {
                    self.output.push_str(".optional()");
                }
            }
            self.output.push_str("\n})");
        }

        match map.get("additionalProperties") {
            Some(Value::Bool(false)) => self.output.push_str(".strict()"),
            Some(extra @ Value::Object(_)) => {
                self.output.push_str(".catchall(");
                self.write_node(extra, &path.child("additionalProperties"))?;
                self.output.push(')');
            }
            _ => {}
        }
        Ok(())
    }

    fn write_enum(&mut self, values: &Value, path: &SchemaPath) -> Result<()> {
        let Value::Array(values) = values else {
            return Err(CompileError::schema(
                path.to_string(),
                format!("\"enum\" must be a list, found {}", kind_of(values)),
            ));
        };
        for (i, value) in values.iter().enumerate() {
            check_literal(value, &path.child(i))?;
        }

        match values.as_slice() {
            [] => self.output.push_str("z.never()"),
            [single] => self.write_literal(single, path)?,
            _ if values.iter().all(Value::is_string) => {
                self.output.push_str("z.enum([");
                self.write_literal_list(values)?;
                self.output.push_str("])");
            }
            _ => {
                self.output.push_str("z.union([");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.write_literal(value, &path.child(i))?;
                }
                self.output.push_str("])");
            }
        }
        Ok(())
    }

    fn write_literal_list(&mut self, values: &[Value]) -> Result<()> {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            self.output.push_str(&serde_json::to_string(value)?);
        }
        Ok(())
    }

    fn write_literal(&mut self, value: &Value, path: &SchemaPath) -> Result<()> {
        check_literal(value, path)?;
        write!(self.output, "z.literal({})", serde_json::to_string(value)?)?;
        Ok(())
    }

    fn write_union(&mut self, members: &Value, path: &SchemaPath) -> Result<()> {
        let members = schema_list(members, path)?;
        match members {
            [] => self.write_fallback("empty union"),
            [single] => self.write_node(single, &path.child(0))?,
            _ => {
                self.output.push_str("z.union([");
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.write_node(member, &path.child(i))?;
                }
                self.output.push_str("])");
            }
        }
        Ok(())
    }

    /// `allOf: [a, b, c]` becomes `z.intersection(z.intersection(a, b), c)`.
    fn write_intersection(&mut self, members: &Value, path: &SchemaPath) -> Result<()> {
        let members = schema_list(members, path)?;
        match members {
            [] => self.write_fallback("empty intersection"),
            [first, rest @ ..] => {
                for _ in rest {
                    self.output.push_str("z.intersection(");
                }
                self.write_node(first, &path.child(0))?;
                for (i, member) in rest.iter().enumerate() {
                    self.output.push_str(", ");
                    self.write_node(member, &path.child(i + 1))?;
                    self.output.push(')');
                }
            }
        }
        Ok(())
    }

    fn write_fallback(&mut self, reason: &str) {
        self.fallbacks += 1;
        self.output.push_str("/* ");
        self.output.push_str(&reason.replace("*/", "* /"));
        self.output.push_str(": accepting any value */ z.any()");
    }
}

/// The `required` keyword as a list of names.
fn required_names<'a>(map: &'a Map<String, Value>, path: &SchemaPath) -> Result<Vec<&'a str>> {
    match map.get("required") {
        None => Ok(Vec::new()),
        Some(Value::Array(names)) => names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                name.as_str().ok_or_else(|| {
                    CompileError::schema(
                        path.child("required").child(i).to_string(),
                        format!("required property names must be strings, found {}", kind_of(name)),
                    )
                })
            })
            .collect(),
        Some(other) => Err(CompileError::schema(
            path.child("required").to_string(),
            format!("\"required\" must be a list, found {}", kind_of(other)),
        )),
    }
}

fn schema_list<'a>(members: &'a Value, path: &SchemaPath) -> Result<&'a [Value]> {
    let Value::Array(members) = members else {
        return Err(CompileError::schema(
            path.to_string(),
            format!("expected a list of schemas, found {}", kind_of(members)),
        ));
    };
    Ok(members)
}

fn number_keyword(map: &Map<String, Value>, keyword: &str, path: &SchemaPath) -> Result<Option<String>> {
    match map.get(keyword) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(CompileError::schema(
            path.child(keyword).to_string(),
            format!("\"{}\" must be a number, found {}", keyword, kind_of(other)),
        )),
    }
}

/// Literals must be scalars; zod cannot express object or array literals.
fn check_literal(value: &Value, path: &SchemaPath) -> Result<()> {
    match value {
        Value::Object(_) | Value::Array(_) => Err(CompileError::schema(
            path.to_string(),
            format!("{} cannot be used as a literal value", kind_of(value)),
        )),
        _ => Ok(()),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Quote a string as a double-quoted JavaScript literal.
pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// File assembler
///
/// Composes the output file set for one [`VariantProfile`]: the shared types
/// files (typed profiles only), one module per prompt, and the index that
/// re-exports every prompt binding in input order.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use promptc_ir::{Message, Prompt};
use regex::{NoExpand, Regex};

use crate::driver::OutputFile;
use crate::error::{CompileError, Result};
use crate::identifiers::{synthesize, Identifiers};
use crate::schema::{self, quote, SchemaFragment};
use crate::variant::{ModuleStyle, VariantProfile};

/// Directory under the package root holding the shared types files.
pub const TEMPLATE_DIR: &str = "templates/typescript";

/// Name of the prompt type exported by the types template.
pub const PROMPT_TYPE: &str = "PromptDefinition";

const TYPES_STEM: &str = "types";

static ZOD_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"from\s*['"]zod['"]"#).expect("static regex"));

/// One generated prompt module and the binding it exports.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptModule {
    pub file: OutputFile,
    /// Exported prompt binding, e.g. `simplePromptPromptV1`
    pub binding: String,
    /// File name without extension, e.g. `simple_prompt_v1`
    pub stem: String,
}

/// Assemble every file for `prompts` under `profile`, unformatted.
pub fn assemble(prompts: &[Prompt], profile: &VariantProfile, package_root: &Path) -> Result<Vec<OutputFile>> {
    let mut files = types_files(profile, package_root)?;
    let modules = prompts
        .iter()
        .map(|prompt| prompt_module(prompt, profile))
        .collect::<Result<Vec<_>>>()?;
    files.extend(finish(modules, profile)?);
    Ok(files)
}

/// Append the index to the prompt modules and reject duplicate paths.
pub(crate) fn finish(modules: Vec<PromptModule>, profile: &VariantProfile) -> Result<Vec<OutputFile>> {
    let index = index_file(&modules, profile);
    let mut seen = HashSet::new();
    let mut files = Vec::with_capacity(modules.len() + 1);
    for module in modules {
        if !seen.insert(module.file.path.clone()) {
            return Err(CompileError::unexpected(format!(
                "two prompts produce the output file '{}'",
                module.file.path
            )));
        }
        files.push(module.file);
    }
    if seen.contains(&index.path) {
        return Err(CompileError::unexpected(format!(
            "a prompt module collides with the index file '{}'",
            index.path
        )));
    }
    files.push(index);
    Ok(files)
}

/// Copy the shared types files, pointing their zod import at the profile's
/// validator path. Empty for untyped profiles.
pub fn types_files(profile: &VariantProfile, package_root: &Path) -> Result<Vec<OutputFile>> {
    if !profile.include_types {
        return Ok(Vec::new());
    }

    let template_dir = package_root.join(TEMPLATE_DIR);
    let mut paths = Vec::new();
    collect_files(&template_dir, &mut paths)?;
    paths.sort();

    let replacement = format!("from {}", quote(&profile.validator_import_path));
    paths
        .into_iter()
        .map(|path| {
            let contents = fs::read_to_string(&path).map_err(|e| CompileError::template_read(&path, e))?;
            let relative = path
                .strip_prefix(&template_dir)
                .map_err(|e| CompileError::unexpected(e.to_string()))?;
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            tracing::debug!(path = %relative, "copying types template");
            Ok(OutputFile::new(
                &profile.language_id,
                relative,
                ZOD_IMPORT.replace_all(&contents, NoExpand(&replacement)).into_owned(),
            ))
        })
        .collect()
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| CompileError::template_read(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| CompileError::template_read(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| CompileError::template_read(&path, e))?;
        if file_type.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// Identifiers used for binding names: `-` and `_` count as word breaks.
fn binding_identifiers(name: &str) -> Identifiers {
    synthesize(&name.replace(['-', '_'], " "))
}

/// Generate the module for a single prompt.
pub fn prompt_module(prompt: &Prompt, profile: &VariantProfile) -> Result<PromptModule> {
    let ids = binding_identifiers(&prompt.name);
    let binding = format!("{}PromptV{}", ids.camel, prompt.version);
    let stem = format!("{}_v{}", synthesize(&prompt.name).file_slug, prompt.version);

    let mut tool_entries = Vec::with_capacity(prompt.tools.len());
    let mut fragments: Vec<SchemaFragment> = Vec::new();
    for tool in &prompt.tools {
        let tool_ids = binding_identifiers(&tool.name);
        let fragment = schema::generate(&tool.parameters, &format!("{}Schema", tool_ids.camel), profile)?;
        tool_entries.push((tool_ids.snake, tool.description.as_str(), fragment.binding.clone()));
        fragments.push(fragment);
    }
    let output_schema = match &prompt.schema {
        Some(node) => {
            let fragment = schema::generate(node, &format!("{}SchemaV{}", ids.camel, prompt.version), profile)?;
            let binding = fragment.binding.clone();
            fragments.push(fragment);
            Some(binding)
        }
        None => None,
    };

    let mut out = String::new();

    // Preamble
    if !fragments.is_empty() {
        match profile.module_style {
            ModuleStyle::Esm => writeln!(out, "import {{ z }} from {};", quote(&profile.validator_import_path))?,
            ModuleStyle::CommonJs => writeln!(out, "const {{ z }} = require({});", quote(&profile.validator_import_path))?,
        }
    }
    if profile.include_types {
        writeln!(
            out,
            "import type {{ {} }} from {};",
            PROMPT_TYPE,
            quote(&profile.import_path(TYPES_STEM))
        )?;
    }

    for fragment in &fragments {
        out.push('\n');
        out.push_str(&fragment.source);
    }

    // Prompt literal
    out.push('\n');
    let annotation = if profile.include_types {
        format!(": {}", PROMPT_TYPE)
    } else {
        String::new()
    };
    match profile.module_style {
        ModuleStyle::Esm => writeln!(out, "export const {}{} = {{", binding, annotation)?,
        ModuleStyle::CommonJs => writeln!(out, "const {}{} = {{", binding, annotation)?,
    }
    writeln!(out, "name: {},", quote(&prompt.name))?;
    writeln!(out, "version: {},", prompt.version)?;
    match &prompt.model {
        Some(model) => writeln!(out, "model: {},", quote(model))?,
        None => writeln!(out, "model: undefined,")?,
    }
    writeln!(out, "temperature: {},", prompt.temperature)?;
    writeln!(out, "systemPrompt: {},", quote(&prompt.system_prompt))?;
    if !prompt.few_shot_messages.is_empty() {
        writeln!(out, "fewShotMessages: {},", messages_literal(&prompt.few_shot_messages)?)?;
    }
    if !prompt.final_messages.is_empty() {
        writeln!(out, "finalMessages: {},", messages_literal(&prompt.final_messages)?)?;
    }
    if !tool_entries.is_empty() {
        writeln!(out, "tools: [")?;
        for (name, description, parameters) in &tool_entries {
            writeln!(out, "{{")?;
            writeln!(out, "name: {},", quote(name))?;
            writeln!(out, "description: {},", quote(description))?;
            writeln!(out, "parameters: {},", parameters)?;
            writeln!(out, "}},")?;
        }
        writeln!(out, "],")?;
    }
    if let Some(schema_binding) = &output_schema {
        writeln!(out, "schema: {},", schema_binding)?;
    }
    writeln!(out, "}};")?;
    if profile.module_style == ModuleStyle::CommonJs {
        writeln!(out, "module.exports.{binding} = {binding};")?;
    }

    tracing::debug!(
        prompt = %prompt.name,
        binding = %binding,
        fragments = fragments.len(),
        "assembled prompt module"
    );

    Ok(PromptModule {
        file: OutputFile::new(&profile.language_id, format!("{}.{}", stem, profile.file_extension), out),
        binding,
        stem,
    })
}

/// Messages are plain data; their JSON form is a valid script literal.
fn messages_literal(messages: &[Message]) -> Result<String> {
    Ok(serde_json::to_string_pretty(messages)?)
}

/// The index re-exporting (ESM) or re-assigning (CommonJS) every binding.
pub fn index_file(modules: &[PromptModule], profile: &VariantProfile) -> OutputFile {
    let mut out = String::new();
    if profile.include_types {
        out.push_str(&format!(
            "export type {{ {} }} from {};\n",
            PROMPT_TYPE,
            quote(&profile.import_path(TYPES_STEM))
        ));
    }
    for module in modules {
        let from = quote(&profile.import_path(&module.stem));
        let line = match profile.module_style {
            ModuleStyle::Esm => format!("export {{ {} }} from {};\n", module.binding, from),
            ModuleStyle::CommonJs => format!(
                "module.exports.{binding} = require({from}).{binding};\n",
                binding = module.binding,
                from = from
            ),
        };
        out.push_str(&line);
    }
    OutputFile::new(&profile.language_id, format!("index.{}", profile.file_extension), out)
}

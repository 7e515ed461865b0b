/// Compiler driver that orchestrates the compilation pipeline

use std::path::Path;
use std::sync::Arc;

use promptc_ir::Prompt;
use rayon::prelude::*;

use crate::assembler;
use crate::error::Result;
use crate::format::{FormatterGate, SourceFormatter};
use crate::variant::VariantProfile;

/// One generated file, relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Language tag of the profile that produced the file
    pub language_id: String,
    /// Relative path using `/` separators
    pub path: String,
    pub contents: String,
}

impl OutputFile {
    pub fn new(language_id: impl Into<String>, path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            language_id: language_id.into(),
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Options for compilation
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Fan per-prompt generation and per-file formatting out over rayon
    pub parallel: bool,
    /// Formatter selection by file extension
    pub formatters: FormatterGate,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            formatters: FormatterGate::default(),
        }
    }
}

/// The prompt compiler
///
/// Holds no state between calls: every [`Compiler::compile`] reads its
/// inputs and returns a fresh file set, or the first error.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a compiler with default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Install `formatter` for files with the given extension
    pub fn with_formatter(mut self, extension: impl Into<String>, formatter: Arc<dyn SourceFormatter>) -> Self {
        self.options.formatters = self.options.formatters.with_formatter(extension, formatter);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.options.parallel = parallel;
        self
    }

    /// Compile `prompts` for one output dialect.
    ///
    /// Returns every file (types, one module per prompt, index) formatted,
    /// in a stable order, or the first error. Nothing is written to disk.
    pub fn compile(&self, prompts: &[Prompt], profile: &VariantProfile, package_root: &Path) -> Result<Vec<OutputFile>> {
        tracing::debug!(
            language = %profile.language_id,
            prompts = prompts.len(),
            parallel = self.options.parallel,
            "compiling"
        );

        let files = if self.options.parallel {
            let mut files = assembler::types_files(profile, package_root)?;
            let modules = prompts
                .par_iter()
                .map(|prompt| assembler::prompt_module(prompt, profile))
                .collect::<Result<Vec<_>>>()?;
            files.extend(assembler::finish(modules, profile)?);
            files
        } else {
            assembler::assemble(prompts, profile, package_root)?
        };

        let gate = &self.options.formatters;
        let formatted = if self.options.parallel {
            files
                .into_par_iter()
                .map(|file| gate.format_file(file))
                .collect::<Result<Vec<_>>>()?
        } else {
            files
                .into_iter()
                .map(|file| gate.format_file(file))
                .collect::<Result<Vec<_>>>()?
        };

        tracing::info!(
            language = %profile.language_id,
            files = formatted.len(),
            "compilation successful"
        );
        Ok(formatted)
    }
}

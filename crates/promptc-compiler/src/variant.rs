/// How generated modules import and export bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStyle {
    /// `import` / `export` statements.
    Esm,
    /// `require(...)` / `module.exports`.
    CommonJs,
}

/// Configuration for one output dialect.
///
/// Everything the assembler and the schema generator do differently per
/// dialect is read from the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantProfile {
    /// Language tag attached to every generated file.
    pub language_id: String,
    /// Extension of generated files, without the dot.
    pub file_extension: String,
    pub module_style: ModuleStyle,
    /// Emit type aliases and type annotations (and the shared types file).
    pub include_types: bool,
    /// Import specifier of the zod validator library.
    pub validator_import_path: String,
    /// Whether intra-package imports spell out the file extension.
    pub include_extension_in_imports: bool,
}

impl VariantProfile {
    pub fn new(language_id: impl Into<String>, file_extension: impl Into<String>) -> Self {
        Self {
            language_id: language_id.into(),
            file_extension: file_extension.into(),
            module_style: ModuleStyle::Esm,
            include_types: false,
            validator_import_path: "zod".to_string(),
            include_extension_in_imports: false,
        }
    }

    pub fn module_style(mut self, style: ModuleStyle) -> Self {
        self.module_style = style;
        self
    }

    pub fn include_types(mut self, include: bool) -> Self {
        self.include_types = include;
        self
    }

    pub fn validator_import_path(mut self, path: impl Into<String>) -> Self {
        self.validator_import_path = path.into();
        self
    }

    pub fn include_extension_in_imports(mut self, include: bool) -> Self {
        self.include_extension_in_imports = include;
        self
    }

    /// The suffix appended to intra-package import paths (`""` or `".ts"`).
    pub fn import_suffix(&self) -> String {
        if self.include_extension_in_imports {
            format!(".{}", self.file_extension)
        } else {
            String::new()
        }
    }

    /// Path of an intra-package module as written in an import.
    pub fn import_path(&self, stem: &str) -> String {
        format!("./{}{}", stem, self.import_suffix())
    }

    /// `typescript`: typed ESM importing zod from npm.
    pub fn typescript() -> Self {
        VariantProfile::new("typescript", "ts").include_types(true)
    }

    /// `deno`: typed ESM importing zod from deno.land, with explicit extensions.
    pub fn deno() -> Self {
        VariantProfile::new("typescript", "ts")
            .include_types(true)
            .validator_import_path("https://deno.land/x/zod@v3.24.1/mod.ts")
            .include_extension_in_imports(true)
    }

    /// `node` / `node-cjs`: untyped CommonJS.
    pub fn node_cjs() -> Self {
        VariantProfile::new("node", "js").module_style(ModuleStyle::CommonJs)
    }

    /// `node-esm`: untyped ESM.
    pub fn node_esm() -> Self {
        VariantProfile::new("node", "js")
    }
}

/// A named set of output dialects.
///
/// Registries are values: extending one with [`VariantRegistry::with_variant`]
/// yields a new registry and leaves the original untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantRegistry {
    entries: Vec<(String, VariantProfile)>,
}

impl VariantRegistry {
    /// A registry with no dialects.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The dialects shipped with promptc.
    pub fn builtin() -> Self {
        Self::empty()
            .with_variant("typescript", VariantProfile::typescript())
            .with_variant("deno", VariantProfile::deno())
            .with_variant("node", VariantProfile::node_cjs())
            .with_variant("node-esm", VariantProfile::node_esm())
            .with_variant("node-cjs", VariantProfile::node_cjs())
    }

    /// Return a registry that also contains `profile` under `name`.
    ///
    /// An existing entry with the same name is replaced in place.
    pub fn with_variant(&self, name: impl Into<String>, profile: VariantProfile) -> Self {
        let name = name.into();
        let mut entries = self.entries.clone();
        match entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = profile,
            None => entries.push((name, profile)),
        }
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&VariantProfile> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, profile)| profile)
    }

    /// Dialect names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! WGSL composition.
//!
//! The composer resolves `#include "path"` directives against a
//! [`ShaderLibrary`] and prepends one `const` declaration per [`ShaderDef`],
//! so feature switches become constant branches the compiler folds away.
//!
//! ```ignore
//! let composer = ShaderComposer::with_standard_library();
//! let source = composer.compose(
//!     LIT_SOURCE,
//!     &[("HAS_NORMAL_MAP", ShaderDef::Bool(true)), ("DEBUG_VIEW", 0u32.into())],
//! )?;
//! composer.validate("lit", &source)?;
//! ```

pub mod library;

use std::collections::{HashMap, HashSet};

use crate::error::{ShadingError, ShadingResult};

pub use library::{
    ShaderLibrary, COMPOSITE_SOURCE, LIT_SOURCE, PREPASS_CUTOUT_SOURCE, PREPASS_SOURCE,
    SHADOW_BLUR_SOURCE, SHADOW_CAST_CUTOUT_SOURCE, SHADOW_CAST_SOURCE, TONEMAP_SOURCE,
};

/// Resolves includes and shader definitions into a single WGSL module.
pub struct ShaderComposer {
    /// Registered include sources: path -> source text.
    includes: HashMap<String, String>,
}

impl Default for ShaderComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderComposer {
    pub fn new() -> Self {
        Self {
            includes: HashMap::new(),
        }
    }

    pub fn with_standard_library() -> Self {
        let mut composer = Self::new();
        composer.add_library(&ShaderLibrary::standard());
        composer
    }

    /// Make every module of `library` available for `#include`.
    pub fn add_library(&mut self, library: &ShaderLibrary) {
        for (path, source) in library.modules() {
            self.register_include(path, source);
        }
    }

    pub fn register_include(&mut self, path: &str, source: &str) {
        self.includes.insert(path.to_string(), source.to_string());
    }

    /// Generated declarations for the given definitions.
    ///
    /// Unlike preprocessor defines, `Bool(false)` is still emitted: the
    /// programs reference every switch they use.
    pub fn defs_header(shader_defs: &[(&str, ShaderDef)]) -> String {
        let mut header = String::new();
        for (name, def) in shader_defs {
            let line = match def {
                ShaderDef::Bool(v) => format!("const {name}: bool = {v};\n"),
                ShaderDef::Int(v) => format!("const {name}: i32 = {v};\n"),
                ShaderDef::UInt(v) => format!("const {name}: u32 = {v}u;\n"),
            };
            header.push_str(&line);
        }
        header
    }

    /// Compose a program: definitions first, then the source with all
    /// includes expanded.
    pub fn compose(&self, source: &str, shader_defs: &[(&str, ShaderDef)]) -> ShadingResult<String> {
        let mut included = HashSet::new();
        let resolved = self.resolve_includes(source, &mut included)?;

        let mut composed = Self::defs_header(shader_defs);
        if !composed.is_empty() {
            composed.push('\n');
        }
        composed.push_str(&resolved);

        log::debug!(
            "Composed shader: {} defs, {} includes, {} bytes",
            shader_defs.len(),
            included.len(),
            composed.len()
        );
        Ok(composed)
    }

    /// Parse and validate composed WGSL with naga.
    pub fn validate(&self, label: &str, source: &str) -> ShadingResult<naga::Module> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| {
            ShadingError::ShaderValidation {
                label: label.to_string(),
                message: e.emit_to_string(source),
            }
        })?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| ShadingError::ShaderValidation {
                label: label.to_string(),
                message: format!("{:?}", e.into_inner()),
            })?;

        Ok(module)
    }

    /// Compose and validate in one step.
    pub fn compose_validated(
        &self,
        label: &str,
        source: &str,
        shader_defs: &[(&str, ShaderDef)],
    ) -> ShadingResult<String> {
        let composed = self.compose(source, shader_defs)?;
        self.validate(label, &composed)?;
        Ok(composed)
    }

    /// Resolve `#include "path"` directives recursively.
    fn resolve_includes(
        &self,
        source: &str,
        included: &mut HashSet<String>,
    ) -> ShadingResult<String> {
        let mut result = String::with_capacity(source.len());

        for line in source.lines() {
            let trimmed = line.trim();
            if let Some(path) = parse_include_directive(trimmed) {
                // Each module is included once
                if !included.insert(path.to_string()) {
                    continue;
                }

                let include_source = self.includes.get(path).ok_or_else(|| {
                    ShadingError::ShaderComposition(format!("Include not found: \"{path}\""))
                })?;

                let resolved = self.resolve_includes(include_source, included)?;
                result.push_str(&resolved);
                result.push('\n');
            } else {
                result.push_str(line);
                result.push('\n');
            }
        }

        Ok(result)
    }
}

/// Parse a `#include "path"` directive, returning the path if found.
fn parse_include_directive(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("#include")?;
    let rest = rest.trim();
    if let Some(inner) = rest.strip_prefix('"') {
        inner.strip_suffix('"')
    } else if let Some(inner) = rest.strip_prefix('<') {
        inner.strip_suffix('>')
    } else {
        None
    }
}

/// Compile-time switch value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderDef {
    Bool(bool),
    Int(i32),
    UInt(u32),
}

impl From<bool> for ShaderDef {
    fn from(v: bool) -> Self {
        ShaderDef::Bool(v)
    }
}

impl From<i32> for ShaderDef {
    fn from(v: i32) -> Self {
        ShaderDef::Int(v)
    }
}

impl From<u32> for ShaderDef {
    fn from(v: u32) -> Self {
        ShaderDef::UInt(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_include() {
        let mut composer = ShaderComposer::new();
        composer.register_include("test/module.wgsl", "fn one() -> f32 { return 1.0; }");
        assert!(composer.includes.contains_key("test/module.wgsl"));
    }

    #[test]
    fn test_include_resolution() {
        let mut composer = ShaderComposer::new();
        composer.register_include(
            "test/math.wgsl",
            "fn my_saturate(x: f32) -> f32 { return clamp(x, 0.0, 1.0); }",
        );

        let source = r#"#include "test/math.wgsl"

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(my_saturate(1.5), 0.0, 0.0, 1.0);
}
"#;
        let composed = composer.compose(source, &[]).unwrap();
        assert!(composed.contains("fn my_saturate"));
        assert!(!composed.contains("#include"));
        assert!(composer.validate("test", &composed).is_ok());
    }

    #[test]
    fn test_double_include_prevention() {
        let mut composer = ShaderComposer::new();
        composer.register_include("test/shared.wgsl", "const MY_CONST: f32 = 42.0;");

        let source = r#"#include "test/shared.wgsl"
#include "test/shared.wgsl"

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(MY_CONST, 0.0, 0.0, 1.0);
}
"#;
        let composed = composer.compose(source, &[]).unwrap();
        assert_eq!(composed.matches("MY_CONST: f32").count(), 1);
        assert!(composer.validate("double", &composed).is_ok());
    }

    #[test]
    fn test_missing_include() {
        let composer = ShaderComposer::new();
        let result = composer.compose("#include \"nonexistent/file.wgsl\"\n", &[]);
        assert!(matches!(result, Err(ShadingError::ShaderComposition(_))));
    }

    #[test]
    fn test_shader_defs() {
        let composer = ShaderComposer::new();
        let source = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    if USE_RED {
        return vec4<f32>(1.0, 0.0, 0.0, f32(MODE));
    }
    return vec4<f32>(0.0, 1.0, 0.0, f32(OFFSET));
}
"#;
        let defs = [
            ("USE_RED", ShaderDef::Bool(false)),
            ("MODE", ShaderDef::UInt(3)),
            ("OFFSET", ShaderDef::Int(-2)),
        ];
        let composed = composer.compose(source, &defs).unwrap();
        assert!(composed.starts_with("const USE_RED: bool = false;\n"));
        assert!(composed.contains("const MODE: u32 = 3u;"));
        assert!(composed.contains("const OFFSET: i32 = -2;"));
        assert!(composer.validate("defs", &composed).is_ok());
    }

    #[test]
    fn test_invalid_wgsl_reports_label() {
        let composer = ShaderComposer::new();
        let err = composer.validate("broken", "fn oops( {").unwrap_err();
        match err {
            ShadingError::ShaderValidation { label, .. } => assert_eq!(label, "broken"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_include_directive() {
        assert_eq!(
            parse_include_directive(r#"#include "foo/bar.wgsl""#),
            Some("foo/bar.wgsl")
        );
        assert_eq!(
            parse_include_directive(r#"#include <foo/bar.wgsl>"#),
            Some("foo/bar.wgsl")
        );
        assert_eq!(parse_include_directive("// comment"), None);
    }
}

//! Compile-time configuration for the SharpTS compiler core.
//!
//! Lives in `sharpts-common` (mirroring the teacher project's
//! `tsz_common::checker_options::CheckerOptions`) so that `sharpts-types`,
//! `sharpts-async`, `sharpts-decorators`, and `sharpts-emitter` can all
//! reference it without creating a dependency cycle.

/// §4.6: decorator application follows one of two fixed ABIs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DecoratorMode {
    /// Pre-standard ("experimental") decorators: `(target, key, descriptor)`.
    #[default]
    Legacy,
    /// TC39 Stage 3 decorators: `(value, context)`.
    Stage3,
}

/// Compiler options consumed by the async analyzer, state-machine builder,
/// emitter, and decorator applier.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Which decorator ABI §4.6 should apply.
    pub decorator_mode: DecoratorMode,
    /// Emit verbose field names on the state-machine record (`state_0`,
    /// `awaiter_0`, ...) instead of compact numeric-suffixed names. Purely
    /// cosmetic — does not change program semantics, useful when a human
    /// is reading the bytecode listing.
    pub verbose_field_names: bool,
    /// When true, a method name present on exactly one union member still
    /// goes through the runtime `isinst` fallback (useful for differential
    /// testing against the purely-dynamic dispatch path). Defaults to
    /// false, which is the §4.5 rule 7 fast path.
    pub force_runtime_union_dispatch: bool,
    /// Locale for diagnostic message formatting. Only `"en"` is populated
    /// in this build; unrecognized locales fall back to `"en"`.
    pub locale: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            decorator_mode: DecoratorMode::default(),
            verbose_field_names: true,
            force_runtime_union_dispatch: false,
            locale: "en".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_fast_path() {
        let opts = CompileOptions::default();
        assert_eq!(opts.decorator_mode, DecoratorMode::Legacy);
        assert!(!opts.force_runtime_union_dispatch);
    }
}

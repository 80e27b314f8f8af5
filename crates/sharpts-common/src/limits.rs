//! Centralized limits and thresholds for the SharpTS compiler core.
//!
//! Mirrors the teacher project's convention of keeping magic numbers in one
//! place with the rationale attached, rather than scattered through the
//! analyzer/builder/emitter modules.

/// Maximum number of suspension points (`await` or `yield`) tracked in a
/// single function body. Past this, the await-point analyzer bails out with
/// a `CompileError` rather than assigning state numbers that would overflow
/// a reasonable `switch` dispatch table.
pub const MAX_SUSPENSION_POINTS: u32 = 4096;

/// Maximum number of hoisted variables (including parameters and `this`)
/// that may be lifted into a single state-machine record.
pub const MAX_HOISTED_FIELDS: u32 = 2048;

/// Maximum nesting depth of `try`/`catch`/`finally` regions the complex-try
/// lowering in §4.3 will segment. Deeper nesting is rejected with a
/// `CompileError` to avoid pathological label generation.
pub const MAX_TRY_NESTING_DEPTH: u32 = 128;

/// Maximum recursion depth for the await-point analyzer's statement/
/// expression walk. Prevents stack overflow on pathologically nested
/// source (e.g. thousands of nested parenthesized expressions).
pub const MAX_ANALYZER_RECURSION_DEPTH: u32 = 1000;

/// Maximum number of members a `Union` or `Intersection` type may carry
/// after flattening/normalization before the type lattice gives up and
/// widens to `unknown` rather than exhaustively tracking every member.
pub const MAX_UNION_MEMBERS: usize = 512;

/// Maximum decorator chain length (`@d1 @d2 @d3 ... class C {}`) the
/// decorator applier will process per declaration.
pub const MAX_DECORATOR_CHAIN_LENGTH: u32 = 64;

/// Maximum depth of the loop-label stack (nested labeled loops) the
/// MoveNext emitter's control-flow lowering will track.
pub const MAX_LOOP_LABEL_DEPTH: u32 = 256;

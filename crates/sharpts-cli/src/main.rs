//! `sharptsc`: the driver binary for the SharpTS compiler core.
//!
//! Reads a serialized AST (JSON, produced by a host front end that has
//! already parsed and lowered TypeScript-subset source down to the tree in
//! `sharpts-ast`), runs every top-level function/class declaration through
//! the await-analysis → state-machine → MoveNext/dispatch pipeline, and
//! prints either a human-readable bytecode listing or a JSON instruction
//! dump. This crate owns no compiler logic of its own (SPEC_FULL.md §A.7):
//! it only wires the library crates together and renders their output.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use sharpts_ast::{ClassMember, Module, StmtKind};
use sharpts_common::{CompileOptions, DecoratorMode, Interner};
use sharpts_emitter::{DriverKind, EmitError, EmittedFunction};
use tracing::instrument;

/// The on-disk shape a host front end hands us: the module tree plus the
/// interner's string table in insertion order, so atoms in `module`
/// resolve against the same table the producer used (`Interner::intern`
/// assigns indices in insertion order, so replaying the strings through a
/// fresh `Interner` in the same order reproduces identical `Atom`s).
#[derive(serde::Deserialize)]
struct SourceUnit {
    interner: Vec<String>,
    module: Module,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CliDecoratorMode {
    Legacy,
    Stage3,
}

impl From<CliDecoratorMode> for DecoratorMode {
    fn from(mode: CliDecoratorMode) -> Self {
        match mode {
            CliDecoratorMode::Legacy => DecoratorMode::Legacy,
            CliDecoratorMode::Stage3 => DecoratorMode::Stage3,
        }
    }
}

/// Compiles a serialized AST down to typed IL and prints the result.
#[derive(Parser, Debug)]
#[command(name = "sharptsc", version, about = "SharpTS compiler core driver")]
struct Args {
    /// Path to a serialized AST (JSON) produced by a host front end.
    input: PathBuf,

    /// Which decorator ABI to apply when planning class decorators (§4.6).
    #[arg(long, value_enum, default_value_t = CliDecoratorMode::Legacy)]
    decorators: CliDecoratorMode,

    /// Print a JSON instruction dump instead of the human-readable listing.
    #[arg(long)]
    emit_json: bool,

    /// Use compact field names on state-machine records instead of the
    /// verbose `<name>5__n` form a human reads more easily in a listing.
    #[arg(long)]
    compact_fields: bool,

    /// Increase tracing verbosity (stackable: `-v`, `-vv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "sharptsc=info,warn",
        1 => "sharptsc=debug,sharpts_emitter=debug,warn",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string()))
        .without_time()
        .init();
}

#[instrument(skip_all, fields(input = %args.input.display()))]
fn run(args: &Args) -> Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let unit: SourceUnit = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid serialized AST", args.input.display()))?;

    let mut interner = Interner::new();
    for name in &unit.interner {
        interner.intern(name);
    }

    let options = CompileOptions {
        decorator_mode: args.decorators.into(),
        verbose_field_names: !args.compact_fields,
        force_runtime_union_dispatch: false,
        locale: "en".to_string(),
    };

    let program = compile_module(&unit.module, &interner, &options)?;

    if args.emit_json {
        println!("{}", serde_json::to_string_pretty(&program.to_json())?);
    } else {
        print!("{program}");
    }
    Ok(())
}

/// One compiled top-level function or class member, plus the class
/// decorator plan (if any) for declarations that carry one.
struct CompiledUnit {
    functions: Vec<EmittedFunction>,
    /// `(class name, number of decorator-application steps, mode)` — the
    /// plan itself borrows from the source AST, so only a summary survives
    /// past `compile_module`'s stack frame.
    decorator_plans: Vec<(String, usize, DecoratorMode)>,
}

impl CompiledUnit {
    fn to_json(&self) -> serde_json::Value {
        let functions = self
            .functions
            .iter()
            .map(|f| {
                serde_json::json!({
                    "name": f.body.name,
                    "driver_kind": f.driver_kind.map(driver_kind_name),
                    "locals": f.body.locals.len(),
                    "fields": f.shape.as_ref().map(|s| {
                        s.fields().map(|(_, info)| info.name.clone()).collect::<Vec<_>>()
                    }),
                    "instructions": f.body.instructions.iter().map(|i| format!("{i:?}")).collect::<Vec<_>>(),
                })
            })
            .collect::<Vec<_>>();
        let decorators = self
            .decorator_plans
            .iter()
            .map(|(name, steps, mode)| {
                serde_json::json!({ "class": name, "steps": steps, "mode": format!("{mode:?}") })
            })
            .collect::<Vec<_>>();
        serde_json::json!({ "functions": functions, "decorators": decorators })
    }
}

impl std::fmt::Display for CompiledUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, steps, mode) in &self.decorator_plans {
            writeln!(f, "; class {name}: {steps} decorator step(s) ({mode:?})")?;
        }
        for emitted in &self.functions {
            if let Some(kind) = emitted.driver_kind {
                writeln!(f, "; driver: {}", driver_kind_name(kind))?;
            }
            if let Some(shape) = &emitted.shape {
                write!(f, "; state-machine fields:")?;
                for (handle, info) in shape.fields() {
                    write!(f, " {}#{}={:?}", info.name, handle.0, info.kind)?;
                }
                writeln!(f)?;
            }
            writeln!(f, "{}", emitted.body)?;
        }
        Ok(())
    }
}

fn driver_kind_name(kind: DriverKind) -> &'static str {
    match kind {
        DriverKind::AsyncCompletion => "async-completion",
        DriverKind::GeneratorEnumerator => "generator-enumerator",
        DriverKind::AsyncGeneratorIterator => "async-generator-iterator",
    }
}

/// Walks every top-level declaration, emitting a `MethodBody` for each
/// function/method/accessor and a decorator-application plan for each
/// class, in source order.
fn compile_module(module: &Module, interner: &Interner, options: &CompileOptions) -> Result<CompiledUnit, EmitError> {
    let mut functions = Vec::new();
    let mut decorator_plans = Vec::new();

    for stmt in &module.body {
        match &stmt.kind {
            StmtKind::Function(func) => {
                functions.push(sharpts_emitter::emit_function(func, false, interner, options)?);
            }
            StmtKind::Class(class) => {
                let plan = sharpts_decorators::plan_class_decorators(class, options, interner)?;
                let class_name = class.name.map(|n| interner.resolve(n)).unwrap_or("<anonymous>").to_string();
                decorator_plans.push((class_name, plan.steps.len(), plan.mode));

                for member in &class.members {
                    match member {
                        ClassMember::Method(method) => {
                            functions.push(sharpts_emitter::emit_function(&method.function, true, interner, options)?);
                        }
                        ClassMember::Accessor(accessor) => {
                            if let Some(getter) = &accessor.getter {
                                functions.push(sharpts_emitter::emit_function(getter, true, interner, options)?);
                            }
                            if let Some(setter) = &accessor.setter {
                                functions.push(sharpts_emitter::emit_function(setter, true, interner, options)?);
                            }
                        }
                        // Field initializers and static blocks run as part of
                        // the constructor/static-init sequence (SPEC_FULL.md
                        // §C "Class static initialization order"), which a
                        // full checker-backed build would splice them into;
                        // this driver has no such splicing pass; see
                        // DESIGN.md.
                        ClassMember::Field(_) | ClassMember::StaticBlock(_) => {}
                    }
                }
            }
            // Top-level statements with no bytecode of their own outside a
            // function body (expression statements, `var`, control flow at
            // module scope, ...) have nothing for this driver to emit;
            // the host front end is expected to have wrapped an entry point
            // in a top-level function if one is needed.
            _ => {}
        }
    }

    Ok(CompiledUnit { functions, decorator_plans })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharpts_ast::{Block, FunctionDecl};

    #[test]
    fn compiles_a_single_top_level_function() {
        let interner = Interner::new();
        let options = CompileOptions::default();
        let module = Module {
            body: vec![sharpts_ast::Stmt::new(
                sharpts_ast::NodeIdGen::new().next(),
                sharpts_common::Span::dummy(),
                StmtKind::Function(FunctionDecl {
                    name: None,
                    params: vec![],
                    return_type: None,
                    body: Block::new(),
                    is_async: false,
                    is_generator: false,
                    is_arrow: false,
                    has_concise_body: false,
                }),
            )],
        };
        let compiled = compile_module(&module, &interner, &options).unwrap();
        assert_eq!(compiled.functions.len(), 1);
        assert!(compiled.decorator_plans.is_empty());
    }

    #[test]
    fn empty_module_compiles_to_nothing() {
        let interner = Interner::new();
        let options = CompileOptions::default();
        let module = Module { body: vec![] };
        let compiled = compile_module(&module, &interner, &options).unwrap();
        assert!(compiled.functions.is_empty());
    }
}

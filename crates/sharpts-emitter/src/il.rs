//! The typed IL model (§6 "Bytecode output").
//!
//! A flat instruction stream per method body, with typed local slots,
//! protected regions (try/catch/filter/finally — `filter` is modeled for
//! ABI completeness but this core never emits one), branch instructions
//! (unconditional/conditional/switch), field/local/argument/array-element
//! load and store, boxing/unboxing, virtual and non-virtual calls, object
//! construction, and metadata tokens referencing types/methods/fields.
//!
//! §6: "The emitter's only assumption is that protected-region exits
//! require a `leave` opcode" — `Instr::Leave` is therefore the only way
//! out of a `ProtectedRegion`; a bare `Instr::Br`/`Ret` inside one would
//! be a bug in any emitter built on this model.

use std::fmt;

use sharpts_async::{FieldHandle, SuspensionKind};

/// The stack-type lattice (§4.4): the static type of the value that would
/// be on top of the operand stack after this instruction, tracked by the
/// expression emitter (C6) rather than stored per-instruction — kept here
/// only as the shared vocabulary both C6 and C5 refer to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackType {
    Double,
    Boolean,
    String,
    Null,
    Unknown,
}

impl StackType {
    /// §4.4: `EnsureBoxed` is a no-op for anything that isn't a CLR value
    /// type; only `Double`/`Boolean` require an explicit box conversion.
    #[must_use]
    pub const fn needs_boxing(self) -> bool {
        matches!(self, StackType::Double | StackType::Boolean)
    }
}

impl fmt::Display for StackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StackType::Double => "double",
            StackType::Boolean => "bool",
            StackType::String => "string",
            StackType::Null => "null",
            StackType::Unknown => "object",
        };
        f.write_str(s)
    }
}

/// A local variable slot within one method body (`MoveNext`, a stub, or a
/// plain non-async function). Distinct from `FieldHandle`, which
/// addresses a state-machine record field shared across suspensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LocalHandle(pub u32);

/// A branch target within one method body's instruction stream, resolved
/// to an instruction index only at the end of emission (`MethodBody::resolve`
/// is intentionally not modeled — listings print label *names*, and a real
/// backend would patch offsets in a final pass, out of scope here per
/// spec.md §1 "the assembly-reference rewriter (post-processing stage)").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Label(pub u32);

/// A metadata token: an opaque reference to a type, method, or field that
/// a real backend would resolve against an assembly's metadata tables.
/// Modeled here purely as a name, since this core never writes an actual
/// assembly (§1: out of scope).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetadataToken {
    Type(String),
    Method(String),
    Field(String),
    /// A runtime helper from the fixed catalog in §6.
    Helper(String),
}

impl fmt::Display for MetadataToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataToken::Type(n) => write!(f, "type {n}"),
            MetadataToken::Method(n) => write!(f, "method {n}"),
            MetadataToken::Field(n) => write!(f, "field {n}"),
            MetadataToken::Helper(n) => write!(f, "helper {n}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    NotEq,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    /// Numeric addition on two already-unboxed doubles. `BinaryOp::Add`
    /// goes through the `Add` runtime helper instead (JS `+` also does
    /// string concatenation); this variant exists for call sites that
    /// already know both operands are numbers, such as increment/decrement.
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
}

/// Which field a field load/store addresses: a state-machine record field
/// on `self` (hoisted variable, `awaiter_n`, `state`, ...) or a plain
/// object property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldRef {
    /// A field on the current `MoveNext`'s own state-machine record.
    StateMachine(FieldHandle),
    /// An object property on an arbitrary reference (name resolved at
    /// runtime via `GetProperty`/`SetProperty`, or a direct metadata
    /// token when the receiver's class is statically known).
    Named(MetadataToken),
}

/// One instruction in the flat bytecode stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    // --- Constants ---------------------------------------------------
    LdcR8(f64),
    LdStr(String),
    LdTrue,
    LdFalse,
    LdNull,
    LdUndefined,

    // --- Locals / arguments / fields ---------------------------------
    LdLoc(LocalHandle),
    StLoc(LocalHandle),
    LdArg(u32),
    LdFld(FieldRef),
    StFld(FieldRef),
    /// `ldflda` — address-of, used when an awaiter field must be passed
    /// by reference to `AwaitUnsafeOnCompleted`/`get_awaiter`.
    LdFldA(FieldRef),
    LdThis,
    StThis,

    // --- Arrays -------------------------------------------------------
    NewArr(u32),
    LdElem,
    StElem,

    // --- Stack shuffling -----------------------------------------------
    Dup,
    Pop,

    // --- Arithmetic / comparison ---------------------------------------
    Arith(ArithOp),
    Compare(CompareOp),
    Neg,
    Not,
    BitNot,

    // --- Boxing ----------------------------------------------------------
    Box,
    Unbox(StackType),

    // --- Type tests --------------------------------------------------
    Isinst(MetadataToken),
    CastClass(MetadataToken),

    // --- Calls ---------------------------------------------------------
    Call(MetadataToken, u32),
    CallVirt(MetadataToken, u32),
    /// A call into the fixed runtime-helper catalog (§6): `Add`, `Equals`,
    /// `IsTruthy`, `Stringify`, `GetProperty`, `InvokeValue`, ...
    CallHelper(String, u32),
    NewObj(MetadataToken, u32),

    // --- Branches --------------------------------------------------------
    Br(Label),
    BrTrue(Label),
    BrFalse(Label),
    Switch(Vec<Label>),
    Label(Label),

    // --- Protected regions (§6: "exits require a `leave` opcode") ---------
    BeginTry,
    BeginCatch(MetadataToken),
    BeginFinally,
    BeginFault,
    EndTry,
    Leave(Label),
    Throw,
    Rethrow,

    Ret,
    RetVoid,
}

/// One method body: a flat instruction stream plus the local-slot table
/// used purely for listing output (types aren't enforced here — C6's
/// stack-type lattice is the actual static-typing mechanism, this is just
/// a human-readable declaration).
#[derive(Debug, Default)]
pub struct MethodBody {
    pub name: String,
    pub locals: Vec<StackType>,
    pub instructions: Vec<Instr>,
    next_label: u32,
}

impl MethodBody {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), locals: Vec::new(), instructions: Vec::new(), next_label: 0 }
    }

    pub fn new_local(&mut self, ty: StackType) -> LocalHandle {
        let handle = LocalHandle(self.locals.len() as u32);
        self.locals.push(ty);
        handle
    }

    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    pub fn emit(&mut self, instr: Instr) {
        self.instructions.push(instr);
    }

    pub fn mark_label(&mut self, label: Label) {
        self.emit(Instr::Label(label));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl fmt::Display for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "method {} ({} locals)", self.name, self.locals.len())?;
        for instr in &self.instructions {
            writeln!(f, "  {}", format_instr(instr))?;
        }
        Ok(())
    }
}

fn format_instr(instr: &Instr) -> String {
    match instr {
        Instr::LdcR8(v) => format!("ldc.r8 {v}"),
        Instr::LdStr(s) => format!("ldstr {s:?}"),
        Instr::LdTrue => "ldc.i4.1".to_string(),
        Instr::LdFalse => "ldc.i4.0".to_string(),
        Instr::LdNull => "ldnull".to_string(),
        Instr::LdUndefined => "ldsfld Undefined".to_string(),
        Instr::LdLoc(l) => format!("ldloc {}", l.0),
        Instr::StLoc(l) => format!("stloc {}", l.0),
        Instr::LdArg(i) => format!("ldarg {i}"),
        Instr::LdFld(field) => format!("ldfld {}", format_field(field)),
        Instr::StFld(field) => format!("stfld {}", format_field(field)),
        Instr::LdFldA(field) => format!("ldflda {}", format_field(field)),
        Instr::LdThis => "ldarg.0".to_string(),
        Instr::StThis => "starg.0".to_string(),
        Instr::NewArr(n) => format!("newarr {n}"),
        Instr::LdElem => "ldelem.ref".to_string(),
        Instr::StElem => "stelem.ref".to_string(),
        Instr::Dup => "dup".to_string(),
        Instr::Pop => "pop".to_string(),
        Instr::Arith(op) => format!("{op:?}").to_lowercase(),
        Instr::Compare(op) => format!("{op:?}").to_lowercase(),
        Instr::Neg => "neg".to_string(),
        Instr::Not => "not".to_string(),
        Instr::BitNot => "bitnot".to_string(),
        Instr::Box => "box".to_string(),
        Instr::Unbox(t) => format!("unbox.any {t}"),
        Instr::Isinst(t) => format!("isinst {t}"),
        Instr::CastClass(t) => format!("castclass {t}"),
        Instr::Call(t, argc) => format!("call {t} ({argc} args)"),
        Instr::CallVirt(t, argc) => format!("callvirt {t} ({argc} args)"),
        Instr::CallHelper(name, argc) => format!("call helper {name} ({argc} args)"),
        Instr::NewObj(t, argc) => format!("newobj {t} ({argc} args)"),
        Instr::Br(l) => format!("br L{}", l.0),
        Instr::BrTrue(l) => format!("brtrue L{}", l.0),
        Instr::BrFalse(l) => format!("brfalse L{}", l.0),
        Instr::Switch(labels) => {
            let parts: Vec<String> = labels.iter().map(|l| format!("L{}", l.0)).collect();
            format!("switch ({})", parts.join(", "))
        }
        Instr::Label(l) => format!("L{}:", l.0),
        Instr::BeginTry => ".try {".to_string(),
        Instr::BeginCatch(t) => format!("}} catch {t} {{"),
        Instr::BeginFinally => "} finally {".to_string(),
        Instr::BeginFault => "} fault {".to_string(),
        Instr::EndTry => "}".to_string(),
        Instr::Leave(l) => format!("leave L{}", l.0),
        Instr::Throw => "throw".to_string(),
        Instr::Rethrow => "rethrow".to_string(),
        Instr::Ret => "ret".to_string(),
        Instr::RetVoid => "ret.void".to_string(),
    }
}

fn format_field(field: &FieldRef) -> String {
    match field {
        FieldRef::StateMachine(handle) => format!("self.<field {}>", handle.0),
        FieldRef::Named(token) => token.to_string(),
    }
}

/// Which kind of suspension driver a generated `MoveNext` serves — purely
/// descriptive metadata carried alongside a `MethodBody` for listing
/// output and for the CLI's `--emit-json` serialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverKind {
    AsyncCompletion,
    GeneratorEnumerator,
    AsyncGeneratorIterator,
}

impl From<(bool, bool)> for DriverKind {
    fn from((is_async, is_generator): (bool, bool)) -> Self {
        match (is_async, is_generator) {
            (true, true) => DriverKind::AsyncGeneratorIterator,
            (true, false) => DriverKind::AsyncCompletion,
            (false, _) => DriverKind::GeneratorEnumerator,
        }
    }
}

#[must_use]
pub fn suspension_kind_for(is_async: bool, is_generator: bool) -> Option<SuspensionKind> {
    match (is_async, is_generator) {
        (true, false) => Some(SuspensionKind::Await),
        (false, true) => Some(SuspensionKind::Yield),
        (true, true) => Some(SuspensionKind::AsyncYield),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxing_needed_only_for_value_types() {
        assert!(StackType::Double.needs_boxing());
        assert!(StackType::Boolean.needs_boxing());
        assert!(!StackType::String.needs_boxing());
        assert!(!StackType::Unknown.needs_boxing());
    }

    #[test]
    fn method_body_labels_are_unique() {
        let mut body = MethodBody::new("M");
        let a = body.new_label();
        let b = body.new_label();
        assert_ne!(a, b);
    }

    #[test]
    fn driver_kind_from_flags() {
        assert_eq!(DriverKind::from((true, false)), DriverKind::AsyncCompletion);
        assert_eq!(DriverKind::from((false, true)), DriverKind::GeneratorEnumerator);
        assert_eq!(DriverKind::from((true, true)), DriverKind::AsyncGeneratorIterator);
    }
}

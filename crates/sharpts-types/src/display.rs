//! The canonical string form used as the structural-equality key for
//! interning (§3: "equality is structural, via the canonical string
//! form"). Two types that print identically here are the same `TypeId`
//! after `TypeStore::intern`.
//!
//! This is deliberately not a pretty-printer: member order inside
//! `Record`/`Interface` is preserved (it is semantically visible through
//! `keyof`/mapped types) but `Union`/`Intersection` members are sorted by
//! their own canonical form before printing, which is what makes
//! flattening + dedup order-independent.

use crate::kind::Type;
use crate::store::TypeStore;
use std::fmt::Write;

#[must_use]
pub fn canonical_form(store: &TypeStore, id_or_type: &Type) -> String {
    let mut out = String::new();
    write_type(store, id_or_type, &mut out);
    out
}

fn write_type(store: &TypeStore, ty: &Type, out: &mut String) {
    match ty {
        Type::Number => out.push_str("number"),
        Type::String => out.push_str("string"),
        Type::Boolean => out.push_str("boolean"),
        Type::Void => out.push_str("void"),
        Type::Any => out.push_str("any"),
        Type::Null => out.push_str("null"),
        Type::Undefined => out.push_str("undefined"),
        Type::Unknown => out.push_str("unknown"),
        Type::Never => out.push_str("never"),
        Type::Symbol => out.push_str("symbol"),
        Type::BigInt => out.push_str("bigint"),
        Type::Date => out.push_str("Date"),
        Type::RegExp => out.push_str("RegExp"),
        Type::Array(elem) => {
            write_ref(store, *elem, out);
            out.push_str("[]");
        }
        Type::Tuple(elements) => {
            out.push('[');
            for (i, el) in elements.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_ref(store, el.ty, out);
                if el.is_rest {
                    out.push_str("...");
                } else if el.optional {
                    out.push('?');
                }
            }
            out.push(']');
        }
        Type::Map(k, v) => {
            out.push_str("Map<");
            write_ref(store, *k, out);
            out.push(',');
            write_ref(store, *v, out);
            out.push('>');
        }
        Type::Set(elem) => {
            out.push_str("Set<");
            write_ref(store, *elem, out);
            out.push('>');
        }
        Type::WeakMap(k, v) => {
            out.push_str("WeakMap<");
            write_ref(store, *k, out);
            out.push(',');
            write_ref(store, *v, out);
            out.push('>');
        }
        Type::WeakSet(elem) => {
            out.push_str("WeakSet<");
            write_ref(store, *elem, out);
            out.push('>');
        }
        Type::Iterator(elem) => {
            out.push_str("Iterator<");
            write_ref(store, *elem, out);
            out.push('>');
        }
        Type::Promise(elem) => {
            out.push_str("Promise<");
            write_ref(store, *elem, out);
            out.push('>');
        }
        Type::Generator(elem) => {
            out.push_str("Generator<");
            write_ref(store, *elem, out);
            out.push('>');
        }
        Type::AsyncGenerator(elem) => {
            out.push_str("AsyncGenerator<");
            write_ref(store, *elem, out);
            out.push('>');
        }
        Type::Module(ns) => {
            let _ = write!(out, "module {}", store.resolve(ns.name));
        }
        Type::Record(members) => {
            out.push('{');
            for (i, (name, sig)) in members.iter().enumerate() {
                if i > 0 {
                    out.push(';');
                }
                out.push_str(store.resolve(*name));
                if sig.optional {
                    out.push('?');
                }
                out.push(':');
                write_ref(store, sig.ty, out);
            }
            out.push('}');
        }
        Type::Interface(def) => {
            let _ = write!(out, "interface {}", store.resolve(def.name));
        }
        Type::Class(def) => {
            let _ = write!(out, "class {}", store.resolve(def.name));
        }
        Type::MutableClass(_) => out.push_str("<mutable-class>"),
        Type::Instance(class_id) => {
            write_ref(store, *class_id, out);
            out.push_str(" instance");
        }
        Type::Enum(def) => {
            let _ = write!(out, "enum {}", store.resolve(def.name));
        }
        Type::Namespace(def) => {
            let _ = write!(out, "namespace {}", store.resolve(def.name));
        }
        Type::ExternalType(name) => out.push_str(store.resolve(*name)),
        Type::Function(sig) => write_function_sig(store, sig, out),
        Type::OverloadedFunction(sigs) => {
            for (i, sig) in sigs.iter().enumerate() {
                if i > 0 {
                    out.push('&');
                }
                write_function_sig(store, sig, out);
            }
        }
        Type::GenericFunction(def) => {
            out.push('<');
            write_type_params(store, &def.type_params, out);
            out.push('>');
            write_function_sig(store, &def.sig, out);
        }
        Type::GenericClass(def) => {
            let _ = write!(out, "class {}<", store.resolve(def.class.name));
            write_type_params(store, &def.type_params, out);
            out.push('>');
        }
        Type::GenericInterface(def) => {
            let _ = write!(out, "interface {}<", store.resolve(def.interface.name));
            write_type_params(store, &def.type_params, out);
            out.push('>');
        }
        Type::InstantiatedGeneric { base, args } => {
            write_ref(store, *base, out);
            out.push('<');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_ref(store, *arg, out);
            }
            out.push('>');
        }
        Type::Literal(lit) => write_literal(lit, out),
        Type::KeyOf(inner) => {
            out.push_str("keyof ");
            write_ref(store, *inner, out);
        }
        Type::MappedType(def) => {
            let _ = write!(out, "{{[{} in ", store.resolve(def.type_param));
            write_ref(store, def.constraint, out);
            out.push_str("]:");
            write_ref(store, def.value_type, out);
            out.push('}');
        }
        Type::IndexedAccess { object, index } => {
            write_ref(store, *object, out);
            out.push('[');
            write_ref(store, *index, out);
            out.push(']');
        }
        Type::ConditionalType(def) => {
            write_ref(store, def.check, out);
            out.push_str(" extends ");
            write_ref(store, def.extends, out);
            out.push('?');
            write_ref(store, def.true_branch, out);
            out.push(':');
            write_ref(store, def.false_branch, out);
        }
        Type::InferredTypeParameter(name) => {
            let _ = write!(out, "infer {}", store.resolve(*name));
        }
        Type::Union(members) => write_normalized_list(store, members, '|', out),
        Type::Intersection(members) => write_normalized_list(store, members, '&', out),
        Type::TemplateLiteralType(parts) => {
            out.push('`');
            for part in parts {
                match part {
                    crate::kind::TemplateLiteralPart::Literal(text) => out.push_str(text),
                    crate::kind::TemplateLiteralPart::Placeholder(id) => {
                        out.push_str("${");
                        write_ref(store, *id, out);
                        out.push('}');
                    }
                }
            }
            out.push('`');
        }
        Type::IntrinsicStringType(op, inner) => {
            let op_name = match op {
                crate::kind::IntrinsicStringOp::Uppercase => "Uppercase",
                crate::kind::IntrinsicStringOp::Lowercase => "Lowercase",
                crate::kind::IntrinsicStringOp::Capitalize => "Capitalize",
                crate::kind::IntrinsicStringOp::Uncapitalize => "Uncapitalize",
            };
            let _ = write!(out, "{op_name}<");
            write_ref(store, *inner, out);
            out.push('>');
        }
    }
}

fn write_ref(store: &TypeStore, id: crate::id::TypeId, out: &mut String) {
    out.push_str(store.canonical_of(id));
}

fn write_function_sig(store: &TypeStore, sig: &crate::kind::FunctionSig, out: &mut String) {
    out.push('(');
    for (i, param) in sig.params.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(store.resolve(param.name));
        if param.optional {
            out.push('?');
        }
        out.push(':');
        write_ref(store, param.ty, out);
    }
    out.push_str(")=>");
    write_ref(store, sig.return_type, out);
}

fn write_type_params(store: &TypeStore, params: &[crate::kind::TypeParam], out: &mut String) {
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(store.resolve(param.name));
        if let Some(constraint) = param.constraint {
            out.push_str(" extends ");
            write_ref(store, constraint, out);
        }
    }
}

fn write_literal(lit: &crate::kind::LiteralValue, out: &mut String) {
    match lit {
        crate::kind::LiteralValue::String(s) => {
            let _ = write!(out, "\"{s}\"");
        }
        crate::kind::LiteralValue::Number(n) => {
            let _ = write!(out, "{n}");
        }
        crate::kind::LiteralValue::Boolean(b) => {
            let _ = write!(out, "{b}");
        }
        crate::kind::LiteralValue::BigInt(b) => {
            let _ = write!(out, "{b}n");
        }
    }
}

/// Shared by `Union`/`Intersection`: member forms are sorted lexically so
/// that flattening + dedup is independent of source/insertion order.
fn write_normalized_list(store: &TypeStore, members: &[crate::id::TypeId], sep: char, out: &mut String) {
    let mut forms: Vec<&str> = members.iter().map(|id| store.canonical_of(*id)).collect();
    forms.sort_unstable();
    for (i, form) in forms.iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        out.push_str(form);
    }
}

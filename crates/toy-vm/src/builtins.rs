//! The system dictionary: native operators every Toy program can call
//! without having defined them itself.
//!
//! Concrete operator semantics are an external collaborator's concern in
//! the distilled specification; this module supplies a small, consistent
//! PostScript-style core — arithmetic, comparison, stack shuffling, and a
//! dictionary API — sufficient to run the language's own literal examples
//! (`1 2 add`) and to exercise `def`/`dict`/`begin`/`end` end to end.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::machine::{BuiltinFn, DictFrame, Machine};
use crate::runtime::RuntimeInstr;
use crate::VmError;

/// Every name the system dictionary defines. The compiler consults this
/// (via [`is_builtin`]) to exclude built-in names from a fragment's
/// external-reference set.
pub const BUILTIN_NAMES: &[&str] = &[
    "add", "sub", "mul", "div", "eq", "lt", "gt", "not", "and", "or", "dup", "pop", "exch", "print", "dict", "def",
    "get", "known", "begin", "end", "currentdict",
];

/// Whether `name` is defined by the system dictionary.
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// Builds a fresh system dictionary table.
pub fn system_dictionary() -> BTreeMap<&'static str, BuiltinFn> {
    let mut table: BTreeMap<&'static str, BuiltinFn> = BTreeMap::new();
    table.insert("add", add);
    table.insert("sub", sub);
    table.insert("mul", mul);
    table.insert("div", div);
    table.insert("eq", eq);
    table.insert("lt", lt);
    table.insert("gt", gt);
    table.insert("not", not);
    table.insert("and", and);
    table.insert("or", or);
    table.insert("dup", dup);
    table.insert("pop", pop);
    table.insert("exch", exch);
    table.insert("print", print);
    table.insert("dict", dict);
    table.insert("def", def);
    table.insert("get", get);
    table.insert("known", known);
    table.insert("begin", begin);
    table.insert("end", end);
    table.insert("currentdict", currentdict);
    table
}

fn pop_number(machine: &mut Machine, op: &'static str) -> Result<f64, VmError> {
    machine.operand_stack.pop().ok_or(VmError::StackUnderflow(op))?.as_number(op)
}

fn pop_bool(machine: &mut Machine, op: &'static str) -> Result<bool, VmError> {
    match machine.operand_stack.pop().ok_or(VmError::StackUnderflow(op))? {
        RuntimeInstr::Boolean(b) => Ok(b),
        other => Err(VmError::TypeCheck {
            op,
            expected: "boolean",
            found: other.type_name(),
        }),
    }
}

fn add(m: &mut Machine) -> Result<(), VmError> {
    let b = pop_number(m, "add")?;
    let a = pop_number(m, "add")?;
    m.operand_stack.push(RuntimeInstr::Number(a + b));
    Ok(())
}

fn sub(m: &mut Machine) -> Result<(), VmError> {
    let b = pop_number(m, "sub")?;
    let a = pop_number(m, "sub")?;
    m.operand_stack.push(RuntimeInstr::Number(a - b));
    Ok(())
}

fn mul(m: &mut Machine) -> Result<(), VmError> {
    let b = pop_number(m, "mul")?;
    let a = pop_number(m, "mul")?;
    m.operand_stack.push(RuntimeInstr::Number(a * b));
    Ok(())
}

fn div(m: &mut Machine) -> Result<(), VmError> {
    let b = pop_number(m, "div")?;
    let a = pop_number(m, "div")?;
    m.operand_stack.push(RuntimeInstr::Number(a / b));
    Ok(())
}

fn eq(m: &mut Machine) -> Result<(), VmError> {
    let b = pop_number(m, "eq")?;
    let a = pop_number(m, "eq")?;
    m.operand_stack.push(RuntimeInstr::Boolean(a == b));
    Ok(())
}

fn lt(m: &mut Machine) -> Result<(), VmError> {
    let b = pop_number(m, "lt")?;
    let a = pop_number(m, "lt")?;
    m.operand_stack.push(RuntimeInstr::Boolean(a < b));
    Ok(())
}

fn gt(m: &mut Machine) -> Result<(), VmError> {
    let b = pop_number(m, "gt")?;
    let a = pop_number(m, "gt")?;
    m.operand_stack.push(RuntimeInstr::Boolean(a > b));
    Ok(())
}

fn not(m: &mut Machine) -> Result<(), VmError> {
    let a = pop_bool(m, "not")?;
    m.operand_stack.push(RuntimeInstr::Boolean(!a));
    Ok(())
}

fn and(m: &mut Machine) -> Result<(), VmError> {
    let b = pop_bool(m, "and")?;
    let a = pop_bool(m, "and")?;
    m.operand_stack.push(RuntimeInstr::Boolean(a && b));
    Ok(())
}

fn or(m: &mut Machine) -> Result<(), VmError> {
    let b = pop_bool(m, "or")?;
    let a = pop_bool(m, "or")?;
    m.operand_stack.push(RuntimeInstr::Boolean(a || b));
    Ok(())
}

fn dup(m: &mut Machine) -> Result<(), VmError> {
    let top = m.operand_stack.peek().ok_or(VmError::StackUnderflow("dup"))?.clone();
    m.operand_stack.push(top);
    Ok(())
}

fn pop(m: &mut Machine) -> Result<(), VmError> {
    m.operand_stack.pop().ok_or(VmError::StackUnderflow("pop"))?;
    Ok(())
}

fn exch(m: &mut Machine) -> Result<(), VmError> {
    let b = m.operand_stack.pop().ok_or(VmError::StackUnderflow("exch"))?;
    let a = m.operand_stack.pop().ok_or(VmError::StackUnderflow("exch"))?;
    m.operand_stack.push(b);
    m.operand_stack.push(a);
    Ok(())
}

fn print(m: &mut Machine) -> Result<(), VmError> {
    let v = m.operand_stack.pop().ok_or(VmError::StackUnderflow("print"))?;
    println!("{v}");
    Ok(())
}

fn dict(m: &mut Machine) -> Result<(), VmError> {
    m.operand_stack.push(RuntimeInstr::Dict(Rc::new(RefCell::new(BTreeMap::new()))));
    Ok(())
}

fn def(m: &mut Machine) -> Result<(), VmError> {
    let value = m.operand_stack.pop().ok_or(VmError::StackUnderflow("def"))?;
    let key = m.operand_stack.pop().ok_or(VmError::StackUnderflow("def"))?.as_string("def")?;
    m.define(key, value)
}

fn get(m: &mut Machine) -> Result<(), VmError> {
    let key = m.operand_stack.pop().ok_or(VmError::StackUnderflow("get"))?.as_string("get")?;
    let dict = m.operand_stack.pop().ok_or(VmError::StackUnderflow("get"))?.as_dict("get")?;
    let value = dict.borrow().get(&key).cloned().ok_or(VmError::NameNotFound(key))?;
    m.operand_stack.push(value);
    Ok(())
}

fn known(m: &mut Machine) -> Result<(), VmError> {
    let key = m.operand_stack.pop().ok_or(VmError::StackUnderflow("known"))?.as_string("known")?;
    let dict = m.operand_stack.pop().ok_or(VmError::StackUnderflow("known"))?.as_dict("known")?;
    let present = dict.borrow().contains_key(&key);
    m.operand_stack.push(RuntimeInstr::Boolean(present));
    Ok(())
}

fn begin(m: &mut Machine) -> Result<(), VmError> {
    let dict = m.operand_stack.pop().ok_or(VmError::StackUnderflow("begin"))?.as_dict("begin")?;
    m.dictionary_stack.push(DictFrame::User(dict));
    Ok(())
}

fn end(m: &mut Machine) -> Result<(), VmError> {
    if m.dictionary_stack.len() <= 1 {
        return Err(VmError::SystemDictionaryIsImmutable("end".to_string()));
    }
    m.dictionary_stack.pop();
    Ok(())
}

fn currentdict(m: &mut Machine) -> Result<(), VmError> {
    match m.dictionary_stack.peek() {
        Some(DictFrame::User(dict)) => {
            m.operand_stack.push(RuntimeInstr::Dict(dict.clone()));
            Ok(())
        }
        _ => Err(VmError::TypeCheck {
            op: "currentdict",
            expected: "user dict frame",
            found: "system dict frame",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Machine;

    #[test]
    fn dict_begin_def_currentdict_get_round_trip() {
        let mut m = Machine::new();
        dict(&mut m).unwrap();
        begin(&mut m).unwrap();

        m.operand_stack.push(RuntimeInstr::String("x".into()));
        m.operand_stack.push(RuntimeInstr::Number(42.0));
        def(&mut m).unwrap();

        currentdict(&mut m).unwrap();
        m.operand_stack.push(RuntimeInstr::String("x".into()));
        get(&mut m).unwrap();
        match m.operand_stack.pop() {
            Some(RuntimeInstr::Number(n)) => assert_eq!(n, 42.0),
            _ => panic!("expected Number(42.0)"),
        }
    }

    #[test]
    fn known_reports_presence() {
        let mut m = Machine::new();
        dict(&mut m).unwrap();
        m.operand_stack.push(RuntimeInstr::String("missing".into()));
        known(&mut m).unwrap();
        match m.operand_stack.pop() {
            Some(RuntimeInstr::Boolean(false)) => {}
            _ => panic!("expected Boolean(false)"),
        }
    }

    #[test]
    fn end_on_system_frame_alone_errors() {
        let mut m = Machine::new();
        assert!(end(&mut m).is_err());
    }

    #[test]
    fn is_builtin_recognizes_table_entries() {
        assert!(is_builtin("add"));
        assert!(!is_builtin("frobnicate"));
    }
}

//! The VM's own instruction representation.
//!
//! [`toy_store::Instruction`] is the compiler- and linker-facing data
//! model: pure, digestible, serializable. The VM needs one more thing that
//! must never leak into that model — a self-removing trap instruction the
//! debugger splices into a live procedure body to implement step/next
//! (distilled spec §4.7's "BuiltinState"). Giving the trap its own variant
//! here, in a type private to execution, keeps `toy-store` free of any
//! notion of a running `Machine`.

use std::cell::RefCell;
use std::rc::Rc;

use toy_store::{Instruction, InstructionKind};

use crate::machine::Machine;
use crate::VmError;

/// A procedure's body as the VM holds it: shared and mutable, so the
/// debugger can splice a trap into it and have every outstanding reference
/// to that procedure see the change.
pub type Body = Rc<RefCell<Vec<RuntimeInstr>>>;

/// One instruction as the VM executes it.
#[derive(Clone)]
pub enum RuntimeInstr {
    /// A boolean literal.
    Boolean(bool),
    /// A floating point literal.
    Number(f64),
    /// A string literal.
    String(String),
    /// A symbolic reference, resolved against the dictionary stack when
    /// executed.
    Operator(String),
    /// A nested procedure body.
    Procedure(Body),
    /// A user dictionary created by the `dict` builtin.
    Dict(Rc<RefCell<std::collections::BTreeMap<String, RuntimeInstr>>>),
    /// A runtime-only trap. Never produced by the compiler or loader;
    /// spliced in by `toy-debugger` to implement step/next.
    Trap(Rc<Trap>),
}

/// A self-removing breakpoint: firing it interrupts the machine and then
/// deletes itself from the body that contains it, so the next time that
/// procedure runs it runs unobstructed.
pub struct Trap {
    pub(crate) owner: Body,
    pub(crate) index: RefCell<usize>,
}

impl Trap {
    /// Creates a trap that will remove itself from `owner` at `index` the
    /// first time it fires.
    pub fn new(owner: Body, index: usize) -> Self {
        Self {
            owner,
            index: RefCell::new(index),
        }
    }

    /// Interrupts `machine`, then removes this trap from its owning body.
    pub fn fire(&self, machine: &mut Machine) {
        machine.interrupt();
        let index = *self.index.borrow();
        let mut owner = self.owner.borrow_mut();
        if index < owner.len() {
            owner.remove(index);
        }
    }
}

impl RuntimeInstr {
    /// Converts a loaded, debug-reattached [`Instruction`] tree into the
    /// VM's own representation.
    pub fn from_instruction(instr: &Instruction) -> Self {
        match &instr.kind {
            InstructionKind::Boolean(v) => RuntimeInstr::Boolean(*v),
            InstructionKind::Number(v) => RuntimeInstr::Number(*v),
            InstructionKind::String(v) => RuntimeInstr::String(v.clone()),
            InstructionKind::Operator(name) => RuntimeInstr::Operator(name.clone()),
            InstructionKind::Procedure(body) => {
                let converted: Vec<RuntimeInstr> = body.iter().map(RuntimeInstr::from_instruction).collect();
                RuntimeInstr::Procedure(Rc::new(RefCell::new(converted)))
            }
        }
    }

    /// A short, human-readable type name, used in `VmError::TypeCheck`.
    pub fn type_name(&self) -> &'static str {
        match self {
            RuntimeInstr::Boolean(_) => "boolean",
            RuntimeInstr::Number(_) => "number",
            RuntimeInstr::String(_) => "string",
            RuntimeInstr::Operator(_) => "operator",
            RuntimeInstr::Procedure(_) => "procedure",
            RuntimeInstr::Dict(_) => "dict",
            RuntimeInstr::Trap(_) => "trap",
        }
    }

    pub(crate) fn as_number(&self, op: &'static str) -> Result<f64, VmError> {
        match self {
            RuntimeInstr::Number(v) => Ok(*v),
            other => Err(VmError::TypeCheck {
                op,
                expected: "number",
                found: other.type_name(),
            }),
        }
    }

    pub(crate) fn as_dict(&self, op: &'static str) -> Result<Rc<RefCell<std::collections::BTreeMap<String, RuntimeInstr>>>, VmError> {
        match self {
            RuntimeInstr::Dict(d) => Ok(d.clone()),
            other => Err(VmError::TypeCheck {
                op,
                expected: "dict",
                found: other.type_name(),
            }),
        }
    }

    pub(crate) fn as_string(&self, op: &'static str) -> Result<String, VmError> {
        match self {
            RuntimeInstr::String(s) => Ok(s.clone()),
            other => Err(VmError::TypeCheck {
                op,
                expected: "string",
                found: other.type_name(),
            }),
        }
    }
}

impl std::fmt::Display for RuntimeInstr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeInstr::Boolean(v) => write!(f, "{v}"),
            RuntimeInstr::Number(v) => write!(f, "{v}"),
            RuntimeInstr::String(v) => write!(f, "{v}"),
            RuntimeInstr::Operator(name) => write!(f, "/{name}"),
            RuntimeInstr::Procedure(body) => write!(f, "{{ {} instructions }}", body.borrow().len()),
            RuntimeInstr::Dict(d) => write!(f, "<< {} entries >>", d.borrow().len()),
            RuntimeInstr::Trap(_) => write!(f, "<trap>"),
        }
    }
}

//! The stack machine: three LIFO stacks and a fetch-execute loop that runs
//! until the execution stack is empty or something sets the interrupt flag.

use std::collections::BTreeMap;
use std::rc::Rc;

use log::trace;

use crate::builtins;
use crate::runtime::RuntimeInstr;
use crate::stack::Stack;
use crate::VmError;

/// A single frame of the dictionary stack.
pub enum DictFrame {
    /// The one frame every machine starts with: the built-in operator
    /// table. Writes against it always fail — see [`VmError::SystemDictionaryIsImmutable`].
    System(BTreeMap<&'static str, BuiltinFn>),
    /// A user-created dictionary, pushed by the `begin` built-in and
    /// popped by `end`.
    User(Rc<std::cell::RefCell<BTreeMap<String, RuntimeInstr>>>),
}

/// A native operator implementation.
pub type BuiltinFn = fn(&mut Machine) -> Result<(), VmError>;

/// The VM proper.
pub struct Machine {
    /// Values produced and consumed by executing instructions.
    pub operand_stack: Stack<RuntimeInstr>,
    /// Instructions still waiting to execute.
    pub execution_stack: Stack<RuntimeInstr>,
    /// Name resolution scopes, system dictionary at the bottom.
    pub dictionary_stack: Stack<DictFrame>,
    interrupted: bool,
    /// When set, every executed instruction is logged at `trace` level —
    /// backs the `vm --trace` CLI flag.
    pub tracing: bool,
}

impl Machine {
    /// A fresh machine with only the system dictionary on its dictionary
    /// stack and empty operand/execution stacks.
    pub fn new() -> Self {
        let mut dictionary_stack = Stack::new();
        dictionary_stack.push(DictFrame::System(builtins::system_dictionary()));
        Self {
            operand_stack: Stack::new(),
            execution_stack: Stack::new(),
            dictionary_stack,
            interrupted: false,
            tracing: false,
        }
    }

    /// Loads a procedure body onto the execution stack and runs it to
    /// completion (or until interrupted).
    pub fn run(&mut self, entry: &RuntimeInstr) -> Result<(), VmError> {
        match entry {
            RuntimeInstr::Procedure(body) => {
                self.execution_stack.push_all_preserving_order(body.borrow().clone());
            }
            other => self.execution_stack.push(other.clone()),
        }
        self.run_all()
    }

    /// Runs instructions off the execution stack until it is empty or the
    /// interrupt flag is set. Re-entrant: a nested `run_all` called from
    /// inside a built-in (there are none today) would resume where this one
    /// left off once it returns.
    pub fn run_all(&mut self) -> Result<(), VmError> {
        while !self.interrupted {
            let Some(instr) = self.execution_stack.pop() else {
                break;
            };
            self.execute(instr)?;
        }
        Ok(())
    }

    /// Executes a single instruction, possibly in the middle of a
    /// `run_all` loop — used directly by the debugger for single-stepping.
    pub fn execute(&mut self, instr: RuntimeInstr) -> Result<(), VmError> {
        if self.tracing {
            trace!("exec {instr}");
        }
        match instr {
            RuntimeInstr::Boolean(_) | RuntimeInstr::Number(_) | RuntimeInstr::String(_) => {
                self.operand_stack.push(instr);
                Ok(())
            }
            RuntimeInstr::Procedure(_) => {
                self.operand_stack.push(instr);
                Ok(())
            }
            RuntimeInstr::Dict(_) => {
                self.operand_stack.push(instr);
                Ok(())
            }
            RuntimeInstr::Operator(name) => self.invoke(&name),
            RuntimeInstr::Trap(trap) => {
                trap.fire(self);
                Ok(())
            }
        }
    }

    fn invoke(&mut self, name: &str) -> Result<(), VmError> {
        for frame in self.dictionary_stack.iter_top_to_bottom() {
            match frame {
                DictFrame::System(table) => {
                    if let Some(builtin) = table.get(name) {
                        return builtin(self);
                    }
                }
                DictFrame::User(dict) => {
                    let found = dict.borrow().get(name).cloned();
                    if let Some(value) = found {
                        return match value {
                            RuntimeInstr::Procedure(body) => {
                                self.execution_stack.push_all_preserving_order(body.borrow().clone());
                                Ok(())
                            }
                            other => {
                                self.operand_stack.push(other);
                                Ok(())
                            }
                        };
                    }
                }
            }
        }
        Err(VmError::NameNotFound(name.to_string()))
    }

    /// Sets the interrupt flag; consulted between instructions in
    /// [`Machine::run_all`]. The debugger uses this to implement step/next.
    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    /// Clears the interrupt flag so execution can resume.
    pub fn clear_interrupt(&mut self) {
        self.interrupted = false;
    }

    /// Whether the interrupt flag is currently set.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Defines `name` in the current (top) dictionary frame.
    pub fn define(&mut self, name: String, value: RuntimeInstr) -> Result<(), VmError> {
        match self.dictionary_stack.peek_mut() {
            Some(DictFrame::User(dict)) => {
                dict.borrow_mut().insert(name, value);
                Ok(())
            }
            _ => Err(VmError::SystemDictionaryIsImmutable(name)),
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toy_store::{Instruction, InstructionKind};

    #[test]
    fn runs_add_scenario() {
        let proc = Instruction::new(InstructionKind::Procedure(vec![
            Instruction::new(InstructionKind::Number(1.0)),
            Instruction::new(InstructionKind::Number(2.0)),
            Instruction::new(InstructionKind::Operator("add".into())),
        ]));
        let runtime = RuntimeInstr::from_instruction(&proc);

        let mut machine = Machine::new();
        machine.run(&runtime).unwrap();

        match machine.operand_stack.pop() {
            Some(RuntimeInstr::Number(n)) => assert_eq!(n, 3.0),
            other => panic!("expected Number(3.0), got {:?}", other.map(|v| v.type_name())),
        }
    }

    #[test]
    fn undefined_operator_errors() {
        let proc = Instruction::new(InstructionKind::Procedure(vec![Instruction::new(
            InstructionKind::Operator("nope".into()),
        )]));
        let runtime = RuntimeInstr::from_instruction(&proc);
        let mut machine = Machine::new();
        let err = machine.run(&runtime).unwrap_err();
        assert!(matches!(err, VmError::NameNotFound(name) if name == "nope"));
    }

    #[test]
    fn defining_in_system_frame_is_rejected() {
        let mut machine = Machine::new();
        let err = machine.define("x".into(), RuntimeInstr::Number(1.0)).unwrap_err();
        assert!(matches!(err, VmError::SystemDictionaryIsImmutable(_)));
    }
}

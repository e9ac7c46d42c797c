//! The interpreter: dense handler table, fetch/decode/execute step, and the
//! outer run loop.

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use cafe_mem::GuestMemory;
use cafe_ppc::{decode, Instruction, InstructionID};

use crate::hostfpu::{self, FpExceptions};
use crate::state::Core;

mod branch;
mod condition;
mod float;
mod integer;
mod loadstore;
mod paired;
mod system;

/// One opcode's execution semantics.
pub type Handler = fn(&mut Core, &GuestMemory, Instruction);

type KernelCall = Box<dyn Fn(&mut Core) + Send + Sync>;
type InterruptCheck = Box<dyn Fn(&mut Core) + Send + Sync>;

/// Default sentinel return address that stops [`Interpreter::resume`].
pub const CALLBACK_ADDR: u32 = 0xfff1_0000;

/// Model failures: guest code or state the interpreter cannot represent.
/// Guest-visible arithmetic conditions never surface here; they are
/// accumulated in FPSCR/XER/CR instead.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("could not decode instruction at {addr:#010x} = {word:#010x}")]
    InvalidInstruction { addr: u32, word: u32 },
    #[error("unimplemented interpreter instruction {id:?} at {addr:#010x}")]
    UnimplementedInstruction { id: InstructionID, addr: u32 },
    #[error("unregistered kernel call {id:#x} at {addr:#010x}")]
    UnknownKernelCall { id: u32, addr: u32 },
    #[error("handler for {id:?} moved cia from {expected:#010x} to {found:#010x}")]
    CiaMismatch {
        id: InstructionID,
        expected: u32,
        found: u32,
    },
}

/// The process-lifetime owner of the handler table, the kernel-call
/// registry, the interrupt hook and the run-loop sentinel.
///
/// Construction populates the table once; registration methods take
/// `&mut self`, so once the interpreter is shared between threads the
/// tables are immutable by construction.
pub struct Interpreter {
    handlers: [Option<Handler>; InstructionID::COUNT],
    kernel_calls: HashMap<u32, KernelCall>,
    interrupt_check: Option<InterruptCheck>,
    callback_addr: u32,
}

impl Interpreter {
    pub fn new() -> Interpreter {
        let mut interp = Interpreter {
            handlers: [None; InstructionID::COUNT],
            kernel_calls: HashMap::new(),
            interrupt_check: None,
            callback_addr: CALLBACK_ADDR,
        };
        branch::register(&mut interp);
        condition::register(&mut interp);
        float::register(&mut interp);
        integer::register(&mut interp);
        loadstore::register(&mut interp);
        paired::register(&mut interp);
        system::register(&mut interp);
        interp
    }

    pub(crate) fn register(&mut self, id: InstructionID, handler: Handler) {
        debug_assert!(
            self.handlers[id as usize].is_none(),
            "duplicate handler for {id:?}"
        );
        self.handlers[id as usize] = Some(handler);
    }

    pub fn has_instruction(&self, id: InstructionID) -> bool {
        self.handlers[id as usize].is_some()
    }

    pub fn callback_addr(&self) -> u32 {
        self.callback_addr
    }

    pub fn set_callback_addr(&mut self, addr: u32) {
        self.callback_addr = addr;
    }

    /// Installs the hook `resume` runs between steps whenever the core's
    /// interrupt flag is set. The hook owns clearing the flag.
    pub fn set_interrupt_check(&mut self, check: impl Fn(&mut Core) + Send + Sync + 'static) {
        self.interrupt_check = Some(Box::new(check));
    }

    /// Registers the host handler behind bridge-call id `id`. The handler
    /// may swap the architectural context behind its `&mut Core` (that is
    /// how the scheduler migrates a guest thread at the bridge call), but
    /// it must preserve `cia`.
    pub fn register_kernel_call(&mut self, id: u32, call: impl Fn(&mut Core) + Send + Sync + 'static) {
        self.kernel_calls.insert(id, Box::new(call));
    }

    /// Fetch, decode and execute exactly one instruction.
    pub fn step_one(&self, core: &mut Core, mem: &GuestMemory) -> Result<(), CoreError> {
        let cia = core.nia;
        core.cia = cia;
        core.nia = cia.wrapping_add(4);

        let word = mem.read::<u32>(cia);
        let instr = Instruction(word);
        let id = decode(instr).ok_or(CoreError::InvalidInstruction { addr: cia, word })?;

        if id == InstructionID::Kc {
            let call = self
                .kernel_calls
                .get(&instr.kcn())
                .ok_or(CoreError::UnknownKernelCall {
                    id: instr.kcn(),
                    addr: cia,
                })?;
            call(core);
        } else {
            let handler =
                self.handlers[id as usize].ok_or(CoreError::UnimplementedInstruction { id, addr: cia })?;
            handler(core, mem, instr);
        }

        if core.cia != cia {
            return Err(CoreError::CiaMismatch {
                id,
                expected: cia,
                found: core.cia,
            });
        }
        Ok(())
    }

    /// Runs `core` until `nia` reaches the callback sentinel, calling the
    /// interrupt hook between steps while the interrupt flag is set.
    ///
    /// Installs the guest rounding mode on the host FPU and clears host
    /// sticky exceptions before the first step.
    pub fn resume(&self, core: &mut Core, mem: &GuestMemory) -> Result<(), CoreError> {
        float::update_rounding_mode(core);
        hostfpu::clear(FpExceptions::all());

        while core.nia != self.callback_addr {
            if core.interrupt.load(Ordering::Relaxed) {
                if let Some(check) = &self.interrupt_check {
                    check(core);
                }
            }
            self.step_one(core, mem)?;
        }
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

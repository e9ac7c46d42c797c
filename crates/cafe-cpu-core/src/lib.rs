//! Espresso CPU interpreter core.
//!
//! One [`Core`] holds the architectural state of an emulated hardware
//! thread; an [`Interpreter`] owns the immutable handler table, the
//! kernel-call registry and the run-loop configuration, and executes
//! guest code against a shared [`GuestMemory`].
//!
//! ```no_run
//! use cafe_cpu_core::{Core, GuestMemory, Interpreter};
//!
//! let interp = Interpreter::new();
//! let mem = GuestMemory::new(0x100_0000);
//! let mut core = Core::new();
//! core.nia = 0x1000;
//! interp.resume(&mut core, &mem).unwrap();
//! ```

mod fpbits;

pub mod hostfpu;
pub mod interp;
pub mod state;
pub mod time;

pub use cafe_mem::GuestMemory;
pub use interp::{CoreError, Interpreter, CALLBACK_ADDR};
pub use state::Core;

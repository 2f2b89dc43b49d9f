//! rpn-runtime: Machine à pile exécutant le code produit par `rpn-core`
//!
//! ## Modules
//! - `machine` : pile bornée de `f64`, opérateurs, `print` (peek / repeat), sinks.
//! - `exec`    : lecture des instructions générées et exécution ligne à ligne.
//!
//! ```
//! use rpn_runtime::{execute, ExecOptions};
//!
//! let code = "import { Rpn } from '../rpn-vm.js';\nlet rpn = new Rpn();\n\
//!             rpn.push( 8 );\nrpn.push( 3 );\nrpn.subtract();\n";
//! let out = execute(code, &[], ExecOptions::default()).unwrap();
//! assert_eq!(out.stack, vec![5.0]);
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]

pub mod exec;
pub mod machine;

pub use exec::{execute, ExecError, ExecOptions, ExecOutput, Executor, Program};
pub use machine::{
    render, CaptureSink, Machine, PrintMode, RuntimeError, Sink, StdoutSink, DEFAULT_CAPACITY,
    DEFAULT_REPEAT_LIMIT,
};

//! exec.rs: Exécuteur léger du code JavaScript généré (tests / `rpnc run`).
//!
//! Ne comprend que les formes d’instructions émises par le générateur :
//!
//! ```text
//! import { Rpn } from '../rpn-vm.js';   → ignoré
//! let rpn = new Rpn();                  → fixe le nom de l’instance
//! rpn.push( 8 );  rpn.push( a );        → empile un littéral / une variable
//! rpn.add(); … rpn.print(); rpn.pop();  → appel de méthode
//! var c = rpn.pop();                    → liaison de variable
//! // commentaire, ligne vide            → ignorés
//! ```
//!
//! API :
//!   - `execute(code, bindings, ExecOptions) -> Result<ExecOutput, ExecError>`
//!   - `ExecOptions { print_mode, capacity, repeat_limit, max_steps, capture_stdout }`
//!   - `ExecOutput { stdout, steps, stack, bindings }`
//!
//! Chaque erreur porte la ligne (1-based) du code généré fautif.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use log::{debug, trace};
use thiserror::Error;

use crate::machine::{
    CaptureSink, Machine, PrintMode, RuntimeError, Sink, StdoutSink, DEFAULT_CAPACITY,
    DEFAULT_REPEAT_LIMIT,
};

/* ───────────────────────────── Erreurs ───────────────────────────── */

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    #[error("ligne {line}: {source}")]
    Runtime {
        line: u32,
        #[source]
        source: RuntimeError,
    },

    #[error("ligne {line}: variable non liée `{name}`")]
    UnboundVariable { line: u32, name: String },

    #[error("ligne {line}: instruction non supportée `{text}`")]
    UnsupportedStatement { line: u32, text: String },

    #[error("ligne {line}: littéral numérique invalide `{text}`")]
    InvalidLiteral { line: u32, text: String },

    #[error("ligne {line}: limite d’instructions atteinte ({limit})")]
    StepLimit { line: u32, limit: usize },
}

impl ExecError {
    /// Ligne du code généré (1-based).
    pub fn line(&self) -> u32 {
        match self {
            ExecError::Runtime { line, .. }
            | ExecError::UnboundVariable { line, .. }
            | ExecError::UnsupportedStatement { line, .. }
            | ExecError::InvalidLiteral { line, .. }
            | ExecError::StepLimit { line, .. } => *line,
        }
    }

    /// Erreur runtime sous-jacente, s’il y en a une.
    pub fn runtime(&self) -> Option<&RuntimeError> {
        match self {
            ExecError::Runtime { source, .. } => Some(source),
            _ => None,
        }
    }
}

/* ───────────────────────────── Programme ───────────────────────────── */

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Variable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Add,
    Subtract,
    Multiply,
    Divide,
    Print,
    Pop,
}

impl Method {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "add" => Method::Add,
            "subtract" => Method::Subtract,
            "multiply" => Method::Multiply,
            "divide" => Method::Divide,
            "print" => Method::Print,
            "pop" => Method::Pop,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Import,
    Instantiate { instance: String },
    Push(Operand),
    Call(Method),
    Bind { name: String },
}

/// Instructions exécutables, chacune avec sa ligne d’origine dans le code généré.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<(u32, Statement)>,
}

impl Program {
    pub fn parse(code: &str) -> Result<Self, ExecError> {
        let mut statements = Vec::new();
        let mut instance: Option<String> = None;

        for (index, raw) in code.lines().enumerate() {
            let line = u32::try_from(index + 1).unwrap_or(u32::MAX);
            if let Some(stmt) = parse_statement(raw, line, instance.as_deref())? {
                if let Statement::Instantiate { instance: name } = &stmt {
                    instance = Some(name.clone());
                }
                statements.push((line, stmt));
            }
        }
        Ok(Self { statements })
    }
}

fn parse_statement(
    raw: &str,
    line: u32,
    instance: Option<&str>,
) -> Result<Option<Statement>, ExecError> {
    let text = raw.trim();
    if text.is_empty() || text.starts_with("//") {
        return Ok(None);
    }
    let unsupported = || ExecError::UnsupportedStatement { line, text: text.to_owned() };
    let body = text.strip_suffix(';').ok_or_else(unsupported)?.trim_end();

    if let Some(rest) = body.strip_prefix("import ") {
        return if rest.contains(" from ") {
            Ok(Some(Statement::Import))
        } else {
            Err(unsupported())
        };
    }

    if let Some(rest) = body.strip_prefix("let ") {
        let (name, rhs) = rest.split_once('=').ok_or_else(unsupported)?;
        let rhs = rhs.trim();
        if !(rhs.starts_with("new ") && rhs.ends_with("()")) {
            return Err(unsupported());
        }
        return Ok(Some(Statement::Instantiate { instance: name.trim().to_owned() }));
    }

    let Some(instance) = instance else {
        return Err(unsupported());
    };

    if let Some(rest) = body.strip_prefix("var ") {
        let (name, rhs) = rest.split_once('=').ok_or_else(unsupported)?;
        if rhs.trim() != format!("{instance}.pop()") {
            return Err(unsupported());
        }
        return Ok(Some(Statement::Bind { name: name.trim().to_owned() }));
    }

    let call = body
        .strip_prefix(instance)
        .and_then(|r| r.strip_prefix('.'))
        .ok_or_else(unsupported)?;
    let (method, args) = call.split_once('(').ok_or_else(unsupported)?;
    let args = args.strip_suffix(')').ok_or_else(unsupported)?.trim();

    if method == "push" {
        return operand(args, line).map(|o| Some(Statement::Push(o)));
    }
    match Method::from_name(method) {
        Some(m) if args.is_empty() => Ok(Some(Statement::Call(m))),
        _ => Err(unsupported()),
    }
}

fn operand(text: &str, line: u32) -> Result<Operand, ExecError> {
    let first = text.chars().next();
    if first.is_some_and(|c| c.is_ascii_digit()) {
        return text
            .parse::<f64>()
            .map(Operand::Number)
            .map_err(|_| ExecError::InvalidLiteral { line, text: text.to_owned() });
    }
    if first.is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$') {
        return Ok(Operand::Variable(text.to_owned()));
    }
    Err(ExecError::InvalidLiteral { line, text: text.to_owned() })
}

/* ───────────────────────────── Exécution ───────────────────────────── */

#[derive(Debug, Clone)]
pub struct ExecOptions {
    pub print_mode: PrintMode,
    /// Capacité de la pile.
    pub capacity: usize,
    /// Copies maximales affichées par un `print` en mode repeat.
    pub repeat_limit: usize,
    /// Garde-fou : nombre maximal d’instructions exécutées.
    pub max_steps: Option<usize>,
    /// Capture les `print` dans un buffer ; sinon, écrit sur stdout réel.
    pub capture_stdout: bool,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            print_mode: PrintMode::Peek,
            capacity: DEFAULT_CAPACITY,
            repeat_limit: DEFAULT_REPEAT_LIMIT,
            max_steps: Some(1_000_000),
            capture_stdout: true,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExecOutput {
    pub stdout: String,
    pub steps: usize,
    /// Pile restante, du fond vers le sommet.
    pub stack: Vec<f64>,
    pub bindings: BTreeMap<String, f64>,
}

/// Parse puis exécute `code` avec des liaisons initiales.
pub fn execute(
    code: &str,
    bindings: &[(&str, f64)],
    opts: ExecOptions,
) -> Result<ExecOutput, ExecError> {
    let program = Program::parse(code)?;
    let mut ex = Executor::new(opts);
    for (name, value) in bindings {
        ex.bind(*name, *value);
    }
    ex.run(&program)
}

pub struct Executor {
    machine: Machine,
    bindings: BTreeMap<String, f64>,
    steps: usize,
    opts: ExecOptions,
}

impl Executor {
    pub fn new(opts: ExecOptions) -> Self {
        Self {
            machine: Machine::new(opts.capacity, opts.print_mode)
                .with_repeat_limit(opts.repeat_limit),
            bindings: BTreeMap::new(),
            steps: 0,
            opts,
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, value: f64) {
        self.bindings.insert(name.into(), value);
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Exécute `program` ; la sortie suit `capture_stdout`.
    pub fn run(mut self, program: &Program) -> Result<ExecOutput, ExecError> {
        let stdout = if self.opts.capture_stdout {
            let mut sink = CaptureSink::default();
            self.run_with(program, &mut sink)?;
            sink.text()
        } else {
            self.run_with(program, &mut StdoutSink)?;
            String::new()
        };
        Ok(ExecOutput {
            stdout,
            steps: self.steps,
            stack: self.machine.stack().to_vec(),
            bindings: self.bindings,
        })
    }

    /// Exécute `program` vers un `sink` fourni par l’appelant.
    pub fn run_with(&mut self, program: &Program, sink: &mut dyn Sink) -> Result<(), ExecError> {
        for (line, stmt) in &program.statements {
            let line = *line;
            self.steps += 1;
            if let Some(limit) = self.opts.max_steps {
                if self.steps > limit {
                    return Err(ExecError::StepLimit { line, limit });
                }
            }
            trace!("ligne {line}: {stmt:?}");
            self.step(line, stmt, sink)?;
        }
        debug!("{} instruction(s) exécutée(s), pile = {:?}", self.steps, self.machine.stack());
        Ok(())
    }

    fn step(&mut self, line: u32, stmt: &Statement, sink: &mut dyn Sink) -> Result<(), ExecError> {
        let rt = |source: RuntimeError| ExecError::Runtime { line, source };
        match stmt {
            Statement::Import | Statement::Instantiate { .. } => Ok(()),
            Statement::Push(Operand::Number(n)) => self.machine.push(*n).map_err(rt),
            Statement::Push(Operand::Variable(name)) => {
                let value = *self
                    .bindings
                    .get(name)
                    .ok_or_else(|| ExecError::UnboundVariable { line, name: name.clone() })?;
                self.machine.push(value).map_err(rt)
            }
            Statement::Call(method) => {
                let result = match method {
                    Method::Add => self.machine.add(),
                    Method::Subtract => self.machine.subtract(),
                    Method::Multiply => self.machine.multiply(),
                    Method::Divide => self.machine.divide(),
                    Method::Print => self.machine.print(sink),
                    Method::Pop => self.machine.pop().map(|_| ()),
                };
                result.map_err(rt)
            }
            Statement::Bind { name } => {
                let value = self.machine.pop().map_err(rt)?;
                self.bindings.insert(name.clone(), value);
                Ok(())
            }
        }
    }
}

/* ───────────────────────────── Tests ───────────────────────────── */

//! machine.rs: Machine à pile du code généré (`rpn.push( 8 ); rpn.subtract(); …`).
//!
//! Pile bornée de `f64`. Les opérateurs binaires dépilent **d’abord l’opérande
//! droite** : `push(8); push(3); subtract()` laisse `5`.
//!
//! Deux saveurs de `print` :
//!   - [`PrintMode::Peek`]   : affiche le sommet et le laisse en place ;
//!   - [`PrintMode::Repeat`] : dépile un nombre de répétitions puis la valeur,
//!     affichée autant de fois (au plus `repeat_limit` copies par appel).
//!
//! L’affichage passe par un [`Sink`] (capture mémoire ou stdout).

#![forbid(unsafe_code)]

use std::fmt;
use std::io::{self, Write};

use log::trace;
use thiserror::Error;

/// Capacité par défaut de la pile.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Nombre maximal de copies affichées par un `print` en mode repeat.
pub const DEFAULT_REPEAT_LIMIT: usize = 10_000;

/* ───────────────────────────── Erreurs ───────────────────────────── */

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("impossible de dépiler : pile vide")]
    EmptyStack,

    #[error("débordement de pile (capacité {capacity})")]
    StackOverflow { capacity: usize },

    #[error("division par 0")]
    DivisionByZero,

    #[error("la valeur affichée doit être entière, reçu {0}")]
    NonIntegral(f64),

    #[error("le nombre de répétitions doit être > 0, reçu {0}")]
    NonPositiveRepeat(f64),

    #[error("trop de répétitions : {count} (limite {limit})")]
    RepeatLimit { count: f64, limit: usize },
}

/* ───────────────────────────── Affichage ───────────────────────────── */

/// Destination des `print`.
pub trait Sink {
    fn display(&mut self, text: &str);
}

/// Accumule chaque affichage, une ligne par valeur.
#[derive(Debug, Default, Clone)]
pub struct CaptureSink {
    pub lines: Vec<String>,
}

impl CaptureSink {
    /// Texte capturé, `\n` après chaque ligne.
    pub fn text(&self) -> String {
        self.lines.iter().map(|l| format!("{l}\n")).collect()
    }
}

impl Sink for CaptureSink {
    fn display(&mut self, text: &str) {
        self.lines.push(text.to_owned());
    }
}

/// Écrit directement sur stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn display(&mut self, text: &str) {
        let mut out = io::stdout().lock();
        // Une sortie fermée (pipe) ne doit pas interrompre l’exécution.
        let _ = writeln!(out, "{text}");
    }
}

/// Rendu d’un nombre comme `Number.prototype.toString` en JavaScript :
/// `5`, `2.5`, `Infinity`, et notation exponentielle hors de `[1e-6, 1e21[`
/// (`1e+21`, `1.5e-7`).
pub fn render(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "Infinity".into() } else { "-Infinity".into() };
    }
    if value == 0.0 {
        return "0".into();
    }
    let magnitude = value.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let text = format!("{value:e}");
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => text,
        };
    }
    format!("{value}")
}

/* ───────────────────────────── Machine ───────────────────────────── */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintMode {
    #[default]
    Peek,
    Repeat,
}

impl fmt::Display for PrintMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrintMode::Peek => "peek",
            PrintMode::Repeat => "repeat",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Machine {
    stack: Vec<f64>,
    capacity: usize,
    print_mode: PrintMode,
    repeat_limit: usize,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, PrintMode::Peek)
    }
}

impl Machine {
    pub fn new(capacity: usize, print_mode: PrintMode) -> Self {
        Self {
            stack: Vec::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
            print_mode,
            repeat_limit: DEFAULT_REPEAT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_repeat_limit(mut self, limit: usize) -> Self {
        self.repeat_limit = limit;
        self
    }

    pub fn stack(&self) -> &[f64] {
        &self.stack
    }

    pub fn print_mode(&self) -> PrintMode {
        self.print_mode
    }

    pub fn push(&mut self, value: f64) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.capacity {
            return Err(RuntimeError::StackOverflow { capacity: self.capacity });
        }
        self.stack.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<f64, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::EmptyStack)
    }

    pub fn top(&self) -> Result<f64, RuntimeError> {
        self.stack.last().copied().ok_or(RuntimeError::EmptyStack)
    }

    pub fn add(&mut self) -> Result<(), RuntimeError> {
        self.binary(|l, r| Ok(l + r))
    }

    pub fn subtract(&mut self) -> Result<(), RuntimeError> {
        self.binary(|l, r| Ok(l - r))
    }

    pub fn multiply(&mut self) -> Result<(), RuntimeError> {
        self.binary(|l, r| Ok(l * r))
    }

    pub fn divide(&mut self) -> Result<(), RuntimeError> {
        self.binary(|l, r| if r == 0.0 { Err(RuntimeError::DivisionByZero) } else { Ok(l / r) })
    }

    /// Affiche selon le [`PrintMode`] de la machine.
    pub fn print(&mut self, sink: &mut dyn Sink) -> Result<(), RuntimeError> {
        match self.print_mode {
            PrintMode::Peek => {
                let value = integral(self.top()?)?;
                sink.display(&render(value));
            }
            PrintMode::Repeat => {
                let repeat = self.pop()?;
                if repeat.is_nan() || repeat <= 0.0 {
                    return Err(RuntimeError::NonPositiveRepeat(repeat));
                }
                // Un compte fractionnaire affiche une copie de plus (`2.5` → 3).
                let mut copies = 0usize;
                let mut left = repeat;
                while left > 0.0 {
                    if copies == self.repeat_limit {
                        let limit = self.repeat_limit;
                        return Err(RuntimeError::RepeatLimit { count: repeat, limit });
                    }
                    copies += 1;
                    left -= 1.0;
                }
                let value = integral(self.pop()?)?;
                let text = render(value);
                for _ in 0..copies {
                    sink.display(&text);
                }
            }
        }
        Ok(())
    }

    /// Dépile droite puis gauche, empile `f(gauche, droite)`.
    fn binary(
        &mut self,
        f: impl FnOnce(f64, f64) -> Result<f64, RuntimeError>,
    ) -> Result<(), RuntimeError> {
        let right = self.pop()?;
        let left = self.pop()?;
        let result = f(left, right)?;
        trace!("{left} ∘ {right} = {result}");
        self.push(result)
    }
}

fn integral(value: f64) -> Result<f64, RuntimeError> {
    if value.floor() == value {
        Ok(value)
    } else {
        Err(RuntimeError::NonIntegral(value))
    }
}

/* ───────────────────────────── Tests ───────────────────────────── */

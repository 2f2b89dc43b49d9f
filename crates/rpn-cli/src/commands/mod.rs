//! Sous-commandes de `rpnc`.

pub mod build;
pub mod map;
pub mod run;

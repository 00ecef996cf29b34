//! Simulador de sinais vitais para os residentes do asilo.
//!
//! Gera batimentos cardíacos plausíveis conforme a hora do dia, injeta
//! eventos críticos ocasionais e envia tudo para a API externa.

pub mod api;
pub mod config;
pub mod error;
pub mod kernel;
pub mod simulation;
pub mod tasks;
pub mod utils;

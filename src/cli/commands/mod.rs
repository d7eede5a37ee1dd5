pub mod check;
pub mod claude;
pub mod codex;
pub mod settings;

//! Walkabout sample programs.
//!
//! Three programs share one runner: `template` opens a window and clears it,
//! `walker` animates a side-view character from the keyboard, and `scripted`
//! animates a top-down character whose movement comes from a Lua script.

pub mod config;
pub mod lua_bridge;
pub mod program;
pub mod runner;
pub mod template;
pub mod topdown;
pub mod walker;

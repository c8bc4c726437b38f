//! Extron DXP Simulation Library
//!
//! This crate provides a virtual DXP HD 4K Plus switcher for exercising the
//! controller without hardware. It includes:
//!
//! - **VirtualSwitcher**: in-memory switcher answering SIS command lines
//! - **run_virtual_switcher**: TCP server that exposes a switcher on a socket
//!
//! # Example
//!
//! ```rust
//! use dxp_protocol::DxpModel;
//! use dxp_sim::VirtualSwitcher;
//!
//! let mut switcher = VirtualSwitcher::new(DxpModel::Dxp88);
//!
//! assert_eq!(switcher.process_line("4*2!"), vec!["Out02 In04 All"]);
//! assert_eq!(switcher.tie(2), Some(4));
//! ```

pub mod error;
pub mod server;
pub mod switcher;

pub use error::SimError;
pub use server::{
    run_virtual_switcher, spawn_switcher, spawn_virtual_switcher, SwitcherCommand, SwitcherHandle,
};
pub use switcher::VirtualSwitcher;

//! Core library for the custos-tools command line application.
//!
//! The library consolidates dated cost reports into a single workbook. The
//! modules keep responsibilities narrow and composable: folder discovery lives
//! in [`custos::tools::scan`], IO adapters under [`custos::tools::io`], row
//! representations inside [`custos::tools::model`], the product pivot in
//! [`custos::tools::consolidate`], sheet layout in [`custos::tools::flatten`],
//! and the end-to-end orchestration under [`custos::tools::sync`].

pub mod custos;

pub use custos::tools::{Result, ToolError, consolidate, error, flatten, io, model, scan, sync};

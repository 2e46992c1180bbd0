//! Files the binary writes after a run.
//!
//! # Submodules
//!
//! - [`json`]: writes the [`Digest`](crate::models::Digest) to a dated edition file
//! - [`seen`]: loads and rewrites the caller-owned seen-set file
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! ├── 2025-10-18/
//! │   ├── morning.json
//! │   ├── afternoon.json
//! │   └── evening.json
//!
//! seen.json                  # JSON array of every URL already delivered
//! ```

pub mod json;
pub mod seen;

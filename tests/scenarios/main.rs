//! End-to-end coalescer scenarios through the `coalesce` facade.
//!
//! - `ledger`: concurrent transfers with rollback and resubmission
//! - `config_file`: coalescers built from `coalesce.toml`
//! - `readers`: committed snapshots never expose a partial batch

#[path = "../common/mod.rs"]
mod common;

mod ledger;
mod readers;

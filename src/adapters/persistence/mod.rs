//! Persistence Adapters - Observation Storage
//!
//! Implements the ObservationSink port:
//! - `SupabaseSink`: one row per tick into a Supabase (PostgREST) table
//! - `JsonlSink`: append-only daily JSONL files, no database needed

pub mod jsonl;
pub mod row;
pub mod supabase;

pub use jsonl::JsonlSink;
pub use row::ObservationRow;
pub use supabase::SupabaseSink;

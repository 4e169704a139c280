// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the system works
// with. No Burn types, no file IO.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A labelled clip of stacked frames and optional optical flow
pub mod clip;

// Per-epoch metrics history stored in every checkpoint
pub mod history;

// Dataset source abstraction
pub mod traits;

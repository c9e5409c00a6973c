// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types and traits that describe the problem:
// a labelled news record, the error taxonomy, and the two
// seams the data layer is built around.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// A labelled news record read from the input file
pub mod record;

// The error taxonomy shared by every layer below the CLI
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;

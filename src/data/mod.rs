// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// From a JSON-lines file to device-resident tensor batches:
//
//   records.jsonl
//       │
//       ▼
//   JsonLinesLoader   → NewsRecord { sequence, text, label }
//       │
//       ▼
//   SequenceDataset   → topic matrix computed once per record
//       │               (implements Burn's Dataset trait)
//       ▼
//   NewsBatcher       → pads to the longest sequence, stacks
//       │               into tensors on the target device
//       ▼
//   BatchLoader       → Burn DataLoader with drop-last
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads labelled records from JSON lines
pub mod loader;

/// Implements Burn's Dataset trait for news items
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Full-batch-only iteration over a dataset
pub mod dataloader;

// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Everything that touches disk on behalf of the other layers:
//
//   checkpoint.rs    - per-epoch model + optimizer snapshots
//                      (Burn full-precision records in a
//                      bincode envelope)
//
//   config.rs        - the JSON config file, strictly parsed
//                      into an immutable model config
//
//   metrics.rs       - epoch-level CSV log next to the
//                      checkpoints
//
//   topic_feature.rs - the frozen pretrained topic model

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Config file parsing and validation
pub mod config;

/// Training metrics CSV logger
pub mod metrics;

/// Pretrained topic-feature extractor
pub mod topic_feature;

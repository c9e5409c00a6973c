// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// Everything that builds, trains or runs the network:
//
//   model.rs     - GRU text encoder + CNN topic encoder,
//                  fused and classified by a small MLP
//
//   hidden.rs    - the shared initial hidden state, zeroed
//                  before every batch
//
//   grad.rs      - global gradient L2-norm clipping
//
//   trainer.rs   - the training loop: forward, loss,
//                  backward, clip, Adam step, per-epoch
//                  checkpoint
//
//   evaluator.rs - one inference pass and the per-class
//                  accuracy accounting
//
//   backend.rs   - CPU / GPU backend choice
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Fake-news detection network
pub mod model;

/// Recurrent initial state buffer
pub mod hidden;

/// Gradient-norm clipping across all parameters
pub mod grad;

/// Training loop with per-epoch checkpointing
pub mod trainer;

/// Evaluation pass and accuracy report
pub mod evaluator;

/// Backend aliases and device selection
pub mod backend;

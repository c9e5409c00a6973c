// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Coordinates the other layers for one run: training or
// evaluation. No tensor math here and no argument parsing;
// each use case receives plain paths and numbers plus the
// device to run on.

// Config + topic feature + records → dataset
pub mod prepare;

// The training workflow
pub mod train_use_case;

// The evaluation workflow
pub mod evaluate_use_case;

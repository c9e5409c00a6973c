// ============================================================
// Layer 5 - Evaluation Loop
// ============================================================
// One inference pass over the evaluation set. The model lives
// on the inner (non-autodiff) backend, so no gradients are
// tracked and no parameter can change.
//
// Accounting is asymmetric but ends up uniform: both buckets
// store 1 for a correct prediction and 0 for a wrong one.
//
//   true label │ predicted │ bucket │ bit
//   ───────────┼───────────┼────────┼────
//        1     │     1     │ true   │  1
//        1     │     0     │ true   │  0
//        0     │     1     │ false  │  0
//        0     │     0     │ false  │  1

use std::fmt;

use burn::{prelude::*, tensor::activation::softmax};

use crate::data::dataloader::BatchLoader;
use crate::domain::error::{DetectError, DetectResult};
use crate::ml::{hidden::HiddenState, model::DetectModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    True,
    False,
}

impl Bucket {
    fn name(self) -> &'static str {
        match self {
            Bucket::True => "true",
            Bucket::False => "false",
        }
    }
}

/// Route one prediction to its bucket with a correctness bit.
/// Labels other than 0/1 are not counted; a prediction outside
/// 0/1 is simply wrong.
pub fn classify(true_label: i64, predicted: i64) -> Option<(Bucket, u8)> {
    match true_label {
        1 => Some((Bucket::True, u8::from(predicted == 1))),
        0 => Some((Bucket::False, u8::from(predicted == 0))),
        _ => None,
    }
}

/// Correct/total counts for one ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub correct: usize,
    pub total:   usize,
    bucket:      &'static str,
}

impl Tally {
    fn from_bits(bits: &[u8], bucket: &'static str) -> Self {
        Self {
            correct: bits.iter().map(|&b| b as usize).sum(),
            total: bits.len(),
            bucket,
        }
    }

    pub fn ratio(&self) -> DetectResult<f64> {
        if self.total == 0 {
            return Err(DetectError::DivisionByZero { bucket: self.bucket });
        }
        Ok(self.correct as f64 / self.total as f64)
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ratio() {
            Ok(r) => write!(f, "{}/{} ({:.4})", self.correct, self.total, r),
            Err(_) => write!(f, "{}/{} (undefined)", self.correct, self.total),
        }
    }
}

/// The two correctness sequences built during a pass
#[derive(Debug, Default, Clone)]
pub struct AccuracyAccumulator {
    true_bits:  Vec<u8>,
    false_bits: Vec<u8>,
}

impl AccuracyAccumulator {
    pub fn record(&mut self, true_label: i64, predicted: i64) {
        match classify(true_label, predicted) {
            Some((Bucket::True, bit)) => self.true_bits.push(bit),
            Some((Bucket::False, bit)) => self.false_bits.push(bit),
            None => tracing::debug!("Ignoring record with label {true_label}"),
        }
    }

    pub fn report(&self) -> AccuracyReport {
        let combined: Vec<u8> = self.true_bits.iter().chain(&self.false_bits).copied().collect();
        AccuracyReport {
            true_class:  Tally::from_bits(&self.true_bits, Bucket::True.name()),
            false_class: Tally::from_bits(&self.false_bits, Bucket::False.name()),
            overall:     Tally::from_bits(&combined, "any class"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccuracyReport {
    pub true_class:  Tally,
    pub false_class: Tally,
    pub overall:     Tally,
}

impl AccuracyReport {
    /// Diagnostics for every ratio that cannot be computed
    pub fn missing_classes(&self) -> Vec<DetectError> {
        [self.true_class, self.false_class]
            .iter()
            .filter_map(|t| t.ratio().err())
            .collect()
    }
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "True acc: {}", self.true_class)?;
        writeln!(f, "False acc: {}", self.false_class)?;
        write!(f, "Total acc: {}", self.overall)
    }
}

pub struct Evaluator<B: Backend> {
    hidden: HiddenState<B>,
}

impl<B: Backend> Evaluator<B> {
    pub fn new(rnn_layers: usize, batch_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            hidden: HiddenState::new(rnn_layers, batch_size, hidden_size, device),
        }
    }

    /// Run every full batch through `model` and tally the predictions
    pub fn evaluate(&mut self, model: &DetectModel<B>, loader: &BatchLoader<B>) -> DetectResult<AccuracyReport> {
        let mut acc = AccuracyAccumulator::default();

        for (step, batch) in loader.iter().enumerate() {
            let h0 = self.hidden.reset_for(batch.len())?;
            let logits = model.forward(batch.sequences, batch.topics, h0)?;
            let predicted = softmax(logits, 1).argmax(1);

            let predicted: Vec<i64> = predicted.into_data().iter::<i64>().collect();
            let labels: Vec<i64> = batch.labels.into_data().iter::<i64>().collect();
            for (t, p) in labels.into_iter().zip(predicted) {
                acc.record(t, p);
            }
            tracing::debug!("Evaluated batch {}", step);
        }

        Ok(acc.report())
    }
}

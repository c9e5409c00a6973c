use burn::prelude::*;

use crate::domain::error::{DetectError, DetectResult};

/// The recurrent initial state shared by every batch of a loop.
///
/// Owned by the loop driver and built once for a fixed batch size.
/// It is zeroed before each forward pass, so no signal leaks from
/// one batch into the next.
#[derive(Debug)]
pub struct HiddenState<B: Backend> {
    buffer: Tensor<B, 3>,
}

impl<B: Backend> HiddenState<B> {
    /// h0: [rnn_layers, batch_size, hidden_size]
    pub fn new(rnn_layers: usize, batch_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            buffer: Tensor::zeros([rnn_layers, batch_size, hidden_size], device),
        }
    }

    /// Zero the buffer and hand out the state for a batch of `batch_size`.
    ///
    /// The buffer is sized once; a batch of any other size is rejected
    /// rather than silently resized.
    pub fn reset_for(&mut self, batch_size: usize) -> DetectResult<Tensor<B, 3>> {
        let [layers, expected, hidden] = self.buffer.dims();
        if batch_size != expected {
            return Err(DetectError::shape(
                "hidden state batch",
                &[layers, expected, hidden],
                &[layers, batch_size, hidden],
            ));
        }
        self.buffer = self.buffer.zeros_like();
        Ok(self.buffer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_reset_yields_all_zero_state() {
        let device = Default::default();
        let mut state = HiddenState::<TestBackend>::new(2, 4, 3, &device);

        // Dirty the buffer the way a careless caller might
        state.buffer = Tensor::ones([2, 4, 3], &device);

        let h0 = state.reset_for(4).unwrap();
        assert_eq!(h0.dims(), [2, 4, 3]);
        let values = h0.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_rejects_other_batch_size() {
        let mut state = HiddenState::<TestBackend>::new(1, 32, 8, &Default::default());
        let err = state.reset_for(3).unwrap_err();
        assert!(matches!(err, DetectError::Shape { .. }));
        assert_eq!(state.reset_for(32).unwrap().dims(), [1, 32, 8]);
    }
}

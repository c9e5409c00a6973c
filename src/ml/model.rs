use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        gru::{Gru, GruConfig},
        Linear, LinearConfig, PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::domain::error::{DetectError, DetectResult};

/// Width of every topic convolution kernel. Odd, so same-padding keeps
/// the spatial extent equal to `height`.
const TOPIC_KERNEL: usize = 3;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally - do NOT add them again or you get conflicting impls.
#[derive(Config, Debug, PartialEq)]
pub struct DetectModelConfig {
    pub input_size:         usize,
    pub hidden_size:        usize,
    pub rnn_layers:         usize,
    pub out_channels:       usize,
    pub height:             usize,
    pub cnn_layers:         usize,
    pub topic_size:         usize,
    pub linear_hidden_size: usize,
    pub linear_layers:      usize,
    pub output_size:        usize,
}

impl DetectModelConfig {
    /// Every dimension must be positive and the head must produce at least
    /// two classes for cross-entropy to make sense.
    pub fn validate(&self) -> DetectResult<()> {
        let dims = [
            ("input_size",         self.input_size),
            ("hidden_size",        self.hidden_size),
            ("rnn_layers",         self.rnn_layers),
            ("out_channels",       self.out_channels),
            ("height",             self.height),
            ("cnn_layers",         self.cnn_layers),
            ("topic_size",         self.topic_size),
            ("linear_hidden_size", self.linear_hidden_size),
            ("linear_layers",      self.linear_layers),
            ("output_size",        self.output_size),
        ];
        if let Some((name, _)) = dims.iter().find(|(_, v)| *v == 0) {
            return Err(DetectError::InvalidConfig(format!("model.{name} must be positive")));
        }
        if self.output_size < 2 {
            return Err(DetectError::InvalidConfig(
                "model.output_size must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    /// Width of the fused representation fed to the classification head
    pub fn fused_size(&self) -> usize {
        self.hidden_size + self.out_channels * self.height
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> DetectResult<DetectModel<B>> {
        self.validate()?;

        let rnn: Vec<Gru<B>> = (0..self.rnn_layers)
            .map(|layer| {
                let d_input = if layer == 0 { self.input_size } else { self.hidden_size };
                GruConfig::new(d_input, self.hidden_size, true).init(device)
            })
            .collect();

        let cnn: Vec<Conv1d<B>> = (0..self.cnn_layers)
            .map(|layer| {
                let channels_in = if layer == 0 { self.topic_size } else { self.out_channels };
                Conv1dConfig::new(channels_in, self.out_channels, TOPIC_KERNEL)
                    .with_padding(PaddingConfig1d::Same)
                    .init(device)
            })
            .collect();

        let head = self.build_head(device);

        Ok(DetectModel {
            rnn,
            cnn,
            head,
            input_size:   self.input_size,
            hidden_size:  self.hidden_size,
            rnn_layers:   self.rnn_layers,
            topic_size:   self.topic_size,
            height:       self.height,
            out_channels: self.out_channels,
        })
    }

    // fused → [linear_hidden_size]* → output_size
    fn build_head<B: Backend>(&self, device: &B::Device) -> Vec<Linear<B>> {
        let mut widths = vec![self.fused_size()];
        widths.extend(std::iter::repeat(self.linear_hidden_size).take(self.linear_layers - 1));
        widths.push(self.output_size);
        widths
            .windows(2)
            .map(|w| LinearConfig::new(w[0], w[1]).init(device))
            .collect()
    }
}

/// GRU encoder over the token sequence, CNN encoder over the topic matrix,
/// concatenated and classified by a small MLP.
#[derive(Module, Debug)]
pub struct DetectModel<B: Backend> {
    pub rnn:          Vec<Gru<B>>,
    pub cnn:          Vec<Conv1d<B>>,
    pub head:         Vec<Linear<B>>,
    pub input_size:   usize,
    pub hidden_size:  usize,
    pub rnn_layers:   usize,
    pub topic_size:   usize,
    pub height:       usize,
    pub out_channels: usize,
}

impl<B: Backend> DetectModel<B> {
    /// sequences: [batch, len, input_size]
    /// topics:    [batch, topic_size, height]
    /// h0:        [rnn_layers, batch, hidden_size]
    /// → logits:  [batch, output_size]
    pub fn forward(
        &self,
        sequences: Tensor<B, 3>,
        topics:    Tensor<B, 3>,
        h0:        Tensor<B, 3>,
    ) -> DetectResult<Tensor<B, 2>> {
        let [batch, seq_len, input_size] = sequences.dims();
        if input_size != self.input_size || seq_len == 0 {
            return Err(DetectError::shape(
                "sequences",
                &[batch, seq_len.max(1), self.input_size],
                &[batch, seq_len, input_size],
            ));
        }
        let topic_dims = topics.dims();
        if topic_dims != [batch, self.topic_size, self.height] {
            return Err(DetectError::shape(
                "topics",
                &[batch, self.topic_size, self.height],
                &topic_dims,
            ));
        }
        let h0_dims = h0.dims();
        if h0_dims != [self.rnn_layers, batch, self.hidden_size] {
            return Err(DetectError::shape(
                "hidden state",
                &[self.rnn_layers, batch, self.hidden_size],
                &h0_dims,
            ));
        }

        let text_repr = self.encode_sequence(sequences, h0, batch, seq_len);
        let topic_repr = self.encode_topics(topics, batch);

        let mut x = Tensor::cat(vec![text_repr, topic_repr], 1);
        let last = self.head.len() - 1;
        for (i, linear) in self.head.iter().enumerate() {
            x = linear.forward(x);
            if i < last {
                x = relu(x);
            }
        }
        Ok(x)
    }

    // Stacked GRU; each layer starts from its own slice of h0.
    // Returns the top layer's hidden state at the final time step.
    fn encode_sequence(
        &self,
        sequences: Tensor<B, 3>,
        h0:        Tensor<B, 3>,
        batch:     usize,
        seq_len:   usize,
    ) -> Tensor<B, 2> {
        let hidden = self.hidden_size;
        let mut x = sequences;
        for (layer, gru) in self.rnn.iter().enumerate() {
            let state = h0
                .clone()
                .slice([layer..layer + 1, 0..batch, 0..hidden])
                .reshape([batch, hidden]);
            x = gru.forward(x, Some(state));
        }
        x.slice([0..batch, seq_len - 1..seq_len, 0..hidden])
            .reshape([batch, hidden])
    }

    fn encode_topics(&self, topics: Tensor<B, 3>, batch: usize) -> Tensor<B, 2> {
        let mut t = topics;
        for conv in &self.cnn {
            t = relu(conv.forward(t));
        }
        t.reshape([batch, self.out_channels * self.height])
    }
}

// ============================================================
// Layer 3 - NewsRecord Domain Type
// ============================================================
// One raw input unit: the token sequence fed to the recurrent
// encoder, the free text fed to the topic extractor, and the
// binary truth label.
//
// Example (input_size = 3):
//   sequence: [[0.1, 0.2, 0.3], [0.0, 0.5, 0.1]]
//   text:     "Breaking: city council approves new budget"
//   label:    Label::True

use serde::{Deserialize, Serialize};

/// Binary truth label. Encoded as 1 for true news and 0 for false news,
/// which is also the class index used by the classification head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    False,
    True,
}

impl Label {
    /// Class index used in tensors and in the accuracy accounting
    pub fn index(self) -> usize {
        match self {
            Label::False => 0,
            Label::True => 1,
        }
    }

    /// Parse a class index; anything other than 0 or 1 is not a label
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Label::False),
            1 => Some(Label::True),
            _ => None,
        }
    }
}

/// A labelled record. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsRecord {
    /// One embedding per token, each `input_size` wide
    pub sequence: Vec<Vec<f32>>,

    /// The raw text, used only for topic extraction
    pub text: String,

    pub label: Label,
}

impl NewsRecord {
    pub fn new(sequence: Vec<Vec<f32>>, text: impl Into<String>, label: Label) -> Self {
        Self {
            sequence,
            text: text.into(),
            label,
        }
    }
}

// ============================================================
// Layer 5 - Global Gradient-Norm Clipping
// ============================================================
// Burn's optimiser-level clipping works per parameter tensor.
// The recurrent path needs the norm over ALL gradients taken
// together, so we walk the module's parameters with a visitor,
// look up each gradient by ParamId, and rescale them uniformly:
//
//   total = sqrt(Σ ||g_i||²)
//   if total > max_norm:  g_i ← g_i * max_norm / (total + 1e-6)

use std::marker::PhantomData;

use burn::{
    module::{AutodiffModule, ModuleVisitor, Param},
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

/// Maximum global L2 norm allowed before an optimiser step
pub const MAX_GRAD_NORM: f64 = 5.0;

const CLIP_EPSILON: f64 = 1e-6;

/// Gradient norms around one clipping operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradNorm {
    /// Norm before clipping
    pub total: f64,
    /// Norm after clipping (equal to `total` when no clipping was needed)
    pub clipped: f64,
}

struct SquaredNorm<'a, B: AutodiffBackend> {
    grads: &'a GradientsParams,
    sum: f64,
    _backend: PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for SquaredNorm<'_, B> {
    fn visit_float<const D: usize>(&mut self, param: &Param<Tensor<B, D>>) {
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(param.id) {
            self.sum += grad.powf_scalar(2.0).sum().into_scalar().elem::<f64>();
        }
    }
}

struct Rescale<'a, B: AutodiffBackend> {
    grads: &'a mut GradientsParams,
    factor: f64,
    _backend: PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for Rescale<'_, B> {
    fn visit_float<const D: usize>(&mut self, param: &Param<Tensor<B, D>>) {
        if let Some(grad) = self.grads.remove::<B::InnerBackend, D>(param.id) {
            self.grads.register::<B::InnerBackend, D>(param.id, grad.mul_scalar(self.factor));
        }
    }
}

/// Global L2 norm of every gradient that belongs to `model`
pub fn grad_norm<B, M>(model: &M, grads: &GradientsParams) -> f64
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let mut visitor = SquaredNorm::<B> { grads, sum: 0.0, _backend: PhantomData };
    model.visit(&mut visitor);
    visitor.sum.sqrt()
}

/// Scale all gradients of `model` so their global norm is at most `max_norm`
pub fn clip_grad_norm<B, M>(model: &M, grads: &mut GradientsParams, max_norm: f64) -> GradNorm
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let total = grad_norm::<B, M>(model, grads);
    let factor = max_norm / (total + CLIP_EPSILON);
    if factor >= 1.0 {
        return GradNorm { total, clipped: total };
    }

    let mut visitor = Rescale::<B> { grads, factor, _backend: PhantomData };
    model.visit(&mut visitor);
    GradNorm { total, clipped: total * factor }
}

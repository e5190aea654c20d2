// ============================================================
// Layer 5 — Global Gradient-Norm Clipping
// ============================================================
// burn's GradientClippingConfig::Norm clips each parameter on its
// own. Recurrent nets need the classic global rule instead:
//
//   total = sqrt( Σ_params ‖g_p‖² )
//   if total > max_norm:  g_p ← g_p · max_norm / (total + 1e-6)
//
// The gradients are visited through the module's parameter ids
// with a ModuleVisitor, first to measure, then to rescale.

use burn::{
    module::{AutodiffModule, ModuleVisitor, ParamId},
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

const EPSILON: f64 = 1e-6;

/// L2 norm of all float parameter gradients of `model` taken together.
pub fn grad_norm<B, M>(model: &M, grads: &GradientsParams) -> f64
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let mut acc = SquaredNorm { grads, sum: 0.0 };
    model.visit(&mut acc);
    acc.sum.sqrt()
}

/// Rescale `grads` so their global norm is at most `max_norm`.
/// Returns the clipped gradients and the norm measured before clipping.
pub fn clip_grad_norm<B, M>(
    model:    &M,
    grads:    GradientsParams,
    max_norm: f64,
) -> (GradientsParams, f64)
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let total = grad_norm::<B, M>(model, &grads);
    let coef  = clip_coefficient(total, max_norm);
    if coef >= 1.0 {
        return (grads, total);
    }

    let mut scaler = Rescale { grads, coef };
    model.visit(&mut scaler);
    (scaler.grads, total)
}

/// Factor every gradient is multiplied by; 1.0 means untouched.
pub fn clip_coefficient(total_norm: f64, max_norm: f64) -> f64 {
    if total_norm > max_norm {
        max_norm / (total_norm + EPSILON)
    } else {
        1.0
    }
}

struct SquaredNorm<'a> {
    grads: &'a GradientsParams,
    sum:   f64,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for SquaredNorm<'_> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(id) {
            self.sum += (grad.clone() * grad).sum().into_scalar().elem::<f64>();
        }
    }
}

struct Rescale {
    grads: GradientsParams,
    coef:  f64,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for Rescale {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id) {
            self.grads
                .register::<B::InnerBackend, D>(id, grad.mul_scalar(self.coef));
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::nn::{Linear, LinearConfig};

    type AD = Autodiff<NdArray>;

    /// A linear layer and the gradients of a loss scaled by `scale`.
    fn linear_with_grads(scale: f32) -> (Linear<AD>, GradientsParams) {
        let device = Default::default();
        let layer: Linear<AD> = LinearConfig::new(3, 2).init(&device);
        let input = Tensor::<AD, 2>::from_floats([[1.0, -2.0, 0.5], [0.3, 0.7, -1.1]], &device);

        let loss  = layer.forward(input).sum().mul_scalar(scale);
        let grads = GradientsParams::from_grads(loss.backward(), &layer);
        (layer, grads)
    }

    #[test]
    fn test_coefficient() {
        assert_eq!(clip_coefficient(5.0, 10.0), 1.0);
        assert_eq!(clip_coefficient(10.0, 10.0), 1.0);
        let c = clip_coefficient(20.0, 10.0);
        assert!((c - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_clipped_norm_does_not_exceed_threshold() {
        let (layer, grads) = linear_with_grads(100.0);
        let before = grad_norm::<AD, _>(&layer, &grads);
        assert!(before > 1.0, "fixture should need clipping, norm = {before}");

        let (clipped, reported) = clip_grad_norm::<AD, _>(&layer, grads, 1.0);
        let after = grad_norm::<AD, _>(&layer, &clipped);

        assert!((reported - before).abs() < 1e-9);
        assert!(after <= 1.0 + 1e-4, "norm after clipping = {after}");
        assert!(after > 0.99);
    }

    #[test]
    fn test_small_gradients_are_untouched() {
        let (layer, grads) = linear_with_grads(0.01);
        let weight_before: Vec<f32> = grads
            .get::<NdArray, 2>(layer.weight.id)
            .unwrap()
            .into_data()
            .to_vec()
            .unwrap();

        let (clipped, _) = clip_grad_norm::<AD, _>(&layer, grads, 10.0);
        let weight_after: Vec<f32> = clipped
            .get::<NdArray, 2>(layer.weight.id)
            .unwrap()
            .into_data()
            .to_vec()
            .unwrap();

        assert_eq!(weight_before, weight_after);
    }

    #[test]
    fn test_direction_is_preserved() {
        let (layer, grads) = linear_with_grads(50.0);
        let before: Vec<f32> = grads.get::<NdArray, 2>(layer.weight.id).unwrap().into_data().to_vec().unwrap();

        let (clipped, norm) = clip_grad_norm::<AD, _>(&layer, grads, 1.0);
        let after: Vec<f32> = clipped.get::<NdArray, 2>(layer.weight.id).unwrap().into_data().to_vec().unwrap();

        let coef = clip_coefficient(norm, 1.0) as f32;
        for (b, a) in before.iter().zip(&after) {
            assert!((b * coef - a).abs() < 1e-5);
        }
    }
}

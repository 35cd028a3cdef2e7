// ============================================================
// Layer 5 — Masked-Prediction Head Restriction
// ============================================================
// Two ways of keeping the masked LM inside the target script:
//
//   1. restrict_head — a projection. Returns a NEW decoder whose
//      weight column i and bias entry i are exactly 0 for every
//      disallowed id; allowed entries are untouched. Parameter ids
//      and require_grad survive, so the optimiser state still
//      lines up after the swap.
//
//   2. GradientMask — an explicit step between backward() and
//      optimiser.step(): the raw decoder gradients are multiplied
//      by the 0/1 mask so updates never reach disallowed columns,
//      whatever the upstream gradient looked like.
//
// Neither runs implicitly. The training loop decides when.
//
//   weight [H, V]          mask [V]            result [H, V]
//   ┌ a b c ┐         ×   [0 1 0]      =     ┌ 0 b 0 ┐
//   └ d e f ┘                                └ 0 e 0 ┘

use burn::{
    nn::Linear,
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::ml::vocab_filter::VocabularyMask;

/// Zero every disallowed output of `head`. Gradient-free.
pub fn restrict_head<B: Backend>(mut head: Linear<B>, mask: &VocabularyMask) -> Linear<B> {
    let device = head.weight.val().device();
    let keep   = mask.to_float_tensor::<B>(&device);

    head.weight = head.weight.map(|weight| {
        let [d_input, vocab_size] = weight.dims();
        let keep = keep.clone().unsqueeze::<2>().expand([d_input, vocab_size]);
        project(weight, keep)
    });
    head.bias = head.bias.map(|bias| bias.map(|b| project(b, keep.clone())));

    tracing::debug!(
        "Restricted decoder to {} of {} tokens",
        mask.allowed_count(),
        mask.len()
    );
    head
}

fn project<B: Backend, const D: usize>(tensor: Tensor<B, D>, keep: Tensor<B, D>) -> Tensor<B, D> {
    let require_grad = tensor.is_require_grad();
    tensor.mul(keep).detach().set_require_grad(require_grad)
}

/// 0/1 multiplier for the decoder gradients, built once per run.
#[derive(Debug, Clone)]
pub struct GradientMask<B: AutodiffBackend> {
    keep: Tensor<B::InnerBackend, 1>,
}

impl<B: AutodiffBackend> GradientMask<B> {
    pub fn new(mask: &VocabularyMask, device: &B::Device) -> Self {
        Self { keep: mask.to_float_tensor::<B::InnerBackend>(device) }
    }

    /// Mask the decoder's weight and bias gradients in place.
    ///
    /// Parameters with no gradient this step are left alone. The mask
    /// is 0/1, so applying it twice changes nothing.
    pub fn apply(&self, grads: &mut GradientsParams, head: &Linear<B>) {
        let weight_id = head.weight.id;
        if let Some(grad) = grads.remove::<B::InnerBackend, 2>(weight_id) {
            let [d_input, vocab_size] = grad.dims();
            let keep = self.keep.clone().unsqueeze::<2>().expand([d_input, vocab_size]);
            grads.register(weight_id, grad.mul(keep));
        }

        if let Some(bias) = &head.bias {
            let bias_id = bias.id;
            if let Some(grad) = grads.remove::<B::InnerBackend, 1>(bias_id) {
                grads.register(bias_id, grad.mul(self.keep.clone()));
            }
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::testing::{tiny_mlm_config, ListVocabulary, TestBackend};

    type Inner = <TestBackend as AutodiffBackend>::InnerBackend;

    fn scenario_mask() -> VocabularyMask {
        VocabularyMask::build(&ListVocabulary::scenario()).unwrap()
    }

    #[test]
    fn test_restriction_zeroes_only_disallowed_columns() {
        let device = Default::default();
        let mask   = scenario_mask();
        let head   = tiny_mlm_config(3).init::<TestBackend>(&device).head.decoder;

        let before: Vec<f32> = head.weight.val().into_data().to_vec().unwrap();
        let bias_before: Vec<f32> = head.bias.as_ref().unwrap().val().into_data().to_vec().unwrap();

        let head = restrict_head(head, &mask);
        let after: Vec<f32> = head.weight.val().into_data().to_vec().unwrap();
        let bias_after: Vec<f32> = head.bias.as_ref().unwrap().val().into_data().to_vec().unwrap();

        // Row-major [H, V]: column = index % V.
        for (i, (b, a)) in before.iter().zip(&after).enumerate() {
            if mask.is_allowed((i % 3) as u32) {
                assert_eq!(a, b, "allowed weight changed at {i}");
            } else {
                assert_eq!(*a, 0.0, "disallowed weight kept at {i}");
            }
        }
        assert_eq!(bias_after, vec![0.0, bias_before[1], 0.0]);
    }

    #[test]
    fn test_restriction_keeps_parameter_identity() {
        let device = Default::default();
        let head   = tiny_mlm_config(3).init::<TestBackend>(&device).head.decoder;
        let id     = head.weight.id;

        let head = restrict_head(head, &scenario_mask());
        assert_eq!(head.weight.id, id);
        assert!(head.weight.val().is_require_grad());
    }

    #[test]
    fn test_all_ones_gradient_becomes_the_mask() {
        let device = Default::default();
        let mask   = scenario_mask();
        let mlm    = tiny_mlm_config(3).init::<TestBackend>(&device);

        // d(sum(W))/dW is all ones.
        let grads = mlm.decoder().weight.val().sum().backward();
        let mut grads = GradientsParams::from_grads(grads, &mlm);

        let grad_mask = GradientMask::<TestBackend>::new(&mask, &device);
        grad_mask.apply(&mut grads, mlm.decoder());
        grad_mask.apply(&mut grads, mlm.decoder());

        let masked: Vec<f32> = grads
            .get::<Inner, 2>(mlm.decoder().weight.id)
            .unwrap()
            .into_data()
            .to_vec()
            .unwrap();
        assert_eq!(masked.len(), 8 * 3);
        for (i, g) in masked.iter().enumerate() {
            let expected = if mask.is_allowed((i % 3) as u32) { 1.0 } else { 0.0 };
            assert_eq!(*g, expected, "gradient entry {i}");
        }
    }

    #[test]
    fn test_bias_gradient_is_masked() {
        let device = Default::default();
        let mask   = scenario_mask();
        let mlm    = tiny_mlm_config(3).init::<TestBackend>(&device);
        let bias   = mlm.decoder().bias.as_ref().unwrap();

        let grads = (bias.val() * 3.0).sum().backward();
        let mut grads = GradientsParams::from_grads(grads, &mlm);
        GradientMask::<TestBackend>::new(&mask, &device).apply(&mut grads, mlm.decoder());

        let masked: Vec<f32> = grads.get::<Inner, 1>(bias.id).unwrap().into_data().to_vec().unwrap();
        assert_eq!(masked, vec![0.0, 3.0, 0.0]);
    }
}

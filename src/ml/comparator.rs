// ============================================================
// Layer 5 — Embedding Comparator
// ============================================================
// Turns a selection row into a sentence-level judgement:
//
//   masked ids ─► table lookup ─► splice selection @ table at the
//                                 masked position ─► encoder ─► E1
//   original ids ────────────────────────────────► encoder ─► E2
//
//   loss = batch_size − Σ ( E1/‖E1‖ ⊙ E2/‖E2‖ )
//
// For one sentence that is 1 − cos(E1, E2): 0 when the pooled
// vectors agree, 2 when they point in opposite directions.
// Because the selection is one-hot in the forward pass,
// selection @ table is numerically the chosen token's row, yet
// it stays differentiable with respect to the selection.
//
// Shapes are the caller's responsibility; nothing is validated here.

use burn::prelude::*;

/// Lower bound on the norm, as in torch.nn.functional.normalize.
pub const NORM_EPS: f64 = 1e-12;

/// Row-wise L2 normalisation of [batch, dim].
pub fn l2_normalize<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    let [batch_size, dim] = x.dims();
    let norms = x.clone()
        .powf_scalar(2.0)
        .sum_dim(1)
        .sqrt()
        .clamp_min(NORM_EPS)
        .expand([batch_size, dim]);
    x / norms
}

/// batch_size − Σ cosine terms. Shape [1].
pub fn alignment_loss<B: Backend>(e1: Tensor<B, 2>, e2: Tensor<B, 2>) -> Tensor<B, 1> {
    let [batch_size, _] = e1.dims();
    let similarity = (l2_normalize(e1) * l2_normalize(e2)).sum();
    similarity.neg().add_scalar(batch_size as f64)
}

/// Replace the embedding at each row's masked position with
/// `selection @ table`.
///
/// embeds:    [batch, seq_len, d_model]
/// table:     [vocab, d_model]
/// selection: [batch, vocab]
/// positions: one masked position per row
pub fn substitute_embeddings<B: Backend>(
    embeds:    Tensor<B, 3>,
    table:     Tensor<B, 2>,
    selection: Tensor<B, 2>,
    positions: &[usize],
) -> Tensor<B, 3> {
    let [batch_size, seq_len, d_model] = embeds.dims();
    let device = embeds.device();

    let substitute = selection
        .matmul(table)
        .reshape([batch_size, 1, d_model])
        .expand([batch_size, seq_len, d_model]);

    let mut pick = vec![0.0f32; batch_size * seq_len];
    for (row, &position) in positions.iter().enumerate() {
        pick[row * seq_len + position] = 1.0;
    }
    let pick = Tensor::<B, 1>::from_floats(pick.as_slice(), &device)
        .reshape([batch_size, seq_len, 1])
        .expand([batch_size, seq_len, d_model]);
    let keep = pick.clone().neg().add_scalar(1.0);

    embeds * keep + substitute * pick
}

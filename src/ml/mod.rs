// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// All model math lives here. No other layer sees topic counts,
// Gibbs sampling state, or co-occurrence statistics.
//
// What's in this layer:
//
//   lda.rs       — Latent Dirichlet Allocation trained by
//                  collapsed Gibbs sampling:
//                  • vocabulary pruning (min document frequency,
//                    top-frequent-term removal)
//                  • seeded, reproducible sampling
//                  • per-document parallel sweeps on a fixed-width
//                    thread pool
//                  • perplexity over the training corpus
//
//   coherence.rs — c_v topic coherence: boolean sliding windows,
//                  NPMI context vectors, cosine similarity
//
// Reference: Griffiths & Steyvers (2004) Finding scientific topics
//            Röder et al. (2015) Exploring the space of topic
//            coherence measures

/// LDA model, vocabulary, and Gibbs training
pub mod lda;

/// c_v coherence estimator
pub mod coherence;

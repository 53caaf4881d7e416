// ============================================================
// Layer 5 — LDA via Collapsed Gibbs Sampling
// ============================================================
// A document-topic model with symmetric Dirichlet priors, trained
// by collapsed Gibbs sampling (Griffiths & Steyvers 2004).
//
// Training state is three count tables:
//   doc_topic[d][t]   — tokens of document d assigned to topic t
//   topic_word[t*V+w] — tokens of word w assigned to topic t
//   topic_totals[t]   — total tokens assigned to topic t
//
// One sweep resamples the topic of every token:
//   p(t) ∝ (n_dt + alpha) * (n_tw + eta) / (n_t + V*eta)
//
// Sweeps are parallelised across documents: every document samples
// against a frozen snapshot of the word-topic counts from the end
// of the previous sweep, keeping only its own doc-topic counts
// live; global counts are rebuilt once all documents finish. Each
// document draws from its own RNG seeded from (seed, sweep, doc),
// so a training run is reproducible regardless of thread count or
// scheduling.

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Symmetric document-topic prior
pub const DEFAULT_ALPHA: f64 = 0.1;

/// Symmetric topic-word prior
pub const DEFAULT_ETA: f64 = 0.01;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Fixed hyperparameters for one model instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdaConfig {
    /// Number of topics (k)
    pub num_topics: usize,

    /// Words appearing in fewer documents than this are pruned
    pub min_doc_freq: usize,

    /// The N most frequent surviving words are pruned as well;
    /// they co-occur with everything and carry no topic signal
    pub remove_top_terms: usize,

    /// Seed for every RNG the model uses
    pub seed: u64,

    /// Document-topic prior
    pub alpha: f64,

    /// Topic-word prior
    pub eta: f64,
}

impl LdaConfig {
    /// A configuration with no vocabulary pruning and the default
    /// priors. Production callers override the pruning fields.
    pub fn new(num_topics: usize) -> Self {
        Self {
            num_topics,
            min_doc_freq: 1,
            remove_top_terms: 0,
            seed: 10,
            alpha: DEFAULT_ALPHA,
            eta: DEFAULT_ETA,
        }
    }
}

// ─── Vocabulary ──────────────────────────────────────────────────────────────

/// The pruned term dictionary: term strings in id order plus the
/// reverse index. Built once, before the first training sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build the vocabulary from the raw corpus.
    ///
    /// Two pruning passes, in order:
    ///   1. drop terms whose document frequency is below `min_doc_freq`
    ///   2. of the survivors, drop the `remove_top_terms` with the
    ///      highest collection frequency (ties broken alphabetically)
    ///
    /// Surviving terms get ids in alphabetical order, so the same
    /// corpus always yields the same id assignment.
    fn build(docs: &[Vec<String>], min_doc_freq: usize, remove_top_terms: usize) -> Self {
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut term_freq: HashMap<&str, usize> = HashMap::new();

        for doc in docs {
            let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
            for term in doc {
                *term_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        // Pass 1: document-frequency threshold
        let mut kept: Vec<&str> = doc_freq
            .iter()
            .filter(|(_, &df)| df >= min_doc_freq)
            .map(|(&term, _)| term)
            .collect();

        // Pass 2: remove the most frequent survivors
        kept.sort_by(|a, b| term_freq[b].cmp(&term_freq[a]).then(a.cmp(b)));
        let kept = if remove_top_terms < kept.len() {
            &kept[remove_top_terms..]
        } else {
            &[][..]
        };

        let mut terms: Vec<String> = kept.iter().map(|t| t.to_string()).collect();
        terms.sort();

        let index = terms
            .iter()
            .enumerate()
            .map(|(id, term)| (term.clone(), id))
            .collect();

        Self { terms, index }
    }

    /// Number of terms in the vocabulary.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True if every term was pruned away.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The term string for a given id.
    pub fn term(&self, id: usize) -> &str {
        &self.terms[id]
    }

    /// The id for a term, if it survived pruning.
    pub fn id(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }
}

// ─── Model ───────────────────────────────────────────────────────────────────

/// An LDA model instance: configuration, vocabulary, the mapped
/// corpus, and the Gibbs count tables. Serialisable as a whole so
/// the best instance can be persisted as the model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdaModel {
    config: LdaConfig,
    vocab: Vocabulary,

    /// Documents mapped to term ids (out-of-vocabulary tokens dropped)
    docs: Vec<Vec<usize>>,

    /// Current topic assignment of every token, parallel to `docs`
    assignments: Vec<Vec<usize>>,

    /// doc_topic[d][t]: tokens of document d assigned to topic t
    doc_topic: Vec<Vec<u32>>,

    /// topic_word[t * V + w]: tokens of word w assigned to topic t
    topic_word: Vec<u32>,

    /// topic_totals[t]: total tokens assigned to topic t
    topic_totals: Vec<u32>,

    /// Total Gibbs sweeps run so far
    trained_iterations: u64,

    /// Raw documents waiting for the vocabulary build; drained by
    /// the first call to train()
    pending: Vec<Vec<String>>,
}

impl LdaModel {
    /// Create an untrained model with the given hyperparameters.
    pub fn new(config: LdaConfig) -> Self {
        let num_topics = config.num_topics;
        Self {
            config,
            vocab: Vocabulary::default(),
            docs: Vec::new(),
            assignments: Vec::new(),
            doc_topic: Vec::new(),
            topic_word: Vec::new(),
            topic_totals: vec![0; num_topics],
            trained_iterations: 0,
            pending: Vec::new(),
        }
    }

    /// Add one document to the corpus. Zero-token documents are
    /// never added; returns whether the document was accepted.
    pub fn add_doc(&mut self, tokens: &[String]) -> bool {
        if tokens.is_empty() {
            return false;
        }
        self.pending.push(tokens.to_vec());
        true
    }

    /// Number of documents in the model.
    pub fn num_docs(&self) -> usize {
        self.docs.len() + self.pending.len()
    }

    /// Number of topics (k).
    pub fn num_topics(&self) -> usize {
        self.config.num_topics
    }

    /// Vocabulary size after pruning (0 before the first train call).
    pub fn vocab_len(&self) -> usize {
        self.vocab.len()
    }

    /// Total Gibbs sweeps run so far.
    pub fn trained_iterations(&self) -> u64 {
        self.trained_iterations
    }

    /// Run `iterations` Gibbs sweeps on a thread pool of `workers`
    /// threads. The first call builds the vocabulary and the count
    /// tables; later calls continue from the current state.
    pub fn train(&mut self, iterations: u64, workers: usize) -> Result<()> {
        if !self.pending.is_empty() {
            self.build_corpus()?;
        }
        if self.docs.is_empty() {
            bail!("Cannot train: no documents were added to the model");
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .context("Cannot build training thread pool")?;

        pool.install(|| {
            for _ in 0..iterations {
                self.trained_iterations += 1;
                self.sweep(self.trained_iterations);
            }
        });

        tracing::debug!(
            "Trained to {} iterations (k={}, vocab={})",
            self.trained_iterations,
            self.config.num_topics,
            self.vocab.len(),
        );
        Ok(())
    }

    /// Build the vocabulary from the pending raw documents, map
    /// them to term ids, and initialise the count tables with a
    /// seeded random topic per token.
    fn build_corpus(&mut self) -> Result<()> {
        let raw = std::mem::take(&mut self.pending);
        self.vocab = Vocabulary::build(&raw, self.config.min_doc_freq, self.config.remove_top_terms);
        if self.vocab.is_empty() {
            bail!(
                "Vocabulary is empty after pruning (min_doc_freq={}, remove_top_terms={})",
                self.config.min_doc_freq,
                self.config.remove_top_terms,
            );
        }

        let k = self.config.num_topics;
        let v = self.vocab.len();

        self.docs = raw
            .iter()
            .map(|doc| doc.iter().filter_map(|t| self.vocab.id(t)).collect())
            .collect();

        self.topic_word = vec![0; k * v];
        self.topic_totals = vec![0; k];
        self.assignments = Vec::with_capacity(self.docs.len());
        self.doc_topic = Vec::with_capacity(self.docs.len());

        for (d, doc) in self.docs.iter().enumerate() {
            let mut rng = StdRng::seed_from_u64(mix_seed(self.config.seed, 0, d as u64));
            let mut z = Vec::with_capacity(doc.len());
            let mut n_dt = vec![0u32; k];
            for &w in doc {
                let t = rng.gen_range(0..k);
                z.push(t);
                n_dt[t] += 1;
                self.topic_word[t * v + w] += 1;
                self.topic_totals[t] += 1;
            }
            self.assignments.push(z);
            self.doc_topic.push(n_dt);
        }

        Ok(())
    }

    /// One full Gibbs sweep over every token of every document.
    fn sweep(&mut self, sweep_no: u64) {
        let k = self.config.num_topics;
        let v = self.vocab.len();
        let alpha = self.config.alpha;
        let eta = self.config.eta;
        let v_eta = v as f64 * eta;
        let seed = self.config.seed;

        // Frozen word-topic snapshot from the end of the last sweep
        let topic_word = &self.topic_word;
        let topic_totals = &self.topic_totals;
        let docs = &self.docs;
        let assignments = &self.assignments;
        let doc_topic = &self.doc_topic;

        let new_state: Vec<(Vec<usize>, Vec<u32>)> = (0..docs.len())
            .into_par_iter()
            .map(|d| {
                let doc = &docs[d];
                let mut z = assignments[d].clone();
                let mut n_dt = doc_topic[d].clone();
                let mut rng = StdRng::seed_from_u64(mix_seed(seed, sweep_no, d as u64));
                let mut weights = vec![0.0f64; k];

                for (i, &w) in doc.iter().enumerate() {
                    let old = z[i];
                    n_dt[old] -= 1;

                    // Exclude this token's own contribution from the
                    // snapshot; the snapshot is guaranteed to contain it.
                    let mut total = 0.0;
                    for (t, weight) in weights.iter_mut().enumerate() {
                        let own = u32::from(t == old);
                        let n_tw = (topic_word[t * v + w] - own) as f64;
                        let n_t = (topic_totals[t] - own) as f64;
                        *weight = (n_dt[t] as f64 + alpha) * (n_tw + eta) / (n_t + v_eta);
                        total += *weight;
                    }

                    let mut new = old;
                    if total > 0.0 {
                        let u = rng.gen::<f64>() * total;
                        let mut cum = 0.0;
                        for (t, &weight) in weights.iter().enumerate() {
                            cum += weight;
                            if u < cum {
                                new = t;
                                break;
                            }
                        }
                    }

                    z[i] = new;
                    n_dt[new] += 1;
                }

                (z, n_dt)
            })
            .collect();

        for (d, (z, n_dt)) in new_state.into_iter().enumerate() {
            self.assignments[d] = z;
            self.doc_topic[d] = n_dt;
        }
        self.rebuild_word_counts();
    }

    /// Recompute topic_word and topic_totals from the assignments.
    fn rebuild_word_counts(&mut self) {
        let v = self.vocab.len();
        self.topic_word.fill(0);
        self.topic_totals.fill(0);
        for (doc, z) in self.docs.iter().zip(&self.assignments) {
            for (&w, &t) in doc.iter().zip(z) {
                self.topic_word[t * v + w] += 1;
                self.topic_totals[t] += 1;
            }
        }
    }

    /// Perplexity over the training corpus under the point estimates
    ///   theta_dt = (n_dt + alpha) / (N_d + k*alpha)
    ///   phi_tw   = (n_tw + eta)   / (n_t + V*eta)
    /// i.e. exp of the negative mean per-token log-likelihood.
    pub fn perplexity(&self) -> f64 {
        let k = self.config.num_topics;
        let v = self.vocab.len();
        let alpha = self.config.alpha;
        let eta = self.config.eta;

        let mut log_likelihood = 0.0;
        let mut num_tokens = 0usize;

        for (doc, n_dt) in self.docs.iter().zip(&self.doc_topic) {
            let n_d = doc.len() as f64;
            for &w in doc {
                let mut p = 0.0;
                for t in 0..k {
                    let theta = (n_dt[t] as f64 + alpha) / (n_d + k as f64 * alpha);
                    let phi = (self.topic_word[t * v + w] as f64 + eta)
                        / (self.topic_totals[t] as f64 + v as f64 * eta);
                    p += theta * phi;
                }
                log_likelihood += p.ln();
                num_tokens += 1;
            }
        }

        if num_tokens == 0 {
            return f64::NAN;
        }
        (-log_likelihood / num_tokens as f64).exp()
    }

    /// The `n` highest-count terms of a topic, most frequent first.
    /// Ties are broken by term id so the order is stable.
    pub fn top_terms(&self, topic: usize, n: usize) -> Vec<&str> {
        let v = self.vocab.len();
        let mut ids: Vec<usize> = (0..v).collect();
        ids.sort_by(|&a, &b| {
            self.topic_word[topic * v + b]
                .cmp(&self.topic_word[topic * v + a])
                .then(a.cmp(&b))
        });
        ids.into_iter().take(n).map(|id| self.vocab.term(id)).collect()
    }
}

/// Mix (seed, sweep, doc) into one RNG seed. SplitMix64-style
/// finaliser so neighbouring documents get unrelated streams.
fn mix_seed(seed: u64, sweep: u64, doc: u64) -> u64 {
    let mut x = seed
        .wrapping_add(sweep.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(doc.wrapping_mul(0xBF58_476D_1CE4_E5B9));
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x ^= x >> 27;
    x
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    /// A corpus with two clearly separated themes.
    fn two_theme_corpus() -> Vec<Vec<String>> {
        vec![
            strings(&["apple", "banana", "fruit", "apple"]),
            strings(&["banana", "fruit", "apple", "juice"]),
            strings(&["fruit", "juice", "banana", "apple"]),
            strings(&["engine", "wheel", "car", "engine"]),
            strings(&["wheel", "car", "engine", "road"]),
            strings(&["car", "road", "wheel", "engine"]),
        ]
    }

    fn trained_model(seed: u64, workers: usize) -> LdaModel {
        let mut config = LdaConfig::new(2);
        config.seed = seed;
        let mut model = LdaModel::new(config);
        for doc in two_theme_corpus() {
            model.add_doc(&doc);
        }
        model.train(20, workers).unwrap();
        model
    }

    #[test]
    fn test_empty_doc_is_never_added() {
        let mut model = LdaModel::new(LdaConfig::new(2));
        assert!(!model.add_doc(&[]));
        assert!(model.add_doc(&strings(&["alpha"])));
        assert_eq!(model.num_docs(), 1);
    }

    #[test]
    fn test_vocab_min_doc_freq_prunes_rare_terms() {
        let docs = vec![
            strings(&["common", "rare"]),
            strings(&["common", "other"]),
            strings(&["common", "other"]),
        ];
        let vocab = Vocabulary::build(&docs, 2, 0);
        assert!(vocab.id("common").is_some());
        assert!(vocab.id("other").is_some());
        // "rare" appears in only one document
        assert!(vocab.id("rare").is_none());
    }

    #[test]
    fn test_vocab_removes_top_terms() {
        let docs = vec![
            strings(&["the", "the", "the", "apple"]),
            strings(&["the", "banana", "apple"]),
        ];
        let vocab = Vocabulary::build(&docs, 1, 1);
        // "the" has the highest collection frequency and is removed
        assert!(vocab.id("the").is_none());
        assert!(vocab.id("apple").is_some());
        assert!(vocab.id("banana").is_some());
    }

    #[test]
    fn test_vocab_ids_are_deterministic() {
        let docs = two_theme_corpus();
        let a = Vocabulary::build(&docs, 1, 0);
        let b = Vocabulary::build(&docs, 1, 0);
        assert_eq!(a.terms, b.terms);
    }

    #[test]
    fn test_train_is_deterministic_for_a_fixed_seed() {
        let a = trained_model(10, 2);
        let b = trained_model(10, 4);
        // Same seed, different worker counts: identical counts
        assert_eq!(a.topic_word, b.topic_word);
        assert_eq!(a.doc_topic, b.doc_topic);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = trained_model(10, 2);
        let b = trained_model(11, 2);
        assert_ne!(a.assignments, b.assignments);
    }

    #[test]
    fn test_counts_stay_consistent_after_training() {
        let model = trained_model(10, 2);
        let total_tokens: usize = model.docs.iter().map(Vec::len).sum();
        let topic_total: u32 = model.topic_totals.iter().sum();
        let word_total: u32 = model.topic_word.iter().sum();
        assert_eq!(topic_total as usize, total_tokens);
        assert_eq!(word_total as usize, total_tokens);
        for (doc, n_dt) in model.docs.iter().zip(&model.doc_topic) {
            assert_eq!(n_dt.iter().sum::<u32>() as usize, doc.len());
        }
    }

    #[test]
    fn test_trained_iterations_accumulate() {
        let mut model = trained_model(10, 2);
        assert_eq!(model.trained_iterations(), 20);
        model.train(5, 2).unwrap();
        assert_eq!(model.trained_iterations(), 25);
    }

    #[test]
    fn test_perplexity_is_positive_and_finite() {
        let model = trained_model(10, 2);
        let p = model.perplexity();
        assert!(p.is_finite());
        assert!(p > 0.0);
    }

    #[test]
    fn test_top_terms_length_and_stability() {
        let model = trained_model(10, 2);
        let top = model.top_terms(0, 3);
        assert_eq!(top.len(), 3);
        assert_eq!(top, model.top_terms(0, 3));
    }

    #[test]
    fn test_train_without_documents_fails() {
        let mut model = LdaModel::new(LdaConfig::new(2));
        assert!(model.train(10, 1).is_err());
    }

    #[test]
    fn test_train_with_everything_pruned_fails() {
        let mut config = LdaConfig::new(2);
        config.min_doc_freq = 1000;
        let mut model = LdaModel::new(config);
        for doc in two_theme_corpus() {
            model.add_doc(&doc);
        }
        assert!(model.train(10, 1).is_err());
    }
}

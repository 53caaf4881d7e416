// ============================================================
// Layer 5 — c_v Topic Coherence
// ============================================================
// Estimates how semantically related the top terms of each topic
// are, following the c_v measure of Röder et al. (2015):
//
//   1. Slide a boolean window of 110 tokens over every document;
//      each window position is one virtual document. Documents
//      shorter than the window contribute a single window.
//   2. From the window counts, estimate P(w) and P(wi, wj) for the
//      union of all topics' top terms.
//   3. One-set segmentation: every top term wi of a topic is paired
//      with the full top-term set W. Both sides are represented as
//      NPMI context vectors over W.
//   4. The similarity of a pair is the cosine of the two vectors;
//      a topic's coherence is the mean over its terms, the model's
//      coherence the mean over topics.
//
// NPMI(x, y) = ln((P(x,y) + eps) / (P(x) P(y))) / -ln(P(x,y) + eps)

use std::collections::HashMap;

use crate::ml::lda::LdaModel;

/// Window width of the boolean sliding window
pub const SLIDING_WINDOW: usize = 110;

/// Number of top terms per topic entering the measure
pub const TOP_TERMS: usize = 20;

/// Smoothing constant for zero co-occurrence counts
const NPMI_EPS: f64 = 1e-12;

/// Computes c_v coherence for a trained model over the corpus it
/// was trained on.
pub struct CoherenceEstimator {
    window: usize,
    top_terms: usize,
}

impl CoherenceEstimator {
    /// An estimator with the standard c_v configuration.
    pub fn new() -> Self {
        Self {
            window: SLIDING_WINDOW,
            top_terms: TOP_TERMS,
        }
    }

    /// Override the window width. Used by tests with tiny corpora.
    pub fn with_window(mut self, window: usize) -> Self {
        assert!(window > 0, "window width must be positive");
        self.window = window;
        self
    }

    /// Score a trained model: mean coherence over its topics.
    pub fn score(&self, model: &LdaModel, corpus: &[Vec<String>]) -> f64 {
        let topics: Vec<Vec<String>> = (0..model.num_topics())
            .map(|t| {
                model
                    .top_terms(t, self.top_terms)
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .collect();
        self.score_topics(&topics, corpus)
    }

    /// Score explicit top-term lists. Topics with no terms are
    /// skipped; returns 0.0 if nothing is scorable.
    pub fn score_topics(&self, topics: &[Vec<String>], corpus: &[Vec<String>]) -> f64 {
        let stats = WindowStats::count(topics, corpus, self.window);
        if stats.total_windows == 0 {
            return 0.0;
        }

        let mut sum = 0.0;
        let mut scored = 0usize;
        for terms in topics {
            if terms.is_empty() {
                continue;
            }
            sum += self.topic_coherence(terms, &stats);
            scored += 1;
        }
        if scored == 0 {
            return 0.0;
        }
        sum / scored as f64
    }

    /// Coherence of a single topic: mean cosine between each term's
    /// NPMI context vector and the summed vector of the full set.
    fn topic_coherence(&self, terms: &[String], stats: &WindowStats) -> f64 {
        let n = terms.len();

        // npmi[i][j] = NPMI(terms[i], terms[j]); this is the context
        // vector of terms[i] over the set
        let mut vectors = vec![vec![0.0f64; n]; n];
        for i in 0..n {
            for j in 0..n {
                vectors[i][j] = stats.npmi(&terms[i], &terms[j]);
            }
        }

        // v(W): elementwise sum of all context vectors
        let mut set_vector = vec![0.0f64; n];
        for vector in &vectors {
            for (s, &x) in set_vector.iter_mut().zip(vector) {
                *s += x;
            }
        }

        let mut sum = 0.0;
        for vector in &vectors {
            sum += cosine(vector, &set_vector);
        }
        sum / n as f64
    }
}

impl Default for CoherenceEstimator {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Window Statistics ───────────────────────────────────────────────────────

/// Occurrence and co-occurrence counts of the tracked terms over
/// all boolean sliding windows of the corpus.
struct WindowStats {
    /// Tracked term → dense index
    index: HashMap<String, usize>,

    /// Windows containing each tracked term
    occurrences: Vec<usize>,

    /// Windows containing both terms of a pair, keyed (lo, hi)
    joint: HashMap<(usize, usize), usize>,

    /// Total number of windows
    total_windows: usize,
}

impl WindowStats {
    /// Count windows over the corpus for the union of all top terms.
    fn count(topics: &[Vec<String>], corpus: &[Vec<String>], window: usize) -> Self {
        let mut index: HashMap<String, usize> = HashMap::new();
        for terms in topics {
            for term in terms {
                let next = index.len();
                index.entry(term.clone()).or_insert(next);
            }
        }

        let mut occurrences = vec![0usize; index.len()];
        let mut joint: HashMap<(usize, usize), usize> = HashMap::new();
        let mut total_windows = 0usize;

        for doc in corpus {
            let positions: Vec<Option<usize>> =
                doc.iter().map(|t| index.get(t.as_str()).copied()).collect();

            // A document shorter than the window is one window
            let spans: Vec<&[Option<usize>]> = if positions.len() <= window {
                vec![&positions[..]]
            } else {
                positions.windows(window).collect()
            };

            for span in spans {
                total_windows += 1;
                let mut present: Vec<usize> =
                    span.iter().filter_map(|p| *p).collect();
                present.sort_unstable();
                present.dedup();

                for (a, &i) in present.iter().enumerate() {
                    occurrences[i] += 1;
                    for &j in &present[a + 1..] {
                        *joint.entry((i, j)).or_insert(0) += 1;
                    }
                }
            }
        }

        Self {
            index,
            occurrences,
            joint,
            total_windows,
        }
    }

    /// P(term): fraction of windows containing the term.
    fn probability(&self, term: &str) -> f64 {
        match self.index.get(term) {
            Some(&i) => self.occurrences[i] as f64 / self.total_windows as f64,
            None => 0.0,
        }
    }

    /// P(a, b): fraction of windows containing both terms.
    fn joint_probability(&self, a: &str, b: &str) -> f64 {
        let (Some(&i), Some(&j)) = (self.index.get(a), self.index.get(b)) else {
            return 0.0;
        };
        if i == j {
            // A term always co-occurs with itself
            return self.occurrences[i] as f64 / self.total_windows as f64;
        }
        let key = (i.min(j), i.max(j));
        *self.joint.get(&key).unwrap_or(&0) as f64 / self.total_windows as f64
    }

    /// Normalised pointwise mutual information of a term pair.
    /// Zero when either marginal is zero.
    fn npmi(&self, a: &str, b: &str) -> f64 {
        let p_a = self.probability(a);
        let p_b = self.probability(b);
        if p_a == 0.0 || p_b == 0.0 {
            return 0.0;
        }
        let p_ab = self.joint_probability(a, b);
        if p_ab >= 1.0 {
            // Present in every window; the measure's limit is 1
            return 1.0;
        }
        let p_ab = p_ab + NPMI_EPS;
        (p_ab / (p_a * p_b)).ln() / -p_ab.ln()
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm.
fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_perfectly_cooccurring_terms_score_high() {
        // Both terms appear in every window: coherence near 1
        let corpus = vec![strings(&["sun", "moon"]); 10];
        let topics = vec![strings(&["sun", "moon"])];
        let score = CoherenceEstimator::new().score_topics(&topics, &corpus);
        assert!(score > 0.9, "expected near-perfect coherence, got {score}");
    }

    #[test]
    fn test_cooccurring_beats_disjoint() {
        // "sun"/"moon" always share a window; "sun"/"engine" never do
        let mut corpus = vec![strings(&["sun", "moon"]); 5];
        corpus.extend(vec![strings(&["engine", "wheel"]); 5]);

        let est = CoherenceEstimator::new();
        let together = est.score_topics(&[strings(&["sun", "moon"])], &corpus);
        let apart = est.score_topics(&[strings(&["sun", "engine"])], &corpus);
        assert!(
            together > apart,
            "co-occurring pair ({together}) should beat disjoint pair ({apart})"
        );
    }

    #[test]
    fn test_score_is_bounded() {
        let corpus = vec![
            strings(&["a", "b", "c", "d"]),
            strings(&["a", "c", "e", "f"]),
            strings(&["b", "d", "e", "f"]),
        ];
        let topics = vec![strings(&["a", "b"]), strings(&["e", "f"])];
        let score = CoherenceEstimator::new().score_topics(&topics, &corpus);
        assert!(score.is_finite());
        assert!((-1.0..=1.0).contains(&score));
    }

    #[test]
    fn test_windows_shorter_than_documents() {
        // With window 2, "a" and "c" never share a window
        let corpus = vec![strings(&["a", "b", "c"]); 4];
        let est = CoherenceEstimator::new().with_window(2);
        let adjacent = est.score_topics(&[strings(&["a", "b"])], &corpus);
        let separated = est.score_topics(&[strings(&["a", "c"])], &corpus);
        assert!(adjacent > separated);
    }

    #[test]
    fn test_empty_corpus_scores_zero() {
        let topics = vec![strings(&["a", "b"])];
        let score = CoherenceEstimator::new().score_topics(&topics, &[]);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_empty_topic_list_scores_zero() {
        let corpus = vec![strings(&["a", "b"])];
        let score = CoherenceEstimator::new().score_topics(&[], &corpus);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_unseen_terms_score_zero() {
        // Top terms that never occur in the corpus contribute nothing
        let corpus = vec![strings(&["a", "b"]); 3];
        let topics = vec![strings(&["x", "y"])];
        let score = CoherenceEstimator::new().score_topics(&topics, &corpus);
        assert_eq!(score, 0.0);
    }
}

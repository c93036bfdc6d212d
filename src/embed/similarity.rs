use crate::{
    data::{Event, Neighbor, neighbor_order},
    embed::features::{FeatureVector, OrgSpace, vectorize_event},
};

/// Cosine similarity; zero when either vector is all-zero
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Dense pairwise similarity over one batch of events.
///
/// Each unordered pair is computed once and mirrored, so `score(i, j)` and
/// `score(j, i)` are bit-identical.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    ids: Vec<String>,
    scores: Vec<f64>, // row-major n x n
}

impl SimilarityMatrix {
    pub fn compute(events: &[Event]) -> Self {
        let orgs = OrgSpace::from_events(events);
        let vectors: Vec<FeatureVector> = events.iter().map(|e| vectorize_event(e, &orgs)).collect();

        let n = events.len();
        let mut scores = vec![0f64; n * n];
        for i in 0..n {
            for j in i..n {
                let s = cosine_similarity(vectors[i].as_slice(), vectors[j].as_slice());
                scores[i * n + j] = s;
                scores[j * n + i] = s;
            }
        }

        SimilarityMatrix {
            ids: events.iter().map(|e| e.id.clone()).collect(),
            scores,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn score(&self, i: usize, j: usize) -> f64 {
        self.scores[i * self.ids.len() + j]
    }

    /// Neighbors of event `i` at or above `threshold`, excluding itself, in
    /// canonical order.
    pub fn neighbors_of(&self, i: usize, threshold: f64) -> Vec<Neighbor> {
        let mut neighbors: Vec<Neighbor> = (0..self.ids.len())
            .filter(|&j| j != i)
            .filter_map(|j| {
                let score = self.score(i, j);
                (score >= threshold).then(|| Neighbor {
                    event_id: self.ids[j].clone(),
                    score,
                })
            })
            .collect();

        neighbors.sort_by(neighbor_order);
        neighbors
    }

    /// Neighbor list for every event in the batch, in batch order
    pub fn neighbor_lists(&self, threshold: f64) -> Vec<(String, Vec<Neighbor>)> {
        (0..self.ids.len())
            .map(|i| (self.ids[i].clone(), self.neighbors_of(i, threshold)))
            .collect()
    }
}

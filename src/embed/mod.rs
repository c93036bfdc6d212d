mod features;
mod similarity;

pub use features::{FeatureVector, ORG_WEIGHT, OrgSpace, TAG_WEIGHT, vectorize_event};
pub use similarity::{SimilarityMatrix, cosine_similarity};

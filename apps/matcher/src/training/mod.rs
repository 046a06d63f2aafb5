// Model fitting: corpus loading, synthetic labels, vectorizer, scaler and forest.

pub mod corpus;
pub mod forest;
pub mod matrix;
pub mod metrics;
pub mod pipeline;
pub mod scaler;
pub mod synthetic;
pub mod vectorizer;

pub use corpus::{find_dataset, load_corpus};
pub use metrics::TrainingMetrics;
pub use pipeline::{train, TrainingConfig};

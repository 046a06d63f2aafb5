// Feature engineering: numeric parsing, categorical codes, and the column layout.

pub mod assembler;
pub mod encoder;
pub mod parsing;

pub use assembler::{
    experience_match, skill_match, DerivedJobFeatures, FeatureAssembler, FEATURE_COLUMNS,
    NUM_FEATURES,
};
pub use encoder::JobEncoders;

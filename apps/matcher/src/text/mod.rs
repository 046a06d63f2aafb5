// Text handling shared by training and inference: canonical tokens and skill lexicon.

pub mod lexicon;
pub mod preprocess;

pub use lexicon::{Lexicon, SkillExtractor};
pub use preprocess::{PreprocessorState, TextPreprocessor};

pub mod job;
pub mod match_result;
pub mod profile;

pub use job::JobPosting;
pub use match_result::{MatchRequest, MatchResult};
pub use profile::UserProfile;

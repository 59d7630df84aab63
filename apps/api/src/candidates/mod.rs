// Candidate listing: field resolution over the candidate view plus the
// formatting rules that make its loosely typed columns presentable.

pub mod format;
pub mod handlers;
pub mod normalizer;

//! Second-stage confirmation for frameworks whose file names are ambiguous.

pub mod kmp;

pub use kmp::{KmpVerdict, KmpVerifier, DEFAULT_KMP_MARKERS};

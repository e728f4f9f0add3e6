//! Skeleton retargeting: bone-name normalization, bone indexing, fuzzy
//! correspondence matching, and clip rewriting.

pub mod clip;
pub mod index;
pub mod matcher;
pub mod normalize;
pub mod retarget;

pub use clip::*;
pub use index::*;
pub use matcher::*;
pub use normalize::*;
pub use retarget::*;

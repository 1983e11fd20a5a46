pub mod canonical_key;
pub mod percentage;
pub mod price_range;
pub mod token_pair;

pub use canonical_key::CanonicalKey;
pub use percentage::Percentage;
pub use price_range::PriceRange;
pub use token_pair::TokenPair;

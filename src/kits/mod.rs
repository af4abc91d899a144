pub mod catalog;
pub mod recommender;

pub use catalog::{Bilingual, KitCatalog, MarketTier, StandardKit};
pub use recommender::{
    KitFit, KitRecommendation, OptimalSizing, SelectionPolicy, SelectionStrategy, recommend_kit,
};

pub mod data_loader;
pub mod local_table;
pub mod open_food_facts;
pub mod resolver;
pub mod source;
pub mod usda;

pub use data_loader::{load_local_foods, load_local_foods_from_reader};
pub use local_table::LocalFoodTable;
pub use open_food_facts::{Barcode, OpenFoodFactsSource};
pub use resolver::{resolve, RankedResult, ResolveOutcome, Resolver, ResolverOptions, SourceFailure};
pub use source::{FoodSource, SourceHit, SourceKind};
pub use usda::UsdaSource;

pub mod nse;
pub mod provider;
pub mod universe;

#[cfg(test)]
pub(crate) mod testing;

pub use nse::NseProvider;
pub use provider::QuoteProvider;
pub use universe::SymbolUniverse;

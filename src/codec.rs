//! Interfaces for the non-TSV wire formats (`spec.md` §6): a document with
//! either long IRIs everywhere or short CURIEs plus a JSON-LD `@context`
//! for JSON, an `owl:Axiom`-style reified node per mapping for Turtle.
//!
//! Modelled after `linkml-service::loader::traits`'s `DataLoader`/
//! `DataDumper` pair: the core defines the seam, downstream crates provide
//! a concrete implementation. Neither trait is implemented in this crate —
//! only the TSV codec (`src/tsv`) is a full citizen here.

use crate::config::SssomConfig;
use crate::error::Result;
use crate::model::mapping_set::MappingSet;

/// Parses a non-TSV serialisation into a [`MappingSet`].
pub trait SetReader {
    /// Parse `content` into a [`MappingSet`].
    ///
    /// # Errors
    /// Implementations report malformed input as [`crate::error::SssomError::Format`].
    fn read(&self, content: &str, config: &SssomConfig) -> Result<MappingSet>;
}

/// Serialises a [`MappingSet`] into a non-TSV wire format.
pub trait SetWriter {
    /// Render `set` to its wire form.
    ///
    /// # Errors
    /// Implementations report an unrepresentable value (one round-trip
    /// equivalence with TSV cannot preserve) as [`crate::error::SssomError::Format`].
    fn write(&self, set: &MappingSet, config: &SssomConfig) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoWriter;
    impl SetWriter for EchoWriter {
        fn write(&self, set: &MappingSet, _config: &SssomConfig) -> Result<String> {
            Ok(format!("mappings={}", set.mappings.len()))
        }
    }

    #[test]
    fn a_downstream_writer_can_implement_the_trait() {
        let set = MappingSet::new();
        let cfg = SssomConfig::default();
        assert_eq!(EchoWriter.write(&set, &cfg).unwrap(), "mappings=0");
    }
}

use crate::model::{CrossFilterIndex, ModelEntry, VariantListing};
use std::collections::{BTreeSet, HashMap};

/// Builds the bidirectional lookup structures backing the linked
/// model/variant selectors from the flat availability listing of one brand
/// at the snapshot cutoff.
pub struct CrossFilterIndexBuilder;

impl CrossFilterIndexBuilder {
    pub fn build(listings: &[VariantListing]) -> CrossFilterIndex {
        let mut model_names: HashMap<i64, String> = HashMap::new();
        let mut descriptions: BTreeSet<&str> = BTreeSet::new();
        let mut model_to_descriptions: HashMap<i64, BTreeSet<&str>> = HashMap::new();
        let mut description_to_model_ids: HashMap<&str, BTreeSet<i64>> = HashMap::new();
        let mut pair_to_variant: HashMap<i64, HashMap<String, i64>> = HashMap::new();

        for listing in listings {
            model_names
                .entry(listing.model_id)
                .or_insert_with(|| listing.model_name.clone());
            descriptions.insert(&listing.description);
            model_to_descriptions
                .entry(listing.model_id)
                .or_default()
                .insert(&listing.description);
            description_to_model_ids
                .entry(&listing.description)
                .or_default()
                .insert(listing.model_id);
            // (model, description) functionally determines one variant, so a
            // plain insert cannot clobber a different id.
            pair_to_variant
                .entry(listing.model_id)
                .or_default()
                .insert(listing.description.clone(), listing.variant_id);
        }

        let mut models: Vec<ModelEntry> = model_names
            .into_iter()
            .map(|(id, name)| ModelEntry { id, name })
            .collect();
        // Case-sensitive ordinal name order; id as a deterministic tiebreak.
        models.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        CrossFilterIndex {
            models,
            // Newest first: descending ordinal order over year-prefixed strings.
            variant_descriptions: descriptions.into_iter().rev().map(str::to_owned).collect(),
            model_to_descriptions: model_to_descriptions
                .into_iter()
                .map(|(id, descs)| (id, descs.into_iter().rev().map(str::to_owned).collect()))
                .collect(),
            description_to_model_ids: description_to_model_ids
                .into_iter()
                .map(|(desc, ids)| (desc.to_owned(), ids.into_iter().collect()))
                .collect(),
            model_description_to_variant: pair_to_variant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(variant_id: i64, model_id: i64, model_name: &str, description: &str) -> VariantListing {
        VariantListing {
            variant_id,
            model_id,
            model_name: model_name.to_string(),
            description: description.to_string(),
        }
    }

    fn sample() -> Vec<VariantListing> {
        vec![
            listing(100, 2, "Polo", "2024 Flex"),
            listing(101, 2, "Polo", "2022 Flex"),
            listing(102, 1, "Gol 1.0", "2024 Flex"),
            listing(103, 1, "Gol 1.0", "2019 Gasolina"),
            // Duplicate row for the same variant must not distort anything.
            listing(103, 1, "Gol 1.0", "2019 Gasolina"),
        ]
    }

    #[test]
    fn models_sorted_ascending_by_name() {
        let index = CrossFilterIndexBuilder::build(&sample());
        let names: Vec<&str> = index.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Gol 1.0", "Polo"]);
    }

    #[test]
    fn descriptions_strictly_descending_without_duplicates() {
        let index = CrossFilterIndexBuilder::build(&sample());
        assert_eq!(
            index.variant_descriptions,
            vec!["2024 Flex", "2022 Flex", "2019 Gasolina"]
        );
        for pair in index.variant_descriptions.windows(2) {
            assert!(pair[0] > pair[1]);
        }
    }

    #[test]
    fn model_ids_per_description_strictly_ascending() {
        let index = CrossFilterIndexBuilder::build(&sample());
        let ids = &index.description_to_model_ids["2024 Flex"];
        assert_eq!(ids, &vec![1, 2]);
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn per_model_descriptions_sorted_descending() {
        let index = CrossFilterIndexBuilder::build(&sample());
        assert_eq!(
            index.model_to_descriptions[&1],
            vec!["2024 Flex", "2019 Gasolina"]
        );
        assert_eq!(index.model_to_descriptions[&2], vec!["2024 Flex", "2022 Flex"]);
    }

    #[test]
    fn pair_map_resolves_exact_variant() {
        let index = CrossFilterIndexBuilder::build(&sample());
        assert_eq!(index.model_description_to_variant[&1]["2024 Flex"], 102);
        assert_eq!(index.model_description_to_variant[&2]["2024 Flex"], 100);
    }

    #[test]
    fn empty_listing_builds_empty_index() {
        let index = CrossFilterIndexBuilder::build(&[]);
        assert!(index.models.is_empty());
        assert!(index.variant_descriptions.is_empty());
        assert!(index.model_to_descriptions.is_empty());
        assert!(index.description_to_model_ids.is_empty());
        assert!(index.model_description_to_variant.is_empty());
    }
}

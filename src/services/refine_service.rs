use crate::models::candidate::Candidate;
use crate::models::facet::FacetFilter;

pub const REFINED_DISPLAY_CAP: usize = 12;

pub fn refine(candidates: &[Candidate], filter: &FacetFilter) -> Vec<Candidate> {
    let gender = filter.gender.map(|g| g.as_str());
    let base_colour = filter.base_colour.map(|c| c.as_str());
    let category = filter.category.map(|c| c.as_str());
    let min_similarity = filter.min_similarity();

    candidates
        .iter()
        .filter(|c| gender.is_none_or(|g| c.gender == g))
        .filter(|c| base_colour.is_none_or(|colour| c.base_colour == colour))
        .filter(|c| category.is_none_or(|cat| c.master_category == cat))
        .filter(|c| min_similarity.is_none_or(|floor| c.similarity >= floor))
        .take(REFINED_DISPLAY_CAP)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::facet::{BaseColour, Category, Gender};

    fn candidate(id: usize, gender: &str, colour: &str, category: &str, similarity: f64) -> Candidate {
        Candidate {
            id: id.to_string(),
            display_name: format!("Product {id}"),
            gender: gender.to_string(),
            base_colour: colour.to_string(),
            master_category: category.to_string(),
            image_url: format!("https://res.cloudinary.com/demo/image/upload/v1/{id}.jpg"),
            similarity,
        }
    }

    fn catalog(count: usize) -> Vec<Candidate> {
        let genders = ["Men", "Women", "Unisex"];
        let colours = ["Black", "White", "Navy Blue", "Red"];
        let categories = ["Apparel", "Footwear", "Accessories"];
        (0..count)
            .map(|i| {
                candidate(
                    i,
                    genders[i % genders.len()],
                    colours[i % colours.len()],
                    categories[i % categories.len()],
                    1.0 - i as f64 * 0.05,
                )
            })
            .collect()
    }

    fn ids(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_unrestricted_filter_returns_first_twelve_in_order() {
        let candidates = catalog(16);
        let refined = refine(&candidates, &FacetFilter::default());
        assert_eq!(refined, candidates[..12].to_vec());
    }

    #[test]
    fn test_fewer_than_cap_are_all_kept() {
        let candidates = catalog(5);
        assert_eq!(refine(&candidates, &FacetFilter::default()), candidates);
        assert!(refine(&[], &FacetFilter::default()).is_empty());
    }

    #[test]
    fn test_facets_are_conjunctive() {
        let candidates = vec![
            candidate(1, "Men", "Black", "Footwear", 0.9),
            candidate(2, "Men", "Black", "Apparel", 0.8),
            candidate(3, "Women", "Black", "Footwear", 0.7),
            candidate(4, "Men", "Red", "Footwear", 0.6),
            candidate(5, "Men", "Black", "Footwear", 0.5),
        ];
        let filter = FacetFilter {
            gender: Some(Gender::Men),
            base_colour: Some(BaseColour::Black),
            category: Some(Category::Footwear),
            ..Default::default()
        };
        assert_eq!(ids(&refine(&candidates, &filter)), vec!["1", "5"]);

        let filter = filter.with_similarity_floor(60);
        assert_eq!(ids(&refine(&candidates, &filter)), vec!["1"]);
    }

    #[test]
    fn test_multi_word_labels_match_catalog_values() {
        let candidates = vec![
            candidate(1, "Men", "Navy Blue", "Sporting Goods", 0.9),
            candidate(2, "Men", "Blue", "Apparel", 0.8),
        ];
        let filter = FacetFilter {
            base_colour: Some(BaseColour::NavyBlue),
            category: Some(Category::SportingGoods),
            ..Default::default()
        };
        assert_eq!(ids(&refine(&candidates, &filter)), vec!["1"]);
    }

    #[test]
    fn test_similarity_floor_is_inclusive_and_monotonic() {
        let candidates = catalog(20);
        let mut previous = usize::MAX;
        for floor in 0..=100u8 {
            let filter = FacetFilter::default().with_similarity_floor(floor);
            let retained = candidates
                .iter()
                .filter(|c| floor == 0 || c.similarity >= f64::from(floor) / 100.0)
                .count();
            let refined = refine(&candidates, &filter);
            assert_eq!(refined.len(), retained.min(REFINED_DISPLAY_CAP), "floor {floor}");
            assert!(refined.len() <= previous, "floor {floor} grew the result");
            previous = refined.len();
        }

        let exact = vec![candidate(1, "Men", "Black", "Apparel", 0.5)];
        let filter = FacetFilter::default().with_similarity_floor(50);
        assert_eq!(refine(&exact, &filter).len(), 1);
    }

    #[test]
    fn test_refine_is_idempotent() {
        let candidates = catalog(20);
        let filters = [
            FacetFilter::default(),
            FacetFilter {
                gender: Some(Gender::Women),
                ..Default::default()
            },
            FacetFilter::default().with_similarity_floor(35),
            FacetFilter {
                category: Some(Category::Footwear),
                base_colour: Some(BaseColour::White),
                ..Default::default()
            },
        ];
        for filter in &filters {
            let once = refine(&candidates, filter);
            assert_eq!(refine(&once, filter), once);
        }
    }

    #[test]
    fn test_no_match_returns_empty_without_touching_input() {
        let candidates = catalog(8);
        let snapshot = candidates.clone();
        let filter = FacetFilter {
            gender: Some(Gender::Men),
            ..Default::default()
        }
        .with_similarity_floor(100);
        assert_eq!(ids(&refine(&candidates, &filter)), vec!["0"]);

        let filter = FacetFilter {
            category: Some(Category::SportingGoods),
            ..Default::default()
        };
        assert!(refine(&candidates, &filter).is_empty());
        assert_eq!(candidates, snapshot);
    }
}

//! Codec, merge policies and place paths working together on document text.

use elo_core::frontmatter::{compose, parse_document};
use elo_core::{
    apply_forced_updates, merge_suggestions, metadata_map, MergeOutcome, MetadataValue,
    PlaceComponents, PlacePathBuilder,
};

const NOTE: &str = "---\nMunicipio: '[[Málaga]]'\nProvincia: Málaga\ntags:\n- Places/City\nrating:\n---\nBeach town.\n";

#[test]
fn test_suggestions_then_forced_updates_on_document_text() {
    let (current, body) = parse_document(NOTE);
    let current = current.unwrap();

    let suggested = merge_suggestions(
        Some(&current),
        &metadata_map! { "rating" => 4, "tags" => vec!["Other"], "summary" => "Coastal city" },
    )
    .into_updated()
    .unwrap();
    assert_eq!(suggested.get("rating"), Some(&MetadataValue::from(4)));
    assert_eq!(suggested.get("tags"), Some(&MetadataValue::from(vec!["Places/City"])));

    let components = PlaceComponents::from_metadata(&suggested, false);
    assert_eq!(components.municipio.as_deref(), Some("Málaga"));

    let confirmed = PlaceComponents {
        pais: Some("Spain".to_string()),
        continent: Some("Europe".to_string()),
        region: Some("Andalucía".to_string()),
        ..components
    };
    let updated = match apply_forced_updates(Some(&suggested), &confirmed.to_metadata_updates()) {
        MergeOutcome::Updated(map) => map,
        MergeOutcome::Unchanged => panic!("expected new place keys"),
    };
    assert_eq!(
        updated.keys().collect::<Vec<_>>(),
        vec!["Municipio", "Provincia", "tags", "rating", "summary", "Region", "Pais", "Continente"]
    );
    assert_eq!(updated.get("Municipio"), Some(&MetadataValue::from("Málaga")));

    let text = compose(Some(&updated), body);
    let (reparsed, reparsed_body) = parse_document(&text);
    assert_eq!(reparsed.as_ref(), Some(&updated));
    assert_eq!(reparsed_body.trim_start(), "Beach town.\n");

    let path = PlacePathBuilder::default().build_path("malaga", &confirmed, &|_: &str| false);
    assert_eq!(path, "Places/Europe/Spain/Andalucía/Málaga/Málaga/Málaga (City).md");
}

#[test]
fn test_second_pass_is_unchanged() {
    let (current, _) = parse_document(NOTE);
    let current = current.unwrap();
    let updates = metadata_map! { "Provincia" => "Málaga" };
    assert_eq!(apply_forced_updates(Some(&current), &updates), MergeOutcome::Unchanged);
}

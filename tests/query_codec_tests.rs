use entity_sync::{PaginationDescriptor, SortOrder, decode, encode};
use proptest::prelude::*;

fn any_order() -> impl Strategy<Value = SortOrder> {
    prop_oneof![Just(SortOrder::Asc), Just(SortOrder::Desc)]
}

fn any_field() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z_][a-zA-Z0-9_.]{0,24}",
        // anything printable, including spaces, commas and query delimiters
        "\\PC{1,16}",
    ]
}

fn any_descriptor() -> impl Strategy<Value = PaginationDescriptor> {
    (1u32..10_000, 1u32..200, any_field(), any_order()).prop_map(
        |(page, size, field, order)| {
            PaginationDescriptor::new(size, "id")
                .page(page)
                .sorted_by(field, order)
        },
    )
}

proptest! {
    #[test]
    fn valid_descriptors_round_trip(descriptor in any_descriptor()) {
        prop_assume!(descriptor.is_valid());
        let fallback = PaginationDescriptor::new(descriptor.items_per_page, "id");
        prop_assert_eq!(decode(&encode(&descriptor), &fallback), descriptor);
    }

    #[test]
    fn decode_always_yields_a_valid_descriptor(query in ".{0,40}") {
        let fallback = PaginationDescriptor::new(20, "id");
        let descriptor = decode(&query, &fallback);
        prop_assert!(descriptor.is_valid());
        prop_assert_eq!(descriptor.items_per_page, 20);
    }
}

#[test]
fn padded_or_comma_fields_are_not_valid() {
    let base = PaginationDescriptor::new(20, "id").page(2);
    for field in [" date", "date ", "a,b"] {
        let descriptor = base.clone().sorted_by(field, SortOrder::Desc);
        assert!(!descriptor.is_valid(), "{field:?}");
    }

    // the location format loses exactly these, so they must not pass as valid
    let comma = base.clone().sorted_by("a,b", SortOrder::Desc);
    assert_eq!(encode(&comma), "page=2&sort=a%2Cb,DESC");
    assert_eq!(decode(&encode(&comma), &base), base);
}

#[test]
fn leading_question_mark_is_accepted() {
    let fallback = PaginationDescriptor::new(20, "id");
    let descriptor = decode("?page=3&sort=date,DESC", &fallback);
    assert_eq!(descriptor.active_page, 3);
    assert_eq!(descriptor.sort_param(), "date,DESC");
}

#[test]
fn toggling_twice_restores_the_location() {
    let start = PaginationDescriptor::new(20, "id").page(2);
    let mut toggled = start.clone();
    toggled.toggle_sort("id");
    assert_eq!(encode(&toggled), "page=2&sort=id,DESC");
    toggled.toggle_sort("id");
    assert_eq!(encode(&toggled), encode(&start));
}

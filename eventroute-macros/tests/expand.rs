#[test]
fn attribute_macros_compile() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/value_object_basic.rs");
    t.pass("tests/ui/entity_id_basic.rs");
}

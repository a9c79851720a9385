use docquery::{bson::doc, prelude::*};

#[test]
fn translated_text_matches_hand_built_documents() {
    let criteria = translate("{'_id': '507f1f77bcf86cd799439011', 'in_use': FALSE}").unwrap();

    assert_eq!(criteria.get_object_id("_id").unwrap().to_hex(), "507f1f77bcf86cd799439011");
    assert_eq!(criteria.get_bool("in_use").unwrap(), false);
}

#[test]
fn projection_and_raw_output_compose() {
    let projection = build_projection("firstName", "false").unwrap();
    let records = vec![doc! { "firstName": "Clark" }];

    assert_eq!(projection.to_document(), Some(doc! { "firstName": true, "_id": false }));
    assert_eq!(
        serialize(records, ResultMode::Raw),
        QueryOutput::Raw("[('firstName', 'Clark')]".into())
    );
}

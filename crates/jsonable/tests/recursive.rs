use jsonable::{decode_as, from_jsonable_with, to_jsonable, DecodeOptions, Descriptor, Jsonable};
use pretty_assertions::assert_eq;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Jsonable)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Jsonable)]
struct Chain {
    value: u32,
    next: Option<Box<Chain>>,
}

#[allow(dead_code)]
#[derive(Debug, Jsonable)]
struct NextHop(Option<Box<NextHop>>);

fn chain(len: u32) -> Chain {
    let mut head = Chain {
        value: 0,
        next: None,
    };
    for value in 1..len {
        head = Chain {
            value,
            next: Some(Box::new(head)),
        };
    }
    head
}

#[test]
fn self_referential_records_round_trip() {
    let tree = TreeNode {
        label: "root".to_string(),
        children: vec![
            TreeNode {
                label: "left".to_string(),
                children: Vec::new(),
            },
            TreeNode {
                label: "right".to_string(),
                children: vec![TreeNode {
                    label: "leaf".to_string(),
                    children: Vec::new(),
                }],
            },
        ],
    };

    let encoded = to_jsonable(&tree).unwrap();
    assert_eq!(
        encoded,
        Jsonable::from(json!({
            "label": "root",
            "children": [
                {"label": "left", "children": []},
                {"label": "right", "children": [{"label": "leaf", "children": []}]}
            ]
        }))
    );
    assert_eq!(decode_as::<TreeNode>(encoded).unwrap(), tree);
}

#[test]
fn deep_data_is_bounded_by_max_depth() {
    let encoded = to_jsonable(&chain(200)).unwrap();
    let descriptor = Descriptor::<Chain>::new().unwrap();

    let err = from_jsonable_with(descriptor, encoded.clone(), &DecodeOptions::default())
        .unwrap_err()
        .to_string();
    assert!(err.contains("nesting exceeds the maximum depth of 128"));

    let options = DecodeOptions::new().with_max_depth(1_000);
    let decoded = from_jsonable_with(descriptor, encoded, &options).unwrap();
    assert_eq!(decoded, chain(200));
}

#[test]
fn self_wrapping_newtypes_fail_at_construction() {
    let err = Descriptor::<NextHop>::new().unwrap_err();
    assert!(err.type_name.ends_with("NextHop"));
    assert!(err.reason.contains("wrapper cycle"));
}

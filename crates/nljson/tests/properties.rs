use std::collections::HashSet;

use nljson::attr::{align_up, AttrReader, AttrWriter, HEADER_SIZE};
use nljson::{decode_alloc, CodecConfig, Handle};
use proptest::prelude::*;
use serde_json::Value;

const LINK_POLICY: &str = r#"{
    "IFLA_IFNAME": { "attr_type": 3, "data_type": "NLA_STRING", "attr_len": 16 },
    "IFLA_MTU": { "attr_type": 4, "data_type": "NLA_U32" },
    "IFLA_FLAGS": { "attr_type": 5, "data_type": "NLA_U16" },
    "IFLA_STATS": { "attr_type": 7, "data_type": "NLA_U64" },
    "IFLA_OPERSTATE": { "attr_type": 16, "data_type": "NLA_U8" }
}"#;

/// Records with pairwise distinct type ids, in generation order.
fn raw_records() -> impl Strategy<Value = Vec<(u16, Vec<u8>)>> {
    prop::collection::vec(
        (any::<u16>(), prop::collection::vec(any::<u8>(), 0..48)),
        0..12,
    )
    .prop_map(|records| {
        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|(type_id, _)| seen.insert(*type_id))
            .collect()
    })
}

/// Typed link records. Each policy entry appears at most once.
fn link_records() -> impl Strategy<Value = Vec<(u16, Vec<u8>)>> {
    let name = "[a-z][a-z0-9]{0,14}".prop_map(|name| {
        let mut payload = name.into_bytes();
        payload.push(0);
        (3u16, payload)
    });
    let records = (
        prop::option::of(name),
        prop::option::of(any::<u32>().prop_map(|v| (4u16, v.to_ne_bytes().to_vec()))),
        prop::option::of(any::<u16>().prop_map(|v| (5u16, v.to_ne_bytes().to_vec()))),
        prop::option::of(any::<u64>().prop_map(|v| (7u16, v.to_ne_bytes().to_vec()))),
        prop::option::of(any::<u8>().prop_map(|v| (16u16, vec![v]))),
    )
        .prop_map(|(a, b, c, d, e)| [a, b, c, d, e].into_iter().flatten().collect::<Vec<_>>());
    records.prop_shuffle()
}

fn wire(records: &[(u16, Vec<u8>)]) -> AttrWriter {
    let mut writer = AttrWriter::new();
    for (type_id, payload) in records {
        writer.put(*type_id, payload).unwrap();
    }
    writer
}

fn link_handle() -> Handle {
    Handle::from_policy_str(LINK_POLICY, CodecConfig::default()).unwrap()
}

proptest! {
    #[test]
    fn untyped_streams_round_trip(records in raw_records()) {
        let nla = wire(&records);
        let json = Handle::default().encode_alloc(nla.as_slice()).unwrap();
        prop_assert_eq!(json.consumed, nla.len());

        let back = decode_alloc(json.output.as_bytes()).unwrap();
        prop_assert_eq!(back.consumed, json.output.len());
        prop_assert_eq!(&back.output[..], nla.as_slice());
    }

    #[test]
    fn typed_streams_round_trip(records in link_records()) {
        let nla = wire(&records);
        let handle = link_handle();
        let json = handle.encode_alloc(nla.as_slice()).unwrap();
        prop_assert_eq!(json.consumed, nla.len());

        let back = handle.decode_alloc(json.output.as_bytes()).unwrap();
        prop_assert_eq!(&back.output[..], nla.as_slice());
    }

    #[test]
    fn member_order_follows_record_order(records in raw_records()) {
        let nla = wire(&records);
        let (value, _) = Handle::default().encode_value(nla.as_slice()).unwrap();
        let Value::Object(members) = value else {
            panic!("encoder must produce an object");
        };

        let types: Vec<u64> = members
            .values()
            .map(|attr| attr["type"].as_u64().unwrap())
            .collect();
        let expected: Vec<u64> = records.iter().map(|(t, _)| u64::from(*t)).collect();
        prop_assert_eq!(types, expected);
    }

    #[test]
    fn decoded_records_are_aligned(records in raw_records()) {
        let nla = wire(&records);
        let json = Handle::default().encode_alloc(nla.as_slice()).unwrap();
        let back = decode_alloc(json.output.as_bytes()).unwrap();

        prop_assert_eq!(back.output.len() % 4, 0);
        let mut reader = AttrReader::new(&back.output);
        for (attr, (type_id, payload)) in reader.by_ref().zip(&records) {
            prop_assert_eq!(attr.type_id, *type_id);
            prop_assert_eq!(attr.declared_len as usize, HEADER_SIZE + payload.len());
            prop_assert_eq!(attr.wire_size(), align_up(HEADER_SIZE + payload.len()));
        }
        prop_assert!(reader.is_exhausted());
    }

    #[test]
    fn truncated_input_consumes_only_complete_records(
        records in raw_records(),
        cut in any::<prop::sample::Index>(),
    ) {
        let nla = wire(&records);
        let cut = cut.index(nla.len() + 1);

        let mut boundary = 0;
        for (_, payload) in &records {
            let next = boundary + align_up(HEADER_SIZE + payload.len());
            if next > cut {
                break;
            }
            boundary = next;
        }

        let handle = Handle::default();
        let (_, consumed) = handle.encode_value(&nla.as_slice()[..cut]).unwrap();
        prop_assert_eq!(consumed, boundary);

        // Feeding the remainder completes the stream.
        let (_, rest) = handle.encode_value(&nla.as_slice()[consumed..]).unwrap();
        prop_assert_eq!(consumed + rest, nla.len());
    }

    #[test]
    fn re_encoding_decoded_output_is_stable(records in link_records()) {
        let handle = link_handle();
        let first = handle.encode_alloc(wire(&records).as_slice()).unwrap();
        let decoded = decode_alloc(first.output.as_bytes()).unwrap();
        let second = handle.encode_alloc(&decoded.output).unwrap();
        prop_assert_eq!(first.output, second.output);
    }
}

//! Encode a handful of rtnetlink link attributes to JSON and decode them back.
//!
//! Run with:
//!   cargo run --example link-attrs

use nljson::attr::{AttrWriter, NLA_F_NESTED};
use nljson::{decode_alloc, CodecConfig, Handle};

const POLICY: &str = r#"{
    "IFLA_IFNAME": { "attr_type": 3, "data_type": "NLA_STRING", "attr_len": 16 },
    "IFLA_MTU": { "attr_type": 4, "data_type": "NLA_U32" },
    "IFLA_OPERSTATE": { "attr_type": 16, "data_type": "NLA_U8" },
    "IFLA_LINKINFO": {
        "attr_type": 18,
        "data_type": "NLA_NESTED",
        "policy": {
            "IFLA_INFO_KIND": { "attr_type": 1, "data_type": "NLA_STRING" }
        }
    }
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut linkinfo = AttrWriter::new();
    linkinfo.put(1, b"veth\0")?;

    let mut nla = AttrWriter::new();
    nla.put(3, b"veth0\0")?;
    nla.put(4, &1500u32.to_ne_bytes())?;
    nla.put(16, &[6])?;
    nla.put_nested(18 | NLA_F_NESTED, &linkinfo)?;
    nla.put(99, &[0xde, 0xad])?;

    let handle = Handle::from_policy_str(
        POLICY,
        CodecConfig {
            pretty: true,
            ..CodecConfig::default()
        },
    )?;

    let json = handle.encode_alloc(nla.as_slice())?;
    eprintln!("Encoded {} attribute bytes:", json.consumed);
    println!("{}", json.output);

    let back = decode_alloc(json.output.as_bytes())?;
    eprintln!(
        "Decoded {} JSON bytes into {} attribute bytes (identical: {})",
        back.consumed,
        back.produced(),
        back.output[..] == nla.as_slice()[..]
    );
    Ok(())
}

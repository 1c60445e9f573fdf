use bds_palette::{
    CanonicalPolicy, HarvestedData, Palette, StateValue, build_palette,
    hash::{fnv1_64, fnv1a_32},
};
use bds_protocol::{NbtFlavor, NbtValue, nbt::read_root};
use pretty_assertions::assert_eq;

const HARVEST: &str = r#"{
    "blocks": {
        "data": {
            "minecraft:oak_trapdoor": {
                "possibleProperties": ["direction", "open_bit", "upside_down_bit"],
                "defaultPermutation": {"direction": 0, "open_bit": false, "upside_down_bit": false},
                "states": {
                    "direction": [0, 1, 2, 3],
                    "open_bit": [false, true],
                    "upside_down_bit": [false, true]
                },
                "palleteStates": {
                    "minecraft:cardinal_direction": ["north", "south", "east", "west"],
                    "open_bit": [false, true]
                }
            },
            "minecraft:air": {
                "defaultPermutation": {},
                "states": {},
                "palleteStates": {}
            },
            "minecraft:stone": {
                "possibleProperties": ["stone_type"],
                "defaultPermutation": {"stone_type": "stone"},
                "states": {"stone_type": ["stone", "granite"]},
                "palleteStates": {"stone_type": ["stone", "granite"]}
            },
            "minecraft:white_wool": {
                "defaultPermutation": {"color": "white"},
                "states": {"color": ["white"]},
                "palleteStates": {"color": ["white"]},
                "possiblyAliased": ["color"]
            },
            "minecraft:white_carpet": {
                "defaultPermutation": {"color": "white"},
                "states": {"color": ["white"]},
                "palleteStates": {"color": ["white"]},
                "possiblyAliased": ["color"]
            }
        },
        "properties": [],
        "palleteProperties": []
    },
    "items": []
}"#;

fn palette() -> Palette {
    let data = HarvestedData::from_slice(HARVEST.as_bytes()).unwrap();
    build_palette(&data, &CanonicalPolicy::default()).unwrap()
}

#[test]
fn trapdoor_expands_to_every_combination() {
    let palette = palette();
    let trapdoors: Vec<_> = palette
        .entries()
        .iter()
        .filter(|e| e.name == "minecraft:oak_trapdoor")
        .collect();
    assert_eq!(trapdoors.len(), 8);

    let mut ids: Vec<i32> = trapdoors.iter().map(|e| e.network_id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 8);

    let first = trapdoors[0];
    assert_eq!(
        first.states.get("minecraft:cardinal_direction"),
        Some(&NbtValue::String("north".into()))
    );
    assert_eq!(first.states.get("open_bit"), Some(&NbtValue::Byte(0)));
    assert_eq!(trapdoors[1].states.get("open_bit"), Some(&NbtValue::Byte(1)));
}

#[test]
fn legacy_and_deprecated_dimensions_collapse() {
    let palette = palette();
    // stone_type is dropped by the default policy
    let stone: Vec<_> = palette
        .entries()
        .iter()
        .filter(|e| e.name == "minecraft:stone")
        .collect();
    assert_eq!(stone.len(), 1);
    assert!(stone[0].states.is_empty());

    // color is flagged by two blocks
    let wool = palette.find("minecraft:white_wool", &[]).unwrap();
    assert!(wool.states.is_empty());
    assert!(palette
        .find("minecraft:white_wool", &[("color", StateValue::from("white"))])
        .is_none());
}

#[test]
fn stateless_block_has_one_entry() {
    let palette = palette();
    let air = palette.find("minecraft:air", &[]).unwrap();
    assert_eq!(air.name_hash, fnv1_64(b"minecraft:air"));
    // root {name: "minecraft:air", states: {}}
    let mut key = vec![10, 0, 0];
    key.extend([8, 4, 0]);
    key.extend(b"name");
    key.extend([13, 0]);
    key.extend(b"minecraft:air");
    key.extend([10, 6, 0]);
    key.extend(b"states");
    key.extend([0, 0]);
    assert_eq!(air.network_id, fnv1a_32(&key) as i32);
}

#[test]
fn entries_are_sorted_by_name_hash() {
    let palette = palette();
    assert_eq!(palette.len(), 8 + 1 + 1 + 1 + 1);
    assert!(palette
        .entries()
        .windows(2)
        .all(|w| w[0].name_hash <= w[1].name_hash));
}

#[test]
fn output_is_deterministic() {
    assert_eq!(palette().to_bytes(), palette().to_bytes());
}

#[test]
fn output_document_layout() {
    let palette = palette();
    let bytes = palette.to_bytes();
    let (root, used) = read_root(&bytes, NbtFlavor::LittleEndian).unwrap();
    assert_eq!(used, bytes.len());

    let Some(NbtValue::List(blocks)) = root.get("blocks") else {
        panic!("no blocks list: {:?}", root);
    };
    let blocks = blocks.compounds();
    assert_eq!(blocks.len(), palette.len());
    for (entry, compound) in palette.entries().iter().zip(blocks) {
        assert_eq!(compound.get("name").and_then(NbtValue::as_str), Some(entry.name.as_str()));
        assert_eq!(
            compound.get("name_hash"),
            Some(&NbtValue::Long(entry.name_hash as i64))
        );
        assert_eq!(
            compound.get("network_id"),
            Some(&NbtValue::Int(entry.network_id))
        );
    }
}

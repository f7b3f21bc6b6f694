use serde::Deserialize;
use std::{collections::BTreeMap, env, fs, path::PathBuf};

type FlagTable = BTreeMap<String, String>;

#[derive(Deserialize)]
struct FlagFile {
    default: FlagTable,
    #[serde(flatten)]
    arch: BTreeMap<String, FlagTable>,
}

fn parse_value(value: &str) -> usize {
    let clean = value.trim().replace("_", "");
    let parsed = match clean.strip_prefix("0x").or(clean.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => clean.parse::<usize>(),
    };
    match parsed {
        Ok(value) => value,
        Err(err) => panic!("Invalid flag value {:?}: {:?}", value, err),
    }
}

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap();
    let flags_str =
        fs::read_to_string(PathBuf::from(manifest_dir.clone()).join("../../flags.json")).unwrap();
    let flagfile: FlagFile = serde_json::from_str(&flags_str).unwrap();
    let mut flags = flagfile.default;
    // arch tables only override
    if let Some(overrides) = flagfile.arch.get(target_arch.as_str()) {
        flags.extend(overrides.clone());
    }
    make_flags(&flags);
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../../flags.json");
}

fn make_flags(flagmap: &FlagTable) {
    let mut s: String = String::from("");
    for (key, value) in flagmap {
        s += format!("pub const {}: usize = {:#x};\n", key, parse_value(value)).as_str();
    }
    let out_dir = env::var("OUT_DIR").unwrap();
    let path = PathBuf::from(out_dir).join("build_flags.rs");
    fs::write(path, s).unwrap();
}

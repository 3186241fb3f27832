use cabrig_core::api::{Cab, CabDef, ParamValue};
use indexmap::IndexMap;

pub fn cab(text: &str) -> Cab {
    let def: CabDef = toml::from_str(text).expect("test cab definition parses");
    Cab::new(def).expect("test cab definition compiles")
}

pub fn params(entries: &[(&str, ParamValue)]) -> IndexMap<String, ParamValue> {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

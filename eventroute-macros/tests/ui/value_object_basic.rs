use eventroute_macros::value_object;
use std::collections::BTreeMap;

#[value_object]
struct Endpoint {
    scheme: String,
    metadata: BTreeMap<String, String>,
}

#[value_object(default = true)]
struct Channel(String);

#[value_object(debug = false)]
struct Secret(String);

#[value_object(default = true)]
enum Kind {
    #[default]
    Rest,
    Script,
}

fn main() {
    let e = Endpoint {
        scheme: "device".into(),
        metadata: BTreeMap::new(),
    };
    let _ = format!("{:?}", e.clone());
    let _eq = e == e.clone();

    let _c: Channel = Default::default();
    let _ = Secret("pwd".into()).clone();

    let k: Kind = Default::default();
    let _ = serde_json_like(&k);
}

fn serde_json_like<T: serde::Serialize>(_: &T) {}

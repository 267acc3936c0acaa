use eventroute_macros::entity_id;
use std::collections::HashSet;
use uuid::Uuid;

#[entity_id]
struct RouteId(String);

#[entity_id(debug = false)]
struct DeviceGuid(Uuid);

impl std::fmt::Debug for DeviceGuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeviceGuid(..)")
    }
}

fn main() {
    let id = RouteId::new("r-1");
    let _ = format!("{:?} {}", id, id);
    let parsed: RouteId = "r-1".parse().unwrap();
    assert_eq!(parsed, id);
    let raw: String = id.clone().into();
    assert_eq!(raw, "r-1");
    let inner: &String = id.as_ref();
    assert_eq!(inner, "r-1");

    let mut set = HashSet::new();
    set.insert(id);

    let guid = DeviceGuid::new(Uuid::new_v4());
    let _ = format!("{:?}", guid);
}

//! Flattens `extends` chains so every interface knows all of its fields.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::extract::RawInterface;

/// Interface name -> own fields plus every ancestor's fields.
pub type ResolvedInterfaces = BTreeMap<String, BTreeSet<String>>;

/// Resolves every interface in `raw`.
///
/// Parents missing from `raw` (imported or third-party types) contribute
/// nothing. Each walk tracks the names it has expanded, so cyclic `extends`
/// graphs terminate.
pub fn resolve_interfaces(raw: &BTreeMap<String, RawInterface>) -> ResolvedInterfaces {
    raw.keys()
        .map(|name| (name.clone(), resolve_one(name, raw)))
        .collect()
}

fn resolve_one(name: &str, raw: &BTreeMap<String, RawInterface>) -> BTreeSet<String> {
    let mut all_fields = BTreeSet::new();
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut worklist: VecDeque<&str> = VecDeque::from([name]);

    while let Some(current) = worklist.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        let Some(iface) = raw.get(current) else {
            tracing::trace!(interface = name, parent = current, "parent not declared in file");
            continue;
        };
        all_fields.extend(iface.direct_fields.iter().cloned());
        worklist.extend(iface.parents.iter().map(String::as_str));
    }

    all_fields
}

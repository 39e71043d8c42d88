use super::CacheKeyPart;

/// The prefix of every dependency root key.
pub const DEPENDENCY_ROOT_PREFIX: &str = "DependencyRoot:";

fn root_key(root: &impl CacheKeyPart) -> String {
    let mut key = String::from(DEPENDENCY_ROOT_PREFIX);
    root.append_to(&mut key);
    key
}

fn append_group(key: &mut String, root: &str, value: &impl CacheKeyPart) {
    let mut rendered = String::new();
    value.append_to(&mut rendered);

    key.push('{');
    key.push_str(root);
    if !rendered.is_empty() {
        key.push(':');
        key.push_str(&rendered);
    }
    key.push('}');
}

/// Creates the key of the dependency root identified by `root` and `value`.
///
/// The key has the form `{DependencyRoot:<root>:<value>}`, or `{DependencyRoot:<root>}` when the
/// value renders empty, e.g. because it is `None`.
///
/// ```
/// use flightcache::keys::dependency_key;
///
/// assert_eq!(dependency_key("customer", 5), "{DependencyRoot:customer:5}");
/// assert_eq!(dependency_key("customer", None::<u32>), "{DependencyRoot:customer}");
/// ```
pub fn dependency_key(root: impl CacheKeyPart, value: impl CacheKeyPart) -> String {
    let mut key = String::new();
    append_group(&mut key, &root_key(&root), &value);
    key
}

/// Creates one dependency root key per value, all sharing the same `root`.
///
/// An entry that depends on all of the returned keys is invalidated as soon as any one of the
/// values is.
pub fn dependency_keys<V, I>(root: impl CacheKeyPart, values: I) -> Vec<String>
where
    V: CacheKeyPart,
    I: IntoIterator<Item = V>,
{
    let root = root_key(&root);
    values
        .into_iter()
        .map(|value| {
            let mut key = String::new();
            append_group(&mut key, &root, &value);
            key
        })
        .collect()
}

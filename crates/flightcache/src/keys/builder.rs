use std::any::type_name;
use std::fmt::Write;

use super::CacheKeyProvider;

/// Something that can be rendered into a cache key.
///
/// Sequences render as their items separated and surrounded by `:`, absent values render as
/// nothing at all.
pub trait CacheKeyPart {
    /// Appends the rendered part to `key`.
    fn append_to(&self, key: &mut String);
}

impl CacheKeyPart for str {
    fn append_to(&self, key: &mut String) {
        key.push_str(self);
    }
}

impl CacheKeyPart for String {
    fn append_to(&self, key: &mut String) {
        key.push_str(self);
    }
}

impl<T: CacheKeyPart + ?Sized> CacheKeyPart for &T {
    fn append_to(&self, key: &mut String) {
        (**self).append_to(key)
    }
}

impl<T: CacheKeyPart> CacheKeyPart for Option<T> {
    fn append_to(&self, key: &mut String) {
        if let Some(part) = self {
            part.append_to(key);
        }
    }
}

impl<T: CacheKeyPart> CacheKeyPart for [T] {
    fn append_to(&self, key: &mut String) {
        for item in self {
            key.push(':');
            item.append_to(key);
        }
        key.push(':');
    }
}

impl<T: CacheKeyPart> CacheKeyPart for Vec<T> {
    fn append_to(&self, key: &mut String) {
        self.as_slice().append_to(key)
    }
}

impl<T: CacheKeyPart, const N: usize> CacheKeyPart for [T; N] {
    fn append_to(&self, key: &mut String) {
        self.as_slice().append_to(key)
    }
}

macro_rules! display_parts {
    ($($ty:ty),*) => {
        $(
            impl CacheKeyPart for $ty {
                fn append_to(&self, key: &mut String) {
                    write!(key, "{self}").ok();
                }
            }
        )*
    };
}

display_parts!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
);

/// Renders a [`CacheKeyProvider`] as `TypeName:key`.
#[derive(Debug)]
pub struct Keyed<'a, K: ?Sized>(pub &'a K);

impl<K: CacheKeyProvider + ?Sized> CacheKeyPart for Keyed<'_, K> {
    fn append_to(&self, key: &mut String) {
        key.push_str(short_type_name::<K>());
        key.push(':');
        key.push_str(&self.0.cache_key());
    }
}

/// The type name without its module path.
fn short_type_name<T: ?Sized>() -> &'static str {
    let name = type_name::<T>();
    let base = name.split('<').next().unwrap_or(name);
    match base.rfind("::") {
        Some(pos) => &name[pos + 2..],
        None => name,
    }
}

/// Builds cache keys in a `{part1}{part2}{part3}` format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheKeyBuilder {
    key: String,
}

impl CacheKeyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a key with a raw `prefix`, which is not wrapped in braces.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            key: prefix.to_owned(),
        }
    }

    /// Appends a part.
    pub fn part<P: CacheKeyPart>(mut self, part: P) -> Self {
        self.key.push('{');
        part.append_to(&mut self.key);
        self.key.push('}');
        self
    }

    /// Appends the key of a [`CacheKeyProvider`], qualified with its type name.
    pub fn keyed<K: CacheKeyProvider + ?Sized>(self, provider: &K) -> Self {
        self.part(Keyed(provider))
    }

    pub fn build(self) -> String {
        self.key
    }
}

impl From<CacheKeyBuilder> for String {
    fn from(builder: CacheKeyBuilder) -> Self {
        builder.build()
    }
}

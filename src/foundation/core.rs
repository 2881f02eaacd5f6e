pub use kurbo::{Point, Rect, Size};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>().map(Self)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a generated poster artwork.
    SourceId
);
id_newtype!(
    /// Identifier of a scene template.
    TemplateId
);
id_newtype!(
    /// Identifier of a template pack.
    PackId
);
id_newtype!(
    /// Identifier of a composed mockup row.
    MockupId
);
id_newtype!(
    /// Identifier of a downstream catalog product.
    ProductId
);
id_newtype!(
    /// Identifier of a marketplace listing.
    ListingId
);

/// Downstream sales channel a mockup can be included in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Primary marketplace listing (image set synced by the engine).
    Marketplace,
    /// Secondary storefront channel.
    Storefront,
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "marketplace" => Ok(Self::Marketplace),
            "storefront" => Ok(Self::Storefront),
            other => Err(format!("unknown channel '{other}'")),
        }
    }
}

/// Monotonic id allocator shared by the in-memory stores.
#[derive(Debug, Default)]
pub(crate) struct IdSeq(std::sync::atomic::AtomicU64);

impl IdSeq {
    pub(crate) fn next(&self) -> u64 {
        self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1
    }

    /// Make sure future ids are strictly above `seen`.
    pub(crate) fn observe(&self, seen: u64) {
        self.0.fetch_max(seen, std::sync::atomic::Ordering::Relaxed);
    }
}

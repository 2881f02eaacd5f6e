#![forbid(unsafe_code)]

//! Poster mockup composition engine.
//!
//! Posters are warped into scene photos through template zones, optionally color
//! graded, stored per artwork and published to a marketplace listing by an approval
//! workflow and bulk background jobs.

pub mod compose;
pub mod config;
pub mod fetch;
pub mod foundation;
pub mod geometry;
pub mod grade;
pub mod jobs;
pub mod market;
pub mod registry;
pub mod server;
pub mod store;
pub mod workflow;

pub use compose::compositor::{
    ComposeBatch, ComposeOutcome, ComposeSettings, ComposedEntry, Compositor, MockupVariant,
    SkipReason, compose_rgba,
};
pub use compose::{blend::BlendMode, raster::OutputFormat};
pub use config::EngineConfig;
pub use fetch::{HttpFetcher, RasterFetcher, StaticFetcher};
pub use foundation::core::{Channel, ListingId, MockupId, PackId, Point, ProductId, SourceId, TemplateId};
pub use foundation::error::{MockupError, MockupResult};
pub use geometry::fit::FillMode;
pub use grade::preset::ColorGrade;
pub use jobs::{
    registry::{JobKind, JobRegistry, JobSnapshot, JobStart},
    runner::{JobRunner, PackUpdateOutcome, TemplateChangeOutcome},
};
pub use market::{
    http::HttpListingService,
    listing::ListingService,
    memory::InMemoryListingService,
    sync::{SyncOptions, upload_mockups},
};
pub use registry::{
    pack::{NewPack, Pack, PackUpdate},
    source::TemplateSource,
    store::{Registry, RegistrySeed},
    template::{Template, TemplateSpec},
};
pub use store::{
    artworks::{ArtworkStatus, ArtworkStore, InMemoryArtworkStore, NewArtwork, SourceArtwork},
    catalog::{CatalogService, InMemoryCatalog, LinkedListing, MarketplaceAuth, StaticToken},
    mockups::{ComposedMockup, InMemoryMockupStore, MultiMockupStore},
};
pub use workflow::approval::{ApprovalOutcome, ApprovalWorkflow, ApproveError, SyncStatus, WorkflowDeps};

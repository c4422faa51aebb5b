pub mod content_provider;
pub mod notice_writer;
pub mod replenisher;
pub mod section_allocator;
pub mod snapshot_store;

pub use content_provider::{ContentProvider, ContentRequest, ContentResponse, LlmContentProvider};
pub use notice_writer::{Notice, NoticeKind, NoticeWriter};
pub use replenisher::{GeneratedBatch, Replenisher};
pub use section_allocator::SectionAllocator;
pub use snapshot_store::{FileKeyValueStore, KeyValueStore, LoadedSnapshot, MemoryStore, SnapshotService};

pub mod cover;
pub mod filter;
pub mod loaders;
pub mod paper;
pub mod question;
pub mod snapshot;
pub mod template;
pub mod theme;

pub use cover::{CoverElement, CoverElementKind, Dimension, ElementId, Geometry};
pub use filter::FilterCriteria;
pub use loaders::{load_question_file, load_question_folder, load_template};
pub use paper::{PageDescriptor, PageItem, PageKind, PaperMetadata, PlacedQuestion};
pub use question::{
    Difficulty, IdAllocator, QuestionDraft, QuestionEntity, QuestionId, QuestionPayload,
    QuestionType,
};
pub use snapshot::{PaperSnapshot, Preferences};
pub use template::{AllocatedSection, ExamTemplate, SectionAllocation, SectionSpec};
pub use theme::{DocumentTheme, PaperLayout, ThemeCatalog};

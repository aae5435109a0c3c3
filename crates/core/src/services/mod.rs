//! Business logic services.

#![allow(missing_docs)]

pub mod annotation;
pub mod color;
pub mod day_key;
pub mod emotion;
pub mod journal;
pub mod mood;
pub mod user;

pub use annotation::{
    Annotation, AnnotationError, AnnotationId, AnnotationSession, ContainerSize, PixelAnnotation,
};
pub use color::{ColorError, Rgb, average_color, hex_to_rgb, rgb_to_hex};
pub use day_key::{DateKey, DateLike, DayKeyError, canonical_day_key};
pub use emotion::{
    Classification, EmotionClassificationService, EmotionClassifier, EmotionColor,
    HuggingFaceClassifier, LabelScore, NoOpClassificationService,
};
pub use journal::{CreateEntryInput, CreatedEntry, JournalService};
pub use mood::{MonthlyEmotionCount, MoodAggregator, UserMoodState};
pub use user::{CreateUserInput, UserService};

pub mod batch;
pub mod convert;
pub mod discover;
pub mod inspect;

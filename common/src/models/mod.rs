pub mod dto;

pub use dto::label::Label;

pub mod caption_llm;
pub mod db;

pub use caption_llm::OpenAiCaptionAdapter;
pub use db::DbAdapter;

pub mod ask;
pub mod history;
pub mod prompt;
pub mod serve;

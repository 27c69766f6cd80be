pub mod agent_factory;
pub mod dispatcher;
pub mod english;
pub mod extractor;
pub mod fallback;
pub mod history;
pub mod language;
pub mod normalizer;
pub mod prompt;
pub mod record;
pub mod sanitizer;
pub mod stateless_llm_factory;
pub mod vocabulary;

pub mod agents;
pub mod stateless_llm;

pub use agent_factory::*;
pub use agents::*;

// Résumé scoring pipeline: wire protocol, parsing, remote scoring and orchestration.
// All remote calls go through llm_client; all persistence goes through store.

pub mod client;
pub mod conflict;
pub mod criteria;
pub mod parser;
pub mod pipeline;
pub mod text_source;
pub mod wire;

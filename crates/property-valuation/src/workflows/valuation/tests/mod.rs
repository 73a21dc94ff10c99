pub(super) mod common;
mod orchestrator;

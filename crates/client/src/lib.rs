//! Client code for justsearch.
//!
//! This crate provides the instant-answer lookup and normalizer, the search
//! orchestrator that drives a presentation sink, and the offline asset worker.

pub mod ddg;
pub mod search;
pub mod worker;

pub use ddg::{AnswerSource, FetchError, InstantAnswerClient, InstantAnswerConfig, normalize};

pub use search::{
    Connectivity, EmptyState, PresentationSink, RecordingSink, ResultSource, SearchOrchestrator, SearchOutcome,
    SearchState, StatusLine, Tone,
};

pub use worker::{
    AssetCacheWorker, AssetFetcher, AssetRequest, AssetResponse, FetchDecision, HttpAssetFetcher, WorkerConfig,
    WorkerError, WorkerState,
};

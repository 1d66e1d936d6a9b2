#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod mock;

pub use mock::{
    FlakyVectorBackend, MockEmbeddingProvider, MockInferenceProvider, MockRerankProvider,
    MockServices, RecordingWebhook, RerankBehavior, create_mock_services,
};

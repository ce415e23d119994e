//! # journal-runtime
//!
//! Concrete collaborators behind the `journal-core` traits: HuggingFace
//! emotion classification, Supabase trade persistence, and webhook-based
//! outbound delivery.

pub mod huggingface;
pub mod supabase;
pub mod webhook;

pub use huggingface::{HuggingFaceClassifier, HuggingFaceConfig};
pub use supabase::{SupabaseConfig, SupabaseStore};
pub use webhook::{WebhookConfig, WebhookTransport};

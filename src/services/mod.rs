pub mod bulk;
pub mod elevenlabs;
pub mod llm;
pub mod model_capabilities;
pub mod ollama;
pub mod openrouter;
pub mod outputs;

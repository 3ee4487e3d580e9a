/// Semantic encoder capability: text in, fixed-length vector out.
///
/// Implementations must be deterministic for a given input and return
/// vectors of the same dimensionality for every call.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Stable identifier for logs (e.g. `hashing:d1024`).
    fn id(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// This macro is a wrapper around `tracing::trace!` that records the state of a document as it
/// moves through the pipeline. Pass a tag naming what is being snapshotted, a value implementing
/// `Display` (usually the SDL of a document) and a message literal. EX:
/// ```ignore
/// snapshot!("SchemaDocument", document.to_sdl(), "rewritten document");
/// // Generates:
/// // trace!(snapshot = "SchemaDocument", data = %document.to_sdl(), "rewritten document");
/// ```
/// The statement is compiled out unless the `snapshot_tracing` feature is enabled, so the value
/// expression costs nothing otherwise.
macro_rules! snapshot {
    ($name:literal, $value:expr, $msg:literal) => {
        #[cfg(feature = "snapshot_tracing")]
        tracing::trace!(snapshot = $name, data = %$value, $msg);
    };
}

pub(crate) use snapshot;

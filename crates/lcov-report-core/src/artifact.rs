//! HTML report publication.

use crate::error::Result;
use crate::obs;
use crate::platform::ArtifactStore;
use crate::render::ReportBundle;

/// Upload the rendered tree as artifact `name`, paths relative to its root.
pub async fn publish_report(
    store: &dyn ArtifactStore,
    name: &str,
    bundle: &ReportBundle,
) -> Result<()> {
    store.upload(name, &bundle.files, &bundle.root).await?;
    obs::emit_artifact_uploaded(name, bundle.files.len());
    Ok(())
}
